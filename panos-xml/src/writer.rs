//! Serialization of [`XmlNode`] trees.
//!
//! Request bodies go out compact. Saved configurations are written indented
//! behind an XML declaration, the shape a device configuration export has.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::tree::XmlNode;

const INDENT: usize = 2;

/// Errors raised while serializing a tree.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to serialize XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Compact bytes, identical to the node's `Display` form.
pub fn write(node: &XmlNode) -> Result<Vec<u8>, WriteError> {
    let mut writer = Writer::new(Vec::new());
    element(&mut writer, node)?;
    Ok(writer.into_inner())
}

/// Indented bytes without a declaration.
pub fn write_pretty(node: &XmlNode) -> Result<Vec<u8>, WriteError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
    element(&mut writer, node)?;
    Ok(writer.into_inner())
}

/// Write `node` to `path` as a saved configuration document.
pub fn write_file(node: &XmlNode, path: &Path) -> Result<(), WriteError> {
    let io_error = |source: io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', INDENT);
    document(&mut writer, node)?;
    let mut out = writer.into_inner();
    out.write_all(b"\n").map_err(io_error)?;
    out.flush().map_err(io_error)
}

fn document<W: Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    element(writer, node)
}

fn element<W: Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<(), quick_xml::Error> {
    let start = BytesStart::new(node.tag.as_str()).with_attributes(
        node.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );

    match (&node.text, node.children.is_empty()) {
        (None, true) => writer.write_event(Event::Empty(start))?,
        (text, _) => {
            writer.write_event(Event::Start(start))?;
            if let Some(text) = text {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            for child in &node.children {
                element(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(node.tag.as_str())))?;
        }
    }
    Ok(())
}
