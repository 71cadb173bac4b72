//! XML primitives for talking to PAN-OS devices.
//!
//! PAN-OS exchanges configuration as XML fragments: `<entry name="x">` list
//! elements, `<member>` envelopes and plain text leaves. This crate models a
//! document as an owned [`XmlNode`] tree and provides the parse/write pair the
//! client uses on both sides of the wire, plus a handful of tree helpers
//! (nested lookup, attribute stripping, fragment parsing) that the codec
//! layer builds on.

pub mod parser;
pub mod tree;
pub mod writer;

pub use parser::{parse, parse_file, parse_fragment, ParseError};
pub use tree::XmlNode;
pub use writer::{write, write_file, write_pretty, WriteError};
