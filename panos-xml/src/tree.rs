use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use quick_xml::escape::{escape, partial_escape};

/// A generic XML tree node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Element tag name.
    pub tag: String,
    /// XML attributes keyed by name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements.
    pub children: Vec<XmlNode>,
    /// Optional text content.
    pub text: Option<String>,
}

impl XmlNode {
    /// Create a new XML node with no attributes, children, or text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create a leaf node holding `text`.
    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.text = Some(text.into());
        node
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style child append.
    pub fn child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Return an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Return the first child with the provided tag.
    pub fn get_child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Mutable variant of [`XmlNode::get_child`].
    pub fn get_child_mut(&mut self, tag: &str) -> Option<&mut XmlNode> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    /// Return all children with the provided tag.
    pub fn get_children(&self, tag: &str) -> Vec<&XmlNode> {
        self.children
            .iter()
            .filter(|child| child.tag == tag)
            .collect()
    }

    /// Walk a nested child path and return terminal node text if found.
    pub fn get_text<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        self.find(path)?.text.as_deref()
    }

    /// Walk a nested child path and return the terminal node.
    ///
    /// An empty path returns `self`.
    pub fn find<'a>(&'a self, path: &[&str]) -> Option<&'a XmlNode> {
        let mut current = self;
        for segment in path {
            current = current.get_child(segment)?;
        }
        Some(current)
    }

    /// Depth-first search for every descendant with the given tag.
    pub fn descendants(&self, tag: &str) -> Vec<&XmlNode> {
        let mut out = Vec::new();
        collect_descendants(self, tag, &mut out);
        out
    }

    /// Get or create a child element with the given tag.
    pub fn ensure_child_mut(&mut self, tag: &str) -> &mut XmlNode {
        if let Some(idx) = self.children.iter().position(|c| c.tag == tag) {
            return &mut self.children[idx];
        }
        self.children.push(XmlNode::new(tag));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Recursively drop the named attributes from this node and its children.
    pub fn strip_attributes(&mut self, names: &[&str]) {
        for name in names {
            self.attributes.remove(*name);
        }
        for child in &mut self.children {
            child.strip_attributes(names);
        }
    }
}

fn collect_descendants<'a>(node: &'a XmlNode, tag: &str, out: &mut Vec<&'a XmlNode>) {
    for child in &node.children {
        if child.tag == tag {
            out.push(child);
        }
        collect_descendants(child, tag, out);
    }
}

/// Compact, escaped serialization; this is the form sent on the wire.
impl Display for XmlNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (key, value) in &self.attributes {
            write!(f, " {}=\"{}\"", key, escape(value.as_str()))?;
        }

        if self.children.is_empty() && self.text.is_none() {
            return write!(f, "/>");
        }

        write!(f, ">")?;
        if let Some(text) = &self.text {
            write!(f, "{}", partial_escape(text.as_str()))?;
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::XmlNode;

    #[test]
    fn get_text_walks_nested_path() {
        let root = XmlNode::new("root")
            .child(XmlNode::new("parent").child(XmlNode::with_text("child", "value")));

        assert_eq!(root.get_text(&["parent", "child"]), Some("value"));
        assert!(root.find(&["parent", "missing"]).is_none());
    }

    #[test]
    fn display_is_compact_and_escaped() {
        let node = XmlNode::new("entry")
            .attr("name", "a&b")
            .child(XmlNode::with_text("description", "x < y"))
            .child(XmlNode::new("all"));

        assert_eq!(
            node.to_string(),
            r#"<entry name="a&amp;b"><description>x &lt; y</description><all/></entry>"#
        );
    }

    #[test]
    fn strip_attributes_is_recursive() {
        let mut node = XmlNode::new("arp")
            .attr("admin", "bob")
            .child(XmlNode::new("entry").attr("name", "1.1.1.1").attr("dirtyId", "3"));

        node.strip_attributes(&["admin", "dirtyId", "time"]);

        assert!(node.attributes.is_empty());
        assert_eq!(node.children[0].attribute("name"), Some("1.1.1.1"));
        assert_eq!(node.children[0].attributes.len(), 1);
    }

    #[test]
    fn descendants_searches_all_levels() {
        let root = XmlNode::new("payload")
            .child(XmlNode::new("login").child(XmlNode::new("entry").attr("user", "a")))
            .child(XmlNode::new("register").child(XmlNode::new("entry").attr("ip", "1.1.1.1")));

        assert_eq!(root.descendants("entry").len(), 2);
    }

    #[test]
    fn ensure_child_reuses_existing_tag() {
        let mut root = XmlNode::new("root").child(XmlNode::with_text("mtu", "1500"));
        root.ensure_child_mut("mtu").text = Some("9000".to_string());
        root.ensure_child_mut("comment").text = Some("x".to_string());

        assert_eq!(root.get_text(&["mtu"]), Some("9000"));
        assert_eq!(root.get_text(&["comment"]), Some("x"));
        assert_eq!(root.children.len(), 2);
    }
}
