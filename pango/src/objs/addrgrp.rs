//! Address groups.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::Version;
use crate::wire::{entry_node, expect_tag, members, text, Emit};
use crate::xpath::{entry_xpath, ObjectScope};

/// A normalized address group.
///
/// Static members and a dynamic filter are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressGroup {
    pub name: String,
    pub description: String,
    pub static_addresses: Vec<String>,
    pub dynamic_match: String,
    pub tags: Vec<String>,
}

impl Object for AddressGroup {
    const KIND: &'static str = "address group";
    type Location = ObjectScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &ObjectScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix();
        path.push("address-group".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<EntryV1>()
    }
}

struct EntryV1 {
    name: String,
    static_addresses: Vec<String>,
    dynamic_filter: String,
    description: String,
    tags: Vec<String>,
}

impl Wire for EntryV1 {
    type Entry = AddressGroup;

    fn specify(e: &AddressGroup) -> Result<Self, PangoError> {
        if !e.static_addresses.is_empty() && !e.dynamic_match.is_empty() {
            return Err(PangoError::validation(format!(
                "address group {:?} cannot be both static and dynamic",
                e.name
            )));
        }
        Ok(Self {
            name: e.name.clone(),
            static_addresses: e.static_addresses.clone(),
            dynamic_filter: e.dynamic_match.clone(),
            description: e.description.clone(),
            tags: e.tags.clone(),
        })
    }

    fn normalize(self) -> AddressGroup {
        AddressGroup {
            name: self.name,
            description: self.description,
            static_addresses: self.static_addresses,
            dynamic_match: self.dynamic_filter,
            tags: self.tags,
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", AddressGroup::KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            static_addresses: members(node, &["static"]),
            dynamic_filter: text(node, &["dynamic", "filter"]),
            description: text(node, &["description"]),
            tags: members(node, &["tag"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.members_el("static", &self.static_addresses);
        if !self.dynamic_filter.is_empty() {
            node.children.push(
                XmlNode::new("dynamic").child(XmlNode::with_text("filter", &self.dynamic_filter)),
            );
        }
        node.text_el("description", &self.description);
        node.members_el("tag", &self.tags);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::AddressGroup;
    use crate::codec::Object;
    use crate::version::V9_0;

    #[test]
    fn dynamic_filter_round_trips() {
        let e = AddressGroup {
            name: "g".to_string(),
            dynamic_match: "'web' and 'prod'".to_string(),
            ..AddressGroup::default()
        };
        let node = e.specify(&V9_0).expect("specify");
        assert_eq!(
            node.to_string(),
            r#"<entry name="g"><dynamic><filter>'web' and 'prod'</filter></dynamic></entry>"#
        );
        assert_eq!(AddressGroup::normalize(&node, &V9_0).expect("normalize"), e);
    }

    #[test]
    fn static_and_dynamic_conflict() {
        let e = AddressGroup {
            name: "g".to_string(),
            static_addresses: vec!["a".to_string()],
            dynamic_match: "'x'".to_string(),
            ..AddressGroup::default()
        };
        assert!(e.specify(&V9_0).is_err());
    }
}
