//! Service groups.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::Version;
use crate::wire::{entry_node, expect_tag, members, Emit};
use crate::xpath::{entry_xpath, ObjectScope};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceGroup {
    pub name: String,
    pub services: Vec<String>,
    pub tags: Vec<String>,
}

impl Object for ServiceGroup {
    const KIND: &'static str = "service group";
    type Location = ObjectScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &ObjectScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix();
        path.push("service-group".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<EntryV1>()
    }
}

struct EntryV1 {
    name: String,
    members: Vec<String>,
    tags: Vec<String>,
}

impl Wire for EntryV1 {
    type Entry = ServiceGroup;

    fn specify(e: &ServiceGroup) -> Result<Self, PangoError> {
        Ok(Self {
            name: e.name.clone(),
            members: e.services.clone(),
            tags: e.tags.clone(),
        })
    }

    fn normalize(self) -> ServiceGroup {
        ServiceGroup {
            name: self.name,
            services: self.members,
            tags: self.tags,
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", ServiceGroup::KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            members: members(node, &["members"]),
            tags: members(node, &["tag"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.members_el("members", &self.members);
        node.members_el("tag", &self.tags);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceGroup;
    use crate::codec::Object;
    use crate::version::{V6_1, V10_0};

    fn web() -> ServiceGroup {
        ServiceGroup {
            name: "web".to_string(),
            services: vec!["service-https".to_string(), "tcp-8080".to_string()],
            tags: vec!["prod".to_string()],
        }
    }

    #[test]
    fn members_keep_their_order() {
        let node = web().specify(&V10_0).expect("specify");
        assert_eq!(
            node.to_string(),
            "<entry name=\"web\"><members><member>service-https</member><member>tcp-8080</member></members><tag><member>prod</member></tag></entry>"
        );
        for version in [V6_1, V10_0] {
            let node = web().specify(&version).expect("specify");
            assert_eq!(ServiceGroup::normalize(&node, &version).expect("normalize"), web());
        }
    }

    #[test]
    fn empty_tags_are_omitted() {
        let mut e = web();
        e.tags.clear();
        let node = e.specify(&V10_0).expect("specify");
        assert!(node.get_child("tag").is_none());
        assert_eq!(ServiceGroup::normalize(&node, &V10_0).expect("normalize"), e);
    }
}
