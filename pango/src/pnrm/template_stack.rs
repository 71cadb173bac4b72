//! Panorama template stacks.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::Version;
use crate::wire::{
    decode_devices, encode_devices, entry_node, expect_tag, members, text, Emit, Targets,
};
use crate::xpath::{device_prefix, entry_xpath};

const KIND: &str = "template stack";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateStack {
    pub name: String,
    pub description: String,
    pub default_vsys: String,
    /// Ordered: earlier templates win.
    pub templates: Vec<String>,
    pub devices: Targets,
}

impl Object for TemplateStack {
    const KIND: &'static str = KIND;
    type Location = ();

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(_loc: &(), names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = device_prefix();
        path.push("template-stack".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<EntryV1>()
    }
}

struct EntryV1(TemplateStack);

impl Wire for EntryV1 {
    type Entry = TemplateStack;

    fn specify(e: &TemplateStack) -> Result<Self, PangoError> {
        Ok(Self(e.clone()))
    }

    fn normalize(self) -> TemplateStack {
        self.0
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        Ok(Self(TemplateStack {
            name: node.attribute("name").unwrap_or_default().to_string(),
            description: text(node, &["description"]),
            default_vsys: text(node, &["settings", "default-vsys"]),
            templates: members(node, &["templates"]),
            devices: decode_devices(node.get_child("devices")),
        }))
    }

    fn encode(&self) -> XmlNode {
        let s = &self.0;
        let mut node = entry_node(&s.name);
        node.text_el("description", &s.description);
        if !s.default_vsys.is_empty() {
            let mut settings = XmlNode::new("settings");
            settings.text_el("default-vsys", &s.default_vsys);
            node.children.push(settings);
        }
        node.members_el("templates", &s.templates);
        node.node_el(encode_devices(&s.devices));
        node
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::TemplateStack;
    use crate::codec::Object;
    use crate::version::V9_0;
    use crate::xpath::join;

    #[test]
    fn template_order_is_kept() {
        let stack = TemplateStack {
            name: "emea".to_string(),
            templates: vec!["overrides".to_string(), "base".to_string()],
            ..TemplateStack::default()
        };
        let node = stack.specify(&V9_0).expect("specify");
        assert_eq!(
            node.to_string(),
            r#"<entry name="emea"><templates><member>overrides</member><member>base</member></templates></entry>"#
        );
        assert_eq!(TemplateStack::normalize(&node, &V9_0).expect("normalize"), stack);
        assert_eq!(
            join(&TemplateStack::xpath(&(), &["emea".to_string()]).expect("xpath")),
            "/config/devices/entry[@name='localhost.localdomain']/template-stack/entry[@name='emea']"
        );
    }
}
