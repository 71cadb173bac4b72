//! Panorama templates.
//!
//! The template's own configuration tree (`<config>`) is carried raw: the
//! typed namespaces address it through a
//! [`TemplateRef`](crate::xpath::TemplateRef) instead.

use std::collections::BTreeMap;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V8_1};
use crate::wire::{
    decode_devices, encode_devices, entry_node, expect_tag, flag, raw, raw_slot, store_raw, text,
    Emit, RawXml, Targets,
};
use crate::xpath::{device_prefix, entry_xpath};

const KIND: &str = "template";

pub const MODE_NORMAL: &str = "normal";
pub const MODE_FIPS: &str = "fips";
pub const MODE_CC: &str = "cc";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub name: String,
    pub description: String,
    /// PAN-OS before 8.1.
    pub multi_vsys: bool,
    /// PAN-OS before 8.1: one of the `MODE_*` values.
    pub mode: String,
    /// PAN-OS before 8.1.
    pub vpn_disable_mode: bool,
    /// PAN-OS 8.1 and later.
    pub default_vsys: String,
    pub devices: Targets,
    /// `conf` holds the template's configuration tree.
    #[serde(skip)]
    pub raw: BTreeMap<String, String>,
}

impl Object for Template {
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
        path.push("template".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        if version.gte(&V8_1) {
            era::<EntryV2>()
        } else {
            era::<EntryV1>()
        }
    }
}

/// Fields common to both eras.
struct Shared {
    name: String,
    description: String,
    devices: Targets,
    conf: Option<RawXml>,
}

impl Shared {
    fn specify(e: &Template) -> Result<Self, PangoError> {
        Ok(Self {
            name: e.name.clone(),
            description: e.description.clone(),
            devices: e.devices.clone(),
            conf: raw_slot(&e.raw, "conf")?,
        })
    }

    fn normalize(self) -> Template {
        let mut raw = BTreeMap::new();
        store_raw(&mut raw, "conf", &self.conf);
        Template {
            name: self.name,
            description: self.description,
            devices: self.devices,
            raw,
            ..Template::default()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            description: text(node, &["description"]),
            devices: decode_devices(node.get_child("devices")),
            conf: raw(node, &["config"]),
        })
    }

    fn encode(&self, settings: XmlNode) -> XmlNode {
        let mut node = entry_node(&self.name);
        if !settings.children.is_empty() {
            node.children.push(settings);
        }
        node.text_el("description", &self.description);
        node.node_el(encode_devices(&self.devices));
        node.raw_el("config", &self.conf);
        node
    }
}

/// PAN-OS before 8.1.
struct EntryV1 {
    shared: Shared,
    multi_vsys: bool,
    mode: String,
    vpn_disable_mode: bool,
}

impl Wire for EntryV1 {
    type Entry = Template;

    fn specify(e: &Template) -> Result<Self, PangoError> {
        if !["", MODE_NORMAL, MODE_FIPS, MODE_CC].contains(&e.mode.as_str()) {
            return Err(PangoError::validation(format!(
                "{KIND} {:?}: unknown operational mode {:?}",
                e.name, e.mode
            )));
        }
        Ok(Self {
            shared: Shared::specify(e)?,
            multi_vsys: e.multi_vsys,
            mode: e.mode.clone(),
            vpn_disable_mode: e.vpn_disable_mode,
        })
    }

    fn normalize(self) -> Template {
        Template {
            multi_vsys: self.multi_vsys,
            mode: self.mode,
            vpn_disable_mode: self.vpn_disable_mode,
            ..self.shared.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            shared: Shared::decode(node)?,
            multi_vsys: flag(node, &["settings", "multi-vsys"]),
            mode: text(node, &["settings", "operational-mode"]),
            vpn_disable_mode: flag(node, &["settings", "vpn-disable-mode"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut settings = XmlNode::new("settings");
        settings.flag_el("multi-vsys", self.multi_vsys);
        settings.text_el("operational-mode", &self.mode);
        settings.flag_el("vpn-disable-mode", self.vpn_disable_mode);
        self.shared.encode(settings)
    }
}

/// PAN-OS 8.1 and later: settings shrink to the default vsys.
struct EntryV2 {
    shared: Shared,
    default_vsys: String,
}

impl Wire for EntryV2 {
    type Entry = Template;

    fn specify(e: &Template) -> Result<Self, PangoError> {
        Ok(Self {
            shared: Shared::specify(e)?,
            default_vsys: e.default_vsys.clone(),
        })
    }

    fn normalize(self) -> Template {
        Template {
            default_vsys: self.default_vsys,
            ..self.shared.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            shared: Shared::decode(node)?,
            default_vsys: text(node, &["settings", "default-vsys"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut settings = XmlNode::new("settings");
        settings.text_el("default-vsys", &self.default_vsys);
        self.shared.encode(settings)
    }
}

#[cfg(test)]
mod tests {
    use panos_xml::parse;
    use pretty_assertions::assert_eq;

    use super::{Template, MODE_FIPS};
    use crate::codec::Object;
    use crate::version::{V8_0, V8_1};

    #[test]
    fn settings_follow_the_era() {
        let t = Template {
            name: "branch".to_string(),
            multi_vsys: true,
            mode: MODE_FIPS.to_string(),
            default_vsys: "vsys2".to_string(),
            ..Template::default()
        };
        assert_eq!(
            t.specify(&V8_0).expect("specify").to_string(),
            r#"<entry name="branch"><settings><multi-vsys>yes</multi-vsys><operational-mode>fips</operational-mode></settings></entry>"#
        );
        assert_eq!(
            t.specify(&V8_1).expect("specify").to_string(),
            r#"<entry name="branch"><settings><default-vsys>vsys2</default-vsys></settings></entry>"#
        );
    }

    #[test]
    fn template_config_is_kept_raw() {
        let xml = r#"<entry name="t1"><settings><default-vsys>vsys1</default-vsys></settings><config><devices><entry name="localhost.localdomain"><vsys><entry name="vsys1"/></vsys></entry></devices></config></entry>"#;
        let node = parse(xml.as_bytes()).expect("xml");
        let t = Template::normalize(&node, &V8_1).expect("normalize");
        assert_eq!(t.default_vsys, "vsys1");
        assert!(t.raw["conf"].starts_with("<devices>"));
        assert_eq!(t.specify(&V8_1).expect("specify").to_string(), xml);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let t = Template {
            name: "x".to_string(),
            mode: "strict".to_string(),
            ..Template::default()
        };
        assert!(t.specify(&V8_0).is_err());
    }
}
