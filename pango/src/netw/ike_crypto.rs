//! IKE crypto profiles.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use super::crypto::{normalize_names, specify_names, EncryptionEra, IKE_RENAMES};
use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V7_0};
use crate::wire::{entry_node, expect_tag, members, number, Emit};
use crate::xpath::{entry_xpath, NetworkScope};

const KIND: &str = "ike crypto profile";

pub(crate) const LIFETIME_UNITS: [&str; 4] = ["seconds", "minutes", "hours", "days"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IkeCryptoProfile {
    pub name: String,
    /// Unordered.
    pub dh_groups: Vec<String>,
    /// Hash algorithms; unordered.
    pub authentication: Vec<String>,
    /// Canonical (7.0+) names; unordered.
    pub encryption: Vec<String>,
    /// One of `seconds`, `minutes`, `hours`, `days`.
    pub lifetime_type: String,
    pub lifetime_value: u32,
    /// PAN-OS 7.0 and later.
    pub authentication_multiple: u32,
}

impl IkeCryptoProfile {
    /// The encryption list spelled for `era`.
    pub fn specify_encryption(&self, era: EncryptionEra) -> Result<Vec<String>, PangoError> {
        specify_names(&self.encryption, era, &IKE_RENAMES)
    }

    /// Rewrite the encryption list into canonical spelling.
    pub fn normalize_encryption(&mut self) {
        self.encryption = normalize_names(&self.encryption, &IKE_RENAMES);
    }
}

impl Object for IkeCryptoProfile {
    const KIND: &'static str = KIND;
    type Location = NetworkScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &NetworkScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.network_prefix()?;
        for segment in ["ike", "crypto-profiles", "ike-crypto-profiles"] {
            path.push(segment.to_string());
        }
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        if version.gte(&V7_0) {
            era::<EntryV2>()
        } else {
            era::<EntryV1>()
        }
    }
}

/// `<lifetime><hours>8</hours></lifetime>` style unit choice.
pub(crate) fn lifetime_node(tag: &str, unit: &str, value: u32) -> Option<XmlNode> {
    if unit.is_empty() {
        return None;
    }
    Some(XmlNode::new(tag).child(XmlNode::with_text(unit, value.to_string())))
}

pub(crate) fn decode_unit(
    node: &XmlNode,
    tag: &str,
    kind: &'static str,
) -> Result<(String, u32), PangoError> {
    let Some(choice) = node.get_child(tag).and_then(|n| n.children.first()) else {
        return Ok((String::new(), 0));
    };
    let value = number(choice, &[], kind)?;
    Ok((choice.tag.clone(), value))
}

/// PAN-OS before 7.0: legacy encryption names.
struct EntryV1 {
    name: String,
    dh_groups: Vec<String>,
    hash: Vec<String>,
    encryption: Vec<String>,
    lifetime: (String, u32),
}

impl EntryV1 {
    fn project(e: &IkeCryptoProfile, era: EncryptionEra) -> Result<Self, PangoError> {
        if !e.lifetime_type.is_empty() && !LIFETIME_UNITS.contains(&e.lifetime_type.as_str()) {
            return Err(PangoError::validation(format!(
                "ike crypto profile {:?}: unknown lifetime unit {:?}",
                e.name, e.lifetime_type
            )));
        }
        Ok(Self {
            name: e.name.clone(),
            dh_groups: e.dh_groups.clone(),
            hash: e.authentication.clone(),
            encryption: e.specify_encryption(era)?,
            lifetime: (e.lifetime_type.clone(), e.lifetime_value),
        })
    }
}

impl Wire for EntryV1 {
    type Entry = IkeCryptoProfile;

    fn specify(e: &IkeCryptoProfile) -> Result<Self, PangoError> {
        Self::project(e, EncryptionEra::Legacy)
    }

    fn normalize(self) -> IkeCryptoProfile {
        let mut e = IkeCryptoProfile {
            name: self.name,
            dh_groups: self.dh_groups,
            authentication: self.hash,
            encryption: self.encryption,
            lifetime_type: self.lifetime.0,
            lifetime_value: self.lifetime.1,
            authentication_multiple: 0,
        };
        e.normalize_encryption();
        e
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            dh_groups: members(node, &["dh-group"]),
            hash: members(node, &["hash"]),
            encryption: members(node, &["encryption"]),
            lifetime: decode_unit(node, "lifetime", KIND)?,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.members_el("dh-group", &self.dh_groups);
        node.members_el("hash", &self.hash);
        node.members_el("encryption", &self.encryption);
        node.node_el(lifetime_node("lifetime", &self.lifetime.0, self.lifetime.1));
        node
    }
}

/// PAN-OS 7.0 and later: renamed encryption, authentication multiple.
struct EntryV2 {
    base: EntryV1,
    authentication_multiple: u32,
}

impl Wire for EntryV2 {
    type Entry = IkeCryptoProfile;

    fn specify(e: &IkeCryptoProfile) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::project(e, EncryptionEra::Current)?,
            authentication_multiple: e.authentication_multiple,
        })
    }

    fn normalize(self) -> IkeCryptoProfile {
        IkeCryptoProfile {
            authentication_multiple: self.authentication_multiple,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::decode(node)?,
            authentication_multiple: number(node, &["authentication-multiple"], KIND)?,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        node.num_el("authentication-multiple", self.authentication_multiple);
        node
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::IkeCryptoProfile;
    use crate::codec::Object;
    use crate::version::{V6_1, V8_0};
    use crate::wire::same_set;

    fn profile() -> IkeCryptoProfile {
        IkeCryptoProfile {
            name: "ike-aes".to_string(),
            dh_groups: vec!["group14".to_string(), "group2".to_string()],
            authentication: vec!["sha256".to_string()],
            encryption: vec!["aes-256-cbc".to_string(), "3des".to_string()],
            lifetime_type: "hours".to_string(),
            lifetime_value: 8,
            authentication_multiple: 3,
        }
    }

    #[test]
    fn current_era_keeps_canonical_names() {
        let node = profile().specify(&V8_0).expect("specify");
        assert_eq!(
            node.to_string(),
            r#"<entry name="ike-aes"><dh-group><member>group14</member><member>group2</member></dh-group><hash><member>sha256</member></hash><encryption><member>aes-256-cbc</member><member>3des</member></encryption><lifetime><hours>8</hours></lifetime><authentication-multiple>3</authentication-multiple></entry>"#
        );
        assert_eq!(IkeCryptoProfile::normalize(&node, &V8_0).expect("normalize"), profile());
    }

    #[test]
    fn legacy_era_renames_and_drops_authentication_multiple() {
        let node = profile().specify(&V6_1).expect("specify");
        assert_eq!(
            node.get_child("encryption").map(ToString::to_string).as_deref(),
            Some("<encryption><member>aes256</member><member>3des</member></encryption>")
        );
        assert!(node.get_child("authentication-multiple").is_none());
        let back = IkeCryptoProfile::normalize(&node, &V6_1).expect("normalize");
        assert!(same_set(&back.encryption, &profile().encryption));
        assert_eq!(back.authentication_multiple, 0);
    }
}
