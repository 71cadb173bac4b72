//! IPsec crypto profiles.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use super::crypto::{normalize_names, specify_names, EncryptionEra, IPSEC_RENAMES};
use super::ike_crypto::{decode_unit, lifetime_node, LIFETIME_UNITS};
use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V7_0};
use crate::wire::{entry_node, expect_tag, members, text, Emit};
use crate::xpath::{entry_xpath, NetworkScope};

const KIND: &str = "ipsec crypto profile";

const LIFESIZE_UNITS: [&str; 4] = ["kb", "mb", "gb", "tb"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpsecCryptoProfile {
    pub name: String,
    /// `esp` (the default when empty) or `ah`.
    pub protocol: String,
    /// Canonical (7.0+) names; ESP only; unordered.
    pub encryption: Vec<String>,
    /// Unordered.
    pub authentication: Vec<String>,
    /// A single group such as `group14`, or `no-pfs`.
    pub dh_group: String,
    pub lifetime_type: String,
    pub lifetime_value: u32,
    /// One of `kb`, `mb`, `gb`, `tb`.
    pub lifesize_type: String,
    pub lifesize_value: u32,
}

impl IpsecCryptoProfile {
    /// The encryption list spelled for `era`.
    pub fn specify_encryption(&self, era: EncryptionEra) -> Result<Vec<String>, PangoError> {
        specify_names(&self.encryption, era, &IPSEC_RENAMES)
    }

    /// Rewrite the encryption list into canonical spelling.
    pub fn normalize_encryption(&mut self) {
        self.encryption = normalize_names(&self.encryption, &IPSEC_RENAMES);
    }
}

impl Object for IpsecCryptoProfile {
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
        for segment in ["ike", "crypto-profiles", "ipsec-crypto-profiles"] {
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

/// PAN-OS before 7.0: legacy names, no GCM.
struct EntryV1 {
    name: String,
    ah: bool,
    encryption: Vec<String>,
    authentication: Vec<String>,
    dh_group: String,
    lifetime: (String, u32),
    lifesize: (String, u32),
}

impl EntryV1 {
    fn project(e: &IpsecCryptoProfile, era: EncryptionEra) -> Result<Self, PangoError> {
        let ah = match e.protocol.as_str() {
            "" | "esp" => false,
            "ah" => true,
            other => {
                return Err(PangoError::validation(format!(
                    "ipsec crypto profile {:?}: unknown protocol {other:?}",
                    e.name
                )))
            }
        };
        if ah && !e.encryption.is_empty() {
            return Err(PangoError::validation(format!(
                "ipsec crypto profile {:?}: ah does not take encryption",
                e.name
            )));
        }
        if !e.lifetime_type.is_empty() && !LIFETIME_UNITS.contains(&e.lifetime_type.as_str()) {
            return Err(PangoError::validation(format!(
                "ipsec crypto profile {:?}: unknown lifetime unit {:?}",
                e.name, e.lifetime_type
            )));
        }
        if !e.lifesize_type.is_empty() && !LIFESIZE_UNITS.contains(&e.lifesize_type.as_str()) {
            return Err(PangoError::validation(format!(
                "ipsec crypto profile {:?}: unknown lifesize unit {:?}",
                e.name, e.lifesize_type
            )));
        }
        Ok(Self {
            name: e.name.clone(),
            ah,
            encryption: e.specify_encryption(era)?,
            authentication: e.authentication.clone(),
            dh_group: e.dh_group.clone(),
            lifetime: (e.lifetime_type.clone(), e.lifetime_value),
            lifesize: (e.lifesize_type.clone(), e.lifesize_value),
        })
    }
}

impl Wire for EntryV1 {
    type Entry = IpsecCryptoProfile;

    fn specify(e: &IpsecCryptoProfile) -> Result<Self, PangoError> {
        Self::project(e, EncryptionEra::Legacy)
    }

    fn normalize(self) -> IpsecCryptoProfile {
        let mut e = IpsecCryptoProfile {
            name: self.name,
            protocol: if self.ah { "ah" } else { "esp" }.to_string(),
            encryption: self.encryption,
            authentication: self.authentication,
            dh_group: self.dh_group,
            lifetime_type: self.lifetime.0,
            lifetime_value: self.lifetime.1,
            lifesize_type: self.lifesize.0,
            lifesize_value: self.lifesize.1,
        };
        e.normalize_encryption();
        e
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        let ah = node.get_child("ah").is_some();
        let proto = if ah { "ah" } else { "esp" };
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            ah,
            encryption: members(node, &[proto, "encryption"]),
            authentication: members(node, &[proto, "authentication"]),
            dh_group: text(node, &["dh-group"]),
            lifetime: decode_unit(node, "lifetime", KIND)?,
            lifesize: decode_unit(node, "lifesize", KIND)?,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        let mut proto = XmlNode::new(if self.ah { "ah" } else { "esp" });
        proto.members_el("encryption", &self.encryption);
        proto.members_el("authentication", &self.authentication);
        node.children.push(proto);
        node.text_el("dh-group", &self.dh_group);
        node.node_el(lifetime_node("lifetime", &self.lifetime.0, self.lifetime.1));
        node.node_el(lifetime_node("lifesize", &self.lifesize.0, self.lifesize.1));
        node
    }
}

/// PAN-OS 7.0 and later: renamed encryption including GCM.
struct EntryV2 {
    base: EntryV1,
}

impl Wire for EntryV2 {
    type Entry = IpsecCryptoProfile;

    fn specify(e: &IpsecCryptoProfile) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::project(e, EncryptionEra::Current)?,
        })
    }

    fn normalize(self) -> IpsecCryptoProfile {
        self.base.normalize()
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::decode(node)?,
        })
    }

    fn encode(&self) -> XmlNode {
        self.base.encode()
    }
}
