//! Static ARP entries on layer3 interfaces, sub-interfaces and VLANs.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::Version;
use crate::wire::{entry_node, expect_tag, text, Emit};
use crate::xpath::{entry_xpath, NetworkScope};

const KIND: &str = "arp entry";

/// The interface an ARP table hangs off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArpScope {
    pub network: NetworkScope,
    /// `ethernet`, `aggregate-ethernet` or `vlan`.
    pub interface_type: String,
    /// Parent interface; must be empty for `vlan`.
    pub interface_name: String,
    /// Optional sub-interface (or VLAN unit).
    pub subinterface_name: String,
}

impl ArpScope {
    fn prefix(&self) -> Result<Vec<String>, PangoError> {
        let mut path = self.network.network_prefix()?;
        path.push("interface".to_string());
        match self.interface_type.as_str() {
            "ethernet" | "aggregate-ethernet" => {
                if self.interface_name.is_empty() {
                    return Err(PangoError::validation(format!(
                        "{} arp entries require the interface name",
                        self.interface_type
                    )));
                }
                path.push(self.interface_type.clone());
                path.push(entry_xpath(&[self.interface_name.as_str()]));
                path.push("layer3".to_string());
            }
            "vlan" => {
                if !self.interface_name.is_empty() {
                    return Err(PangoError::validation(
                        "vlan arp entries must not name a parent interface",
                    ));
                }
                path.push("vlan".to_string());
            }
            other => {
                return Err(PangoError::validation(format!(
                    "arp entries cannot live under interface type {other:?}"
                )))
            }
        }
        if !self.subinterface_name.is_empty() {
            path.push("units".to_string());
            path.push(entry_xpath(&[self.subinterface_name.as_str()]));
        }
        Ok(path)
    }
}

/// A static ARP entry; the name is the IP address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arp {
    pub ip: String,
    pub mac_address: String,
    /// Member interface, for VLAN ARP tables only.
    pub interface: String,
}

impl Object for Arp {
    const KIND: &'static str = KIND;
    type Location = ArpScope;

    fn name(&self) -> &str {
        &self.ip
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.ip
    }

    fn xpath(loc: &ArpScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix()?;
        path.push("arp".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<EntryV1>()
    }
}

struct EntryV1 {
    name: String,
    hw_address: String,
    interface: String,
}

impl Wire for EntryV1 {
    type Entry = Arp;

    fn specify(e: &Arp) -> Result<Self, PangoError> {
        Ok(Self {
            name: e.ip.clone(),
            hw_address: e.mac_address.clone(),
            interface: e.interface.clone(),
        })
    }

    fn normalize(self) -> Arp {
        Arp {
            ip: self.name,
            mac_address: self.hw_address,
            interface: self.interface,
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            hw_address: text(node, &["hw-address"]),
            interface: text(node, &["interface"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.text_el("hw-address", &self.hw_address);
        node.text_el("interface", &self.interface);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::{Arp, ArpScope};
    use crate::codec::Object;
    use crate::xpath::{join, NetworkScope};

    fn scope(kind: &str, iface: &str, sub: &str) -> ArpScope {
        ArpScope {
            network: NetworkScope::Firewall,
            interface_type: kind.to_string(),
            interface_name: iface.to_string(),
            subinterface_name: sub.to_string(),
        }
    }

    #[test]
    fn parent_is_validated_per_interface_type() {
        assert!(Arp::xpath(&scope("ethernet", "", ""), &[]).is_err());
        assert!(Arp::xpath(&scope("vlan", "ethernet1/1", ""), &[]).is_err());
        assert!(Arp::xpath(&scope("tunnel", "", ""), &[]).is_err());
        let path = Arp::xpath(&scope("aggregate-ethernet", "ae1", "ae1.10"), &["10.0.0.5".to_string()])
            .expect("xpath");
        assert!(join(&path).ends_with(
            "/interface/aggregate-ethernet/entry[@name='ae1']/layer3/units/entry[@name='ae1.10']/arp/entry[@name='10.0.0.5']"
        ));
        let vlan = Arp::xpath(&scope("vlan", "", ""), &[]).expect("xpath");
        assert!(join(&vlan).ends_with("/interface/vlan/arp/entry"));
    }
}
