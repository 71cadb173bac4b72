//! VM information sources.
//!
//! Each source watches exactly one hypervisor or cloud inventory. The device
//! omits leaves that are at their defaults, so decoding fills those back in.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V9_0};
use crate::wire::{entry_node, expect_tag, flag, number, text, Emit};
use crate::xpath::{entry_xpath, VsysScope};

const KIND: &str = "vm information source";

pub const DEFAULT_PORT: u32 = 443;
pub const DEFAULT_UPDATE_INTERVAL: u32 = 5;
pub const DEFAULT_TIMEOUT: u32 = 2;
pub const DEFAULT_AWS_UPDATE_INTERVAL: u32 = 60;

pub const GCE_AUTH_IN_GCE: &str = "service-in-gce";
pub const GCE_AUTH_ACCOUNT: &str = "service-account";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsVpc {
    pub description: String,
    pub disabled: bool,
    pub source: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub update_interval: u32,
    pub vpc_id: String,
}

/// Shared by the ESXi and vCenter sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmwareSource {
    pub description: String,
    pub port: u32,
    pub disabled: bool,
    pub enable_timeout: bool,
    pub timeout: u32,
    pub source: String,
    pub username: String,
    pub password: String,
    pub update_interval: u32,
}

/// PAN-OS 9.0 and later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleCompute {
    pub description: String,
    pub disabled: bool,
    /// [`GCE_AUTH_IN_GCE`] or [`GCE_AUTH_ACCOUNT`].
    pub auth_type: String,
    pub service_account_credential: String,
    pub project_id: String,
    pub zone_name: String,
    pub update_interval: u32,
    pub enable_timeout: bool,
    pub timeout: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmInfoSource {
    pub name: String,
    pub aws_vpc: Option<AwsVpc>,
    pub esxi: Option<VmwareSource>,
    pub vcenter: Option<VmwareSource>,
    pub google_compute: Option<GoogleCompute>,
}

impl Object for VmInfoSource {
    const KIND: &'static str = KIND;
    type Location = VsysScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &VsysScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix()?;
        path.push("vm-info-source".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        if version.gte(&V9_0) {
            era::<EntryV2>()
        } else {
            era::<EntryV1>()
        }
    }
}

fn or_default(value: u32, default: u32) -> u32 {
    if value == 0 {
        default
    } else {
        value
    }
}

fn decode_aws(node: &XmlNode) -> Result<AwsVpc, PangoError> {
    Ok(AwsVpc {
        description: text(node, &["description"]),
        disabled: flag(node, &["disabled"]),
        source: text(node, &["source"]),
        access_key_id: text(node, &["access-key-id"]),
        secret_access_key: text(node, &["secret-access-key"]),
        update_interval: or_default(
            number(node, &["update-interval"], KIND)?,
            DEFAULT_AWS_UPDATE_INTERVAL,
        ),
        vpc_id: text(node, &["vpc-id"]),
    })
}

fn encode_aws(a: &AwsVpc) -> XmlNode {
    let mut node = XmlNode::new("AWS-VPC");
    node.text_el("description", &a.description);
    node.flag_el("disabled", a.disabled);
    node.text_el("source", &a.source);
    node.text_el("access-key-id", &a.access_key_id);
    node.text_el("secret-access-key", &a.secret_access_key);
    node.num_el("update-interval", a.update_interval);
    node.text_el("vpc-id", &a.vpc_id);
    node
}

fn decode_vmware(node: &XmlNode) -> Result<VmwareSource, PangoError> {
    Ok(VmwareSource {
        description: text(node, &["description"]),
        port: or_default(number(node, &["port"], KIND)?, DEFAULT_PORT),
        disabled: flag(node, &["disabled"]),
        enable_timeout: flag(node, &["vm-info-timeout-enabled"]),
        timeout: or_default(number(node, &["vm-info-timeout"], KIND)?, DEFAULT_TIMEOUT),
        source: text(node, &["source"]),
        username: text(node, &["username"]),
        password: text(node, &["password"]),
        update_interval: or_default(
            number(node, &["update-interval"], KIND)?,
            DEFAULT_UPDATE_INTERVAL,
        ),
    })
}

fn encode_vmware(tag: &str, v: &VmwareSource) -> XmlNode {
    let mut node = XmlNode::new(tag);
    node.text_el("description", &v.description);
    node.num_el("port", v.port);
    node.flag_el("disabled", v.disabled);
    node.flag_el("vm-info-timeout-enabled", v.enable_timeout);
    node.num_el("vm-info-timeout", v.timeout);
    node.text_el("source", &v.source);
    node.text_el("username", &v.username);
    node.text_el("password", &v.password);
    node.num_el("update-interval", v.update_interval);
    node
}

/// PAN-OS before 9.0.
struct EntryV1 {
    name: String,
    aws_vpc: Option<AwsVpc>,
    esxi: Option<VmwareSource>,
    vcenter: Option<VmwareSource>,
}

impl EntryV1 {
    fn project(e: &VmInfoSource) -> Result<Self, PangoError> {
        let count = [
            e.aws_vpc.is_some(),
            e.esxi.is_some(),
            e.vcenter.is_some(),
            e.google_compute.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if count != 1 {
            return Err(PangoError::validation(format!(
                "{KIND} {:?}: exactly one source type must be specified",
                e.name
            )));
        }
        Ok(Self {
            name: e.name.clone(),
            aws_vpc: e.aws_vpc.clone(),
            esxi: e.esxi.clone(),
            vcenter: e.vcenter.clone(),
        })
    }
}

impl Wire for EntryV1 {
    type Entry = VmInfoSource;

    fn specify(e: &VmInfoSource) -> Result<Self, PangoError> {
        if e.google_compute.is_some() {
            return Err(PangoError::validation(format!(
                "{KIND} {:?}: Google Compute sources require PAN-OS 9.0",
                e.name
            )));
        }
        Self::project(e)
    }

    fn normalize(self) -> VmInfoSource {
        VmInfoSource {
            name: self.name,
            aws_vpc: self.aws_vpc,
            esxi: self.esxi,
            vcenter: self.vcenter,
            google_compute: None,
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            aws_vpc: node.get_child("AWS-VPC").map(decode_aws).transpose()?,
            esxi: node.get_child("VMware-ESXi").map(decode_vmware).transpose()?,
            vcenter: node.get_child("VMware-vCenter").map(decode_vmware).transpose()?,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.node_el(self.aws_vpc.as_ref().map(encode_aws));
        node.node_el(self.esxi.as_ref().map(|v| encode_vmware("VMware-ESXi", v)));
        node.node_el(self.vcenter.as_ref().map(|v| encode_vmware("VMware-vCenter", v)));
        node
    }
}

/// PAN-OS 9.0 and later: Google Compute Engine.
struct EntryV2 {
    base: EntryV1,
    google_compute: Option<GoogleCompute>,
}

impl Wire for EntryV2 {
    type Entry = VmInfoSource;

    fn specify(e: &VmInfoSource) -> Result<Self, PangoError> {
        if let Some(gce) = &e.google_compute {
            if gce.auth_type != GCE_AUTH_IN_GCE && gce.auth_type != GCE_AUTH_ACCOUNT {
                return Err(PangoError::validation(format!(
                    "{KIND} {:?}: unknown Google Compute auth type {:?}",
                    e.name, gce.auth_type
                )));
            }
        }
        Ok(Self {
            base: EntryV1::project(e)?,
            google_compute: e.google_compute.clone(),
        })
    }

    fn normalize(self) -> VmInfoSource {
        VmInfoSource {
            google_compute: self.google_compute,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        let google_compute = node
            .get_child("Google-Compute-Engine")
            .map(|g| -> Result<GoogleCompute, PangoError> {
                let (auth_type, credential) = if g.find(&["service-auth-type", GCE_AUTH_ACCOUNT]).is_some() {
                    (
                        GCE_AUTH_ACCOUNT.to_string(),
                        text(g, &["service-auth-type", GCE_AUTH_ACCOUNT, "service-account-cred"]),
                    )
                } else {
                    (GCE_AUTH_IN_GCE.to_string(), String::new())
                };
                Ok(GoogleCompute {
                    description: text(g, &["description"]),
                    disabled: flag(g, &["disabled"]),
                    auth_type,
                    service_account_credential: credential,
                    project_id: text(g, &["project-id"]),
                    zone_name: text(g, &["zone-name"]),
                    update_interval: or_default(
                        number(g, &["update-interval"], KIND)?,
                        DEFAULT_UPDATE_INTERVAL,
                    ),
                    enable_timeout: flag(g, &["vm-info-timeout-enabled"]),
                    timeout: or_default(number(g, &["vm-info-timeout"], KIND)?, DEFAULT_TIMEOUT),
                })
            })
            .transpose()?;
        Ok(Self {
            base: EntryV1::decode(node)?,
            google_compute,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        if let Some(g) = &self.google_compute {
            let mut gce = XmlNode::new("Google-Compute-Engine");
            gce.text_el("description", &g.description);
            gce.flag_el("disabled", g.disabled);
            let auth = if g.auth_type == GCE_AUTH_ACCOUNT {
                let mut account = XmlNode::new(GCE_AUTH_ACCOUNT);
                account.text_el("service-account-cred", &g.service_account_credential);
                account
            } else {
                XmlNode::new(GCE_AUTH_IN_GCE)
            };
            gce.children.push(XmlNode::new("service-auth-type").child(auth));
            gce.text_el("project-id", &g.project_id);
            gce.text_el("zone-name", &g.zone_name);
            gce.num_el("update-interval", g.update_interval);
            gce.flag_el("vm-info-timeout-enabled", g.enable_timeout);
            gce.num_el("vm-info-timeout", g.timeout);
            node.children.push(gce);
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use panos_xml::parse;
    use pretty_assertions::assert_eq;

    use super::{GoogleCompute, VmInfoSource, VmwareSource, GCE_AUTH_ACCOUNT};
    use crate::codec::Object;
    use crate::version::{V8_1, V9_0};

    #[test]
    fn omitted_leaves_take_device_defaults() {
        let node = parse(
            br#"<entry name="lab"><VMware-ESXi><source>esx.lab</source><username>ro</username></VMware-ESXi></entry>"#,
        )
        .expect("xml");
        let src = VmInfoSource::normalize(&node, &V8_1).expect("normalize");
        let esxi = src.esxi.expect("esxi");
        assert_eq!((esxi.port, esxi.update_interval, esxi.timeout), (443, 5, 2));

        let aws = parse(br#"<entry name="cloud"><AWS-VPC><vpc-id>vpc-1</vpc-id></AWS-VPC></entry>"#)
            .expect("xml");
        let src = VmInfoSource::normalize(&aws, &V8_1).expect("normalize");
        assert_eq!(src.aws_vpc.map(|a| a.update_interval), Some(60));
    }

    #[test]
    fn exactly_one_source() {
        let both = VmInfoSource {
            name: "x".to_string(),
            esxi: Some(VmwareSource::default()),
            vcenter: Some(VmwareSource::default()),
            ..VmInfoSource::default()
        };
        assert!(both.specify(&V9_0).is_err());
        let none = VmInfoSource {
            name: "x".to_string(),
            ..VmInfoSource::default()
        };
        assert!(none.specify(&V9_0).is_err());
    }

    #[test]
    fn google_compute_is_nine_only() {
        let src = VmInfoSource {
            name: "gcp".to_string(),
            google_compute: Some(GoogleCompute {
                auth_type: GCE_AUTH_ACCOUNT.to_string(),
                service_account_credential: "{}".to_string(),
                project_id: "p1".to_string(),
                update_interval: 5,
                timeout: 2,
                ..GoogleCompute::default()
            }),
            ..VmInfoSource::default()
        };
        assert!(src.specify(&V8_1).is_err());
        let node = src.specify(&V9_0).expect("specify");
        assert_eq!(
            node.find(&["Google-Compute-Engine", "service-auth-type"])
                .map(ToString::to_string)
                .as_deref(),
            Some("<service-auth-type><service-account><service-account-cred>{}</service-account-cred></service-account></service-auth-type>")
        );
        assert_eq!(VmInfoSource::normalize(&node, &V9_0).expect("normalize"), src);
    }

    #[test]
    fn copy_keeps_the_receiver_name() {
        let mut target = VmInfoSource {
            name: "keep".to_string(),
            ..VmInfoSource::default()
        };
        let source = VmInfoSource {
            name: "other".to_string(),
            esxi: Some(VmwareSource {
                port: 8443,
                ..VmwareSource::default()
            }),
            ..VmInfoSource::default()
        };
        target.copy_from(&source);
        assert_eq!(target.name, "keep");
        assert_eq!(target.esxi.map(|e| e.port), Some(8443));
    }
}
