//! Google Cloud service accounts for the Panorama `gcp` plugin.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, PluginObject, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{installed_plugin, PluginInfo, Version};
use crate::wire::{entry_node, expect_tag, text, Emit};
use crate::xpath::{device_prefix, entry_xpath};

const KIND: &str = "gcp account";

pub const PLUGIN: &str = "gcp";

/// Lowest supported plugin release.
pub const MIN_PLUGIN_VERSION: Version = Version::new(1, 0, 0);

pub const CREDENTIAL_PROJECT: &str = "project";
pub const CREDENTIAL_GKE: &str = "gke";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcpAccount {
    pub name: String,
    pub description: String,
    pub project_id: String,
    /// [`CREDENTIAL_PROJECT`] or [`CREDENTIAL_GKE`].
    pub credential_type: String,
    /// Service account JSON key.
    pub credential_file: String,
}

impl Object for GcpAccount {
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
        path.push("plugins".to_string());
        path.push(PLUGIN.to_string());
        path.push("gcp-account".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<EntryV1>()
    }
}

impl PluginObject for GcpAccount {
    fn specify_for(&self, plugins: &[PluginInfo]) -> Result<(String, XmlNode), PangoError> {
        let plugin = installed_plugin(plugins, PLUGIN)
            .ok_or_else(|| PangoError::Plugin(format!("{PLUGIN} plugin is not installed")))?;
        let version = plugin.parsed_version()?;
        if !version.gte(&MIN_PLUGIN_VERSION) {
            return Err(PangoError::Plugin(format!(
                "{PLUGIN} plugin {version} is older than {MIN_PLUGIN_VERSION}"
            )));
        }
        let node = EntryV1::specify(self)?.encode();
        Ok((self.name.clone(), node))
    }
}

struct EntryV1(GcpAccount);

impl Wire for EntryV1 {
    type Entry = GcpAccount;

    fn specify(e: &GcpAccount) -> Result<Self, PangoError> {
        if e.credential_type != CREDENTIAL_PROJECT && e.credential_type != CREDENTIAL_GKE {
            return Err(PangoError::validation(format!(
                "{KIND} {:?}: credential type must be {CREDENTIAL_PROJECT:?} or {CREDENTIAL_GKE:?}",
                e.name
            )));
        }
        Ok(Self(e.clone()))
    }

    fn normalize(self) -> GcpAccount {
        self.0
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        let credential_type = node
            .get_child("service-account-cred-type")
            .and_then(|t| t.children.first())
            .map(|t| t.tag.clone())
            .unwrap_or_default();
        Ok(Self(GcpAccount {
            name: node.attribute("name").unwrap_or_default().to_string(),
            description: text(node, &["description"]),
            project_id: text(node, &["project-id"]),
            credential_type,
            credential_file: text(node, &["credential-file"]),
        }))
    }

    fn encode(&self) -> XmlNode {
        let a = &self.0;
        let mut node = entry_node(&a.name);
        node.text_el("description", &a.description);
        node.text_el("project-id", &a.project_id);
        if !a.credential_type.is_empty() {
            node.children.push(
                XmlNode::new("service-account-cred-type")
                    .child(XmlNode::new(a.credential_type.as_str())),
            );
        }
        node.text_el("credential-file", &a.credential_file);
        node
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{GcpAccount, CREDENTIAL_PROJECT};
    use crate::error::PangoError;
    use crate::namespace::Plugin;
    use crate::testing::ScriptedClient;
    use crate::version::{PluginInfo, V9_0};

    fn gcp(version: &str) -> PluginInfo {
        PluginInfo {
            name: "gcp".to_string(),
            version: version.to_string(),
            installed: true,
            ..PluginInfo::default()
        }
    }

    fn account() -> GcpAccount {
        GcpAccount {
            name: "prod".to_string(),
            project_id: "acme-prod".to_string(),
            credential_type: CREDENTIAL_PROJECT.to_string(),
            credential_file: "{\"type\":\"service_account\"}".to_string(),
            ..GcpAccount::default()
        }
    }

    #[test]
    fn set_with_the_plugin_installed() {
        let client = ScriptedClient::new(V9_0).with_plugins(vec![gcp("1.0.2")]);
        let ns: Plugin<'_, GcpAccount> = Plugin::new(&client);
        ns.set(&(), &[account()]).expect("set");
        let call = &client.calls()[0];
        assert_eq!(
            call.xpath,
            "/config/devices/entry[@name='localhost.localdomain']/plugins/gcp/gcp-account"
        );
        assert!(call
            .element
            .contains("<service-account-cred-type><project/></service-account-cred-type>"));
    }

    #[test]
    fn missing_or_old_plugin_is_refused_without_io() {
        let client = ScriptedClient::new(V9_0);
        let ns: Plugin<'_, GcpAccount> = Plugin::new(&client);
        let err = ns.set(&(), &[account()]).expect_err("no plugin");
        assert!(matches!(err, PangoError::Plugin(_)));

        let client = ScriptedClient::new(V9_0).with_plugins(vec![gcp("0.9.1")]);
        let ns: Plugin<'_, GcpAccount> = Plugin::new(&client);
        let err = ns.edit(&(), &account()).expect_err("old plugin");
        assert!(err.to_string().contains("0.9.1"));
        assert!(client.calls().is_empty());
    }
}
