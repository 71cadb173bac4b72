//! Installed licenses.

use panos_xml::XmlNode;
use serde::Serialize;

use crate::client::Client;
use crate::error::PangoError;
use crate::namespace::Common;
use crate::wire::{flag, text};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct License {
    pub feature: String,
    pub description: String,
    pub serial: String,
    pub issued: String,
    pub expires: String,
    pub expired: bool,
    pub auth_code: String,
}

impl License {
    fn decode(node: &XmlNode) -> Self {
        Self {
            feature: text(node, &["feature"]),
            description: text(node, &["description"]),
            serial: text(node, &["serial"]),
            issued: text(node, &["issued"]),
            expires: text(node, &["expires"]),
            expired: flag(node, &["expired"]),
            auth_code: text(node, &["authcode"]),
        }
    }
}

/// `request license info`.
pub fn licenses(client: &dyn Client) -> Result<Vec<License>, PangoError> {
    let cmd = XmlNode::new("request").child(XmlNode::new("license").child(XmlNode::new("info")));
    let result = Common::new(client, "license").op(&cmd, "")?;
    Ok(result
        .find(&["licenses"])
        .map(|l| l.get_children("entry").into_iter().map(License::decode).collect())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::licenses;
    use crate::testing::ScriptedClient;
    use crate::version::V9_0;

    #[test]
    fn license_entries_are_decoded() {
        let client = ScriptedClient::new(V9_0);
        client.push_result(
            "<licenses><entry><feature>Threat Prevention</feature><serial>0071</serial><issued>March 01, 2024</issued><expires>March 01, 2025</expires><expired>no</expired><authcode>I1234</authcode></entry><entry><feature>PAN-DB URL Filtering</feature><expired>yes</expired></entry></licenses>",
        );
        let found = licenses(&client).expect("licenses");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].feature, "Threat Prevention");
        assert_eq!(found[0].auth_code, "I1234");
        assert!(!found[0].expired);
        assert!(found[1].expired);
        assert_eq!(
            client.calls()[0].element,
            "<request><license><info/></license></request>"
        );
    }
}
