//! Configuration and commit locks.

use panos_xml::XmlNode;
use serde::Serialize;

use crate::client::Client;
use crate::error::PangoError;
use crate::namespace::Common;
use crate::wire::{text, Emit};

/// Which lock to inspect or change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Config,
    Commit,
}

impl LockKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Config => "config-lock",
            Self::Commit => "commit-lock",
        }
    }

    fn list_tag(self) -> &'static str {
        match self {
            Self::Config => "config-locks",
            Self::Commit => "commit-locks",
        }
    }
}

/// One lock holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lock {
    pub admin: String,
    pub comment: String,
    pub created: String,
    pub last_activity: String,
}

/// Current holders of `kind` locks in `vsys` (empty for the device).
pub fn show(client: &dyn Client, kind: LockKind, vsys: &str) -> Result<Vec<Lock>, PangoError> {
    let cmd = XmlNode::new("show").child(XmlNode::new(kind.list_tag()));
    let result = Common::new(client, kind.tag()).op(&cmd, vsys)?;
    Ok(result
        .descendants("entry")
        .into_iter()
        .map(|entry| Lock {
            admin: entry.attribute("name").unwrap_or_default().to_string(),
            comment: text(entry, &["comment"]),
            created: text(entry, &["created"]),
            last_activity: text(entry, &["last-activity"]),
        })
        .collect())
}

/// Take a `kind` lock.
pub fn lock(client: &dyn Client, kind: LockKind, comment: &str, vsys: &str) -> Result<(), PangoError> {
    let mut add = XmlNode::new("add");
    add.text_el("comment", comment);
    let cmd = XmlNode::new("request").child(XmlNode::new(kind.tag()).child(add));
    Common::new(client, kind.tag()).op(&cmd, vsys).map(drop)
}

/// Release the caller's `kind` lock.
pub fn unlock(client: &dyn Client, kind: LockKind, vsys: &str) -> Result<(), PangoError> {
    let cmd = XmlNode::new("request").child(XmlNode::new(kind.tag()).child(XmlNode::new("remove")));
    Common::new(client, kind.tag()).op(&cmd, vsys).map(drop)
}

#[cfg(test)]
mod tests {
    use super::{lock, show, unlock, LockKind};
    use crate::testing::ScriptedClient;
    use crate::version::V9_0;

    #[test]
    fn lock_requests() {
        let client = ScriptedClient::new(V9_0);
        lock(&client, LockKind::Config, "maintenance", "vsys2").expect("lock");
        unlock(&client, LockKind::Commit, "").expect("unlock");
        let calls = client.calls();
        assert_eq!(
            calls[0].element,
            "<request><config-lock><add><comment>maintenance</comment></add></config-lock></request>"
        );
        assert_eq!(calls[0].xpath, "vsys2");
        assert_eq!(
            calls[1].element,
            "<request><commit-lock><remove/></commit-lock></request>"
        );
    }

    #[test]
    fn holders_are_listed() {
        let client = ScriptedClient::new(V9_0);
        client.push_result(
            r#"<commit-locks><entry name="admin"><comment>upgrade</comment><created>2024/03/01 09:00:00</created></entry></commit-locks>"#,
        );
        let holders = show(&client, LockKind::Commit, "").expect("show");
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].admin, "admin");
        assert_eq!(holders[0].comment, "upgrade");
    }
}
