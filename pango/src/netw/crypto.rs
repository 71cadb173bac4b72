//! Encryption algorithm names across the PAN-OS 7.0 rename.
//!
//! Entries always carry the current (7.0+) spelling. Specifiers translate to
//! the era spelling on egress and normalizers translate back on ingress.

use serde::{Deserialize, Serialize};

use crate::error::PangoError;
use crate::version::{Version, V7_0};

/// Spelling family of encryption algorithm names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionEra {
    /// Before PAN-OS 7.0 (`aes128`, `aes256`, ...).
    Legacy,
    /// PAN-OS 7.0 and later (`aes-128-cbc`, `aes-256-gcm`, ...).
    Current,
}

impl EncryptionEra {
    pub fn for_version(version: &Version) -> Self {
        if version.gte(&V7_0) {
            Self::Current
        } else {
            Self::Legacy
        }
    }
}

/// `(current, legacy)` pairs that differ between eras.
pub(crate) const IKE_RENAMES: [(&str, &str); 3] = [
    ("aes-128-cbc", "aes128"),
    ("aes-192-cbc", "aes192"),
    ("aes-256-cbc", "aes256"),
];

pub(crate) const IPSEC_RENAMES: [(&str, &str); 4] = [
    ("aes-128-cbc", "aes128"),
    ("aes-192-cbc", "aes192"),
    ("aes-256-cbc", "aes256"),
    ("aes-128-ccm", "aes128ccm16"),
];

/// Names only the current era understands.
pub(crate) const CURRENT_ONLY: [&str; 2] = ["aes-128-gcm", "aes-256-gcm"];

/// Rewrite canonical names into `era` spelling.
pub(crate) fn specify_names(
    names: &[String],
    era: EncryptionEra,
    renames: &[(&str, &str)],
) -> Result<Vec<String>, PangoError> {
    if era == EncryptionEra::Current {
        return Ok(names.to_vec());
    }
    names
        .iter()
        .map(|name| {
            if CURRENT_ONLY.contains(&name.as_str()) {
                return Err(PangoError::validation(format!(
                    "encryption {name:?} requires PAN-OS 7.0"
                )));
            }
            Ok(renames
                .iter()
                .find(|(current, _)| current == name)
                .map(|(_, legacy)| (*legacy).to_string())
                .unwrap_or_else(|| name.clone()))
        })
        .collect()
}

/// Rewrite any era's spelling into canonical names.
pub(crate) fn normalize_names(names: &[String], renames: &[(&str, &str)]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            renames
                .iter()
                .find(|(_, legacy)| legacy == name)
                .map(|(current, _)| (*current).to_string())
                .unwrap_or_else(|| name.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_names, specify_names, EncryptionEra, IPSEC_RENAMES};
    use crate::version::{V6_1, V7_0};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn legacy_spelling_round_trips() {
        let canonical = names(&["aes-128-cbc", "3des", "aes-128-ccm"]);
        let legacy = specify_names(&canonical, EncryptionEra::Legacy, &IPSEC_RENAMES).expect("legacy");
        assert_eq!(legacy, names(&["aes128", "3des", "aes128ccm16"]));
        assert_eq!(normalize_names(&legacy, &IPSEC_RENAMES), canonical);
    }

    #[test]
    fn gcm_is_current_only() {
        let gcm = names(&["aes-256-gcm"]);
        assert!(specify_names(&gcm, EncryptionEra::Legacy, &IPSEC_RENAMES).is_err());
        assert_eq!(
            specify_names(&gcm, EncryptionEra::Current, &IPSEC_RENAMES).expect("current"),
            gcm
        );
    }

    #[test]
    fn era_follows_the_version() {
        assert_eq!(EncryptionEra::for_version(&V6_1), EncryptionEra::Legacy);
        assert_eq!(EncryptionEra::for_version(&V7_0), EncryptionEra::Current);
    }
}
