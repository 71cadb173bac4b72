//! PAN-OS software versions and installed plugin records.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::error::PangoError;

/// A PAN-OS release number such as `9.1.3-h1`.
///
/// Ordered by `(major, minor, patch)` and then by suffix, so any hotfix of a
/// release satisfies a plain threshold of that release. Hotfix numbers
/// compare numerically (`h9` < `h10`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub suffix: String,
}

pub const V6_1: Version = Version::new(6, 1, 0);
pub const V7_0: Version = Version::new(7, 0, 0);
pub const V7_1: Version = Version::new(7, 1, 0);
pub const V8_0: Version = Version::new(8, 0, 0);
pub const V8_1: Version = Version::new(8, 1, 0);
pub const V9_0: Version = Version::new(9, 0, 0);
pub const V9_1: Version = Version::new(9, 1, 0);
pub const V10_0: Version = Version::new(10, 0, 0);

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            suffix: String::new(),
        }
    }

    /// Greater than or equal to `other`.
    pub fn gte(&self, other: &Version) -> bool {
        self >= other
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| suffix_key(&self.suffix).cmp(&suffix_key(&other.suffix)))
            .then_with(|| self.suffix.cmp(&other.suffix))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split `h12` into `("h", Some(12))`; no suffix sorts first.
fn suffix_key(suffix: &str) -> (&str, Option<u64>) {
    let split = suffix.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    (&suffix[..split], suffix[split..].parse().ok())
}

impl FromStr for Version {
    type Err = PangoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (numbers, suffix) = match s.split_once('-') {
            Some((numbers, suffix)) => (numbers, suffix.to_string()),
            None => (s, String::new()),
        };
        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(PangoError::validation(format!(
                "version {s:?} is not in major.minor[.patch][-suffix] form"
            )));
        }
        let number = |part: &str| {
            part.parse::<u32>().map_err(|_| {
                PangoError::validation(format!("version {s:?} has a non-numeric part {part:?}"))
            })
        };
        Ok(Self {
            major: number(parts[0])?,
            minor: number(parts[1])?,
            patch: parts.get(2).map(|p| number(p)).transpose()?.unwrap_or(0),
            suffix,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = PangoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.suffix.is_empty() {
            write!(f, "-{}", self.suffix)?;
        }
        Ok(())
    }
}

/// One entry from `show plugins packages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub release_date: String,
    pub release_note_url: String,
    pub package_file: String,
    pub size: String,
    pub platform: String,
    pub installed: bool,
    pub downloaded: bool,
}

impl PluginInfo {
    /// The plugin version as a comparable [`Version`].
    pub fn parsed_version(&self) -> Result<Version, PangoError> {
        self.version.parse()
    }
}

/// Parse the `<plugins>` result of `<show><plugins><packages/></plugins></show>`.
pub fn parse_plugins(node: &XmlNode) -> Vec<PluginInfo> {
    node.descendants("entry")
        .into_iter()
        .filter(|entry| entry.get_child("name").is_some())
        .map(|entry| {
            let text = |tag: &str| entry.get_text(&[tag]).unwrap_or_default().to_string();
            PluginInfo {
                name: text("name"),
                version: text("version"),
                release_date: text("release-date"),
                release_note_url: text("release-note-url"),
                package_file: text("pkg-file"),
                size: text("size"),
                platform: text("platform"),
                installed: text("installed") == "yes",
                downloaded: text("downloaded") == "yes",
            }
        })
        .collect()
}

/// The installed plugin with the given name, if any.
pub fn installed_plugin<'a>(plugins: &'a [PluginInfo], name: &str) -> Option<&'a PluginInfo> {
    plugins.iter().find(|p| p.installed && p.name == name)
}

#[cfg(test)]
mod tests {
    use panos_xml::parse;

    use super::{installed_plugin, parse_plugins, Version, V8_1, V9_0};

    #[test]
    fn parses_hotfix_suffix() {
        let v: Version = "9.1.3-h1".parse().expect("version");
        assert_eq!((v.major, v.minor, v.patch), (9, 1, 3));
        assert_eq!(v.suffix, "h1");
        assert_eq!(v.to_string(), "9.1.3-h1");
    }

    #[test]
    fn two_part_version_defaults_patch() {
        let v: Version = "8.0".parse().expect("version");
        assert_eq!(v, Version::new(8, 0, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!("nine".parse::<Version>().is_err());
        assert!("9.x.1".parse::<Version>().is_err());
    }

    #[test]
    fn ordering_ladder() {
        let v: Version = "9.0.0-h3".parse().expect("version");
        assert!(v.gte(&V9_0));
        assert!(v.gte(&V8_1));
        assert!(!Version::new(8, 0, 9).gte(&V8_1));
        assert!(Version::new(10, 0, 0) > Version::new(9, 1, 12));
    }

    #[test]
    fn hotfix_numbers_compare_numerically() {
        let h9: Version = "9.1.0-h9".parse().expect("version");
        let h10: Version = "9.1.0-h10".parse().expect("version");
        assert!(h10 > h9);
        assert!(h9 > Version::new(9, 1, 0));
        assert!(Version::new(9, 1, 1) > h10);
        let mut ladder = vec![h10.clone(), Version::new(9, 1, 0), h9.clone()];
        ladder.sort();
        assert_eq!(ladder, vec![Version::new(9, 1, 0), h9, h10]);
    }

    #[test]
    fn plugin_packages_are_parsed() {
        let node = parse(
            br#"<plugins><entry><name>gcp</name><version>2.0.1</version><installed>yes</installed><downloaded>yes</downloaded></entry><entry><name>aws</name><version>1.0.0</version><installed>no</installed></entry></plugins>"#,
        )
        .expect("parse");
        let plugins = parse_plugins(&node);
        assert_eq!(plugins.len(), 2);
        assert!(installed_plugin(&plugins, "gcp").is_some());
        assert!(installed_plugin(&plugins, "aws").is_none());
        assert_eq!(
            plugins[0].parsed_version().expect("version"),
            Version::new(2, 0, 1)
        );
    }
}
