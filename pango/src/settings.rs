//! TOML settings for the offline tooling.
//!
//! ```toml
//! [device]
//! kind = "panorama"
//! version = "9.1.3"
//!
//! [[device.plugins]]
//! name = "gcp"
//! version = "1.0.2"
//!
//! [log]
//! filter = "pango=debug"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::{PluginInfo, Version};

pub const DEFAULT_LOG_FILTER: &str = "pango=info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Firewall,
    Panorama,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub kind: DeviceKind,
    pub version: Version,
    pub plugins: Vec<PluginSetting>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            kind: DeviceKind::Firewall,
            version: Version::new(10, 0, 0),
            plugins: Vec::new(),
        }
    }
}

/// An installed plugin, as declared in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSetting {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub device: DeviceSettings,
    pub log: LogSettings,
}

/// Errors returned when loading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

impl Settings {
    /// Load settings from `path`.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw, path.display().to_string())
    }

    /// Load settings from `path` when given and present, else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    fn parse(raw: &str, path: String) -> Result<Self, SettingsError> {
        toml::from_str(raw).map_err(|source| SettingsError::Parse { path, source })
    }

    /// Declared plugins in the shape the namespaces check against.
    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.device
            .plugins
            .iter()
            .map(|p| PluginInfo {
                name: p.name.clone(),
                version: p.version.clone(),
                installed: true,
                ..PluginInfo::default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::{DeviceKind, Settings, SettingsError, DEFAULT_LOG_FILTER};
    use crate::version::{Version, V9_1};

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().expect("tempdir");
        let settings =
            Settings::load_or_default(Some(&dir.path().join("absent.toml"))).expect("settings");
        assert_eq!(settings.device.kind, DeviceKind::Firewall);
        assert_eq!(settings.device.version, Version::new(10, 0, 0));
        assert_eq!(settings.log.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("pango.toml");
        fs::write(
            &path,
            r#"
[device]
kind = "panorama"
version = "9.1.0"

[[device.plugins]]
name = "gcp"
version = "1.0.2"
"#,
        )
        .expect("write");
        let settings = Settings::load(&path).expect("settings");
        assert_eq!(settings.device.kind, DeviceKind::Panorama);
        assert_eq!(settings.device.version, V9_1);
        assert_eq!(settings.log.filter, DEFAULT_LOG_FILTER);
        let plugins = settings.plugins();
        assert_eq!(plugins.len(), 1);
        assert!(plugins[0].installed);
    }

    #[test]
    fn bad_version_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("pango.toml");
        fs::write(&path, "[device]\nversion = \"ten\"\n").expect("write");
        let err = Settings::load(&path).expect_err("bad version");
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
