use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use pango::xpath::{ObjectScope, Rulebase, RulebaseScope};

#[derive(Parser, Debug)]
#[command(name = "pango")]
#[command(about = "Render and apply PAN-OS configuration objects offline")]
pub struct Cli {
    /// Settings file; missing means built-in defaults.
    #[arg(long, global = true, default_value = "pango.toml")]
    pub settings: PathBuf,
    /// PAN-OS version to encode for, overriding the settings file.
    #[arg(long = "version", global = true)]
    pub panos_version: Option<String>,
    /// Target is Panorama, overriding the settings file.
    #[arg(long, global = true)]
    pub panorama: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Print the XPath of a kind at a location.
    Xpath(XpathArgs),
    /// Print the wire XML of entries read from a TOML file.
    Render(RenderArgs),
    /// Decode entries out of a saved configuration file.
    Show(ShowArgs),
    /// Set entries from a TOML file into a saved configuration file.
    Apply(ApplyArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum Kind {
    Address,
    AddressGroup,
    Service,
    ServiceGroup,
    Tag,
    SecurityRule,
    NatRule,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Firewall vsys (`shared` for the shared root).
    #[arg(long, conflicts_with = "device_group")]
    pub vsys: Option<String>,
    /// Panorama device group (`shared` for Panorama shared).
    #[arg(long)]
    pub device_group: Option<String>,
    /// Use the post-rulebase of a device group.
    #[arg(long)]
    pub post: bool,
}

impl ScopeArgs {
    fn on_panorama(&self, panorama: bool) -> bool {
        self.device_group.is_some() || (panorama && self.vsys.is_none())
    }

    pub fn objects(&self, panorama: bool) -> ObjectScope {
        if self.on_panorama(panorama) {
            ObjectScope::device_group(self.device_group.clone().unwrap_or_default())
        } else {
            ObjectScope::vsys(self.vsys.clone().unwrap_or_default())
        }
    }

    pub fn rules(&self, panorama: bool) -> RulebaseScope {
        if self.on_panorama(panorama) {
            let rulebase = if self.post {
                Rulebase::Post
            } else {
                Rulebase::Pre
            };
            RulebaseScope::device_group(self.device_group.clone().unwrap_or_default(), rulebase)
        } else {
            RulebaseScope::vsys(self.vsys.clone().unwrap_or_default())
        }
    }
}

#[derive(Parser, Debug)]
pub struct XpathArgs {
    #[arg(value_enum)]
    pub kind: Kind,
    /// Entry names; none addresses the whole list.
    pub names: Vec<String>,
    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    #[arg(value_enum)]
    pub kind: Kind,
    /// TOML file with one `[[entry]]` table per object.
    pub input: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Saved configuration (`<config>` root).
    pub config: PathBuf,
    #[arg(value_enum)]
    pub kind: Kind,
    /// Only this entry.
    #[arg(long)]
    pub name: Option<String>,
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Saved configuration (`<config>` root).
    pub config: PathBuf,
    #[arg(value_enum)]
    pub kind: Kind,
    /// TOML file with one `[[entry]]` table per object.
    pub input: PathBuf,
    #[command(flatten)]
    pub scope: ScopeArgs,
    /// Replace each entry instead of merging into it.
    #[arg(long)]
    pub replace: bool,
    /// Write here instead of back to the input configuration.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
