use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use pango::codec::Object;
use pango::namespace::Standard;
use pango::objs::{Address, AddressGroup, Service, ServiceGroup, Tag};
use pango::offline::OfflineDevice;
use pango::poli::{NatRule, SecurityRule};
use pango::settings::{DeviceKind, Settings};
use pango::version::Version;
use pango::xpath::join;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

mod cli;

use cli::{ApplyArgs, Cli, Command, Kind, OutputFormat, RenderArgs, ScopeArgs, ShowArgs, XpathArgs};

/// A kind the command line can address.
trait CliKind: Object + Serialize + DeserializeOwned {
    fn location(scope: &ScopeArgs, panorama: bool) -> Self::Location;
}

macro_rules! object_kind {
    ($($ty:ty),*) => {$(
        impl CliKind for $ty {
            fn location(scope: &ScopeArgs, panorama: bool) -> Self::Location {
                scope.objects(panorama)
            }
        }
    )*};
}

macro_rules! rule_kind {
    ($($ty:ty),*) => {$(
        impl CliKind for $ty {
            fn location(scope: &ScopeArgs, panorama: bool) -> Self::Location {
                scope.rules(panorama)
            }
        }
    )*};
}

object_kind!(Address, AddressGroup, Service, ServiceGroup, Tag);
rule_kind!(SecurityRule, NatRule);

/// Run `$run::<Type>(args...)` for the selected kind.
macro_rules! with_kind {
    ($kind:expr, $run:ident($($arg:expr),*)) => {
        match $kind {
            Kind::Address => $run::<Address>($($arg),*),
            Kind::AddressGroup => $run::<AddressGroup>($($arg),*),
            Kind::Service => $run::<Service>($($arg),*),
            Kind::ServiceGroup => $run::<ServiceGroup>($($arg),*),
            Kind::Tag => $run::<Tag>($($arg),*),
            Kind::SecurityRule => $run::<SecurityRule>($($arg),*),
            Kind::NatRule => $run::<NatRule>($($arg),*),
        }
    };
}

#[derive(Debug, Deserialize)]
struct EntryFile<E> {
    #[serde(default = "Vec::new")]
    entry: Vec<E>,
}

/// Settings after command line overrides.
struct Target {
    settings: Settings,
    version: Version,
    panorama: bool,
}

impl Target {
    fn resolve(cli: &Cli) -> Result<Self> {
        let settings = Settings::load_or_default(Some(&cli.settings))?;
        let version = match &cli.panos_version {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid --version {raw:?}"))?,
            None => settings.device.version.clone(),
        };
        let panorama = cli.panorama || settings.device.kind == DeviceKind::Panorama;
        Ok(Self {
            settings,
            version,
            panorama,
        })
    }

    fn load_device(&self, path: &Path) -> Result<OfflineDevice> {
        let device = OfflineDevice::load(self.version.clone(), path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok(device.with_plugins(self.settings.plugins()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let target = Target::resolve(&cli)?;
    init_logging(&target.settings.log.filter);

    match &cli.command {
        Command::Xpath(args) => with_kind!(args.kind, run_xpath(args, &target)),
        Command::Render(args) => with_kind!(args.kind, run_render(args, &target)),
        Command::Show(args) => with_kind!(args.kind, run_show(args, &target)),
        Command::Apply(args) => with_kind!(args.kind, run_apply(args, &target)),
    }
}

fn init_logging(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_entries<E: CliKind>(path: &Path) -> Result<Vec<E>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: EntryFile<E> =
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    if file.entry.is_empty() {
        bail!("{} has no [[entry]] tables", path.display());
    }
    Ok(file.entry)
}

fn run_xpath<E: CliKind>(args: &XpathArgs, target: &Target) -> Result<()> {
    let loc = E::location(&args.scope, target.panorama);
    let path = E::xpath(&loc, &args.names)
        .with_context(|| format!("cannot build {} xpath", E::KIND))?;
    println!("{}", join(&path));
    Ok(())
}

fn run_render<E: CliKind>(args: &RenderArgs, target: &Target) -> Result<()> {
    let entries: Vec<E> = read_entries(&args.input)?;
    for entry in &entries {
        let node = entry
            .specify(&target.version)
            .with_context(|| format!("cannot encode {} {:?}", E::KIND, entry.name()))?;
        println!("{node}");
    }
    Ok(())
}

fn run_show<E: CliKind>(args: &ShowArgs, target: &Target) -> Result<()> {
    let device = target.load_device(&args.config)?;
    let loc = E::location(&args.scope, target.panorama);
    let ns: Standard<'_, E> = Standard::new(&device);
    let entries = match &args.name {
        Some(name) => vec![ns
            .get(&loc, name)
            .with_context(|| format!("failed to read {} {name:?}", E::KIND))?],
        None => ns
            .get_all(&loc)
            .with_context(|| format!("failed to read {} entries", E::KIND))?,
    };

    match args.format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("no {} entries", E::KIND);
            }
            for entry in &entries {
                println!("{} {}", E::KIND.bold(), entry.name().green());
                println!("  {}", entry.specify(&target.version)?);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}

fn run_apply<E: CliKind>(args: &ApplyArgs, target: &Target) -> Result<()> {
    let entries: Vec<E> = read_entries(&args.input)?;
    let device = target.load_device(&args.config)?;
    let loc = E::location(&args.scope, target.panorama);
    let ns: Standard<'_, E> = Standard::new(&device);

    if args.replace {
        for entry in &entries {
            ns.edit(&loc, entry)
                .with_context(|| format!("failed to edit {} {:?}", E::KIND, entry.name()))?;
        }
    } else {
        ns.set(&loc, &entries)
            .with_context(|| format!("failed to set {} entries", E::KIND))?;
    }

    let out = args.output.as_deref().unwrap_or(&args.config);
    device
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(target: "pango::action", kind = E::KIND, count = entries.len(), "applied");
    println!(
        "applied {} {} entries to {}",
        entries.len(),
        E::KIND,
        out.display()
    );
    Ok(())
}
