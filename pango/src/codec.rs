//! The version-dispatched codec contract.
//!
//! Each configurable kind exposes one stable value type and, per PAN-OS
//! schema era, one private wire struct. `versioning` walks a descending
//! ladder of release thresholds and hands back the matching
//! [`Normalizer`]/[`Specifier`] pair as plain function pointers, so the
//! namespaces never see the wire structs at all.

use std::fmt::Debug;

use panos_xml::XmlNode;

use crate::client::ImportKind;
use crate::error::PangoError;
use crate::version::{PluginInfo, Version};
use crate::xpath::RulebaseScope;

/// Ingress half of a codec: one `<entry>` node → stable value.
pub type Normalizer<E> = fn(&XmlNode) -> Result<E, PangoError>;

/// Egress half of a codec: stable value → one `<entry>` node.
pub type Specifier<E> = fn(&E) -> Result<XmlNode, PangoError>;

/// One era's wire struct for a kind.
pub(crate) trait Wire: Sized {
    type Entry;

    /// Project the stable value onto this era, rejecting what the era
    /// cannot carry.
    fn specify(entry: &Self::Entry) -> Result<Self, PangoError>;

    fn normalize(self) -> Self::Entry;

    fn decode(node: &XmlNode) -> Result<Self, PangoError>;

    fn encode(&self) -> XmlNode;
}

fn normalize_with<W: Wire>(node: &XmlNode) -> Result<W::Entry, PangoError> {
    W::decode(node).map(W::normalize)
}

fn specify_with<W: Wire>(entry: &W::Entry) -> Result<XmlNode, PangoError> {
    W::specify(entry).map(|wire| wire.encode())
}

/// The normalizer for wire era `W`.
pub(crate) fn normalizer<W: Wire>() -> Normalizer<W::Entry> {
    normalize_with::<W>
}

/// The specifier for wire era `W`.
pub(crate) fn specifier<W: Wire>() -> Specifier<W::Entry> {
    specify_with::<W>
}

/// Both halves of era `W`.
pub(crate) fn era<W: Wire>() -> (Normalizer<W::Entry>, Specifier<W::Entry>) {
    (normalizer::<W>(), specifier::<W>())
}

/// A named list element of the configuration tree.
pub trait Object: Clone + Default + Debug + Send + Sync + 'static {
    /// Human readable kind, used in errors and logs.
    const KIND: &'static str;

    /// Routing context the kind lives under.
    type Location: Clone + Debug;

    fn name(&self) -> &str;

    fn name_mut(&mut self) -> &mut String;

    /// Overwrite every field except the name with `other`'s.
    fn copy_from(&mut self, other: &Self) {
        let name = self.name().to_string();
        *self = other.clone();
        *self.name_mut() = name;
    }

    /// Path of the named entries; no names addresses every entry.
    fn xpath(loc: &Self::Location, names: &[String]) -> Result<Vec<String>, PangoError>;

    /// Codec pair for the given device version.
    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>);

    fn specify(&self, version: &Version) -> Result<XmlNode, PangoError> {
        let (_, specify) = Self::versioning(version);
        specify(self)
    }

    fn normalize(node: &XmlNode, version: &Version) -> Result<Self, PangoError> {
        let (normalize, _) = Self::versioning(version);
        normalize(node)
    }
}

/// A singleton configuration node with no name.
pub trait ConfigObject: Clone + Default + Debug + Send + Sync + 'static {
    const KIND: &'static str;

    type Location: Clone + Debug;

    /// Overwrite every field with `other`'s.
    fn copy_from(&mut self, other: &Self) {
        *self = other.clone();
    }

    fn xpath(loc: &Self::Location) -> Result<Vec<String>, PangoError>;

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>);
}

/// Objects that must also be imported into a vsys to be usable.
pub trait ImportableObject: Object {
    const IMPORT_KIND: ImportKind;

    /// `(template, template_stack)` the import happens inside.
    fn import_target(loc: &Self::Location) -> (String, String);

    /// Whether this particular value takes part in vsys import.
    fn needs_import(&self) -> bool {
        true
    }
}

/// Security/NAT style rules living in an ordered rulebase.
pub trait Rule: Object<Location = RulebaseScope> {
    /// Rulebase section, such as `security` or `nat`.
    const RULE_TYPE: &'static str;
}

/// Objects whose schema is owned by a plugin rather than PAN-OS itself.
pub trait PluginObject: Object {
    /// Encode against the installed plugin set, returning the element name
    /// alongside the body.
    fn specify_for(&self, plugins: &[PluginInfo]) -> Result<(String, XmlNode), PangoError>;
}

/// Require `version` to be at least `required` for `feature`.
pub(crate) fn require(
    feature: &str,
    required: &Version,
    version: &Version,
) -> Result<(), PangoError> {
    if version.gte(required) {
        Ok(())
    } else {
        Err(PangoError::unsupported(feature, required, version))
    }
}
