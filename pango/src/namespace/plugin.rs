use std::ops::Deref;

use panos_xml::XmlNode;

use super::check_unique;
use super::standard::Standard;
use crate::client::Client;
use crate::codec::{Object, PluginObject};
use crate::error::PangoError;
use crate::wire::BulkElement;

/// [`Standard`] for kinds whose schema depends on an installed plugin.
///
/// Writes are checked against the device's plugin list before anything is
/// sent.
pub struct Plugin<'a, E> {
    standard: Standard<'a, E>,
}

impl<'a, E: PluginObject> Plugin<'a, E> {
    pub fn new(client: &'a dyn Client) -> Self {
        Self {
            standard: Standard::new(client),
        }
    }

    pub fn set(&self, loc: &E::Location, entries: &[E]) -> Result<(), PangoError> {
        if entries.is_empty() {
            return Ok(());
        }
        check_unique(E::KIND, entries.iter().map(|e| e.name()))?;
        let plugins = self.standard.client().plugins();
        let names: Vec<String> = entries.iter().map(|e| e.name().to_string()).collect();
        let path = E::xpath(loc, &names)?;
        let data = entries
            .iter()
            .map(|e| e.specify_for(&plugins).map(|(_, node)| node))
            .collect::<Result<Vec<XmlNode>, _>>()?;
        let (path, element) = BulkElement::new(&path, data).into_request(&path);
        self.standard
            .common
            .set(&path, &element)
            .map_err(|e| e.during("set", E::KIND))
    }

    pub fn edit(&self, loc: &E::Location, entry: &E) -> Result<(), PangoError> {
        let plugins = self.standard.client().plugins();
        let (name, element) = entry.specify_for(&plugins)?;
        let path = E::xpath(loc, &[name.clone()])?;
        self.standard
            .common
            .edit(&path, &element)
            .map_err(|e| e.during("edit", format!("{} {name:?}", E::KIND)))
    }
}

impl<'a, E> Deref for Plugin<'a, E> {
    type Target = Standard<'a, E>;

    fn deref(&self) -> &Self::Target {
        &self.standard
    }
}
