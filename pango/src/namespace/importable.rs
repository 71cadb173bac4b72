use std::ops::Deref;

use tracing::debug;

use super::standard::{deletable_names, Deletable, Standard};
use crate::client::Client;
use crate::codec::{ImportableObject, Object};
use crate::error::PangoError;

/// [`Standard`] plus the unimport → write → import discipline for network
/// objects that must be attached to a vsys.
///
/// The steps are not atomic. The first failing step is returned and nothing
/// after it is attempted.
pub struct Importable<'a, E> {
    standard: Standard<'a, E>,
}

impl<'a, E: ImportableObject> Importable<'a, E> {
    pub fn new(client: &'a dyn Client) -> Self {
        Self {
            standard: Standard::new(client),
        }
    }

    /// Configure `entries` and import them into `vsys` (no import when
    /// `vsys` is empty).
    pub fn set(&self, loc: &E::Location, vsys: &str, entries: &[E]) -> Result<(), PangoError> {
        let Some((path, element)) = self.standard.set_request(loc, entries)? else {
            return Ok(());
        };
        let names: Vec<String> = entries.iter().map(|e| e.name().to_string()).collect();
        self.unimport(loc, &names)?;
        self.standard
            .common
            .set(&path, &element)
            .map_err(|e| e.during("set", E::KIND))?;
        let imports: Vec<String> = entries
            .iter()
            .filter(|e| e.needs_import())
            .map(|e| e.name().to_string())
            .collect();
        self.import(loc, vsys, &imports)
    }

    /// Replace one entry in place, moving its import to `vsys`.
    pub fn edit(&self, loc: &E::Location, vsys: &str, entry: &E) -> Result<(), PangoError> {
        let (path, element) = self.standard.edit_request(loc, entry)?;
        let names = vec![entry.name().to_string()];
        self.unimport(loc, &names)?;
        self.standard
            .common
            .edit(&path, &element)
            .map_err(|e| e.during("edit", format!("{} {:?}", E::KIND, entry.name())))?;
        if entry.needs_import() {
            self.import(loc, vsys, &names)?;
        }
        Ok(())
    }

    /// Unimport, then delete.
    pub fn delete<D, I>(&self, loc: &E::Location, items: I) -> Result<(), PangoError>
    where
        D: Into<Deletable<E>>,
        I: IntoIterator<Item = D>,
    {
        let names = deletable_names::<E, _, _>(items);
        if names.is_empty() {
            return Ok(());
        }
        let path = E::xpath(loc, &names)?;
        self.unimport(loc, &names)?;
        self.standard
            .common
            .delete(&path)
            .map_err(|e| e.during("delete", E::KIND))
    }

    fn unimport(&self, loc: &E::Location, names: &[String]) -> Result<(), PangoError> {
        let (template, template_stack) = E::import_target(loc);
        debug!(
            target: "pango::action",
            kind = E::KIND,
            names = ?names,
            "(unimport) {}",
            E::IMPORT_KIND
        );
        self.standard
            .client()
            .vsys_unimport(E::IMPORT_KIND, &template, &template_stack, names)
            .map_err(|e| e.during("unimport", E::KIND))
    }

    fn import(&self, loc: &E::Location, vsys: &str, names: &[String]) -> Result<(), PangoError> {
        if vsys.is_empty() || names.is_empty() {
            return Ok(());
        }
        let (template, template_stack) = E::import_target(loc);
        debug!(
            target: "pango::action",
            kind = E::KIND,
            vsys,
            names = ?names,
            "(import) {}",
            E::IMPORT_KIND
        );
        self.standard
            .client()
            .vsys_import(E::IMPORT_KIND, &template, &template_stack, vsys, names)
            .map_err(|e| e.during("import", format!("{} into {vsys}", E::KIND)))
    }
}

impl<'a, E> Deref for Importable<'a, E> {
    type Target = Standard<'a, E>;

    fn deref(&self) -> &Self::Target {
        &self.standard
    }
}
