use std::marker::PhantomData;

use panos_xml::XmlNode;

use super::{check_unique, Common, Query};
use crate::client::Client;
use crate::codec::Object;
use crate::error::PangoError;
use crate::wire::{BulkElement, EntryType};
use crate::xpath::{select, trim};

/// Something to delete: a bare name or a whole value.
#[derive(Debug, Clone, PartialEq)]
pub enum Deletable<E> {
    ByName(String),
    ByValue(E),
}

impl<E: Object> Deletable<E> {
    pub fn name(&self) -> &str {
        match self {
            Self::ByName(name) => name,
            Self::ByValue(entry) => entry.name(),
        }
    }
}

impl<E> From<&str> for Deletable<E> {
    fn from(value: &str) -> Self {
        Self::ByName(value.to_string())
    }
}

impl<E> From<String> for Deletable<E> {
    fn from(value: String) -> Self {
        Self::ByName(value)
    }
}

impl<E> From<&String> for Deletable<E> {
    fn from(value: &String) -> Self {
        Self::ByName(value.clone())
    }
}

/// List, read, bulk-set, edit and delete for one kind.
pub struct Standard<'a, E> {
    pub(crate) common: Common<'a>,
    _entry: PhantomData<fn() -> E>,
}

impl<'a, E: Object> Standard<'a, E> {
    pub fn new(client: &'a dyn Client) -> Self {
        Self {
            common: Common::new(client, E::KIND),
            _entry: PhantomData,
        }
    }

    pub(crate) fn client(&self) -> &'a dyn Client {
        self.common.client
    }

    /// Names present in the candidate configuration.
    pub fn get_list(&self, loc: &E::Location) -> Result<Vec<String>, PangoError> {
        self.list(Query::Get, loc)
    }

    /// Names present in the running configuration.
    pub fn show_list(&self, loc: &E::Location) -> Result<Vec<String>, PangoError> {
        self.list(Query::Show, loc)
    }

    pub fn get(&self, loc: &E::Location, name: &str) -> Result<E, PangoError> {
        self.one(Query::Get, loc, name)
    }

    pub fn show(&self, loc: &E::Location, name: &str) -> Result<E, PangoError> {
        self.one(Query::Show, loc, name)
    }

    pub fn get_all(&self, loc: &E::Location) -> Result<Vec<E>, PangoError> {
        self.all(Query::Get, loc)
    }

    pub fn show_all(&self, loc: &E::Location) -> Result<Vec<E>, PangoError> {
        self.all(Query::Show, loc)
    }

    /// Create or replace `entries` with one request.
    pub fn set(&self, loc: &E::Location, entries: &[E]) -> Result<(), PangoError> {
        let Some((path, element)) = self.set_request(loc, entries)? else {
            return Ok(());
        };
        self.common
            .set(&path, &element)
            .map_err(|e| e.during("set", E::KIND))
    }

    /// Replace one entry in place.
    pub fn edit(&self, loc: &E::Location, entry: &E) -> Result<(), PangoError> {
        let (path, element) = self.edit_request(loc, entry)?;
        self.common
            .edit(&path, &element)
            .map_err(|e| e.during("edit", format!("{} {:?}", E::KIND, entry.name())))
    }

    /// Delete every named entry with one request.
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
        self.common
            .delete(&path)
            .map_err(|e| e.during("delete", E::KIND))
    }

    /// Decode one entry out of a previously retrieved configuration tree.
    pub fn from_panos_config(
        &self,
        loc: &E::Location,
        name: &str,
        config: &XmlNode,
    ) -> Result<E, PangoError> {
        let path = E::xpath(loc, &[name.to_string()])?;
        let node = select(config, &path)
            .into_iter()
            .next()
            .ok_or_else(|| PangoError::NotFound {
                kind: E::KIND,
                name: name.to_string(),
            })?;
        E::normalize(node, &self.client().versioning())
    }

    /// Decode every entry out of a previously retrieved configuration tree.
    pub fn all_from_panos_config(
        &self,
        loc: &E::Location,
        config: &XmlNode,
    ) -> Result<Vec<E>, PangoError> {
        let path = E::xpath(loc, &[])?;
        let (normalize, _) = E::versioning(&self.client().versioning());
        select(config, &path).into_iter().map(normalize).collect()
    }

    /// The trimmed path and bulk body for `set`, or `None` for no entries.
    pub(crate) fn set_request(
        &self,
        loc: &E::Location,
        entries: &[E],
    ) -> Result<Option<(Vec<String>, XmlNode)>, PangoError> {
        if entries.is_empty() {
            return Ok(None);
        }
        check_unique(E::KIND, entries.iter().map(|e| e.name()))?;
        let names: Vec<String> = entries.iter().map(|e| e.name().to_string()).collect();
        let path = E::xpath(loc, &names)?;
        let (_, specify) = E::versioning(&self.client().versioning());
        let data = entries
            .iter()
            .map(specify)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(BulkElement::new(&path, data).into_request(&path)))
    }

    pub(crate) fn edit_request(
        &self,
        loc: &E::Location,
        entry: &E,
    ) -> Result<(Vec<String>, XmlNode), PangoError> {
        let path = E::xpath(loc, &[entry.name().to_string()])?;
        let element = entry.specify(&self.client().versioning())?;
        Ok((path, element))
    }

    fn list(&self, query: Query, loc: &E::Location) -> Result<Vec<String>, PangoError> {
        let path = E::xpath(loc, &[])?;
        match self.common.retrieve(query, trim(&path, 1)) {
            Ok(container) => Ok(EntryType::from_node(&container).0),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    fn one(&self, query: Query, loc: &E::Location, name: &str) -> Result<E, PangoError> {
        let path = E::xpath(loc, &[name.to_string()])?;
        let result = self.common.retrieve(query, &path)?;
        let node = result
            .get_child("entry")
            .ok_or_else(|| PangoError::NotFound {
                kind: E::KIND,
                name: name.to_string(),
            })?;
        E::normalize(node, &self.client().versioning())
    }

    fn all(&self, query: Query, loc: &E::Location) -> Result<Vec<E>, PangoError> {
        let path = E::xpath(loc, &[])?;
        let result = match self.common.retrieve(query, &path) {
            Ok(result) => result,
            Err(err) if err.is_not_found() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let (normalize, _) = E::versioning(&self.client().versioning());
        result.get_children("entry").into_iter().map(normalize).collect()
    }
}

pub(crate) fn deletable_names<E, D, I>(items: I) -> Vec<String>
where
    E: Object,
    D: Into<Deletable<E>>,
    I: IntoIterator<Item = D>,
{
    items
        .into_iter()
        .map(|item| {
            let item: Deletable<E> = item.into();
            item.name().to_string()
        })
        .collect()
}
