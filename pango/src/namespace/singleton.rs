use std::marker::PhantomData;

use panos_xml::XmlNode;

use super::{Common, Query};
use crate::client::Client;
use crate::codec::ConfigObject;
use crate::error::PangoError;
use crate::xpath::{segment_tag, select};

/// Read and write a fixed configuration node that has no name.
pub struct Singleton<'a, C> {
    common: Common<'a>,
    _config: PhantomData<fn() -> C>,
}

impl<'a, C: ConfigObject> Singleton<'a, C> {
    pub fn new(client: &'a dyn Client) -> Self {
        Self {
            common: Common::new(client, C::KIND),
            _config: PhantomData,
        }
    }

    pub fn get(&self, loc: &C::Location) -> Result<C, PangoError> {
        self.one(Query::Get, loc)
    }

    pub fn show(&self, loc: &C::Location) -> Result<C, PangoError> {
        self.one(Query::Show, loc)
    }

    /// Merge `config` into the node.
    pub fn set(&self, loc: &C::Location, config: &C) -> Result<(), PangoError> {
        let (path, element) = self.request(loc, config)?;
        let parent = &path[..path.len().saturating_sub(1)];
        self.common
            .set(parent, &element)
            .map_err(|e| e.during("set", C::KIND))
    }

    /// Replace the node.
    pub fn edit(&self, loc: &C::Location, config: &C) -> Result<(), PangoError> {
        let (path, element) = self.request(loc, config)?;
        self.common
            .edit(&path, &element)
            .map_err(|e| e.during("edit", C::KIND))
    }

    pub fn delete(&self, loc: &C::Location) -> Result<(), PangoError> {
        let path = C::xpath(loc)?;
        self.common
            .delete(&path)
            .map_err(|e| e.during("delete", C::KIND))
    }

    /// Decode the node out of a previously retrieved configuration tree.
    pub fn from_panos_config(&self, loc: &C::Location, config: &XmlNode) -> Result<C, PangoError> {
        let path = C::xpath(loc)?;
        let node = select(config, &path)
            .into_iter()
            .next()
            .ok_or_else(|| PangoError::NotFound {
                kind: C::KIND,
                name: String::new(),
            })?;
        let (normalize, _) = C::versioning(&self.common.client.versioning());
        normalize(node)
    }

    fn request(&self, loc: &C::Location, config: &C) -> Result<(Vec<String>, XmlNode), PangoError> {
        let path = C::xpath(loc)?;
        let (_, specify) = C::versioning(&self.common.client.versioning());
        Ok((path, specify(config)?))
    }

    fn one(&self, query: Query, loc: &C::Location) -> Result<C, PangoError> {
        let path = C::xpath(loc)?;
        let payload = self.common.retrieve(query, &path)?;
        let tag = path.last().map(|s| segment_tag(s)).unwrap_or_default();
        let node = if payload.tag == tag {
            &payload
        } else {
            payload.get_child(tag).ok_or_else(|| PangoError::NotFound {
                kind: C::KIND,
                name: String::new(),
            })?
        };
        let (normalize, _) = C::versioning(&self.common.client.versioning());
        normalize(node)
    }
}
