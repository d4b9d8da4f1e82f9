/// Map Registry
///
/// Resolves a map id to its metadata and a handle to its POI collection,
/// probing the session user's namespace before the shared one. Read-only:
/// the registry owns no state beyond the injected store.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{Map, MapId, Principal};
use crate::store::{CollectionHandle, DocumentStore, Namespace};

pub struct MapRegistry {
    store: Arc<dyn DocumentStore>,
}

impl MapRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        MapRegistry { store }
    }

    /// Resolve a map id for the given session.
    ///
    /// With a principal, the user-scoped namespace is probed first; a map id
    /// present in both namespaces resolves to the user-scoped record. Without
    /// a principal only the shared namespace is consulted. Transport faults
    /// surface as `LookupFailed`; an absent map as `NotFound` — callers show
    /// a retry/error state either way, never an indefinite spinner.
    pub fn resolve_map(
        &self,
        map_id: &MapId,
        principal: Option<&Principal>,
    ) -> Result<(Map, CollectionHandle)> {
        if let Some(principal) = principal {
            let ns = Namespace::User(principal.uid.clone());
            if let Some(map) = self.store.get_map(&ns, map_id)? {
                return Ok((map, CollectionHandle::new(ns, map_id.clone())));
            }
        }

        let ns = Namespace::Shared;
        match self.store.get_map(&ns, map_id)? {
            Some(map) => Ok((map, CollectionHandle::new(ns, map_id.clone()))),
            None => Err(Error::NotFound(format!("map {}", map_id))),
        }
    }

    /// Rename a map the session can see. The title is the one piece of map
    /// metadata that stays mutable after creation; the scheme and background
    /// never change.
    pub fn rename_map(
        &self,
        map_id: &MapId,
        principal: Option<&Principal>,
        title: &str,
    ) -> Result<()> {
        if title.trim().is_empty() {
            return Err(Error::ValidationFailed("map title is required".into()));
        }
        let (_, handle) = self.resolve_map(map_id, principal)?;
        self.store.rename_map(&handle.namespace, map_id, title.trim())
    }

    /// The session user's own maps, for the selector grid
    pub fn list_user_maps(&self, principal: &Principal) -> Result<Vec<Map>> {
        self.store.list_maps(&Namespace::User(principal.uid.clone()))
    }

    /// Shared maps whose title contains `query` (case-insensitive);
    /// an empty query returns everything
    pub fn search_shared_maps(&self, query: &str) -> Result<Vec<Map>> {
        let needle = query.trim().to_lowercase();
        let mut maps = self.store.list_maps(&Namespace::Shared)?;
        if !needle.is_empty() {
            maps.retain(|m| m.title.to_lowercase().contains(&needle));
        }
        Ok(maps)
    }
}
