/// Backend service interfaces
///
/// The hosted platform the app originally talked to exposed three services:
/// a document database, blob storage, and email/password identity. They are
/// modeled here as injected traits so the registry and synchronizer never
/// reach for a global handle, and so everything runs against local
/// implementations in tests:
/// - Document store backend (sqlite.rs)
/// - Blob store backend (blob.rs)

pub mod blob;
pub mod sqlite;

use crate::coords::{Coordinate, MapScheme};
use crate::error::{Error, Result};
use crate::model::{Map, MapId, Poi, PoiId, PoiPatch, PoiPhase, Principal, UserId};

/// Which collection namespace a map lives in.
///
/// User maps live under a per-user path; shared maps live in one flat
/// collection visible to everyone, authenticated or not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    User(UserId),
    Shared,
}

impl Namespace {
    /// Collection path for map documents in this namespace
    pub fn maps_path(&self) -> String {
        match self {
            Namespace::User(uid) => format!("users/{}/maps", uid.as_str()),
            Namespace::Shared => "maps".to_string(),
        }
    }
}

/// Opaque reference to "the POIs belonging to this specific map",
/// abstracting over which namespace the map lives in. Obtained from the
/// Map Registry, consumed by the POI Synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionHandle {
    pub namespace: Namespace,
    pub map_id: MapId,
}

impl CollectionHandle {
    pub fn new(namespace: Namespace, map_id: MapId) -> Self {
        CollectionHandle { namespace, map_id }
    }

    /// Collection path for this map's POI sub-collection
    pub fn pois_path(&self) -> String {
        format!("{}/{}/pois", self.namespace.maps_path(), self.map_id)
    }
}

/// Fields for a new map document. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMap {
    pub title: String,
    pub image_url: String,
    pub scheme: MapScheme,
}

/// Document database operations, addressed by namespace + map id.
///
/// Implementations must reject a POI whose coordinate variant does not match
/// the parent map's scheme, and must treat deleting an absent POI as a no-op.
pub trait DocumentStore: Send + Sync {
    fn get_map(&self, ns: &Namespace, id: &MapId) -> Result<Option<Map>>;
    fn insert_map(&self, ns: &Namespace, map: NewMap) -> Result<MapId>;
    fn list_maps(&self, ns: &Namespace) -> Result<Vec<Map>>;
    fn rename_map(&self, ns: &Namespace, id: &MapId, title: &str) -> Result<()>;
    /// Deletes the map document and all of its POIs
    fn delete_map(&self, ns: &Namespace, id: &MapId) -> Result<()>;

    fn list_pois(&self, handle: &CollectionHandle) -> Result<Vec<Poi>>;
    fn insert_poi(
        &self,
        handle: &CollectionHandle,
        coordinate: Coordinate,
        name: &str,
        description: &str,
    ) -> Result<PoiId>;
    /// Partial update; `phase` transitions the creation state machine when set
    fn update_poi(
        &self,
        handle: &CollectionHandle,
        id: &PoiId,
        patch: &PoiPatch,
        phase: Option<PoiPhase>,
    ) -> Result<()>;
    fn delete_poi(&self, handle: &CollectionHandle, id: &PoiId) -> Result<()>;

    /// Every blob URL any document references, for orphan reconciliation
    fn referenced_blob_urls(&self) -> Result<Vec<String>>;
}

/// Blob storage: returns a stable download URL per stored object
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` (e.g. `maps/1714000000000_plan.png`) and
    /// return the blob's stable URL
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String>;
    /// All stored blob URLs, for orphan reconciliation
    fn list(&self) -> Result<Vec<String>>;
}

/// Email/password credentials as entered by the user
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials { email: email.into(), password: password.into() }
    }

    /// Email as used for lookup and storage: trimmed and lowercased
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    /// Checked before any remote call: email must look like an address and
    /// the password must meet the minimum length the identity service
    /// enforces (6 characters).
    pub fn validate(&self) -> Result<()> {
        let email = self.normalized_email();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::ValidationFailed(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        if self.password.len() < 6 {
            return Err(Error::ValidationFailed(
                "password must be at least 6 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Identity service: email/password in, a principal with a stable uid out
pub trait IdentityService: Send + Sync {
    /// Register a new account; records that verification mail is pending
    fn sign_up(&self, creds: &Credentials) -> Result<Principal>;
    fn sign_in(&self, creds: &Credentials) -> Result<Principal>;
}
