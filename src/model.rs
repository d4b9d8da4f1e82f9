/// Shared data structures
///
/// These structs represent the records that flow between the storage layer and
/// its callers: maps, POIs, and the partial-update patch applied from the POI
/// detail form. Wire names are camelCase to match the persisted documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coords::{Coordinate, MapScheme};

/// Opaque map identifier, assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId(pub String);

impl MapId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque POI identifier, assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoiId(pub String);

impl PoiId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PoiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque user identifier from the identity service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The authenticated user attached to a session; absent when unauthenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: UserId,
    pub email: String,
}

/// A map record: background image plus coordinate scheme and metadata.
///
/// Exactly one scheme per map, fixed at creation. Only the title is mutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    pub id: MapId,
    /// None for maps in the shared namespace
    pub owner: Option<UserId>,
    pub title: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub scheme: MapScheme,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Creation phase of a POI.
///
/// A marker must appear immediately on tap, before the user finishes the
/// detail form, so creation is a two-step state machine rather than an
/// empty-string sentinel: `Pending` rows exist in the store with placeholder
/// fields, and commit happens when the form is saved with a non-empty name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiPhase {
    Pending,
    Committed,
}

/// A point of interest on a map.
///
/// The coordinate variant always matches the parent map's scheme; the store
/// enforces this at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: PoiId,
    #[serde(rename = "mapId")]
    pub map_id: MapId,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Photo attached from the detail form, if any
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub phase: PoiPhase,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Partial update applied to an existing POI from the detail form.
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoiPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl PoiPatch {
    /// Patch carrying just the detail-form fields
    pub fn details(name: impl Into<String>, description: impl Into<String>) -> Self {
        PoiPatch {
            name: Some(name.into()),
            description: Some(description.into()),
            image_url: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.image_url.is_none()
    }
}
