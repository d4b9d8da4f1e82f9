/// mapquestor core
///
/// The engine behind a map-annotation app: users sign in, upload a background
/// image as a map, tap it to drop Points of Interest, and share maps by link.
/// This crate is the part that is independent of any screen:
/// - Data model and coordinate mapping (model.rs, coords.rs)
/// - Backend service interfaces and local implementations (store/)
/// - Map resolution across user/shared namespaces (registry.rs)
/// - Live POI synchronization (sync.rs)
/// - Per-screen edit sessions with deadlines (session.rs)
/// - Two-phase media upload and orphan reconciliation (upload.rs)
/// - Share links, QR payloads, and NDEF records (share.rs)
///
/// The document store, blob store, and identity service are injected traits;
/// the bundled implementations keep everything on SQLite and the local
/// filesystem, which is also how the tests run.

pub mod coords;
pub mod error;
pub mod model;
pub mod registry;
pub mod session;
pub mod share;
pub mod store;
pub mod sync;
pub mod upload;

pub use coords::{Coordinate, ImageBounds, MapScheme, Projection, RawInput, ScreenPoint};
pub use error::{Error, Result};
pub use model::{Map, MapId, Poi, PoiId, PoiPatch, PoiPhase, Principal, UserId};
pub use registry::MapRegistry;
pub use session::{EditorSession, SessionConfig};
pub use share::{parse_share_uri, SharePayload};
pub use store::{
    BlobStore, CollectionHandle, Credentials, DocumentStore, IdentityService, Namespace, NewMap,
};
pub use sync::{ChangeBus, PoiSynchronizer, SubscriptionHandle};
pub use upload::MediaUploader;
