/// Editor session
///
/// One session per open editor screen. The session owns the only locally
/// mutable state in the system: the in-memory POI list and the currently
/// selected POI, both discarded when the session closes.
///
/// Remote calls run on blocking tasks so the caller stays responsive, and
/// every call is bounded by the session deadline; a hung resolve or write
/// surfaces as `Error::Timeout` instead of an indefinite spinner. Both local
/// edits and remote changes reach the in-memory list through the same
/// snapshot callback, so updates apply in arrival order (last-writer-wins;
/// the store offers no transactional merge).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task;

use crate::coords::{self, ImageBounds, RawInput};
use crate::error::{Error, Result};
use crate::model::{Map, MapId, Poi, PoiId, PoiPatch, Principal};
use crate::registry::MapRegistry;
use crate::store::{CollectionHandle, DocumentStore};
use crate::sync::{ChangeBus, PoiSynchronizer, SubscriptionHandle};

/// Session tuning. The default deadline keeps a dead backend from hanging
/// the screen.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub deadline: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig { deadline: Duration::from_secs(10) }
    }
}

pub struct EditorSession {
    sync: Arc<PoiSynchronizer>,
    map: Map,
    handle: CollectionHandle,
    pois: Arc<Mutex<Vec<Poi>>>,
    selected: Mutex<Option<PoiId>>,
    subscription: SubscriptionHandle,
    failure: Arc<Mutex<Option<Error>>>,
    deadline: Duration,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession").finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Resolve the map and start the live POI subscription.
    ///
    /// The initial snapshot is in `pois()` once this returns. Resolution
    /// probes the user namespace first when a principal is present.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        bus: Arc<ChangeBus>,
        principal: Option<Principal>,
        map_id: MapId,
        config: SessionConfig,
    ) -> Result<EditorSession> {
        let deadline = config.deadline;

        let resolve_store = store.clone();
        let resolve_principal = principal.clone();
        let (map, handle) = run_with_deadline(deadline, move || {
            MapRegistry::new(resolve_store).resolve_map(&map_id, resolve_principal.as_ref())
        })
        .await?;

        let sync = Arc::new(PoiSynchronizer::new(store, bus, principal));
        let pois: Arc<Mutex<Vec<Poi>>> = Arc::new(Mutex::new(Vec::new()));
        let failure: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));

        let snapshot_sink = pois.clone();
        let failure_sink = failure.clone();
        let subscription = sync.subscribe(
            &handle,
            Box::new(move |snapshot| {
                if let Ok(mut list) = snapshot_sink.lock() {
                    *list = snapshot.to_vec();
                }
            }),
            Box::new(move |err| {
                if let Ok(mut slot) = failure_sink.lock() {
                    *slot = Some(err);
                }
            }),
        );

        Ok(EditorSession {
            sync,
            map,
            handle,
            pois,
            selected: Mutex::new(None),
            subscription,
            failure,
            deadline,
        })
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn collection(&self) -> &CollectionHandle {
        &self.handle
    }

    /// Current in-memory POI list (order unspecified)
    pub fn pois(&self) -> Vec<Poi> {
        self.pois.lock().map(|list| list.clone()).unwrap_or_default()
    }

    /// The terminal subscription error, if the live listener has failed.
    /// The error stays readable for the lifetime of the session, so every
    /// caller polling the session sees the same terminal state.
    pub fn failure(&self) -> Option<Error> {
        self.failure.lock().ok().and_then(|slot| slot.clone())
    }

    /// Place a POI at a raw input position. The marker exists in the store
    /// (and in every subscriber's next snapshot) before the detail form is
    /// filled in.
    pub async fn add_poi(&self, raw: RawInput, bounds: ImageBounds) -> Result<PoiId> {
        // Pure mapping first: a scheme mismatch never reaches the store
        let coordinate = coords::to_persisted(raw, self.map.scheme, bounds)?;
        let sync = self.sync.clone();
        let handle = self.handle.clone();
        let id = run_with_deadline(self.deadline, move || sync.create(&handle, coordinate)).await?;
        if let Ok(mut selected) = self.selected.lock() {
            *selected = Some(id.clone());
        }
        Ok(id)
    }

    /// Save the detail form for a POI, committing its creation
    pub async fn commit_poi(&self, id: PoiId, name: String, description: String) -> Result<()> {
        let sync = self.sync.clone();
        let handle = self.handle.clone();
        run_with_deadline(self.deadline, move || {
            sync.update(&handle, &id, &PoiPatch::details(name, description))
        })
        .await
    }

    /// Apply an arbitrary partial update (e.g. attaching a photo URL)
    pub async fn patch_poi(&self, id: PoiId, patch: PoiPatch) -> Result<()> {
        let sync = self.sync.clone();
        let handle = self.handle.clone();
        run_with_deadline(self.deadline, move || sync.update(&handle, &id, &patch)).await
    }

    pub async fn remove_poi(&self, id: PoiId) -> Result<()> {
        if let Ok(mut selected) = self.selected.lock() {
            if selected.as_ref() == Some(&id) {
                *selected = None;
            }
        }
        let sync = self.sync.clone();
        let handle = self.handle.clone();
        run_with_deadline(self.deadline, move || sync.delete(&handle, &id)).await
    }

    pub fn select(&self, id: Option<PoiId>) {
        if let Ok(mut selected) = self.selected.lock() {
            *selected = id;
        }
    }

    pub fn selected_poi(&self) -> Option<Poi> {
        let id = self.selected.lock().ok()?.clone()?;
        self.pois.lock().ok()?.iter().find(|p| p.id == id).cloned()
    }

    /// Release the live listener. Dropping the session does the same; either
    /// way the listener never fires into a closed session.
    pub fn close(self) {
        self.sync.unsubscribe(&self.subscription);
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.sync.unsubscribe(&self.subscription);
    }
}

/// Run a blocking store call off the async thread, bounded by `deadline`
async fn run_with_deadline<T, F>(deadline: Duration, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::time::timeout(deadline, task::spawn_blocking(call)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(Error::LookupFailed(format!("task join error: {}", join_err))),
        Err(_) => Err(Error::Timeout(deadline)),
    }
}
