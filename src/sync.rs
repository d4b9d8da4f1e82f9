/// POI Synchronizer
///
/// Maintains the live set of POIs for a map collection: registers snapshot
/// listeners, persists create/update/delete operations into the collection the
/// registry resolved (user-owned or shared), and republishes the full POI list
/// to every listener after each change, mirroring the remote store's snapshot
/// semantics. Creation is optimistic: the placeholder row exists before the
/// user has typed a name, and any concurrent subscriber will observe it in the
/// `Pending` phase. That is deliberate, not a bug.
///
/// Subscriptions must be released on screen teardown; a liveness flag makes
/// `unsubscribe` idempotent and guards against callbacks firing into a
/// torn-down session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::coords::Coordinate;
use crate::error::{Error, Result};
use crate::model::{Poi, PoiId, PoiPatch, PoiPhase, Principal};
use crate::store::{CollectionHandle, DocumentStore, Namespace};

/// Snapshot listener: receives the full current POI list on the initial
/// snapshot and after every change. List order is unspecified.
pub type OnChange = Box<dyn Fn(&[Poi]) + Send + Sync>;

/// Error listener: invoked at most once; its invocation terminates the
/// subscription.
pub type OnError = Box<dyn FnOnce(Error) + Send>;

struct Subscriber {
    alive: Arc<AtomicBool>,
    on_change: OnChange,
    on_error: Mutex<Option<OnError>>,
}

impl Subscriber {
    fn deliver(&self, pois: &[Poi]) {
        if self.alive.load(Ordering::SeqCst) {
            (self.on_change)(pois);
        }
    }

    fn fail(&self, err: Error) {
        // At most once, and the subscription is dead afterwards
        if self.alive.swap(false, Ordering::SeqCst) {
            if let Ok(mut slot) = self.on_error.lock() {
                if let Some(on_error) = slot.take() {
                    on_error(err);
                }
            }
        }
    }
}

/// Fan-out of collection snapshots to live subscribers.
///
/// Synchronizers that share one store must share one bus, so a second session
/// on the same map observes the first session's edits. Publishing happens in
/// arrival order under one lock, which is the "single logical update queue"
/// the concurrency model requires; the store offers no transactional merge,
/// so last-writer-wins by arrival order.
#[derive(Default)]
pub struct ChangeBus {
    subscribers: Mutex<HashMap<String, Vec<Arc<Subscriber>>>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, path: &str, subscriber: Arc<Subscriber>) {
        if let Ok(mut map) = self.subscribers.lock() {
            map.entry(path.to_string()).or_default().push(subscriber);
        }
    }

    fn live_subscribers(&self, path: &str) -> Vec<Arc<Subscriber>> {
        let mut map = match self.subscribers.lock() {
            Ok(map) => map,
            Err(_) => return Vec::new(),
        };
        if let Some(subs) = map.get_mut(path) {
            subs.retain(|s| s.alive.load(Ordering::SeqCst));
            if subs.is_empty() {
                // Last subscriber gone, drop the path entry too
                map.remove(path);
                return Vec::new();
            }
            subs.clone()
        } else {
            Vec::new()
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_paths(&self) -> usize {
        self.subscribers.lock().map(|map| map.len()).unwrap_or(0)
    }

    fn publish(&self, path: &str, pois: &[Poi]) {
        // Callbacks run outside the registry lock so a listener may itself
        // subscribe or unsubscribe
        for sub in self.live_subscribers(path) {
            sub.deliver(pois);
        }
    }

    fn fail(&self, path: &str, err_for: impl Fn() -> Error) {
        for sub in self.live_subscribers(path) {
            sub.fail(err_for());
        }
    }
}

/// Handle returned by `subscribe`; pass it back to `unsubscribe` on teardown
pub struct SubscriptionHandle {
    alive: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    /// Whether the subscription still delivers snapshots
    pub fn is_live(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

pub struct PoiSynchronizer {
    store: Arc<dyn DocumentStore>,
    bus: Arc<ChangeBus>,
    principal: Option<Principal>,
}

impl PoiSynchronizer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        bus: Arc<ChangeBus>,
        principal: Option<Principal>,
    ) -> Self {
        PoiSynchronizer { store, bus, principal }
    }

    /// Register a live listener on the collection. The initial snapshot is
    /// delivered before this returns; every subsequent change republishes the
    /// full list. A failed initial read goes to `on_error` and the returned
    /// handle is already dead.
    pub fn subscribe(
        &self,
        handle: &CollectionHandle,
        on_change: OnChange,
        on_error: OnError,
    ) -> SubscriptionHandle {
        let alive = Arc::new(AtomicBool::new(true));
        let subscriber = Arc::new(Subscriber {
            alive: alive.clone(),
            on_change,
            on_error: Mutex::new(Some(on_error)),
        });
        self.bus.register(&handle.pois_path(), subscriber.clone());

        match self.store.list_pois(handle) {
            Ok(pois) => subscriber.deliver(&pois),
            Err(err) => subscriber.fail(err),
        }
        SubscriptionHandle { alive }
    }

    /// Stop delivery. Idempotent: a second call on the same handle is a no-op.
    pub fn unsubscribe(&self, sub: &SubscriptionHandle) {
        sub.alive.store(false, Ordering::SeqCst);
    }

    /// Insert an optimistic placeholder POI at `coordinate`: the row exists
    /// in the store (phase `Pending`, empty details) before the user has
    /// filled the detail form. Returns the assigned id on store
    /// acknowledgment.
    pub fn create(&self, handle: &CollectionHandle, coordinate: Coordinate) -> Result<PoiId> {
        self.create_named(handle, coordinate, "", "")
    }

    /// Insert with details already known (e.g. the standalone POI form)
    pub fn create_named(
        &self,
        handle: &CollectionHandle,
        coordinate: Coordinate,
        name: &str,
        description: &str,
    ) -> Result<PoiId> {
        self.authorize_write(handle)?;
        let id = self.store.insert_poi(handle, coordinate, name, description)?;
        self.republish(handle);
        Ok(id)
    }

    /// Partial update from the detail form. Saving a name commits the POI's
    /// creation state machine; an empty name is rejected before any store
    /// call. Fails with `NotFound` if the POI was concurrently deleted.
    pub fn update(&self, handle: &CollectionHandle, id: &PoiId, patch: &PoiPatch) -> Result<()> {
        self.authorize_write(handle)?;
        let phase = match &patch.name {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::ValidationFailed("name is required".into()));
            }
            Some(_) => Some(PoiPhase::Committed),
            None => None,
        };
        self.store.update_poi(handle, id, patch, phase)?;
        self.republish(handle);
        Ok(())
    }

    /// Delete a POI. Idempotent from the caller's perspective: deleting an
    /// already-deleted id is not an error.
    pub fn delete(&self, handle: &CollectionHandle, id: &PoiId) -> Result<()> {
        self.authorize_write(handle)?;
        self.store.delete_poi(handle, id)?;
        self.republish(handle);
        Ok(())
    }

    /// Writes into a user namespace require the matching session principal.
    /// The shared namespace accepts anonymous writes, as shared maps always
    /// have.
    fn authorize_write(&self, handle: &CollectionHandle) -> Result<()> {
        match (&handle.namespace, &self.principal) {
            (Namespace::Shared, _) => Ok(()),
            (Namespace::User(owner), Some(p)) if p.uid == *owner => Ok(()),
            (Namespace::User(owner), _) => Err(Error::PermissionDenied(format!(
                "writing to user namespace {} requires that user's session",
                owner.as_str()
            ))),
        }
    }

    fn republish(&self, handle: &CollectionHandle) {
        let path = handle.pois_path();
        match self.store.list_pois(handle) {
            Ok(pois) => self.bus.publish(&path, &pois),
            Err(err) => {
                let msg = err.to_string();
                self.bus.fail(&path, || Error::LookupFailed(msg.clone()));
            }
        }
    }
}
