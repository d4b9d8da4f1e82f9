/// Two-phase media upload
///
/// Uploading a map background or a POI photo is blob-first: store the bytes,
/// take the returned URL, then write the document referencing it. The two
/// phases are not atomic; if the document write fails the blob stays behind
/// as an orphan, which is an accepted resource class, not a fatal error.
/// `reconcile_orphans` reports every blob no document references so callers
/// can clean up.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::coords::{Coordinate, MapScheme};
use crate::error::{Error, Result};
use crate::model::{MapId, PoiId, PoiPatch, Principal};
use crate::store::{BlobStore, CollectionHandle, DocumentStore, Namespace, NewMap};
use crate::sync::PoiSynchronizer;

pub struct MediaUploader {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
}

impl MediaUploader {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        MediaUploader { store, blobs }
    }

    /// Create a map from a local image: upload the background blob, then
    /// write the map document into the caller's user namespace (shared when
    /// unauthenticated). Returns the new map id.
    pub fn save_map_with_image(
        &self,
        principal: Option<&Principal>,
        title: &str,
        image_path: &Path,
        scheme: MapScheme,
    ) -> Result<MapId> {
        if title.trim().is_empty() {
            return Err(Error::ValidationFailed("map title is required".into()));
        }
        // Reject non-images before anything is uploaded
        let (width, height) = image::image_dimensions(image_path)
            .map_err(|e| Error::ValidationFailed(format!("not a usable image: {}", e)))?;
        println!("🗺️  Importing {}x{} map background", width, height);

        let url = self.upload_blob("maps", image_path)?;
        let ns = namespace_for(principal);
        self.store.insert_map(
            &ns,
            NewMap { title: title.trim().to_string(), image_url: url, scheme },
        )
    }

    /// Create a fully detailed POI with an optional photo: upload the photo
    /// blob (if any), insert the POI, then attach the photo URL. Goes through
    /// the synchronizer so subscribers get their snapshots.
    pub fn save_poi_with_image(
        &self,
        sync: &PoiSynchronizer,
        handle: &CollectionHandle,
        coordinate: Coordinate,
        name: &str,
        description: &str,
        photo_path: Option<&Path>,
    ) -> Result<PoiId> {
        if name.trim().is_empty() {
            return Err(Error::ValidationFailed("name is required".into()));
        }

        let photo_url = photo_path.map(|p| self.upload_blob("pois", p)).transpose()?;
        let id = sync.create_named(handle, coordinate, name.trim(), description)?;
        if let Some(url) = photo_url {
            sync.update(
                handle,
                &id,
                &PoiPatch { image_url: Some(url), ..Default::default() },
            )?;
        }
        Ok(id)
    }

    /// Blobs nothing references: the residue of interrupted two-phase
    /// uploads. Reported, not deleted; the caller decides.
    pub fn reconcile_orphans(&self) -> Result<Vec<String>> {
        let referenced: HashSet<String> =
            self.store.referenced_blob_urls()?.into_iter().collect();
        let mut orphans: Vec<String> = self
            .blobs
            .list()?
            .into_iter()
            .filter(|url| !referenced.contains(url))
            .collect();
        orphans.sort();
        Ok(orphans)
    }

    fn upload_blob(&self, bucket: &str, path: &Path) -> Result<String> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::ValidationFailed(format!("bad file name: {}", path.display())))?;
        let bytes = std::fs::read(path).map_err(Error::lookup)?;
        let key = format!("{}/{}_{}", bucket, Utc::now().timestamp_millis(), filename);
        self.blobs.put(&key, &bytes)
    }
}

fn namespace_for(principal: Option<&Principal>) -> Namespace {
    match principal {
        Some(p) => Namespace::User(p.uid.clone()),
        None => Namespace::Shared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;
    use crate::store::blob::FsBlobStore;
    use crate::store::sqlite::SqliteStore;
    use crate::sync::ChangeBus;

    fn write_png(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        image::RgbaImage::new(8, 6).save(&path).unwrap();
        path
    }

    fn setup() -> (Arc<SqliteStore>, Arc<FsBlobStore>, MediaUploader, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let blobs = Arc::new(FsBlobStore::open(&dir.path().join("blobs")).unwrap());
        let uploader = MediaUploader::new(store.clone(), blobs.clone());
        (store, blobs, uploader, dir)
    }

    #[test]
    fn map_upload_writes_blob_then_document() {
        let (store, _, uploader, dir) = setup();
        let png = write_png(dir.path(), "plan.png");
        let principal = Principal { uid: UserId("u1".into()), email: "u1@example.com".into() };

        let id = uploader
            .save_map_with_image(Some(&principal), " Campus ", &png, MapScheme::Normalized)
            .unwrap();
        let map = store
            .get_map(&Namespace::User(principal.uid.clone()), &id)
            .unwrap()
            .unwrap();
        assert_eq!(map.title, "Campus");
        assert!(map.image_url.contains("maps/"));
        assert!(map.image_url.ends_with("plan.png"));
        assert_eq!(map.owner, Some(principal.uid));
        // Nothing orphaned: the document references the blob
        assert!(uploader.reconcile_orphans().unwrap().is_empty());
    }

    #[test]
    fn unauthenticated_map_upload_lands_in_the_shared_namespace() {
        let (store, _, uploader, dir) = setup();
        let png = write_png(dir.path(), "plan.png");
        let id = uploader
            .save_map_with_image(None, "Festival", &png, MapScheme::Pixel)
            .unwrap();
        assert!(store.get_map(&Namespace::Shared, &id).unwrap().is_some());
    }

    #[test]
    fn non_image_uploads_are_rejected_before_any_blob_write() {
        let (_, blobs, uploader, dir) = setup();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();
        let err = uploader
            .save_map_with_image(None, "Campus", &path, MapScheme::Pixel)
            .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(_)));
        assert!(blobs.list().unwrap().is_empty());
    }

    #[test]
    fn poi_upload_attaches_the_photo_url() {
        let (store, _, uploader, dir) = setup();
        let bg = write_png(dir.path(), "bg.png");
        let photo = write_png(dir.path(), "fountain.png");
        let map_id = uploader
            .save_map_with_image(None, "Campus", &bg, MapScheme::Pixel)
            .unwrap();
        let handle = CollectionHandle::new(Namespace::Shared, map_id);
        let sync = PoiSynchronizer::new(store.clone(), Arc::new(ChangeBus::new()), None);

        let id = uploader
            .save_poi_with_image(
                &sync,
                &handle,
                Coordinate::Pixel { x: 10.0, y: 20.0 },
                "Fountain",
                "By the gate",
                Some(&photo),
            )
            .unwrap();

        let pois = store.list_pois(&handle).unwrap();
        assert_eq!(pois[0].id, id);
        assert!(pois[0].image_url.as_deref().unwrap().ends_with("fountain.png"));
        assert!(uploader.reconcile_orphans().unwrap().is_empty());
    }

    #[test]
    fn reconcile_reports_unreferenced_blobs() {
        let (_, blobs, uploader, _dir) = setup();
        // A blob whose document write never happened
        let url = blobs.put("maps/0_interrupted.png", b"bytes").unwrap();
        assert_eq!(uploader.reconcile_orphans().unwrap(), vec![url]);
    }
}
