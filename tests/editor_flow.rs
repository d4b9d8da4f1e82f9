/// End-to-end flows through the public API: sign-up, map upload, tap-to-pin
/// editing, cross-session sync, and sharing.

use std::path::Path;
use std::sync::Arc;

use mapquestor::store::blob::FsBlobStore;
use mapquestor::store::sqlite::SqliteStore;
use mapquestor::{
    coords, ChangeBus, Coordinate, Credentials, EditorSession, Error, IdentityService,
    ImageBounds, MapScheme, MediaUploader, PoiPhase, Projection, RawInput, SessionConfig,
    SharePayload,
};

fn write_png(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    image::RgbaImage::new(8, 6).save(&path).unwrap();
    path
}

/// Unauthenticated user, shared pixel-scheme map: a tap at (120,340) on an
/// 800x600 render persists {x:120, y:340}, and reloading at 400x300 places
/// the marker at the same absolute offset. That visible misplacement is the
/// pixel scheme's documented behavior and must survive reimplementation.
#[tokio::test]
async fn pixel_scheme_keeps_absolute_offsets_across_viewports() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let blobs = Arc::new(FsBlobStore::open(&dir.path().join("blobs")).unwrap());
    let bus = Arc::new(ChangeBus::new());

    let bg = write_png(dir.path(), "venue.png");
    let uploader = MediaUploader::new(store.clone(), blobs);
    let map_id = uploader
        .save_map_with_image(None, "Venue", &bg, MapScheme::Pixel)
        .unwrap();

    let session = EditorSession::open(
        store.clone(),
        bus.clone(),
        None,
        map_id.clone(),
        SessionConfig::default(),
    )
    .await
    .unwrap();
    session
        .add_poi(RawInput::Tap { x: 120.0, y: 340.0 }, ImageBounds::new(800.0, 600.0))
        .await
        .unwrap();
    session.close();

    // Reload on a smaller viewport
    let reload = EditorSession::open(store, bus, None, map_id, SessionConfig::default())
        .await
        .unwrap();
    let pois = reload.pois();
    assert_eq!(pois.len(), 1);
    assert_eq!(pois[0].coordinate, Coordinate::Pixel { x: 120.0, y: 340.0 });
    match coords::to_screen(&pois[0].coordinate, ImageBounds::new(400.0, 300.0)) {
        Projection::Screen(pt) => assert_eq!((pt.x, pt.y), (120.0, 340.0)),
        Projection::Surface => panic!("raster maps project on screen"),
    }
}

/// Normalized-scheme map: a tap at (200,150) on 800x600 persists
/// {xPct:0.25, yPct:0.25} and renders at (100,75) on a 400x300 viewport.
#[tokio::test]
async fn normalized_scheme_is_resolution_independent() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let blobs = Arc::new(FsBlobStore::open(&dir.path().join("blobs")).unwrap());
    let bus = Arc::new(ChangeBus::new());

    let bg = write_png(dir.path(), "venue.png");
    let map_id = MediaUploader::new(store.clone(), blobs)
        .save_map_with_image(None, "Venue", &bg, MapScheme::Normalized)
        .unwrap();

    let session = EditorSession::open(store, bus, None, map_id, SessionConfig::default())
        .await
        .unwrap();
    session
        .add_poi(RawInput::Tap { x: 200.0, y: 150.0 }, ImageBounds::new(800.0, 600.0))
        .await
        .unwrap();

    let pois = session.pois();
    assert_eq!(pois[0].coordinate, Coordinate::Normalized { x_pct: 0.25, y_pct: 0.25 });
    match coords::to_screen(&pois[0].coordinate, ImageBounds::new(400.0, 300.0)) {
        Projection::Screen(pt) => {
            assert!((pt.x - 100.0).abs() < 1e-9);
            assert!((pt.y - 75.0).abs() < 1e-9);
        }
        Projection::Surface => panic!("raster maps project on screen"),
    }
}

/// A signed-in user's map lives in their namespace, is invisible to other
/// sessions, and round-trips through a share link.
#[tokio::test]
async fn signed_in_upload_edit_and_share() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let blobs = Arc::new(FsBlobStore::open(&dir.path().join("blobs")).unwrap());
    let bus = Arc::new(ChangeBus::new());

    store
        .sign_up(&Credentials::new("alice@example.com", "hunter22"))
        .unwrap();
    let principal = store
        .sign_in(&Credentials::new("alice@example.com", "hunter22"))
        .unwrap();

    let bg = write_png(dir.path(), "campus.png");
    let map_id = MediaUploader::new(store.clone(), blobs)
        .save_map_with_image(Some(&principal), "Campus", &bg, MapScheme::Normalized)
        .unwrap();

    // Nobody else resolves it
    let err = EditorSession::open(
        store.clone(),
        bus.clone(),
        None,
        map_id.clone(),
        SessionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // The owner edits it: tap, then fill the detail form
    let session = EditorSession::open(
        store,
        bus,
        Some(principal),
        map_id.clone(),
        SessionConfig::default(),
    )
    .await
    .unwrap();
    let poi_id = session
        .add_poi(RawInput::Tap { x: 400.0, y: 300.0 }, ImageBounds::new(800.0, 600.0))
        .await
        .unwrap();
    session
        .commit_poi(poi_id, "Library".into(), "Main entrance".into())
        .await
        .unwrap();
    let pois = session.pois();
    assert_eq!(pois[0].phase, PoiPhase::Committed);
    assert_eq!(pois[0].name, "Library");

    // Share link round trip: the QR string resolves back to this map
    let payload = SharePayload::new(map_id.clone());
    let parsed = mapquestor::parse_share_uri(&payload.uri()).unwrap();
    assert_eq!(parsed.map_id(), &map_id);
}
