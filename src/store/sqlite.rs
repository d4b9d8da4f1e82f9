/// SQLite-backed document store and identity service
///
/// The hosted backend is modeled locally by one SQLite database holding map
/// documents, POI documents, and user accounts. The two map namespaces
/// (user-scoped and shared) share a table, partitioned by an owner column
/// that is NULL for shared maps. POI coordinates are stored as JSON text in
/// the same wire shape the documents use, so the scheme-dependent field names
/// (`x`/`y`, `xPct`/`yPct`, `lat`/`lng`) survive round trips unchanged.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::coords::{Coordinate, MapScheme};
use crate::error::{Error, Result};
use crate::model::{Map, MapId, Poi, PoiId, PoiPatch, PoiPhase, Principal, UserId};
use crate::store::{
    CollectionHandle, Credentials, DocumentStore, IdentityService, Namespace, NewMap,
};

/// Local document + identity backend over a single SQLite database.
///
/// The connection sits behind a mutex so one store can be shared across
/// sessions (and across tokio blocking tasks) behind an `Arc`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the user's default data path:
    /// - Linux: ~/.local/share/mapquestor/mapquestor.db
    /// - macOS: ~/Library/Application Support/mapquestor/mapquestor.db
    /// - Windows: %APPDATA%\mapquestor\mapquestor.db
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_db_path()?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::write)?;
        }
        let store = Self::open(&db_path)?;
        println!("📁 Database initialized at: {}", db_path.display());
        Ok(store)
    }

    /// Open (or create) a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(Error::lookup)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::lookup)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(SqliteStore { conn: Mutex::new(conn) })
    }

    fn default_db_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| Error::LookupFailed("could not determine user data directory".into()))?;
        path.push("mapquestor");
        path.push("mapquestor.db");
        Ok(path)
    }

    /// Create all tables and indexes if they don't exist
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS maps (
                id          TEXT PRIMARY KEY,
                owner_uid   TEXT,
                title       TEXT NOT NULL,
                image_url   TEXT NOT NULL,
                scheme      TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS pois (
                id          TEXT PRIMARY KEY,
                map_id      TEXT NOT NULL,
                owner_uid   TEXT,
                coordinate  TEXT NOT NULL,
                name        TEXT NOT NULL DEFAULT '',
                description TEXT,
                image_url   TEXT,
                phase       TEXT NOT NULL DEFAULT 'pending',
                created_at  INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS users (
                uid                  TEXT PRIMARY KEY,
                email                TEXT NOT NULL UNIQUE,
                pass_salt            TEXT NOT NULL,
                pass_hash            TEXT NOT NULL,
                verification_pending INTEGER NOT NULL DEFAULT 1,
                created_at           INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_maps_owner ON maps(owner_uid);
            CREATE INDEX IF NOT EXISTS idx_pois_map ON pois(map_id, owner_uid);",
        )
        .map_err(Error::write)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::LookupFailed("store connection mutex poisoned".into()))
    }

    fn owner_param(ns: &Namespace) -> Option<&str> {
        match ns {
            Namespace::User(uid) => Some(uid.as_str()),
            Namespace::Shared => None,
        }
    }

    fn scheme_to_str(scheme: MapScheme) -> &'static str {
        match scheme {
            MapScheme::Pixel => "pixel",
            MapScheme::Normalized => "normalized",
            MapScheme::Geographic => "geographic",
        }
    }

    fn scheme_from_str(s: &str) -> Result<MapScheme> {
        match s {
            "pixel" => Ok(MapScheme::Pixel),
            "normalized" => Ok(MapScheme::Normalized),
            "geographic" => Ok(MapScheme::Geographic),
            other => Err(Error::LookupFailed(format!("unknown map scheme '{}'", other))),
        }
    }

    fn phase_to_str(phase: PoiPhase) -> &'static str {
        match phase {
            PoiPhase::Pending => "pending",
            PoiPhase::Committed => "committed",
        }
    }

    fn phase_from_str(s: &str) -> PoiPhase {
        if s == "committed" {
            PoiPhase::Committed
        } else {
            PoiPhase::Pending
        }
    }

    fn timestamp_from_secs(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
    }

    fn row_to_map(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Map, String)> {
        let owner: Option<String> = row.get(1)?;
        let scheme: String = row.get(4)?;
        let created: i64 = row.get(5)?;
        Ok((
            Map {
                id: MapId(row.get(0)?),
                owner: owner.map(UserId),
                title: row.get(2)?,
                image_url: row.get(3)?,
                // placeholder, replaced below once the scheme string is parsed
                scheme: MapScheme::Pixel,
                created_at: Self::timestamp_from_secs(created),
            },
            scheme,
        ))
    }

    fn row_to_poi(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Poi, String)> {
        let coord_json: String = row.get(2)?;
        let phase: String = row.get(6)?;
        let created: i64 = row.get(7)?;
        Ok((
            Poi {
                id: PoiId(row.get(0)?),
                map_id: MapId(row.get(1)?),
                // placeholder, replaced below once the JSON column is parsed
                coordinate: Coordinate::Pixel { x: 0.0, y: 0.0 },
                name: row.get(3)?,
                description: row.get(4)?,
                image_url: row.get(5)?,
                phase: Self::phase_from_str(&phase),
                created_at: Self::timestamp_from_secs(created),
            },
            coord_json,
        ))
    }

    fn finish_map((mut map, scheme): (Map, String)) -> Result<Map> {
        map.scheme = Self::scheme_from_str(&scheme)?;
        Ok(map)
    }

    fn finish_poi((mut poi, coord_json): (Poi, String)) -> Result<Poi> {
        poi.coordinate = serde_json::from_str(&coord_json)
            .map_err(|e| Error::LookupFailed(format!("bad coordinate column: {}", e)))?;
        Ok(poi)
    }

    fn password_hash(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn is_unique_violation(e: &rusqlite::Error) -> bool {
        matches!(
            e,
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == ErrorCode::ConstraintViolation
        )
    }
}

#[cfg(test)]
impl SqliteStore {
    /// Test-only access to the raw connection, for fixtures the public API
    /// cannot express (e.g. the same map id in both namespaces)
    pub(crate) fn with_raw<F>(&self, f: F) -> rusqlite::Result<()>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<()>,
    {
        let conn = self.conn.lock().expect("store connection mutex poisoned");
        f(&conn)
    }
}

const MAP_COLUMNS: &str = "id, owner_uid, title, image_url, scheme, created_at";
const POI_COLUMNS: &str = "id, map_id, coordinate, name, description, image_url, phase, created_at";

impl DocumentStore for SqliteStore {
    fn get_map(&self, ns: &Namespace, id: &MapId) -> Result<Option<Map>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM maps WHERE id = ?1 AND owner_uid IS ?2", MAP_COLUMNS),
                params![id.as_str(), Self::owner_param(ns)],
                Self::row_to_map,
            )
            .optional()
            .map_err(Error::lookup)?;
        row.map(Self::finish_map).transpose()
    }

    fn insert_map(&self, ns: &Namespace, map: NewMap) -> Result<MapId> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO maps (id, owner_uid, title, image_url, scheme, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                Self::owner_param(ns),
                map.title,
                map.image_url,
                Self::scheme_to_str(map.scheme),
                Utc::now().timestamp(),
            ],
        )
        .map_err(Error::write)?;
        Ok(MapId(id))
    }

    fn list_maps(&self, ns: &Namespace) -> Result<Vec<Map>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM maps WHERE owner_uid IS ?1 ORDER BY created_at DESC",
                MAP_COLUMNS
            ))
            .map_err(Error::lookup)?;
        let rows = stmt
            .query_map(params![Self::owner_param(ns)], Self::row_to_map)
            .map_err(Error::lookup)?;

        let mut maps = Vec::new();
        for row in rows {
            maps.push(Self::finish_map(row.map_err(Error::lookup)?)?);
        }
        Ok(maps)
    }

    fn rename_map(&self, ns: &Namespace, id: &MapId, title: &str) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE maps SET title = ?1 WHERE id = ?2 AND owner_uid IS ?3",
                params![title, id.as_str(), Self::owner_param(ns)],
            )
            .map_err(Error::write)?;
        if changed == 0 {
            return Err(Error::NotFound(format!("map {}", id)));
        }
        Ok(())
    }

    fn delete_map(&self, ns: &Namespace, id: &MapId) -> Result<()> {
        // Cascade: the map and its POIs go together, in one transaction
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(Error::write)?;
        tx.execute(
            "DELETE FROM pois WHERE map_id = ?1 AND owner_uid IS ?2",
            params![id.as_str(), Self::owner_param(ns)],
        )
        .map_err(Error::write)?;
        tx.execute(
            "DELETE FROM maps WHERE id = ?1 AND owner_uid IS ?2",
            params![id.as_str(), Self::owner_param(ns)],
        )
        .map_err(Error::write)?;
        tx.commit().map_err(Error::write)
    }

    fn list_pois(&self, handle: &CollectionHandle) -> Result<Vec<Poi>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM pois WHERE map_id = ?1 AND owner_uid IS ?2",
                POI_COLUMNS
            ))
            .map_err(Error::lookup)?;
        let rows = stmt
            .query_map(
                params![handle.map_id.as_str(), Self::owner_param(&handle.namespace)],
                Self::row_to_poi,
            )
            .map_err(Error::lookup)?;

        let mut pois = Vec::new();
        for row in rows {
            pois.push(Self::finish_poi(row.map_err(Error::lookup)?)?);
        }
        Ok(pois)
    }

    fn insert_poi(
        &self,
        handle: &CollectionHandle,
        coordinate: Coordinate,
        name: &str,
        description: &str,
    ) -> Result<PoiId> {
        // The coordinate shape must match the parent map's scheme; probe the
        // map first so a mismatch never reaches the table.
        let map = self
            .get_map(&handle.namespace, &handle.map_id)?
            .ok_or_else(|| Error::NotFound(format!("map {}", handle.map_id)))?;
        if coordinate.scheme() != map.scheme {
            return Err(Error::ValidationFailed(format!(
                "coordinate scheme {:?} does not match map scheme {:?}",
                coordinate.scheme(),
                map.scheme
            )));
        }

        let id = Uuid::new_v4().to_string();
        let coord_json = serde_json::to_string(&coordinate)
            .map_err(|e| Error::WriteFailed(format!("encode coordinate: {}", e)))?;
        let description = if description.is_empty() { None } else { Some(description) };

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO pois (id, map_id, owner_uid, coordinate, name, description, phase, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                handle.map_id.as_str(),
                Self::owner_param(&handle.namespace),
                coord_json,
                name,
                description,
                Self::phase_to_str(PoiPhase::Pending),
                Utc::now().timestamp(),
            ],
        )
        .map_err(Error::write)?;
        Ok(PoiId(id))
    }

    fn update_poi(
        &self,
        handle: &CollectionHandle,
        id: &PoiId,
        patch: &PoiPatch,
        phase: Option<PoiPhase>,
    ) -> Result<()> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(name) = &patch.name {
            sets.push("name = ?");
            values.push(Box::new(name.clone()));
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            values.push(Box::new(description.clone()));
        }
        if let Some(url) = &patch.image_url {
            sets.push("image_url = ?");
            values.push(Box::new(url.clone()));
        }
        if let Some(phase) = phase {
            sets.push("phase = ?");
            values.push(Box::new(Self::phase_to_str(phase).to_string()));
        }

        let conn = self.conn()?;
        if sets.is_empty() {
            // Nothing to write, but a vanished POI must still be reported
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM pois WHERE id = ?1 AND map_id = ?2 AND owner_uid IS ?3)",
                    params![
                        id.as_str(),
                        handle.map_id.as_str(),
                        Self::owner_param(&handle.namespace)
                    ],
                    |row| row.get(0),
                )
                .map_err(Error::lookup)?;
            return if exists {
                Ok(())
            } else {
                Err(Error::NotFound(format!("POI {}", id)))
            };
        }

        // Positional placeholders are numbered after the SET clauses
        let sql = format!(
            "UPDATE pois SET {} WHERE id = ?{} AND map_id = ?{} AND owner_uid IS ?{}",
            sets.iter()
                .enumerate()
                .map(|(i, s)| s.replace('?', &format!("?{}", i + 1)))
                .collect::<Vec<_>>()
                .join(", "),
            values.len() + 1,
            values.len() + 2,
            values.len() + 3,
        );
        values.push(Box::new(id.as_str().to_string()));
        values.push(Box::new(handle.map_id.as_str().to_string()));
        values.push(Box::new(
            Self::owner_param(&handle.namespace).map(str::to_string),
        ));

        let changed = conn
            .execute(&sql, rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())))
            .map_err(Error::write)?;
        if changed == 0 {
            return Err(Error::NotFound(format!("POI {}", id)));
        }
        Ok(())
    }

    fn delete_poi(&self, handle: &CollectionHandle, id: &PoiId) -> Result<()> {
        // Idempotent: deleting an absent id is not an error the caller must
        // special-case
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM pois WHERE id = ?1 AND map_id = ?2 AND owner_uid IS ?3",
            params![
                id.as_str(),
                handle.map_id.as_str(),
                Self::owner_param(&handle.namespace)
            ],
        )
        .map_err(Error::write)?;
        Ok(())
    }

    fn referenced_blob_urls(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT image_url FROM maps
                 UNION
                 SELECT image_url FROM pois WHERE image_url IS NOT NULL",
            )
            .map_err(Error::lookup)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(Error::lookup)?;

        let mut urls = Vec::new();
        for row in rows {
            urls.push(row.map_err(Error::lookup)?);
        }
        Ok(urls)
    }
}

impl IdentityService for SqliteStore {
    fn sign_up(&self, creds: &Credentials) -> Result<Principal> {
        creds.validate()?;
        let email = creds.normalized_email();
        let uid = Uuid::new_v4().to_string();
        let salt = Uuid::new_v4().simple().to_string();
        let hash = Self::password_hash(&salt, &creds.password);

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (uid, email, pass_salt, pass_hash, verification_pending, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![uid, email, salt, hash, Utc::now().timestamp()],
        )
        .map_err(|e| {
            if Self::is_unique_violation(&e) {
                Error::ValidationFailed(format!("email '{}' is already in use", email))
            } else {
                Error::write(e)
            }
        })?;
        Ok(Principal { uid: UserId(uid), email })
    }

    fn sign_in(&self, creds: &Credentials) -> Result<Principal> {
        let email = creds.normalized_email();
        let conn = self.conn()?;
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT uid, pass_salt, pass_hash FROM users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(Error::lookup)?;

        match row {
            Some((uid, salt, hash)) if Self::password_hash(&salt, &creds.password) == hash => {
                Ok(Principal { uid: UserId(uid), email })
            }
            // Same answer for unknown email and wrong password
            _ => Err(Error::PermissionDenied("invalid email or password".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::MapScheme;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn new_map(scheme: MapScheme) -> NewMap {
        NewMap {
            title: "Campus".into(),
            image_url: "file:///blobs/maps/1_campus.png".into(),
            scheme,
        }
    }

    #[test]
    fn maps_are_partitioned_by_namespace() {
        let store = store();
        let user_ns = Namespace::User(UserId("u1".into()));
        let id = store.insert_map(&user_ns, new_map(MapScheme::Pixel)).unwrap();

        assert!(store.get_map(&user_ns, &id).unwrap().is_some());
        assert!(store.get_map(&Namespace::Shared, &id).unwrap().is_none());
        assert!(store
            .get_map(&Namespace::User(UserId("u2".into())), &id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn rename_updates_the_title_in_place() {
        let store = store();
        let ns = Namespace::User(UserId("u1".into()));
        let id = store.insert_map(&ns, new_map(MapScheme::Pixel)).unwrap();

        store.rename_map(&ns, &id, "East campus").unwrap();
        let map = store.get_map(&ns, &id).unwrap().unwrap();
        assert_eq!(map.title, "East campus");
        // Only the title moved
        assert_eq!(map.scheme, MapScheme::Pixel);
        assert_eq!(map.image_url, "file:///blobs/maps/1_campus.png");
    }

    #[test]
    fn renaming_a_missing_map_reports_not_found() {
        let store = store();
        let id = store.insert_map(&Namespace::Shared, new_map(MapScheme::Pixel)).unwrap();
        let err = store
            .rename_map(&Namespace::Shared, &MapId("missing".into()), "New")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        // The wrong namespace misses too
        let err = store
            .rename_map(&Namespace::User(UserId("u1".into())), &id, "New")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn poi_scheme_mismatch_is_rejected() {
        let store = store();
        let id = store.insert_map(&Namespace::Shared, new_map(MapScheme::Normalized)).unwrap();
        let handle = CollectionHandle::new(Namespace::Shared, id);
        let err = store
            .insert_poi(&handle, Coordinate::Pixel { x: 1.0, y: 2.0 }, "", "")
            .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(_)));
    }

    #[test]
    fn poi_crud_round_trip() {
        let store = store();
        let id = store.insert_map(&Namespace::Shared, new_map(MapScheme::Pixel)).unwrap();
        let handle = CollectionHandle::new(Namespace::Shared, id.clone());

        let poi_id = store
            .insert_poi(&handle, Coordinate::Pixel { x: 120.0, y: 340.0 }, "", "")
            .unwrap();
        let pois = store.list_pois(&handle).unwrap();
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].phase, PoiPhase::Pending);
        assert_eq!(pois[0].coordinate, Coordinate::Pixel { x: 120.0, y: 340.0 });
        assert_eq!(pois[0].map_id, id);

        store
            .update_poi(
                &handle,
                &poi_id,
                &PoiPatch::details("Fountain", "By the gate"),
                Some(PoiPhase::Committed),
            )
            .unwrap();
        let pois = store.list_pois(&handle).unwrap();
        assert_eq!(pois[0].name, "Fountain");
        assert_eq!(pois[0].description.as_deref(), Some("By the gate"));
        assert_eq!(pois[0].phase, PoiPhase::Committed);

        store.delete_poi(&handle, &poi_id).unwrap();
        assert!(store.list_pois(&handle).unwrap().is_empty());
        // Second delete of the same id is a no-op
        store.delete_poi(&handle, &poi_id).unwrap();
    }

    #[test]
    fn updating_a_vanished_poi_reports_not_found() {
        let store = store();
        let id = store.insert_map(&Namespace::Shared, new_map(MapScheme::Pixel)).unwrap();
        let handle = CollectionHandle::new(Namespace::Shared, id);
        let err = store
            .update_poi(&handle, &PoiId("gone".into()), &PoiPatch::details("x", ""), None)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn deleting_a_map_cascades_to_its_pois() {
        let store = store();
        let id = store.insert_map(&Namespace::Shared, new_map(MapScheme::Pixel)).unwrap();
        let handle = CollectionHandle::new(Namespace::Shared, id.clone());
        store
            .insert_poi(&handle, Coordinate::Pixel { x: 1.0, y: 1.0 }, "", "")
            .unwrap();

        store.delete_map(&Namespace::Shared, &id).unwrap();
        assert!(store.get_map(&Namespace::Shared, &id).unwrap().is_none());
        assert!(store.list_pois(&handle).unwrap().is_empty());
    }

    #[test]
    fn sign_up_then_sign_in() {
        let store = store();
        let creds = Credentials::new("  Alice@Example.COM ", "hunter22");
        let signed_up = store.sign_up(&creds).unwrap();
        assert_eq!(signed_up.email, "alice@example.com");

        let signed_in = store.sign_in(&Credentials::new("alice@example.com", "hunter22")).unwrap();
        assert_eq!(signed_in.uid, signed_up.uid);

        let err = store
            .sign_in(&Credentials::new("alice@example.com", "wrong-pass"))
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = store();
        let creds = Credentials::new("bob@example.com", "hunter22");
        store.sign_up(&creds).unwrap();
        let err = store.sign_up(&creds).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(_)));
    }

    #[test]
    fn referenced_urls_cover_maps_and_poi_photos() {
        let store = store();
        let id = store.insert_map(&Namespace::Shared, new_map(MapScheme::Pixel)).unwrap();
        let handle = CollectionHandle::new(Namespace::Shared, id);
        let poi_id = store
            .insert_poi(&handle, Coordinate::Pixel { x: 1.0, y: 1.0 }, "", "")
            .unwrap();
        store
            .update_poi(
                &handle,
                &poi_id,
                &PoiPatch {
                    image_url: Some("file:///blobs/pois/2_photo.jpg".into()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        let urls = store.referenced_blob_urls().unwrap();
        assert!(urls.contains(&"file:///blobs/maps/1_campus.png".to_string()));
        assert!(urls.contains(&"file:///blobs/pois/2_photo.jpg".to_string()));
    }
}
