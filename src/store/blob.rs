/// Filesystem blob store
///
/// Stands in for the hosted object storage: blobs are files under a root
/// directory, keyed like the remote buckets were (`maps/{millis}_{name}`,
/// `pois/{millis}_{name}`), and the stable download URL is the file's
/// `file://` URL. Upload and the document write referencing the URL are two
/// separate phases, so a blob can exist with no document pointing at it;
/// `list` exposes everything stored so the upload layer can reconcile those
/// orphans instead of treating them as fatal.

use std::path::{Path, PathBuf};

use url::Url;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::store::BlobStore;

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Blob root under the user's data directory (`<data>/mapquestor/blobs`)
    pub fn open_default() -> Result<Self> {
        let mut root = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| Error::LookupFailed("could not determine user data directory".into()))?;
        root.push("mapquestor");
        root.push("blobs");
        Self::open(&root)
    }

    /// Open a blob store rooted at `root`, creating it if needed
    pub fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(Error::write)?;
        Ok(FsBlobStore { root: root.to_path_buf() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url_for(&self, path: &Path) -> Result<String> {
        Url::from_file_path(path)
            .map(|u| u.to_string())
            .map_err(|_| Error::WriteFailed(format!("non-absolute blob path: {}", path.display())))
    }

    fn check_key(key: &str) -> Result<()> {
        // Keys are forward-slash relative paths; anything escaping the root
        // is rejected
        if key.is_empty()
            || key.starts_with('/')
            || key.split('/').any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(Error::ValidationFailed(format!("invalid blob key '{}'", key)));
        }
        Ok(())
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String> {
        Self::check_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::write)?;
        }
        std::fs::write(&path, bytes).map_err(Error::write)?;
        self.url_for(&path)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(Error::lookup)?;
            if entry.file_type().is_file() {
                urls.push(self.url_for(entry.path())?);
            }
        }
        Ok(urls)
    }
}
