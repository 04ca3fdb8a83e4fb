//! Images stored on the admin server's disk.

use std::path::{Path, PathBuf};

use super::{UploadError, random_stem};

/// A directory of uploaded images and the URL prefix it is served under.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
    public_url: String,
}

impl LocalStore {
    #[must_use]
    pub fn new(dir: PathBuf, public_url: String) -> Self {
        Self {
            dir,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub const fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub(super) async fn store(&self, bytes: &[u8], extension: &str) -> Result<String, UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name = format!("{}.{extension}", random_stem());
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        Ok(format!("{}/{name}", self.public_url))
    }

    pub(super) async fn delete(&self, url: &str) -> Result<(), UploadError> {
        let Some(path) = self.path_for(url) else {
            tracing::debug!(url = %url, "Not a local upload, nothing to delete");
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The file behind `url`, if it is one of ours. Only bare file names
    /// directly under the prefix qualify.
    fn path_for(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(&self.public_url)?.strip_prefix('/')?;
        let is_bare = !name.is_empty()
            && Path::new(name).file_name().is_some_and(|f| f == name)
            && !name.starts_with('.');
        is_bare.then(|| self.dir.join(name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for() {
        let store = LocalStore::new(
            PathBuf::from("/srv/uploads"),
            "https://admin.dokan.com.bd/uploads/".to_string(),
        );
        assert_eq!(
            store.path_for("https://admin.dokan.com.bd/uploads/ab12.png"),
            Some(PathBuf::from("/srv/uploads/ab12.png"))
        );
        assert_eq!(store.path_for("https://admin.dokan.com.bd/uploads/../etc/passwd"), None);
        assert_eq!(store.path_for("https://admin.dokan.com.bd/uploads/"), None);
        assert_eq!(store.path_for("https://res.cloudinary.com/x/image/upload/a.png"), None);
    }

    #[tokio::test]
    async fn test_store_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(
            dir.path().to_path_buf(),
            "http://localhost:3001/uploads".to_string(),
        );

        let url = store.store(b"png-bytes", "png").await.unwrap();
        assert!(url.starts_with("http://localhost:3001/uploads/"));
        assert!(url.ends_with(".png"));

        let path = store.path_for(&url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png-bytes");

        store.delete(&url).await.unwrap();
        assert!(!path.exists());

        // Deleting twice is fine.
        store.delete(&url).await.unwrap();
    }
}
