//! Local filesystem object store.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use planorag_core::error::{IngestError, IngestResult};
use planorag_core::traits::ObjectStore;

/// Object store rooted at a local directory.
///
/// Keys map to relative paths under the root; locators are `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> IngestResult<Self> {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(root)
        };

        fs::create_dir_all(&root).await.map_err(|e| {
            IngestError::storage_unavailable(
                format!("Failed to create storage root {}: {}", root.display(), e),
                e,
            )
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `key`. Rejects keys that would leave the root.
    pub fn full_path(&self, key: &str) -> IngestResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(IngestError::storage(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> IngestResult<()> {
        let full_path = self.full_path(key)?;
        debug!(key = %key, full_path = %full_path.display(), size = data.len(), "local store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "local store: create_dir_all failed");
                IngestError::storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        // temp file + rename; suffix keeps 1.jpg and 1.png apart
        let mut temp_name = full_path.as_os_str().to_owned();
        temp_name.push(".part");
        let temp_path = PathBuf::from(temp_name);
        let write = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &full_path).await
        };
        write.await.map_err(|e| {
            warn!(key = %key, error = %e, "local store: write failed");
            IngestError::storage(format!("Failed to write {}: {}", full_path.display(), e))
        })
    }

    fn object_url(&self, key: &str) -> String {
        let path = self.root.join(key);
        url::Url::from_file_path(&path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("file://{}", path.display()))
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
