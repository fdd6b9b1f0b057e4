//! Object store trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::IngestResult;

/// Core ObjectStore trait - all object storage backends implement this.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> IngestResult<()>;

    /// Locator for `key`.
    ///
    /// Built from configuration alone, never read back from the store, so it
    /// must follow the backend's own addressing scheme exactly.
    fn object_url(&self, key: &str) -> String;

    /// Human-readable backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Object store provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreProvider {
    #[default]
    S3,
    Local,
}

/// Object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Backend type.
    pub provider: ObjectStoreProvider,
    /// Bucket name.
    pub bucket: String,
    /// Bucket region.
    pub region: String,
    /// Prefix of the per-run destination folder.
    pub folder_prefix: String,
    /// File name the uploaded metadata table is stored under.
    pub manifest_filename: String,
    /// Root directory for the local backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_root: Option<PathBuf>,
    /// Endpoint override (for S3-compatible stores).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            provider: ObjectStoreProvider::S3,
            bucket: String::new(),
            region: "ap-southeast-1".to_string(),
            folder_prefix: "RAG_Update".to_string(),
            manifest_filename: "descriptions.csv".to_string(),
            local_root: None,
            endpoint_url: None,
        }
    }
}
