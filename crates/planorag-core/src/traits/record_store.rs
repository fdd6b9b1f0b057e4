//! Record store trait and related types.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::IngestResult;
use crate::types::PersistedEntity;

/// Core RecordStore trait - the relational store holding ingested images.
///
/// `image_name` is the business key. Implementations run every insert in its
/// own transaction; there is no batch-wide transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether a row with this `image_name` already exists.
    async fn exists(&self, image_name: &str) -> IngestResult<bool>;

    /// Insert one entity. A failed insert is rolled back before returning.
    async fn insert(&self, entity: &PersistedEntity) -> IngestResult<()>;
}

/// Record store provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordStoreProvider {
    #[default]
    Postgres,
}

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordStoreConfig {
    /// Backend type.
    pub provider: RecordStoreProvider,
    /// Full connection URL; takes precedence over the discrete fields.
    #[serde(skip_serializing)]
    pub url: Option<SecretString>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: Option<SecretString>,
    /// Table holding ingested images.
    pub table: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            provider: RecordStoreProvider::Postgres,
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            database: "planogramdb".to_string(),
            user: "postgres".to_string(),
            password: None,
            table: "product_images".to_string(),
            max_connections: 5,
        }
    }
}
