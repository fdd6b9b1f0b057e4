//! Factories for creating object stores and record stores.

use std::sync::Arc;

use planorag_core::error::{IngestError, IngestResult};
use planorag_core::traits::{
    ObjectStore, ObjectStoreConfig, ObjectStoreProvider, RecordStore, RecordStoreConfig,
    RecordStoreProvider,
};

use crate::local::LocalObjectStore;

/// Factory for creating object stores.
pub struct ObjectStoreFactory;

impl ObjectStoreFactory {
    /// Create an object store from the given configuration.
    pub async fn create(config: &ObjectStoreConfig) -> IngestResult<Arc<dyn ObjectStore>> {
        match config.provider {
            #[cfg(feature = "s3")]
            ObjectStoreProvider::S3 => {
                let store = crate::s3::S3ObjectStore::new(config).await?;
                Ok(Arc::new(store))
            }

            ObjectStoreProvider::Local => {
                let root = config.local_root.clone().ok_or_else(|| {
                    IngestError::Configuration("local_root required for the local store".to_string())
                })?;
                let store = LocalObjectStore::new(root).await?;
                Ok(Arc::new(store))
            }

            #[allow(unreachable_patterns)]
            _ => Err(IngestError::UnsupportedProvider {
                provider: format!("{:?} (feature not enabled)", config.provider),
            }),
        }
    }

    /// Create a local store rooted at `root`.
    pub async fn local(root: impl Into<std::path::PathBuf>) -> IngestResult<Arc<dyn ObjectStore>> {
        let config = ObjectStoreConfig {
            provider: ObjectStoreProvider::Local,
            local_root: Some(root.into()),
            ..Default::default()
        };
        Self::create(&config).await
    }
}

/// Factory for creating record stores.
pub struct RecordStoreFactory;

impl RecordStoreFactory {
    /// Create a record store whose embedding column holds `dimension` floats.
    pub async fn create(
        config: &RecordStoreConfig,
        dimension: usize,
    ) -> IngestResult<Arc<dyn RecordStore>> {
        match config.provider {
            #[cfg(feature = "pgvector")]
            RecordStoreProvider::Postgres => {
                let store = crate::postgres::PgRecordStore::new(config, dimension).await?;
                Ok(Arc::new(store))
            }

            #[allow(unreachable_patterns)]
            _ => {
                let _ = dimension;
                Err(IngestError::UnsupportedProvider {
                    provider: format!("{:?} (feature not enabled)", config.provider),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_requires_root() {
        let config = ObjectStoreConfig {
            provider: ObjectStoreProvider::Local,
            ..Default::default()
        };
        let err = ObjectStoreFactory::create(&config).await.err().unwrap();
        assert!(matches!(err, IngestError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStoreFactory::local(dir.path()).await.unwrap();
        assert_eq!(store.backend_name(), "local");
    }
}
