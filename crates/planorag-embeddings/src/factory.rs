//! Factory for creating image embedding providers.

use std::sync::Arc;

use planorag_core::config::EmbedderProviderConfig;
use planorag_core::error::IngestResult;
use planorag_core::traits::{EmbedderConfig, EmbedderProvider, ImageEmbedder};

use crate::bedrock::BedrockImageEmbedder;

/// Factory for creating image embedding providers.
pub struct EmbedderFactory;

impl EmbedderFactory {
    /// Create an embedder from the given configuration.
    pub async fn create(
        provider: EmbedderProvider,
        config: EmbedderConfig,
    ) -> IngestResult<Arc<dyn ImageEmbedder>> {
        match provider {
            EmbedderProvider::AwsBedrock => {
                let embedder = BedrockImageEmbedder::new(config).await?;
                Ok(Arc::new(embedder))
            }
        }
    }

    /// Create an embedder from the `[embedder]` section of the ingest config.
    pub async fn from_config(config: &EmbedderProviderConfig) -> IngestResult<Arc<dyn ImageEmbedder>> {
        Self::create(config.provider, config.config.clone()).await
    }
}
