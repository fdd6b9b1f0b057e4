//! Image embedder trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IngestResult;

/// An embedding together with the base64 text of the bytes it was computed from.
///
/// Providers encode the image anyway to send it upstream, so the encoding is
/// returned for persistence instead of being computed twice.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEmbedding {
    /// Fixed-length embedding vector.
    pub vector: Vec<f32>,
    /// Standard base64 encoding of the image bytes.
    pub image_base64: String,
}

/// Core ImageEmbedder trait - all embedding providers implement this.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    /// Generate an embedding for raw image bytes.
    async fn embed_image(&self, image: &[u8]) -> IngestResult<ImageEmbedding>;

    /// Get the dimension of the embeddings.
    fn dimension(&self) -> usize;

    /// Get the model identifier.
    fn model_name(&self) -> String;
}

/// Embedder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// Model identifier.
    pub model: String,
    /// Embedding dimensions requested from the model.
    pub embedding_dims: usize,
    /// Region hosting the model.
    pub region: String,
    /// Endpoint override (for local emulators or VPC endpoints).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

fn default_embedding_dims() -> usize {
    1024
}

fn default_region() -> String {
    "ap-southeast-1".to_string()
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: "amazon.titan-embed-image-v1".to_string(),
            embedding_dims: default_embedding_dims(),
            region: default_region(),
            endpoint_url: None,
        }
    }
}

/// Embedder provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderProvider {
    #[default]
    AwsBedrock,
}
