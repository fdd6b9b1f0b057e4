//! planorag-embeddings - Image embedding provider implementations for planorag.
//!
//! # Supported Providers
//!
//! - **AWS Bedrock** (feature: `bedrock`) - amazon.titan-embed-image-v1 and
//!   other Titan multimodal models
//!
//! # Example
//!
//! ```ignore
//! use planorag_embeddings::{EmbedderConfig, EmbedderFactory, EmbedderProvider};
//!
//! // Titan image embeddings, 1024 dimensions, ap-southeast-1
//! let embedder = EmbedderFactory::create(EmbedderProvider::AwsBedrock, EmbedderConfig::default()).await?;
//!
//! // Or from the `[embedder]` section of a loaded IngestConfig
//! let embedder = EmbedderFactory::from_config(&config.embedder).await?;
//!
//! let embedding = embedder.embed_image(&bytes).await?;
//! ```

mod bedrock;
mod factory;

pub use bedrock::{
    BedrockImageEmbedder, TitanEmbeddingConfig, TitanImageRequest, TitanImageResponse,
};
pub use factory::EmbedderFactory;

// Re-export core types for convenience
pub use planorag_core::traits::{EmbedderConfig, EmbedderProvider, ImageEmbedder, ImageEmbedding};
