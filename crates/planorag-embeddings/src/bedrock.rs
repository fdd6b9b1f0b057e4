//! AWS Bedrock image embedding provider (Titan multimodal models).

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use planorag_core::error::{ErrorCode, IngestError, IngestResult};
use planorag_core::traits::{EmbedderConfig, ImageEmbedder, ImageEmbedding};

#[cfg(feature = "bedrock")]
use aws_sdk_bedrockruntime::{error::DisplayErrorContext, primitives::Blob, Client};

/// Output lengths accepted by the Titan image models.
const TITAN_OUTPUT_LENGTHS: [usize; 3] = [256, 384, 1024];

/// Request body for Titan image embeddings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanImageRequest {
    pub input_image: String,
    pub embedding_config: TitanEmbeddingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanEmbeddingConfig {
    pub output_embedding_length: usize,
}

impl TitanImageRequest {
    pub fn new(image_base64: String, dimension: usize) -> Self {
        Self {
            input_image: image_base64,
            embedding_config: TitanEmbeddingConfig {
                output_embedding_length: dimension,
            },
        }
    }
}

/// Response body for Titan image embeddings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanImageResponse {
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TitanImageResponse {
    /// Parse a response body and check the vector length.
    pub fn parse(body: &[u8], dimension: usize) -> IngestResult<Vec<f32>> {
        let response: TitanImageResponse = serde_json::from_slice(body).map_err(|e| {
            IngestError::embedding(format!("Invalid response from Bedrock: {}", e))
        })?;

        let embedding = match response.embedding {
            Some(embedding) if !embedding.is_empty() => embedding,
            _ => {
                let message = match response.message {
                    Some(reason) => format!("No embedding returned from Bedrock: {}", reason),
                    None => "No embedding returned from Bedrock".to_string(),
                };
                return Err(IngestError::embedding(message));
            }
        };

        if embedding.len() != dimension {
            return Err(IngestError::Embedding {
                message: format!(
                    "Bedrock returned {} dimensions, expected {}",
                    embedding.len(),
                    dimension
                ),
                code: ErrorCode::EmbDimensionMismatch,
                source: None,
            });
        }

        Ok(embedding)
    }
}

/// AWS Bedrock image embedding provider.
pub struct BedrockImageEmbedder {
    #[cfg(feature = "bedrock")]
    client: Client,
    config: EmbedderConfig,
}

impl BedrockImageEmbedder {
    /// Create a new Bedrock embedder using the default AWS credential chain.
    pub async fn new(config: EmbedderConfig) -> IngestResult<Self> {
        if config.model.trim().is_empty() {
            return Err(IngestError::Configuration(
                "Bedrock model identifier required".to_string(),
            ));
        }
        if config.embedding_dims == 0 {
            return Err(IngestError::Configuration(
                "Embedding dimension must be greater than zero".to_string(),
            ));
        }
        if !TITAN_OUTPUT_LENGTHS.contains(&config.embedding_dims) {
            warn!(
                model = %config.model,
                dims = config.embedding_dims,
                "Titan image models accept output lengths 256, 384 or 1024"
            );
        }

        #[cfg(feature = "bedrock")]
        let client = {
            let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.region.clone()))
                .load()
                .await;
            let mut builder = aws_sdk_bedrockruntime::config::Builder::from(&sdk_config);
            if let Some(endpoint) = &config.endpoint_url {
                builder = builder.endpoint_url(endpoint);
            }
            Client::from_conf(builder.build())
        };

        Ok(Self {
            #[cfg(feature = "bedrock")]
            client,
            config,
        })
    }

    /// Serialized request body for `image`.
    pub fn request_body(&self, image_base64: &str) -> IngestResult<Vec<u8>> {
        let request = TitanImageRequest::new(image_base64.to_string(), self.config.embedding_dims);
        Ok(serde_json::to_vec(&request)?)
    }
}

#[async_trait]
impl ImageEmbedder for BedrockImageEmbedder {
    #[cfg(feature = "bedrock")]
    async fn embed_image(&self, image: &[u8]) -> IngestResult<ImageEmbedding> {
        if image.is_empty() {
            return Err(IngestError::embedding("Image is empty"));
        }

        let image_base64 = STANDARD.encode(image);
        let body = self.request_body(&image_base64)?;

        debug!(model = %self.config.model, bytes = image.len(), "Invoking Bedrock");
        let output = self
            .client
            .invoke_model()
            .model_id(&self.config.model)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| {
                let message = format!("Bedrock embedding error: {}", DisplayErrorContext(&e));
                IngestError::embedding_unavailable(message, e)
            })?;

        let vector = TitanImageResponse::parse(output.body().as_ref(), self.config.embedding_dims)?;
        Ok(ImageEmbedding {
            vector,
            image_base64,
        })
    }

    #[cfg(not(feature = "bedrock"))]
    async fn embed_image(&self, _image: &[u8]) -> IngestResult<ImageEmbedding> {
        Err(IngestError::Configuration(
            "Bedrock feature not enabled. Enable the 'bedrock' feature.".to_string(),
        ))
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}
