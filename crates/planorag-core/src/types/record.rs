//! Records flowing through the ingestion workflow.

use serde::{Deserialize, Serialize};

/// One row of the uploaded metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularRecord {
    /// Join key; equals the image file name without extension.
    pub key: String,
    /// Free-text product description.
    pub description: String,
}

impl TabularRecord {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
        }
    }
}

/// A table row joined with the image whose derived key equals the row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRecord {
    pub image_name: String,
    pub description: String,
    /// Position of the matched file in the validated image batch.
    pub image_index: usize,
}

/// The durable row written to the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntity {
    /// Unique business key.
    pub image_name: String,
    pub embedding: Vec<f32>,
    /// Base64 text of the image, kept for rendering.
    pub image_base64: String,
    pub description: String,
    /// Object-store locator of the uploaded image.
    pub s3_url: String,
}
