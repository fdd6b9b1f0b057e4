//! planorag-core - Core library for planorag.
//!
//! This crate provides the traits, types, validation, matching and the
//! ingestion workflow that turns a metadata table plus a batch of product
//! images into embedded, stored and persisted records.
//!
//! # Example
//!
//! ```ignore
//! use planorag_core::{ImageBlob, IngestConfig, IngestProcessor, LocalFile};
//!
//! let config = IngestConfig::from_env()?;
//! let processor = IngestProcessor::new(embedder, object_store, record_store, &config);
//!
//! let mut table = LocalFile::open("descriptions.csv")?;
//! let images = vec![Box::new(LocalFile::open("42.jpg")?) as ImageBlob];
//! let result = processor.run_full_workflow(&mut table, images).await;
//! println!("{} inserted, {} skipped", result.successful, result.skipped);
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{EmbedderProviderConfig, FileRules, IngestConfig, IngestConfigBuilder};
pub use error::{ErrorCode, IngestError, IngestResult};
pub use ingest::{IngestProcessor, RecordOutcome, Uploader};
pub use traits::{
    EmbedderConfig, EmbedderProvider, ImageEmbedder, ImageEmbedding, ObjectStore,
    ObjectStoreConfig, ObjectStoreProvider, RecordStore, RecordStoreConfig, RecordStoreProvider,
};
pub use types::{
    ImageBlob, InMemoryFile, LocalFile, MatchedRecord, PersistedEntity, TabularRecord,
    UploadedFile, WorkflowResult, WorkflowStage,
};
