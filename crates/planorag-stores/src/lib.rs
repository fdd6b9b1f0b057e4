//! planorag-stores - Object store and record store implementations for planorag.
//!
//! # Object stores
//! - **S3** (feature: `s3`) - AWS S3 or an S3-compatible endpoint
//! - **Local** - a directory on the local filesystem, addressed by `file://` URLs
//!
//! # Record stores
//! - **PostgreSQL** (feature: `pgvector`) - one row per image with a pgvector
//!   embedding column

mod factory;
mod local;

#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "pgvector")]
mod postgres;

pub use factory::{ObjectStoreFactory, RecordStoreFactory};
pub use local::LocalObjectStore;

#[cfg(feature = "s3")]
pub use s3::{s3_key_from_url, s3_object_url, S3ObjectStore, DEFAULT_PRESIGN_EXPIRY};

#[cfg(feature = "pgvector")]
pub use postgres::{quote_identifier, PgRecordStore};

// Re-export core types for convenience
pub use planorag_core::traits::{
    ObjectStore, ObjectStoreConfig, ObjectStoreProvider, RecordStore, RecordStoreConfig,
    RecordStoreProvider,
};
