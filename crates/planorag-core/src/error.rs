//! Error types for planorag operations.
//!
//! Every boundary in the ingestion workflow returns an [`IngestResult`]. The
//! variants mirror the failure classes of the workflow: validation failures are
//! fatal at the gate, embedding/storage/persistence failures are per-record, and
//! aborts end a run before any record is attempted.

use thiserror::Error;

/// Result type alias for planorag operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Main error type for all planorag operations.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// Embedding generation failed.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Object storage operation failed.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Relational store operation failed.
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The workflow could not continue past one of its gates.
    #[error("Workflow aborted: {message}")]
    Aborted { message: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValInvalidFormat,
    ValTooLarge,
    ValEmpty,

    // Embedding (EMB_xxx)
    EmbConnectionFailed,
    EmbGenerationFailed,
    EmbDimensionMismatch,

    // Storage (STO_xxx)
    StoConnectionFailed,
    StoUploadFailed,

    // Persistence (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,

    // Workflow (WF_xxx)
    WfNoMatches,
    WfStorageUnavailable,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValInvalidFormat => "VAL_003",
            ErrorCode::ValTooLarge => "VAL_004",
            ErrorCode::ValEmpty => "VAL_005",
            ErrorCode::EmbConnectionFailed => "EMB_001",
            ErrorCode::EmbGenerationFailed => "EMB_002",
            ErrorCode::EmbDimensionMismatch => "EMB_003",
            ErrorCode::StoConnectionFailed => "STO_001",
            ErrorCode::StoUploadFailed => "STO_002",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::WfNoMatches => "WF_001",
            ErrorCode::WfStorageUnavailable => "WF_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl IngestError {
    /// Create a validation error with a specific code.
    pub fn validation_with_code(message: impl Into<String>, code: ErrorCode) -> Self {
        Self::Validation {
            message: message.into(),
            code,
            suggestion: None,
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create an embedding error for an unreachable service.
    pub fn embedding_unavailable(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbConnectionFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoUploadFailed,
            source: None,
        }
    }

    /// Create a storage error for a backend that cannot be reached or set up.
    pub fn storage_unavailable(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoConnectionFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create an abort error.
    pub fn aborted(message: impl Into<String>, code: ErrorCode) -> Self {
        Self::Aborted {
            message: message.into(),
            code,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::Embedding { code, .. } => *code,
            Self::Storage { code, .. } => *code,
            Self::Persistence { code, .. } => *code,
            Self::Aborted { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// The bare message without the category prefix added by `Display`.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. }
            | Self::Embedding { message, .. }
            | Self::Storage { message, .. }
            | Self::Persistence { message, .. }
            | Self::Aborted { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error belongs to a single record rather than the whole run.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            Self::Embedding { .. } | Self::Storage { .. } | Self::Persistence { .. } | Self::Io(_)
        )
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Embedding { .. } => Some("Please check your embedding model access and region"),
            Self::Storage { .. } => Some("Please check the bucket name, region and write permissions"),
            Self::Persistence { .. } => Some("Please check your database connection settings"),
            Self::Aborted { code: ErrorCode::WfNoMatches, .. } => {
                Some("Image file names must equal the image_name column without extension")
            }
            Self::Aborted { code: ErrorCode::WfStorageUnavailable, .. } => {
                Some("Please check the bucket name, region and write permissions")
            }
            _ => None,
        }
    }
}
