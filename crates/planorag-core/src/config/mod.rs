//! Configuration system for planorag.
//!
//! Settings are process-wide and loaded once: from a TOML/JSON/YAML file,
//! from `PLANORAG_*` environment variables, or through [`IngestConfig::builder`].

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};
use crate::traits::{
    EmbedderConfig, EmbedderProvider, ObjectStoreConfig, ObjectStoreProvider, RecordStoreConfig,
};

/// Input file rules applied by the validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRules {
    /// Accepted image extensions, lower case, without dot.
    pub allowed_extensions: Vec<String>,
    /// Size ceiling for the table and for each image.
    pub max_file_size_mb: u64,
    /// Text encoding of the metadata table.
    pub csv_encoding: String,
    /// Header of the join-key column.
    pub key_column: String,
    /// Header of the description column.
    pub description_column: String,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            max_file_size_mb: 200,
            csv_encoding: "utf-8".to_string(),
            key_column: "image_name".to_string(),
            description_column: "value".to_string(),
        }
    }
}

impl FileRules {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Case-insensitive extension check.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

/// Embedder provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmbedderProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: EmbedderProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: EmbedderConfig,
}

/// Main ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IngestConfig {
    /// Object storage for images and manifests.
    pub storage: ObjectStoreConfig,
    /// Relational store for embeddings.
    pub database: RecordStoreConfig,
    /// Embedding model.
    pub embedder: EmbedderProviderConfig,
    /// Input validation rules.
    pub files: FileRules,
}

impl IngestConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> IngestResult<Self> {
        let config = Self::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an optional file, then apply environment overrides on top.
    pub fn load(path: Option<&std::path::Path>) -> IngestResult<Self> {
        let mut config = match path {
            Some(path) => Self::parse_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: impl AsRef<std::path::Path>) -> IngestResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| IngestError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| IngestError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| IngestError::Configuration(e.to_string()))?,
            _ => {
                return Err(IngestError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };

        Ok(config)
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> IngestResult<Self> {
        Self::load(None)
    }

    /// Apply `PLANORAG_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> IngestResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Object storage
        if let Some(provider) = lookup("PLANORAG_STORAGE_PROVIDER") {
            self.storage.provider = match provider.to_lowercase().as_str() {
                "s3" => ObjectStoreProvider::S3,
                "local" => ObjectStoreProvider::Local,
                other => {
                    return Err(IngestError::Configuration(format!(
                        "Unknown storage provider: {}",
                        other
                    )))
                }
            };
        }
        if let Some(bucket) = lookup("PLANORAG_S3_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Some(region) = lookup("PLANORAG_S3_REGION") {
            self.storage.region = region;
        }
        if let Some(prefix) = lookup("PLANORAG_S3_FOLDER_PREFIX") {
            self.storage.folder_prefix = prefix;
        }
        if let Some(endpoint) = lookup("PLANORAG_S3_ENDPOINT_URL") {
            self.storage.endpoint_url = Some(endpoint);
        }
        if let Some(root) = lookup("PLANORAG_LOCAL_STORE_DIR") {
            self.storage.local_root = Some(root.into());
        }

        // Database
        if let Some(url) = lookup("PLANORAG_DATABASE_URL") {
            self.database.url = Some(SecretString::from(url));
        }
        if let Some(host) = lookup("PLANORAG_DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("PLANORAG_DB_PORT") {
            self.database.port = parse_var("PLANORAG_DB_PORT", &port)?;
        }
        if let Some(name) = lookup("PLANORAG_DB_NAME") {
            self.database.database = name;
        }
        if let Some(user) = lookup("PLANORAG_DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = lookup("PLANORAG_DB_PASSWORD") {
            self.database.password = Some(SecretString::from(password));
        }
        if let Some(table) = lookup("PLANORAG_DB_TABLE") {
            self.database.table = table;
        }

        // Embedder
        if let Some(model) = lookup("PLANORAG_EMBEDDING_MODEL") {
            self.embedder.config.model = model;
        }
        if let Some(dims) = lookup("PLANORAG_EMBEDDING_DIMENSION") {
            self.embedder.config.embedding_dims = parse_var("PLANORAG_EMBEDDING_DIMENSION", &dims)?;
        }
        if let Some(region) = lookup("PLANORAG_BEDROCK_REGION") {
            self.embedder.config.region = region;
        }

        // Files
        if let Some(max) = lookup("PLANORAG_MAX_FILE_SIZE_MB") {
            self.files.max_file_size_mb = parse_var("PLANORAG_MAX_FILE_SIZE_MB", &max)?;
        }
        if let Some(encoding) = lookup("PLANORAG_CSV_ENCODING") {
            self.files.csv_encoding = encoding;
        }

        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> IngestResult<()> {
        let encoding = self.files.csv_encoding.to_ascii_lowercase().replace('_', "-");
        if encoding != "utf-8" && encoding != "utf8" {
            return Err(IngestError::Configuration(format!(
                "Unsupported CSV encoding '{}'; only utf-8 is supported",
                self.files.csv_encoding
            )));
        }
        if self.files.allowed_extensions.is_empty() {
            return Err(IngestError::Configuration(
                "At least one allowed image extension is required".to_string(),
            ));
        }
        if self.files.max_file_size_mb == 0 {
            return Err(IngestError::Configuration(
                "max_file_size_mb must be greater than zero".to_string(),
            ));
        }
        if self.embedder.config.embedding_dims == 0 {
            return Err(IngestError::Configuration(
                "embedding_dims must be greater than zero".to_string(),
            ));
        }
        match self.storage.provider {
            ObjectStoreProvider::S3 if self.storage.bucket.trim().is_empty() => {
                return Err(IngestError::Configuration(
                    "S3 bucket name is required".to_string(),
                ))
            }
            ObjectStoreProvider::Local if self.storage.local_root.is_none() => {
                return Err(IngestError::Configuration(
                    "local_root is required for the local storage provider".to_string(),
                ))
            }
            _ => {}
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> IngestResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| IngestError::Configuration(format!("{} has an invalid value: {}", key, value)))
}

/// Builder for IngestConfig.
#[derive(Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    /// Set object store configuration.
    pub fn storage(mut self, config: ObjectStoreConfig) -> Self {
        self.config.storage = config;
        self
    }

    /// Set record store configuration.
    pub fn database(mut self, config: RecordStoreConfig) -> Self {
        self.config.database = config;
        self
    }

    /// Set embedder configuration.
    pub fn embedder(mut self, config: EmbedderProviderConfig) -> Self {
        self.config.embedder = config;
        self
    }

    /// Set input file rules.
    pub fn files(mut self, rules: FileRules) -> Self {
        self.config.files = rules;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> IngestResult<IngestConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
