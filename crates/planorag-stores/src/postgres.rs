//! PostgreSQL record store with a pgvector embedding column.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use planorag_core::error::{ErrorCode, IngestError, IngestResult};
use planorag_core::traits::{RecordStore, RecordStoreConfig};
use planorag_core::types::PersistedEntity;

use pgvector::Vector;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

/// Quote a table name for interpolation into SQL.
///
/// Accepts `table` or `schema.table` where each part is a plain identifier.
pub fn quote_identifier(name: &str) -> IngestResult<String> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| valid_part(p)) {
        return Err(IngestError::Configuration(format!(
            "Invalid table name: {}",
            name
        )));
    }

    Ok(parts
        .iter()
        .map(|p| format!("\"{}\"", p))
        .collect::<Vec<_>>()
        .join("."))
}

fn db_error(message: String, e: sqlx::Error) -> IngestError {
    IngestError::Persistence {
        message,
        code: ErrorCode::DbOperationFailed,
        source: Some(Box::new(e)),
    }
}

/// PostgreSQL record store.
pub struct PgRecordStore {
    pool: PgPool,
    table: String,
    quoted_table: String,
    dimension: usize,
}

impl PgRecordStore {
    /// Connect to PostgreSQL.
    ///
    /// `config.url` takes precedence over the discrete connection fields.
    pub async fn new(config: &RecordStoreConfig, dimension: usize) -> IngestResult<Self> {
        let options = PgPoolOptions::new().max_connections(config.max_connections);

        let pool = match &config.url {
            Some(url) => options.connect(url.expose_secret()).await,
            None => {
                let mut connect = PgConnectOptions::new()
                    .host(&config.host)
                    .port(config.port)
                    .database(&config.database)
                    .username(&config.user);
                if let Some(password) = &config.password {
                    connect = connect.password(password.expose_secret());
                }
                options.connect_with(connect).await
            }
        }
        .map_err(|e| IngestError::Persistence {
            message: format!("Failed to connect to PostgreSQL: {}", e),
            code: ErrorCode::DbConnectionFailed,
            source: Some(Box::new(e)),
        })?;

        info!(
            host = %config.host,
            database = %config.database,
            table = %config.table,
            "Connected to PostgreSQL"
        );
        Self::from_pool(pool, &config.table, dimension)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, table: &str, dimension: usize) -> IngestResult<Self> {
        Ok(Self {
            quoted_table: quote_identifier(table)?,
            table: table.to_string(),
            pool,
            dimension,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the pgvector extension, the table and its indexes if missing.
    pub async fn ensure_schema(&self) -> IngestResult<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(format!("Failed to enable pgvector: {}", e), e))?;

        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                image_name TEXT NOT NULL UNIQUE,
                embedding vector({}) NOT NULL,
                image_base64 TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                s3_url TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
            self.quoted_table, self.dimension
        );
        sqlx::query(&create_table)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(format!("Failed to create table: {}", e), e))?;

        let index_name = format!("{}_embedding_idx", self.table.replace('.', "_"));
        let create_index = format!(
            r#"
            CREATE INDEX IF NOT EXISTS "{}"
            ON {} USING hnsw (embedding vector_cosine_ops)
            "#,
            index_name, self.quoted_table
        );
        sqlx::query(&create_index)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(format!("Failed to create index: {}", e), e))?;

        info!(table = %self.table, dimension = self.dimension, "Schema ready");
        Ok(())
    }

    /// Number of stored records.
    pub async fn count(&self) -> IngestResult<i64> {
        let query = format!("SELECT COUNT(*) FROM {}", self.quoted_table);
        sqlx::query_scalar::<_, i64>(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(e.to_string(), e))
    }

    /// Delete one record. Returns whether a row was removed.
    pub async fn delete(&self, image_name: &str) -> IngestResult<bool> {
        let query = format!("DELETE FROM {} WHERE image_name = $1", self.quoted_table);
        let result = sqlx::query(&query)
            .bind(image_name)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e.to_string(), e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn exists(&self, image_name: &str) -> IngestResult<bool> {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE image_name = $1",
            self.quoted_table
        );
        let count: i64 = sqlx::query_scalar(&query)
            .bind(image_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(e.to_string(), e))?;
        Ok(count > 0)
    }

    async fn insert(&self, entity: &PersistedEntity) -> IngestResult<()> {
        if entity.embedding.len() != self.dimension {
            return Err(IngestError::Persistence {
                message: format!(
                    "Embedding has {} dimensions, table expects {}",
                    entity.embedding.len(),
                    self.dimension
                ),
                code: ErrorCode::EmbDimensionMismatch,
                source: None,
            });
        }

        let query = format!(
            r#"
            INSERT INTO {} (image_name, embedding, image_base64, description, s3_url)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            self.quoted_table
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error(e.to_string(), e))?;

        let inserted = sqlx::query(&query)
            .bind(&entity.image_name)
            .bind(Vector::from(entity.embedding.clone()))
            .bind(&entity.image_base64)
            .bind(&entity.description)
            .bind(&entity.s3_url)
            .execute(&mut *tx)
            .await;

        match inserted {
            Ok(_) => {
                tx.commit().await.map_err(|e| db_error(e.to_string(), e))?;
                debug!(image_name = %entity.image_name, "Inserted record");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(image_name = %entity.image_name, error = %rollback, "Rollback failed");
                }
                Err(db_error(e.to_string(), e))
            }
        }
    }
}
