//! planorag - ingest product images and their descriptions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use planorag_core::{
    ImageBlob, ImageEmbedder, IngestConfig, IngestError, IngestProcessor, LocalFile, ObjectStore,
    ObjectStoreProvider, UploadedFile,
};
use planorag_embeddings::EmbedderFactory;
use planorag_stores::{ObjectStoreFactory, PgRecordStore, RecordStoreFactory, S3ObjectStore};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "planorag")]
#[command(about = "Ingest product images and descriptions for retrieval", long_about = None)]
struct Cli {
    /// Config file (.toml, .json or .yaml); PLANORAG_* variables override it
    #[arg(short, long, global = true, env = "PLANORAG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, match, embed, upload and persist one batch
    Ingest {
        /// Metadata table with image_name and description columns
        #[arg(long)]
        csv: PathBuf,

        /// Image files or directories holding them
        #[arg(long, num_args = 1.., required = true)]
        images: Vec<PathBuf>,
    },

    /// Create the pgvector extension and the records table
    InitSchema,

    /// Print a time-limited link for an uploaded object
    Presign {
        /// Object URL as stored in the records table
        url: String,

        /// Link lifetime in seconds
        #[arg(short, long, default_value_t = 3600)]
        expires: u64,
    },
}

/// Expand directories (one level, sorted by name) into image handles.
fn collect_images(paths: &[PathBuf]) -> anyhow::Result<Vec<ImageBlob>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("reading {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }

    files
        .iter()
        .map(|p| {
            LocalFile::open(p)
                .map(|f| Box::new(f) as ImageBlob)
                .with_context(|| format!("opening {}", p.display()))
        })
        .collect()
}

async fn ingest(config: &IngestConfig, csv: &Path, images: &[PathBuf]) -> anyhow::Result<bool> {
    let embedder = EmbedderFactory::from_config(&config.embedder).await?;
    let object_store = ObjectStoreFactory::create(&config.storage).await?;
    let record_store = RecordStoreFactory::create(&config.database, embedder.dimension()).await?;
    info!(
        model = %embedder.model_name(),
        storage = object_store.backend_name(),
        "Collaborators ready"
    );

    let processor = IngestProcessor::new(embedder, object_store, record_store, config);

    let mut table = LocalFile::open(csv).with_context(|| format!("opening {}", csv.display()))?;
    let images = collect_images(images)?;

    let result = processor.run_full_workflow(&mut table, images).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(!result.is_total_failure())
}

async fn init_schema(config: &IngestConfig) -> anyhow::Result<()> {
    let store = PgRecordStore::new(&config.database, config.embedder.config.embedding_dims).await?;
    store.ensure_schema().await?;
    info!(table = %store.table(), "Schema initialized");
    Ok(())
}

async fn presign(config: &IngestConfig, url: &str, expires: u64) -> anyhow::Result<()> {
    if config.storage.provider != ObjectStoreProvider::S3 {
        warn!("Presigning only applies to the S3 store; printing the URL unchanged");
        println!("{}", url);
        return Ok(());
    }
    let store = S3ObjectStore::new(&config.storage).await?;
    println!("{}", store.presign_url(url, Duration::from_secs(expires)).await);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("planorag=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = IngestConfig::load(cli.config.as_deref())?;

    let outcome = match cli.command {
        Commands::Ingest { csv, images } => match ingest(&config, &csv, &images).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(anyhow!("ingestion aborted before any record was processed")),
            Err(e) => Err(e),
        },
        Commands::InitSchema => init_schema(&config).await,
        Commands::Presign { url, expires } => presign(&config, &url, expires).await,
    };

    if let Some(hint) = outcome.as_ref().err().and_then(hint_for) {
        warn!("{}", hint);
    }
    outcome
}

/// Remediation hint of the first [`IngestError`] in an error chain.
fn hint_for(err: &anyhow::Error) -> Option<&str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<IngestError>())
        .and_then(|e| e.suggestion())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_images_expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2.png"), b"png").unwrap();
        std::fs::write(dir.path().join("1.jpg"), b"jpeg").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let extra = dir.path().join("nested").join("3.jpg");
        std::fs::write(&extra, b"jpeg").unwrap();

        let images = collect_images(&[dir.path().to_path_buf(), extra]).unwrap();
        let names: Vec<&str> = images.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["1.jpg", "2.png", "3.jpg"]);
        assert_eq!(images[0].size(), 4);
    }

    #[test]
    fn test_collect_images_missing_file() {
        let err = collect_images(&[PathBuf::from("/nonexistent/1.jpg")]).err().unwrap();
        assert!(err.to_string().contains("/nonexistent/1.jpg"));
    }

    #[test]
    fn test_hint_for_ingest_errors() {
        let err = anyhow::Error::new(IngestError::storage("denied")).context("creating store");
        assert_eq!(
            hint_for(&err),
            Some("Please check the bucket name, region and write permissions")
        );
        assert_eq!(hint_for(&anyhow!("plain failure")), None);
    }

    #[test]
    fn test_cli_parses_ingest() {
        let cli = Cli::try_parse_from([
            "planorag",
            "ingest",
            "--csv",
            "descriptions.csv",
            "--images",
            "a.jpg",
            "b.png",
        ])
        .unwrap();
        match cli.command {
            Commands::Ingest { csv, images } => {
                assert_eq!(csv, PathBuf::from("descriptions.csv"));
                assert_eq!(images.len(), 2);
            }
            _ => panic!("expected ingest"),
        }
    }
}
