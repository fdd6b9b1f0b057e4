//! The ingestion workflow.
//!
//! Stages run in order and any gate failure ends the run early:
//!
//! 1. Validating: the table and the image batch
//! 2. Matching: rows to images by key
//! 3. PreparingStorage: destination folder and manifest upload
//! 4. Processing: each matched record, one at a time
//!
//! Per-record failures are counted and never end the run.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::config::{FileRules, IngestConfig};
use crate::error::{ErrorCode, IngestError};
use crate::ingest::matcher::match_records;
use crate::ingest::upload::Uploader;
use crate::ingest::validate::{validate_images, validate_table};
use crate::traits::{ImageEmbedder, ObjectStore, RecordStore};
use crate::types::{
    ImageBlob, MatchedRecord, PersistedEntity, UploadedFile, WorkflowResult, WorkflowStage,
};

/// Outcome of processing one matched record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Embedded, uploaded and inserted.
    Inserted,
    /// Already present in the record store; nothing was done.
    Skipped,
    /// Failed at one step; carries the reason.
    Failed(String),
}

/// Runs the ingestion workflow against injected collaborators.
///
/// Holds no per-run state: every call to [`IngestProcessor::run_full_workflow`]
/// builds a fresh [`WorkflowResult`].
pub struct IngestProcessor {
    embedder: Arc<dyn ImageEmbedder>,
    records: Arc<dyn RecordStore>,
    uploader: Uploader,
    rules: FileRules,
    manifest_filename: String,
}

impl IngestProcessor {
    /// Create a processor from collaborators and configuration.
    pub fn new(
        embedder: Arc<dyn ImageEmbedder>,
        object_store: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        config: &IngestConfig,
    ) -> Self {
        Self {
            embedder,
            records,
            uploader: Uploader::new(object_store, config.storage.folder_prefix.clone()),
            rules: config.files.clone(),
            manifest_filename: config.storage.manifest_filename.clone(),
        }
    }

    /// Run the complete workflow for one table and one image batch.
    pub async fn run_full_workflow(
        &self,
        table_file: &mut dyn UploadedFile,
        images: Vec<ImageBlob>,
    ) -> WorkflowResult {
        info!("Starting RAG data ingestion workflow");
        let mut result = WorkflowResult::new();

        // Validating
        let rows = match validate_table(table_file, &self.rules) {
            Ok(rows) => rows,
            Err(e) => {
                log_hint(&e);
                return abort(
                    WorkflowStage::Validating,
                    IngestError::aborted(format!("CSV Error: {}", e.message()), e.code()),
                    &[],
                )
            }
        };
        let validation = match validate_images(images, &self.rules) {
            Ok(validation) => validation,
            Err(e) => {
                log_hint(&e);
                return abort(
                    WorkflowStage::Validating,
                    IngestError::aborted(format!("Images Error: {}", e.message()), e.code()),
                    &[],
                )
            }
        };
        if let Some(warning) = validation.warning() {
            result.errors.push(warning);
        }
        let mut images = validation.accepted;
        info!("Input validation completed successfully");

        // Matching
        let outcome = match_records(&rows, &images);
        result.errors.extend(outcome.warnings().cloned());
        if outcome.matched.is_empty() {
            return abort(
                WorkflowStage::Matching,
                IngestError::aborted(
                    "No matching records found between CSV and images",
                    ErrorCode::WfNoMatches,
                ),
                &result.errors,
            );
        }
        info!(
            matched = outcome.matched.len(),
            "Matching completed: records ready for processing"
        );

        // PreparingStorage
        let folder = self.uploader.create_destination_folder();
        match self
            .uploader
            .upload(table_file, &folder, &self.manifest_filename)
            .await
        {
            Ok(url) => {
                result.s3_folder = folder;
                result.manifest_url = url;
                info!(folder = %result.s3_folder, "Storage setup completed");
            }
            Err(e) => {
                return abort(
                    WorkflowStage::PreparingStorage,
                    IngestError::aborted(
                        format!("S3 setup failed: {}", e.message()),
                        ErrorCode::WfStorageUnavailable,
                    ),
                    &result.errors,
                )
            }
        }

        // Processing
        self.process_records(&outcome.matched, &mut images, &mut result)
            .await;

        log_summary(&result);
        result
    }

    async fn process_records(
        &self,
        matched: &[MatchedRecord],
        images: &mut [ImageBlob],
        result: &mut WorkflowResult,
    ) {
        let started = Instant::now();
        let total = matched.len();
        result.total_records = total;
        info!(total, "Starting processing of records");

        for (i, record) in matched.iter().enumerate() {
            let position = i + 1;
            info!(image_name = %record.image_name, "Processing record {}/{}", position, total);

            let image = images[record.image_index].as_mut();
            match self.process_record(record, image, &result.s3_folder).await {
                RecordOutcome::Inserted => {
                    result.record_success(&record.image_name);
                    info!(image_name = %record.image_name, "[{}/{}] Success", position, total);
                }
                RecordOutcome::Skipped => {
                    result.record_skip(&record.image_name);
                    info!(
                        image_name = %record.image_name,
                        "[{}/{}] Skipped: already exists in database", position, total
                    );
                }
                RecordOutcome::Failed(reason) => {
                    error!(
                        image_name = %record.image_name,
                        "[{}/{}] Failed: {}", position, total, reason
                    );
                    result.record_failure(&record.image_name, &reason);
                }
            }
        }

        result.processing_time = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
    }

    /// Process one record: existence check, embed, upload, insert.
    ///
    /// The existence check runs first so skipped records never reach the
    /// embedder or the object store.
    pub async fn process_record(
        &self,
        record: &MatchedRecord,
        image: &mut dyn UploadedFile,
        folder: &str,
    ) -> RecordOutcome {
        let image_name = record.image_name.as_str();

        match self.records.exists(image_name).await {
            Ok(true) => return RecordOutcome::Skipped,
            Ok(false) => {}
            Err(e) => return failed("Existence check failed", &e),
        }

        let bytes = match image.seek_to_start().and_then(|_| image.read_to_end()) {
            Ok(bytes) => bytes,
            Err(e) => return RecordOutcome::Failed(format!("Failed to read image: {}", e)),
        };

        let embedding = match self.embedder.embed_image(&bytes).await {
            Ok(embedding) => embedding,
            Err(e) => return RecordOutcome::Failed(e.message()),
        };
        drop(bytes);

        let extension = image.extension().unwrap_or_else(|| "jpg".to_string());
        let filename = format!("{}.{}", image_name, extension);
        let s3_url = match self.uploader.upload(image, folder, &filename).await {
            Ok(url) => url,
            Err(e) => return failed("S3 upload failed", &e),
        };

        let entity = PersistedEntity {
            image_name: image_name.to_string(),
            embedding: embedding.vector,
            image_base64: embedding.image_base64,
            description: record.description.clone(),
            s3_url,
        };

        match self.records.insert(&entity).await {
            Ok(()) => RecordOutcome::Inserted,
            Err(e) => failed("Database insertion failed", &e),
        }
    }
}

fn failed(step: &str, err: &IngestError) -> RecordOutcome {
    RecordOutcome::Failed(format!("{}: {}", step, err.message()))
}

/// All-zero result carrying one diagnostic.
///
/// Warnings gathered before the gate are folded into the diagnostic so the
/// result still holds a single entry.
fn abort(stage: WorkflowStage, err: IngestError, warnings: &[String]) -> WorkflowResult {
    let mut diagnostic = format!("{}: {}", stage.abort_prefix(), err.message());
    if !warnings.is_empty() {
        diagnostic.push_str(&format!(" ({})", warnings.join("; ")));
    }
    warn!(stage = %stage, code = err.code().as_str(), "Workflow aborted: {}", diagnostic);
    log_hint(&err);

    WorkflowResult {
        errors: vec![diagnostic],
        ..WorkflowResult::default()
    }
}

fn log_hint(err: &IngestError) {
    if let Some(hint) = err.suggestion() {
        info!(code = err.code().as_str(), "Hint: {}", hint);
    }
}

fn log_summary(result: &WorkflowResult) {
    info!("RAG data ingestion workflow completed");
    info!(
        total = result.total_records,
        successful = result.successful,
        skipped = result.skipped,
        failed = result.failed,
        processing_time = result.processing_time,
        folder = %result.s3_folder,
        "Results summary"
    );
}
