//! Workflow outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of one ingestion run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Validating,
    Matching,
    PreparingStorage,
    Processing,
    Done,
}

impl WorkflowStage {
    /// Prefix used for the abort diagnostic raised in this stage.
    pub fn abort_prefix(&self) -> &'static str {
        match self {
            WorkflowStage::Validating => "Validation Error",
            WorkflowStage::Matching => "Matching Error",
            WorkflowStage::PreparingStorage => "S3 Error",
            WorkflowStage::Processing => "Processing Error",
            WorkflowStage::Done => "Workflow Error",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Validating => "validating",
            WorkflowStage::Matching => "matching",
            WorkflowStage::PreparingStorage => "preparing_storage",
            WorkflowStage::Processing => "processing",
            WorkflowStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Aggregate result of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Matched records attempted.
    pub total_records: usize,
    /// Records embedded, uploaded and inserted.
    pub successful: usize,
    /// Records already present in the record store.
    pub skipped: usize,
    /// Records that failed in embedding, upload or insert.
    pub failed: usize,
    /// Wall-clock seconds spent processing records, two decimals.
    pub processing_time: f64,
    /// Warnings and failures, in the order they occurred.
    pub errors: Vec<String>,
    pub success_items: Vec<String>,
    pub skipped_items: Vec<String>,
    /// Destination folder of this run.
    pub s3_folder: String,
    /// Locator of the uploaded metadata table.
    pub manifest_url: String,
}

impl WorkflowResult {
    /// Create new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every attempted record is accounted for exactly once.
    pub fn is_conserved(&self) -> bool {
        self.successful + self.skipped + self.failed == self.total_records
    }

    /// Nothing was ingested or skipped because the run never reached processing.
    pub fn is_total_failure(&self) -> bool {
        self.successful == 0 && self.skipped == 0 && self.total_records == 0
    }

    /// At least one record failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub(crate) fn record_success(&mut self, image_name: &str) {
        self.successful += 1;
        self.success_items.push(image_name.to_string());
    }

    pub(crate) fn record_skip(&mut self, image_name: &str) {
        self.skipped += 1;
        self.skipped_items.push(image_name.to_string());
    }

    pub(crate) fn record_failure(&mut self, image_name: &str, reason: &str) {
        self.failed += 1;
        self.errors.push(format!("{}: {}", image_name, reason));
    }
}
