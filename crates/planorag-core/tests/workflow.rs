//! Integration tests for the ingestion workflow.
//!
//! Runs the processor end to end against in-memory collaborators.

use async_trait::async_trait;
use planorag_core::{
    ImageBlob, ImageEmbedder, ImageEmbedding, InMemoryFile, IngestConfig, IngestError,
    IngestProcessor, IngestResult, ObjectStore, PersistedEntity, RecordStore,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Embeds every image as a constant vector; images whose bytes are `b"bad"` fail.
#[derive(Default)]
struct MockEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl ImageEmbedder for MockEmbedder {
    async fn embed_image(&self, image: &[u8]) -> IngestResult<ImageEmbedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if image == b"bad" {
            return Err(IngestError::embedding("model rejected image"));
        }
        Ok(ImageEmbedding {
            vector: vec![0.25; 8],
            image_base64: "aW1n".to_string(),
        })
    }

    fn dimension(&self) -> usize {
        8
    }

    fn model_name(&self) -> String {
        "mock".to_string()
    }
}

#[derive(Default)]
struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    unavailable: bool,
    rejects_images: bool,
}

impl MemoryObjectStore {
    fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    /// Accepts the manifest but refuses every image upload.
    fn rejecting_images() -> Self {
        Self {
            rejects_images: true,
            ..Default::default()
        }
    }

    fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> IngestResult<()> {
        if self.unavailable {
            return Err(IngestError::storage("bucket does not exist"));
        }
        if self.rejects_images && !key.ends_with(".csv") {
            return Err(IngestError::storage("access denied"));
        }
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://test-bucket.s3.ap-southeast-1.amazonaws.com/{}", key)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Default)]
struct MemoryRecordStore {
    rows: Mutex<HashMap<String, PersistedEntity>>,
    exists_calls: AtomicUsize,
}

impl MemoryRecordStore {
    fn get(&self, image_name: &str) -> Option<PersistedEntity> {
        self.rows.lock().unwrap().get(image_name).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn exists(&self, image_name: &str) -> IngestResult<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().unwrap().contains_key(image_name))
    }

    async fn insert(&self, entity: &PersistedEntity) -> IngestResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&entity.image_name) {
            return Err(IngestError::persistence("duplicate key value"));
        }
        rows.insert(entity.image_name.clone(), entity.clone());
        Ok(())
    }
}

struct Harness {
    embedder: Arc<MockEmbedder>,
    objects: Arc<MemoryObjectStore>,
    records: Arc<MemoryRecordStore>,
    processor: IngestProcessor,
}

fn harness_with(objects: MemoryObjectStore) -> Harness {
    let embedder = Arc::new(MockEmbedder::default());
    let objects = Arc::new(objects);
    let records = Arc::new(MemoryRecordStore::default());

    let mut config = IngestConfig::default();
    config.storage.bucket = "test-bucket".to_string();

    let processor = IngestProcessor::new(
        embedder.clone(),
        objects.clone(),
        records.clone(),
        &config,
    );
    Harness {
        embedder,
        objects,
        records,
        processor,
    }
}

fn harness() -> Harness {
    harness_with(MemoryObjectStore::default())
}

fn table(text: &str) -> InMemoryFile {
    InMemoryFile::new("descriptions.csv", text.as_bytes().to_vec())
}

fn images(files: &[(&str, &[u8])]) -> Vec<ImageBlob> {
    files
        .iter()
        .map(|(name, data)| InMemoryFile::boxed(*name, data.to_vec()))
        .collect()
}

#[tokio::test]
async fn test_full_success() {
    let h = harness();
    let mut csv = table("image_name,value\n1,red bottle\n");

    let result = h
        .processor
        .run_full_workflow(&mut csv, images(&[("1.jpg", b"jpeg")]))
        .await;

    assert_eq!(result.total_records, 1);
    assert_eq!(result.successful, 1);
    assert_eq!(result.skipped, 0);
    assert_eq!(result.failed, 0);
    assert_eq!(result.success_items, vec!["1"]);
    assert!(result.errors.is_empty());
    assert!(result.is_conserved());
    assert!(!result.is_total_failure());

    assert!(result.s3_folder.starts_with("RAG_Update_"));
    assert!(result.s3_folder.ends_with('/'));
    assert_eq!(
        result.manifest_url,
        format!(
            "https://test-bucket.s3.ap-southeast-1.amazonaws.com/{}descriptions.csv",
            result.s3_folder
        )
    );

    let keys = h.objects.keys();
    assert_eq!(
        keys,
        vec![
            format!("{}1.jpg", result.s3_folder),
            format!("{}descriptions.csv", result.s3_folder),
        ]
    );

    let row = h.records.get("1").unwrap();
    assert_eq!(row.description, "red bottle");
    assert_eq!(row.embedding.len(), 8);
    assert_eq!(
        row.s3_url,
        format!(
            "https://test-bucket.s3.ap-southeast-1.amazonaws.com/{}1.jpg",
            result.s3_folder
        )
    );
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let h = harness();
    let csv_text = "image_name,value\n1,red bottle\n2,blue can\n";
    let files: &[(&str, &[u8])] = &[("1.jpg", b"one"), ("2.png", b"two")];

    let first = h
        .processor
        .run_full_workflow(&mut table(csv_text), images(files))
        .await;
    assert_eq!(first.successful, 2);

    let second = h
        .processor
        .run_full_workflow(&mut table(csv_text), images(files))
        .await;
    assert_eq!(second.total_records, 2);
    assert_eq!(second.successful, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.skipped_items, vec!["1", "2"]);
    assert!(second.is_conserved());

    // Skipped records never reach the embedder.
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_partial_failure() {
    let h = harness();
    let mut csv = table("image_name,value\n1,red bottle\n2,blue can\n");

    let result = h
        .processor
        .run_full_workflow(&mut csv, images(&[("1.jpg", b"good"), ("2.jpg", b"bad")]))
        .await;

    assert_eq!(result.total_records, 2);
    assert_eq!(result.successful, 1);
    assert_eq!(result.failed, 1);
    assert_eq!(result.errors, vec!["2: model rejected image"]);
    assert!(result.has_failures());
    assert!(result.is_conserved());
    assert!(h.records.get("2").is_none());
}

#[tokio::test]
async fn test_zero_matches_aborts_before_storage() {
    let h = harness();
    let mut csv = table("image_name,value\nX,shelf\n");

    let result = h
        .processor
        .run_full_workflow(&mut csv, images(&[("Y.jpg", b"y")]))
        .await;

    assert!(result.is_total_failure());
    assert_eq!(result.errors.len(), 1);
    let diagnostic = &result.errors[0];
    assert!(diagnostic.starts_with("Matching Error: No matching records found"));
    assert!(diagnostic.contains("missing image for record: X"));
    assert!(diagnostic.contains("missing record for image: Y.jpg"));

    assert!(result.s3_folder.is_empty());
    assert!(h.objects.keys().is_empty());
    assert_eq!(h.records.exists_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unmatched_items_reported_on_success() {
    let h = harness();
    let mut csv = table("image_name,value\nA,a\nB,b\nC,c\n");

    let result = h
        .processor
        .run_full_workflow(
            &mut csv,
            images(&[("A.jpg", b"a"), ("B.jpg", b"b"), ("D.jpg", b"d")]),
        )
        .await;

    assert_eq!(result.successful, 2);
    assert_eq!(result.failed, 0);
    assert_eq!(
        result.errors,
        vec!["missing image for record: C", "missing record for image: D.jpg"]
    );
}

#[tokio::test]
async fn test_all_gif_batch_is_rejected() {
    let h = harness();
    let mut csv = table("image_name,value\n1,a\n");

    let result = h
        .processor
        .run_full_workflow(&mut csv, images(&[("1.gif", b"GIF89a")]))
        .await;

    assert!(result.is_total_failure());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Validation Error: Images Error: Image validation errors:"));
    assert!(h.objects.keys().is_empty());
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_storage_prep_failure_aborts() {
    let h = harness_with(MemoryObjectStore::unavailable());
    let mut csv = table("image_name,value\n1,a\n");

    let result = h
        .processor
        .run_full_workflow(&mut csv, images(&[("1.jpg", b"x")]))
        .await;

    assert!(result.is_total_failure());
    assert_eq!(
        result.errors,
        vec!["S3 Error: S3 setup failed: bucket does not exist"]
    );
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.records.exists_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_image_upload_failure_is_per_record() {
    let h = harness_with(MemoryObjectStore::rejecting_images());
    let mut csv = table("image_name,value\n1,red bottle\n");

    let result = h
        .processor
        .run_full_workflow(&mut csv, images(&[("1.jpg", b"jpeg")]))
        .await;

    assert_eq!(result.total_records, 1);
    assert_eq!(result.successful, 0);
    assert_eq!(result.failed, 1);
    assert_eq!(result.errors, vec!["1: S3 upload failed: access denied"]);
    assert!(result.is_conserved());
    assert!(!result.is_total_failure());
    assert!(h.records.get("1").is_none());

    // The manifest still landed before processing started.
    assert_eq!(
        h.objects.keys(),
        vec![format!("{}descriptions.csv", result.s3_folder)]
    );
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_duplicate_rows_insert_once() {
    let h = harness();
    let mut csv = table("image_name,value\n1,first\n1,second\n");

    let result = h
        .processor
        .run_full_workflow(&mut csv, images(&[("1.jpg", b"x")]))
        .await;

    assert_eq!(result.total_records, 2);
    assert_eq!(result.successful, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(h.records.get("1").unwrap().description, "first");
}

#[tokio::test]
async fn test_rejected_images_become_warnings() {
    let h = harness();
    let mut csv = table("image_name,value\n1,a\n");

    let result = h
        .processor
        .run_full_workflow(&mut csv, images(&[("1.jpg", b"x"), ("2.bmp", b"y")]))
        .await;

    assert_eq!(result.successful, 1);
    assert_eq!(
        result.errors,
        vec!["Image validation errors:\n2.bmp: Unsupported format. Use: png, jpg, jpeg"]
    );
}
