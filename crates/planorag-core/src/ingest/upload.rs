//! Destination folders and uploads to the object store.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{error, info};

use crate::error::{IngestError, IngestResult};
use crate::traits::ObjectStore;
use crate::types::{file_extension, UploadedFile};

/// Image formats recognised from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Recognise JPEG and PNG from their magic bytes.
pub fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageFormat::Png)
    } else {
        None
    }
}

/// Like [`sniff_image_format`], defaulting to JPEG.
pub fn detect_image_format(bytes: &[u8]) -> ImageFormat {
    sniff_image_format(bytes).unwrap_or(ImageFormat::Jpeg)
}

/// Content type for an object, from its extension, then its magic bytes.
pub fn content_type_for(filename: &str, bytes: &[u8]) -> &'static str {
    match file_extension(filename).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("csv") => "text/csv",
        _ => sniff_image_format(bytes)
            .map(|f| f.content_type())
            .unwrap_or("application/octet-stream"),
    }
}

/// Per-run folder path: `<prefix>_<YYYYmmdd_HHMMSS>/`.
pub fn create_destination_folder(prefix: &str, now: NaiveDateTime) -> String {
    let timestamp = now.format("%Y%m%d_%H%M%S");
    let prefix = prefix.trim_end_matches('_');
    if prefix.is_empty() {
        format!("{}/", timestamp)
    } else {
        format!("{}_{}/", prefix, timestamp)
    }
}

/// Object key of `filename` inside `folder`.
pub fn object_key(folder: &str, filename: &str) -> String {
    if folder.is_empty() {
        filename.to_string()
    } else if folder.ends_with('/') {
        format!("{}{}", folder, filename)
    } else {
        format!("{}/{}", folder, filename)
    }
}

/// Writes files into per-run folders of an [`ObjectStore`].
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    folder_prefix: String,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>, folder_prefix: impl Into<String>) -> Self {
        Self {
            store,
            folder_prefix: folder_prefix.into(),
        }
    }

    /// Folder for a run starting now (UTC, second granularity).
    pub fn create_destination_folder(&self) -> String {
        let folder = create_destination_folder(&self.folder_prefix, chrono::Utc::now().naive_utc());
        info!(folder = %folder, "Created destination folder path");
        folder
    }

    /// Rewind `file`, read it fully and store it as `folder/filename`.
    ///
    /// Returns the object's locator.
    pub async fn upload(
        &self,
        file: &mut dyn UploadedFile,
        folder: &str,
        filename: &str,
    ) -> IngestResult<String> {
        let source = file.name().to_string();
        let data = file
            .seek_to_start()
            .and_then(|_| file.read_to_end())
            .map_err(|e| IngestError::storage(format!("failed to read {}: {}", source, e)))?;
        self.upload_bytes(data, folder, filename).await
    }

    /// Store `data` as `folder/filename` and return the locator.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        folder: &str,
        filename: &str,
    ) -> IngestResult<String> {
        let key = object_key(folder, filename);
        let content_type = content_type_for(filename, &data);
        let size = data.len();

        if let Err(e) = self.store.put(&key, data, content_type).await {
            error!(key = %key, backend = self.store.backend_name(), "Upload failed: {}", e);
            return Err(e);
        }

        let url = self.store.object_url(&key);
        info!(key = %key, size, content_type, "Uploaded {}", filename);
        Ok(url)
    }
}
