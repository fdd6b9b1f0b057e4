//! Input validation for the metadata table and the image batch.
//!
//! Both checks run before any embedding or upload work. The table is either
//! fully parsed or rejected; the image batch is partitioned into accepted and
//! rejected files, and every rejection reason is kept.

use tracing::{info, warn};

use crate::config::FileRules;
use crate::error::{ErrorCode, IngestError, IngestResult};
use crate::types::{ImageBlob, TabularRecord, UploadedFile};

/// Outcome of image validation when at least one file was accepted.
pub struct ImageValidation {
    /// Files that passed, in upload order.
    pub accepted: Vec<ImageBlob>,
    /// One line per rejected file.
    pub rejected: Vec<String>,
}

impl ImageValidation {
    /// Combined rejection message, if any file was rejected.
    pub fn warning(&self) -> Option<String> {
        if self.rejected.is_empty() {
            None
        } else {
            Some(rejection_message(&self.rejected))
        }
    }
}

impl std::fmt::Debug for ImageValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.accepted.iter().map(|img| img.name()).collect();
        f.debug_struct("ImageValidation")
            .field("accepted", &names)
            .field("rejected", &self.rejected)
            .finish()
    }
}

fn rejection_message(rejected: &[String]) -> String {
    format!("Image validation errors:\n{}", rejected.join("\n"))
}

/// Parse and validate the metadata table.
///
/// The cursor is rewound before reading. Fails when the file is too large, is
/// not valid UTF-8, cannot be parsed, lacks either required column, contains a
/// row with an empty key, or has no data rows.
pub fn validate_table(
    file: &mut dyn UploadedFile,
    rules: &FileRules,
) -> IngestResult<Vec<TabularRecord>> {
    if file.size() > rules.max_file_size_bytes() {
        return Err(IngestError::validation_with_code(
            format!("CSV file too large. Max size: {}MB", rules.max_file_size_mb),
            ErrorCode::ValTooLarge,
        ));
    }

    file.seek_to_start()
        .and_then(|_| file.read_to_end())
        .map_err(|e| parse_error(format!("failed to read file: {}", e)))
        .and_then(|bytes| {
            String::from_utf8(bytes)
                .map_err(|e| parse_error(format!("file is not valid {}: {}", rules.csv_encoding, e)))
        })
        .and_then(|text| parse_table(&text, rules))
}

fn parse_error(message: String) -> IngestError {
    IngestError::validation_with_code(
        format!("CSV validation error: {}", message),
        ErrorCode::ValInvalidFormat,
    )
}

fn parse_table(text: &str, rules: &FileRules) -> IngestResult<Vec<TabularRecord>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| parse_error(e.to_string()))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let key_idx = column(&rules.key_column);
    let description_idx = column(&rules.description_column);
    let (key_idx, description_idx) = match (key_idx, description_idx) {
        (Some(k), Some(d)) => (k, d),
        _ => {
            let missing: Vec<&str> = [
                (key_idx, rules.key_column.as_str()),
                (description_idx, rules.description_column.as_str()),
            ]
            .into_iter()
            .filter(|(idx, _)| idx.is_none())
            .map(|(_, name)| name)
            .collect();
            return Err(IngestError::Validation {
                message: format!("Missing required columns: {}", missing.join(", ")),
                code: ErrorCode::ValMissingField,
                suggestion: Some(format!(
                    "The header row must contain '{}' and '{}'",
                    rules.key_column, rules.description_column
                )),
            });
        }
    };

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = row_idx + 2;
        let record = record.map_err(|e| parse_error(format!("row {}: {}", line, e)))?;

        let key = record.get(key_idx).unwrap_or("").trim();
        if key.is_empty() {
            return Err(IngestError::validation_with_code(
                format!("CSV row {} has an empty {}", line, rules.key_column),
                ErrorCode::ValMissingField,
            ));
        }
        let description = record.get(description_idx).unwrap_or("").trim();
        rows.push(TabularRecord::new(key, description));
    }

    if rows.is_empty() {
        return Err(IngestError::validation_with_code(
            "CSV file is empty",
            ErrorCode::ValEmpty,
        ));
    }

    info!(records = rows.len(), "CSV validated successfully");
    Ok(rows)
}

/// Partition the image batch by extension and size.
///
/// Fails when the batch is empty or when every file is rejected; in the latter
/// case the error lists each rejected file on its own line.
pub fn validate_images(images: Vec<ImageBlob>, rules: &FileRules) -> IngestResult<ImageValidation> {
    if images.is_empty() {
        return Err(IngestError::validation_with_code(
            "No images uploaded",
            ErrorCode::ValEmpty,
        ));
    }

    let max_bytes = rules.max_file_size_bytes();
    let mut accepted = Vec::with_capacity(images.len());
    let mut rejected = Vec::new();

    for image in images {
        let supported = image
            .extension()
            .map(|ext| rules.is_allowed_extension(&ext))
            .unwrap_or(false);
        if !supported {
            rejected.push(format!(
                "{}: Unsupported format. Use: {}",
                image.name(),
                rules.allowed_extensions.join(", ")
            ));
            continue;
        }

        if image.size() > max_bytes {
            rejected.push(format!(
                "{}: File too large. Max: {}MB",
                image.name(),
                rules.max_file_size_mb
            ));
            continue;
        }

        accepted.push(image);
    }

    if accepted.is_empty() {
        return Err(IngestError::validation_with_code(
            rejection_message(&rejected),
            ErrorCode::ValInvalidFormat,
        ));
    }

    if rejected.is_empty() {
        info!(images = accepted.len(), "Images validated successfully");
    } else {
        warn!(
            accepted = accepted.len(),
            rejected = rejected.len(),
            "{}",
            rejection_message(&rejected)
        );
    }

    Ok(ImageValidation { accepted, rejected })
}
