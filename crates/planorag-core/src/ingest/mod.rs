//! The ingestion pipeline: validation, matching, uploads and the workflow
//! that drives them.

pub mod matcher;
pub mod processor;
pub mod upload;
pub mod validate;

pub use matcher::{image_key, match_records, MatchOutcome};
pub use processor::{IngestProcessor, RecordOutcome};
pub use upload::{
    content_type_for, create_destination_folder, detect_image_format, object_key,
    sniff_image_format, ImageFormat, Uploader,
};
pub use validate::{validate_images, validate_table, ImageValidation};
