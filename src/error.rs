use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cocosplit operations.
///
/// Only conditions that must stop a run live here. Per-annotation quality
/// problems (degenerate boxes, unknown categories) and split outcomes such as
/// "already split" are reported, not raised.
#[derive(Debug, Error)]
pub enum CocosplitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write COCO JSON to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed {kind} record #{index} in {path}: field '{field}' {message}")]
    MalformedAnnotation {
        path: PathBuf,
        kind: &'static str,
        index: usize,
        field: &'static str,
        message: String,
    },

    #[error("Duplicate image id {id} in {path}")]
    DuplicateImageId { path: PathBuf, id: u64 },

    #[error("Annotation {annotation_id} in {path} references missing image {image_id}")]
    MissingImageRef {
        path: PathBuf,
        annotation_id: u64,
        image_id: u64,
    },

    #[error("Image not found: {path}")]
    ImageNotFound { path: PathBuf },

    #[error("Images '{first}' and '{second}' would both be labelled by {label}")]
    LabelPathCollision {
        label: PathBuf,
        first: String,
        second: String,
    },

    #[error("Failed to parse dataset descriptor {path}: {source}")]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write dataset descriptor {path}: {source}")]
    DescriptorWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid class vocabulary in {path}: {message}")]
    VocabularyParse { path: PathBuf, message: String },

    #[error("Failed to serialize report: {source}")]
    ReportSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}
