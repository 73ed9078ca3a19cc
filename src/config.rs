//! Run configuration.
//!
//! Every path and ratio the pipeline uses is passed in explicitly through
//! these structs; nothing is resolved relative to the working directory
//! behind the caller's back.

use std::path::PathBuf;

use crate::error::CocosplitError;

pub use crate::ir::BoxPolicy;

pub const DEFAULT_VAL_RATIO: f64 = 0.1;
pub const DEFAULT_SEED: u64 = 777;
pub const DEFAULT_DESCRIPTOR_NAME: &str = "dataset.yaml";

pub const TRAIN_SPLIT: &str = "train";
pub const VAL_SPLIT: &str = "val";
pub const TEST_SPLIT: &str = "test";

/// How image files reach the destination split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransferMode {
    /// Leave the source tree untouched.
    #[default]
    Copy,
    /// Rename into place, falling back to copy + delete across filesystems.
    Move,
}

impl TransferMode {
    pub fn name(&self) -> &'static str {
        match self {
            TransferMode::Copy => "copy",
            TransferMode::Move => "move",
        }
    }
}

/// Settings for a fresh COCO -> YOLO conversion with a train/val split.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    pub train_json: PathBuf,
    pub train_images: PathBuf,
    pub test_json: Option<PathBuf>,
    pub test_images: Option<PathBuf>,
    /// Dataset root; splits land in `<output_root>/<split>/{images,labels}`.
    pub output_root: PathBuf,
    /// Fraction of the train document held out as `val`.
    pub val_ratio: f64,
    pub seed: u64,
    pub transfer: TransferMode,
    pub box_policy: BoxPolicy,
    /// Fixed class vocabulary; defaults to the train document's categories.
    pub vocabulary: Option<PathBuf>,
    /// File name of the descriptor written under `output_root`.
    pub descriptor_name: String,
    /// Compare declared image sizes against the image file headers.
    pub verify_dimensions: bool,
}

impl ConvertConfig {
    pub fn new(
        train_json: impl Into<PathBuf>,
        train_images: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            train_json: train_json.into(),
            train_images: train_images.into(),
            test_json: None,
            test_images: None,
            output_root: output_root.into(),
            val_ratio: DEFAULT_VAL_RATIO,
            seed: DEFAULT_SEED,
            transfer: TransferMode::default(),
            box_policy: BoxPolicy::default(),
            vocabulary: None,
            descriptor_name: DEFAULT_DESCRIPTOR_NAME.to_string(),
            verify_dimensions: false,
        }
    }

    pub fn with_test(mut self, json: impl Into<PathBuf>, images: impl Into<PathBuf>) -> Self {
        self.test_json = Some(json.into());
        self.test_images = Some(images.into());
        self
    }

    pub fn validate(&self) -> Result<(), CocosplitError> {
        if !(self.val_ratio.is_finite() && self.val_ratio > 0.0 && self.val_ratio < 1.0) {
            return Err(invalid(format!(
                "val ratio must be in the open interval (0, 1), got {}",
                self.val_ratio
            )));
        }

        match (&self.test_json, &self.test_images) {
            (Some(_), None) => {
                return Err(invalid("a test annotation file needs a test image directory"))
            }
            (None, Some(_)) => {
                return Err(invalid("a test image directory needs a test annotation file"))
            }
            _ => {}
        }

        validate_file_name("descriptor name", &self.descriptor_name)
    }
}

/// Input and output documents for re-partitioning a COCO file alongside a
/// directory re-split.
#[derive(Clone, Debug)]
pub struct AnnotationResplit {
    /// Document covering every image of the source split.
    pub source: PathBuf,
    /// Receives the images that moved (and their annotations).
    pub moved_output: PathBuf,
    /// Receives the images that stayed.
    pub kept_output: PathBuf,
}

/// Settings for halving an existing split into a new one.
#[derive(Clone, Debug)]
pub struct ResplitConfig {
    pub root: PathBuf,
    pub from: String,
    pub to: String,
    /// Without a seed every run picks a different half.
    pub seed: Option<u64>,
    pub annotations: Option<AnnotationResplit>,
    /// Descriptor whose split paths are refreshed afterwards.
    pub descriptor: Option<PathBuf>,
}

impl ResplitConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            from: VAL_SPLIT.to_string(),
            to: TEST_SPLIT.to_string(),
            seed: None,
            annotations: None,
            descriptor: None,
        }
    }

    pub fn validate(&self) -> Result<(), CocosplitError> {
        validate_file_name("source split name", &self.from)?;
        validate_file_name("destination split name", &self.to)?;
        if self.from == self.to {
            return Err(invalid(format!(
                "source and destination split are both '{}'",
                self.from
            )));
        }

        if let Some(annotations) = &self.annotations {
            if annotations.moved_output == annotations.kept_output {
                return Err(invalid(format!(
                    "moved and kept annotations would both be written to {}",
                    annotations.moved_output.display()
                )));
            }
        }

        Ok(())
    }
}

fn validate_file_name(what: &str, name: &str) -> Result<(), CocosplitError> {
    if name.trim().is_empty() {
        return Err(invalid(format!("{what} must not be empty")));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(invalid(format!(
            "{what} must be a plain name, got '{name}'"
        )));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> CocosplitError {
    CocosplitError::InvalidConfig {
        message: message.into(),
    }
}
