//! Ultralytics-style YOLO label files.
//!
//! One text file per image, one object per line:
//!
//! ```text
//! <class_index> <cx> <cy> <w> <h>
//! ```
//!
//! Coordinates are normalized and written with exactly six decimal places.
//! An image without objects still gets a label file; it is simply empty, so
//! "no objects" can be told apart from "label missing".

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{BBoxCXCYWH, Normalized};
use crate::error::CocosplitError;

pub const LABEL_EXTENSION: &str = "txt";

/// One row of a YOLO label file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloLabel {
    pub class_index: usize,
    pub bbox: BBoxCXCYWH<Normalized>,
}

impl YoloLabel {
    pub fn new(class_index: usize, bbox: BBoxCXCYWH<Normalized>) -> Self {
        Self { class_index, bbox }
    }

    /// The label line without its trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_index, self.bbox.cx, self.bbox.cy, self.bbox.w, self.bbox.h
        )
    }
}

/// Label file location for an image: the image's relative path with a `.txt`
/// extension, under `labels_dir`.
pub fn label_path_for(labels_dir: &Path, image_file_name: &str) -> PathBuf {
    labels_dir.join(Path::new(image_file_name).with_extension(LABEL_EXTENSION))
}

/// Write `labels` to `path`, creating parent directories as needed.
///
/// The file is always created, even for an empty slice.
pub fn write_label_file(path: &Path, labels: &[YoloLabel]) -> Result<(), CocosplitError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(CocosplitError::Io)?;
    }

    let file = fs::File::create(path).map_err(CocosplitError::Io)?;
    let mut writer = BufWriter::new(file);
    for label in labels {
        writeln!(writer, "{}", label.to_line()).map_err(CocosplitError::Io)?;
    }
    writer.flush().map_err(CocosplitError::Io)
}
