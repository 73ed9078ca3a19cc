//! Dataset materialization: the only part of the crate that writes into a
//! dataset tree.
//!
//! A materialized split looks like
//!
//! ```text
//! <split_dir>/images/<file_name>
//! <split_dir>/labels/<file_name with .txt>
//! ```
//!
//! Writes are not transactional. A failure half way through leaves whatever
//! was already written in place; re-running then sees a populated split and
//! skips it, so a broken split has to be removed by hand.

pub mod descriptor;
mod resplit;

pub use resplit::{
    backup_file, partition_by_files, resplit_directory, CocoPartition, PartitionCounts,
    ResplitOutcome, ResplitReport,
};

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::TransferMode;
use crate::error::CocosplitError;
use crate::ir::io_yolo::{label_path_for, write_label_file, YoloLabel};
use crate::ir::{codec, BoxPolicy, CategoryId, ClassMap, DocumentIndex, Image, ImageId, Rejection};
use crate::split::dir_is_populated;

/// Everything needed to materialize one split.
#[derive(Debug)]
pub struct SplitJob<'a> {
    /// Split name, used in logs and reports.
    pub name: &'a str,
    pub index: &'a DocumentIndex<'a>,
    pub classes: &'a ClassMap,
    /// Images belonging to this split, in the order they are processed.
    pub image_ids: &'a [ImageId],
    /// Directory the records' `file_name`s are relative to.
    pub images_dir: &'a Path,
    /// Destination split root.
    pub split_dir: &'a Path,
    pub transfer: TransferMode,
    pub box_policy: BoxPolicy,
    pub verify_dimensions: bool,
}

/// What materializing a split did, or why it did nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterializeOutcome {
    Written(MaterializeReport),
    /// The split directory already holds files and was left untouched.
    AlreadySplit { destination: PathBuf },
    /// No image ids were assigned to the split.
    InsufficientData,
}

/// Counts for one materialized split.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub split: String,
    pub images: usize,
    pub label_files: usize,
    pub empty_label_files: usize,
    pub labels_written: usize,
    pub degenerate_boxes: usize,
    pub outside_boxes: usize,
    /// Dropped annotations per category id missing from the class map.
    pub unknown_categories: BTreeMap<CategoryId, usize>,
    /// Images whose declared size differs from the file (or could not be read).
    pub dimension_mismatches: Vec<String>,
}

impl MaterializeReport {
    pub fn unknown_category_total(&self) -> usize {
        self.unknown_categories.values().sum()
    }
}

/// Copy (or move) the split's images into `<split_dir>/images` and write one
/// label file per image into `<split_dir>/labels`.
///
/// # Errors
/// [`CocosplitError::LabelPathCollision`] before anything is written if two
/// images of the split map to the same label file (`a.jpg` and `a.png`).
/// [`CocosplitError::ImageNotFound`] as soon as a referenced image file is
/// missing; anything already written stays.
pub fn materialize_split(job: &SplitJob<'_>) -> Result<MaterializeOutcome, CocosplitError> {
    if dir_is_populated(job.split_dir)? {
        info!(
            "{} split at {} is already populated, skipping",
            job.name,
            job.split_dir.display()
        );
        return Ok(MaterializeOutcome::AlreadySplit {
            destination: job.split_dir.to_path_buf(),
        });
    }

    if job.image_ids.is_empty() {
        warn!("{} split has no images, nothing to materialize", job.name);
        return Ok(MaterializeOutcome::InsufficientData);
    }

    let images_out = job.split_dir.join("images");
    let labels_out = job.split_dir.join("labels");
    check_label_paths(job, &labels_out)?;

    let mut report = MaterializeReport {
        split: job.name.to_string(),
        ..Default::default()
    };

    for image_id in job.image_ids {
        let Some(image) = job.index.images.get(image_id) else {
            debug!("{} split: image {} has no record, skipping", job.name, image_id);
            continue;
        };

        let source = job.images_dir.join(&image.file_name);
        if !source.is_file() {
            return Err(CocosplitError::ImageNotFound { path: source });
        }

        if job.verify_dimensions {
            if let Some(problem) = check_dimensions(image, &source) {
                warn!("{}: {}", source.display(), problem);
                report.dimension_mismatches.push(image.file_name.clone());
            }
        }

        transfer_file(&source, &images_out.join(&image.file_name), job.transfer)?;
        report.images += 1;

        let labels = build_labels(job, image, &mut report);
        write_label_file(&label_path_for(&labels_out, &image.file_name), &labels)?;
        report.label_files += 1;
        report.labels_written += labels.len();
        if labels.is_empty() {
            report.empty_label_files += 1;
        }
    }

    info!(
        "{} split: {} images, {} labels ({} degenerate, {} outside, {} unknown category dropped)",
        job.name,
        report.images,
        report.labels_written,
        report.degenerate_boxes,
        report.outside_boxes,
        report.unknown_category_total()
    );

    Ok(MaterializeOutcome::Written(report))
}

fn check_label_paths(job: &SplitJob<'_>, labels_out: &Path) -> Result<(), CocosplitError> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    for image_id in job.image_ids {
        let Some(image) = job.index.images.get(image_id) else {
            continue;
        };
        let label = label_path_for(labels_out, &image.file_name);
        if let Some(first) = seen.insert(label.clone(), &image.file_name) {
            return Err(CocosplitError::LabelPathCollision {
                label,
                first: first.to_string(),
                second: image.file_name.clone(),
            });
        }
    }
    Ok(())
}

fn build_labels(job: &SplitJob<'_>, image: &Image, report: &mut MaterializeReport) -> Vec<YoloLabel> {
    let mut labels = Vec::new();

    for ann in job.index.annotations_for(image.id) {
        let Some(class_index) = job.classes.class_index(ann.category_id) else {
            debug!(
                "annotation {}: category {} not in class map, dropped",
                ann.id, ann.category_id
            );
            *report.unknown_categories.entry(ann.category_id).or_insert(0) += 1;
            continue;
        };

        match codec::encode_with_policy(&ann.bbox, image.width, image.height, job.box_policy) {
            Ok(bbox) => labels.push(YoloLabel::new(class_index, bbox)),
            Err(rejection) => {
                debug!("annotation {}: {}, dropped", ann.id, rejection);
                match rejection {
                    Rejection::Degenerate => report.degenerate_boxes += 1,
                    Rejection::OutsideImage => report.outside_boxes += 1,
                }
            }
        }
    }

    labels
}

fn check_dimensions(image: &Image, path: &Path) -> Option<String> {
    match imagesize::size(path) {
        Ok(size) if size.width == image.width as usize && size.height == image.height as usize => {
            None
        }
        Ok(size) => Some(format!(
            "declared {}x{} but file is {}x{}",
            image.width, image.height, size.width, size.height
        )),
        Err(err) => Some(format!("could not read image size ({err})")),
    }
}

/// Copy or move `source` to `destination`, creating parent directories.
pub(crate) fn transfer_file(
    source: &Path,
    destination: &Path,
    mode: TransferMode,
) -> Result<(), CocosplitError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(CocosplitError::Io)?;
    }

    match mode {
        TransferMode::Copy => {
            fs::copy(source, destination).map_err(CocosplitError::Io)?;
        }
        TransferMode::Move => {
            if let Err(err) = fs::rename(source, destination) {
                // rename cannot cross filesystems
                debug!(
                    "rename {} failed ({}), copying instead",
                    source.display(),
                    err
                );
                fs::copy(source, destination).map_err(CocosplitError::Io)?;
                fs::remove_file(source).map_err(CocosplitError::Io)?;
            }
        }
    }

    Ok(())
}
