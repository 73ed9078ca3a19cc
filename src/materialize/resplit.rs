//! Halving an existing split into a new one.
//!
//! Half of `<root>/<from>/images` moves to `<root>/<to>/images` together with
//! the matching label files. When a COCO document for the source split is
//! configured, it is partitioned the same way; the original document is
//! backed up next to itself before anything is overwritten.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use super::descriptor::update_split_paths;
use super::transfer_file;
use crate::config::{ResplitConfig, TransferMode};
use crate::error::CocosplitError;
use crate::ir::io_coco_json::{read_coco_json, write_coco_json};
use crate::ir::io_yolo::label_path_for;
use crate::ir::{CocoDocument, ImageId};
use crate::split::{plan_even_split, SplitOutcome};

/// What a re-split did, or why it did nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum ResplitOutcome {
    Moved(ResplitReport),
    /// The destination split already holds files and was left untouched.
    AlreadySplit { destination: PathBuf },
    /// Fewer than two images in the source split.
    InsufficientData { available: usize },
}

/// Counts for a completed re-split.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResplitReport {
    pub from: String,
    pub to: String,
    pub moved_images: usize,
    pub kept_images: usize,
    pub moved_labels: usize,
    /// Moved images that had no label file next to them.
    pub missing_labels: usize,
    pub annotations: Option<PartitionCounts>,
    /// Copy of the source annotation document taken before overwriting it.
    pub backup: Option<PathBuf>,
    pub descriptor_updated: bool,
}

/// Sizes of the two documents produced by [`partition_by_files`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PartitionCounts {
    pub moved_images: usize,
    pub moved_annotations: usize,
    pub kept_images: usize,
    pub kept_annotations: usize,
}

/// A COCO document split in two by image file membership.
#[derive(Clone, Debug)]
pub struct CocoPartition {
    pub moved: CocoDocument,
    pub kept: CocoDocument,
}

impl CocoPartition {
    pub fn counts(&self) -> PartitionCounts {
        PartitionCounts {
            moved_images: self.moved.images.len(),
            moved_annotations: self.moved.annotations.len(),
            kept_images: self.kept.images.len(),
            kept_annotations: self.kept.annotations.len(),
        }
    }
}

impl fmt::Display for ResplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Moved {} of {} images from '{}' to '{}'",
            self.moved_images,
            self.moved_images + self.kept_images,
            self.from,
            self.to
        )?;
        writeln!(
            f,
            "  labels: {} moved, {} missing",
            self.moved_labels, self.missing_labels
        )?;
        if let Some(counts) = &self.annotations {
            writeln!(
                f,
                "  annotations: {} images / {} annotations moved, {} images / {} annotations kept",
                counts.moved_images,
                counts.moved_annotations,
                counts.kept_images,
                counts.kept_annotations
            )?;
        }
        if let Some(backup) = &self.backup {
            writeln!(f, "  backup: {}", backup.display())?;
        }
        if self.descriptor_updated {
            writeln!(f, "  descriptor updated")?;
        }
        Ok(())
    }
}

/// Split `doc` by whether an image's file name is in `moved_files`.
///
/// Images are matched on the last component of their `file_name`, since a
/// split directory is flat. Annotations follow their image; both outputs keep
/// the full category list and the top-level extra keys.
pub fn partition_by_files(doc: &CocoDocument, moved_files: &BTreeSet<String>) -> CocoPartition {
    let (moved_images, kept_images): (Vec<_>, Vec<_>) = doc
        .images
        .iter()
        .cloned()
        .partition(|image| moved_files.contains(base_name(&image.file_name)));

    let moved_ids: HashSet<ImageId> = moved_images.iter().map(|image| image.id).collect();
    let (moved_annotations, kept_annotations): (Vec<_>, Vec<_>) = doc
        .annotations
        .iter()
        .cloned()
        .partition(|ann| moved_ids.contains(&ann.image_id));

    CocoPartition {
        moved: CocoDocument {
            images: moved_images,
            annotations: moved_annotations,
            categories: doc.categories.clone(),
            extra: doc.extra.clone(),
        },
        kept: CocoDocument {
            images: kept_images,
            annotations: kept_annotations,
            categories: doc.categories.clone(),
            extra: doc.extra.clone(),
        },
    }
}

/// Move half of `<root>/<from>` into `<root>/<to>`.
///
/// The annotation document (if configured) is loaded and partitioned before
/// any file moves, so a malformed document stops the run with the tree
/// unchanged.
pub fn resplit_directory(config: &ResplitConfig) -> Result<ResplitOutcome, CocosplitError> {
    config.validate()?;

    let from_images = config.root.join(&config.from).join("images");
    let from_labels = config.root.join(&config.from).join("labels");
    let to_images = config.root.join(&config.to).join("images");
    let to_labels = config.root.join(&config.to).join("labels");

    let plan = match plan_even_split(&from_images, &to_images, config.seed)? {
        SplitOutcome::Planned(plan) => plan,
        SplitOutcome::AlreadySplit { destination } => {
            info!(
                "{} is already populated, leaving the split as it is",
                destination.display()
            );
            return Ok(ResplitOutcome::AlreadySplit { destination });
        }
        SplitOutcome::InsufficientData { available } => {
            warn!(
                "{} holds {} image(s), not enough to split",
                from_images.display(),
                available
            );
            return Ok(ResplitOutcome::InsufficientData { available });
        }
    };

    let moved_set: BTreeSet<String> = plan.moved.iter().cloned().collect();
    let partition = match &config.annotations {
        Some(annotations) if annotations.source.is_file() => {
            let doc = read_coco_json(&annotations.source)?;
            Some(partition_by_files(&doc, &moved_set))
        }
        Some(annotations) => {
            warn!(
                "annotation file {} not found, only files are re-split",
                annotations.source.display()
            );
            None
        }
        None => None,
    };

    let mut report = ResplitReport {
        from: config.from.clone(),
        to: config.to.clone(),
        moved_images: plan.moved.len(),
        kept_images: plan.kept.len(),
        ..Default::default()
    };

    for name in &plan.moved {
        transfer_file(&from_images.join(name), &to_images.join(name), TransferMode::Move)?;

        let label = label_path_for(&from_labels, name);
        if label.is_file() {
            transfer_file(&label, &label_path_for(&to_labels, name), TransferMode::Move)?;
            report.moved_labels += 1;
        } else {
            debug!("no label file for {}", name);
            report.missing_labels += 1;
        }
    }

    if let (Some(annotations), Some(partition)) = (&config.annotations, partition) {
        let backup = backup_file(&annotations.source)?;
        write_coco_json(&annotations.moved_output, &partition.moved)?;
        write_coco_json(&annotations.kept_output, &partition.kept)?;
        report.annotations = Some(partition.counts());
        report.backup = Some(backup);
    }

    if let Some(descriptor) = &config.descriptor {
        if descriptor.is_file() {
            update_split_paths(descriptor, &[config.from.as_str(), config.to.as_str()])?;
            report.descriptor_updated = true;
        } else {
            warn!("descriptor {} not found, not updated", descriptor.display());
        }
    }

    info!(
        "moved {} images and {} labels from '{}' to '{}'",
        report.moved_images, report.moved_labels, report.from, report.to
    );

    Ok(ResplitOutcome::Moved(report))
}

/// Copy `path` to the sibling `<file name>.bak` and return the backup path.
pub fn backup_file(path: &Path) -> Result<PathBuf, CocosplitError> {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| CocosplitError::InvalidConfig {
            message: format!("cannot back up {}: no file name", path.display()),
        })?;
    name.push(".bak");

    let backup = path.with_file_name(name);
    fs::copy(path, &backup).map_err(CocosplitError::Io)?;
    Ok(backup)
}

fn base_name(file_name: &str) -> &str {
    file_name.rsplit(['/', '\\']).next().unwrap_or(file_name)
}
