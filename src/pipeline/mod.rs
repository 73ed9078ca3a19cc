//! The `convert` run: COCO documents in, a YOLO dataset tree out.
//!
//! 1. Load the train document (and the test document, if any).
//! 2. Derive one class map for the whole run.
//! 3. Hold out `val_ratio` of the train images with a seeded split.
//! 4. Materialize `train`, `val` and optionally `test`.
//! 5. Write the dataset descriptor, rooted at the absolute output path.

pub mod report;

use std::fs;

pub use report::{
    ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity, SplitStatus,
    SplitSummary,
};

use log::{info, warn};

use crate::config::{ConvertConfig, TEST_SPLIT, TRAIN_SPLIT, VAL_SPLIT};
use crate::error::CocosplitError;
use crate::ir::io_coco_json::read_coco_json;
use crate::ir::{ClassMap, CocoDocument, ImageId};
use crate::materialize::descriptor::{write_descriptor, DatasetDescriptor};
use crate::materialize::{materialize_split, MaterializeOutcome, SplitJob};
use crate::split::plan_ratio_split;

/// Run a full conversion described by `config`.
pub fn run_convert(config: &ConvertConfig) -> Result<ConversionReport, CocosplitError> {
    config.validate()?;

    let train_doc = read_coco_json(&config.train_json)?;
    info!(
        "loaded {}: {} images, {} annotations, {} categories",
        config.train_json.display(),
        train_doc.images.len(),
        train_doc.annotations.len(),
        train_doc.categories.len()
    );

    // Loaded up front so a malformed test document fails before any write.
    let test_doc = match &config.test_json {
        Some(path) => Some(read_coco_json(path)?),
        None => None,
    };

    let (classes, source) = match &config.vocabulary {
        Some(path) => (
            ClassMap::from_vocabulary_file(path)?,
            format!("vocabulary file {}", path.display()),
        ),
        None => (
            ClassMap::from_categories(
                train_doc
                    .categories
                    .iter()
                    .map(|cat| (cat.id, cat.name.as_str())),
            ),
            format!("categories of {}", config.train_json.display()),
        ),
    };
    if classes.is_empty() {
        warn!("class map is empty, every annotation will be dropped");
    }

    let mut report = ConversionReport::new(
        classes.names().into_iter().map(str::to_string).collect(),
        config.box_policy.name(),
    );
    report.add(ConversionIssue::info(
        ConversionIssueCode::ClassMapSource,
        format!(
            "{} class(es) from {}, indexed by ascending category id",
            classes.len(),
            source
        ),
    ));

    check_vocabulary(&mut report, &classes, TRAIN_SPLIT, &train_doc);
    if let Some(doc) = &test_doc {
        check_vocabulary(&mut report, &classes, TEST_SPLIT, doc);
    }

    let split = plan_ratio_split(&train_doc.image_ids(), config.val_ratio, config.seed)?;
    let train_index = train_doc.index();

    for (name, ids) in [(TRAIN_SPLIT, &split.remainder), (VAL_SPLIT, &split.held_out)] {
        let outcome = materialize_split(&SplitJob {
            name,
            index: &train_index,
            classes: &classes,
            image_ids: ids,
            images_dir: &config.train_images,
            split_dir: &config.output_root.join(name),
            transfer: config.transfer,
            box_policy: config.box_policy,
            verify_dimensions: config.verify_dimensions,
        })?;
        record(&mut report, name, outcome);
    }

    if let (Some(doc), Some(images_dir)) = (&test_doc, &config.test_images) {
        let index = doc.index();
        let ids: Vec<ImageId> = doc.image_ids();
        let outcome = materialize_split(&SplitJob {
            name: TEST_SPLIT,
            index: &index,
            classes: &classes,
            image_ids: &ids,
            images_dir,
            split_dir: &config.output_root.join(TEST_SPLIT),
            transfer: config.transfer,
            box_policy: config.box_policy,
            verify_dimensions: config.verify_dimensions,
        })?;
        record(&mut report, TEST_SPLIT, outcome);
    }

    // Trainers resolve a relative `path` against their own dataset directory.
    fs::create_dir_all(&config.output_root).map_err(CocosplitError::Io)?;
    let dataset_root = fs::canonicalize(&config.output_root).map_err(CocosplitError::Io)?;

    let descriptor_path = config.output_root.join(&config.descriptor_name);
    let descriptor = DatasetDescriptor::new(
        &dataset_root,
        &classes,
        TRAIN_SPLIT,
        VAL_SPLIT,
        test_doc.as_ref().map(|_| TEST_SPLIT),
    );
    write_descriptor(&descriptor_path, &descriptor)?;
    info!("wrote {}", descriptor_path.display());
    report.descriptor = Some(descriptor_path);

    Ok(report)
}

fn check_vocabulary(
    report: &mut ConversionReport,
    classes: &ClassMap,
    split: &str,
    doc: &CocoDocument,
) {
    if classes.covers_exactly(doc.categories.iter().map(|cat| cat.id)) {
        return;
    }

    let message = format!(
        "{split}: document categories differ from the class map; labels use the shared \
         indices and unknown ids are dropped"
    );
    warn!("{message}");
    report.add(ConversionIssue::warning(
        ConversionIssueCode::VocabularyMismatch,
        message,
    ));
}

fn record(report: &mut ConversionReport, split: &str, outcome: MaterializeOutcome) {
    match outcome {
        MaterializeOutcome::Written(counts) => report.record_written(counts),
        MaterializeOutcome::AlreadySplit { destination } => {
            report.record_already_split(split, &destination)
        }
        MaterializeOutcome::InsufficientData => report.record_insufficient(split),
    }
}
