//! Ultralytics-style dataset descriptor (`dataset.yaml`).
//!
//! ```yaml
//! path: /data/out
//! train: train/images
//! val: val/images
//! test: test/images
//! nc: 2
//! names:
//! - ripe
//! - unripe
//! ```
//!
//! A conversion run writes the descriptor wholesale. A re-split only refreshes
//! the split entries of an existing file and keeps every other key.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::config::{TEST_SPLIT, TRAIN_SPLIT, VAL_SPLIT};
use crate::error::CocosplitError;
use crate::ir::ClassMap;

const STANDARD_SPLITS: [&str; 3] = [TRAIN_SPLIT, VAL_SPLIT, TEST_SPLIT];

/// Contents of a descriptor written by a conversion run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Dataset root the split paths are relative to.
    pub path: String,
    pub train: String,
    pub val: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    /// Number of classes.
    pub nc: usize,
    /// Class names ordered by class index.
    pub names: Vec<String>,
}

impl DatasetDescriptor {
    pub fn new(root: &Path, classes: &ClassMap, train: &str, val: &str, test: Option<&str>) -> Self {
        Self {
            path: slash_path(root),
            train: split_images_dir(train),
            val: split_images_dir(val),
            test: test.map(split_images_dir),
            nc: classes.len(),
            names: classes.names().into_iter().map(str::to_string).collect(),
        }
    }
}

/// Relative image directory of a split.
pub fn split_images_dir(split: &str) -> String {
    format!("{split}/images")
}

pub fn write_descriptor(path: &Path, descriptor: &DatasetDescriptor) -> Result<(), CocosplitError> {
    let yaml = serde_yaml::to_string(descriptor).map_err(|source| {
        CocosplitError::DescriptorWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    write_yaml(path, &yaml)
}

pub fn read_descriptor(path: &Path) -> Result<DatasetDescriptor, CocosplitError> {
    let data = fs::read_to_string(path).map_err(CocosplitError::Io)?;
    serde_yaml::from_str(&data).map_err(|source| CocosplitError::DescriptorParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Point the `train`, `val` and `test` keys of an existing descriptor, plus
/// any extra `splits`, at `<split>/images`.
///
/// All other keys are kept as they are.
pub fn update_split_paths(path: &Path, splits: &[&str]) -> Result<(), CocosplitError> {
    let data = fs::read_to_string(path).map_err(CocosplitError::Io)?;
    let value: Value = serde_yaml::from_str(&data).map_err(|source| {
        CocosplitError::DescriptorParse {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => Mapping::new(),
        _ => {
            return Err(CocosplitError::InvalidConfig {
                message: format!("{} is not a YAML mapping", path.display()),
            })
        }
    };

    for split in STANDARD_SPLITS.iter().chain(splits) {
        mapping.insert(
            Value::String((*split).to_string()),
            Value::String(split_images_dir(split)),
        );
    }

    let yaml = serde_yaml::to_string(&Value::Mapping(mapping)).map_err(|source| {
        CocosplitError::DescriptorWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    write_yaml(path, &yaml)
}

fn write_yaml(path: &Path, yaml: &str) -> Result<(), CocosplitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(CocosplitError::Io)?;
        }
    }
    fs::write(path, yaml).map_err(CocosplitError::Io)
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
