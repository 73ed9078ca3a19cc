//! Category id to YOLO class index mapping.
//!
//! COCO category ids are arbitrary and often start at 1 or skip values. YOLO
//! wants contiguous indices starting at 0. The mapping sorts category ids
//! ascending and numbers them in that order; names never influence the order.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::io_coco_json::read_coco_json;
use super::CategoryId;
use crate::error::CocosplitError;

/// Bijection between category ids and zero-based class indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMap {
    // (category id, name), position == class index
    classes: Vec<(CategoryId, String)>,
    index: BTreeMap<CategoryId, usize>,
}

impl ClassMap {
    /// Build the mapping from a category id -> name table.
    pub fn from_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = (CategoryId, S)>,
        S: AsRef<str>,
    {
        // BTreeMap both sorts by id and collapses repeated ids.
        let sorted: BTreeMap<CategoryId, String> = categories
            .into_iter()
            .map(|(id, name)| (id, name.as_ref().to_string()))
            .collect();

        let classes: Vec<(CategoryId, String)> = sorted.into_iter().collect();
        let index = classes
            .iter()
            .enumerate()
            .map(|(idx, (id, _))| (*id, idx))
            .collect();

        Self { classes, index }
    }

    /// Load a fixed vocabulary.
    ///
    /// A `.json` file is read as a COCO document and its `categories` are
    /// used. Anything else is read as a YAML list of `{id, name}` entries.
    pub fn from_vocabulary_file(path: &Path) -> Result<Self, CocosplitError> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            let doc = read_coco_json(path)?;
            if doc.categories.is_empty() {
                return Err(CocosplitError::VocabularyParse {
                    path: path.to_path_buf(),
                    message: "document has no categories".to_string(),
                });
            }
            return Ok(Self::from_categories(
                doc.categories.iter().map(|cat| (cat.id, cat.name.as_str())),
            ));
        }

        let data = fs::read_to_string(path).map_err(CocosplitError::Io)?;
        let entries: Vec<VocabularyEntry> =
            serde_yaml::from_str(&data).map_err(|source| CocosplitError::VocabularyParse {
                path: path.to_path_buf(),
                message: source.to_string(),
            })?;

        if entries.is_empty() {
            return Err(CocosplitError::VocabularyParse {
                path: path.to_path_buf(),
                message: "vocabulary is empty".to_string(),
            });
        }

        let mut seen = BTreeMap::new();
        for entry in &entries {
            if let Some(previous) = seen.insert(entry.id, entry.name.as_str()) {
                return Err(CocosplitError::VocabularyParse {
                    path: path.to_path_buf(),
                    message: format!(
                        "category id {} is listed twice ('{}' and '{}')",
                        entry.id, previous, entry.name
                    ),
                });
            }
        }

        Ok(Self::from_categories(
            entries
                .iter()
                .map(|entry| (CategoryId::new(entry.id), entry.name.as_str())),
        ))
    }

    /// Class index for a category id, if the id is part of the vocabulary.
    #[inline]
    pub fn class_index(&self, category_id: CategoryId) -> Option<usize> {
        self.index.get(&category_id).copied()
    }

    /// Number of classes (`nc`).
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class names ordered by class index.
    pub fn names(&self) -> Vec<&str> {
        self.classes.iter().map(|(_, name)| name.as_str()).collect()
    }

    /// Category ids ordered by class index.
    pub fn category_ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.classes.iter().map(|(id, _)| *id)
    }

    /// True when `ids` is exactly this vocabulary's id set.
    pub fn covers_exactly<I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = CategoryId>,
    {
        let mut other: Vec<CategoryId> = ids.into_iter().collect();
        other.sort();
        other.dedup();
        other.len() == self.classes.len() && other.into_iter().eq(self.category_ids())
    }
}

#[derive(Debug, Deserialize)]
struct VocabularyEntry {
    id: u64,
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(pairs: &[(u64, &str)]) -> ClassMap {
        ClassMap::from_categories(pairs.iter().map(|(id, name)| (CategoryId(*id), *name)))
    }

    #[test]
    fn indices_follow_ascending_category_ids() {
        let map = map_of(&[(7, "unripe"), (5, "ripe"), (12, "flower")]);

        assert_eq!(map.class_index(CategoryId(5)), Some(0));
        assert_eq!(map.class_index(CategoryId(7)), Some(1));
        assert_eq!(map.class_index(CategoryId(12)), Some(2));
        assert_eq!(map.class_index(CategoryId(6)), None);
        assert_eq!(map.names(), vec!["ripe", "unripe", "flower"]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn names_do_not_affect_order() {
        let a = map_of(&[(1, "zebra"), (2, "apple")]);
        assert_eq!(a.names(), vec!["zebra", "apple"]);
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = map_of(&[(3, "c"), (1, "a"), (2, "b")]);
        let b = map_of(&[(1, "a"), (2, "b"), (3, "c")]);
        assert_eq!(a, b);
    }

    #[test]
    fn covers_exactly_compares_id_sets() {
        let map = map_of(&[(1, "a"), (2, "b")]);
        assert!(map.covers_exactly([CategoryId(2), CategoryId(1)]));
        assert!(!map.covers_exactly([CategoryId(1)]));
        assert!(!map.covers_exactly([CategoryId(1), CategoryId(3)]));
    }

    #[test]
    fn yaml_vocabulary_is_loaded() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("classes.yaml");
        fs::write(&path, "- id: 3\n  name: fully-ripe\n- id: 1\n  name: unripe\n")
            .expect("write vocabulary");

        let map = ClassMap::from_vocabulary_file(&path).expect("load vocabulary");
        assert_eq!(map.names(), vec!["unripe", "fully-ripe"]);
    }

    #[test]
    fn yaml_vocabulary_rejects_repeated_ids() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("classes.yaml");
        fs::write(&path, "- id: 1\n  name: a\n- id: 1\n  name: b\n").expect("write vocabulary");

        let err = ClassMap::from_vocabulary_file(&path).unwrap_err();
        assert!(matches!(err, CocosplitError::VocabularyParse { .. }));
    }

    #[test]
    fn json_vocabulary_uses_document_categories() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("vocab.json");
        fs::write(
            &path,
            r#"{"categories": [{"id": 2, "name": "b"}, {"id": 1, "name": "a"}]}"#,
        )
        .expect("write vocabulary");

        let map = ClassMap::from_vocabulary_file(&path).expect("load vocabulary");
        assert_eq!(map.names(), vec!["a", "b"]);
    }
}
