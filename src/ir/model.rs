//! In-memory COCO document model.
//!
//! Records keep the typed fields the pipeline reads plus every other field of
//! the source record in `extra`, so a filtered subset can be written back with
//! the same schema it was read with.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::bbox::BBoxXYWH;
use super::ids::{AnnotationId, CategoryId, ImageId};
use super::space::Pixel;

/// A parsed COCO annotation document.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CocoDocument {
    pub images: Vec<Image>,

    pub annotations: Vec<Annotation>,

    pub categories: Vec<Category>,

    /// Top-level keys other than the three arrays (`info`, `licenses`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An entry of the `images` array.
#[derive(Clone, Debug, Serialize)]
pub struct Image {
    pub id: ImageId,

    /// Path of the image file, relative to the image source directory.
    pub file_name: String,

    pub width: u32,

    pub height: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Image {
    pub fn new(
        id: impl Into<ImageId>,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
            extra: Map::new(),
        }
    }
}

/// An entry of the `annotations` array.
#[derive(Clone, Debug, Serialize)]
pub struct Annotation {
    pub id: AnnotationId,

    pub image_id: ImageId,

    pub category_id: CategoryId,

    /// `[x, y, w, h]` in pixels, `(x, y)` being the top-left corner.
    pub bbox: BBoxXYWH<Pixel>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: BBoxXYWH<Pixel>,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
            extra: Map::new(),
        }
    }
}

/// An entry of the `categories` array.
#[derive(Clone, Debug, Serialize)]
pub struct Category {
    pub id: CategoryId,

    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// Lookup tables over a [`CocoDocument`].
///
/// Annotations are grouped per image in the order they appear in the source
/// document, which keeps label files reproducible between runs.
#[derive(Debug)]
pub struct DocumentIndex<'a> {
    pub images: BTreeMap<ImageId, &'a Image>,
    pub annotations_by_image: BTreeMap<ImageId, Vec<&'a Annotation>>,
    pub categories: BTreeMap<CategoryId, &'a str>,
}

impl CocoDocument {
    /// Build the image, annotation-per-image and category lookups.
    pub fn index(&self) -> DocumentIndex<'_> {
        let images = self.images.iter().map(|img| (img.id, img)).collect();

        let mut annotations_by_image: BTreeMap<ImageId, Vec<&Annotation>> = BTreeMap::new();
        for ann in &self.annotations {
            annotations_by_image
                .entry(ann.image_id)
                .or_default()
                .push(ann);
        }

        let categories = self
            .categories
            .iter()
            .map(|cat| (cat.id, cat.name.as_str()))
            .collect();

        DocumentIndex {
            images,
            annotations_by_image,
            categories,
        }
    }

    /// All image ids in the document, ascending.
    pub fn image_ids(&self) -> Vec<ImageId> {
        let mut ids: Vec<ImageId> = self.images.iter().map(|img| img.id).collect();
        ids.sort();
        ids
    }
}

impl DocumentIndex<'_> {
    /// Annotations of one image, in source order.
    pub fn annotations_for(&self, image_id: ImageId) -> &[&Annotation] {
        self.annotations_by_image
            .get(&image_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
