//! Read-only summary of a COCO document: counts, the class mapping a
//! conversion would use, and how many boxes would survive encoding.

mod report;

pub use report::{BoxSection, ClassRow, InspectReport, SummarySection};

use std::collections::{BTreeMap, HashSet};

use crate::ir::{codec, BoxPolicy, CategoryId, ClassMap, CocoDocument, ImageId, Rejection};

/// Options for document inspection.
#[derive(Clone, Debug)]
pub struct InspectOptions {
    pub box_policy: BoxPolicy,
    /// Width of histogram bars (in characters).
    pub bar_width: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            box_policy: BoxPolicy::default(),
            bar_width: 20,
        }
    }
}

pub fn inspect_document(doc: &CocoDocument, opts: &InspectOptions) -> InspectReport {
    let index = doc.index();
    let classes = ClassMap::from_categories(index.categories.iter().map(|(id, name)| (*id, *name)));

    let annotated: HashSet<ImageId> = doc.annotations.iter().map(|ann| ann.image_id).collect();
    let summary = SummarySection {
        images: doc.images.len(),
        annotations: doc.annotations.len(),
        categories: doc.categories.len(),
        images_without_annotations: doc
            .images
            .iter()
            .filter(|img| !annotated.contains(&img.id))
            .count(),
        extra_keys: doc.extra.keys().cloned().collect(),
    };

    let mut per_category: BTreeMap<CategoryId, usize> = BTreeMap::new();
    let mut boxes = BoxSection {
        policy: opts.box_policy.name().to_string(),
        total: doc.annotations.len(),
        ..Default::default()
    };

    for ann in &doc.annotations {
        if classes.class_index(ann.category_id).is_none() {
            boxes.unknown_category += 1;
            continue;
        }
        *per_category.entry(ann.category_id).or_insert(0) += 1;

        // the loader guarantees the image exists
        let Some(image) = index.images.get(&ann.image_id) else {
            continue;
        };
        match codec::encode_with_policy(&ann.bbox, image.width, image.height, opts.box_policy) {
            Ok(_) => boxes.encodable += 1,
            Err(Rejection::Degenerate) => boxes.degenerate += 1,
            Err(Rejection::OutsideImage) => boxes.outside_image += 1,
        }
    }

    let class_rows = classes
        .category_ids()
        .zip(classes.names())
        .enumerate()
        .map(|(index, (id, name))| ClassRow {
            index,
            category_id: id.as_u64(),
            name: name.to_string(),
            annotations: per_category.get(&id).copied().unwrap_or(0),
        })
        .collect();

    InspectReport {
        summary,
        classes: class_rows,
        boxes,
        bar_width: opts.bar_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Annotation, BBoxXYWH, Category, Image};

    fn make_document() -> CocoDocument {
        CocoDocument {
            images: vec![
                Image::new(1u64, "a.jpg", 100, 50),
                Image::new(2u64, "b.jpg", 200, 200),
                Image::new(3u64, "c.jpg", 64, 64),
            ],
            annotations: vec![
                Annotation::new(1u64, 1u64, 5u64, BBoxXYWH::new(10.0, 10.0, 20.0, 10.0)),
                Annotation::new(2u64, 2u64, 7u64, BBoxXYWH::new(0.0, 0.0, 400.0, 400.0)),
                Annotation::new(3u64, 2u64, 7u64, BBoxXYWH::new(5.0, 5.0, 0.0, 10.0)),
                Annotation::new(4u64, 2u64, 9u64, BBoxXYWH::new(5.0, 5.0, 10.0, 10.0)),
            ],
            categories: vec![Category::new(7u64, "unripe"), Category::new(5u64, "ripe")],
            ..Default::default()
        }
    }

    #[test]
    fn summary_counts() {
        let report = inspect_document(&make_document(), &InspectOptions::default());
        assert_eq!(report.summary.images, 3);
        assert_eq!(report.summary.annotations, 4);
        assert_eq!(report.summary.images_without_annotations, 1);
    }

    #[test]
    fn classes_follow_category_id_order() {
        let report = inspect_document(&make_document(), &InspectOptions::default());
        let names: Vec<&str> = report.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ripe", "unripe"]);
        assert_eq!(report.classes[1].annotations, 2);
    }

    #[test]
    fn box_outcomes_depend_on_policy() {
        let doc = make_document();
        let clamp = inspect_document(&doc, &InspectOptions::default());
        assert_eq!(clamp.boxes.encodable, 2);
        assert_eq!(clamp.boxes.degenerate, 1);
        assert_eq!(clamp.boxes.unknown_category, 1);

        let drop = inspect_document(
            &doc,
            &InspectOptions {
                box_policy: BoxPolicy::Drop,
                ..Default::default()
            },
        );
        assert_eq!(drop.boxes.encodable, 1);
        assert_eq!(drop.boxes.outside_image, 1);
    }

    #[test]
    fn display_lists_sections() {
        let report = inspect_document(&make_document(), &InspectOptions::default());
        let output = format!("{report}");
        assert!(output.contains("Summary"));
        assert!(output.contains("Classes (2)"));
        assert!(output.contains("unripe"));
        assert!(output.contains("clamp policy"));
    }
}
