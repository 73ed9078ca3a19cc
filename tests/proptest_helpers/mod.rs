#![allow(dead_code)]

use std::collections::BTreeSet;

use cocosplit::ir::{BBoxXYWH, CategoryId, ImageId, Pixel};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Relative tolerance for encode/decode round trips.
pub const REL_TOLERANCE: f64 = 1e-3;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// An image size and a non-degenerate box fully inside it.
pub fn arb_image_and_box() -> impl Strategy<Value = (u32, u32, BBoxXYWH<Pixel>)> {
    (1u32..=4096, 1u32..=4096)
        .prop_flat_map(|(w, h)| {
            let (wf, hf) = (w as f64, h as f64);
            (
                Just(w),
                Just(h),
                0.0..wf * 0.9,
                0.0..hf * 0.9,
                0.05f64..=1.0,
                0.05f64..=1.0,
            )
        })
        .prop_map(|(w, h, x, y, fw, fh)| {
            let (wf, hf) = (w as f64, h as f64);
            let bw = ((wf - x) * fw).max(f64::MIN_POSITIVE);
            let bh = ((hf - y) * fh).max(f64::MIN_POSITIVE);
            (w, h, BBoxXYWH::new(x, y, bw, bh))
        })
}

/// A set of distinct category ids, possibly sparse.
pub fn arb_category_ids(max_len: usize) -> impl Strategy<Value = Vec<CategoryId>> {
    prop::collection::btree_set(0u64..10_000, 0..=max_len)
        .prop_map(|ids| ids.into_iter().map(CategoryId).collect())
}

/// A non-empty set of distinct image ids, in arbitrary order.
pub fn arb_image_ids(max_len: usize) -> impl Strategy<Value = Vec<ImageId>> {
    prop::collection::btree_set(0u64..1_000_000, 1..=max_len)
        .prop_map(|ids| ids.into_iter().map(ImageId).collect::<Vec<_>>())
        .prop_shuffle()
}

pub fn id_set(ids: &[ImageId]) -> BTreeSet<ImageId> {
    ids.iter().copied().collect()
}

pub fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= REL_TOLERANCE * scale.abs().max(1e-9)
}
