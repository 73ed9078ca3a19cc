//! Fuzz target for the COCO annotation loader.
//!
//! Arbitrary bytes go through the full load path (JSON parse, field coercion,
//! integrity checks). Only panics and hangs are failures; errors are expected.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use cocosplit::ir::io_coco_json::{from_coco_slice, to_coco_string};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    // anything that loads must also write back
    if let Ok(doc) = from_coco_slice(data) {
        let _ = to_coco_string(&doc);
    }
});
