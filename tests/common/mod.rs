#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Two images, two categories with non-contiguous ids, one box that overhangs.
pub const SAMPLE_COCO: &str = r#"{
    "info": {"description": "strawberries"},
    "images": [
        {"id": 1, "file_name": "a.jpg", "width": 100, "height": 50},
        {"id": 2, "file_name": "b.jpg", "width": 200, "height": 200}
    ],
    "annotations": [
        {"id": 1, "image_id": 1, "category_id": 5, "bbox": [10, 10, 20, 10], "area": 200, "iscrowd": 0},
        {"id": 2, "image_id": 2, "category_id": 7, "bbox": [0, 0, 400, 400], "area": 160000, "iscrowd": 0}
    ],
    "categories": [
        {"id": 5, "name": "ripe"},
        {"id": 7, "name": "unripe"}
    ]
}"#;

/// A document with `count` images `img_<id>.bmp` (64x48), one annotation per
/// image alternating between categories 1 and 2.
pub fn pool_document(count: u64) -> String {
    let images: Vec<String> = (1..=count)
        .map(|id| {
            format!(r#"{{"id": {id}, "file_name": "img_{id}.bmp", "width": 64, "height": 48}}"#)
        })
        .collect();
    let annotations: Vec<String> = (1..=count)
        .map(|id| {
            format!(
                r#"{{"id": {}, "image_id": {id}, "category_id": {}, "bbox": [4, 4, 16, 8]}}"#,
                100 + id,
                1 + id % 2
            )
        })
        .collect();

    format!(
        r#"{{"images": [{}], "annotations": [{}], "categories": [{{"id": 1, "name": "ripe"}}, {{"id": 2, "name": "unripe"}}]}}"#,
        images.join(", "),
        annotations.join(", ")
    )
}

/// Write one BMP per `img_<id>.bmp` referenced by [`pool_document`].
pub fn write_pool_images(dir: &Path, count: u64) {
    for id in 1..=count {
        write_bmp(&dir.join(format!("img_{id}.bmp")), 64, 48);
    }
}

/// Write placeholder image files for the given names.
pub fn touch_images(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).expect("create image dir");
    for name in names {
        fs::write(dir.join(name), name.as_bytes()).expect("write image");
    }
}

/// Every file under `root` with its bytes, keyed by relative path.
pub fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    collect(root, root, &mut files);
    files.sort();
    files
}

fn collect(root: &Path, dir: &Path, files: &mut Vec<(String, Vec<u8>)>) {
    for entry in fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path
                .strip_prefix(root)
                .expect("relative path")
                .to_string_lossy()
                .replace('\\', "/");
            files.push((rel, fs::read(&path).expect("read file")));
        }
    }
}
