//! COCO JSON loader and writer.
//!
//! # Loading
//!
//! Annotation tools are loose about types: ids show up as `5`, `5.0` or
//! `"5"`, file names occasionally as bare numbers. The loader therefore reads
//! the document as untyped JSON first and coerces each field to its declared
//! type. A field that is missing or cannot be coerced fails the whole load
//! with [`CocosplitError::MalformedAnnotation`], naming the record kind, its
//! position in the array and the field.
//!
//! Missing top-level arrays are read as empty. Fields the pipeline does not
//! interpret are kept on each record so subsets can be written back intact.
//!
//! After parsing, referential integrity is checked: image ids must be unique
//! and every annotation must point at an image of the same document.
//!
//! # Writing
//!
//! Subsets are written pretty-printed with a four-space indent, records in
//! the order they are held in memory.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use super::model::{Annotation, Category, CocoDocument, Image};
use super::{AnnotationId, BBoxXYWH, CategoryId, ImageId};
use crate::error::CocosplitError;

const IN_MEMORY_ORIGIN: &str = "<memory>";

/// Reads and checks a COCO JSON document.
///
/// # Errors
/// I/O failures, invalid JSON, malformed records, duplicate image ids and
/// annotations that reference a missing image.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use cocosplit::ir::io_coco_json::read_coco_json;
///
/// let doc = read_coco_json(Path::new("annotations/train.json"))?;
/// println!("{} images", doc.images.len());
/// # Ok::<(), cocosplit::CocosplitError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<CocoDocument, CocosplitError> {
    let file = File::open(path).map_err(CocosplitError::Io)?;
    let reader = BufReader::new(file);

    let raw: Value =
        serde_json::from_reader(reader).map_err(|source| CocosplitError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    value_to_document(raw, path)
}

/// Parses a COCO document held in memory.
pub fn from_coco_str(json: &str) -> Result<CocoDocument, CocosplitError> {
    from_coco_slice(json.as_bytes())
}

/// Parses a COCO document from raw bytes.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoDocument, CocosplitError> {
    let origin = Path::new(IN_MEMORY_ORIGIN);
    let raw: Value =
        serde_json::from_slice(bytes).map_err(|source| CocosplitError::CocoJsonParse {
            path: origin.to_path_buf(),
            source,
        })?;
    value_to_document(raw, origin)
}

/// Writes a document to `path`, replacing any existing file.
pub fn write_coco_json(path: &Path, doc: &CocoDocument) -> Result<(), CocosplitError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(CocosplitError::Io)?;
    }
    let file = File::create(path).map_err(CocosplitError::Io)?;
    let mut writer = BufWriter::new(file);

    let mut ser =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    doc.serialize(&mut ser)
        .map_err(|source| CocosplitError::CocoJsonWrite {
            path: path.to_path_buf(),
            source,
        })?;

    writer.flush().map_err(CocosplitError::Io)
}

/// Serializes a document the same way [`write_coco_json`] does.
pub fn to_coco_string(doc: &CocoDocument) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    doc.serialize(&mut ser)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ============================================================================
// Untyped JSON -> document
// ============================================================================

fn value_to_document(raw: Value, path: &Path) -> Result<CocoDocument, CocosplitError> {
    let Value::Object(mut root) = raw else {
        return Err(malformed(path, "document", 0, "<root>", "must be a JSON object"));
    };

    let images = take_array(&mut root, "images", path)?
        .into_iter()
        .enumerate()
        .map(|(index, value)| parse_image(value, index, path))
        .collect::<Result<Vec<_>, _>>()?;

    let annotations = take_array(&mut root, "annotations", path)?
        .into_iter()
        .enumerate()
        .map(|(index, value)| parse_annotation(value, index, path))
        .collect::<Result<Vec<_>, _>>()?;

    let categories = take_array(&mut root, "categories", path)?
        .into_iter()
        .enumerate()
        .map(|(index, value)| parse_category(value, index, path))
        .collect::<Result<Vec<_>, _>>()?;

    let doc = CocoDocument {
        images,
        annotations,
        categories,
        extra: root,
    };
    check_integrity(&doc, path)?;

    Ok(doc)
}

fn take_array(
    root: &mut Map<String, Value>,
    key: &'static str,
    path: &Path,
) -> Result<Vec<Value>, CocosplitError> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(malformed(path, "document", 0, key, "must be an array")),
    }
}

/// Borrowed context for pulling typed fields out of one record.
struct RecordFields<'p> {
    map: Map<String, Value>,
    kind: &'static str,
    index: usize,
    path: &'p Path,
}

impl<'p> RecordFields<'p> {
    fn new(
        value: Value,
        kind: &'static str,
        index: usize,
        path: &'p Path,
    ) -> Result<Self, CocosplitError> {
        match value {
            Value::Object(map) => Ok(Self {
                map,
                kind,
                index,
                path,
            }),
            _ => Err(malformed(path, kind, index, "<record>", "must be a JSON object")),
        }
    }

    fn take(&mut self, field: &'static str) -> Result<Value, CocosplitError> {
        match self.map.remove(field) {
            None | Some(Value::Null) => Err(self.error(field, "is missing")),
            Some(value) => Ok(value),
        }
    }

    fn take_u64(&mut self, field: &'static str) -> Result<u64, CocosplitError> {
        let value = self.take(field)?;
        coerce_u64(&value).ok_or_else(|| {
            self.error(field, &format!("expected a non-negative integer, found {value}"))
        })
    }

    fn take_dimension(&mut self, field: &'static str) -> Result<u32, CocosplitError> {
        let value = self.take(field)?;
        coerce_u64(&value)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| self.error(field, &format!("expected a positive integer, found {value}")))
    }

    fn take_string(&mut self, field: &'static str) -> Result<String, CocosplitError> {
        let value = self.take(field)?;
        match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(self.error(field, &format!("expected a string, found {other}"))),
        }
    }

    /// A non-empty path that stays below the directory it is joined onto.
    fn take_relative_path(&mut self, field: &'static str) -> Result<String, CocosplitError> {
        let raw = self.take_string(field)?;
        let mut normal = 0;
        for component in Path::new(&raw).components() {
            match component {
                Component::Normal(_) => normal += 1,
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(self.error(
                        field,
                        &format!("expected a relative path without '..', found {raw:?}"),
                    ));
                }
            }
        }
        if normal == 0 {
            return Err(self.error(field, &format!("expected a file path, found {raw:?}")));
        }
        Ok(raw)
    }

    fn take_bbox(&mut self, field: &'static str) -> Result<[f64; 4], CocosplitError> {
        let value = self.take(field)?;
        let parsed = match &value {
            Value::Array(items) if items.len() == 4 => items
                .iter()
                .map(coerce_f64)
                .collect::<Option<Vec<f64>>>()
                .map(|v| [v[0], v[1], v[2], v[3]]),
            _ => None,
        };
        parsed.ok_or_else(|| {
            self.error(field, &format!("expected [x, y, width, height], found {value}"))
        })
    }

    fn error(&self, field: &'static str, message: &str) -> CocosplitError {
        malformed(self.path, self.kind, self.index, field, message)
    }

    fn into_extra(self) -> Map<String, Value> {
        self.map
    }
}

fn parse_image(value: Value, index: usize, path: &Path) -> Result<Image, CocosplitError> {
    let mut fields = RecordFields::new(value, "image", index, path)?;
    let id = ImageId::new(fields.take_u64("id")?);
    let file_name = fields.take_relative_path("file_name")?;
    let width = fields.take_dimension("width")?;
    let height = fields.take_dimension("height")?;

    Ok(Image {
        id,
        file_name,
        width,
        height,
        extra: fields.into_extra(),
    })
}

fn parse_annotation(
    value: Value,
    index: usize,
    path: &Path,
) -> Result<Annotation, CocosplitError> {
    let mut fields = RecordFields::new(value, "annotation", index, path)?;
    let id = AnnotationId::new(fields.take_u64("id")?);
    let image_id = ImageId::new(fields.take_u64("image_id")?);
    let category_id = CategoryId::new(fields.take_u64("category_id")?);
    let bbox = BBoxXYWH::from(fields.take_bbox("bbox")?);

    Ok(Annotation {
        id,
        image_id,
        category_id,
        bbox,
        extra: fields.into_extra(),
    })
}

fn parse_category(value: Value, index: usize, path: &Path) -> Result<Category, CocosplitError> {
    let mut fields = RecordFields::new(value, "category", index, path)?;
    let id = CategoryId::new(fields.take_u64("id")?);
    let name = fields.take_string("name")?;

    Ok(Category {
        id,
        name,
        extra: fields.into_extra(),
    })
}

fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn check_integrity(doc: &CocoDocument, path: &Path) -> Result<(), CocosplitError> {
    let mut image_ids: HashSet<ImageId> = HashSet::with_capacity(doc.images.len());
    for image in &doc.images {
        if !image_ids.insert(image.id) {
            return Err(CocosplitError::DuplicateImageId {
                path: path.to_path_buf(),
                id: image.id.as_u64(),
            });
        }
    }

    let mut category_ids: HashSet<CategoryId> = HashSet::with_capacity(doc.categories.len());
    for (index, category) in doc.categories.iter().enumerate() {
        if !category_ids.insert(category.id) {
            return Err(malformed(
                path,
                "category",
                index,
                "id",
                &format!("duplicates category id {}", category.id),
            ));
        }
    }

    if let Some(orphan) = doc
        .annotations
        .iter()
        .find(|ann| !image_ids.contains(&ann.image_id))
    {
        return Err(CocosplitError::MissingImageRef {
            path: path.to_path_buf(),
            annotation_id: orphan.id.as_u64(),
            image_id: orphan.image_id.as_u64(),
        });
    }

    Ok(())
}

fn malformed(
    path: &Path,
    kind: &'static str,
    index: usize,
    field: &'static str,
    message: &str,
) -> CocosplitError {
    CocosplitError::MalformedAnnotation {
        path: PathBuf::from(path),
        kind,
        index,
        field,
        message: message.to_string(),
    }
}
