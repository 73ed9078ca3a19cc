//! Typed COCO/YOLO records and the pure conversion pieces.
//!
//! Nothing in this module touches the filesystem except the explicit
//! read/write functions in [`io_coco_json`] and [`io_yolo`]; the codec and the
//! class map are pure and can be shared freely.
//!
//! # Example
//!
//! ```
//! use cocosplit::ir::{codec, BBoxXYWH, CategoryId, ClassMap, Pixel};
//!
//! let classes = ClassMap::from_categories([(CategoryId(7), "unripe"), (CategoryId(5), "ripe")]);
//! assert_eq!(classes.class_index(CategoryId(7)), Some(1));
//!
//! let bbox = BBoxXYWH::<Pixel>::new(10.0, 10.0, 20.0, 10.0);
//! let yolo = codec::encode(&bbox, 100, 50).unwrap();
//! assert!((yolo.cx - 0.2).abs() < 1e-12);
//! ```

mod bbox;
mod class_map;
pub mod codec;
mod ids;
pub mod io_coco_json;
pub mod io_yolo;
mod model;
mod space;

pub use bbox::{BBoxCXCYWH, BBoxXYWH};
pub use class_map::ClassMap;
pub use codec::{BoxPolicy, Rejection};
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{Annotation, Category, CocoDocument, DocumentIndex, Image};
pub use space::{Normalized, Pixel};
