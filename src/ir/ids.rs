//! Newtype IDs for COCO records.
//!
//! COCO documents reuse plain integers for image, annotation and category ids.
//! Wrapping each kind keeps an `image_id` from being looked up in the category
//! table by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! coco_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

coco_id!(
    /// Identifier of an entry in a document's `images` array.
    ImageId
);
coco_id!(
    /// Identifier of an entry in a document's `annotations` array.
    AnnotationId
);
coco_id!(
    /// Identifier of an entry in a document's `categories` array.
    ///
    /// Category ids are arbitrary and may be sparse; see
    /// [`ClassMap`](super::ClassMap) for the contiguous class index.
    CategoryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_numerically() {
        assert!(ImageId(2) < ImageId(10));
        assert!(CategoryId(7) > CategoryId(5));
    }

    #[test]
    fn debug_names_the_kind() {
        assert_eq!(format!("{:?}", AnnotationId(3)), "AnnotationId(3)");
        assert_eq!(ImageId::from(4).to_string(), "4");
    }
}
