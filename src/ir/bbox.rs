//! Bounding box types for the two layouts this crate deals with.
//!
//! COCO stores a box as its top-left corner plus size, in pixels
//! ([`BBoxXYWH<Pixel>`]). YOLO stores the box center plus size, normalized by
//! the image dimensions ([`BBoxCXCYWH<Normalized>`]). The
//! [`codec`](super::codec) module converts between the two.

use std::marker::PhantomData;

use serde::{Serialize, Serializer};

/// An axis-aligned box as top-left corner plus width and height.
///
/// Construction does not validate anything: a negative width or a NaN
/// coordinate can be represented so that the codec can reject it with a
/// reason instead of the loader failing.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYWH<TSpace> {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYWH<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            _space: PhantomData,
        }
    }

    /// Right edge (`x + w`).
    #[inline]
    pub fn xmax(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge (`y + h`).
    #[inline]
    pub fn ymax(&self) -> f64 {
        self.y + self.h
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.w, self.h]
    }
}

impl<TSpace> From<[f64; 4]> for BBoxXYWH<TSpace> {
    fn from([x, y, w, h]: [f64; 4]) -> Self {
        Self::new(x, y, w, h)
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYWH")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("w", &self.w)
            .field("h", &self.h)
            .finish()
    }
}

// COCO writes boxes as a bare `[x, y, w, h]` array.
impl<TSpace> Serialize for BBoxXYWH<TSpace> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

/// An axis-aligned box as center point plus width and height.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxCXCYWH<TSpace> {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxCXCYWH<TSpace> {
    #[inline]
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            cx,
            cy,
            w,
            h,
            _space: PhantomData,
        }
    }
}

impl<TSpace> std::fmt::Debug for BBoxCXCYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxCXCYWH")
            .field("cx", &self.cx)
            .field("cy", &self.cy)
            .field("w", &self.w)
            .field("h", &self.h)
            .finish()
    }
}
