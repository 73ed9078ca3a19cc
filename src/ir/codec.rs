//! Box codec: COCO pixel boxes to YOLO normalized boxes and back.
//!
//! Encoding computes
//!
//! ```text
//! cx = (x + w/2) / image_w     cy = (y + h/2) / image_h
//! w' = w / image_w             h' = h / image_h
//! ```
//!
//! and then applies a [`BoxPolicy`] for boxes that reach past the image
//! border. A box that cannot be represented is returned as a [`Rejection`];
//! callers drop the annotation and keep going.

use std::fmt;

use super::{BBoxCXCYWH, BBoxXYWH, Normalized, Pixel};

/// How far (in normalized units) a box may overhang the image before
/// [`BoxPolicy::Drop`] rejects it. Absorbs float noise from annotation tools.
pub const OUT_OF_BOUNDS_TOLERANCE: f64 = 1e-6;

/// Treatment of boxes that extend past the image border.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoxPolicy {
    /// Clamp every normalized component to `[0, 1]` and keep the box while the
    /// clamped width and height stay positive.
    #[default]
    Clamp,
    /// Intersect the box with the image rectangle, then encode what is visible.
    Clip,
    /// Reject any box that overhangs the image; in-bounds boxes are clamped.
    Drop,
}

impl BoxPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            BoxPolicy::Clamp => "clamp",
            BoxPolicy::Clip => "clip",
            BoxPolicy::Drop => "drop",
        }
    }
}

/// Why a box was not encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Zero or negative extent after normalization, or non-finite input.
    Degenerate,
    /// The box lies (partly, for [`BoxPolicy::Drop`]) outside the image.
    OutsideImage,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Degenerate => f.write_str("degenerate box"),
            Rejection::OutsideImage => f.write_str("box outside image"),
        }
    }
}

/// Encode with the reference [`BoxPolicy::Clamp`] behavior.
pub fn encode(
    bbox: &BBoxXYWH<Pixel>,
    image_w: u32,
    image_h: u32,
) -> Result<BBoxCXCYWH<Normalized>, Rejection> {
    encode_with_policy(bbox, image_w, image_h, BoxPolicy::Clamp)
}

/// Encode a pixel box for an `image_w` x `image_h` image under `policy`.
pub fn encode_with_policy(
    bbox: &BBoxXYWH<Pixel>,
    image_w: u32,
    image_h: u32,
    policy: BoxPolicy,
) -> Result<BBoxCXCYWH<Normalized>, Rejection> {
    if image_w == 0 || image_h == 0 || !bbox.is_finite() {
        return Err(Rejection::Degenerate);
    }
    let (iw, ih) = (image_w as f64, image_h as f64);

    match policy {
        BoxPolicy::Clamp => clamp_normalized(normalize(bbox, iw, ih)),
        BoxPolicy::Clip => {
            if bbox.w <= 0.0 || bbox.h <= 0.0 {
                return Err(Rejection::Degenerate);
            }
            let x0 = bbox.x.max(0.0);
            let y0 = bbox.y.max(0.0);
            let x1 = bbox.xmax().min(iw);
            let y1 = bbox.ymax().min(ih);
            if x1 <= x0 || y1 <= y0 {
                return Err(Rejection::OutsideImage);
            }
            let visible = BBoxXYWH::<Pixel>::new(x0, y0, x1 - x0, y1 - y0);
            clamp_normalized(normalize(&visible, iw, ih))
        }
        BoxPolicy::Drop => {
            let tol_x = OUT_OF_BOUNDS_TOLERANCE * iw;
            let tol_y = OUT_OF_BOUNDS_TOLERANCE * ih;
            let overhangs = bbox.x < -tol_x
                || bbox.y < -tol_y
                || bbox.xmax() > iw + tol_x
                || bbox.ymax() > ih + tol_y;
            if overhangs && bbox.w > 0.0 && bbox.h > 0.0 {
                return Err(Rejection::OutsideImage);
            }
            clamp_normalized(normalize(bbox, iw, ih))
        }
    }
}

/// Inverse of [`encode`] for boxes that were not clamped.
pub fn decode(bbox: &BBoxCXCYWH<Normalized>, image_w: u32, image_h: u32) -> BBoxXYWH<Pixel> {
    let (iw, ih) = (image_w as f64, image_h as f64);
    let w = bbox.w * iw;
    let h = bbox.h * ih;
    BBoxXYWH::new(bbox.cx * iw - w / 2.0, bbox.cy * ih - h / 2.0, w, h)
}

fn normalize(bbox: &BBoxXYWH<Pixel>, iw: f64, ih: f64) -> BBoxCXCYWH<Normalized> {
    BBoxCXCYWH::new(
        (bbox.x + bbox.w / 2.0) / iw,
        (bbox.y + bbox.h / 2.0) / ih,
        bbox.w / iw,
        bbox.h / ih,
    )
}

fn clamp_normalized(bbox: BBoxCXCYWH<Normalized>) -> Result<BBoxCXCYWH<Normalized>, Rejection> {
    let clamped = BBoxCXCYWH::new(
        bbox.cx.clamp(0.0, 1.0),
        bbox.cy.clamp(0.0, 1.0),
        bbox.w.clamp(0.0, 1.0),
        bbox.h.clamp(0.0, 1.0),
    );
    if clamped.w <= 0.0 || clamped.h <= 0.0 {
        return Err(Rejection::Degenerate);
    }
    Ok(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(x: f64, y: f64, w: f64, h: f64) -> BBoxXYWH<Pixel> {
        BBoxXYWH::new(x, y, w, h)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn encode_in_bounds_box() {
        let out = encode(&px(10.0, 10.0, 20.0, 10.0), 100, 50).expect("encodes");
        assert_close(out.cx, 0.2);
        assert_close(out.cy, 0.3);
        assert_close(out.w, 0.2);
        assert_close(out.h, 0.2);
    }

    #[test]
    fn clamp_keeps_oversized_box() {
        let out = encode(&px(0.0, 0.0, 400.0, 400.0), 200, 200).expect("clamped box kept");
        assert_eq!((out.cx, out.cy, out.w, out.h), (1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn zero_width_is_degenerate() {
        assert_eq!(
            encode(&px(5.0, 5.0, 0.0, 10.0), 100, 100),
            Err(Rejection::Degenerate)
        );
        assert_eq!(
            encode(&px(5.0, 5.0, -3.0, 10.0), 100, 100),
            Err(Rejection::Degenerate)
        );
    }

    #[test]
    fn nan_and_zero_sized_images_are_degenerate() {
        assert_eq!(
            encode(&px(f64::NAN, 5.0, 1.0, 1.0), 100, 100),
            Err(Rejection::Degenerate)
        );
        assert_eq!(
            encode(&px(5.0, 5.0, 1.0, 1.0), 0, 100),
            Err(Rejection::Degenerate)
        );
    }

    #[test]
    fn clip_encodes_visible_part() {
        let out = encode_with_policy(&px(-50.0, 0.0, 100.0, 100.0), 100, 100, BoxPolicy::Clip)
            .expect("visible part kept");
        assert_close(out.cx, 0.25);
        assert_close(out.cy, 0.5);
        assert_close(out.w, 0.5);
        assert_close(out.h, 1.0);
    }

    #[test]
    fn clip_rejects_fully_outside_box() {
        let result =
            encode_with_policy(&px(150.0, 0.0, 20.0, 20.0), 100, 100, BoxPolicy::Clip);
        assert_eq!(result, Err(Rejection::OutsideImage));
    }

    #[test]
    fn drop_rejects_overhang_but_tolerates_noise() {
        let overhang = encode_with_policy(&px(90.0, 0.0, 20.0, 20.0), 100, 100, BoxPolicy::Drop);
        assert_eq!(overhang, Err(Rejection::OutsideImage));

        let noisy = encode_with_policy(
            &px(0.0, 0.0, 100.00001, 50.0),
            100,
            100,
            BoxPolicy::Drop,
        );
        assert!(noisy.is_ok());
    }

    #[test]
    fn decode_inverts_encode() {
        let original = px(12.5, 40.0, 33.0, 17.25);
        let encoded = encode(&original, 640, 480).expect("encodes");
        let decoded = decode(&encoded, 640, 480);
        assert_close(decoded.x, original.x);
        assert_close(decoded.y, original.y);
        assert_close(decoded.w, original.w);
        assert_close(decoded.h, original.h);
    }
}
