//! Crop rectangles around marks, for the selection report.
//!
//! Every crop is centred on the mark and expanded for context, then clamped
//! so that it always lies inside the image. A crop that clamps down to zero
//! area is still a valid result.

use image::{RgbaImage, imageops};
use serde::Deserialize;
use tracing::debug;

use crate::model::mark::MarkShape;

/// Context expansion factors.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CropFactors {
    /// Crop side as a multiple of the circle radius.
    pub circle_context: f64,
    /// Crop size as a multiple of the rectangle size.
    pub rectangle_context: f64,
    /// Crop size for ticks and paths, as a fraction of the image size.
    pub fallback_fraction: f64,
}

impl Default for CropFactors {
    fn default() -> Self {
        Self {
            circle_context: 4.0,
            rectangle_context: 1.5,
            fallback_fraction: 0.2,
        }
    }
}

/// A crop in (fractional) image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A crop snapped to whole pixels. Always inside the image it was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The expanded, unclamped crop around `shape`. `None` for a path with no points.
pub fn raw_crop(
    shape: &MarkShape,
    image_width: f64,
    image_height: f64,
    factors: &CropFactors,
) -> Option<CropRect> {
    let (cx, cy, w, h) = match shape {
        MarkShape::Circle { x, y, radius } => {
            let r = radius / 100.0 * image_width;
            let side = r * factors.circle_context;
            (*x, *y, side, side)
        }
        MarkShape::Rectangle {
            x,
            y,
            width,
            height,
        } => (
            *x,
            *y,
            width / 100.0 * image_width * factors.rectangle_context,
            height / 100.0 * image_height * factors.rectangle_context,
        ),
        MarkShape::Tick { .. } | MarkShape::Path { .. } => {
            let anchor = shape.anchor()?;
            (
                anchor.x,
                anchor.y,
                image_width * factors.fallback_fraction,
                image_height * factors.fallback_fraction,
            )
        }
    };
    Some(CropRect {
        x: cx / 100.0 * image_width - w / 2.0,
        y: cy / 100.0 * image_height - h / 2.0,
        width: w,
        height: h,
    })
}

fn non_negative(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.max(0.0) }
}

/// Clamps a crop into `[0, image_width] × [0, image_height]`.
///
/// `x = max(0, x)`, `width = min(image_width - x, width)`, likewise for y.
/// Non-finite or negative components collapse to zero.
pub fn clamp_crop(rect: CropRect, image_width: f64, image_height: f64) -> CropRect {
    let x = non_negative(rect.x).min(image_width);
    let y = non_negative(rect.y).min(image_height);
    CropRect {
        x,
        y,
        width: non_negative(rect.width).min(image_width - x),
        height: non_negative(rect.height).min(image_height - y),
    }
}

/// [`raw_crop`] followed by [`clamp_crop`].
pub fn crop_rect(
    shape: &MarkShape,
    image_width: f64,
    image_height: f64,
    factors: &CropFactors,
) -> Option<CropRect> {
    raw_crop(shape, image_width, image_height, factors)
        .map(|r| clamp_crop(r, image_width, image_height))
}

/// Snaps a clamped crop to whole pixels without leaving the image.
pub fn to_pixels(rect: CropRect, image_width: u32, image_height: u32) -> PixelRect {
    let x = (rect.x.floor() as u32).min(image_width);
    let y = (rect.y.floor() as u32).min(image_height);
    let width = (rect.width.round() as u32).min(image_width - x);
    let height = (rect.height.round() as u32).min(image_height - y);
    PixelRect {
        x,
        y,
        width,
        height,
    }
}

/// Copies the pixels under `rect`. An empty rect yields a 0×0 image.
pub fn crop_image(image: &RgbaImage, rect: PixelRect) -> RgbaImage {
    if rect.is_empty() {
        return RgbaImage::new(0, 0);
    }
    imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Crop rectangle and pixels for one mark on `image`.
pub fn extract_region(
    image: &RgbaImage,
    shape: &MarkShape,
    factors: &CropFactors,
) -> Option<(PixelRect, RgbaImage)> {
    let (w, h) = (image.width(), image.height());
    let rect = crop_rect(shape, w as f64, h as f64, factors)?;
    let px = to_pixels(rect, w, h);
    debug!(kind = shape.kind(), ?px, "extracted mark region");
    Some((px, crop_image(image, px)))
}
