//! Resolution-independent coordinate spaces.
//!
//! Strokes are captured in normalized space (`0..=1` of the base image size),
//! marks in percentage space (`0..=100`). Everything that touches pixels goes
//! through [`to_pixel`] or [`percent_to_pixel`] so geometry stays correct at any
//! zoom level or export resolution.

use serde::{Deserialize, Serialize};

/// A point normalized to the base image's width/height.
///
/// Both constructors and deserialization clamp into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPoint")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// 入力そのまま（範囲外を含む）
#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

impl From<RawPoint> for Point {
    fn from(raw: RawPoint) -> Self {
        Point::new(raw.x, raw.y)
    }
}

impl Point {
    /// Clamps both components into `[0, 1]`. Non-finite values become `0`.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    /// Normalizes a position measured on a surface of `width × height`
    /// (e.g. a zoomed on-screen canvas) and clamps it.
    pub fn from_surface(px: f64, py: f64, width: f64, height: f64) -> Self {
        if width <= 0.0 || height <= 0.0 {
            return Self::new(0.0, 0.0);
        }
        Self::new(px / width, py / height)
    }
}

/// A point in percentage space, as used by marks. Not clamped: marks may sit
/// partly outside the image and the region extractor clamps afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

/// A position in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

/// `(x * W, y * H)`
pub fn to_pixel(p: Point, target_width: f64, target_height: f64) -> PixelPoint {
    PixelPoint {
        x: p.x * target_width,
        y: p.y * target_height,
    }
}

/// `(x / 100 * W, y / 100 * H)`
pub fn percent_to_pixel(p: PercentPoint, target_width: f64, target_height: f64) -> PixelPoint {
    PixelPoint {
        x: p.x / 100.0 * target_width,
        y: p.y / 100.0 * target_height,
    }
}

impl From<Point> for PercentPoint {
    fn from(p: Point) -> Self {
        PercentPoint {
            x: p.x * 100.0,
            y: p.y * 100.0,
        }
    }
}
