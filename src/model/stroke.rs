use std::fmt;

use serde::{Deserialize, Serialize};

use super::Rgb;
use super::coords::Point;

/// Identity of a reviewer owning a layer of strokes or a set of marks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A freehand polyline. Caps and joins are always round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: Rgb,
    /// Line weight in base-image pixels; scaled with the render target.
    pub width: f64,
    #[serde(rename = "isEraser", default)]
    pub is_eraser: bool,
}

impl Stroke {
    pub fn pen(points: Vec<Point>, color: Rgb, width: f64) -> Self {
        Self {
            points,
            color,
            width,
            is_eraser: false,
        }
    }

    pub fn eraser(points: Vec<Point>, width: f64) -> Self {
        Self {
            points,
            color: Rgb::WHITE,
            width,
            is_eraser: true,
        }
    }

    /// A stroke needs at least two points and a positive width to produce pixels.
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2 && self.width.is_finite() && self.width > 0.0
    }
}
