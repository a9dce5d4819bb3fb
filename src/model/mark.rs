use std::fmt;

use serde::{Deserialize, Serialize};

use super::Rgb;
use super::coords::PercentPoint;
use super::stroke::OwnerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkId(pub u64);

impl fmt::Display for MarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionId(pub u64);

/// A base image that marks are placed on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub String);

impl From<&str> for CollectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Mark geometry in percentage coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MarkShape {
    Tick {
        x: f64,
        y: f64,
    },
    Circle {
        x: f64,
        y: f64,
        /// Percent of image width.
        radius: f64,
    },
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Path {
        points: Vec<PercentPoint>,
    },
}

impl MarkShape {
    /// The point a mark is centred on: `points[0]` for a path, `(x, y)` otherwise.
    /// `None` for a path without points.
    pub fn anchor(&self) -> Option<PercentPoint> {
        match self {
            MarkShape::Tick { x, y }
            | MarkShape::Circle { x, y, .. }
            | MarkShape::Rectangle { x, y, .. } => Some(PercentPoint { x: *x, y: *y }),
            MarkShape::Path { points } => points.first().copied(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MarkShape::Tick { .. } => "tick",
            MarkShape::Circle { .. } => "circle",
            MarkShape::Rectangle { .. } => "rectangle",
            MarkShape::Path { .. } => "path",
        }
    }
}

/// A mark before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDraft {
    pub owner: OwnerId,
    #[serde(flatten)]
    pub shape: MarkShape,
    pub color: Rgb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub id: MarkId,
    pub collection: CollectionId,
    pub owner: OwnerId,
    #[serde(flatten)]
    pub shape: MarkShape,
    pub color: Rgb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub mark: MarkId,
    pub voter: OwnerId,
}

/// An admin's pick of a mark for the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub id: SelectionId,
    pub mark: MarkId,
    pub collection: CollectionId,
    pub selected_by: OwnerId,
}

/// Derived view of a mark with its votes, relative to one viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkWithVotes {
    pub mark: Mark,
    pub vote_count: usize,
    pub voters: Vec<OwnerId>,
    pub has_viewer_voted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_json_uses_flat_type_tag() {
        let json = r##"{"id":3,"collection":"c1","owner":"User 1","type":"circle","x":50,"y":40,"radius":10,"color":"#FF0000"}"##;
        let mark: Mark = serde_json::from_str(json).expect("parse mark");
        assert_eq!(
            mark.shape,
            MarkShape::Circle {
                x: 50.0,
                y: 40.0,
                radius: 10.0
            }
        );
        assert_eq!(mark.notes, None);
    }

    #[test]
    fn test_path_anchor_is_first_point() {
        let shape = MarkShape::Path {
            points: vec![PercentPoint { x: 10.0, y: 20.0 }, PercentPoint { x: 30.0, y: 40.0 }],
        };
        assert_eq!(shape.anchor(), Some(PercentPoint { x: 10.0, y: 20.0 }));
        assert_eq!(MarkShape::Path { points: vec![] }.anchor(), None);
    }
}
