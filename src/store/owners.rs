use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::model::stroke::{OwnerId, Stroke};

/// An immutable snapshot of one owner's strokes, oldest first.
pub type Layer = Arc<Vec<Stroke>>;

/// Per-reviewer stroke lists.
///
/// Each owner's list is only touched through that owner's key. Lists are
/// copy-on-write: a [`Layer`] handed out by [`OwnerNamespace::layer`] keeps
/// its contents even if the owner keeps drawing.
#[derive(Debug, Clone, Default)]
pub struct OwnerNamespace {
    layers: BTreeMap<OwnerId, Layer>,
}

impl OwnerNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stroke to `owner`'s list.
    ///
    /// Strokes that cannot render (fewer than two points) are dropped and
    /// `false` is returned.
    pub fn add_stroke(&mut self, owner: &OwnerId, stroke: Stroke) -> bool {
        if !stroke.is_renderable() {
            debug!(owner = %owner, points = stroke.points.len(), "dropping unrenderable stroke");
            return false;
        }
        let layer = self.layers.entry(owner.clone()).or_default();
        Arc::make_mut(layer).push(stroke);
        true
    }

    /// Removes every stroke of `owner`. Other owners are untouched.
    pub fn clear_strokes(&mut self, owner: &OwnerId) {
        if let Some(layer) = self.layers.get_mut(owner) {
            *layer = Arc::new(Vec::new());
        }
    }

    /// Removes and returns `owner`'s most recent stroke.
    pub fn undo_last(&mut self, owner: &OwnerId) -> Option<Stroke> {
        let layer = self.layers.get_mut(owner)?;
        Arc::make_mut(layer).pop()
    }

    /// Snapshot of `owner`'s strokes; empty if the owner never drew.
    pub fn layer(&self, owner: &OwnerId) -> Layer {
        self.layers.get(owner).cloned().unwrap_or_default()
    }

    pub fn stroke_count(&self, owner: &OwnerId) -> usize {
        self.layers.get(owner).map_or(0, |l| l.len())
    }

    /// Owners that have (or had) a list, in id order.
    pub fn owners(&self) -> impl Iterator<Item = &OwnerId> {
        self.layers.keys()
    }

    /// Snapshots for `roster`, in roster order. Owners without strokes get an
    /// empty layer.
    pub fn layers_for(&self, roster: &[OwnerId]) -> Vec<(OwnerId, Layer)> {
        roster.iter().map(|o| (o.clone(), self.layer(o))).collect()
    }

    pub fn reset(&mut self) {
        self.layers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rgb;
    use crate::model::coords::Point;

    fn line() -> Stroke {
        Stroke::pen(vec![Point::new(0.1, 0.1), Point::new(0.9, 0.9)], Rgb::BLACK, 4.0)
    }

    #[test]
    fn test_snapshot_survives_later_edits() {
        let mut ns = OwnerNamespace::new();
        let a = OwnerId::from("User 1");
        ns.add_stroke(&a, line());
        let snapshot = ns.layer(&a);
        ns.add_stroke(&a, line());
        ns.clear_strokes(&a);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(ns.stroke_count(&a), 0);
    }

    #[test]
    fn test_single_point_stroke_dropped() {
        let mut ns = OwnerNamespace::new();
        let a = OwnerId::from("User 1");
        let dot = Stroke::pen(vec![Point::new(0.5, 0.5)], Rgb::BLACK, 4.0);
        assert!(!ns.add_stroke(&a, dot));
        assert_eq!(ns.stroke_count(&a), 0);
    }
}
