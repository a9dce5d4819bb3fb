use tracing::info;

use crate::error::MarkupError;
use crate::model::stroke::{OwnerId, Stroke};
use crate::raster::BaseImage;
use crate::store::owners::OwnerNamespace;

/// Editing state for one base image: the image, every reviewer's strokes, and
/// which reviewer is currently drawing.
///
/// Only the active reviewer's list is ever mutated through the session.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    roster: Vec<OwnerId>,
    active: OwnerId,
    base: Option<BaseImage>,
    owners: OwnerNamespace,
}

impl AnnotationSession {
    /// `roster` fixes the reviewer order used for team export. It must not be empty.
    pub fn new(roster: Vec<OwnerId>) -> crate::error::Result<Self> {
        let active = roster
            .first()
            .cloned()
            .ok_or_else(|| MarkupError::config("session roster cannot be empty"))?;
        Ok(Self {
            roster,
            active,
            base: None,
            owners: OwnerNamespace::new(),
        })
    }

    /// Replaces the base image. All strokes are discarded and the first roster
    /// entry becomes active again.
    pub fn load_base_image(&mut self, image: BaseImage) {
        info!(
            width = image.width(),
            height = image.height(),
            "loaded base image, resetting strokes"
        );
        self.base = Some(image);
        self.owners.reset();
        self.active = self.roster[0].clone();
    }

    pub fn base_image(&self) -> Option<&BaseImage> {
        self.base.as_ref()
    }

    pub fn roster(&self) -> &[OwnerId] {
        &self.roster
    }

    pub fn active(&self) -> &OwnerId {
        &self.active
    }

    pub fn set_active(&mut self, owner: &OwnerId) -> crate::error::Result<()> {
        if !self.roster.contains(owner) {
            return Err(MarkupError::store(format!(
                "'{owner}' is not on the session roster"
            )));
        }
        self.active = owner.clone();
        Ok(())
    }

    /// Commits a finished gesture to the active reviewer. See
    /// [`OwnerNamespace::add_stroke`] for when strokes are dropped.
    pub fn commit_stroke(&mut self, stroke: Stroke) -> bool {
        let active = self.active.clone();
        self.owners.add_stroke(&active, stroke)
    }

    pub fn undo_last(&mut self) -> Option<Stroke> {
        let active = self.active.clone();
        self.owners.undo_last(&active)
    }

    pub fn clear_active(&mut self) {
        let active = self.active.clone();
        self.owners.clear_strokes(&active);
    }

    pub fn owners(&self) -> &OwnerNamespace {
        &self.owners
    }
}
