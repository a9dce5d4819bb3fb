// JSON interchange format for annotation records handed over by the external store.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::mark::{CollectionId, Mark, Selection, Vote};
use crate::model::stroke::{OwnerId, Stroke};
use crate::store::marks::MarkStore;
use crate::store::owners::OwnerNamespace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: CollectionId,
    pub title: String,
}

/// Everything recorded against one base image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationBundle {
    pub collection: CollectionInfo,
    /// Reviewer order for team export. Defaults to the owners found in `strokes`.
    #[serde(default)]
    pub roster: Vec<OwnerId>,
    #[serde(default)]
    pub strokes: BTreeMap<OwnerId, Vec<Stroke>>,
    #[serde(default)]
    pub marks: Vec<Mark>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default)]
    pub selections: Vec<Selection>,
}

/// Bundle contents turned into live stores.
pub struct LoadedBundle {
    pub collection: CollectionInfo,
    pub roster: Vec<OwnerId>,
    pub owners: OwnerNamespace,
    pub marks: MarkStore,
}

impl AnnotationBundle {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            crate::error::MarkupError::config(format!("Failed to parse annotation bundle: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn load(self) -> crate::error::Result<LoadedBundle> {
        let roster = if self.roster.is_empty() {
            self.strokes.keys().cloned().collect()
        } else {
            self.roster
        };

        let mut owners = OwnerNamespace::new();
        for (owner, strokes) in self.strokes {
            for (i, stroke) in strokes.into_iter().enumerate() {
                if !owners.add_stroke(&owner, stroke) {
                    warn!(owner = %owner, index = i, "skipping stroke with fewer than two points");
                }
            }
        }

        let marks = MarkStore::from_records(self.marks, self.votes, self.selections)?;

        Ok(LoadedBundle {
            collection: self.collection,
            roster,
            owners,
            marks,
        })
    }
}
