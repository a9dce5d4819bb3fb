use std::path::Path;
use std::sync::Arc;

use fontdb::{Database, Family, Query};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::MarkupError;

/// A loaded font face. Clones share the font bytes.
#[derive(Debug, Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    family: String,
    digest: String,
}

impl FontFace {
    /// フォントファイルを読み込み、先頭のフェイスを検証する。
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            MarkupError::font(format!("failed to read font {}: {e}", path.display()))
        })?;
        let family = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(data, 0, family)
    }

    pub fn from_bytes(data: Vec<u8>, index: u32, family: String) -> crate::error::Result<Self> {
        ttf_parser::Face::parse(&data, index)
            .map_err(|e| MarkupError::font(format!("invalid font '{family}': {e}")))?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        hasher.update(index.to_le_bytes());
        let digest = hex::encode(hasher.finalize());
        Ok(Self {
            data: Arc::new(data),
            index,
            family,
            digest,
        })
    }

    /// 明示パスがあればそれを、なければシステムの sans-serif を探す。
    ///
    /// An explicit path that cannot be loaded is an error; a missing system
    /// font is not, and yields `Ok(None)`.
    pub fn resolve(font_path: Option<&Path>) -> crate::error::Result<Option<Self>> {
        if let Some(path) = font_path {
            let face = Self::from_file(path)?;
            debug!(family = %face.family, path = %path.display(), "loaded font");
            return Ok(Some(face));
        }

        let mut db = Database::new();
        db.load_system_fonts();
        let query = Query {
            families: &[Family::SansSerif, Family::Name("DejaVu Sans"), Family::Name("Arial")],
            ..Query::default()
        };
        let Some(id) = db.query(&query) else {
            warn!("no system sans-serif font found, text will be skipped");
            return Ok(None);
        };
        let family = db
            .face(id)
            .and_then(|info| info.families.first().map(|(name, _)| name.clone()))
            .unwrap_or_default();
        let loaded = db.with_face_data(id, |data, index| (data.to_vec(), index));
        match loaded {
            Some((data, index)) => {
                let face = Self::from_bytes(data, index, family)?;
                debug!(family = %face.family, "resolved system font");
                Ok(Some(face))
            }
            None => {
                warn!(family = %family, "system font data unavailable, text will be skipped");
                Ok(None)
            }
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Hex SHA-256 over the font bytes and face index.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Parses the face. Validated at construction, so this only fails on
    /// corrupted shared data.
    pub(crate) fn face(&self) -> crate::error::Result<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index)
            .map_err(|e| MarkupError::font(format!("invalid font '{}': {e}", self.family)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_font_is_font_error() {
        let err = FontFace::resolve(Some(Path::new("/nonexistent/font.ttf"))).expect_err("missing");
        assert_eq!(err.kind(), crate::error::ErrorKind::Font);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = FontFace::from_bytes(vec![0u8; 16], 0, "junk".into()).expect_err("junk");
        assert!(err.to_string().contains("junk"));
    }
}
