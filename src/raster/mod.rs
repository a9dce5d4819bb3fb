pub mod compositor;
pub mod marks;
pub mod pixmap;

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use sha2::{Digest, Sha256};

use crate::error::MarkupError;

/// The decoded image reviewers annotate. Immutable once loaded; clones share
/// the pixel buffer.
#[derive(Debug, Clone)]
pub struct BaseImage {
    pixels: Arc<RgbaImage>,
    /// SHA-256 of the source bytes (or of the raw pixels), hex encoded.
    digest: String,
}

impl BaseImage {
    /// Decodes PNG/JPEG/... bytes.
    ///
    /// Malformed input is a [`MarkupError::DecodeError`]; images beyond the
    /// decoder's allocation limits are [`MarkupError::ResourceExhausted`].
    pub fn decode(bytes: &[u8]) -> crate::error::Result<Self> {
        let decoded = image::load_from_memory(bytes).map_err(|e| match e {
            image::ImageError::Limits(_) => MarkupError::resource_exhausted(e.to_string()),
            other => MarkupError::decode(other.to_string()),
        })?;
        let pixels = decoded.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(MarkupError::decode("image has zero width or height"));
        }
        Ok(Self {
            pixels: Arc::new(pixels),
            digest: hex::encode(Sha256::digest(bytes)),
        })
    }

    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            MarkupError::decode(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::decode(&bytes)
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(pixels.width().to_le_bytes());
        hasher.update(pixels.height().to_le_bytes());
        hasher.update(pixels.as_raw());
        Self {
            pixels: Arc::new(pixels),
            digest: hex::encode(hasher.finalize()),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}
