// image crate: RGB/RGBA → JPEG/PNG bytes, and atomic file output

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use image::{RgbImage, RgbaImage};
use tracing::debug;

use crate::error::MarkupError;

/// Encode an RGB image to JPEG bytes at `quality` (1-100).
pub fn encode_jpeg(rgb: &RgbImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(MarkupError::encode(format!(
            "JPEG quality must be 1-100, got {quality}"
        )));
    }
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(MarkupError::encode("cannot encode an empty image as JPEG"));
    }
    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| MarkupError::encode(format!("JPEG: {e}")))?;
    Ok(buf.into_inner())
}

pub fn encode_png(rgba: &RgbaImage) -> crate::error::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    rgba.write_with_encoder(encoder)
        .map_err(|e| MarkupError::encode(format!("PNG: {e}")))?;
    Ok(buf.into_inner())
}

/// Writes `bytes` to `path` so that readers never observe a partial file.
///
/// Data goes to `.<name>.partial` in the same directory and is renamed into
/// place once flushed; on any failure the partial file is removed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> crate::error::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| MarkupError::encode(format!("not a file path: {}", path.display())))?;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir)?;
    }
    let partial = path.with_file_name(format!(".{}.partial", file_name.to_string_lossy()));

    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&partial)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&partial, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(MarkupError::encode(format!(
            "failed to write {}: {e}",
            path.display()
        )));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_quality_out_of_range() {
        let img = RgbImage::new(2, 2);
        assert!(encode_jpeg(&img, 0).is_err());
        assert!(encode_jpeg(&img, 101).is_err());
        assert!(encode_jpeg(&img, 85).is_ok());
    }

    #[test]
    fn test_jpeg_empty_image_is_encode_error() {
        let img = RgbImage::new(0, 0);
        let err = encode_jpeg(&img, 85).expect_err("empty");
        assert_eq!(err.kind(), crate::error::ErrorKind::Encode);
    }
}
