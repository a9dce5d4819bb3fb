// Conversions between `image` buffers (straight alpha) and tiny-skia pixmaps
// (premultiplied alpha).

use image::{Rgb as RgbPixel, RgbImage, Rgba, RgbaImage};
use tiny_skia::{ColorU8, Pixmap};

use crate::error::MarkupError;
use crate::model::Rgb;

/// Upper bound on a single render buffer (16384 × 16384 pixels, 1 GiB RGBA).
pub const MAX_BUFFER_PIXELS: u64 = 16_384 * 16_384;

/// Allocates a transparent buffer.
///
/// Oversized requests fail with [`MarkupError::ResourceExhausted`] rather than
/// aborting the process, so callers can suggest a smaller export.
pub fn new_pixmap(width: u32, height: u32) -> crate::error::Result<Pixmap> {
    if width == 0 || height == 0 {
        return Err(MarkupError::encode(format!(
            "cannot allocate zero-sized {width}x{height} buffer"
        )));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_BUFFER_PIXELS {
        return Err(MarkupError::resource_exhausted(format!(
            "{width}x{height} buffer exceeds {MAX_BUFFER_PIXELS} pixels"
        )));
    }
    Pixmap::new(width, height).ok_or_else(|| {
        MarkupError::resource_exhausted(format!("failed to allocate {width}x{height} buffer"))
    })
}

pub fn pixmap_from_rgba(img: &RgbaImage) -> crate::error::Result<Pixmap> {
    let mut pixmap = new_pixmap(img.width(), img.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// Composites a pixmap over an opaque `background`, dropping alpha.
pub fn flatten_to_rgb(pixmap: &Pixmap, background: Rgb) -> RgbImage {
    let mut out = RgbImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        // Premultiplied: result = src + bg * (1 - a)
        let inv = 255 - src.alpha() as u32;
        let mix = |c: u8, bg: u8| (c as u32 + (bg as u32 * inv + 127) / 255).min(255) as u8;
        *dst = RgbPixel([
            mix(src.red(), background.0),
            mix(src.green(), background.1),
            mix(src.blue(), background.2),
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_opaque_pixels_exact() {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(1, 1, Rgba([12, 200, 99, 255]));
        let pixmap = pixmap_from_rgba(&img).expect("pixmap");
        let back = rgba_from_pixmap(&pixmap);
        assert_eq!(back.get_pixel(1, 1), &Rgba([12, 200, 99, 255]));
        assert_eq!(back.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_oversized_buffer_is_resource_exhaustion() {
        let err = new_pixmap(100_000, 100_000).expect_err("too large");
        assert_eq!(err.kind(), crate::error::ErrorKind::ResourceExhausted);
    }

    #[test]
    fn test_flatten_transparent_gives_background() {
        let pixmap = new_pixmap(2, 2).expect("pixmap");
        let rgb = flatten_to_rgb(&pixmap, Rgb::WHITE);
        assert_eq!(rgb.get_pixel(0, 0), &RgbPixel([255, 255, 255]));
    }
}
