//! Layer compositing: a base image with one or more reviewers' strokes on top.
//!
//! Every layer is rasterized onto its own transparent surface and only then
//! drawn over the base, so an eraser stroke can remove ink from its own layer
//! but never base-image pixels or another reviewer's ink.

use tiny_skia::{
    FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke as SkStroke,
    Transform,
};
use tracing::trace;

use crate::model::Rgb;
use crate::model::coords::{PixelPoint, Point, to_pixel};
use crate::model::stroke::Stroke;
use crate::raster::BaseImage;
use crate::raster::pixmap::{new_pixmap, pixmap_from_rgba};

/// How a single draw call combines with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Source-over with the stroke color.
    Normal,
    /// Destination pixels under the stroke become transparent.
    Erase,
}

impl BlendMode {
    pub fn for_stroke(stroke: &Stroke) -> Self {
        if stroke.is_eraser {
            BlendMode::Erase
        } else {
            BlendMode::Normal
        }
    }

    fn to_skia(self) -> tiny_skia::BlendMode {
        match self {
            BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
            BlendMode::Erase => tiny_skia::BlendMode::DestinationOut,
        }
    }
}

/// How the base image is mapped into the output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseFit {
    /// Scale to fill the whole buffer.
    #[default]
    Stretch,
    /// Largest aspect-preserving rectangle, centred.
    Contain,
}

/// Where the base image lands in the output buffer, in pixels. Normalized
/// stroke coordinates are relative to this rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn compute(
        fit: BaseFit,
        image_width: u32,
        image_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Self {
        let (tw, th) = (target_width as f64, target_height as f64);
        match fit {
            BaseFit::Stretch => Placement {
                x: 0.0,
                y: 0.0,
                width: tw,
                height: th,
            },
            BaseFit::Contain => {
                let scale = (tw / image_width as f64).min(th / image_height as f64);
                let width = image_width as f64 * scale;
                let height = image_height as f64 * scale;
                Placement {
                    x: (tw - width) / 2.0,
                    y: (th - height) / 2.0,
                    width,
                    height,
                }
            }
        }
    }

    pub fn map(&self, p: Point) -> PixelPoint {
        let local = to_pixel(p, self.width, self.height);
        PixelPoint {
            x: self.x + local.x,
            y: self.y + local.y,
        }
    }
}

/// Output buffer geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
    pub fit: BaseFit,
    /// Fill for the area not covered by the base image. `None` leaves it transparent.
    pub background: Option<Rgb>,
}

impl RenderTarget {
    /// Full-resolution target matching the base image exactly.
    pub fn native(base: &BaseImage) -> Self {
        Self {
            width: base.width(),
            height: base.height(),
            fit: BaseFit::Stretch,
            background: None,
        }
    }

    /// The base image scaled by `scale` (e.g. an on-screen zoom level).
    pub fn scaled(base: &BaseImage, scale: f64) -> Self {
        let dim = |v: u32| ((v as f64 * scale).round() as u32).max(1);
        Self {
            width: dim(base.width()),
            height: dim(base.height()),
            fit: BaseFit::Stretch,
            background: None,
        }
    }
}

/// Draws one stroke onto `surface` with an explicit blend mode.
///
/// Points are mapped through `placement`; `width_scale` converts the stroke's
/// native line weight to target pixels. Strokes with fewer than two points
/// draw nothing.
pub fn draw_stroke(
    surface: &mut Pixmap,
    stroke: &Stroke,
    placement: &Placement,
    width_scale: f64,
    blend: BlendMode,
) {
    if !stroke.is_renderable() {
        return;
    }

    let mut pb = PathBuilder::new();
    let start = placement.map(stroke.points[0]);
    pb.move_to(start.x as f32, start.y as f32);
    for p in &stroke.points[1..] {
        let px = placement.map(*p);
        pb.line_to(px.x as f32, px.y as f32);
    }
    let Some(path) = pb.finish() else {
        trace!("stroke path collapsed, nothing to draw");
        return;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(stroke.color.0, stroke.color.1, stroke.color.2, 255);
    paint.anti_alias = true;
    paint.blend_mode = blend.to_skia();

    let sk_stroke = SkStroke {
        width: (stroke.width * width_scale) as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    surface.stroke_path(&path, &paint, &sk_stroke, Transform::identity(), None);
}

/// Rasterizes one layer onto a fresh transparent surface, oldest stroke first.
pub fn rasterize_layer(
    strokes: &[Stroke],
    placement: &Placement,
    width_scale: f64,
    width: u32,
    height: u32,
) -> crate::error::Result<Pixmap> {
    let mut surface = new_pixmap(width, height)?;
    for stroke in strokes {
        draw_stroke(
            &mut surface,
            stroke,
            placement,
            width_scale,
            BlendMode::for_stroke(stroke),
        );
    }
    Ok(surface)
}

/// Composites base images and stroke layers into pixel buffers.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    target: RenderTarget,
}

impl Compositor {
    pub fn new(target: RenderTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    fn placement(&self, base: &BaseImage) -> Placement {
        Placement::compute(
            self.target.fit,
            base.width(),
            base.height(),
            self.target.width,
            self.target.height,
        )
    }

    /// Allocates the output buffer and draws the (scaled) base image into it.
    pub fn render_base(&self, base: &BaseImage) -> crate::error::Result<Pixmap> {
        let mut buffer = new_pixmap(self.target.width, self.target.height)?;
        if let Some(bg) = self.target.background {
            buffer.fill(tiny_skia::Color::from_rgba8(bg.0, bg.1, bg.2, 255));
        }

        let placement = self.placement(base);
        let sx = placement.width / base.width() as f64;
        let sy = placement.height / base.height() as f64;
        let identity = sx == 1.0 && sy == 1.0 && placement.x == 0.0 && placement.y == 0.0;

        let source = pixmap_from_rgba(base.pixels())?;
        let paint = PixmapPaint {
            quality: if identity {
                FilterQuality::Nearest
            } else {
                FilterQuality::Bilinear
            },
            ..Default::default()
        };
        let transform = Transform::from_row(
            sx as f32,
            0.0,
            0.0,
            sy as f32,
            placement.x as f32,
            placement.y as f32,
        );
        buffer.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
        Ok(buffer)
    }

    /// Base image plus `layers`, each layer composited independently in the
    /// given order. Stroke widths scale with `target width / image width`.
    pub fn compose(
        &self,
        base: &BaseImage,
        layers: &[&[Stroke]],
    ) -> crate::error::Result<Pixmap> {
        let mut buffer = self.render_base(base)?;
        let placement = self.placement(base);
        let width_scale = placement.width / base.width() as f64;

        for strokes in layers {
            if strokes.iter().all(|s| !s.is_renderable()) {
                continue;
            }
            let surface = rasterize_layer(
                strokes,
                &placement,
                width_scale,
                self.target.width,
                self.target.height,
            )?;
            buffer.draw_pixmap(
                0,
                0,
                surface.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
        Ok(buffer)
    }

    /// Live view while a reviewer draws: the committed layer plus the
    /// in-progress gesture, recomputed from scratch on every call.
    ///
    /// The gesture belongs to the same layer pass, so an in-progress eraser
    /// removes committed ink of that layer just as it will once committed.
    pub fn render_preview(
        &self,
        base: &BaseImage,
        committed: &[Stroke],
        in_progress: Option<&Stroke>,
    ) -> crate::error::Result<Pixmap> {
        match in_progress {
            Some(live) => {
                let mut layer = Vec::with_capacity(committed.len() + 1);
                layer.extend_from_slice(committed);
                layer.push(live.clone());
                self.compose(base, &[layer.as_slice()])
            }
            None => self.compose(base, &[committed]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contain_placement_centres_image() {
        let p = Placement::compute(BaseFit::Contain, 200, 100, 400, 400);
        assert_eq!(p.width, 400.0);
        assert_eq!(p.height, 200.0);
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 100.0);
    }

    #[test]
    fn test_placement_maps_relative_to_image_rect() {
        let p = Placement::compute(BaseFit::Contain, 100, 100, 300, 200);
        let px = p.map(Point::new(0.5, 0.5));
        assert_eq!(px, PixelPoint { x: 150.0, y: 100.0 });
    }

    #[test]
    fn test_blend_mode_follows_eraser_flag() {
        let s = Stroke::eraser(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)], 3.0);
        assert_eq!(BlendMode::for_stroke(&s), BlendMode::Erase);
    }
}
