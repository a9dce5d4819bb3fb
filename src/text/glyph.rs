use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};
use tracing::trace;

use super::FontFace;
use crate::model::Rgb;

/// ttf-parser outline callbacks into a tiny-skia path.
///
/// Font units are y-up; the target is y-down, so y is negated here and the
/// scale/offset are applied as a transform when filling.
struct SkiaOutline<'a> {
    pb: &'a mut PathBuilder,
    dx: f32,
}

impl ttf_parser::OutlineBuilder for SkiaOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.pb.move_to(x + self.dx, -y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.pb.line_to(x + self.dx, -y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.pb.quad_to(x1 + self.dx, -y1, x + self.dx, -y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.pb
            .cubic_to(x1 + self.dx, -y1, x2 + self.dx, -y2, x + self.dx, -y);
    }

    fn close(&mut self) {
        self.pb.close();
    }
}

/// Advance width of `text` at `size` pixels. 0 when the font cannot be read.
pub fn text_width(font: &FontFace, text: &str, size: f64) -> f64 {
    let Ok(face) = font.face() else {
        return 0.0;
    };
    let scale = size / face.units_per_em() as f64;
    text.chars()
        .filter_map(|c| face.glyph_index(c))
        .map(|gid| face.glyph_hor_advance(gid).unwrap_or(0) as f64 * scale)
        .sum()
}

/// Fills `text` with its left edge at `x` and baseline at `baseline`.
///
/// Characters missing from the face are skipped without advancing. `alpha`
/// is the fill opacity (255 = opaque).
#[allow(clippy::too_many_arguments)]
pub fn draw_text(
    pixmap: &mut Pixmap,
    font: &FontFace,
    text: &str,
    x: f64,
    baseline: f64,
    size: f64,
    color: Rgb,
    alpha: u8,
) {
    let Ok(face) = font.face() else {
        return;
    };
    let mut pb = PathBuilder::new();
    // フォント単位で組んでから一括でスケールする
    let mut pen = 0.0_f32;
    for c in text.chars() {
        let Some(gid) = face.glyph_index(c) else {
            trace!(%c, "glyph missing from font");
            continue;
        };
        let mut outline = SkiaOutline { pb: &mut pb, dx: pen };
        face.outline_glyph(gid, &mut outline);
        pen += face.glyph_hor_advance(gid).unwrap_or(0) as f32;
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let scale = (size / face.units_per_em() as f64) as f32;
    let transform = Transform::from_row(scale, 0.0, 0.0, scale, x as f32, baseline as f32);
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.0, color.1, color.2, alpha);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
}

#[cfg(test)]
mod tests {
    use super::*;

    // システムフォントがある環境でのみ描画を確認する
    #[test]
    fn test_draw_text_marks_pixels_when_font_available() {
        let Ok(Some(font)) = FontFace::resolve(None) else {
            return;
        };
        let mut pixmap = Pixmap::new(200, 60).expect("pixmap");
        draw_text(&mut pixmap, &font, "User 1", 10.0, 40.0, 24.0, Rgb::BLACK, 255);
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 0));
        assert!(text_width(&font, "User 1", 24.0) > 0.0);
    }
}
