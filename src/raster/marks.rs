// Outline rendering for geometric marks (circle, rectangle, tick, path).

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::model::coords::{PercentPoint, percent_to_pixel};
use crate::model::mark::{Mark, MarkShape};

/// Tick glyph half-size, percent of image width.
const TICK_SIZE: f64 = 2.0;

/// Builds the outline path of `shape` on an image of `width × height` pixels.
///
/// Circle radius and tick size are relative to the image width, rectangles
/// are centred on `(x, y)`. Returns `None` for shapes with no drawable extent.
pub fn shape_path(shape: &MarkShape, width: f64, height: f64) -> Option<tiny_skia::Path> {
    match shape {
        MarkShape::Circle { x, y, radius } => {
            let c = percent_to_pixel(PercentPoint { x: *x, y: *y }, width, height);
            let r = radius / 100.0 * width;
            if !(r > 0.0) {
                return None;
            }
            PathBuilder::from_circle(c.x as f32, c.y as f32, r as f32)
        }
        MarkShape::Rectangle {
            x,
            y,
            width: w,
            height: h,
        } => {
            let c = percent_to_pixel(PercentPoint { x: *x, y: *y }, width, height);
            let rw = w / 100.0 * width;
            let rh = h / 100.0 * height;
            let rect = Rect::from_xywh(
                (c.x - rw / 2.0) as f32,
                (c.y - rh / 2.0) as f32,
                rw as f32,
                rh as f32,
            )?;
            Some(PathBuilder::from_rect(rect))
        }
        MarkShape::Tick { x, y } => {
            let c = percent_to_pixel(PercentPoint { x: *x, y: *y }, width, height);
            let s = TICK_SIZE / 100.0 * width;
            let mut pb = PathBuilder::new();
            pb.move_to((c.x - s) as f32, c.y as f32);
            pb.line_to((c.x - s / 3.0) as f32, (c.y + s * 0.66) as f32);
            pb.line_to((c.x + s) as f32, (c.y - s * 0.66) as f32);
            pb.finish()
        }
        MarkShape::Path { points } => {
            let (first, rest) = points.split_first()?;
            if rest.is_empty() {
                return None;
            }
            let mut pb = PathBuilder::new();
            let p0 = percent_to_pixel(*first, width, height);
            pb.move_to(p0.x as f32, p0.y as f32);
            for p in rest {
                let px = percent_to_pixel(*p, width, height);
                pb.line_to(px.x as f32, px.y as f32);
            }
            pb.finish()
        }
    }
}

/// Draws each mark's outline in its own color onto `pixmap`.
///
/// Geometry is laid out on an image of `image_width × image_height` and
/// shifted by `-origin`, so a crop of the image can be outlined directly.
pub fn draw_marks(
    pixmap: &mut Pixmap,
    marks: &[&Mark],
    image_width: f64,
    image_height: f64,
    origin: (f64, f64),
    line_width: f32,
) {
    let stroke = Stroke {
        width: line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    let transform = Transform::from_translate(-origin.0 as f32, -origin.1 as f32);
    for mark in marks {
        let Some(path) = shape_path(&mark.shape, image_width, image_height) else {
            continue;
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(mark.color.0, mark.color.1, mark.color.2, 255);
        paint.anti_alias = true;
        pixmap.stroke_path(&path, &paint, &stroke, transform, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_path_bounds() {
        let shape = MarkShape::Circle {
            x: 50.0,
            y: 50.0,
            radius: 10.0,
        };
        let path = shape_path(&shape, 1000.0, 1000.0).expect("circle path");
        let b = path.bounds();
        assert!((b.left() - 400.0).abs() < 0.5);
        assert!((b.right() - 600.0).abs() < 0.5);
    }

    #[test]
    fn test_degenerate_shapes_have_no_path() {
        let zero = MarkShape::Circle {
            x: 10.0,
            y: 10.0,
            radius: 0.0,
        };
        assert!(shape_path(&zero, 100.0, 100.0).is_none());
        let single = MarkShape::Path {
            points: vec![PercentPoint { x: 1.0, y: 1.0 }],
        };
        assert!(shape_path(&single, 100.0, 100.0).is_none());
    }
}
