// 選択マーク → 切り出し画像のリスト（レポート共通の前処理）

use image::RgbaImage;
use tracing::{debug, warn};

use crate::model::mark::{CollectionId, Mark, MarkId};
use crate::raster::BaseImage;
use crate::raster::marks::draw_marks;
use crate::raster::pixmap::{pixmap_from_rgba, rgba_from_pixmap};
use crate::region::{CropFactors, extract_region};
use crate::store::marks::MarkStore;

/// Outline width when marks are drawn onto their crops.
const OUTLINE_WIDTH: f32 = 3.0;

/// One entry of the selection report.
#[derive(Debug, Clone)]
pub struct ReportItem {
    /// 1-based position in the report.
    pub index: usize,
    pub mark: MarkId,
    pub image: RgbaImage,
    pub notes: Option<String>,
}

impl ReportItem {
    /// Height of the image when drawn `width` wide, aspect preserved.
    pub fn scaled_height(&self, width: f64) -> f64 {
        width * self.image.height() as f64 / self.image.width() as f64
    }
}

fn outline_crop(crop: RgbaImage, mark: &Mark, base: &BaseImage, origin: (u32, u32)) -> RgbaImage {
    let Ok(mut pixmap) = pixmap_from_rgba(&crop) else {
        return crop;
    };
    draw_marks(
        &mut pixmap,
        &[mark],
        base.width() as f64,
        base.height() as f64,
        (origin.0 as f64, origin.1 as f64),
        OUTLINE_WIDTH,
    );
    rgba_from_pixmap(&pixmap)
}

/// Crops every selected mark of `collection`, in selection order.
///
/// Marks whose crop is degenerate (a path without points, or a crop that
/// clamps to zero area) are skipped with a warning; numbering stays
/// contiguous over the remaining items.
pub fn collect_report_items(
    base: &BaseImage,
    store: &MarkStore,
    collection: &CollectionId,
    factors: &CropFactors,
    outline_marks: bool,
) -> Vec<ReportItem> {
    let mut items = Vec::new();
    for mark in store.selected_marks(collection) {
        let Some((rect, crop)) = extract_region(base.pixels(), &mark.shape, factors) else {
            warn!(mark = %mark.id, kind = mark.shape.kind(), "mark has no anchor, skipped");
            continue;
        };
        if rect.is_empty() {
            warn!(mark = %mark.id, kind = mark.shape.kind(), "crop is empty, skipped");
            continue;
        }
        let image = if outline_marks {
            outline_crop(crop, mark, base, (rect.x, rect.y))
        } else {
            crop
        };
        items.push(ReportItem {
            index: items.len() + 1,
            mark: mark.id,
            image,
            notes: mark.notes.clone().filter(|n| !n.trim().is_empty()),
        });
    }
    debug!(collection = %collection.0, items = items.len(), "collected report items");
    items
}
