// 選択レポート (PNG/JPEG): 固定幅1カラム、ヘッダー + 固定高さの項目

use image::imageops::{self, FilterType};
use serde::Deserialize;
use tiny_skia::{Color, PixmapPaint, Transform};
use tracing::{info, warn};

use super::encode::{encode_jpeg, encode_png};
use super::selection::ReportItem;
use super::{ExportFormat, ExportedDocument, NO_FONT_WARNING, selection_file_name};
use crate::error::MarkupError;
use crate::model::Rgb;
use crate::raster::pixmap::{flatten_to_rgb, new_pixmap, pixmap_from_rgba, rgba_from_pixmap};
use crate::text::{FontFace, draw_text};

/// Geometry of the raster report, in pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RasterReportLayout {
    pub width: u32,
    pub header_height: u32,
    pub item_height: u32,
    pub padding: u32,
    /// Width each crop is drawn at.
    pub draw_width: u32,
    pub title_size: f64,
    pub heading_size: f64,
    pub notes_size: f64,
}

impl Default for RasterReportLayout {
    fn default() -> Self {
        Self {
            width: 800,
            header_height: 60,
            item_height: 300,
            padding: 20,
            draw_width: 200,
            title_size: 24.0,
            heading_size: 18.0,
            notes_size: 14.0,
        }
    }
}

impl RasterReportLayout {
    /// `header_height + items × item_height + padding`
    pub fn total_height(&self, items: usize) -> u64 {
        self.header_height as u64 + items as u64 * self.item_height as u64 + self.padding as u64
    }

    /// Drawn size of a crop: `draw_width` wide, aspect preserved, shrunk
    /// further if it would overflow its item slot.
    fn draw_size(&self, item: &ReportItem) -> (u32, u32) {
        let max_h = self.item_height.saturating_sub(30).max(1) as f64;
        let mut w = self.draw_width as f64;
        let mut h = item.scaled_height(w);
        if h > max_h {
            w *= max_h / h;
            h = max_h;
        }
        ((w.round() as u32).max(1), (h.round() as u32).max(1))
    }
}

/// One flattened image: title banner, then a fixed-height slot per item.
///
/// Text needs `font`; without one the report is laid out image-only.
pub fn export_report_raster(
    title: &str,
    items: &[ReportItem],
    layout: &RasterReportLayout,
    format: ExportFormat,
    jpeg_quality: u8,
    font: Option<&FontFace>,
) -> crate::error::Result<ExportedDocument> {
    if format == ExportFormat::Pdf {
        return Err(MarkupError::encode("raster report cannot be written as PDF"));
    }
    let total_height = layout.total_height(items.len());
    let height = u32::try_from(total_height).map_err(|_| {
        MarkupError::resource_exhausted(format!("report height {total_height} is too large"))
    })?;
    let mut canvas = new_pixmap(layout.width, height)?;
    canvas.fill(Color::WHITE);

    let mut warnings = Vec::new();
    if font.is_none() {
        warn!("no font available, raster report text skipped");
        warnings.push(NO_FONT_WARNING.to_string());
    }
    let text = |canvas: &mut tiny_skia::Pixmap, s: &str, x: u32, y: u32, size: f64| {
        if let Some(font) = font {
            draw_text(canvas, font, s, x as f64, y as f64, size, Rgb::BLACK, 255);
        }
    };

    let pad = layout.padding;
    text(
        &mut canvas,
        &format!("Design Selections: {title}"),
        pad,
        40,
        layout.title_size,
    );

    let mut y = layout.header_height;
    for item in items {
        text(
            &mut canvas,
            &format!("Selection #{}", item.index),
            pad,
            y + 20,
            layout.heading_size,
        );

        let (dw, dh) = layout.draw_size(item);
        let scaled = imageops::resize(&item.image, dw, dh, FilterType::Triangle);
        let tile = pixmap_from_rgba(&scaled)?;
        canvas.draw_pixmap(
            pad as i32,
            (y + 30) as i32,
            tile.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        if let Some(notes) = &item.notes {
            text(
                &mut canvas,
                &format!("Notes: {notes}"),
                pad + layout.draw_width + 20,
                y + 50,
                layout.notes_size,
            );
        }
        y += layout.item_height;
    }

    let bytes = match format {
        ExportFormat::Png => encode_png(&rgba_from_pixmap(&canvas))?,
        _ => encode_jpeg(&flatten_to_rgb(&canvas, Rgb::WHITE), jpeg_quality)?,
    };
    info!(
        items = items.len(),
        width = layout.width,
        height,
        format = format.extension(),
        "selection report (raster) ready"
    );
    Ok(ExportedDocument {
        file_name: selection_file_name(title, format),
        bytes,
        pages: items.len(),
        warnings,
    })
}
