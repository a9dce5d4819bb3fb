// 選択レポート (PDF): A4縦、mm単位のレイアウトをPDFポイントに変換

use image::DynamicImage;
use image::imageops::{self, FilterType};
use serde::Deserialize;
use tracing::{debug, info};

use super::encode::encode_jpeg;
use super::selection::ReportItem;
use super::{ExportFormat, ExportedDocument, selection_file_name};
use crate::pdf::content_stream::ContentBuilder;
use crate::pdf::writer::{DocumentWriter, HELVETICA, PlacedImage};

const PT_PER_MM: f64 = 72.0 / 25.4;

/// Page geometry of the PDF report. Lengths in millimetres, sizes in points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PdfReportLayout {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub title_size: f64,
    pub heading_size: f64,
    pub notes_size: f64,
    pub image_width: f64,
    /// A new page starts before an item whose top would be below this.
    pub page_break: f64,
    /// Embedded crops wider than this many pixels are downscaled.
    pub embed_max_width: Option<u32>,
}

impl Default for PdfReportLayout {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 20.0,
            title_size: 20.0,
            heading_size: 14.0,
            notes_size: 10.0,
            image_width: 100.0,
            page_break: 250.0,
            embed_max_width: None,
        }
    }
}

/// A page under construction. `y` is the cursor from the top edge, in mm.
struct PageState {
    content: ContentBuilder,
    images: Vec<PlacedImage>,
}

impl PageState {
    fn new() -> Self {
        Self {
            content: ContentBuilder::new(),
            images: Vec::new(),
        }
    }
}

struct Layout<'a> {
    page: &'a PdfReportLayout,
}

impl Layout<'_> {
    fn x(&self, mm: f64) -> f64 {
        mm * PT_PER_MM
    }

    /// Top-down millimetres to bottom-up points.
    fn y(&self, mm: f64) -> f64 {
        (self.page.page_height - mm) * PT_PER_MM
    }

    fn text(&self, page: &mut PageState, size: f64, x: f64, y: f64, text: &str) {
        page.content.text(HELVETICA, size, self.x(x), self.y(y), text);
    }
}

fn embed_item(
    writer: &mut DocumentWriter,
    item: &ReportItem,
    layout: &PdfReportLayout,
    jpeg_quality: u8,
) -> crate::error::Result<lopdf::ObjectId> {
    let mut rgb = DynamicImage::ImageRgba8(item.image.clone()).to_rgb8();
    if let Some(max) = layout.embed_max_width
        && max > 0
        && rgb.width() > max
    {
        let h = ((rgb.height() as f64 * max as f64 / rgb.width() as f64).round() as u32).max(1);
        rgb = imageops::resize(&rgb, max, h, FilterType::Triangle);
    }
    let jpeg = encode_jpeg(&rgb, jpeg_quality)?;
    Ok(writer.add_jpeg_xobject(&jpeg, rgb.width(), rgb.height()))
}

/// `Design Selections: <title>` followed by one numbered entry per item:
/// heading, the crop at a fixed width, and its notes to the right.
pub fn export_report_pdf(
    title: &str,
    items: &[ReportItem],
    layout: &PdfReportLayout,
    jpeg_quality: u8,
    compress: bool,
) -> crate::error::Result<ExportedDocument> {
    let geom = Layout { page: layout };
    let (page_w, page_h) = (layout.page_width * PT_PER_MM, layout.page_height * PT_PER_MM);
    let mut writer = DocumentWriter::new();
    let mut page = PageState::new();

    let mut y = layout.margin;
    geom.text(
        &mut page,
        layout.title_size,
        layout.margin,
        y,
        &format!("Design Selections: {title}"),
    );
    y += 20.0;

    for item in items {
        if y > layout.page_break {
            let done = std::mem::replace(&mut page, PageState::new());
            writer.add_page(page_w, page_h, done.content, &done.images, true)?;
            y = layout.margin;
        }
        geom.text(
            &mut page,
            layout.heading_size,
            layout.margin,
            y,
            &format!("Selection #{}", item.index),
        );
        y += 10.0;

        let img_h = item.scaled_height(layout.image_width);
        let id = embed_item(&mut writer, item, layout, jpeg_quality)?;
        let name = format!("Im{}", page.images.len() + 1);
        page.content.draw_image(
            &name,
            geom.x(layout.margin),
            geom.y(y + img_h),
            layout.image_width * PT_PER_MM,
            img_h * PT_PER_MM,
        );
        page.images.push(PlacedImage { name, id });

        if let Some(notes) = &item.notes {
            geom.text(
                &mut page,
                layout.notes_size,
                layout.margin + layout.image_width + 10.0,
                y + 10.0,
                &format!("Notes: {notes}"),
            );
        }
        debug!(item = item.index, y, "placed report item");
        y += img_h + 20.0;
    }
    writer.add_page(page_w, page_h, page.content, &page.images, true)?;

    let pages = writer.page_count();
    let bytes = writer.finish(compress)?;
    info!(items = items.len(), pages, "selection report (pdf) ready");
    Ok(ExportedDocument {
        file_name: selection_file_name(title, ExportFormat::Pdf),
        bytes,
        pages,
        warnings: Vec::new(),
    })
}
