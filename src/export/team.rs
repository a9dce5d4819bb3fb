// 複数ページ・オーナー別: 合成 -> ラベル -> JPEG -> 1画像1ページ

use image::RgbImage;
use rayon::prelude::*;
use serde::Deserialize;
use tiny_skia::Pixmap;
use tracing::{debug, info, warn};

use super::encode::encode_jpeg;
use super::{ExportedDocument, NO_FONT_WARNING, TEAM_FILE_NAME};
use crate::cache::CachedPage;
use crate::cache::hash::{PageCacheSettings, compute_page_key};
use crate::cache::store::PageCache;
use crate::error::MarkupError;
use crate::model::Rgb;
use crate::model::stroke::{OwnerId, Stroke};
use crate::pdf::writer::DocumentWriter;
use crate::pipeline::coordinator::CancelToken;
use crate::raster::BaseImage;
use crate::raster::compositor::{Compositor, RenderTarget};
use crate::raster::pixmap::flatten_to_rgb;
use crate::store::owners::Layer;
use crate::text::{FontFace, draw_text, text_width};

/// The owner name stamped on each team page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub enabled: bool,
    /// Lower bound on the font size in pixels.
    pub min_size: f64,
    /// Font size as a fraction of the image height.
    pub size_ratio: f64,
    /// Distance from the left and bottom edges, in pixels.
    pub margin: f64,
    pub alpha: u8,
    pub color: Rgb,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            min_size: 20.0,
            size_ratio: 0.05,
            margin: 20.0,
            alpha: 128,
            color: Rgb::BLACK,
        }
    }
}

impl LabelStyle {
    pub fn font_size(&self, image_height: u32) -> f64 {
        self.min_size.max(image_height as f64 * self.size_ratio)
    }
}

#[derive(Debug, Clone)]
pub struct TeamExportOptions {
    pub jpeg_quality: u8,
    pub label: LabelStyle,
    pub compress_streams: bool,
    /// 0 uses rayon's global pool.
    pub parallel_workers: usize,
}

impl Default for TeamExportOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 85,
            label: LabelStyle::default(),
            compress_streams: true,
            parallel_workers: 0,
        }
    }
}

/// Translucent owner name in the lower-left corner, shrunk to fit the width.
fn stamp_label(pixmap: &mut Pixmap, font: &FontFace, owner: &OwnerId, style: &LabelStyle) {
    let mut size = style.font_size(pixmap.height());
    let available = pixmap.width() as f64 - 2.0 * style.margin;
    let width = text_width(font, owner.as_str(), size);
    if available > 0.0 && width > available {
        size *= available / width;
    }
    let baseline = pixmap.height() as f64 - style.margin;
    draw_text(
        pixmap,
        font,
        owner.as_str(),
        style.margin,
        baseline,
        size,
        style.color,
        style.alpha,
    );
}

/// One owner's page: base image at native size, their layer on top, then
/// the label. Flattened to opaque RGB.
pub fn render_owner_page(
    base: &BaseImage,
    owner: &OwnerId,
    strokes: &[Stroke],
    label: &LabelStyle,
    font: Option<&FontFace>,
) -> crate::error::Result<RgbImage> {
    let compositor = Compositor::new(RenderTarget::native(base));
    let mut pixmap = compositor.compose(base, &[strokes])?;
    if label.enabled
        && let Some(font) = font
    {
        stamp_label(&mut pixmap, font, owner, label);
    }
    Ok(flatten_to_rgb(&pixmap, Rgb::WHITE))
}

fn cache_settings(options: &TeamExportOptions, font: Option<&FontFace>) -> PageCacheSettings {
    PageCacheSettings {
        jpeg_quality: options.jpeg_quality,
        label_enabled: options.label.enabled,
        label_min_size: options.label.min_size,
        label_size_ratio: options.label.size_ratio,
        label_alpha: options.label.alpha,
        label_margin: options.label.margin,
        label_color: options.label.color.to_hex(),
        font_digest: font.map(|f| f.digest().to_string()).unwrap_or_default(),
    }
}

struct PageJob<'a> {
    base: &'a BaseImage,
    options: &'a TeamExportOptions,
    font: Option<&'a FontFace>,
    cache: Option<&'a PageCache>,
    settings: PageCacheSettings,
    cancel: &'a CancelToken,
}

impl PageJob<'_> {
    fn encode(&self, owner: &OwnerId, strokes: &[Stroke]) -> crate::error::Result<CachedPage> {
        if self.cancel.is_cancelled() {
            return Err(MarkupError::cancelled(format!("page for {owner}")));
        }

        let key = self
            .cache
            .map(|_| compute_page_key(self.base.digest(), owner, strokes, &self.settings));
        if let (Some(cache), Some(key)) = (self.cache, key.as_deref()) {
            match cache.retrieve(key) {
                Ok(Some(page)) => return Ok(page),
                Ok(None) => {}
                Err(e) => warn!(owner = %owner, error = %e, "ignoring unreadable cache entry"),
            }
        }

        let rgb = render_owner_page(self.base, owner, strokes, &self.options.label, self.font)?;
        let page = CachedPage {
            jpeg: encode_jpeg(&rgb, self.options.jpeg_quality)?,
            width: rgb.width(),
            height: rgb.height(),
        };
        debug!(owner = %owner, strokes = strokes.len(), bytes = page.jpeg.len(), "encoded team page");

        if let (Some(cache), Some(key)) = (self.cache, key.as_deref())
            && let Err(e) = cache.store(key, &page)
        {
            warn!(owner = %owner, error = %e, "failed to store page in cache");
        }
        Ok(page)
    }
}

/// Builds `team-annotations.pdf`: one page per entry of `layers`, in order.
///
/// Every page is exactly the base image's pixel size. Pages are rendered in
/// parallel and assembled in input order; an empty `layers` gives a valid
/// zero-page document.
pub fn export_team_pdf(
    base: &BaseImage,
    layers: &[(OwnerId, Layer)],
    options: &TeamExportOptions,
    font: Option<&FontFace>,
    cache: Option<&PageCache>,
    cancel: &CancelToken,
) -> crate::error::Result<ExportedDocument> {
    let (width, height) = (base.width(), base.height());
    let orientation = if width >= height { "landscape" } else { "portrait" };
    info!(
        owners = layers.len(),
        width,
        height,
        orientation,
        font = font.map(FontFace::family).unwrap_or("-"),
        "exporting team document"
    );

    let job = PageJob {
        base,
        options,
        font,
        cache,
        settings: cache_settings(options, font),
        cancel,
    };
    let render_all = || -> Vec<crate::error::Result<CachedPage>> {
        layers
            .par_iter()
            .map(|(owner, strokes)| job.encode(owner, strokes))
            .collect()
    };
    let pages = if options.parallel_workers > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.parallel_workers)
            .build()
            .map_err(|e| MarkupError::config(format!("thread pool: {e}")))?;
        pool.install(render_all)
    } else {
        render_all()
    };

    let mut writer = DocumentWriter::new();
    for page in pages {
        let page = page?;
        writer.add_image_page(&page.jpeg, page.width, page.height)?;
    }
    if cancel.is_cancelled() {
        return Err(MarkupError::cancelled("team export"));
    }
    let count = writer.page_count();
    let bytes = writer.finish(options.compress_streams)?;
    info!(pages = count, bytes = bytes.len(), "team document ready");

    let mut warnings = Vec::new();
    if options.label.enabled && font.is_none() && count > 0 {
        warn!("no font available, owner labels omitted");
        warnings.push(format!("owner labels {NO_FONT_WARNING}"));
    }
    Ok(ExportedDocument {
        file_name: TEAM_FILE_NAME.to_string(),
        bytes,
        pages: count,
        warnings,
    })
}
