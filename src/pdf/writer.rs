// 画像ページ・レポートページの組立とPDF出力

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use crate::error::MarkupError;
use crate::pdf::content_stream::ContentBuilder;
use crate::pdf::optimizer;

/// Resource name of the standard Helvetica font on report pages.
pub const HELVETICA: &str = "F1";

/// Whole values as integers, so pixel-sized pages read back exactly.
fn number(v: f64) -> Object {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Object::Integer(v as i64)
    } else {
        Object::Real(v as f32)
    }
}

/// An image XObject already added to the document, and its resource name.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub name: String,
    pub id: ObjectId,
}

/// Assembles a PDF page by page.
///
/// The page tree is created up front and filled in by [`DocumentWriter::finish`],
/// so a writer with no pages still produces a valid (zero-page) document.
pub struct DocumentWriter {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    font_id: Option<ObjectId>,
}

impl Default for DocumentWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            font_id: None,
        }
    }

    /// JPEG(DCTDecode) 画像XObjectを追加する。戻り値はオブジェクトID。
    pub fn add_jpeg_xobject(&mut self, jpeg_data: &[u8], width: u32, height: u32) -> ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        self.doc
            .add_object(Object::Stream(Stream::new(dict, jpeg_data.to_vec())))
    }

    fn helvetica(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_id = Some(id);
        id
    }

    /// Appends a page of `width × height` points.
    ///
    /// `images` become the page's XObject resources; `with_font` adds
    /// Helvetica as [`HELVETICA`].
    pub fn add_page(
        &mut self,
        width: f64,
        height: f64,
        content: ContentBuilder,
        images: &[PlacedImage],
        with_font: bool,
    ) -> crate::error::Result<ObjectId> {
        let mut resources = Dictionary::new();
        if !images.is_empty() {
            let mut xobjects = Dictionary::new();
            for img in images {
                xobjects.set(img.name.as_bytes().to_vec(), Object::Reference(img.id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
        }
        if with_font {
            let font_id = self.helvetica();
            resources.set(
                "Font",
                dictionary! { HELVETICA => Object::Reference(font_id) },
            );
        }

        let content_id = self.doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            content.encode()?,
        )));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                number(width),
                number(height),
            ],
            "Resources" => Object::Dictionary(resources),
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        Ok(page_id)
    }

    /// A page exactly `width × height` (one unit per image pixel) showing
    /// the JPEG full-bleed.
    pub fn add_image_page(
        &mut self,
        jpeg_data: &[u8],
        width: u32,
        height: u32,
    ) -> crate::error::Result<ObjectId> {
        let id = self.add_jpeg_xobject(jpeg_data, width, height);
        let image = PlacedImage {
            name: "Im1".to_string(),
            id,
        };
        let mut content = ContentBuilder::new();
        content.draw_image(&image.name, 0.0, 0.0, width as f64, height as f64);
        self.add_page(width as f64, height as f64, content, &[image], false)
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Page tree, catalog, optional stream compression, then serialization.
    ///
    /// No timestamps or random ids are written, so identical input gives
    /// identical bytes.
    pub fn finish(mut self, compress: bool) -> crate::error::Result<Vec<u8>> {
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        if compress {
            optimizer::optimize(&mut self.doc);
        }

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| MarkupError::pdf_write(e.to_string()))?;
        debug!(pages = count, bytes = buf.len(), "serialized PDF");
        Ok(buf)
    }
}
