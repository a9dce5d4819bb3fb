// Phase 5: PDF組立テスト

use image::RgbImage;
use lopdf::Document;
use lopdf::content::Content;
use markup_export::export::encode::encode_jpeg;
use markup_export::pdf::content_stream::ContentBuilder;
use markup_export::pdf::writer::{DocumentWriter, HELVETICA};

fn sample_jpeg(w: u32, h: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(w, h, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    encode_jpeg(&img, 85).expect("jpeg")
}

fn media_box(doc: &Document, page_id: lopdf::ObjectId) -> Vec<f32> {
    let page = doc.get_dictionary(page_id).expect("page dict");
    page.get(b"MediaBox")
        .and_then(|o| o.as_array())
        .expect("MediaBox")
        .iter()
        .map(|v| v.as_float().expect("number"))
        .collect()
}

// ============================================================
// 1. ページ構成
// ============================================================

#[test]
fn test_zero_page_document_is_valid() {
    let bytes = DocumentWriter::new().finish(true).expect("finish");
    let doc = Document::load_mem(&bytes).expect("reload");
    assert_eq!(doc.get_pages().len(), 0);
}

#[test]
fn test_image_page_is_sized_to_pixels() {
    let mut writer = DocumentWriter::new();
    writer
        .add_image_page(&sample_jpeg(300, 200), 300, 200)
        .expect("page");
    writer
        .add_image_page(&sample_jpeg(120, 400), 120, 400)
        .expect("page");
    assert_eq!(writer.page_count(), 2);

    let doc = Document::load_mem(&writer.finish(true).expect("finish")).expect("reload");
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 300.0, 200.0]);
    assert_eq!(media_box(&doc, pages[&2]), vec![0.0, 0.0, 120.0, 400.0]);
}

#[test]
fn test_jpeg_stream_is_not_recompressed() {
    let jpeg = sample_jpeg(64, 64);
    let mut writer = DocumentWriter::new();
    writer.add_image_page(&jpeg, 64, 64).expect("page");
    let doc = Document::load_mem(&writer.finish(true).expect("finish")).expect("reload");

    let image_stream = doc
        .objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .find(|s| {
            s.dict
                .get(b"Subtype")
                .and_then(|v| v.as_name())
                .is_ok_and(|n| n == b"Image")
        })
        .expect("image xobject");
    assert_eq!(
        image_stream.dict.get(b"Filter").and_then(|f| f.as_name()).expect("filter"),
        b"DCTDecode"
    );
    assert_eq!(image_stream.content, jpeg);
}

#[test]
fn test_identical_input_gives_identical_bytes() {
    let jpeg = sample_jpeg(50, 40);
    let build = || {
        let mut writer = DocumentWriter::new();
        writer.add_image_page(&jpeg, 50, 40).expect("page");
        writer.finish(true).expect("finish")
    };
    assert_eq!(build(), build());
}

// ============================================================
// 2. テキストページ
// ============================================================

#[test]
fn test_text_page_references_helvetica() {
    let mut writer = DocumentWriter::new();
    let mut content = ContentBuilder::new();
    content.text(HELVETICA, 20.0, 56.7, 785.0, "Design Selections: Spring");
    writer
        .add_page(595.3, 841.9, content, &[], true)
        .expect("page");
    let doc = Document::load_mem(&writer.finish(false).expect("finish")).expect("reload");

    let page_id = doc.get_pages()[&1];
    let page = doc.get_dictionary(page_id).expect("page");
    let resources = page
        .get(b"Resources")
        .and_then(|r| r.as_dict())
        .expect("inline resources");
    let font_ref = resources
        .get(b"Font")
        .and_then(|f| f.as_dict())
        .and_then(|f| f.get(HELVETICA.as_bytes()))
        .and_then(|r| r.as_reference())
        .expect("F1 reference");
    let font = doc.get_dictionary(font_ref).expect("font dict");
    assert_eq!(
        font.get(b"BaseFont").and_then(|b| b.as_name()).expect("BaseFont"),
        b"Helvetica"
    );

    let content = Content::decode(&doc.get_page_content(page_id).expect("content")).expect("decode");
    let tj = content
        .operations
        .iter()
        .find(|op| op.operator == "Tj")
        .expect("Tj");
    match &tj.operands[0] {
        lopdf::Object::String(bytes, _) => assert_eq!(bytes.as_slice(), b"Design Selections: Spring"),
        other => panic!("expected string operand, got {other:?}"),
    }
}
