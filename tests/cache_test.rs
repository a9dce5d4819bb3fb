// Phase 6: Cache integration tests
//
// Page key computation (hash.rs) and the file-system page cache (store.rs).

use markup_export::cache::CachedPage;
use markup_export::cache::hash::{PageCacheSettings, compute_page_key};
use markup_export::cache::store::PageCache;
use markup_export::error::ErrorKind;
use markup_export::model::Rgb;
use markup_export::model::coords::Point;
use markup_export::model::stroke::{OwnerId, Stroke};
use tempfile::tempdir;

fn settings() -> PageCacheSettings {
    PageCacheSettings {
        jpeg_quality: 85,
        label_enabled: true,
        label_min_size: 20.0,
        label_size_ratio: 0.05,
        label_alpha: 128,
        label_margin: 20.0,
        label_color: "#000000".into(),
        font_digest: String::new(),
    }
}

fn sample_page() -> CachedPage {
    CachedPage {
        jpeg: vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 0xFF, 0xD9],
        width: 640,
        height: 480,
    }
}

fn sample_key() -> String {
    compute_page_key("digest", &OwnerId::from("User 1"), &[], &settings())
}

// ---- hash.rs tests ----

#[test]
fn test_page_key_is_lowercase_sha256_hex() {
    let key = sample_key();
    assert_eq!(key.len(), 64);
    assert!(key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
}

#[test]
fn test_page_key_deterministic() {
    assert_eq!(sample_key(), sample_key());
}

#[test]
fn test_page_key_differs_with_base_image() {
    let s = settings();
    let owner = OwnerId::from("User 1");
    assert_ne!(
        compute_page_key("digest-a", &owner, &[], &s),
        compute_page_key("digest-b", &owner, &[], &s)
    );
}

#[test]
fn test_page_key_differs_with_settings() {
    let owner = OwnerId::from("User 1");
    let a = settings();
    let mut b = settings();
    b.jpeg_quality = 60;
    let mut c = settings();
    c.label_enabled = false;
    let key_a = compute_page_key("d", &owner, &[], &a);
    assert_ne!(key_a, compute_page_key("d", &owner, &[], &b));
    assert_ne!(key_a, compute_page_key("d", &owner, &[], &c));
}

#[test]
fn test_page_key_differs_with_label_color_and_font() {
    let owner = OwnerId::from("User 1");
    let black = settings();
    let mut red = settings();
    red.label_color = Rgb(255, 0, 0).to_hex();
    let mut other_font = settings();
    other_font.font_digest = "0a1b".into();
    let key = compute_page_key("d", &owner, &[], &black);
    assert_ne!(key, compute_page_key("d", &owner, &[], &red));
    assert_ne!(key, compute_page_key("d", &owner, &[], &other_font));
}

#[test]
fn test_page_key_differs_with_eraser_flag() {
    let owner = OwnerId::from("User 1");
    let points = vec![Point::new(0.1, 0.1), Point::new(0.9, 0.9)];
    let pen = Stroke::pen(points.clone(), Rgb::WHITE, 4.0);
    let eraser = Stroke::eraser(points, 4.0);
    assert_ne!(
        compute_page_key("d", &owner, &[pen], &settings()),
        compute_page_key("d", &owner, &[eraser], &settings())
    );
}

// ---- store.rs tests ----

#[test]
fn test_store_then_retrieve() {
    let dir = tempdir().expect("tempdir");
    let cache = PageCache::new(dir.path());
    let key = sample_key();

    cache.store(&key, &sample_page()).expect("store");

    assert!(cache.contains(&key));
    let page = cache.retrieve(&key).expect("retrieve").expect("hit");
    assert_eq!(page, sample_page());
}

#[test]
fn test_retrieve_miss_is_none() {
    let dir = tempdir().expect("tempdir");
    let cache = PageCache::new(dir.path());
    let key = sample_key();
    assert!(!cache.contains(&key));
    assert!(cache.retrieve(&key).expect("retrieve").is_none());
}

#[test]
fn test_store_overwrites_existing_entry() {
    let dir = tempdir().expect("tempdir");
    let cache = PageCache::new(dir.path());
    let key = sample_key();

    cache.store(&key, &sample_page()).expect("first store");
    let replacement = CachedPage {
        jpeg: vec![9, 9, 9],
        width: 10,
        height: 20,
    };
    cache.store(&key, &replacement).expect("second store");

    assert_eq!(cache.retrieve(&key).expect("retrieve"), Some(replacement));
    assert!(!dir.path().join(format!("{key}.tmp")).exists());
}

#[test]
fn test_invalid_key_is_cache_error() {
    let dir = tempdir().expect("tempdir");
    let cache = PageCache::new(dir.path());

    let err = cache
        .store("../outside", &sample_page())
        .expect_err("traversal key");
    assert_eq!(err.kind(), ErrorKind::Cache);
    assert!(cache.retrieve("not-hex").is_err());
    assert!(!cache.contains("not-hex"));
}

#[test]
fn test_corrupt_metadata_is_cache_error() {
    let dir = tempdir().expect("tempdir");
    let cache = PageCache::new(dir.path());
    let key = sample_key();
    cache.store(&key, &sample_page()).expect("store");

    std::fs::write(dir.path().join(&key).join("metadata.json"), b"{not json")
        .expect("corrupt metadata");

    let err = cache.retrieve(&key).expect_err("corrupt");
    assert_eq!(err.kind(), ErrorKind::Cache);
}
