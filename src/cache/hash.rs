// SHA-256（ベース画像 + オーナー + ストローク + 描画設定）
//
// A team page depends on the base image, one owner's strokes and the settings
// that change its pixels or encoding. The key is a lowercase hex SHA-256.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::model::stroke::{OwnerId, Stroke};

/// ページの画素・エンコードに影響する設定パラメータ。
///
/// キャッシュキー計算時にハッシュに含める設定値のみを保持する。
pub struct PageCacheSettings {
    pub jpeg_quality: u8,
    pub label_enabled: bool,
    pub label_min_size: f64,
    pub label_size_ratio: f64,
    pub label_alpha: u8,
    pub label_margin: f64,
    /// `#RRGGBB`
    pub label_color: String,
    /// SHA-256 of the label font's bytes and face index, empty when text is
    /// skipped.
    pub font_digest: String,
}

/// 設定を正規化JSON形式に変換する（キーはアルファベット順で固定）。
fn settings_to_canonical_json(settings: &PageCacheSettings) -> String {
    let mut map = BTreeMap::new();
    map.insert("font_digest", serde_json::json!(settings.font_digest));
    map.insert("jpeg_quality", serde_json::json!(settings.jpeg_quality));
    map.insert("label_alpha", serde_json::json!(settings.label_alpha));
    map.insert("label_color", serde_json::json!(settings.label_color));
    map.insert("label_enabled", serde_json::json!(settings.label_enabled));
    map.insert("label_margin", serde_json::json!(settings.label_margin));
    map.insert("label_min_size", serde_json::json!(settings.label_min_size));
    map.insert("label_size_ratio", serde_json::json!(settings.label_size_ratio));
    serde_json::Value::Object(map.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
        .to_string()
}

/// ページのキャッシュキーを計算する。
///
/// ハッシュ入力: `base_digest || 0 || owner || 0 || strokes_json || settings_json`
pub fn compute_page_key(
    base_digest: &str,
    owner: &OwnerId,
    strokes: &[Stroke],
    settings: &PageCacheSettings,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base_digest.as_bytes());
    hasher.update([0u8]);
    hasher.update(owner.as_str().as_bytes());
    hasher.update([0u8]);
    // Stroke は f64 と文字列のみなので直列化は失敗しない
    if let Ok(bytes) = serde_json::to_vec(strokes) {
        hasher.update(&bytes);
    }
    hasher.update(settings_to_canonical_json(settings).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rgb;
    use crate::model::coords::Point;

    fn settings() -> PageCacheSettings {
        PageCacheSettings {
            jpeg_quality: 85,
            label_enabled: true,
            label_min_size: 20.0,
            label_size_ratio: 0.05,
            label_alpha: 128,
            label_margin: 20.0,
            label_color: "#000000".into(),
            font_digest: "f0".into(),
        }
    }

    #[test]
    fn test_settings_json_is_sorted_by_key() {
        let json = settings_to_canonical_json(&settings());
        assert!(json.starts_with("{\"font_digest\":\"f0\",\"jpeg_quality\":85,\"label_alpha\":128,\"label_color\":\"#000000\","));
        assert!(json.ends_with("\"label_size_ratio\":0.05}"));
    }

    #[test]
    fn test_key_changes_with_strokes_and_owner() {
        let s = settings();
        let stroke = Stroke::pen(vec![Point::new(0.1, 0.1), Point::new(0.2, 0.2)], Rgb::BLACK, 4.0);
        let a = compute_page_key("abc", &OwnerId::from("User 1"), &[], &s);
        let b = compute_page_key("abc", &OwnerId::from("User 1"), &[stroke], &s);
        let c = compute_page_key("abc", &OwnerId::from("User 2"), &[], &s);
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, compute_page_key("abc", &OwnerId::from("User 1"), &[], &s));
    }
}
