// ファイルシステムキャッシュ: hash → エンコード済みページ
//
// Entry layout: `<cache_dir>/<hex_hash>/{page.jpg, metadata.json}`

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::CachedPage;
use crate::error::MarkupError;

const CACHE_FILES: &[&str] = &["page.jpg", "metadata.json"];

/// metadata.json に保存するページのメタデータ。
#[derive(serde::Serialize, serde::Deserialize)]
struct CacheMetadata {
    cache_key: String,
    width: u32,
    height: u32,
}

/// キャッシュキーが有効な SHA-256 hex 文字列であることを検証する。
///
/// 有効なキーは正確に64文字の小文字16進数([0-9a-f])である必要がある。
/// パストラバーサルや不正なディレクトリアクセスを防止する。
fn validate_cache_key(key: &str) -> crate::error::Result<()> {
    if key.len() == 64 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        Ok(())
    } else {
        Err(MarkupError::cache(format!(
            "invalid cache key: expected 64-character lowercase hex string, got '{key}'"
        )))
    }
}

fn cache_err(e: std::io::Error) -> MarkupError {
    MarkupError::cache(e.to_string())
}

/// ファイルシステムベースのページキャッシュ。
pub struct PageCache {
    cache_dir: PathBuf,
}

impl PageCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    fn key_dir(&self, key: &str) -> crate::error::Result<PathBuf> {
        validate_cache_key(key)?;
        Ok(self.cache_dir.join(key))
    }

    /// ページをキャッシュに保存する。
    ///
    /// 書き込みはアトミック: 一時ディレクトリにファイルを書き込み、
    /// 最後にrenameで最終パスに移動する。
    pub fn store(&self, key: &str, page: &CachedPage) -> crate::error::Result<()> {
        let dir = self.key_dir(key)?;
        let tmp_dir = dir.with_extension("tmp");

        if tmp_dir.exists() {
            let _ = fs::remove_dir_all(&tmp_dir);
        }
        fs::create_dir_all(&tmp_dir).map_err(cache_err)?;

        fs::write(tmp_dir.join("page.jpg"), &page.jpeg).map_err(cache_err)?;
        let metadata = CacheMetadata {
            cache_key: key.to_string(),
            width: page.width,
            height: page.height,
        };
        let metadata_json = serde_json::to_string(&metadata)?;
        fs::write(tmp_dir.join("metadata.json"), metadata_json.as_bytes()).map_err(cache_err)?;

        if dir.exists() {
            let _ = fs::remove_dir_all(&dir);
        }
        fs::rename(&tmp_dir, &dir).map_err(cache_err)?;
        debug!(key, "stored page in cache");
        Ok(())
    }

    /// キャッシュからページを取得する。キャッシュミスの場合は None を返す。
    pub fn retrieve(&self, key: &str) -> crate::error::Result<Option<CachedPage>> {
        let dir = self.key_dir(key)?;
        if !dir.exists() {
            return Ok(None);
        }

        let metadata_str = fs::read_to_string(dir.join("metadata.json")).map_err(cache_err)?;
        let metadata: CacheMetadata = serde_json::from_str(&metadata_str)
            .map_err(|e| MarkupError::cache(format!("corrupt metadata for {key}: {e}")))?;
        if metadata.cache_key != key {
            return Err(MarkupError::cache(format!(
                "cache key mismatch: expected '{}', found '{}'",
                key, metadata.cache_key
            )));
        }

        let jpeg = fs::read(dir.join("page.jpg")).map_err(cache_err)?;
        debug!(key, "page cache hit");
        Ok(Some(CachedPage {
            jpeg,
            width: metadata.width,
            height: metadata.height,
        }))
    }

    /// キャッシュキーのエントリが揃っているか確認する。
    pub fn contains(&self, key: &str) -> bool {
        match self.key_dir(key) {
            Ok(dir) => CACHE_FILES.iter().all(|f| dir.join(f).exists()),
            Err(_) => false,
        }
    }
}
