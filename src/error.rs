use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Image decode error: {0}")]
    DecodeError(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Encode error: {0}")]
    EncodeError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Export busy: {0}")]
    Busy(String),

    #[error("Export cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse failure category, for callers that react differently per kind
/// (e.g. suggest downscaling on [`ErrorKind::ResourceExhausted`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Decode,
    ResourceExhausted,
    Encode,
    Store,
    Font,
    Cache,
    Busy,
    Cancelled,
    Io,
}

/// Generates factory methods for [`MarkupError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl MarkupError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create an input decode error.
    decode => DecodeError,
    /// Create a resource exhaustion error.
    resource_exhausted => ResourceExhausted,
    /// Create an encode error.
    encode => EncodeError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create a store error.
    store => StoreError,
    /// Create a font error.
    font => FontError,
    /// Create a cache error.
    cache => CacheError,
    /// Create a busy (export already in flight) error.
    busy => Busy,
    /// Create a cancellation error.
    cancelled => Cancelled,
}

impl MarkupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError(_) => ErrorKind::Config,
            Self::DecodeError(_) => ErrorKind::Decode,
            Self::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            Self::EncodeError(_) | Self::PdfWriteError(_) => ErrorKind::Encode,
            Self::StoreError(_) => ErrorKind::Store,
            Self::FontError(_) => ErrorKind::Font,
            Self::CacheError(_) => ErrorKind::Cache,
            Self::Busy(_) => ErrorKind::Busy,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::IoError(_) => ErrorKind::Io,
        }
    }
}

impl From<lopdf::Error> for MarkupError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfWriteError(e.to_string())
    }
}

impl From<serde_json::Error> for MarkupError {
    fn from(e: serde_json::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<serde_yml::Error> for MarkupError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<image::ImageError> for MarkupError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Decoding(_) | image::ImageError::Unsupported(_) => {
                Self::DecodeError(e.to_string())
            }
            image::ImageError::Limits(_) => Self::ResourceExhausted(e.to_string()),
            _ => Self::EncodeError(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarkupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_separates_decode_from_exhaustion() {
        assert_eq!(MarkupError::decode("bad png").kind(), ErrorKind::Decode);
        assert_eq!(
            MarkupError::resource_exhausted("100000x100000").kind(),
            ErrorKind::ResourceExhausted
        );
        assert_eq!(MarkupError::pdf_write("x").kind(), ErrorKind::Encode);
    }

    #[test]
    fn test_display_includes_message() {
        let e = MarkupError::store("mark 7 not found");
        assert_eq!(e.to_string(), "Store error: mark 7 not found");
    }
}
