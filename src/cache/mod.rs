pub mod hash;
pub mod store;

/// An encoded team page as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}
