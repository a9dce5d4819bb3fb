pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod pdf;
pub mod pipeline;
pub mod raster;
pub mod region;
pub mod store;
pub mod text;
