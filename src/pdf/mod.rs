pub mod content_stream;
pub mod optimizer;
pub mod writer;
