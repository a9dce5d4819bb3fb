//! Text drawn as filled glyph outlines.
//!
//! Raster outputs (owner labels, the raster report) have no text engine, so
//! glyphs are pulled out of a TrueType/OpenType face with `ttf-parser` and
//! filled as paths. When no face can be found, callers skip the text.

pub mod font;
pub mod glyph;

pub use font::FontFace;
pub use glyph::{draw_text, text_width};
