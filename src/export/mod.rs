//! Document assembly: the per-reviewer team PDF and the selection report.

pub mod encode;
pub mod report_pdf;
pub mod report_raster;
pub mod selection;
pub mod team;

use serde::Deserialize;

/// File name of the multi-page team document.
pub const TEAM_FILE_NAME: &str = "team-annotations.pdf";

/// Output format of the selection report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
        }
    }
}

/// A finished export, ready to be written out.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// PDF pages, or report entries for a raster report.
    pub pages: usize,
    /// Content that was left out, e.g. text when no font could be found.
    pub warnings: Vec<String>,
}

/// Warning recorded when labels or report text are dropped.
pub const NO_FONT_WARNING: &str = "text omitted: no font available";

/// `selections-<title>.<ext>`, with characters that are unsafe in file
/// names replaced by `_`.
pub fn selection_file_name(title: &str, format: ExportFormat) -> String {
    let safe: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("selections-{safe}.{}", format.extension())
}
