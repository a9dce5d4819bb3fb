use serde::Deserialize;

use crate::export::ExportFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// One page per reviewer: `team-annotations.pdf`.
    Team,
    /// Cropped selected marks: `selections-<title>.<ext>`.
    Selection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub kind: JobKind,
    /// Base image, relative to the job file.
    pub image: String,
    /// Annotation bundle (JSON), relative to the job file.
    pub annotations: String,
    /// Output directory; defaults to the job file's directory.
    pub output_dir: Option<String>,
    pub format: Option<ExportFormat>,
    /// Report title; defaults to the bundle's collection title.
    pub title: Option<String>,
    /// Page order for team exports; defaults to the bundle's roster.
    pub roster: Option<Vec<String>>,
    pub jpeg_quality: Option<u8>,
    pub label: Option<bool>,
    pub outline_marks: Option<bool>,
    pub compress_streams: Option<bool>,
}

impl Job {
    /// ジョブ単体で判定できる設定ミスを検出する。
    pub fn validate(&self) -> crate::error::Result<()> {
        if let Some(q) = self.jpeg_quality
            && !(1..=100).contains(&q)
        {
            return Err(crate::error::MarkupError::config(format!(
                "jpeg_quality must be 1-100, got {q}"
            )));
        }
        if self.kind == JobKind::Team
            && let Some(format) = self.format
            && format != ExportFormat::Pdf
        {
            return Err(crate::error::MarkupError::config(format!(
                "team export is PDF only, got format '{}'",
                format.extension()
            )));
        }
        if let Some(roster) = &self.roster {
            let mut seen = std::collections::HashSet::new();
            for name in roster {
                if name.trim().is_empty() {
                    return Err(crate::error::MarkupError::config(
                        "roster entries cannot be empty",
                    ));
                }
                if !seen.insert(name.as_str()) {
                    return Err(crate::error::MarkupError::config(format!(
                        "duplicate roster entry '{name}'"
                    )));
                }
            }
        }
        Ok(())
    }
}
