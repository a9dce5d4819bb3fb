use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::export::report_pdf::PdfReportLayout;
use crate::export::report_raster::RasterReportLayout;
use crate::export::team::LabelStyle;
use crate::region::CropFactors;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub jpeg_quality: u8,
    pub label: LabelStyle,
    pub crop: CropFactors,
    pub pdf_report: PdfReportLayout,
    pub raster_report: RasterReportLayout,
    /// Font for raster text. `None` looks up a system sans-serif.
    pub font_path: Option<PathBuf>,
    pub parallel_workers: usize,
    /// Team page cache. Disabled when unset.
    pub cache_dir: Option<PathBuf>,
    pub compress_streams: bool,
    pub outline_marks: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            jpeg_quality: 85,
            label: LabelStyle::default(),
            crop: CropFactors::default(),
            pdf_report: PdfReportLayout::default(),
            raster_report: RasterReportLayout::default(),
            font_path: None,
            parallel_workers: 0,
            cache_dir: None,
            compress_streams: true,
            outline_marks: false,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::MarkupError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Relative `font_path` / `cache_dir` are taken relative to the
    /// settings file's directory.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings = Self::from_yaml(&content)?;
        if let Some(dir) = path.parent() {
            settings.resolve_relative_paths(dir);
        }
        Ok(settings)
    }

    fn resolve_relative_paths(&mut self, base_dir: &Path) {
        for path in [&mut self.font_path, &mut self.cache_dir].into_iter().flatten() {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(crate::error::MarkupError::config(format!(
                "jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        let factors = [
            ("crop.circle_context", self.crop.circle_context),
            ("crop.rectangle_context", self.crop.rectangle_context),
            ("crop.fallback_fraction", self.crop.fallback_fraction),
        ];
        for (name, value) in factors {
            if !(value.is_finite() && value > 0.0) {
                return Err(crate::error::MarkupError::config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.raster_report.width == 0 || self.raster_report.draw_width == 0 {
            return Err(crate::error::MarkupError::config(
                "raster_report width and draw_width must be positive",
            ));
        }
        Ok(())
    }
}
