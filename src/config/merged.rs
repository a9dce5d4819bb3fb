use std::path::PathBuf;

use super::job::Job;
use super::settings::Settings;
use crate::export::ExportFormat;
use crate::export::report_pdf::PdfReportLayout;
use crate::export::report_raster::RasterReportLayout;
use crate::export::team::LabelStyle;
use crate::region::CropFactors;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub format: ExportFormat,
    pub jpeg_quality: u8,
    pub label: LabelStyle,
    pub crop: CropFactors,
    pub pdf_report: PdfReportLayout,
    pub raster_report: RasterReportLayout,
    pub font_path: Option<PathBuf>,
    pub parallel_workers: usize,
    pub cache_dir: Option<PathBuf>,
    pub compress_streams: bool,
    pub outline_marks: bool,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        let mut label = settings.label.clone();
        if let Some(enabled) = job.label {
            label.enabled = enabled;
        }
        MergedConfig {
            format: job.format.unwrap_or_default(),
            jpeg_quality: job.jpeg_quality.unwrap_or(settings.jpeg_quality),
            label,
            crop: settings.crop,
            pdf_report: settings.pdf_report.clone(),
            raster_report: settings.raster_report.clone(),
            font_path: settings.font_path.clone(),
            parallel_workers: settings.parallel_workers,
            cache_dir: settings.cache_dir.clone(),
            compress_streams: job.compress_streams.unwrap_or(settings.compress_streams),
            outline_marks: job.outline_marks.unwrap_or(settings.outline_marks),
        }
    }
}
