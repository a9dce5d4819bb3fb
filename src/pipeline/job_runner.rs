// ジョブ単位: 画像・注釈読込 -> エクスポート -> アトミック書き出し

use std::path::PathBuf;

use tracing::info;

use crate::cache::store::PageCache;
use crate::config::job::JobKind;
use crate::config::merged::MergedConfig;
use crate::error::MarkupError;
use crate::export::encode::write_atomic;
use crate::export::report_pdf::export_report_pdf;
use crate::export::report_raster::export_report_raster;
use crate::export::selection::collect_report_items;
use crate::export::team::{TeamExportOptions, export_team_pdf};
use crate::export::{ExportFormat, ExportedDocument};
use crate::model::stroke::OwnerId;
use crate::pipeline::coordinator::CancelToken;
use crate::raster::BaseImage;
use crate::store::bundle::AnnotationBundle;
use crate::text::FontFace;

/// Configuration for a single job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub kind: JobKind,
    pub image_path: PathBuf,
    pub annotations_path: PathBuf,
    pub output_dir: PathBuf,
    pub title: Option<String>,
    pub roster: Option<Vec<OwnerId>>,
    pub config: MergedConfig,
}

/// Result of processing a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub kind: JobKind,
    pub output_path: PathBuf,
    pub pages: usize,
    /// Carried over from the exported document.
    pub warnings: Vec<String>,
}

fn check_cancel(cancel: &CancelToken, what: &str) -> crate::error::Result<()> {
    if cancel.is_cancelled() {
        Err(MarkupError::cancelled(what.to_string()))
    } else {
        Ok(())
    }
}

/// Produces the document without writing it.
pub fn build_document(
    job: &JobConfig,
    cancel: &CancelToken,
) -> crate::error::Result<ExportedDocument> {
    let base = BaseImage::open(&job.image_path)?;
    let bundle = AnnotationBundle::from_file(&job.annotations_path)?.load()?;
    check_cancel(cancel, "job")?;
    let cfg = &job.config;

    match job.kind {
        JobKind::Team => {
            let font = if cfg.label.enabled {
                FontFace::resolve(cfg.font_path.as_deref())?
            } else {
                None
            };
            let roster = job.roster.as_ref().unwrap_or(&bundle.roster);
            let layers = bundle.owners.layers_for(roster);
            let cache = cfg.cache_dir.as_ref().map(PageCache::new);
            let options = TeamExportOptions {
                jpeg_quality: cfg.jpeg_quality,
                label: cfg.label.clone(),
                compress_streams: cfg.compress_streams,
                parallel_workers: cfg.parallel_workers,
            };
            export_team_pdf(&base, &layers, &options, font.as_ref(), cache.as_ref(), cancel)
        }
        JobKind::Selection => {
            let title = job
                .title
                .clone()
                .unwrap_or_else(|| bundle.collection.title.clone());
            let items = collect_report_items(
                &base,
                &bundle.marks,
                &bundle.collection.id,
                &cfg.crop,
                cfg.outline_marks,
            );
            check_cancel(cancel, "selection report")?;
            match cfg.format {
                ExportFormat::Pdf => export_report_pdf(
                    &title,
                    &items,
                    &cfg.pdf_report,
                    cfg.jpeg_quality,
                    cfg.compress_streams,
                ),
                format => {
                    let font = FontFace::resolve(cfg.font_path.as_deref())?;
                    export_report_raster(
                        &title,
                        &items,
                        &cfg.raster_report,
                        format,
                        cfg.jpeg_quality,
                        font.as_ref(),
                    )
                }
            }
        }
    }
}

/// Builds the document and writes it into `output_dir`. Nothing is written
/// if any step fails or the job is cancelled first.
pub fn run_job(job: &JobConfig, cancel: &CancelToken) -> crate::error::Result<JobResult> {
    let doc = build_document(job, cancel)?;
    check_cancel(cancel, "job")?;
    let output_path = job.output_dir.join(&doc.file_name);
    write_atomic(&output_path, &doc.bytes)?;
    info!(path = %output_path.display(), pages = doc.pages, "job complete");
    Ok(JobResult {
        kind: job.kind,
        output_path,
        pages: doc.pages,
        warnings: doc.warnings,
    })
}
