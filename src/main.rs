use std::path::{Path, PathBuf};
use std::process::ExitCode;

use markup_export::config::job::JobFile;
use markup_export::config::merged::MergedConfig;
use markup_export::config::{self};
use markup_export::model::stroke::OwnerId;
use markup_export::pipeline::job_runner::JobConfig;
use markup_export::pipeline::orchestrator::run_all_jobs;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "markup_export=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: markup_export <jobs.yaml>...");
        eprintln!("  Export annotated images as team PDFs or selection reports.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("markup_export {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_logging();

    let mut job_configs: Vec<JobConfig> = Vec::new();

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            if let Err(e) = job.validate() {
                eprintln!("ERROR: {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
            let merged = MergedConfig::new(&settings, job);

            job_configs.push(JobConfig {
                kind: job.kind,
                image_path: resolve_path(&job_dir, &job.image),
                annotations_path: resolve_path(&job_dir, &job.annotations),
                output_dir: job
                    .output_dir
                    .as_deref()
                    .map(|d| resolve_path(&job_dir, d))
                    .unwrap_or_else(|| job_dir.clone()),
                title: job.title.clone(),
                roster: job
                    .roster
                    .as_ref()
                    .map(|r| r.iter().map(|name| OwnerId::new(name.as_str())).collect()),
                config: merged,
            });
        }
    }

    let results = run_all_jobs(&job_configs);

    let mut has_error = false;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(job_result) => {
                let notes = if job_result.warnings.is_empty() {
                    String::new()
                } else {
                    format!(" [WARN: {}]", job_result.warnings.join("; "))
                };
                eprintln!(
                    "OK: {} -> {} ({} pages){notes}",
                    job_configs[i].image_path.display(),
                    job_result.output_path.display(),
                    job_result.pages
                );
            }
            Err(e) => {
                eprintln!("ERROR: {}: {e}", job_configs[i].image_path.display());
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
