// 全ジョブ実行

use tracing::warn;

use crate::pipeline::coordinator::ExportCoordinator;
use crate::pipeline::job_runner::{JobConfig, JobResult, run_job};

/// Run multiple jobs, collecting results in input order.
///
/// Jobs run concurrently. A job producing the same document (same bundle,
/// kind, format and output directory) as one still running fails with `Busy`.
/// One job failure does NOT prevent other jobs from running.
pub fn run_all_jobs(jobs: &[JobConfig]) -> Vec<crate::error::Result<JobResult>> {
    let coordinator = ExportCoordinator::new();
    let submitted: Vec<_> = jobs
        .iter()
        .map(|job| {
            let key = format!(
                "{}|{}|{:?}|{}",
                job.output_dir.display(),
                job.annotations_path.display(),
                job.kind,
                job.config.format.extension()
            );
            let job = job.clone();
            coordinator.submit(key, move |cancel| run_job(&job, cancel))
        })
        .collect();

    submitted
        .into_iter()
        .map(|handle| {
            let result = handle.and_then(|h| h.wait());
            if let Err(e) = &result {
                warn!(error = %e, "job failed");
            }
            result
        })
        .collect()
}
