//! Snapshot jobs: fetch, normalize, persist.
//!
//! Each job owns one artifact path. [`run_job`] guarantees that path holds
//! valid JSON afterwards: the live data when the fetch succeeds, otherwise
//! the job's documented fallback value.

pub mod discussions;
pub mod project_board;
pub mod repo_stats;

use std::path::Path;

use log::{error, info, warn};
use serde::Serialize;

use crate::artifact::write_artifact;
use crate::error::{Result, SnapshotError};
use crate::output::{JobProgress, Reporter};

pub use discussions::DiscussionsJob;
pub use project_board::ProjectBoardJob;
pub use repo_stats::RepoStatsJob;

/// How a job produced its artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Upstream data was fetched and written.
    Live { summary: String },
    /// Upstream failed and the fallback value was written instead.
    Degraded { reason: String },
}

/// One independent fetch-normalize-persist unit.
#[allow(async_fn_in_trait)]
pub trait SnapshotJob {
    type Artifact: Serialize;

    /// Short name used in logs and progress output.
    const NAME: &'static str;

    fn artifact_path(&self) -> &Path;

    /// Fetch and normalize live data.
    async fn fetch(&self) -> Result<Self::Artifact>;

    /// Value written when live data is unavailable.
    fn fallback() -> Self::Artifact;

    /// One-line description of a successful fetch.
    fn summarize(artifact: &Self::Artifact) -> String;
}

/// Run a job and write its artifact.
///
/// Fetch errors never escape: they are logged and replaced by the fallback
/// value. Only a failed artifact write is returned as an error.
pub async fn run_job<J: SnapshotJob>(job: &J, reporter: &Reporter) -> Result<JobOutcome> {
    let progress = reporter.start(J::NAME);
    info!("Running {} snapshot", J::NAME);

    let (artifact, outcome) = match job.fetch().await {
        Ok(artifact) => {
            let summary = J::summarize(&artifact);
            info!("{}: {summary}", J::NAME);
            (artifact, JobOutcome::Live { summary })
        }
        Err(e) => {
            warn!("{} snapshot failed, using fallback data: {e}", J::NAME);
            (J::fallback(), JobOutcome::Degraded { reason: e.to_string() })
        }
    };

    persist::<J>(job.artifact_path(), &artifact, outcome, progress)
}

/// Write a job's fallback artifact without contacting upstream.
///
/// Used when the job cannot even be set up, e.g. the client configuration is
/// invalid; `reason` is reported as the cause of the degraded outcome.
pub fn write_fallback<J: SnapshotJob>(
    path: &Path,
    reason: &SnapshotError,
    reporter: &Reporter,
) -> Result<JobOutcome> {
    let progress = reporter.start(J::NAME);
    warn!("{} snapshot skipped, using fallback data: {reason}", J::NAME);

    let outcome = JobOutcome::Degraded { reason: reason.to_string() };
    persist::<J>(path, &J::fallback(), outcome, progress)
}

fn persist<J: SnapshotJob>(
    path: &Path,
    artifact: &J::Artifact,
    outcome: JobOutcome,
    progress: JobProgress<'_>,
) -> Result<JobOutcome> {
    if let Err(e) = write_artifact(path, artifact) {
        error!("{}: {e}", J::NAME);
        progress.fail(&e);
        return Err(e);
    }

    info!("{} snapshot saved to {}", J::NAME, path.display());
    progress.finish(&outcome, path);
    Ok(outcome)
}
