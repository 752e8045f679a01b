//! Batch runner: upload a worklist in order, one job at a time.
//!
//! Each job gets a budget of whole-job attempts (each one a full driver run,
//! which may itself retry many chunks). A job that uses up its budget stops
//! the whole batch; the jobs from that one onward are written to the
//! snapshot store so the batch can be resumed later.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::api::UploadApi;
use crate::config::BatchConfig;
use crate::control::CancelToken;
use crate::driver::{UploadDriver, UploadError};
use crate::job::{UploadJob, VideoId};
use crate::snapshot::SnapshotStore;

/// Anything that can run one whole-job upload attempt.
pub trait JobUploader {
    fn upload(&self, job: &UploadJob) -> Result<VideoId, UploadError>;
}

impl<A: UploadApi> JobUploader for UploadDriver<A> {
    fn upload(&self, job: &UploadJob) -> Result<VideoId, UploadError> {
        self.drive_upload(job)
    }
}

/// Whole-job retry settings.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Attempts per job before the batch stops (at least 1).
    pub max_failures_per_job: u32,
    /// Pause between attempts of the same job.
    pub inter_attempt_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        (&BatchConfig::default()).into()
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(cfg: &BatchConfig) -> Self {
        Self {
            max_failures_per_job: cfg.max_failures_per_job,
            inter_attempt_delay: Duration::from_secs(cfg.inter_attempt_delay_secs),
        }
    }
}

/// Why a batch stopped before the end of its worklist.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("\"{title}\" (job {index}) failed {attempts} time(s); last error: {last_error}")]
    JobBudgetExhausted {
        index: usize,
        title: String,
        attempts: u32,
        #[source]
        last_error: UploadError,
    },
    #[error("batch cancelled at \"{title}\" (job {index})")]
    Cancelled { index: usize, title: String },
}

impl BatchError {
    /// Index of the job that was in progress.
    pub fn index(&self) -> usize {
        match self {
            BatchError::JobBudgetExhausted { index, .. } | BatchError::Cancelled { index, .. } => {
                *index
            }
        }
    }
}

/// A job that finished uploading.
#[derive(Debug, Clone)]
pub struct UploadedVideo {
    pub index: usize,
    pub source_path: PathBuf,
    pub title: String,
    pub video_id: VideoId,
}

/// How the batch stopped early.
#[derive(Debug)]
pub struct BatchAbort {
    pub error: BatchError,
    /// Where the remaining jobs were saved, if a store was configured.
    pub snapshot: Option<PathBuf>,
    pub remaining: usize,
}

/// Outcome of `run_batch`.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub uploaded: Vec<UploadedVideo>,
    pub aborted: Option<BatchAbort>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.uploaded.len()
    }

    /// Index of the job the batch stopped at, if it stopped early.
    pub fn aborted_at(&self) -> Option<usize> {
        self.aborted.as_ref().map(|a| a.error.index())
    }
}

/// Upload `jobs` in order.
///
/// Returns `Err` only when the snapshot could not be written or cleared; an
/// aborted batch is reported through `BatchReport::aborted`.
pub fn run_batch<U: JobUploader + ?Sized>(
    uploader: &U,
    jobs: &[UploadJob],
    options: BatchOptions,
    snapshot: Option<&SnapshotStore>,
    cancel: &CancelToken,
) -> Result<BatchReport> {
    let max_attempts = options.max_failures_per_job.max(1);
    let mut report = BatchReport::default();

    for (index, job) in jobs.iter().enumerate() {
        let mut failures = 0u32;
        loop {
            if cancel.is_cancelled() {
                let error = BatchError::Cancelled {
                    index,
                    title: job.title.clone(),
                };
                return abort(report, error, jobs, snapshot);
            }
            tracing::debug!(index, title = %job.title, attempt = failures + 1, "starting upload attempt");
            match uploader.upload(job) {
                Ok(video_id) => {
                    tracing::info!(index, title = %job.title, video_id = %video_id, "job complete");
                    report.uploaded.push(UploadedVideo {
                        index,
                        source_path: job.source_path.clone(),
                        title: job.title.clone(),
                        video_id,
                    });
                    break;
                }
                Err(UploadError::Cancelled) => {
                    let error = BatchError::Cancelled {
                        index,
                        title: job.title.clone(),
                    };
                    return abort(report, error, jobs, snapshot);
                }
                Err(e) => {
                    failures += 1;
                    if failures >= max_attempts {
                        tracing::error!(index, title = %job.title, attempts = failures, error = %e, "max bad attempts reached");
                        let error = BatchError::JobBudgetExhausted {
                            index,
                            title: job.title.clone(),
                            attempts: failures,
                            last_error: e,
                        };
                        return abort(report, error, jobs, snapshot);
                    }
                    tracing::warn!(
                        index,
                        title = %job.title,
                        attempt = failures,
                        error = %e,
                        "upload failed; trying again in {}s",
                        options.inter_attempt_delay.as_secs_f64()
                    );
                    if !options.inter_attempt_delay.is_zero() {
                        std::thread::sleep(options.inter_attempt_delay);
                    }
                }
            }
        }
    }

    if let Some(store) = snapshot {
        store.clear()?;
    }
    tracing::info!(completed = report.completed(), "batch finished");
    Ok(report)
}

/// Persist `jobs[index..]` and close the report.
fn abort(
    mut report: BatchReport,
    error: BatchError,
    jobs: &[UploadJob],
    snapshot: Option<&SnapshotStore>,
) -> Result<BatchReport> {
    let remaining = &jobs[error.index()..];
    let snapshot_path = match snapshot {
        Some(store) => {
            store.persist(remaining)?;
            tracing::warn!(
                path = %store.path().display(),
                remaining = remaining.len(),
                "uploading stopped; remaining jobs saved"
            );
            Some(store.path().to_path_buf())
        }
        None => {
            tracing::warn!(remaining = remaining.len(), "uploading stopped; no snapshot store configured");
            None
        }
    };
    report.aborted = Some(BatchAbort {
        error,
        snapshot: snapshot_path,
        remaining: remaining.len(),
    });
    Ok(report)
}
