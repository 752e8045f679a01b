//! Resumable upload driver.
//!
//! Drives one job through a resumable session: open the session, then send
//! the source file chunk by chunk from the last acknowledged byte until the
//! server returns the finished video. Transport errors and transient server
//! faults are retried with randomized exponential backoff at the same offset;
//! permanent rejections and protocol violations end the upload at once.

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::api::{ChunkBody, ChunkResponse, UploadApi};
use crate::control::CancelToken;
use crate::job::{UploadJob, VideoId};
use crate::progress::UploadProgress;
use crate::retry::{classify, BackoffScheduler, ChunkError, RetryDecision};

/// Non-final chunks must be a multiple of this many bytes.
pub const CHUNK_GRANULARITY: u64 = 256 * 1024;

/// Why a single upload did not produce a video id.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Retriable failures kept happening past the retry ceiling.
    #[error("giving up after {retries} retries; last error: {last_error}")]
    UploadExhausted { retries: u32, last_error: String },
    /// The server refused the request with a non-retriable error.
    #[error("upload rejected: {0}")]
    UploadRejected(#[source] ChunkError),
    /// The server answered in a way the resumable protocol does not allow.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    /// The local source file could not be read.
    #[error("source file {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload cancelled")]
    Cancelled,
}

/// Where the driver is within one upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Idle,
    ChunkInFlight,
    ChunkAcked,
    Complete,
    Aborted,
}

/// Per-job mutable state. Lives for one `drive_upload` call.
#[derive(Debug)]
struct UploadSession {
    total_bytes: u64,
    bytes_sent: u64,
    retry_count: u32,
    last_error: Option<String>,
    state: DriverState,
    started: Instant,
}

impl UploadSession {
    fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            bytes_sent: 0,
            retry_count: 0,
            last_error: None,
            state: DriverState::Idle,
            started: Instant::now(),
        }
    }

    fn transition(&mut self, to: DriverState) {
        tracing::trace!(from = ?self.state, to = ?to, offset = self.bytes_sent, "upload state");
        self.state = to;
    }

    fn progress(&self) -> UploadProgress {
        UploadProgress {
            bytes_sent: self.bytes_sent,
            total_bytes: self.total_bytes,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }
}

/// Uploads single jobs through an `UploadApi`.
pub struct UploadDriver<A: UploadApi> {
    api: A,
    backoff: BackoffScheduler,
    chunk_size: Option<u64>,
    cancel: CancelToken,
}

impl<A: UploadApi> UploadDriver<A> {
    /// Driver with default backoff, whole-file requests and no cancellation.
    pub fn new(api: A) -> Self {
        Self {
            api,
            backoff: BackoffScheduler::default(),
            chunk_size: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffScheduler) -> Self {
        self.backoff = backoff;
        self
    }

    /// Bytes per request; `None` sends the rest of the file in one request.
    pub fn with_chunk_size(mut self, chunk_size: Option<u64>) -> Self {
        self.chunk_size = chunk_size.filter(|&n| n > 0);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Upload `job` and return the id the server assigned to it.
    pub fn drive_upload(&self, job: &UploadJob) -> Result<VideoId, UploadError> {
        let source_err = |source| UploadError::Source {
            path: job.source_path.clone(),
            source,
        };
        let mut file = File::open(&job.source_path).map_err(source_err)?;
        let total_bytes = file.metadata().map_err(source_err)?.len();
        let mut session = UploadSession::new(total_bytes);
        tracing::info!(title = %job.title, bytes = total_bytes, "uploading {}", job.title);

        let handle = loop {
            self.check_cancelled(&mut session)?;
            match self.api.create_session(job, total_bytes) {
                Ok(handle) => break handle,
                Err(e) => self.on_failure(&mut session, e)?,
            }
        };

        loop {
            self.check_cancelled(&mut session)?;
            let offset = session.bytes_sent;
            let len = self.chunk_len(offset, total_bytes);
            let mut chunk = ChunkBody::new(&mut file, offset, len);

            session.transition(DriverState::ChunkInFlight);
            match self.api.send_chunk(&handle, &mut chunk, total_bytes) {
                Ok(ChunkResponse::Incomplete { acknowledged }) => {
                    if acknowledged < offset || acknowledged > total_bytes {
                        session.transition(DriverState::Aborted);
                        return Err(UploadError::ProtocolViolation(format!(
                            "server acknowledged {} bytes after {} of {} were confirmed",
                            acknowledged, offset, total_bytes
                        )));
                    }
                    // Includes the empty status query once every byte is
                    // acknowledged but no final response has come.
                    if acknowledged == offset {
                        self.on_failure(&mut session, ChunkError::NoProgress { offset })?;
                        continue;
                    }
                    session.bytes_sent = acknowledged;
                    session.transition(DriverState::ChunkAcked);
                    log_progress(job, &session.progress());
                    session.transition(DriverState::Idle);
                }
                Ok(ChunkResponse::Complete {
                    video_id: Some(id),
                    ..
                }) if !id.trim().is_empty() => {
                    session.bytes_sent = total_bytes;
                    session.transition(DriverState::Complete);
                    tracing::info!(
                        title = %job.title,
                        video_id = %id,
                        retries = session.retry_count,
                        "\"{}\" was successfully uploaded",
                        job.title
                    );
                    return Ok(VideoId(id));
                }
                Ok(ChunkResponse::Complete { body, .. }) => {
                    session.transition(DriverState::Aborted);
                    tracing::error!(title = %job.title, response = %body, "final response has no video id");
                    return Err(UploadError::ProtocolViolation(format!(
                        "upload finished with an unexpected response: {}",
                        body
                    )));
                }
                Err(e) => self.on_failure(&mut session, e)?,
            }
        }
    }

    /// Length of the next request body starting at `offset`.
    fn chunk_len(&self, offset: u64, total_bytes: u64) -> u64 {
        let remaining = total_bytes - offset;
        self.chunk_size.map_or(remaining, |n| n.min(remaining))
    }

    /// Classify a failed request. Returns Ok after sleeping when the request
    /// should be re-sent, or the terminal error.
    fn on_failure(&self, session: &mut UploadSession, error: ChunkError) -> Result<(), UploadError> {
        let kind = classify(&error);
        let retry = session.retry_count + 1;
        match self.backoff.decide(retry, kind) {
            RetryDecision::NoRetry => {
                session.transition(DriverState::Aborted);
                tracing::warn!(error = %error, "non-retriable upload error");
                Err(UploadError::UploadRejected(error))
            }
            RetryDecision::Exhausted => {
                session.transition(DriverState::Aborted);
                tracing::warn!(error = %error, retries = session.retry_count, "no longer attempting to retry");
                Err(UploadError::UploadExhausted {
                    retries: session.retry_count,
                    last_error: error.to_string(),
                })
            }
            RetryDecision::RetryAfter(delay) => {
                session.retry_count = retry;
                session.last_error = Some(error.to_string());
                tracing::warn!(
                    error = %error,
                    kind = ?kind,
                    retry,
                    offset = session.bytes_sent,
                    "retriable error; sleeping {:.2}s and then retrying",
                    delay.as_secs_f64()
                );
                self.pause(session, delay)
            }
        }
    }

    fn pause(&self, session: &mut UploadSession, delay: Duration) -> Result<(), UploadError> {
        self.check_cancelled(session)?;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(())
    }

    fn check_cancelled(&self, session: &mut UploadSession) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            session.transition(DriverState::Aborted);
            tracing::info!(
                offset = session.bytes_sent,
                last_error = ?session.last_error,
                "upload cancelled"
            );
            return Err(UploadError::Cancelled);
        }
        Ok(())
    }
}

fn log_progress(job: &UploadJob, p: &UploadProgress) {
    let eta = p
        .eta_secs()
        .map(|s| format!("{:.0}s", s))
        .unwrap_or_else(|| "?".to_string());
    tracing::info!(
        title = %job.title,
        sent = p.bytes_sent,
        total = p.total_bytes,
        "{:.1}% at {:.2} MiB/s, ETA {}",
        p.fraction() * 100.0,
        p.bytes_per_sec() / 1_048_576.0,
        eta
    );
}

/// Check a configured chunk size: `None`/0 means whole file, anything else
/// must be a positive multiple of `CHUNK_GRANULARITY`.
pub fn validate_chunk_size(chunk_size: Option<u64>) -> anyhow::Result<Option<u64>> {
    match chunk_size {
        None | Some(0) => Ok(None),
        Some(n) if n % CHUNK_GRANULARITY == 0 => Ok(Some(n)),
        Some(n) => anyhow::bail!(
            "chunk size {} is not a multiple of {} bytes",
            n,
            CHUNK_GRANULARITY
        ),
    }
}
