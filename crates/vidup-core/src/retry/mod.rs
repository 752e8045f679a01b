//! Retry and backoff policy.
//!
//! This module encapsulates error classification (transport failures,
//! transient server faults, permanent rejections) and randomized exponential
//! backoff so the upload driver can apply one consistent policy to every
//! request of a resumable upload.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::ChunkError;
pub use policy::{BackoffScheduler, ErrorKind, RetryDecision, MAX_DELAY};
