//! Transport-level error type for retry classification.

use std::fmt;

/// Error returned by a single request of a resumable upload (session creation
/// or chunk PUT). Kept separate from `UploadError` so the driver can classify
/// and decide retries before deciding what to surface.
#[derive(Debug)]
pub enum ChunkError {
    /// Curl reported an error (timeout, connection reset, DNS, etc.).
    Curl(curl::Error),
    /// I/O failure on the connection that did not come from curl.
    Io(std::io::Error),
    /// The server answered with a non-success status.
    Http { status: u32, body: String },
    /// The server answered successfully but the response could not be used
    /// (missing `Location`, unparseable `Range`, invalid JSON).
    Malformed(String),
    /// The server acknowledged a chunk without taking any new bytes.
    NoProgress { offset: u64 },
}

impl ChunkError {
    /// HTTP status, if the server produced a response.
    pub fn status(&self) -> Option<u32> {
        match self {
            ChunkError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::Curl(e) => write!(f, "{}", e),
            ChunkError::Io(e) => write!(f, "i/o: {}", e),
            ChunkError::Http { status, body } if body.is_empty() => write!(f, "HTTP {}", status),
            ChunkError::Http { status, body } => write!(f, "HTTP {}: {}", status, body),
            ChunkError::Malformed(msg) => write!(f, "malformed response: {}", msg),
            ChunkError::NoProgress { offset } => {
                write!(f, "server acknowledged no new bytes past offset {}", offset)
            }
        }
    }
}

impl std::error::Error for ChunkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChunkError::Curl(e) => Some(e),
            ChunkError::Io(e) => Some(e),
            ChunkError::Http { .. } | ChunkError::Malformed(_) | ChunkError::NoProgress { .. } => {
                None
            }
        }
    }
}

impl From<curl::Error> for ChunkError {
    fn from(e: curl::Error) -> Self {
        ChunkError::Curl(e)
    }
}
