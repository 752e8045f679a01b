//! Progress reporting for uploads (bytes sent, ETA, rate).
//!
//! The driver builds one of these after every acknowledged chunk and logs it.

/// Snapshot of upload progress for one job.
#[derive(Debug, Clone)]
pub struct UploadProgress {
    /// Bytes acknowledged by the server so far.
    pub bytes_sent: u64,
    /// Size of the source file in bytes.
    pub total_bytes: u64,
    /// Elapsed time since the upload session started (seconds).
    pub elapsed_secs: f64,
}

impl UploadProgress {
    /// Upload rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_sent as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0 or unknown).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_sent);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_sent as f64 / self.total_bytes as f64).min(1.0)
    }
}
