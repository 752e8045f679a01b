use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::job::{PrivacyStatus, DEFAULT_CATEGORY_ID};
use crate::retry::BackoffScheduler;

/// Chunk-level retry policy (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Highest chunk retry number attempted before the upload is exhausted.
    pub max_retries: u32,
    /// Length of one backoff unit in seconds; retry `r` sleeps up to `2^r` units.
    pub unit_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            unit_secs: 1.0,
        }
    }
}

impl RetryConfig {
    pub fn scheduler(&self) -> BackoffScheduler {
        BackoffScheduler::new(
            self.max_retries,
            Duration::try_from_secs_f64(self.unit_secs).unwrap_or(Duration::from_secs(1)),
        )
    }
}

/// Whole-job retry policy of the batch runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Whole-job attempts per video before the batch is stopped.
    pub max_failures_per_job: u32,
    /// Pause between whole-job attempts, in seconds.
    pub inter_attempt_delay_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_failures_per_job: 10,
            inter_attempt_delay_secs: 5,
        }
    }
}

/// Defaults for building upload jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadDefaults {
    pub category_id: u32,
    pub privacy: PrivacyStatus,
    /// File name suffixes accepted by the gatherer (case-insensitive).
    pub extensions: Vec<String>,
    /// Bytes per chunk PUT (8 MiB when absent). 0 sends the whole file in one request.
    pub chunk_size_bytes: Option<u64>,
}

impl Default for UploadDefaults {
    fn default() -> Self {
        Self {
            category_id: DEFAULT_CATEGORY_ID,
            privacy: PrivacyStatus::Unlisted,
            extensions: ["avi", "mp4", "3gp", "wmv", "mov"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            chunk_size_bytes: Some(8 * 1024 * 1024),
        }
    }
}

/// Remote API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the video-hosting API.
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// Abort a request when throughput stays under 1 KiB/s for this long.
    pub low_speed_time_secs: u64,
    /// Immediate re-sends performed inside the HTTP layer on transport errors.
    /// Kept at 0: backoff and retry decisions belong to the upload driver.
    pub transport_retries: u32,
    /// File holding an OAuth access token; defaults to `~/.config/vidup/token`.
    pub token_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com".to_string(),
            connect_timeout_secs: 30,
            low_speed_time_secs: 60,
            transport_retries: 0,
            token_file: None,
        }
    }
}

/// Global configuration loaded from `~/.config/vidup/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VidupConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub upload: UploadDefaults,
    #[serde(default)]
    pub api: ApiConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vidup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VidupConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VidupConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: VidupConfig = toml::from_str(&data)?;
    Ok(cfg)
}
