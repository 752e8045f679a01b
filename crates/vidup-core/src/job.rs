//! Upload job records produced by the gatherer and consumed by the batch runner.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// YouTube category used when none is given ("People & Blogs").
pub const DEFAULT_CATEGORY_ID: u32 = 22;

/// Visibility of an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    Public,
    Private,
    #[default]
    Unlisted,
}

impl PrivacyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Private => "private",
            PrivacyStatus::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(PrivacyStatus::Public),
            "private" => Ok(PrivacyStatus::Private),
            "unlisted" => Ok(PrivacyStatus::Unlisted),
            other => Err(format!(
                "invalid privacy status {other:?} (expected public, private or unlisted)"
            )),
        }
    }
}

/// One video to upload. Immutable once built; identity is `source_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadJob {
    pub source_path: PathBuf,
    pub title: String,
    pub description: String,
    pub category_id: u32,
    pub privacy_status: PrivacyStatus,
}

/// Identifier the remote service assigned to an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
