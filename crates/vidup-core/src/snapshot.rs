//! Durable worklist snapshot: the jobs still to upload when a batch stopped.
//!
//! Stored as JSON under the XDG state dir. Writes go to a temp file in the
//! same directory and are renamed into place, so a crash mid-write leaves
//! either the old snapshot or the new one, never a torn file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::job::UploadJob;

const SNAPSHOT_VERSION: u32 = 1;

/// On-disk form of the remaining worklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklistSnapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub jobs: Vec<UploadJob>,
}

/// Reads and writes the snapshot file at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default path for the snapshot file: `~/.local/state/vidup/worklist.json`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::logging::state_dir()?.join("worklist.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the snapshot with `jobs` (creates parent dir if needed).
    pub fn persist(&self, jobs: &[UploadJob]) -> Result<()> {
        let snapshot = WorklistSnapshot {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            jobs: jobs.to_vec(),
        };
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;

        let json = serde_json::to_vec_pretty(&snapshot).context("serialize worklist snapshot")?;
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        tmp.write_all(&json).context("write worklist snapshot")?;
        tmp.as_file().sync_all().context("sync worklist snapshot")?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("rename snapshot into {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), jobs = jobs.len(), "worklist snapshot written");
        Ok(())
    }

    /// Load the snapshot. Returns None if no snapshot exists.
    pub fn load(&self) -> Result<Option<Vec<UploadJob>>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read snapshot: {}", self.path.display()))
            }
        };
        let snapshot: WorklistSnapshot = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse snapshot: {}", self.path.display()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            anyhow::bail!(
                "unsupported snapshot version {} in {}",
                snapshot.version,
                self.path.display()
            );
        }
        Ok(Some(snapshot.jobs))
    }

    /// Remove the snapshot after its work has been completed. Missing file is fine.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove snapshot: {}", self.path.display())),
        }
    }
}
