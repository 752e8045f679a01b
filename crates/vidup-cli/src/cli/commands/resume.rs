//! `vidup resume` – continue a stopped batch from its saved worklist.

use std::path::PathBuf;

use anyhow::Result;
use vidup_core::config::VidupConfig;
use vidup_core::snapshot::SnapshotStore;

use super::worklist::run_worklist;

pub fn run_resume(cfg: &VidupConfig, snapshot: Option<PathBuf>) -> Result<()> {
    let path = match snapshot {
        Some(p) => p,
        None => SnapshotStore::default_path()?,
    };
    let store = SnapshotStore::new(path);
    let Some(jobs) = store.load()? else {
        anyhow::bail!("no saved worklist at {}", store.path().display());
    };
    if jobs.is_empty() {
        store.clear()?;
        println!("Saved worklist is empty; nothing to resume.");
        return Ok(());
    }
    println!("Resuming {} job(s) from {}", jobs.len(), store.path().display());
    run_worklist(cfg, &jobs, Some(&store))
}
