//! `vidup upload <dir>` – gather videos and upload them as one batch.

use std::path::PathBuf;

use anyhow::Result;
use vidup_core::config::VidupConfig;
use vidup_core::gather::gather;
use vidup_core::snapshot::SnapshotStore;

use super::worklist::{gather_options, run_worklist};
use crate::cli::GatherArgs;

pub fn run_upload(
    cfg: &VidupConfig,
    args: &GatherArgs,
    snapshot: Option<PathBuf>,
    no_snapshot: bool,
    discard_snapshot: bool,
) -> Result<()> {
    let store = if no_snapshot {
        None
    } else {
        let path = match snapshot {
            Some(p) => p,
            None => SnapshotStore::default_path()?,
        };
        let store = SnapshotStore::new(path);
        check_pending_worklist(&store, discard_snapshot)?;
        Some(store)
    };

    let jobs = gather(&gather_options(cfg, args))?;
    if jobs.is_empty() {
        println!("No videos matched.");
        return Ok(());
    }
    tracing::info!(count = jobs.len(), dir = %args.dir.display(), "starting batch");
    run_worklist(cfg, &jobs, store.as_ref())
}

/// Refuse to start while `store` holds jobs from a stopped batch, unless `discard`.
fn check_pending_worklist(store: &SnapshotStore, discard: bool) -> Result<()> {
    let pending = store.load()?.map_or(0, |jobs| jobs.len());
    if pending == 0 {
        return Ok(());
    }
    if discard {
        tracing::warn!(
            path = %store.path().display(),
            jobs = pending,
            "discarding saved worklist"
        );
        return store.clear();
    }
    anyhow::bail!(
        "{} holds {} job(s) from a stopped batch; run `vidup resume` to finish them, \
         pass --snapshot PATH to save this batch elsewhere, or --discard-snapshot to drop them",
        store.path().display(),
        pending
    )
}
