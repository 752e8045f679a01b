//! Shared plumbing: turn CLI args into gather options and run a worklist.

use anyhow::{Context, Result};
use vidup_core::api::{HttpOptions, HttpUploadApi};
use vidup_core::auth::{AccessToken, EnvToken, FirstAvailable, TokenFile};
use vidup_core::batch::{run_batch, BatchOptions};
use vidup_core::config::VidupConfig;
use vidup_core::control::CancelToken;
use vidup_core::driver::{validate_chunk_size, UploadDriver};
use vidup_core::gather::GatherOptions;
use vidup_core::job::UploadJob;
use vidup_core::snapshot::SnapshotStore;

use crate::cli::GatherArgs;

/// CLI values win; anything left unset comes from the config file.
pub(crate) fn gather_options(cfg: &VidupConfig, args: &GatherArgs) -> GatherOptions {
    let mut opts = GatherOptions::new(&args.dir, &args.title, &args.begin, &args.end);
    opts.description = args.description.clone();
    opts.extensions = if args.extensions.is_empty() {
        cfg.upload.extensions.clone()
    } else {
        args.extensions.clone()
    };
    opts.category_id = args.category.unwrap_or(cfg.upload.category_id);
    opts.privacy = args.privacy.unwrap_or(cfg.upload.privacy);
    opts
}

fn access_token(cfg: &VidupConfig) -> Result<AccessToken> {
    let token_file = match &cfg.api.token_file {
        Some(path) => path.clone(),
        None => TokenFile::default_path()?,
    };
    FirstAvailable::new()
        .with(EnvToken)
        .with(TokenFile::new(token_file))
        .require()
}

/// Upload `jobs` with the configured API, driver and batch settings.
///
/// Returns an error when the batch stops early, naming the saved worklist.
pub(crate) fn run_worklist(
    cfg: &VidupConfig,
    jobs: &[UploadJob],
    store: Option<&SnapshotStore>,
) -> Result<()> {
    let chunk_size = validate_chunk_size(cfg.upload.chunk_size_bytes)
        .context("invalid [upload] chunk_size_bytes")?;
    let token = access_token(cfg)?;
    let api = HttpUploadApi::new(&cfg.api.base_url, token, HttpOptions::from(&cfg.api))?;
    let cancel = CancelToken::new();
    let driver = UploadDriver::new(api)
        .with_backoff(cfg.retry.scheduler())
        .with_chunk_size(chunk_size)
        .with_cancel(cancel.clone());

    let report = run_batch(&driver, jobs, BatchOptions::from(&cfg.batch), store, &cancel)?;

    for v in &report.uploaded {
        println!("{:<4} {:<14} {}", v.index + 1, v.video_id.as_str(), v.title);
    }
    println!("Uploaded {} of {} video(s).", report.completed(), jobs.len());

    let Some(abort) = report.aborted else {
        return Ok(());
    };
    let err = anyhow::Error::new(abort.error);
    Err(match abort.snapshot {
        Some(path) => err.context(format!(
            "batch stopped with {} job(s) left; saved to {} (continue with `vidup resume`)",
            abort.remaining,
            path.display()
        )),
        None => err.context(format!("batch stopped with {} job(s) left", abort.remaining)),
    })
}
