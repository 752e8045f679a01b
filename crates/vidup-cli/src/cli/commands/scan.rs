//! `vidup scan <dir>` – show the worklist without uploading.

use anyhow::Result;
use vidup_core::config::VidupConfig;
use vidup_core::gather::gather;

use super::worklist::gather_options;
use crate::cli::GatherArgs;

pub fn run_scan(cfg: &VidupConfig, args: &GatherArgs) -> Result<()> {
    let jobs = gather(&gather_options(cfg, args))?;
    if jobs.is_empty() {
        println!("No videos matched.");
        return Ok(());
    }
    println!("{:<4} {:<10} {:<36} {}", "#", "PRIVACY", "TITLE", "FILE");
    for (i, job) in jobs.iter().enumerate() {
        println!(
            "{:<4} {:<10} {:<36} {}",
            i + 1,
            job.privacy_status.as_str(),
            job.title,
            job.source_path.display()
        );
    }
    Ok(())
}
