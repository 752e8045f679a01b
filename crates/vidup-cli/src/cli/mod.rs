//! CLI for the vidup batch uploader.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use vidup_core::config;
use vidup_core::job::PrivacyStatus;

use commands::{run_resume, run_scan, run_upload};

/// Top-level CLI for vidup.
#[derive(Debug, Parser)]
#[command(name = "vidup")]
#[command(about = "vidup: resumable batch video uploader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Which videos to pick up and how to label them.
#[derive(Debug, Clone, Args)]
pub struct GatherArgs {
    /// Directory containing the videos.
    pub dir: PathBuf,

    /// Title prefix; each video is titled "<TITLE>, <date> (k of n)".
    #[arg(long, short = 't')]
    pub title: String,

    /// First day to include (MM-DD-YY).
    #[arg(long, value_name = "MM-DD-YY")]
    pub begin: String,

    /// Last day to include (MM-DD-YY).
    #[arg(long, value_name = "MM-DD-YY")]
    pub end: String,

    /// Description applied to every video.
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// File extension to include (repeatable). Defaults to the configured list.
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Category id. Defaults to the configured category.
    #[arg(long)]
    pub category: Option<u32>,

    /// public, private or unlisted. Defaults to the configured privacy.
    #[arg(long)]
    pub privacy: Option<PrivacyStatus>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the videos that would be uploaded, with their titles.
    Scan {
        #[command(flatten)]
        gather: GatherArgs,
    },

    /// Gather videos from a directory and upload them in order.
    Upload {
        #[command(flatten)]
        gather: GatherArgs,

        /// Where to save the remaining worklist if the batch stops.
        #[arg(long, value_name = "PATH")]
        snapshot: Option<PathBuf>,

        /// Do not save the remaining worklist if the batch stops.
        #[arg(long, conflicts_with = "snapshot")]
        no_snapshot: bool,

        /// Start even if the snapshot file still holds jobs from a stopped batch;
        /// those jobs are dropped.
        #[arg(long, conflicts_with = "no_snapshot")]
        discard_snapshot: bool,
    },

    /// Continue a stopped batch from its saved worklist.
    Resume {
        /// Saved worklist to load (default: the state directory's worklist.json).
        #[arg(long, value_name = "PATH")]
        snapshot: Option<PathBuf>,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Scan { gather } => run_scan(&cfg, &gather)?,
            CliCommand::Upload {
                gather,
                snapshot,
                no_snapshot,
                discard_snapshot,
            } => run_upload(&cfg, &gather, snapshot, no_snapshot, discard_snapshot)?,
            CliCommand::Resume { snapshot } => run_resume(&cfg, snapshot)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
