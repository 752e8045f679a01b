//! Build the upload worklist from a directory of videos.
//!
//! Files are filtered by extension and by local modification date, numbered
//! per calendar day in listing order, and returned oldest first.

mod date;
mod title;

pub use date::{format_date, local_date, parse_date, DATE_FORMAT};
pub use title::{rank_by_day, title_for, DayRank};

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::job::{PrivacyStatus, UploadJob, DEFAULT_CATEGORY_ID};

#[derive(Debug, thiserror::Error)]
pub enum GatherError {
    #[error("{} is not a valid directory", .0.display())]
    InvalidDirectory(PathBuf),
    #[error("invalid date {value:?}: expected MM-DD-YY")]
    InvalidDateFormat { value: String },
    #[error("begin date {begin} is after end date {end}")]
    InvalidDateRange { begin: String, end: String },
    #[error("scan {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Inputs for one directory scan.
#[derive(Debug, Clone)]
pub struct GatherOptions {
    pub directory: PathBuf,
    pub title_prefix: String,
    pub description: String,
    /// First date to include, `MM-DD-YY`.
    pub begin_date: String,
    /// Last date to include (the whole day), `MM-DD-YY`.
    pub end_date: String,
    /// Accepted name suffixes, matched case-insensitively (`"mp4"` or `".mp4"`).
    pub extensions: Vec<String>,
    pub category_id: u32,
    pub privacy: PrivacyStatus,
}

impl GatherOptions {
    pub fn new(
        directory: impl Into<PathBuf>,
        title_prefix: impl Into<String>,
        begin_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            title_prefix: title_prefix.into(),
            description: String::new(),
            begin_date: begin_date.into(),
            end_date: end_date.into(),
            extensions: vec!["mp4".to_string()],
            category_id: DEFAULT_CATEGORY_ID,
            privacy: PrivacyStatus::Unlisted,
        }
    }
}

/// A file that passed the filters, before its title is known.
struct Candidate {
    path: PathBuf,
    mtime: SystemTime,
    date: NaiveDate,
}

/// Scan `opts.directory` and return upload jobs ordered by modification time.
pub fn gather(opts: &GatherOptions) -> Result<Vec<UploadJob>, GatherError> {
    if !opts.directory.is_dir() {
        return Err(GatherError::InvalidDirectory(opts.directory.clone()));
    }
    let begin = parse_date(&opts.begin_date)?;
    let end = parse_date(&opts.end_date)?;
    if begin > end {
        return Err(GatherError::InvalidDateRange {
            begin: opts.begin_date.clone(),
            end: opts.end_date.clone(),
        });
    }

    let extensions: Vec<String> = opts
        .extensions
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let mut candidates = Vec::new();
    for (name, path) in list_sorted(&opts.directory)? {
        let lower = name.to_lowercase();
        if !extensions.iter().any(|ext| lower.ends_with(ext.as_str())) {
            continue;
        }
        let Some(mtime) = stat_file(&path)? else {
            continue;
        };
        let date = local_date(mtime);
        if date < begin || date > end {
            tracing::debug!(file = %name, date = %format_date(date), "outside date range");
            continue;
        }
        candidates.push(Candidate { path, mtime, date });
    }

    let dates: Vec<NaiveDate> = candidates.iter().map(|c| c.date).collect();
    let ranks = rank_by_day(&dates);

    let mut ranked: Vec<(Candidate, DayRank)> = candidates.into_iter().zip(ranks).collect();
    // Stable: files with equal mtimes keep listing order.
    ranked.sort_by_key(|(c, _)| c.mtime);

    let jobs: Vec<UploadJob> = ranked
        .into_iter()
        .map(|(c, rank)| UploadJob {
            title: title_for(&opts.title_prefix, c.date, rank),
            source_path: c.path,
            description: opts.description.clone(),
            category_id: opts.category_id,
            privacy_status: opts.privacy,
        })
        .collect();

    tracing::info!(
        dir = %opts.directory.display(),
        begin = %opts.begin_date,
        end = %opts.end_date,
        count = jobs.len(),
        "gathered upload jobs"
    );
    Ok(jobs)
}

/// Directory entries as `(file name, path)`, sorted by file name so the
/// per-day numbering does not depend on the filesystem's iteration order.
fn list_sorted(dir: &Path) -> Result<Vec<(String, PathBuf)>, GatherError> {
    let io_err = |source| GatherError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Modification time of a regular file (symlinks followed); None for anything else.
fn stat_file(path: &Path) -> Result<Option<SystemTime>, GatherError> {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        // Dangling symlink or entry removed during the scan.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(GatherError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if !meta.is_file() {
        return Ok(None);
    }
    let mtime = meta.modified().map_err(|source| GatherError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(mtime))
}
