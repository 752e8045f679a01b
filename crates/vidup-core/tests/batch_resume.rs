//! Integration test: gather a directory, run the batch until a job is rejected,
//! then resume from the saved worklist.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{Local, TimeZone};
use vidup_core::api::{ChunkBody, ChunkResponse, UploadApi};
use vidup_core::batch::{run_batch, BatchError, BatchOptions};
use vidup_core::control::CancelToken;
use vidup_core::driver::UploadDriver;
use vidup_core::gather::{gather, GatherOptions};
use vidup_core::job::UploadJob;
use vidup_core::retry::{BackoffScheduler, ChunkError};
use vidup_core::snapshot::SnapshotStore;

/// Accepts whole-file uploads, except for sources listed in `reject`.
#[derive(Default)]
struct FakeApi {
    reject: RefCell<HashSet<PathBuf>>,
    sessions: RefCell<Vec<PathBuf>>,
}

impl UploadApi for FakeApi {
    type Session = PathBuf;

    fn create_session(&self, job: &UploadJob, _total: u64) -> Result<PathBuf, ChunkError> {
        self.sessions.borrow_mut().push(job.source_path.clone());
        if self.reject.borrow().contains(&job.source_path) {
            return Err(ChunkError::Http {
                status: 400,
                body: "invalidTitle".to_string(),
            });
        }
        Ok(job.source_path.clone())
    }

    fn send_chunk(
        &self,
        session: &PathBuf,
        _chunk: &mut ChunkBody<'_>,
        _total: u64,
    ) -> Result<ChunkResponse, ChunkError> {
        let name = session.file_stem().unwrap().to_string_lossy().into_owned();
        Ok(ChunkResponse::Complete {
            video_id: Some(format!("yt-{name}")),
            body: String::new(),
        })
    }
}

fn touch(dir: &Path, name: &str, day: u32, hour: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, name.as_bytes()).unwrap();
    let mtime = Local.with_ymd_and_hms(2019, 9, day, hour, 0, 0).single().unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::from(mtime))
        .unwrap();
    path
}

#[test]
fn rejected_job_is_snapshotted_then_resumed() {
    let videos = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    touch(videos.path(), "a.mp4", 1, 9);
    let b = touch(videos.path(), "b.MP4", 1, 12);
    touch(videos.path(), "c.mov", 2, 9);
    touch(videos.path(), "skip.txt", 2, 9);

    let mut opts = GatherOptions::new(videos.path(), "My Vlog", "09-01-19", "09-02-19");
    opts.extensions = vec!["mp4".to_string(), "mov".to_string()];
    let jobs = gather(&opts).unwrap();
    assert_eq!(
        jobs.iter().map(|j| j.title.as_str()).collect::<Vec<_>>(),
        vec![
            "My Vlog, 09-01-19 (1 of 2)",
            "My Vlog, 09-01-19 (2 of 2)",
            "My Vlog, 09-02-19 (1 of 1)",
        ]
    );

    let api = FakeApi::default();
    api.reject.borrow_mut().insert(b.clone());
    let driver = UploadDriver::new(&api).with_backoff(BackoffScheduler::new(3, Duration::ZERO));
    let store = SnapshotStore::new(state.path().join("worklist.json"));
    let options = BatchOptions {
        max_failures_per_job: 2,
        inter_attempt_delay: Duration::ZERO,
    };

    let report = run_batch(&driver, &jobs, options, Some(&store), &CancelToken::new()).unwrap();
    assert_eq!(report.completed(), 1);
    assert_eq!(report.uploaded[0].video_id.as_str(), "yt-a");
    let abort = report.aborted.as_ref().expect("batch should stop");
    assert!(matches!(abort.error, BatchError::JobBudgetExhausted { index: 1, attempts: 2, .. }));
    // Two whole-job attempts on b, none on c.
    assert_eq!(api.sessions.borrow().iter().filter(|p| **p == b).count(), 2);
    assert_eq!(api.sessions.borrow().len(), 3);

    let remaining = store.load().unwrap().expect("snapshot written");
    assert_eq!(remaining, jobs[1..].to_vec());

    // Operator fixes the problem and resumes.
    api.reject.borrow_mut().clear();
    let report = run_batch(&driver, &remaining, options, Some(&store), &CancelToken::new()).unwrap();
    assert_eq!(report.completed(), 2);
    assert!(report.aborted.is_none());
    assert_eq!(
        report.uploaded.iter().map(|u| u.video_id.as_str()).collect::<Vec<_>>(),
        vec!["yt-b", "yt-c"]
    );
    assert!(store.load().unwrap().is_none());
}
