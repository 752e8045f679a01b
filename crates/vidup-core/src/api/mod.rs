//! Remote upload API used by the driver.
//!
//! The driver only needs two calls: open a resumable session for a job, then
//! push byte ranges into it. `HttpUploadApi` speaks the YouTube Data API v3
//! resumable protocol over libcurl; tests plug in scripted fakes.

mod http;

pub use http::{HttpOptions, HttpUploadApi};

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Take};

use crate::job::UploadJob;
use crate::retry::ChunkError;

/// Byte range `[offset, offset + len)` of a source file, streamed from disk
/// while the request is sent. `reader` rewinds, so a re-sent request starts
/// from the first byte of the range again.
#[derive(Debug)]
pub struct ChunkBody<'a> {
    file: &'a mut File,
    offset: u64,
    len: u64,
}

impl<'a> ChunkBody<'a> {
    pub fn new(file: &'a mut File, offset: u64, len: u64) -> Self {
        Self { file, offset, len }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reader over the range, positioned at its first byte.
    pub fn reader(&mut self) -> io::Result<Take<&mut File>> {
        self.file.seek(SeekFrom::Start(self.offset))?;
        Ok((&mut *self.file).take(self.len))
    }

    /// Whole range in memory. For fakes and small chunks only.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.len.min(1 << 20) as usize);
        self.reader()?.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Server answer to one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkResponse {
    /// More bytes expected; the server holds `[0, acknowledged)`.
    Incomplete { acknowledged: u64 },
    /// The upload finished. `video_id` is the identifier from the final
    /// response, if it had one; `body` is kept for diagnostics.
    Complete {
        video_id: Option<String>,
        body: String,
    },
}

/// A remote service that accepts resumable uploads.
pub trait UploadApi {
    /// Opaque handle for one upload session (the session URI over HTTP).
    type Session;

    /// Open a resumable session for `job` whose source is `total_bytes` long.
    fn create_session(&self, job: &UploadJob, total_bytes: u64)
        -> Result<Self::Session, ChunkError>;

    /// Send the bytes of `chunk`, which starts at `chunk.offset()` of the source.
    fn send_chunk(
        &self,
        session: &Self::Session,
        chunk: &mut ChunkBody<'_>,
        total_bytes: u64,
    ) -> Result<ChunkResponse, ChunkError>;
}

impl<A: UploadApi + ?Sized> UploadApi for &A {
    type Session = A::Session;

    fn create_session(&self, job: &UploadJob, total_bytes: u64) -> Result<Self::Session, ChunkError> {
        (**self).create_session(job, total_bytes)
    }

    fn send_chunk(
        &self,
        session: &Self::Session,
        chunk: &mut ChunkBody<'_>,
        total_bytes: u64,
    ) -> Result<ChunkResponse, ChunkError> {
        (**self).send_chunk(session, chunk, total_bytes)
    }
}
