//! YouTube Data API v3 resumable uploads over libcurl.
//!
//! Session start: `POST /upload/youtube/v3/videos?uploadType=resumable` with
//! the video metadata as JSON; the session URI comes back in `Location`.
//! Each chunk is a `PUT` to that URI with `Content-Range`. The server answers
//! `308 Resume Incomplete` (with `Range: bytes=0-N`) until the last byte
//! arrives, then `200`/`201` with the video resource.

use std::io::Read;
use std::str;
use std::time::Duration;

use serde_json::json;
use url::Url;

use super::{ChunkBody, ChunkResponse, UploadApi};
use crate::auth::AccessToken;
use crate::config::ApiConfig;
use crate::job::UploadJob;
use crate::retry::{classify_curl_error, ChunkError};

const UPLOAD_PATH: &str = "upload/youtube/v3/videos";

/// Transport settings for `HttpUploadApi`.
#[derive(Debug, Clone, Copy)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Abort when throughput stays below 1 KiB/s for this long.
    pub low_speed_time: Duration,
    /// Immediate re-sends on transport errors inside this layer. 0 leaves
    /// every retry decision (and its backoff) to the upload driver.
    pub transport_retries: u32,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_time: Duration::from_secs(60),
            transport_retries: 0,
        }
    }
}

impl From<&ApiConfig> for HttpOptions {
    fn from(cfg: &ApiConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            transport_retries: cfg.transport_retries,
        }
    }
}

/// Resumable upload client for the YouTube Data API.
#[derive(Debug, Clone)]
pub struct HttpUploadApi {
    base_url: Url,
    token: AccessToken,
    options: HttpOptions,
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Post,
    Put,
}

/// Request body: small in-memory JSON, or a file range streamed by curl.
enum Body<'a, 'f> {
    Bytes(&'a [u8]),
    Chunk(&'a mut ChunkBody<'f>),
}

impl Body<'_, '_> {
    fn len(&self) -> u64 {
        match self {
            Body::Bytes(b) => b.len() as u64,
            Body::Chunk(c) => c.len(),
        }
    }

    fn reader(&mut self) -> Result<Box<dyn Read + '_>, ChunkError> {
        match self {
            Body::Bytes(b) => Ok(Box::new(*b)),
            Body::Chunk(c) => Ok(Box::new(c.reader().map_err(ChunkError::Io)?)),
        }
    }
}

/// What came back from one curl transfer.
struct RawResponse {
    status: u32,
    headers: Vec<String>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl HttpUploadApi {
    pub fn new(base_url: &str, token: AccessToken, options: HttpOptions) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid API base URL {:?}: {}", base_url, e))?;
        // `Url::join` drops the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            token,
            options,
        })
    }

    fn session_start_url(&self) -> Result<Url, ChunkError> {
        let mut url = self
            .base_url
            .join(UPLOAD_PATH)
            .map_err(|e| ChunkError::Malformed(format!("upload URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("part", "snippet,status");
        Ok(url)
    }

    /// Run one request, re-sending immediately on transport errors up to
    /// `transport_retries` times.
    fn execute(
        &self,
        method: Method,
        url: &str,
        headers: &[String],
        mut body: Body<'_, '_>,
    ) -> Result<RawResponse, ChunkError> {
        let mut attempt = 0u32;
        loop {
            match self.perform(method, url, headers, &mut body) {
                Err(ChunkError::Curl(e))
                    if attempt < self.options.transport_retries
                        && classify_curl_error(&e).is_retriable() =>
                {
                    attempt += 1;
                    tracing::debug!(attempt, error = %e, "transport retry");
                }
                other => return other,
            }
        }
    }

    fn perform(
        &self,
        method: Method,
        url: &str,
        headers: &[String],
        body: &mut Body<'_, '_>,
    ) -> Result<RawResponse, ChunkError> {
        let body_len = body.len();
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(self.options.low_speed_time)?;
        match method {
            Method::Post => {
                easy.post(true)?;
                easy.post_field_size(body_len)?;
            }
            Method::Put => {
                easy.upload(true)?;
                easy.in_filesize(body_len)?;
            }
        }

        let mut list = curl::easy::List::new();
        list.append(&format!("Authorization: Bearer {}", self.token.secret()))?;
        // No `Expect: 100-continue` round trip before each chunk.
        list.append("Expect:")?;
        for h in headers {
            list.append(h)?;
        }
        easy.http_headers(list)?;

        let mut response_headers: Vec<String> = Vec::new();
        let mut response_body: Vec<u8> = Vec::new();
        let mut source = body.reader()?;
        let mut read_error: Option<std::io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.read_function(|into| match source.read(into) {
                Ok(n) => Ok(n),
                Err(e) => {
                    read_error = Some(e);
                    Err(curl::easy::ReadError::Abort)
                }
            })?;
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    response_headers.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                response_body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()
        };
        if let Some(e) = read_error {
            return Err(ChunkError::Io(e));
        }
        performed?;

        let status = easy.response_code()?;
        Ok(RawResponse {
            status,
            headers: response_headers,
            body: response_body,
        })
    }
}

impl UploadApi for HttpUploadApi {
    type Session = String;

    fn create_session(&self, job: &UploadJob, total_bytes: u64) -> Result<String, ChunkError> {
        let url = self.session_start_url()?;
        let metadata = json!({
            "snippet": {
                "title": job.title,
                "description": job.description,
                "categoryId": job.category_id.to_string(),
            },
            "status": {
                "privacyStatus": job.privacy_status.as_str(),
            },
        });
        let body = serde_json::to_vec(&metadata)
            .map_err(|e| ChunkError::Malformed(format!("encode metadata: {}", e)))?;
        let headers = [
            "Content-Type: application/json; charset=UTF-8".to_string(),
            format!("X-Upload-Content-Length: {}", total_bytes),
            "X-Upload-Content-Type: video/*".to_string(),
        ];

        let resp = self.execute(Method::Post, url.as_str(), &headers, Body::Bytes(&body))?;
        if !(200..300).contains(&resp.status) {
            return Err(ChunkError::Http {
                status: resp.status,
                body: resp.body_text(),
            });
        }
        let location = resp
            .header("location")
            .ok_or_else(|| ChunkError::Malformed("session response has no Location header".into()))?;
        tracing::debug!(title = %job.title, "resumable session opened");
        Ok(location.to_string())
    }

    fn send_chunk(
        &self,
        session: &String,
        chunk: &mut ChunkBody<'_>,
        total_bytes: u64,
    ) -> Result<ChunkResponse, ChunkError> {
        let range = if chunk.is_empty() {
            format!("Content-Range: bytes */{}", total_bytes)
        } else {
            format!(
                "Content-Range: bytes {}-{}/{}",
                chunk.offset(),
                chunk.offset() + chunk.len() - 1,
                total_bytes
            )
        };
        let resp = self.execute(Method::Put, session, &[range], Body::Chunk(chunk))?;
        match resp.status {
            308 => {
                let acknowledged = match resp.header("range") {
                    Some(v) => parse_range_end(v)
                        .ok_or_else(|| ChunkError::Malformed(format!("Range header {:?}", v)))?,
                    None => 0,
                };
                Ok(ChunkResponse::Incomplete { acknowledged })
            }
            200 | 201 => {
                let body = resp.body_text();
                let video_id = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string));
                Ok(ChunkResponse::Complete { video_id, body })
            }
            status => Err(ChunkError::Http {
                status,
                body: resp.body_text(),
            }),
        }
    }
}

/// `bytes=0-N` → `N + 1`, the number of bytes the server holds.
fn parse_range_end(value: &str) -> Option<u64> {
    let range = value.trim().strip_prefix("bytes=")?;
    let (start, end) = range.split_once('-')?;
    if start.trim() != "0" {
        return None;
    }
    end.trim().parse::<u64>().ok().map(|n| n + 1)
}
