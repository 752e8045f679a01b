//! Minimal HTTP/1.1 server speaking the resumable upload protocol for integration tests.
//!
//! `POST /upload/youtube/v3/videos` opens a session and answers with a
//! `Location` header. `PUT /session/<n>` appends the body at its
//! `Content-Range` offset and answers `308` with `Range` until the declared
//! length has arrived, then `201` with a JSON video resource.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

pub const TOKEN: &str = "test-token";

#[derive(Debug, Default)]
pub struct ServerState {
    /// Statuses returned (instead of handling) for the next PUT requests.
    pub put_faults: VecDeque<u32>,
    /// Statuses returned for the next POST requests.
    pub post_faults: VecDeque<u32>,
    /// Leave `id` out of the final response.
    pub omit_id: bool,
    pub sessions: u32,
    pub declared_len: u64,
    pub received: Vec<u8>,
    /// `(offset, len)` of every PUT that reached the handler.
    pub puts: Vec<(u64, usize)>,
    pub titles: Vec<String>,
    pub privacy: Vec<String>,
}

pub struct UploadServer {
    pub base_url: String,
    pub state: Arc<Mutex<ServerState>>,
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(state: ServerState) -> UploadServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}", port);
    let state = Arc::new(Mutex::new(state));
    let shared = Arc::clone(&state);
    let base = base_url.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let shared = Arc::clone(&shared);
            let base = base.clone();
            thread::spawn(move || handle(stream, &shared, &base));
        }
    });
    UploadServer { base_url, state }
}

struct Request {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn read_request(stream: &TcpStream) -> Option<Request> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut h = String::new();
        reader.read_line(&mut h).ok()?;
        let h = h.trim_end();
        if h.is_empty() {
            break;
        }
        if let Some((k, v)) = h.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }
    let len: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).ok()?;
    Some(Request {
        method,
        path,
        headers,
        body,
    })
}

fn respond(mut stream: TcpStream, status: u32, reason: &str, headers: &[String], body: &str) {
    let mut out = format!("HTTP/1.1 {} {}\r\n", status, reason);
    for h in headers {
        out.push_str(h);
        out.push_str("\r\n");
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    let _ = stream.write_all(out.as_bytes());
    let _ = stream.flush();
}

fn handle(stream: TcpStream, state: &Mutex<ServerState>, base: &str) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(5)));
    let Some(req) = read_request(&stream) else {
        return;
    };
    let expected = format!("Bearer {}", TOKEN);
    if req.header("authorization") != Some(expected.as_str()) {
        respond(stream, 401, "Unauthorized", &[], r#"{"error":"unauthorized"}"#);
        return;
    }
    let mut st = state.lock().unwrap();
    match req.method.as_str() {
        "POST" if req.path.starts_with("/upload/youtube/v3/videos") => {
            if let Some(status) = st.post_faults.pop_front() {
                drop(st);
                respond(stream, status, "Fault", &[], "injected");
                return;
            }
            let meta: serde_json::Value = serde_json::from_slice(&req.body).unwrap_or_default();
            st.titles
                .push(meta["snippet"]["title"].as_str().unwrap_or_default().to_string());
            st.privacy.push(
                meta["status"]["privacyStatus"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
            );
            st.declared_len = req
                .header("x-upload-content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            st.received.clear();
            st.sessions += 1;
            let location = format!("Location: {}/session/{}", base, st.sessions);
            drop(st);
            respond(stream, 200, "OK", &[location], "");
        }
        "PUT" if req.path.starts_with("/session/") => {
            if let Some(status) = st.put_faults.pop_front() {
                drop(st);
                respond(stream, status, "Fault", &[], "injected");
                return;
            }
            let offset = req
                .header("content-range")
                .and_then(|v| v.strip_prefix("bytes "))
                .and_then(|v| v.split_once('-'))
                .and_then(|(start, _)| start.parse::<u64>().ok())
                .unwrap_or(0);
            st.puts.push((offset, req.body.len()));
            if offset != st.received.len() as u64 {
                drop(st);
                respond(stream, 400, "Bad Request", &[], "offset mismatch");
                return;
            }
            st.received.extend_from_slice(&req.body);
            let have = st.received.len() as u64;
            if have >= st.declared_len {
                let body = if st.omit_id {
                    r#"{"kind":"youtube#video"}"#.to_string()
                } else {
                    format!(r#"{{"kind":"youtube#video","id":"vid-{}"}}"#, st.sessions)
                };
                drop(st);
                respond(stream, 201, "Created", &[], &body);
            } else {
                drop(st);
                let range = format!("Range: bytes=0-{}", have - 1);
                respond(stream, 308, "Resume Incomplete", &[range], "");
            }
        }
        _ => {
            drop(st);
            respond(stream, 404, "Not Found", &[], "");
        }
    }
}
