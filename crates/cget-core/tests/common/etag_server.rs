//! Minimal HTTP/1.1 server with ETag / Last-Modified validators for integration tests.
//!
//! Routes:
//! - `/doc`: fixed body, `ETag: "v1"`, `Last-Modified: Wed, 21 Oct 2015 07:28:00 GMT`.
//!   Answers 304 when If-None-Match matches, or (without If-None-Match) when
//!   If-Modified-Since is not older than the document.
//! - `/etag-only`: like `/doc` without Last-Modified.
//! - `/changing`: new body and ETag on every request; never 304.
//! - `/redirect`: 302 to `/doc`.
//! - `/big`: 64 KiB body.
//! - `/split-head`, `/split-tail`: the two halves of a UTF-8 "€" split across
//!   responses (`abc` + first byte, then the last two bytes + `def`).
//! - anything else: 404.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

pub const DOC_BODY: &str = "hello, conditional world\n";
pub const DOC_ETAG: &str = "\"v1\"";
pub const DOC_LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
pub const DOC_MTIME: i64 = 1_445_412_480;
pub const BIG_LEN: usize = 64 * 1024;
pub const SPLIT_HEAD: &[u8] = b"abc\xe2";
pub const SPLIT_TAIL: &[u8] = b"\x82\xacdef";

/// Running server: base URL (e.g. "http://127.0.0.1:12345") and a log of raw requests.
pub struct EtagServer {
    pub base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl EtagServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Raw request heads received so far, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts the server in a background thread. It runs until the process exits.
pub fn start() -> EtagServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    let counter = Arc::new(AtomicUsize::new(0));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let log = Arc::clone(&log);
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &log, &counter));
        }
    });
    EtagServer {
        base: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

struct Request {
    path: String,
    if_none_match: Option<String>,
    if_modified_since: Option<String>,
}

fn handle(mut stream: std::net::TcpStream, log: &Mutex<Vec<String>>, counter: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let raw = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    log.lock().unwrap().push(raw.to_string());
    let req = parse_request(raw);

    match req.path.as_str() {
        "/doc" => serve_validated(&mut stream, &req, Some(DOC_LAST_MODIFIED)),
        "/etag-only" => serve_validated(&mut stream, &req, None),
        "/changing" => {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let etag = format!("\"rev-{}\"", n);
            let body = format!("revision {}\n", n);
            respond(&mut stream, "200 OK", &[("ETag", etag.as_str())], body.as_bytes());
        }
        "/redirect" => respond(&mut stream, "302 Found", &[("Location", "/doc")], b""),
        "/big" => {
            let body = vec![b'x'; BIG_LEN];
            respond(&mut stream, "200 OK", &[("ETag", "\"big\"")], &body);
        }
        "/split-head" => respond(&mut stream, "200 OK", &[], SPLIT_HEAD),
        "/split-tail" => respond(&mut stream, "200 OK", &[], SPLIT_TAIL),
        _ => respond(&mut stream, "404 Not Found", &[], b"not found\n"),
    }
}

fn serve_validated(stream: &mut std::net::TcpStream, req: &Request, last_modified: Option<&str>) {
    let unchanged = match (&req.if_none_match, &req.if_modified_since, last_modified) {
        (Some(inm), _, _) => inm == DOC_ETAG,
        (None, Some(ims), Some(lm)) => match (parse_date(ims), parse_date(lm)) {
            (Some(since), Some(doc)) => doc <= since,
            _ => false,
        },
        _ => false,
    };
    let mut headers = vec![("ETag", DOC_ETAG)];
    if let Some(lm) = last_modified {
        headers.push(("Last-Modified", lm));
    }
    if unchanged {
        respond(stream, "304 Not Modified", &headers, b"");
    } else {
        respond(stream, "200 OK", &headers, DOC_BODY.as_bytes());
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, headers: &[(&str, &str)], body: &[u8]) {
    let mut head = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status);
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    if !status.starts_with("304") {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn parse_date(value: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.timestamp())
}

fn parse_request(raw: &str) -> Request {
    let mut req = Request {
        path: String::new(),
        if_none_match: None,
        if_modified_since: None,
    };
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if req.path.is_empty() {
            req.path = line.split_whitespace().nth(1).unwrap_or("/").to_string();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim().to_string();
            if name.eq_ignore_ascii_case("if-none-match") && !value.is_empty() {
                req.if_none_match = Some(value);
            } else if name.eq_ignore_ascii_case("if-modified-since") {
                req.if_modified_since = Some(value);
            }
        }
    }
    req
}
