//! File serving for the inspection front end.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::TcpStream;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::logging::log_request;

/// How long a client may take to send its request line.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("js", "text/javascript"),
    ("css", "text/css"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
];

pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    MIME_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, m)| *m)
        .unwrap_or("application/octet-stream")
}

/// Maps a request target onto a file under `root`. Drops the query string,
/// sends `/` to `index.html`, refuses anything that climbs out of `root`.
pub fn resolve(root: &Path, target: &str) -> Option<PathBuf> {
    let path = target.split(['?', '#']).next().unwrap_or("");
    let path = if path == "/" || path.is_empty() { "/index.html" } else { path };
    let rel = Path::new(path.trim_start_matches('/'));
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(rel))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            204 => "No Content",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let head = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        );
        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

fn not_found(target: &str) -> Response {
    let body = format!(
        "<h1>404 - File Not Found</h1>\n\
         <p>The file {} was not found.</p>\n\
         <p>Available files:</p>\n\
         <ul><li><a href=\"/index.html\">index.html</a> - Main Kart Check System</li></ul>\n",
        target
    );
    Response { status: 404, content_type: "text/html", body: body.into_bytes() }
}

/// `"GET /path HTTP/1.1"` -> `("GET", "/path")`
pub fn parse_request_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    Some((method, target))
}

pub fn handle(root: &Path, method: &str, target: &str) -> Response {
    match method {
        "OPTIONS" => {
            return Response { status: 204, content_type: "text/plain", body: Vec::new() };
        }
        "GET" | "HEAD" => {}
        _ => {
            return Response {
                status: 405,
                content_type: "text/plain",
                body: b"Method Not Allowed".to_vec(),
            };
        }
    }

    let Some(path) = resolve(root, target) else {
        return not_found(target);
    };
    match std::fs::read(&path) {
        Ok(content) => Response {
            status: 200,
            content_type: mime_for(&path),
            body: if method == "HEAD" { Vec::new() } else { content },
        },
        Err(err) if err.kind() == ErrorKind::NotFound => not_found(target),
        Err(_) if path.is_dir() => not_found(target),
        Err(err) => Response {
            status: 500,
            content_type: "text/plain",
            body: format!("Server Error: {:?}", err.kind()).into_bytes(),
        },
    }
}

/// Answers one request on `stream`. Returns `Ok(false)` when the client
/// sent no usable request line before `read_timeout`.
pub fn serve_connection(stream: &TcpStream, root: &Path, read_timeout: Duration) -> std::io::Result<bool> {
    stream.set_read_timeout(Some(read_timeout))?;
    let mut request = String::new();
    match BufReader::new(stream).read_line(&mut request) {
        Ok(_) => {}
        Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
            return Ok(false);
        }
        Err(err) => return Err(err),
    }
    let Some((method, target)) = parse_request_line(&request) else {
        return Ok(false);
    };
    let response = handle(root, method, target);
    log_request(method, target, response.status, response.body.len());
    let mut writer = stream;
    writer.write_all(&response.to_bytes())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_mime_lookup() {
        assert_eq!(mime_for(Path::new("index.html")), "text/html");
        assert_eq!(mime_for(Path::new("app.JS")), "text/javascript");
        assert_eq!(mime_for(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(mime_for(Path::new("data.bin")), "application/octet-stream");
        assert_eq!(mime_for(Path::new("Makefile")), "application/octet-stream");
    }

    #[test]
    fn test_resolve_root_and_traversal() {
        let root = Path::new("/srv/kart");
        assert_eq!(resolve(root, "/"), Some(root.join("index.html")));
        assert_eq!(resolve(root, "/style.css?v=2"), Some(root.join("style.css")));
        assert_eq!(resolve(root, "/../etc/passwd"), None);
        assert_eq!(resolve(root, "/a/../../b"), None);
    }

    #[test]
    fn test_parse_request_line() {
        assert_eq!(parse_request_line("GET /index.html HTTP/1.1"), Some(("GET", "/index.html")));
        assert_eq!(parse_request_line(""), None);
    }

    #[test]
    fn test_serves_file_with_cors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>karts</h1>").unwrap();
        let resp = handle(dir.path(), "GET", "/");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "text/html");
        let raw = String::from_utf8(resp.to_bytes()).unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.contains("Access-Control-Allow-Origin: *"));
        assert!(raw.ends_with("<h1>karts</h1>"));
    }

    #[test]
    fn test_missing_file_is_404_page() {
        let dir = tempfile::tempdir().unwrap();
        let resp = handle(dir.path(), "GET", "/nope.js");
        assert_eq!(resp.status, 404);
        assert!(String::from_utf8(resp.body).unwrap().contains("/nope.js"));
    }

    #[test]
    fn test_options_preflight() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(handle(dir.path(), "OPTIONS", "/").status, 204);
        assert_eq!(handle(dir.path(), "DELETE", "/").status, 405);
    }

    #[test]
    fn test_silent_client_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = thread::spawn(move || {
            let conn = TcpStream::connect(addr).unwrap();
            thread::sleep(Duration::from_millis(800));
            drop(conn);
        });

        let (stream, _) = listener.accept().unwrap();
        let start = Instant::now();
        let served = serve_connection(&stream, dir.path(), Duration::from_millis(50)).unwrap();
        assert!(!served);
        assert!(start.elapsed() < Duration::from_millis(600));
        client.join().unwrap();
    }

    #[test]
    fn test_serves_request_over_tcp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>karts</h1>").unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = thread::spawn(move || {
            let mut conn = TcpStream::connect(addr).unwrap();
            conn.write_all(b"GET / HTTP/1.1\r\n").unwrap();
            let mut raw = String::new();
            conn.read_to_string(&mut raw).unwrap();
            raw
        });

        let (stream, _) = listener.accept().unwrap();
        assert!(serve_connection(&stream, dir.path(), READ_TIMEOUT).unwrap());
        drop(stream);
        let raw = client.join().unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.ends_with("<h1>karts</h1>"));
    }
}
