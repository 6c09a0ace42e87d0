//! Static asset server for the kart checklist front end.
//!
//! Serves files from SERVE_ROOT (default ".") on SERVE_HOST:SERVE_PORT
//! (default 127.0.0.1:8000). Run with: cargo run --bin kartcheck_server

use std::net::TcpListener;
use std::path::PathBuf;

use anyhow::{Context, Result};
use kartcheck::config::Config;
use kartcheck::logging::{log, obj, v_str, Domain, Level};
use kartcheck::static_files::{serve_connection, READ_TIMEOUT};

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let root = PathBuf::from(&cfg.serve_root);
    let addr = cfg.serve_addr();
    let listener = TcpListener::bind(&addr).with_context(|| format!("binding {}", addr))?;

    log(
        Level::Info,
        Domain::Server,
        "listening",
        obj(&[("addr", v_str(&addr)), ("root", v_str(&root.to_string_lossy()))]),
    );
    println!("Kart Check server running at http://{}", addr);
    println!("Serving files from: {}", root.display());
    println!("Main page: http://{}/index.html", addr);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Err(err) = serve_connection(&stream, &root, READ_TIMEOUT) {
            log(
                Level::Warn,
                Domain::Server,
                "connection_error",
                obj(&[("error", v_str(&err.to_string()))]),
            );
        }
    }
    Ok(())
}
