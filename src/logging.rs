//! Structured logging for the inspection workflow.
//!
//! Every record is one JSON line carrying a run id, a sequence number,
//! a level, a domain and free-form data fields. Records go to
//! `$LOG_DIR/<run_id>/events.jsonl` (trace/debug to `trace.jsonl`) and are
//! echoed to stderr; stdout belongs to the console adapter.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Kart,      // Flagging and unflagging karts
    Ledger,    // Problem record writes
    Session,   // Edit cursor moves and refusals
    Submit,    // Batch validation and assembly
    Archive,   // Local archive persistence
    Sync,      // Remote spreadsheet dispatch
    Dashboard, // Queries and exports
    Server,    // Static asset serving
    System,    // Startup, shutdown
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Kart => "kart",
            Domain::Ledger => "ledger",
            Domain::Session => "session",
            Domain::Submit => "submit",
            Domain::Archive => "archive",
            Domain::Sync => "sync",
            Domain::Dashboard => "dashboard",
            Domain::Server => "server",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_sink(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| "out/runs".to_string());
        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
            return RunContext { run_id, events: None, trace: None };
        }

        RunContext {
            events: open_sink(run_dir.join("events.jsonl")),
            trace: open_sink(run_dir.join("trace.jsonl")),
            run_id,
        }
    })
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(Ok(mut w)) = writer.as_ref().map(|m| m.lock()) {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, mut fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));

    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));

    let line = Value::Object(entry).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    eprintln!("{}", line);
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_kart_flagged(kart: u32, flagged: bool) {
    log(
        Level::Debug,
        Domain::Kart,
        if flagged { "kart_flagged" } else { "kart_unflagged" },
        obj(&[("kart", json!(kart))]),
    );
}

pub fn log_edit_refused(requested: u32, blocking: u32) {
    log(
        Level::Warn,
        Domain::Session,
        "edit_blocked",
        obj(&[("requested", json!(requested)), ("blocking", json!(blocking))]),
    );
}

pub fn log_problems_saved(kart: u32, issues: usize, has_note: bool) {
    log(
        Level::Info,
        Domain::Ledger,
        "problems_saved",
        obj(&[
            ("kart", json!(kart)),
            ("issues", json!(issues)),
            ("has_note", json!(has_note)),
        ]),
    );
}

pub fn log_submit_rejected(reason: &str) {
    log(
        Level::Info,
        Domain::Submit,
        "submit_rejected",
        obj(&[("reason", v_str(reason))]),
    );
}

pub fn log_submission(submission_id: &str, entry_id: &str, karts: &[u32], issues: usize) {
    log(
        Level::Info,
        Domain::Submit,
        "submission_built",
        obj(&[
            ("submission_id", v_str(submission_id)),
            ("entry_id", v_str(entry_id)),
            ("karts", json!(karts)),
            ("issues", json!(issues)),
        ]),
    );
}

pub fn log_archive_write(path: &str, entries: usize, bytes: usize, sha256: &str) {
    log(
        Level::Info,
        Domain::Archive,
        "archive_written",
        obj(&[
            ("path", v_str(path)),
            ("entries", json!(entries)),
            ("bytes", json!(bytes)),
            ("sha256", v_str(sha256)),
        ]),
    );
}

pub fn log_sync_ok(submission_id: &str, sheet_name: Option<&str>, last_row: Option<u64>) {
    log(
        Level::Info,
        Domain::Sync,
        "sync_ok",
        obj(&[
            ("submission_id", v_str(submission_id)),
            ("sheet_name", sheet_name.map(v_str).unwrap_or(Value::Null)),
            ("last_row", last_row.map(|r| json!(r)).unwrap_or(Value::Null)),
        ]),
    );
}

pub fn log_sync_failed(submission_id: &str, reason: &str) {
    log(
        Level::Error,
        Domain::Sync,
        "sync_failed",
        obj(&[
            ("submission_id", v_str(submission_id)),
            ("msg", v_str("continuing with local save only")),
            ("reason", v_str(reason)),
        ]),
    );
}

pub fn log_request(method: &str, path: &str, status: u16, bytes: usize) {
    log(
        Level::Debug,
        Domain::Server,
        "request",
        obj(&[
            ("method", v_str(method)),
            ("path", v_str(path)),
            ("status", json!(status)),
            ("bytes", json!(bytes)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}
