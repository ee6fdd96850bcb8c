//! Structured JSON-lines logging.
//!
//! Every record carries a run id and a monotonically increasing sequence
//! number. Records go to stderr (stdout is left to the page/JSON output) and,
//! when `LOG_DIR` is set, are appended to `{LOG_DIR}/{run_id}/events.jsonl`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Levels and domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or(Level::Info)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Fetch,   // provider requests, fallbacks
    Graph,   // selection and reshaping
    View,    // page/figure rendering
    Server,  // dashboard HTTP server
    System,  // startup, shutdown
    Profile, // timings
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Fetch => "fetch",
            Domain::Graph => "graph",
            Domain::View => "view",
            Domain::Server => "server",
            Domain::System => "system",
            Domain::Profile => "profile",
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

struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
}

/// `events.jsonl` under `run_dir`, opened for append so a reused RUN_ID
/// keeps earlier records.
fn open_events(run_dir: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(run_dir.join("events.jsonl"))
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let events = std::env::var("LOG_DIR").ok().and_then(|base| {
            let mut run_dir = PathBuf::from(base);
            run_dir.push(&run_id);
            if let Err(err) = create_dir_all(&run_dir) {
                eprintln!("[log] failed to create run dir: {}", err);
                return None;
            }
            match open_events(&run_dir) {
                Ok(f) => Some(Mutex::new(BufWriter::new(f))),
                Err(err) => {
                    eprintln!("[log] failed to create events log: {}", err);
                    None
                }
            }
        });
        RunContext { run_id, events }
    })
}

const REDACTED_KEYS: [&str; 5] = [
    "api_key",
    "x-dune-api-key",
    "authorization",
    "Authorization",
    "dune_api_key",
];

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in REDACTED_KEYS {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

/// Strip the `api_key` query parameter from a URL before it is logged.
pub fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| {
                    let v = if k == "api_key" { "[REDACTED]".to_string() } else { v.into_owned() };
                    (k.into_owned(), v)
                })
                .collect();
            if pairs.is_empty() {
                return parsed.to_string();
            }
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

// =============================================================================
// Core logging
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    let line = format_record(level, domain, event, fields);
    let ctx = ensure_run_context();
    if let Some(events) = &ctx.events {
        if let Ok(mut w) = events.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
    }
    eprintln!("{}", line);
}

fn format_record(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) -> String {
    let ctx = ensure_run_context();
    let mut data = sanitize_fields(fields);
    let msg = data.remove("msg").unwrap_or(Value::String(String::new()));

    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry).to_string()
}

pub fn info(domain: Domain, event: &str, fields: Map<String, Value>) {
    log(Level::Info, domain, event, fields);
}

pub fn warn(domain: Domain, event: &str, fields: Map<String, Value>) {
    log(Level::Warn, domain, event, fields);
}

pub fn debug(domain: Domain, event: &str, fields: Map<String, Value>) {
    log(Level::Debug, domain, event, fields);
}

pub fn error(domain: Domain, event: &str, fields: Map<String, Value>) {
    log(Level::Error, domain, event, fields);
}

// =============================================================================
// Domain helpers
// =============================================================================

pub fn log_fetch_request(provider: &str, url: &str) {
    debug(
        Domain::Fetch,
        "request",
        obj(&[("provider", v_str(provider)), ("url", v_str(&redact_url(url)))]),
    );
}

pub fn log_fetch_result(provider: &str, rows: usize) {
    info(
        Domain::Fetch,
        "rows",
        obj(&[("provider", v_str(provider)), ("rows", json!(rows))]),
    );
}

pub fn log_fallback(from: &str, to: &str, reason: &str) {
    warn(
        Domain::Fetch,
        "fallback",
        obj(&[
            ("from", v_str(from)),
            ("to", v_str(to)),
            ("reason", v_str(reason)),
        ]),
    );
}

// =============================================================================
// Field helpers
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

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling scope
// =============================================================================

/// Emits elapsed wall time at trace level on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Map<String, Value>,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self::with_context(label, &[])
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: obj(fields),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = std::mem::take(&mut self.context);
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}
