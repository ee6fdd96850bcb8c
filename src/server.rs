//! Minimal dashboard HTTP server.
//!
//! Requests are handled one at a time, each running a fresh fetch → build.
//! A client that does not finish its request head within the read timeout is
//! dropped so it cannot stall the queue behind it.
//!
//! Endpoints:
//!   GET /                          - HTML page with the Sankey and dropdowns
//!   GET /api/graph?token=&direction= - view model + figure as JSON
//!   GET /api/tokens                - dropdown token list
//!   GET /api/health                - health check

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::{TcpListener, TcpStream};

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::fetch::FallbackChain;
use crate::flow::{Direction, Selection};
use crate::logging::{self, obj, v_str, Domain};
use crate::view::{render_with, ViewModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn ok(content_type: &'static str, body: String) -> Self {
        Self {
            status: 200,
            content_type,
            body,
        }
    }

    fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            502 => "Bad Gateway",
            _ => "Error",
        }
    }

    pub fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Connection: close\r\n\
             Content-Length: {}\r\n\r\n{}",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

/// Time allowed for a client to send its request line and headers.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Dashboard {
    chain: FallbackChain,
    default_selection: Selection,
    top_k: usize,
    read_timeout: Duration,
}

impl Dashboard {
    pub fn new(chain: FallbackChain, default_selection: Selection, top_k: usize) -> Self {
        Self {
            chain,
            default_selection,
            top_k,
            read_timeout: READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(
            FallbackChain::from_config(cfg)?,
            Selection {
                token: cfg.token.clone(),
                direction: cfg.direction,
            },
            cfg.top_k,
        ))
    }

    /// Token and direction from the query string; absent values use defaults.
    fn selection_from(&self, url: &url::Url) -> Result<Selection> {
        let mut sel = self.default_selection.clone();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "token" => {
                    let v = value.trim();
                    sel.token = if v.is_empty() { None } else { Some(v.to_string()) };
                }
                "direction" if !value.trim().is_empty() => sel.direction = Direction::parse(&value)?,
                _ => {}
            }
        }
        Ok(sel)
    }

    async fn view(&self, url: &url::Url) -> Result<ViewModel> {
        let sel = self.selection_from(url)?;
        render_with(&self.chain, &sel, self.top_k).await
    }

    /// Route one request line (`GET /path?query HTTP/1.1`).
    pub async fn handle(&self, request_line: &str) -> Response {
        let mut parts = request_line.split_whitespace();
        let (method, target) = match (parts.next(), parts.next()) {
            (Some(m), Some(t)) => (m, t),
            _ => return Response::json(400, json!({"error": "malformed request line"})),
        };
        if method != "GET" {
            return Response::json(405, json!({"error": "only GET is supported"}));
        }
        let url = match url::Url::parse("http://localhost").and_then(|base| base.join(target)) {
            Ok(u) => u,
            Err(e) => return Response::json(400, json!({"error": e.to_string()})),
        };

        let result = match url.path() {
            "/api/health" => return Response::json(200, json!({"status": "ok"})),
            "/" | "/index.html" => self.view(&url).await.map(|vm| Response::ok("text/html; charset=utf-8", vm.to_html())),
            "/api/graph" => self.view(&url).await.map(|vm| {
                let figure = vm.figure();
                Response::json(200, json!({"view": vm, "figure": figure}))
            }),
            "/api/tokens" => self
                .view(&url)
                .await
                .map(|vm| Response::json(200, json!({"tokens": vm.tokens, "origin": vm.origin}))),
            _ => return Response::ok("text/plain", "Not Found".to_string()).with_status(404),
        };

        result.unwrap_or_else(error_response)
    }
}

fn error_response(err: DashboardError) -> Response {
    let status = match err {
        DashboardError::Config(_) => 400,
        _ => 502,
    };
    logging::error(
        Domain::Server,
        "request_failed",
        obj(&[("kind", v_str(err.kind())), ("msg", v_str(&err.to_string()))]),
    );
    Response::json(status, json!({"error": err.to_string(), "kind": err.kind()}))
}

/// Request line, with the header block consumed; `None` on immediate EOF.
async fn read_head<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> std::io::Result<Option<String>> {
    let request_line = match lines.next_line().await? {
        Some(line) => line,
        None => return Ok(None),
    };
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            break;
        }
    }
    Ok(Some(request_line))
}

async fn serve_connection(dashboard: &Dashboard, stream: TcpStream, peer: SocketAddr) -> Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let request_line = match tokio::time::timeout(dashboard.read_timeout, read_head(&mut lines)).await {
        Ok(Ok(Some(line))) => line,
        Ok(Ok(None)) => return Ok(()),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            logging::warn(
                Domain::Server,
                "read_timeout",
                obj(&[
                    ("peer", v_str(&peer.to_string())),
                    ("timeout_ms", json!(dashboard.read_timeout.as_millis() as u64)),
                ]),
            );
            return Ok(());
        }
    };
    let resp = dashboard.handle(&request_line).await;
    logging::info(
        Domain::Server,
        "request",
        obj(&[("line", v_str(&request_line)), ("status", json!(resp.status))]),
    );
    write.write_all(resp.to_http().as_bytes()).await?;
    write.shutdown().await?;
    Ok(())
}

/// A failed accept is logged and skipped; the listener stays up.
fn accepted<T>(result: std::io::Result<T>) -> Option<T> {
    match result {
        Ok(conn) => Some(conn),
        Err(e) => {
            logging::warn(Domain::Server, "accept_error", obj(&[("msg", v_str(&e.to_string()))]));
            None
        }
    }
}

pub async fn serve(dashboard: Dashboard, listener: TcpListener) -> Result<()> {
    loop {
        let (stream, peer) = match accepted(listener.accept().await) {
            Some(conn) => conn,
            None => continue,
        };
        if let Err(e) = serve_connection(&dashboard, stream, peer).await {
            logging::warn(
                Domain::Server,
                "connection_error",
                obj(&[("peer", v_str(&peer.to_string())), ("msg", v_str(&e.to_string()))]),
            );
        }
    }
}
