//! Minimal HTTP/1.1 responder for telemetry queries.
//!
//! `GET /telemetry` returns the window snapshot as a JSON array, `GET /stats`
//! returns the engine counters. Every other path answers 404. One request per
//! connection.

use crate::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use vibra_core::{EngineStats, TelemetryWindow};

/// Request line plus headers, including line terminators.
const MAX_HEADER_BYTES: u64 = 8 * 1024;

const DEFAULT_HEADER_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on input discarded after a rejected request.
const MAX_DRAIN_BYTES: u64 = 64 * 1024;
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

pub struct TelemetryServer {
    listener: TcpListener,
    telemetry: Arc<TelemetryWindow>,
    stats: Arc<EngineStats>,
    header_timeout: Duration,
}

impl TelemetryServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        telemetry: Arc<TelemetryWindow>,
        stats: Arc<EngineStats>,
    ) -> Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
            telemetry,
            stats,
            header_timeout: DEFAULT_HEADER_TIMEOUT,
        })
    }

    /// Time a client gets to send its request head before `408`.
    pub fn with_header_timeout(mut self, timeout: Duration) -> Self {
        self.header_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!(addr = ?self.listener.local_addr().ok(), "telemetry endpoint listening");

        loop {
            let (stream, peer) = self.listener.accept().await?;
            let telemetry = self.telemetry.clone();
            let stats = self.stats.clone();
            let header_timeout = self.header_timeout;
            tokio::spawn(async move {
                if let Err(e) = respond(stream, &telemetry, &stats, header_timeout).await {
                    tracing::debug!(%peer, "telemetry request failed: {e}");
                }
            });
        }
    }
}

#[derive(Debug, PartialEq)]
enum Head {
    Request(String),
    TooLarge,
    Closed,
}

/// Read the request head without buffering more than `MAX_HEADER_BYTES`.
async fn read_head<R: AsyncBufRead + Unpin>(reader: R) -> std::io::Result<Head> {
    let mut limited = reader.take(MAX_HEADER_BYTES);
    let mut request_line = None;
    let mut line = Vec::new();

    loop {
        line.clear();
        limited.read_until(b'\n', &mut line).await?;

        if !line.ends_with(b"\n") {
            if limited.limit() == 0 {
                return Ok(Head::TooLarge);
            }
            return Ok(request_line.map_or(Head::Closed, Head::Request));
        }
        if line == b"\r\n" || line == b"\n" {
            return Ok(request_line.map_or(Head::Closed, Head::Request));
        }
        if request_line.is_none() {
            request_line = Some(String::from_utf8_lossy(&line).trim_end().to_string());
        }
    }
}

async fn respond(
    stream: TcpStream,
    telemetry: &TelemetryWindow,
    stats: &EngineStats,
    header_timeout: Duration,
) -> Result<()> {
    let mut reader = BufReader::new(stream);

    let (status, body, rejected) =
        match tokio::time::timeout(header_timeout, read_head(&mut reader)).await {
            Ok(head) => match head? {
                Head::Request(line) => {
                    let (status, body) = route(&line, telemetry, stats)?;
                    (status, body, false)
                }
                Head::TooLarge => (
                    "431 Request Header Fields Too Large",
                    r#"{"error":"request header too large"}"#.to_string(),
                    true,
                ),
                Head::Closed => return Ok(()),
            },
            Err(_) => (
                "408 Request Timeout",
                r#"{"error":"request timeout"}"#.to_string(),
                true,
            ),
        };

    let head = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Connection: close\r\n\r\n",
        body.len()
    );
    let stream = reader.get_mut();
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body.as_bytes()).await?;
    stream.shutdown().await?;

    // Unread input at close turns into a reset that can discard the response.
    if rejected {
        let mut rest = (&mut reader).take(MAX_DRAIN_BYTES);
        let mut sink = tokio::io::sink();
        let drain = tokio::io::copy(&mut rest, &mut sink);
        let _ = tokio::time::timeout(DRAIN_TIMEOUT, drain).await;
    }
    Ok(())
}

fn route(
    request_line: &str,
    telemetry: &TelemetryWindow,
    stats: &EngineStats,
) -> Result<(&'static str, String)> {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");
    let path = target.split('?').next().unwrap_or("");

    Ok(match (method, path) {
        ("GET", "/telemetry") => ("200 OK", serde_json::to_string(&telemetry.snapshot())?),
        ("GET", "/stats") => ("200 OK", serde_json::to_string(&stats.snapshot())?),
        ("GET", _) => ("404 Not Found", r#"{"error":"not found"}"#.to_string()),
        _ => (
            "405 Method Not Allowed",
            r#"{"error":"method not allowed"}"#.to_string(),
        ),
    })
}
