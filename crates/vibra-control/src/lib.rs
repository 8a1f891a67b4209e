//! Control ingress and telemetry egress for a vibra engine.
//!
//! - [`CommandIngest`]: validate a raw message, enqueue its segment, record it
//! - [`MessageSource`]: one raw message at a time from mpsc, NDJSON or WebSocket
//! - [`ControlServer`]: TCP listener spawning one ingest task per connection
//! - [`TelemetryServer`]: `GET /telemetry` snapshot endpoint

pub mod error;
pub use error::{Error, Result};

pub mod protocol;
pub use protocol::{decode, Command, ControlMessage, ProtocolError};

mod ingest;
pub use ingest::{CommandIngest, IngestError, Receipt};

pub mod source;
pub use source::{run_ingest, IngestSummary, LineSource, MessageSource, MAX_LINE_BYTES};

#[cfg(feature = "websocket")]
pub use source::WebSocketSource;

mod server;
pub use server::{ControlServer, Transport};

mod telemetry_http;
pub use telemetry_http::TelemetryServer;
