//! Error types for the control layer

use thiserror::Error;

/// Connection-level errors. Per-message failures are
/// [`ProtocolError`](crate::ProtocolError) / [`IngestError`](crate::IngestError)
/// and never end a connection.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid UTF-8 in control frame")]
    InvalidUtf8,

    #[error("Control message exceeds {limit} bytes")]
    MessageTooLarge { limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
