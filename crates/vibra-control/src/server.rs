//! Control server: accepts connections and runs one ingest task per peer.

use crate::error::Result;
use crate::ingest::CommandIngest;
use crate::source::{run_ingest, LineSource};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

/// Framing used on control connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// One JSON object per WebSocket frame.
    #[cfg(feature = "websocket")]
    #[cfg_attr(feature = "websocket", default)]
    WebSocket,
    /// Newline-delimited JSON over plain TCP.
    #[cfg_attr(not(feature = "websocket"), default)]
    Lines,
}

/// Control ingress listener.
pub struct ControlServer {
    listener: TcpListener,
    ingest: CommandIngest,
    transport: Transport,
}

impl ControlServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        ingest: CommandIngest,
        transport: Transport,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::from_listener(listener, ingest, transport))
    }

    pub fn from_listener(listener: TcpListener, ingest: CommandIngest, transport: Transport) -> Self {
        Self {
            listener,
            ingest,
            transport,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails. Each connection runs in
    /// its own task; closing a connection never affects queued segments.
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            addr = ?self.listener.local_addr().ok(),
            transport = ?self.transport,
            "control server listening"
        );

        loop {
            let (stream, peer) = self.listener.accept().await?;
            let ingest = self.ingest.clone();
            let transport = self.transport;

            tokio::spawn(async move {
                tracing::info!(%peer, "control connection opened");
                match serve_connection(stream, &ingest, transport).await {
                    Ok(summary) => tracing::info!(
                        %peer,
                        received = summary.received,
                        accepted = summary.accepted,
                        rejected = summary.rejected,
                        overflowed = summary.overflowed,
                        "control connection closed"
                    ),
                    Err(e) => tracing::warn!(%peer, "control connection failed: {e}"),
                }
            });
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    ingest: &CommandIngest,
    transport: Transport,
) -> Result<crate::source::IngestSummary> {
    stream.set_nodelay(true)?;
    match transport {
        #[cfg(feature = "websocket")]
        Transport::WebSocket => {
            let ws = tokio_tungstenite::accept_async(stream).await?;
            run_ingest(crate::source::WebSocketSource::new(ws), ingest).await
        }
        Transport::Lines => run_ingest(LineSource::new(BufReader::new(stream)), ingest).await,
    }
}
