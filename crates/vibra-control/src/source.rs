//! Message sources: anything that yields one raw control message at a time.

use crate::error::{Error, Result};
use crate::ingest::{CommandIngest, IngestError};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::sync::mpsc;

/// A persistent, message-oriented control connection.
///
/// `None` means the peer closed the connection. `Some(Err(_))` is a transport
/// failure and also ends the connection.
pub trait MessageSource: Send {
    fn next_message(&mut self) -> impl Future<Output = Option<Result<String>>> + Send;
}

impl MessageSource for mpsc::Receiver<String> {
    async fn next_message(&mut self) -> Option<Result<String>> {
        self.recv().await.map(Ok)
    }
}

impl MessageSource for mpsc::UnboundedReceiver<String> {
    async fn next_message(&mut self) -> Option<Result<String>> {
        self.recv().await.map(Ok)
    }
}

/// Longest accepted control line, excluding the terminator.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Newline-delimited JSON over any buffered reader. Blank lines are skipped.
///
/// A line longer than [`MAX_LINE_BYTES`] ends the connection with
/// [`Error::MessageTooLarge`]; nothing past the limit is buffered.
pub struct LineSource<R> {
    reader: R,
    line: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
        }
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        self.line.clear();
        let limit = MAX_LINE_BYTES as u64 + 1;
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line)
            .await?;
        if n == 0 {
            return Ok(None);
        }

        if self.line.ends_with(b"\n") {
            self.line.pop();
            if self.line.ends_with(b"\r") {
                self.line.pop();
            }
        } else if self.line.len() as u64 == limit {
            return Err(Error::MessageTooLarge {
                limit: MAX_LINE_BYTES,
            });
        }

        let line = std::mem::take(&mut self.line);
        String::from_utf8(line)
            .map(Some)
            .map_err(|_| Error::InvalidUtf8)
    }
}

impl<R: AsyncBufRead + Unpin + Send> MessageSource for LineSource<R> {
    async fn next_message(&mut self) -> Option<Result<String>> {
        loop {
            match self.read_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(Ok(line)),
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(feature = "websocket")]
pub use ws::WebSocketSource;

#[cfg(feature = "websocket")]
mod ws {
    use super::MessageSource;
    use crate::error::{Error, Result};
    use futures_util::StreamExt;
    use tokio::io::{AsyncRead, AsyncWrite};
    use tokio_tungstenite::tungstenite::{self, Message};
    use tokio_tungstenite::WebSocketStream;

    /// Text or binary WebSocket frames, one message per frame.
    pub struct WebSocketSource<S> {
        stream: WebSocketStream<S>,
    }

    impl<S> WebSocketSource<S> {
        pub fn new(stream: WebSocketStream<S>) -> Self {
            Self { stream }
        }
    }

    impl<S: AsyncRead + AsyncWrite + Unpin + Send> MessageSource for WebSocketSource<S> {
        async fn next_message(&mut self) -> Option<Result<String>> {
            loop {
                match self.stream.next().await? {
                    Ok(Message::Text(text)) => return Some(Ok(text)),
                    Ok(Message::Binary(bytes)) => {
                        return Some(String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8));
                    }
                    Ok(Message::Close(_)) => return None,
                    // Ping/pong are answered by tungstenite.
                    Ok(_) => continue,
                    Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                        return None;
                    }
                    Err(e) => return Some(Err(e.into())),
                }
            }
        }
    }
}

/// Per-connection counters returned by [`run_ingest`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub received: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub overflowed: u64,
}

/// Feed every message from `source` through `ingest`, one at a time, until
/// the peer closes. Rejected and overflowed messages do not end the loop.
pub async fn run_ingest<S: MessageSource>(
    mut source: S,
    ingest: &CommandIngest,
) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();

    while let Some(message) = source.next_message().await {
        let raw = message?;
        summary.received += 1;
        match ingest.receive(&raw) {
            Ok(_) => summary.accepted += 1,
            Err(IngestError::Overflow { .. }) => summary.overflowed += 1,
            Err(IngestError::Protocol(_)) => summary.rejected += 1,
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibra_core::{Engine, EngineConfig, Renderer};

    fn setup() -> (CommandIngest, Renderer) {
        let config = EngineConfig {
            actuator_count: 2,
            sample_rate: 2000.0,
            carrier_frequency: 200.0,
            queue_capacity: 2,
            ..Default::default()
        };
        let (handle, renderer) = Engine::initialize(config, 2).unwrap().into_parts();
        (CommandIngest::new(handle), renderer)
    }

    #[tokio::test]
    async fn test_mpsc_source_preserves_order() {
        let (ingest, _renderer) = setup();
        let (tx, rx) = mpsc::channel(8);

        tx.send(r#"{"duration": 1, "amplitudes": [1, 0], "timestamp": 1}"#.into())
            .await
            .unwrap();
        tx.send("garbage".into()).await.unwrap();
        tx.send(r#"{"duration": 2, "amplitudes": [0, 1], "timestamp": 2}"#.into())
            .await
            .unwrap();
        tx.send(r#"{"duration": 3, "amplitudes": [1, 1], "timestamp": 3}"#.into())
            .await
            .unwrap();
        drop(tx);

        let summary = run_ingest(rx, &ingest).await.unwrap();
        assert_eq!(
            summary,
            IngestSummary {
                received: 4,
                accepted: 2,
                rejected: 1,
                overflowed: 1,
            }
        );

        let timestamps: Vec<f64> = ingest
            .handle()
            .telemetry()
            .snapshot()
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(timestamps, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_line_source_skips_blank_lines() {
        let input: &[u8] = b"{\"duration\": 1, \"amplitudes\": [1, 0], \"timestamp\": 1}\n\n  \n\
                             {\"duration\": 1, \"amplitudes\": [0, 1], \"timestamp\": 2}\n";
        let mut source = LineSource::new(input);

        assert!(source.next_message().await.unwrap().is_ok());
        assert!(source.next_message().await.unwrap().is_ok());
        assert!(source.next_message().await.is_none());
    }

    #[tokio::test]
    async fn test_line_source_rejects_overlong_line() {
        let mut input = b"{\"duration\": 1, \"amplitudes\": [1, 0], \"timestamp\": 1}\r\n".to_vec();
        input.extend(std::iter::repeat(b' ').take(MAX_LINE_BYTES + 1));
        input.push(b'\n');
        let mut source = LineSource::new(&input[..]);

        let first = source.next_message().await.unwrap().unwrap();
        assert!(first.ends_with('}'));
        assert!(matches!(
            source.next_message().await,
            Some(Err(Error::MessageTooLarge { limit: MAX_LINE_BYTES }))
        ));
    }

    #[tokio::test]
    async fn test_line_source_accepts_unterminated_last_line() {
        let input: &[u8] = b"{\"duration\": 1, \"amplitudes\": [1], \"timestamp\": 1}";
        let mut source = LineSource::new(input);
        assert!(source.next_message().await.unwrap().is_ok());
        assert!(source.next_message().await.is_none());
    }
}
