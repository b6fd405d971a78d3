//! A single upstream WebSocket session with ping keep-alive.
//!
//! A session runs two activities over one connection:
//! 1. The receive loop, which reads frames and hands text payloads to a callback.
//! 2. The keepalive task, which sends a ping frame every `ping_interval`.
//!
//! Whichever fails first ends the session. The keepalive task is stopped
//! through a per-session [`CancellationToken`] and joined before `run`
//! returns, so no timer outlives its session.

use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Payload carried by keepalive pings.
pub const PING_PAYLOAD: &[u8] = b"keepalive";

/// Why a session ended. Every variant is retryable.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Could not establish the upstream connection.
    #[error("dial error: {0}")]
    Dial(String),

    /// Transport or protocol failure while reading.
    #[error("read error: {0}")]
    Read(String),

    /// The server closed the stream.
    #[error("read error: connection closed by server ({})", .0.as_deref().unwrap_or("no reason"))]
    Closed(Option<String>),

    /// A keepalive ping could not be sent.
    #[error("ping error: {0}")]
    Ping(String),
}

/// One live connection to the upstream feed.
pub struct StreamSession<S> {
    ws: WebSocketStream<S>,
    ping_interval: Duration,
}

impl StreamSession<MaybeTlsStream<TcpStream>> {
    /// Dial `url` (ws:// or wss://) and complete the WebSocket handshake.
    pub async fn open(url: &str, ping_interval: Duration) -> Result<Self, SessionError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| SessionError::Dial(e.to_string()))?;
        Ok(Self::from_stream(ws, ping_interval))
    }
}

impl<S> StreamSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap an already-established WebSocket stream.
    pub fn from_stream(ws: WebSocketStream<S>, ping_interval: Duration) -> Self {
        Self { ws, ping_interval }
    }

    /// Run the session until it fails, feeding each text frame to `on_text`.
    ///
    /// Never returns under a healthy connection; the returned error is the
    /// reason the session terminated.
    pub async fn run<F>(self, mut on_text: F) -> SessionError
    where
        F: FnMut(&str),
    {
        let (sink, mut stream) = self.ws.split();
        let cancel = CancellationToken::new();
        let (ping_failed_tx, mut ping_failed_rx) = oneshot::channel::<String>();

        let keepalive = tokio::spawn(keepalive_loop(sink, self.ping_interval, cancel.clone(), ping_failed_tx));

        let reason = loop {
            tokio::select! {
                failed = &mut ping_failed_rx => {
                    break match failed {
                        Ok(e) => SessionError::Ping(e),
                        Err(_) => SessionError::Ping("keepalive task exited".into()),
                    };
                }

                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => on_text(text.as_str()),
                        Some(Ok(Message::Close(frame))) => {
                            break SessionError::Closed(frame.map(|f| f.reason.to_string()));
                        }
                        Some(Err(e)) => break SessionError::Read(e.to_string()),
                        None => break SessionError::Closed(None),
                        // Pings are answered by tungstenite on the next read; binary and pong frames are ignored.
                        Some(Ok(_)) => {}
                    }
                }
            }
        };

        cancel.cancel();
        if let Err(e) = keepalive.await {
            warn!("keepalive task join failed: {e}");
        }
        reason
    }
}

/// Send a ping every `period` until cancelled or a send fails.
///
/// On send failure the connection is closed and the error is reported once
/// through `failed`.
async fn keepalive_loop<S>(
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    period: Duration,
    cancel: CancellationToken,
    failed: oneshot::Sender<String>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("keepalive stopped");
                return;
            }

            _ = ticker.tick() => {
                if let Err(e) = sink.send(Message::Ping(PING_PAYLOAD.to_vec().into())).await {
                    warn!("ping error: {e}");
                    let _ = failed.send(e.to_string());
                    let _ = sink.close().await;
                    return;
                }
                debug!("ping sent");
            }
        }
    }
}
