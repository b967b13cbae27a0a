//! WebSocket client transport using `tokio-tungstenite`.
//!
//! The primary deployment profile: one persistent bidirectional channel.
//! The server's handshake acceptance is the first push frame, kind
//! `connected`, whose payload carries the session id.

use std::sync::Mutex as StdMutex;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream};

use duskgate_protocol::{kind, CommandCodec, WireProfile};

use crate::{ClientTransport, ConnectionState, SessionId, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<
    MaybeTlsStream<tokio::net::TcpStream>,
>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// A WebSocket-based [`ClientTransport`].
///
/// The sink and source halves live behind separate locks so a send can
/// proceed while a receive is pending — the client loop keeps `recv`
/// parked while the keepalive timer sends.
pub struct WebSocketTransport {
    url: String,
    handshake_timeout: Duration,
    state: StdMutex<ConnectionState>,
    session: StdMutex<Option<SessionId>>,
    sink: Mutex<Option<WsSink>>,
    source: Mutex<Option<WsSource>>,
}

impl WebSocketTransport {
    /// Creates a transport for the given `ws://` or `wss://` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            handshake_timeout: Duration::from_secs(5),
            state: StdMutex::new(ConnectionState::Disconnected),
            session: StdMutex::new(None),
            sink: Mutex::new(None),
            source: Mutex::new(None),
        }
    }

    /// Overrides the handshake timeout (default 5 seconds).
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// The URL this transport connects to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The handshake timeout in effect.
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().expect("state lock poisoned") = state;
    }

    /// Drops the session id and marks the transport disconnected.
    /// Every path that leaves `Connected` funnels through here.
    fn mark_disconnected(&self) {
        self.set_state(ConnectionState::Disconnected);
        self.session.lock().expect("session lock poisoned").take();
    }
}

/// Reads the next text frame from a source half, skipping control frames.
///
/// Returns `Ok(None)` on a clean close.
async fn next_frame(
    source: &mut WsSource,
) -> Result<Option<String>, TransportError> {
    loop {
        match source.next().await {
            Some(Ok(Message::Text(text))) => {
                return Ok(Some(text.to_string()));
            }
            Some(Ok(Message::Binary(data))) => {
                // Some proxies re-frame text as binary; tolerate it.
                match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => {
                        tracing::debug!("dropping non-UTF-8 binary frame");
                        continue;
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => return Ok(None),
            Some(Ok(_)) => continue, // ping/pong/frame
            Some(Err(e)) => {
                return Err(TransportError::ClosedUnexpectedly(
                    e.to_string(),
                ));
            }
        }
    }
}

/// Pulls the session id out of the acceptance payload.
///
/// Servers send either a bare string or an object with a `suid` field.
fn session_id_from_payload(payload: &serde_json::Value) -> Option<SessionId> {
    let raw = match payload {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Object(obj) => obj.get("suid")?.as_str(),
        _ => None,
    }?;
    if raw.is_empty() || raw == SessionId::UNASSIGNED {
        return None;
    }
    Some(SessionId::new(raw))
}

impl ClientTransport for WebSocketTransport {
    async fn connect(&self) -> Result<SessionId, TransportError> {
        self.set_state(ConnectionState::Connecting);

        let connect = tokio::time::timeout(
            self.handshake_timeout,
            connect_async(&self.url),
        )
        .await;

        let ws = match connect {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                self.mark_disconnected();
                return Err(TransportError::HandshakeFailed(e.to_string()));
            }
            Err(_) => {
                self.mark_disconnected();
                return Err(TransportError::HandshakeFailed(
                    "timed out opening channel".into(),
                ));
            }
        };

        let (sink, mut source) = ws.split();

        // The channel is open but the session doesn't exist until the
        // server's acceptance frame arrives.
        let accept = tokio::time::timeout(
            self.handshake_timeout,
            next_frame(&mut source),
        )
        .await;

        let raw = match accept {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => {
                self.mark_disconnected();
                return Err(TransportError::HandshakeFailed(
                    "closed before acceptance".into(),
                ));
            }
            Ok(Err(e)) => {
                self.mark_disconnected();
                return Err(TransportError::HandshakeFailed(e.to_string()));
            }
            Err(_) => {
                self.mark_disconnected();
                return Err(TransportError::HandshakeFailed(
                    "timed out waiting for acceptance".into(),
                ));
            }
        };

        let codec = CommandCodec::new(WireProfile::Bare);
        let session_id = codec
            .decode(&raw)
            .ok()
            .filter(|env| env.kind == kind::CONNECTED)
            .and_then(|env| session_id_from_payload(&env.payload))
            .ok_or_else(|| {
                self.mark_disconnected();
                TransportError::HandshakeFailed(format!(
                    "unexpected acceptance frame: {raw}"
                ))
            })?;

        *self.sink.lock().await = Some(sink);
        *self.source.lock().await = Some(source);
        *self.session.lock().expect("session lock poisoned") =
            Some(session_id.clone());
        self.set_state(ConnectionState::Connected);

        tracing::info!(url = %self.url, %session_id, "websocket connected");
        Ok(session_id)
    }

    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }
        let mut sink = self.sink.lock().await;
        let Some(sink) = sink.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        sink.send(Message::text(frame))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        let mut source = self.source.lock().await;
        let Some(source) = source.as_mut() else {
            return Ok(None);
        };
        match next_frame(source).await {
            Ok(Some(frame)) => Ok(Some(frame)),
            Ok(None) => {
                self.mark_disconnected();
                tracing::info!("websocket closed by remote");
                Ok(None)
            }
            Err(e) => {
                self.mark_disconnected();
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.set_state(ConnectionState::Closing);

        if let Some(mut sink) = self.sink.lock().await.take() {
            // Best effort — the remote may already be gone.
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        }
        self.source.lock().await.take();
        self.mark_disconnected();

        tracing::debug!(url = %self.url, "websocket closed");
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().expect("state lock poisoned")
    }

    fn session_id(&self) -> Option<SessionId> {
        self.session.lock().expect("session lock poisoned").clone()
    }

    fn profile(&self) -> WireProfile {
        WireProfile::Bare
    }
}
