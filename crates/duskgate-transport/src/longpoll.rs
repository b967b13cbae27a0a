//! HTTP long-poll fallback transport.
//!
//! For networks where a WebSocket won't survive, the client falls back to
//! form-encoded POSTs against a single endpoint:
//!
//! - handshake: `mode=init&suid=0&cid=<correlation id>` → `{"suid": "..."}`
//! - command:   `suid=<id>&data=<frame>` (frames carry the `CMD ` marker)
//! - poll:      `suid=<id>` → JSON array of push frames
//! - close:     `mode=close&suid=<id>`, best effort
//!
//! Responses may carry several push frames at once; they are buffered and
//! handed out one per `recv` call, preserving arrival order.

use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;

use duskgate_protocol::WireProfile;

use crate::{ClientTransport, ConnectionState, SessionId, TransportError};

/// A long-poll [`ClientTransport`] over `reqwest`.
pub struct LongPollTransport {
    endpoint: String,
    http: reqwest::Client,
    poll_interval: Duration,
    state: StdMutex<ConnectionState>,
    session: StdMutex<Option<SessionId>>,
    /// Push frames decoded out of responses, oldest first.
    queue: Mutex<VecDeque<String>>,
}

impl LongPollTransport {
    /// Creates a transport posting to the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
            poll_interval: Duration::from_secs(2),
            state: StdMutex::new(ConnectionState::Disconnected),
            session: StdMutex::new(None),
            queue: Mutex::new(VecDeque::new()),
        })
    }

    /// Overrides the delay between empty polls (default 2 seconds).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().expect("state lock poisoned") = state;
    }

    fn mark_disconnected(&self) {
        self.set_state(ConnectionState::Disconnected);
        self.session.lock().expect("session lock poisoned").take();
    }

    fn current_session(&self) -> Result<SessionId, TransportError> {
        self.session
            .lock()
            .expect("session lock poisoned")
            .clone()
            .ok_or(TransportError::NotConnected)
    }

    /// Buffers every push frame found in a response body.
    ///
    /// The body is a JSON array whose elements are either raw frame
    /// strings or push objects (re-serialized so `recv` always hands out
    /// frame text). Anything else is logged and dropped.
    async fn enqueue_frames(&self, body: &str) {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return;
        }
        let parsed: Result<Vec<serde_json::Value>, _> =
            serde_json::from_str(trimmed);
        match parsed {
            Ok(items) => {
                let mut queue = self.queue.lock().await;
                for item in items {
                    match item {
                        serde_json::Value::String(s) => queue.push_back(s),
                        other @ serde_json::Value::Object(_) => {
                            queue.push_back(other.to_string());
                        }
                        other => {
                            tracing::debug!(
                                frame = %other,
                                "dropping non-frame poll element"
                            );
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "unparseable poll response body");
            }
        }
    }
}

/// Generates a random 32-character hex correlation id for the handshake.
fn correlation_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl ClientTransport for LongPollTransport {
    async fn connect(&self) -> Result<SessionId, TransportError> {
        self.set_state(ConnectionState::Connecting);
        self.queue.lock().await.clear();

        let cid = correlation_id();
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[
                ("mode", "init"),
                ("suid", SessionId::UNASSIGNED),
                ("cid", cid.as_str()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                self.mark_disconnected();
                TransportError::HandshakeFailed(e.to_string())
            })?;

        let body: serde_json::Value = response.json().await.map_err(|e| {
            self.mark_disconnected();
            TransportError::HandshakeFailed(e.to_string())
        })?;

        let session_id = body
            .get("suid")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty() && *s != SessionId::UNASSIGNED)
            .map(SessionId::new)
            .ok_or_else(|| {
                self.mark_disconnected();
                TransportError::HandshakeFailed(
                    "acceptance carried no session id".into(),
                )
            })?;

        *self.session.lock().expect("session lock poisoned") =
            Some(session_id.clone());
        self.set_state(ConnectionState::Connected);

        tracing::info!(endpoint = %self.endpoint, %session_id, "long-poll session established");
        Ok(session_id)
    }

    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }
        let session = self.current_session()?;

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("suid", session.as_str()), ("data", frame)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        // Command responses may piggyback push frames.
        if let Ok(body) = response.text().await {
            self.enqueue_frames(&body).await;
        }
        Ok(())
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        loop {
            if let Some(frame) = self.queue.lock().await.pop_front() {
                return Ok(Some(frame));
            }
            if self.state() != ConnectionState::Connected {
                return Ok(None);
            }
            let session = self.current_session()?;

            let result = self
                .http
                .post(&self.endpoint)
                .form(&[("suid", session.as_str())])
                .send()
                .await
                .and_then(reqwest::Response::error_for_status);

            let response = match result {
                Ok(r) => r,
                Err(e) => {
                    self.mark_disconnected();
                    return Err(TransportError::ClosedUnexpectedly(
                        e.to_string(),
                    ));
                }
            };

            match response.text().await {
                Ok(body) => self.enqueue_frames(&body).await,
                Err(e) => {
                    self.mark_disconnected();
                    return Err(TransportError::ClosedUnexpectedly(
                        e.to_string(),
                    ));
                }
            }

            if self.queue.lock().await.is_empty() {
                // Empty long poll; back off before asking again.
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.set_state(ConnectionState::Closing);

        if let Ok(session) = self.current_session() {
            // Best effort: tell the server the session is done.
            let result = self
                .http
                .post(&self.endpoint)
                .form(&[("mode", "close"), ("suid", session.as_str())])
                .send()
                .await;
            if let Err(e) = result {
                tracing::debug!(error = %e, "close notification failed");
            }
        }

        self.queue.lock().await.clear();
        self.mark_disconnected();
        tracing::debug!(endpoint = %self.endpoint, "long-poll session closed");
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().expect("state lock poisoned")
    }

    fn session_id(&self) -> Option<SessionId> {
        self.session.lock().expect("session lock poisoned").clone()
    }

    fn profile(&self) -> WireProfile {
        WireProfile::Prefixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_is_32_hex_chars() {
        let cid = correlation_id();
        assert_eq!(cid.len(), 32);
        assert!(cid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_correlation_ids_are_unique() {
        assert_ne!(correlation_id(), correlation_id());
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_rejected() {
        let transport =
            LongPollTransport::new("http://127.0.0.1:9/poll").unwrap();
        let result = transport.send("CMD {\"cmd\":\"look\",\"args\":\"\"}")
            .await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    #[tokio::test]
    async fn test_enqueue_frames_preserves_order_and_shapes() {
        let transport =
            LongPollTransport::new("http://127.0.0.1:9/poll").unwrap();
        transport
            .enqueue_frames(
                r#"["{\"type\":\"a\"}", {"type":"b","msg":1}, 42]"#,
            )
            .await;

        let mut queue = transport.queue.lock().await;
        assert_eq!(queue.pop_front().as_deref(), Some(r#"{"type":"a"}"#));
        assert_eq!(
            queue.pop_front().as_deref(),
            Some(r#"{"msg":1,"type":"b"}"#)
        );
        // The bare number is not a frame and was dropped.
        assert!(queue.pop_front().is_none());
    }

    #[tokio::test]
    async fn test_enqueue_frames_ignores_empty_body() {
        let transport =
            LongPollTransport::new("http://127.0.0.1:9/poll").unwrap();
        transport.enqueue_frames("").await;
        transport.enqueue_frames("   ").await;
        assert!(transport.queue.lock().await.is_empty());
    }
}
