//! `GameClient`: the client loop that ties the layers together.
//!
//! A `GameClient` owns one transport, the codec matching that transport's
//! wire profile, the session state, and the field cipher. Frames register
//! with the session's dispatcher; [`GameClient::run`] then pumps inbound
//! frames through decode → route until the connection ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use duskgate_crypto::FieldCipher;
use duskgate_protocol::{kind, CommandCodec, Envelope};
use duskgate_session::Session;
use duskgate_timing::Periodic;
use duskgate_transport::{
    ClientTransport, ConnectionState, LongPollTransport, SessionId,
    WebSocketTransport,
};
use serde_json::{json, Value};
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::{ClientConfig, DuskgateError};

/// The command sent on the keepalive cadence so idle sessions are not
/// reaped server-side.
const KEEPALIVE_COMMAND: &str = "idle";

/// A connected game client.
///
/// Generic over the transport so the WebSocket primary and the long-poll
/// fallback drive one identical loop. The codec is fixed at construction
/// from the transport's [`WireProfile`](duskgate_protocol::WireProfile),
/// so callers never think about framing.
pub struct GameClient<T: ClientTransport> {
    transport: Arc<T>,
    codec: CommandCodec,
    session: Arc<Mutex<Session>>,
    cipher: Arc<dyn FieldCipher>,
    config: ClientConfig,
    /// Set by [`close`](Self::close); distinguishes a user-initiated
    /// shutdown from a dropped connection so reconnect logic stays out
    /// of the way.
    user_closed: Arc<AtomicBool>,
}

impl<T: ClientTransport> GameClient<T> {
    /// Builds a client over the given transport and cipher.
    ///
    /// The config is [`validated`](ClientConfig::validated) on the way in.
    pub fn new(transport: T, cipher: Arc<dyn FieldCipher>, config: ClientConfig) -> Self {
        let codec = CommandCodec::new(transport.profile());
        Self {
            transport: Arc::new(transport),
            codec,
            session: Arc::new(Mutex::new(Session::new())),
            cipher,
            config: config.validated(),
            user_closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The shared session handle; lock it to register frames or inspect
    /// cooldowns.
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    /// The client configuration (post-validation).
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport's current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// The session id, while connected.
    pub fn session_id(&self) -> Option<SessionId> {
        self.transport.session_id()
    }

    // =====================================================================
    // Lifecycle
    // =====================================================================

    /// Performs the handshake and routes a `connected` envelope carrying
    /// the session id, so frames learn about the new session the same way
    /// they learn about everything else. Registered frames also get the
    /// configured display language and their `on_ready` hook, language
    /// first so ready-time rendering already uses it.
    pub async fn connect(&self) -> Result<SessionId, DuskgateError> {
        self.user_closed.store(false, Ordering::SeqCst);
        let session_id = self.transport.connect().await?;
        info!(session = %session_id, "connected");

        let envelope = Envelope::new(kind::CONNECTED, json!(session_id.as_str()));
        self.route(&envelope);
        {
            let session = self.session.lock().expect("session lock poisoned");
            session.reset_language(&self.config.language);
            session.notify_ready();
        }
        Ok(session_id)
    }

    /// User-initiated shutdown. No reconnect follows, even under
    /// [`run_with_reconnect`](Self::run_with_reconnect).
    pub async fn close(&self) -> Result<(), DuskgateError> {
        self.user_closed.store(true, Ordering::SeqCst);
        self.transport.close().await?;
        Ok(())
    }

    // =====================================================================
    // Outbound
    // =====================================================================

    /// Encodes a command and hands it to the transport.
    ///
    /// # Errors
    /// [`TransportError::NotConnected`](duskgate_transport::TransportError::NotConnected)
    /// when the connection is down — the command is rejected, never queued.
    pub async fn send_command(&self, cmd: &str, args: &Value) -> Result<(), DuskgateError> {
        let frame = self.codec.encode(cmd, args)?;
        self.transport.send(&frame).await?;
        Ok(())
    }

    /// Encrypts a sensitive field through the cipher, then sends it as
    /// the command's argument. Used for login passwords.
    ///
    /// # Errors
    /// [`CryptoError::EncryptionUnavailable`](duskgate_crypto::CryptoError::EncryptionUnavailable)
    /// when encryption is required but no key is held — the secret never
    /// leaves the process in the clear.
    pub async fn send_secret(&self, cmd: &str, secret: &str) -> Result<(), DuskgateError> {
        let sealed = self.cipher.encrypt(secret)?;
        self.send_command(cmd, &Value::String(sealed)).await
    }

    // =====================================================================
    // Inbound loop
    // =====================================================================

    /// Pumps inbound frames until the connection ends.
    ///
    /// Each frame is decoded and routed through the session's dispatcher
    /// in wire order. A malformed frame is logged and dropped; the
    /// connection stays open. While the loop runs, an `idle` keepalive
    /// goes out every [`ClientConfig::keepalive_secs`] seconds; the
    /// keepalive task stops on every exit path.
    ///
    /// When the connection ends — cleanly or not — a synthesized `closed`
    /// envelope is routed so frames can react. A clean close returns
    /// `Ok(())`; a transport failure returns the error.
    pub async fn run(&self) -> Result<(), DuskgateError> {
        let idle_frame = self.codec.encode(KEEPALIVE_COMMAND, &Value::String(String::new()))?;
        let keepalive_transport = Arc::clone(&self.transport);
        let _keepalive = Periodic::spawn(self.config.keepalive(), move || {
            let transport = Arc::clone(&keepalive_transport);
            let frame = idle_frame.clone();
            tokio::spawn(async move {
                if let Err(err) = transport.send(&frame).await {
                    debug!(%err, "keepalive send failed");
                }
            });
        });

        loop {
            match self.transport.recv().await {
                Ok(Some(raw)) => match self.codec.decode(&raw) {
                    Ok(envelope) => {
                        if envelope.kind == kind::COOLDOWN {
                            self.apply_cooldown(&envelope);
                        }
                        let handled = self.route(&envelope);
                        trace!(kind = %envelope.kind, handled, "envelope routed");
                    }
                    Err(err) => {
                        warn!(%err, "dropping malformed frame");
                    }
                },
                Ok(None) => {
                    debug!("connection closed");
                    self.route(&Envelope::new(kind::CLOSED, Value::Null));
                    return Ok(());
                }
                Err(err) => {
                    warn!(%err, "transport failed");
                    self.route(&Envelope::new(kind::CLOSED, Value::Null));
                    return Err(err.into());
                }
            }
        }
    }

    /// Runs the client, reconnecting with a fixed delay whenever the
    /// connection drops without [`close`](Self::close) being called.
    ///
    /// The cadence is the historical one the game servers expect: a flat
    /// delay between attempts and no retry cap. There is deliberately no
    /// backoff here — embedders that want one should drive
    /// [`connect`](Self::connect)/[`run`](Self::run) themselves.
    pub async fn run_with_reconnect(&self) -> Result<(), DuskgateError> {
        loop {
            if let Err(err) = self.run().await {
                warn!(%err, "session ended abnormally");
            }
            loop {
                if self.user_closed.load(Ordering::SeqCst) {
                    return Ok(());
                }
                warn!(
                    delay_secs = self.config.reconnect_delay_secs,
                    "connection lost — retrying after fixed delay"
                );
                time::sleep(self.config.reconnect_delay()).await;
                if self.user_closed.load(Ordering::SeqCst) {
                    return Ok(());
                }
                match self.connect().await {
                    Ok(_) => break,
                    Err(err) => warn!(%err, "reconnect attempt failed"),
                }
            }
        }
    }

    /// Applies a `cooldown` acknowledgement to the session's tracker
    /// before the envelope reaches any frame, so frames read ready-made
    /// state instead of parsing the payload themselves.
    ///
    /// Expected payload: `{"skill": "...", "cooldown": secs, "gcd": secs}`.
    /// Anything else is logged and skipped.
    fn apply_cooldown(&self, envelope: &Envelope) {
        let skill = envelope.payload.get("skill").and_then(Value::as_str);
        let cooldown = envelope.payload.get("cooldown").and_then(Value::as_u64);
        let (Some(skill), Some(cooldown)) = (skill, cooldown) else {
            debug!(payload = %envelope.payload, "unusable cooldown payload");
            return;
        };
        let gcd = envelope
            .payload
            .get("gcd")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.session
            .lock()
            .expect("session lock poisoned")
            .cooldowns_mut()
            .update(skill, cooldown, gcd, now_ms);
    }

    fn route(&self, envelope: &Envelope) -> usize {
        self.session
            .lock()
            .expect("session lock poisoned")
            .route(envelope)
    }
}

impl GameClient<WebSocketTransport> {
    /// Builds a client over the primary WebSocket transport, taking the
    /// endpoint and handshake timeout from the config.
    pub fn websocket(cipher: Arc<dyn FieldCipher>, config: ClientConfig) -> Self {
        let config = config.validated();
        let transport = WebSocketTransport::new(config.websocket_url.clone())
            .with_handshake_timeout(config.handshake_timeout());
        Self::new(transport, cipher, config)
    }
}

impl GameClient<LongPollTransport> {
    /// Builds a client over the long-poll fallback, posting to the
    /// config's poll endpoint.
    pub fn long_poll(
        cipher: Arc<dyn FieldCipher>,
        config: ClientConfig,
    ) -> Result<Self, DuskgateError> {
        let config = config.validated();
        let transport = LongPollTransport::new(config.poll_url.clone())?;
        Ok(Self::new(transport, cipher, config))
    }
}

// =========================================================================
// Tests
// =========================================================================
