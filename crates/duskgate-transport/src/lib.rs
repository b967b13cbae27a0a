//! Client transport layer for Duskgate.
//!
//! Provides the [`ClientTransport`] trait and the two concrete strategies
//! observed in deployments:
//!
//! - [`WebSocketTransport`] — persistent bidirectional channel, the
//!   primary profile;
//! - [`LongPollTransport`] — HTTP request/response fallback for networks
//!   where WebSockets don't survive.
//!
//! A running client owns exactly one transport, selected at configuration
//! time. Every path that leaves the `Connected` state invalidates the
//! session id, so no stale identity can outlive its connection.

mod error;
mod longpoll;
mod websocket;

pub use error::TransportError;
pub use longpoll::LongPollTransport;
pub use websocket::WebSocketTransport;

use std::fmt;
use std::future::Future;

use duskgate_protocol::WireProfile;

/// Connection lifecycle state.
///
/// ```text
/// Disconnected → Connecting → Connected → Closing → Disconnected
/// ```
///
/// `Connected` is the only state from which a send succeeds;
/// `Disconnected` is the terminal state within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection. Initial and terminal state.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Handshake accepted; sends and receives flow.
    Connected,
    /// Local close requested; teardown in progress.
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
        };
        write!(f, "{s}")
    }
}

/// Opaque session identity issued by the server on a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// The sentinel the long-poll wire uses before a session id is assigned.
    pub const UNASSIGNED: &'static str = "0";

    /// Wraps a server-issued session id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id as issued by the server.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "suid-{}", self.0)
    }
}

/// A client-side connection to a game server.
///
/// Implementations own the connect/close lifecycle, the session id, and
/// the delivery order guarantee: frames surface from [`recv`] in exactly
/// the order they arrived on the wire.
///
/// The async methods are declared returning `Send` futures so callers
/// can drive them from spawned tasks (the client's keepalive timer
/// does). Implementations still write plain `async fn`.
///
/// [`recv`]: ClientTransport::recv
pub trait ClientTransport: Send + Sync + 'static {
    /// Performs the full handshake and returns the server-issued session id.
    ///
    /// # Errors
    /// [`TransportError::HandshakeFailed`] when no acceptance arrives
    /// within the handshake timeout or the server refuses the connection.
    fn connect(&self) -> impl Future<Output = Result<SessionId, TransportError>> + Send;

    /// Hands one encoded wire frame to the underlying channel.
    ///
    /// # Errors
    /// [`TransportError::NotConnected`] unless the state is
    /// [`ConnectionState::Connected`]; in that case nothing is written.
    fn send(&self, frame: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next inbound frame.
    ///
    /// Returns `Ok(None)` on a clean close (local or remote). After a
    /// close the state is `Disconnected` and the session id is gone.
    fn recv(&self) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Closes the connection. Safe to call from any state; idempotent.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;

    /// The session id, while one is assigned.
    fn session_id(&self) -> Option<SessionId>;

    /// The outbound framing profile fixed for this transport kind.
    fn profile(&self) -> WireProfile;
}
