//! Error types for the transport layer.
//!
//! All of these are recoverable at the transport/session boundary: at
//! worst a connection is lost and retried or reported, never a crashed
//! client.

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A send was attempted while the transport is not in the
    /// `Connected` state. The frame is rejected, never queued, and no
    /// wire output is produced.
    #[error("not connected")]
    NotConnected,

    /// The connect attempt did not receive an acceptance within the
    /// handshake timeout, or the server refused it.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The remote end closed the connection without a prior local close
    /// request. Triggers the reconnect policy or a user-visible notice,
    /// depending on the deployment profile.
    #[error("connection closed unexpectedly: {0}")]
    ClosedUnexpectedly(String),

    /// Handing a frame to the underlying channel failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// An HTTP request of the long-poll transport failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}
