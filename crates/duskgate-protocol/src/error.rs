//! Error types for the protocol layer.
//!
//! Each crate in Duskgate defines its own error enum. A `ProtocolError`
//! always means a serialization problem — never networking, never routing.

/// Errors that can occur while encoding or decoding wire frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a command into its wire frame failed.
    ///
    /// Rare in practice — command args are plain JSON values — but the
    /// codec propagates it rather than panicking.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// An inbound frame could not be decoded into an [`Envelope`].
    ///
    /// Covers both invalid JSON syntax and structurally wrong frames
    /// (anything that isn't a JSON object). The transport logs this and
    /// drops the frame; the connection stays open.
    ///
    /// [`Envelope`]: crate::Envelope
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}
