//! Unified error type for the Duskgate client stack.

use duskgate_crypto::CryptoError;
use duskgate_protocol::ProtocolError;
use duskgate_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `duskgate` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DuskgateError {
    /// A transport-level error (handshake, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, malformed envelope).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A crypto-level error (key fetch, encryption unavailable).
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ClosedUnexpectedly("gone".into());
        let client_err: DuskgateError = err.into();
        assert!(matches!(client_err, DuskgateError::Transport(_)));
        assert!(client_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::MalformedEnvelope("bad".into());
        let client_err: DuskgateError = err.into();
        assert!(matches!(client_err, DuskgateError::Protocol(_)));
    }

    #[test]
    fn test_from_crypto_error() {
        let err = CryptoError::EncryptionUnavailable;
        let client_err: DuskgateError = err.into();
        assert!(matches!(client_err, DuskgateError::Crypto(_)));
    }
}
