//! Error types for the crypto layer.

/// Errors that can occur while fetching the key or encrypting a field.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Encryption was requested before the key fetch completed, or after
    /// it failed. With encryption configured on this is a fatal setup
    /// error the user must see — the caller must not downgrade to
    /// plaintext.
    #[error("encryption unavailable: no public key loaded")]
    EncryptionUnavailable,

    /// Retrieving the public key from the server failed.
    #[error("public key fetch failed: {0}")]
    KeyFetchFailed(String),

    /// The fetched key material could not be parsed.
    #[error("invalid public key material: {0}")]
    InvalidKey(String),

    /// The encryption primitive itself failed.
    #[error("encrypt failed: {0}")]
    EncryptFailed(String),
}
