//! Sensitive-field encryption for Duskgate.
//!
//! Before a password (or any other sensitive field) leaves the client, it
//! is encrypted against the server's public key. The key is fetched once,
//! lazily, from a well-known endpoint; the deployment decides at
//! configuration time whether encryption is on at all.
//!
//! Two [`FieldCipher`] strategies exist:
//!
//! - [`RsaFieldCipher`] — fetches a PEM public key and encrypts with
//!   PKCS#1 v1.5, emitting base64 ciphertext;
//! - [`PlainFieldCipher`] — identity pass-through for deployments with
//!   encryption disabled.
//!
//! Encryption is all-or-nothing per deployment, never a per-call choice:
//! the client constructs exactly one cipher and every sensitive send goes
//! through it. When encryption is configured on and no key is available,
//! the send **fails** — the client never silently falls back to
//! plaintext credentials.

mod cipher;
mod error;

pub use cipher::{FieldCipher, PlainFieldCipher, RsaFieldCipher};
pub use error::CryptoError;
