//! Field cipher strategies and the lazy key-fetch state machine.

use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand_core::OsRng;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

use crate::CryptoError;

/// Encrypts a sensitive outbound field.
///
/// The strategy is picked once, at client construction, from the
/// deployment's encryption-enabled flag. Call sites never branch on
/// whether encryption is on — they just encrypt.
pub trait FieldCipher: Send + Sync {
    /// Encrypts `plaintext` into its wire representation.
    ///
    /// # Errors
    /// [`CryptoError::EncryptionUnavailable`] when the strategy needs a
    /// key that hasn't been loaded. Never returned by the pass-through
    /// variant.
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;
}

// ---------------------------------------------------------------------------
// PlainFieldCipher
// ---------------------------------------------------------------------------

/// The pass-through strategy for deployments with encryption disabled.
///
/// Implements the same contract as identity; selecting it (instead of
/// scattering `if encryption_enabled` branches) keeps the call sites
/// uniform.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFieldCipher;

impl FieldCipher for PlainFieldCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        Ok(plaintext.to_string())
    }
}

// ---------------------------------------------------------------------------
// RsaFieldCipher
// ---------------------------------------------------------------------------

/// Key material and fetch progress, one instance per session.
///
/// The key is never rotated mid-session: once loaded it is kept for the
/// life of the client, and a later fetch attempt is a no-op.
#[derive(Debug, Default)]
struct KeyState {
    public_key: Option<RsaPublicKey>,
    fetch_in_progress: bool,
}

/// The real strategy: RSA PKCS#1 v1.5 against the server's public key,
/// ciphertext carried as standard base64.
#[derive(Debug, Default)]
pub struct RsaFieldCipher {
    state: Mutex<KeyState>,
}

impl RsaFieldCipher {
    /// Creates a cipher with no key loaded. [`initialize`] must complete
    /// before [`encrypt`] can succeed.
    ///
    /// [`initialize`]: Self::initialize
    /// [`encrypt`]: FieldCipher::encrypt
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cipher around an already-loaded key. Test seam, and
    /// useful for embedders that ship a pinned key.
    pub fn with_key(key: RsaPublicKey) -> Self {
        Self {
            state: Mutex::new(KeyState {
                public_key: Some(key),
                fetch_in_progress: false,
            }),
        }
    }

    /// Whether a key fetch is currently underway.
    pub fn fetch_in_progress(&self) -> bool {
        self.state.lock().expect("key state poisoned").fetch_in_progress
    }

    /// Whether a public key is loaded and [`encrypt`] can succeed.
    ///
    /// [`encrypt`]: FieldCipher::encrypt
    pub fn has_key(&self) -> bool {
        self.state
            .lock()
            .expect("key state poisoned")
            .public_key
            .is_some()
    }

    /// Fetches the server's public key from `key_url`.
    ///
    /// The response body is PEM (SPKI) key material, consumed opaquely.
    /// Idempotent once a key is held: a repeat call returns without a
    /// request, so the key in hand lives for the whole session.
    ///
    /// # Errors
    /// [`CryptoError::KeyFetchFailed`] on a network or HTTP error and
    /// [`CryptoError::InvalidKey`] on unparseable material. Both must be
    /// surfaced as a fatal setup error when encryption is configured on.
    pub async fn initialize(
        &self,
        http: &reqwest::Client,
        key_url: &str,
    ) -> Result<(), CryptoError> {
        {
            let mut state = self.state.lock().expect("key state poisoned");
            if state.public_key.is_some() {
                return Ok(());
            }
            state.fetch_in_progress = true;
        }

        let result = fetch_key(http, key_url).await;

        let mut state = self.state.lock().expect("key state poisoned");
        state.fetch_in_progress = false;
        match result {
            Ok(key) => {
                state.public_key = Some(key);
                tracing::info!(%key_url, "server public key loaded");
                Ok(())
            }
            Err(e) => {
                tracing::error!(%key_url, error = %e, "public key fetch failed");
                Err(e)
            }
        }
    }

    /// Parses PEM key material directly, bypassing the fetch.
    pub fn load_pem(&self, pem: &str) -> Result<(), CryptoError> {
        let key = parse_key(pem)?;
        let mut state = self.state.lock().expect("key state poisoned");
        if state.public_key.is_none() {
            state.public_key = Some(key);
        }
        Ok(())
    }
}

async fn fetch_key(
    http: &reqwest::Client,
    key_url: &str,
) -> Result<RsaPublicKey, CryptoError> {
    let response = http
        .get(key_url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| CryptoError::KeyFetchFailed(e.to_string()))?;
    let pem = response
        .text()
        .await
        .map_err(|e| CryptoError::KeyFetchFailed(e.to_string()))?;
    parse_key(&pem)
}

fn parse_key(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_pem(pem.trim())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

impl FieldCipher for RsaFieldCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let state = self.state.lock().expect("key state poisoned");
        let Some(key) = state.public_key.as_ref() else {
            return Err(CryptoError::EncryptionUnavailable);
        };
        let ciphertext = key
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?;
        Ok(BASE64.encode(ciphertext))
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::RsaPrivateKey;

    /// Generates a throwaway 2048-bit keypair, matching what deployed
    /// servers publish. Takes a moment; each test that needs one
    /// generates its own.
    fn keypair() -> (RsaPrivateKey, RsaPublicKey) {
        let private = RsaPrivateKey::new(&mut OsRng, 2048)
            .expect("keygen should succeed");
        let public = private.to_public_key();
        (private, public)
    }

    // =====================================================================
    // PlainFieldCipher
    // =====================================================================

    #[test]
    fn test_plain_cipher_is_identity() {
        let cipher = PlainFieldCipher;
        assert_eq!(cipher.encrypt("hunter2").unwrap(), "hunter2");
        assert_eq!(cipher.encrypt("").unwrap(), "");
    }

    // =====================================================================
    // RsaFieldCipher
    // =====================================================================

    #[test]
    fn test_encrypt_without_key_is_unavailable() {
        let cipher = RsaFieldCipher::new();
        let result = cipher.encrypt("hunter2");
        assert!(matches!(
            result,
            Err(CryptoError::EncryptionUnavailable)
        ));
    }

    #[test]
    fn test_encrypt_round_trips_through_private_key() {
        let (private, public) = keypair();
        let cipher = RsaFieldCipher::with_key(public);

        let wire = cipher.encrypt("hunter2").expect("should encrypt");

        // Ciphertext is base64, not the plaintext.
        assert_ne!(wire, "hunter2");
        let ciphertext = BASE64.decode(&wire).expect("should be base64");
        let recovered = private
            .decrypt(Pkcs1v15Encrypt, &ciphertext)
            .expect("server side should decrypt");
        assert_eq!(recovered, b"hunter2");
    }

    #[test]
    fn test_encrypt_is_randomized() {
        // PKCS#1 v1.5 pads with random bytes; equal plaintexts must not
        // produce equal ciphertexts.
        let (_, public) = keypair();
        let cipher = RsaFieldCipher::with_key(public);
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_load_pem_enables_encryption() {
        let (_, public) = keypair();
        let pem = public
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .expect("pem encode");

        let cipher = RsaFieldCipher::new();
        assert!(!cipher.has_key());

        cipher.load_pem(&pem).expect("should parse");
        assert!(cipher.has_key());
        assert!(cipher.encrypt("x").is_ok());
    }

    #[test]
    fn test_load_pem_rejects_garbage() {
        let cipher = RsaFieldCipher::new();
        let result = cipher.load_pem("not a pem at all");
        assert!(matches!(result, Err(CryptoError::InvalidKey(_))));
        assert!(!cipher.has_key());
    }

    #[test]
    fn test_loaded_key_is_never_replaced() {
        // No key rotation mid-session: the first key wins.
        let (private, public) = keypair();
        let (_, other_public) = keypair();
        let other_pem = other_public
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();

        let cipher = RsaFieldCipher::with_key(public);
        cipher.load_pem(&other_pem).expect("parse is fine");

        // Still encrypts against the original key.
        let wire = cipher.encrypt("pin").unwrap();
        let ciphertext = BASE64.decode(&wire).unwrap();
        assert!(private.decrypt(Pkcs1v15Encrypt, &ciphertext).is_ok());
    }

    #[tokio::test]
    async fn test_initialize_failure_reports_key_fetch_failed() {
        // Nothing listens on port 9 (discard); the fetch must fail loudly.
        let cipher = RsaFieldCipher::new();
        let http = reqwest::Client::new();

        let result = cipher
            .initialize(&http, "http://127.0.0.1:9/key.pem")
            .await;

        assert!(matches!(result, Err(CryptoError::KeyFetchFailed(_))));
        assert!(!cipher.fetch_in_progress());
        assert!(!cipher.has_key());
    }
}
