//! Encrypted OAuth state token
//!
//! The `state` parameter round-tripped through GitHub carries the
//! post-login redirect target, AEAD-encrypted so the callback can only be
//! completed by a login this process initiated.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const AES_256_KEY_BYTES: usize = 32;
const AES_GCM_NONCE_BYTES: usize = 12;

/// Request-scoped data carried through the OAuth redirect.
///
/// Exists only inside an encrypted token; never persisted. Created when
/// the login redirect is issued, consumed exactly once at callback time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    /// Path the browser is sent to after a successful login
    pub redirect: String,
}

fn could_not_decrypt() -> AppError {
    AppError::Invalid {
        parameter: "state",
        detail: "could_not_decrypt",
    }
}

/// AES-256-GCM codec for [`OAuthState`] tokens.
///
/// The key is generated fresh at process start and held only in memory.
/// State tokens issued before a restart therefore fail verification
/// afterwards, and multi-instance deployments must share the key
/// out-of-band or route callbacks to the issuing instance.
pub struct StateCrypto {
    cipher: Aes256Gcm,
}

impl StateCrypto {
    /// Generate a codec with a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0_u8; AES_256_KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut key);
        Self::from_key(&key).expect("freshly generated key has the right length")
    }

    /// Build a codec from an existing 32-byte key.
    pub fn from_key(key: &[u8]) -> Result<Self, AppError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
            AppError::Encryption(format!(
                "invalid state encryption key length (expected {} bytes)",
                AES_256_KEY_BYTES
            ))
        })?;
        Ok(Self { cipher })
    }

    /// Encrypt a state payload into an opaque URL-safe token.
    ///
    /// Token layout: base64url(nonce || ciphertext), with the GCM tag
    /// embedded in the ciphertext.
    pub fn encrypt(&self, state: &OAuthState) -> Result<String, AppError> {
        let payload = serde_json::to_vec(state).map_err(|e| AppError::Internal(e.into()))?;

        let mut nonce = [0_u8; AES_GCM_NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut nonce);
        let nonce_value = Nonce::from_slice(&nonce);
        let ciphertext = self
            .cipher
            .encrypt(nonce_value, payload.as_slice())
            .map_err(|_| AppError::Encryption("state encryption failed".to_string()))?;

        let mut raw = Vec::with_capacity(AES_GCM_NONCE_BYTES + ciphertext.len());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Decrypt and validate a state token.
    ///
    /// Every failure mode (bad encoding, truncation, failed tag
    /// verification, unexpected payload shape) maps to the same
    /// `invalid_parameter` error; unauthenticated ciphertext is never
    /// interpreted.
    pub fn decrypt(&self, token: &str) -> Result<OAuthState, AppError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| could_not_decrypt())?;

        if raw.len() <= AES_GCM_NONCE_BYTES {
            return Err(could_not_decrypt());
        }

        let (nonce, ciphertext) = raw.split_at(AES_GCM_NONCE_BYTES);
        let nonce_value = Nonce::from_slice(nonce);
        let payload = self
            .cipher
            .decrypt(nonce_value, ciphertext)
            .map_err(|_| could_not_decrypt())?;

        serde_json::from_slice(&payload).map_err(|_| could_not_decrypt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_could_not_decrypt(result: Result<OAuthState, AppError>) {
        match result {
            Err(AppError::Invalid { parameter, detail }) => {
                assert_eq!(parameter, "state");
                assert_eq!(detail, "could_not_decrypt");
            }
            other => panic!("expected invalid_parameter error, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_preserves_state() {
        let crypto = StateCrypto::generate();
        let state = OAuthState {
            redirect: "/app".to_string(),
        };

        let token = crypto.encrypt(&state).expect("encrypt succeeds");
        let decrypted = crypto.decrypt(&token).expect("decrypt succeeds");
        assert_eq!(decrypted, state);
    }

    #[test]
    fn tokens_are_url_safe() {
        let crypto = StateCrypto::generate();
        let state = OAuthState {
            redirect: "/a?b=c&d=e".to_string(),
        };

        let token = crypto.encrypt(&state).expect("encrypt succeeds");
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn tampered_token_fails_closed() {
        let crypto = StateCrypto::generate();
        let token = crypto
            .encrypt(&OAuthState {
                redirect: "/".to_string(),
            })
            .expect("encrypt succeeds");

        // Flip one bit in every byte position; decryption must always fail.
        let mut raw = URL_SAFE_NO_PAD.decode(&token).expect("token decodes");
        for index in 0..raw.len() {
            raw[index] ^= 0x01;
            let tampered = URL_SAFE_NO_PAD.encode(&raw);
            assert_could_not_decrypt(crypto.decrypt(&tampered));
            raw[index] ^= 0x01;
        }
    }

    #[test]
    fn wrong_key_fails_closed() {
        let issuer = StateCrypto::generate();
        let verifier = StateCrypto::generate();

        let token = issuer
            .encrypt(&OAuthState {
                redirect: "/".to_string(),
            })
            .expect("encrypt succeeds");
        assert_could_not_decrypt(verifier.decrypt(&token));
    }

    #[test]
    fn garbage_tokens_fail_closed() {
        let crypto = StateCrypto::generate();

        assert_could_not_decrypt(crypto.decrypt("not base64!!"));
        assert_could_not_decrypt(crypto.decrypt(""));
        // Valid base64 but shorter than a nonce.
        assert_could_not_decrypt(crypto.decrypt(&URL_SAFE_NO_PAD.encode([0_u8; 8])));
    }

    #[test]
    fn rejects_short_key() {
        assert!(StateCrypto::from_key(&[0_u8; 16]).is_err());
    }
}
