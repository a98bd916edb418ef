//! Per-connection rotating-key session state (§3, §4.5): the symmetric
//! session key bootstrapped by enrollment, the current rotating key, and
//! the monotonic counter, advanced in lockstep by both peers.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::control::crypto::{self, KEY_LEN, NONCE_LEN};
use crate::control::message::RkPayload;
use crate::error::{Error, Result};

/// State created on successful enrollment+auth, destroyed on disconnect or
/// any protocol error (§3 "Lifecycles").
pub struct RotatingKeySession {
    rk: [u8; KEY_LEN],
    counter: u64,
}

impl RotatingKeySession {
    /// Start a fresh session at `counter = 0` with the given rotating key.
    pub fn new(rk: [u8; KEY_LEN]) -> Self {
        RotatingKeySession { rk, counter: 0 }
    }

    /// The current counter, for embedding in outgoing messages.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Advance `rk` and `counter` by one step, matching the transformation
    /// both peers apply after every message they send or receive (§4.5
    /// "Counter and key-rotation rules").
    fn advance(&mut self) -> Result<()> {
        self.rk = crypto::ratchet(&self.rk, self.counter)?;
        self.counter += 1;
        Ok(())
    }

    /// Encrypt `payload` under the current `rk` with the current counter
    /// embedded, then ratchet. Returns `(nonce_b64, ct_b64)` ready to drop
    /// into an [`RkMsg`](crate::control::message::RkMsg).
    pub fn encrypt_payload(&mut self, payload: &str) -> Result<(String, String)> {
        let body = RkPayload {
            payload: payload.to_string(),
            counter: self.counter,
        };
        let plaintext = serde_json::to_vec(&body)
            .map_err(|e| Error::Internal(format!("failed to serialize RK payload: {e}")))?;
        let (nonce, ct) = crypto::aead_encrypt(&self.rk, &plaintext)?;
        self.advance()?;
        Ok((STANDARD.encode(nonce), STANDARD.encode(ct)))
    }

    /// Decrypt an incoming `(nonce_b64, ct_b64)` pair, verify its embedded
    /// counter matches the current counter, then ratchet. Returns the
    /// decrypted application payload string.
    pub fn decrypt_and_verify(&mut self, nonce_b64: &str, ct_b64: &str) -> Result<String> {
        let nonce_bytes = STANDARD
            .decode(nonce_b64)
            .map_err(|e| Error::ProtocolFormat(format!("bad base64 nonce: {e}")))?;
        let ct = STANDARD
            .decode(ct_b64)
            .map_err(|e| Error::ProtocolFormat(format!("bad base64 ciphertext: {e}")))?;
        let nonce: [u8; NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| Error::ProtocolFormat("nonce must be 12 bytes".to_string()))?;

        let plaintext = crypto::aead_decrypt(&self.rk, &nonce, &ct)?;
        let body: RkPayload = serde_json::from_slice(&plaintext)
            .map_err(|e| Error::ProtocolFormat(format!("malformed RK payload: {e}")))?;

        if body.counter != self.counter {
            return Err(Error::CryptoFailure(format!(
                "counter desync: expected {}, got {}",
                self.counter, body.counter
            )));
        }

        self.advance()?;
        Ok(body.payload)
    }
}
