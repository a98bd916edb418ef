//! Cryptographic primitives for the rotating-key control channel (§4.5):
//! RSA-OAEP enrollment, AES-256-GCM message protection, SHA-256 password
//! hashing, and the keyed-hash key ratchet.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng as AesOsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hmac::{Hmac, Mac};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of a session key, rotating key, and AES-256-GCM key.
pub const KEY_LEN: usize = 32;
/// Length in bytes of an AES-GCM nonce.
pub const NONCE_LEN: usize = 12;

/// Hex-encode bytes (lowercase), used for the password-hash wire format.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// SHA-256 of `password`, hex-encoded, matching the wire format used by
/// both the enrollment envelope and the in-memory user table (§4.5).
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Constant-time comparison of two hex password hashes, so a timing side
/// channel can't distinguish "wrong password" from "right password, wrong
/// something else" (§7, §8 property 8).
pub fn hashes_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

/// Generate a fresh 2048-bit RSA key pair (§4.5, §6).
pub fn generate_keypair() -> Result<(RsaPrivateKey, RsaPublicKey)> {
    let mut rng = rand::thread_rng();
    let private = RsaPrivateKey::new(&mut rng, 2048)
        .map_err(|e| Error::CryptoFailure(format!("RSA key generation failed: {e}")))?;
    let public = RsaPublicKey::from(&private);
    Ok((private, public))
}

/// RSA-OAEP encrypt `plaintext` under `public` using SHA-256 and
/// MGF1(SHA-256) (§4.5 step 2).
pub fn oaep_encrypt(public: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut rng = rand::thread_rng();
    let padding = Oaep::new::<Sha256>();
    public
        .encrypt(&mut rng, padding, plaintext)
        .map_err(|e| Error::CryptoFailure(format!("OAEP encryption failed: {e}")))
}

/// RSA-OAEP decrypt `ciphertext` under `private` (§4.5 step 3).
pub fn oaep_decrypt(private: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let padding = Oaep::new::<Sha256>();
    private
        .decrypt(padding, ciphertext)
        .map_err(|e| Error::CryptoFailure(format!("OAEP decryption failed: {e}")))
}

/// AES-256-GCM encrypt `plaintext` under `key` with a fresh random 12-byte
/// nonce and empty associated data (§4.5 "AEAD"). Returns `(nonce,
/// ciphertext)`.
pub fn aead_encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut AesOsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::CryptoFailure(format!("AEAD encryption failed: {e}")))?;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce.as_slice());
    Ok((nonce_bytes, ciphertext))
}

/// AES-256-GCM decrypt `ciphertext` under `key` and `nonce`.
pub fn aead_decrypt(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(nonce);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| Error::CryptoFailure("AEAD authentication failed".to_string()))
}

/// Advance a rotating key by one step (§4.5 "Counter and key-rotation
/// rules"): `rk <- HMAC_SHA256(key=rk, msg = "rotate" || be64(counter))`.
pub fn ratchet(rk: &[u8; KEY_LEN], counter: u64) -> Result<[u8; KEY_LEN]> {
    let mut mac = HmacSha256::new_from_slice(rk)
        .map_err(|e| Error::Internal(format!("HMAC key of wrong length: {e}")))?;
    mac.update(b"rotate");
    mac.update(&counter.to_be_bytes());
    let out = mac.finalize().into_bytes();
    let mut next = [0u8; KEY_LEN];
    next.copy_from_slice(&out);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aead_round_trips() {
        let key = [7u8; KEY_LEN];
        let (nonce, ct) = aead_encrypt(&key, b"hello world").unwrap();
        let pt = aead_decrypt(&key, &nonce, &ct).unwrap();
        assert_eq!(pt, b"hello world");
    }

    #[test]
    fn aead_rejects_tampered_ciphertext() {
        let key = [7u8; KEY_LEN];
        let (nonce, mut ct) = aead_encrypt(&key, b"hello world").unwrap();
        ct[0] ^= 0xff;
        assert!(aead_decrypt(&key, &nonce, &ct).is_err());
    }

    #[test]
    fn aead_rejects_wrong_key() {
        let key = [7u8; KEY_LEN];
        let other = [9u8; KEY_LEN];
        let (nonce, ct) = aead_encrypt(&key, b"hello world").unwrap();
        assert!(aead_decrypt(&other, &nonce, &ct).is_err());
    }

    #[test]
    fn oaep_round_trips() {
        let (private, public) = generate_keypair().unwrap();
        let ct = oaep_encrypt(&public, b"small secret").unwrap();
        let pt = oaep_decrypt(&private, &ct).unwrap();
        assert_eq!(pt, b"small secret");
    }

    #[test]
    fn ratchet_is_deterministic_and_advances() {
        let rk0 = [1u8; KEY_LEN];
        let rk1 = ratchet(&rk0, 0).unwrap();
        let rk1_again = ratchet(&rk0, 0).unwrap();
        assert_eq!(rk1, rk1_again);
        assert_ne!(rk0, rk1);

        let rk2 = ratchet(&rk1, 1).unwrap();
        assert_ne!(rk1, rk2);
    }

    #[test]
    fn password_hash_matches_manual_sha256() {
        let hash = hash_password("correct horse battery staple");
        assert_eq!(hash.len(), 64);
        assert!(hashes_match(&hash, &hash_password("correct horse battery staple")));
        assert!(!hashes_match(&hash, &hash_password("wrong password")));
    }
}
