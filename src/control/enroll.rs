//! The enrollment envelope (§4.5 step 2): `K_c ‖ len8(username) ‖ username ‖
//! len8(hex_sha256_password) ‖ hex_sha256_password`, RSA-OAEP encrypted
//! under the server's public key.

use crate::control::crypto::KEY_LEN;
use crate::error::{Error, Result};

/// A decoded enrollment request: the client's proposed session key plus
/// the credentials it's enrolling with.
pub struct Envelope {
    /// The 32-byte symmetric session key `K_c` the client generated.
    pub session_key: [u8; KEY_LEN],
    /// The claimed username.
    pub username: String,
    /// The hex-encoded SHA-256 of the claimed password.
    pub password_hash: String,
}

fn push_len8(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    if s.len() > 255 {
        return Err(Error::ProtocolFormat(format!(
            "field too long for an 8-bit length prefix: {} bytes",
            s.len()
        )));
    }
    buf.push(s.len() as u8);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Serialize the envelope's plaintext bytes, ready for RSA-OAEP encryption.
pub fn build(session_key: &[u8; KEY_LEN], username: &str, password_hash: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(KEY_LEN + 2 + username.len() + password_hash.len());
    buf.extend_from_slice(session_key);
    push_len8(&mut buf, username)?;
    push_len8(&mut buf, password_hash)?;
    Ok(buf)
}

fn read_len8(buf: &[u8], offset: usize) -> Result<(String, usize)> {
    let len = *buf
        .get(offset)
        .ok_or_else(|| Error::ProtocolFormat("envelope truncated: missing length byte".into()))?
        as usize;
    let start = offset + 1;
    let end = start + len;
    let field = buf
        .get(start..end)
        .ok_or_else(|| Error::ProtocolFormat("envelope truncated: field overrun".into()))?;
    let s = String::from_utf8(field.to_vec())
        .map_err(|e| Error::ProtocolFormat(format!("envelope field is not UTF-8: {e}")))?;
    Ok((s, end))
}

/// Parse a decrypted envelope's plaintext bytes.
pub fn parse(plaintext: &[u8]) -> Result<Envelope> {
    if plaintext.len() < KEY_LEN {
        return Err(Error::ProtocolFormat(
            "envelope truncated: missing session key".to_string(),
        ));
    }
    let mut session_key = [0u8; KEY_LEN];
    session_key.copy_from_slice(&plaintext[..KEY_LEN]);

    let (username, next) = read_len8(plaintext, KEY_LEN)?;
    let (password_hash, _) = read_len8(plaintext, next)?;

    Ok(Envelope {
        session_key,
        username,
        password_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_then_parse_round_trips() {
        let key = [42u8; KEY_LEN];
        let bytes = build(&key, "alice", "deadbeef").unwrap();
        let envelope = parse(&bytes).unwrap();
        assert_eq!(envelope.session_key, key);
        assert_eq!(envelope.username, "alice");
        assert_eq!(envelope.password_hash, "deadbeef");
    }

    #[test]
    fn parse_rejects_truncated_envelope() {
        let err = parse(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, Error::ProtocolFormat(_)));
    }

    #[test]
    fn build_rejects_oversized_field() {
        let key = [0u8; KEY_LEN];
        let long_name = "x".repeat(300);
        let err = build(&key, &long_name, "hash").unwrap_err();
        assert!(matches!(err, Error::ProtocolFormat(_)));
    }
}
