//! Control-channel client (C5, §4.5): drives the enrollment handshake and
//! then the rotating-key message loop against a control server.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use tracing::info;

use crate::control::crypto::{self, KEY_LEN};
use crate::control::enroll;
use crate::control::message::{
    AuthOp, AuthResponse, AuthSuccessPayload, EnrollOp, EnrollRequest, PubOp, PubRequest,
    PubResponse, RkMsg, RkMsgOp,
};
use crate::control::session::RotatingKeySession;
use crate::control::transport::{read_json, write_json};
use crate::error::{Error, Result};

/// A live, authenticated control-channel connection.
pub struct ControlClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    session: RotatingKeySession,
}

impl ControlClient {
    /// Connect to `addr` and run the full enrollment + authentication
    /// handshake for `username`/`password` (§4.5 steps 1-5).
    pub fn connect(addr: &str, username: &str, password: &str) -> Result<ControlClient> {
        let stream = TcpStream::connect(addr)?;
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);

        write_json(&mut writer, &PubRequest { op: PubOp })?;
        let pub_resp: PubResponse = read_json(&mut reader)?;
        let public_pem = STANDARD
            .decode(&pub_resp.public_pem_b64)
            .map_err(|e| Error::ProtocolFormat(format!("bad base64 public key: {e}")))?;
        let public_pem = String::from_utf8(public_pem)
            .map_err(|e| Error::ProtocolFormat(format!("public key PEM is not UTF-8: {e}")))?;
        let public_key = RsaPublicKey::from_public_key_pem(&public_pem)
            .map_err(|e| Error::CryptoFailure(format!("failed to parse public key: {e}")))?;

        let mut session_key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut session_key);

        let password_hash = crypto::hash_password(password);
        let envelope = enroll::build(&session_key, username, &password_hash)?;
        let ciphertext = crypto::oaep_encrypt(&public_key, &envelope)?;
        write_json(
            &mut writer,
            &EnrollRequest {
                op: EnrollOp,
                payload_b64: STANDARD.encode(ciphertext),
            },
        )?;

        let auth_resp: AuthResponse = read_json(&mut reader)?;
        let nonce_bytes = STANDARD
            .decode(&auth_resp.nonce_b64)
            .map_err(|e| Error::ProtocolFormat(format!("bad base64 nonce: {e}")))?;
        let nonce: [u8; crypto::NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| Error::ProtocolFormat("nonce must be 12 bytes".to_string()))?;
        let ct = STANDARD
            .decode(&auth_resp.ct_b64)
            .map_err(|e| Error::ProtocolFormat(format!("bad base64 ciphertext: {e}")))?;
        let plaintext = crypto::aead_decrypt(&session_key, &nonce, &ct)?;

        if !auth_resp.ok {
            return Err(Error::AuthenticationFailed);
        }

        let body: AuthSuccessPayload = serde_json::from_slice(&plaintext)
            .map_err(|e| Error::ProtocolFormat(format!("malformed auth success payload: {e}")))?;
        let rk_bytes = STANDARD
            .decode(&body.rk)
            .map_err(|e| Error::ProtocolFormat(format!("bad base64 rotating key: {e}")))?;
        let rk: [u8; KEY_LEN] = rk_bytes
            .try_into()
            .map_err(|_| Error::ProtocolFormat("rotating key must be 32 bytes".to_string()))?;

        info!(%username, "authenticated with control server");
        Ok(ControlClient {
            reader,
            writer,
            session: RotatingKeySession::new(rk),
        })
    }

    /// Send `payload` as an RK_MSG and return the server's decrypted reply
    /// payload (expected to be `"ACK:<payload>"`, §4.5 "Per-message
    /// protocol").
    pub fn send_message(&mut self, payload: &str) -> Result<String> {
        let (nonce_b64, ct_b64) = self.session.encrypt_payload(payload)?;
        write_json(
            &mut self.writer,
            &RkMsg {
                op: RkMsgOp,
                nonce_b64,
                ct_b64,
            },
        )?;

        let reply: RkMsg = read_json(&mut self.reader)?;
        self.session
            .decrypt_and_verify(&reply.nonce_b64, &reply.ct_b64)
    }
}
