//! Control-channel server (C5, §4.5): enrollment, authentication, and the
//! per-message rotating-key exchange, one thread per connection.

use std::collections::HashMap;
use std::io::{BufReader, BufWriter};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{debug, info, warn};

use crate::control::crypto::{self, KEY_LEN};
use crate::control::enroll;
use crate::control::message::{
    AuthOp, AuthResponse, AuthSuccessPayload, EnrollRequest, PubOp, PubRequest, PubResponse, RkMsg,
    RkMsgOp, AUTH_FAIL_PLAINTEXT,
};
use crate::control::session::RotatingKeySession;
use crate::control::transport::{read_json, write_error, write_json};
use crate::error::{Error, Result};

/// In-memory username -> hex-SHA-256(password) table (§3 "User record").
pub type UserTable = HashMap<String, String>;

/// Everything the control server needs to handle connections.
pub struct ControlServerContext {
    pub users: UserTable,
    pub private_key: RsaPrivateKey,
    pub public_key: RsaPublicKey,
}

/// Run the control server's accept loop forever, one thread per connection.
pub fn run_control_server(listener: TcpListener, ctx: Arc<ControlServerContext>) {
    info!(addr = ?listener.local_addr().ok(), "control server listening");
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to accept control connection");
                continue;
            }
        };
        let ctx = Arc::clone(&ctx);
        std::thread::spawn(move || {
            if let Err(e) = handle_connection(stream, &ctx) {
                debug!(error = %e, "control connection closed with error");
            }
        });
    }
}

fn handle_connection(stream: TcpStream, ctx: &ControlServerContext) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    let _req: PubRequest = match read_json(&mut reader) {
        Ok(r) => r,
        Err(e) => {
            write_error(&mut writer, e.to_string())?;
            return Err(e);
        }
    };

    let public_pem = ctx
        .public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| Error::CryptoFailure(format!("failed to encode public key: {e}")))?;
    write_json(
        &mut writer,
        &PubResponse {
            op: PubOp,
            public_pem_b64: STANDARD.encode(public_pem.as_bytes()),
        },
    )?;

    let enroll_req: EnrollRequest = match read_json(&mut reader) {
        Ok(r) => r,
        Err(e) => {
            write_error(&mut writer, e.to_string())?;
            return Err(e);
        }
    };

    let envelope = match decode_envelope(ctx, &enroll_req) {
        Ok(e) => e,
        Err(e) => {
            write_error(&mut writer, e.to_string())?;
            return Err(e);
        }
    };
    let authenticated = ctx
        .users
        .get(&envelope.username)
        .map(|stored| crypto::hashes_match(stored, &envelope.password_hash))
        .unwrap_or(false);

    if !authenticated {
        debug!(username = %envelope.username, "authentication failed");
        let (nonce, ct) = crypto::aead_encrypt(&envelope.session_key, AUTH_FAIL_PLAINTEXT.as_bytes())?;
        write_json(
            &mut writer,
            &AuthResponse {
                op: AuthOp,
                ok: false,
                nonce_b64: STANDARD.encode(nonce),
                ct_b64: STANDARD.encode(ct),
            },
        )?;
        return Err(Error::AuthenticationFailed);
    }

    let mut rk0 = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut rk0);
    let body = AuthSuccessPayload {
        rk: STANDARD.encode(rk0),
        counter: 0,
    };
    let plaintext = serde_json::to_vec(&body)
        .map_err(|e| Error::Internal(format!("failed to serialize auth payload: {e}")))?;
    let (nonce, ct) = crypto::aead_encrypt(&envelope.session_key, &plaintext)?;
    write_json(
        &mut writer,
        &AuthResponse {
            op: AuthOp,
            ok: true,
            nonce_b64: STANDARD.encode(nonce),
            ct_b64: STANDARD.encode(ct),
        },
    )?;
    info!(username = %envelope.username, "authenticated");

    let mut session = RotatingKeySession::new(rk0);
    loop {
        let msg: RkMsg = match read_json(&mut reader) {
            Ok(m) => m,
            Err(Error::Transport(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(());
            }
            Err(e) => {
                write_error(&mut writer, e.to_string())?;
                return Err(e);
            }
        };

        let payload = match session.decrypt_and_verify(&msg.nonce_b64, &msg.ct_b64) {
            Ok(p) => p,
            Err(e) => {
                write_error(&mut writer, e.to_string())?;
                return Err(e);
            }
        };

        let ack = format!("ACK:{payload}");
        let (nonce_b64, ct_b64) = session.encrypt_payload(&ack)?;
        write_json(
            &mut writer,
            &RkMsg {
                op: RkMsgOp,
                nonce_b64,
                ct_b64,
            },
        )?;
    }
}

fn decode_envelope(ctx: &ControlServerContext, req: &EnrollRequest) -> Result<enroll::Envelope> {
    let ciphertext = STANDARD
        .decode(&req.payload_b64)
        .map_err(|e| Error::ProtocolFormat(format!("bad base64 enrollment payload: {e}")))?;
    let plaintext = crypto::oaep_decrypt(&ctx.private_key, &ciphertext)?;
    enroll::parse(&plaintext)
}
