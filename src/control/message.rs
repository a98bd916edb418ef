//! Newline-delimited JSON message shapes for the control channel (§4.5,
//! §6). One [`serde_json::Value`]-free struct per `op`, tagged by `op` so a
//! reader can dispatch before fully parsing the payload.

use serde::{Deserialize, Serialize};

/// `{"op":"PUB"}` — the client's request for the server's RSA public key.
#[derive(Debug, Serialize, Deserialize)]
pub struct PubRequest {
    pub op: PubOp,
}

/// `{"op":"PUB","public_pem_b64":...}` — the server's reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct PubResponse {
    pub op: PubOp,
    pub public_pem_b64: String,
}

/// `{"op":"ENROLL","payload_b64":...}` — the RSA-OAEP-wrapped enrollment
/// envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollRequest {
    pub op: EnrollOp,
    pub payload_b64: String,
}

/// `{"op":"AUTH","ok":...,"nonce_b64":...,"ct_b64":...}` — the
/// AEAD-wrapped authentication result.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub op: AuthOp,
    pub ok: bool,
    pub nonce_b64: String,
    pub ct_b64: String,
}

/// `{"op":"RK_MSG","nonce_b64":...,"ct_b64":...}` — a rotating-key
/// protected application message, sent in either direction.
#[derive(Debug, Serialize, Deserialize)]
pub struct RkMsg {
    pub op: RkMsgOp,
    pub nonce_b64: String,
    pub ct_b64: String,
}

/// `{"error":"..."}` — sent in place of any reply on a protocol violation,
/// then the connection is closed (§7).
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMsg {
    pub error: String,
}

/// The plaintext carried inside an [`AuthResponse`]'s AEAD envelope on
/// success: the freshly minted rotating key and starting counter.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSuccessPayload {
    pub rk: String,
    pub counter: u64,
}

/// The plaintext carried inside an [`RkMsg`]'s AEAD envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct RkPayload {
    pub payload: String,
    pub counter: u64,
}

/// Fixed plaintext returned under `K_c` when authentication fails, so the
/// server never reveals *why* over the wire (§4.5 step 4, §7).
pub const AUTH_FAIL_PLAINTEXT: &str = "AUTH_FAIL";

macro_rules! literal_op {
    ($name:ident, $lit:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str($lit)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                if s == $lit {
                    Ok($name)
                } else {
                    Err(serde::de::Error::custom(format!(
                        "expected op {:?}, got {:?}",
                        $lit, s
                    )))
                }
            }
        }
    };
}

literal_op!(PubOp, "PUB");
literal_op!(EnrollOp, "ENROLL");
literal_op!(AuthOp, "AUTH");
literal_op!(RkMsgOp, "RK_MSG");
