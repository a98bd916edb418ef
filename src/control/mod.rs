//! Rotating-key authenticated control channel (C5, §4.5): an RSA-OAEP
//! enrollment envelope bootstraps a symmetric session key, password-hash
//! authentication gates access, and a per-message AEAD session with a
//! keyed-hash key ratchet protects everything after.

pub mod client;
pub mod crypto;
pub mod enroll;
pub mod keys;
pub mod message;
pub mod server;
pub mod session;
pub mod transport;

pub use client::ControlClient;
pub use server::{run_control_server, ControlServerContext, UserTable};
