//! Error taxonomy shared by every component (§7).
//!
//! Library code returns [`Error`]; the binaries wrap it (and the `io`/`rsa`
//! errors that cross the library boundary) in `anyhow::Result` the way the
//! rest of this crate's binaries do.

use thiserror::Error;

/// Errors produced by the ring protocol, the pairing server, and the
/// rotating-key control channel.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed op byte, truncated frame, or other wire-format violation.
    #[error("protocol format error: {0}")]
    ProtocolFormat(String),

    /// A request's `dim` did not match the expected dimension.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// The dimension the receiver expected.
        expected: usize,
        /// The dimension that was actually received.
        got: usize,
    },

    /// A peer message's (session id, tag) did not match what was expected.
    #[error("session mismatch: expected (sid={expected_sid}, tag={expected_tag:#x}), got (sid={got_sid}, tag={got_tag:#x})")]
    SessionMismatch {
        /// The session id the receiver expected.
        expected_sid: u64,
        /// The tag the receiver expected.
        expected_tag: u8,
        /// The session id that was actually received.
        got_sid: u64,
        /// The tag that was actually received.
        got_tag: u8,
    },

    /// OAEP decryption, AEAD tag verification, or counter-ratchet failure.
    #[error("cryptographic failure: {0}")]
    CryptoFailure(String),

    /// Username/password did not match a stored record.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// A requested index fell outside `[0, dim)`.
    #[error("index {idx} out of range for dimension {dim}")]
    OutOfRange {
        /// The index that was requested.
        idx: usize,
        /// The dimension it should have been smaller than.
        dim: usize,
    },

    /// The underlying socket closed, timed out, or otherwise failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// An invariant internal to this crate was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias for library-level results.
pub type Result<T> = std::result::Result<T, Error>;
