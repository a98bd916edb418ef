//! Newline-delimited JSON framing shared by the control server and client
//! (§4.5 "Transport"): one JSON object per line.

use std::io::{BufRead, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::control::message::ErrorMsg;
use crate::error::{Error, Result};

/// Read one line and deserialize it as `T`.
pub fn read_json<T: DeserializeOwned, R: BufRead>(reader: &mut R) -> Result<T> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Err(Error::Transport(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before a message was received",
        )));
    }
    serde_json::from_str(line.trim_end()).map_err(|e| {
        Error::ProtocolFormat(format!("malformed JSON message: {e}"))
    })
}

/// Serialize `value` and write it as a single newline-terminated line.
pub fn write_json<T: Serialize, W: Write>(writer: &mut W, value: &T) -> Result<()> {
    let mut line = serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("failed to serialize message: {e}")))?;
    line.push('\n');
    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write a `{"error":"..."}` line, the universal failure reply (§7).
pub fn write_error<W: Write>(writer: &mut W, message: impl Into<String>) -> Result<()> {
    write_json(writer, &ErrorMsg { error: message.into() })
}
