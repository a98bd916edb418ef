//! Client-side half of the pairing protocol (§4.2, §6): how a party asks
//! for a fresh Du–Atallah triple and decodes the reply.

use std::io::{Read, Write};
use std::net::TcpStream;

use crate::error::{Error, Result};
use crate::pairing::TripleShare;
use crate::wire::{read_ring, read_ring_vec, read_u32_be, read_u64_be, write_u32_be, write_u8};

/// Request op: `0x31` followed by a big-endian `u32` dimension.
pub const REQUEST_OP: u8 = 0x31;
/// Response op: `0x33`.
pub const RESPONSE_OP: u8 = 0x33;

/// One half of a matched triple as delivered by the pairing server, along
/// with the session id that ties it to the peer's half.
pub struct TripleHalf {
    /// The session id minted by the pairing server for this matched pair.
    pub session_id: u64,
    /// This party's share of the triple.
    pub share: TripleShare,
}

/// Connect to the pairing server at `addr`, request a triple of dimension
/// `dim`, and return this party's half plus the session id (§4.2, §6).
pub fn fetch_triple(addr: &str, dim: usize) -> Result<TripleHalf> {
    let mut stream = TcpStream::connect(addr)?;
    request_triple(&mut stream, dim)?;
    read_triple_half(&mut stream, dim)
}

fn request_triple<W: Write>(w: &mut W, dim: usize) -> Result<()> {
    write_u8(w, REQUEST_OP)?;
    write_u32_be(w, dim as u32)?;
    w.flush()?;
    Ok(())
}

fn read_triple_half<R: Read>(r: &mut R, dim: usize) -> Result<TripleHalf> {
    let mut op = [0u8; 1];
    r.read_exact(&mut op)?;
    if op[0] != RESPONSE_OP {
        return Err(Error::ProtocolFormat(format!(
            "expected pairing response op {:#x}, got {:#x}",
            RESPONSE_OP, op[0]
        )));
    }

    let got_dim = read_u32_be(r)? as usize;
    crate::wire::check_dim(dim, got_dim)?;

    let session_id = read_u64_be(r)?;
    let a = read_ring_vec(r, dim)?;
    let b = read_ring_vec(r, dim)?;
    let c = read_ring(r)?;

    Ok(TripleHalf {
        session_id,
        share: TripleShare { a, b, c },
    })
}

/// Test-only loopback encode/decode of the wire format, so the framing can
/// be exercised without a real socket.
#[cfg(test)]
pub(crate) fn encode_response<W: Write>(
    w: &mut W,
    dim: usize,
    session_id: u64,
    share: &TripleShare,
) -> Result<()> {
    write_u8(w, RESPONSE_OP)?;
    write_u32_be(w, dim as u32)?;
    crate::wire::write_u64_be(w, session_id)?;
    crate::wire::write_ring_vec(w, &share.a)?;
    crate::wire::write_ring_vec(w, &share.b)?;
    crate::wire::write_ring(w, share.c)?;
    Ok(())
}
