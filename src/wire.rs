//! Low-level big-endian framing shared by every socket in this crate.
//!
//! The wire protocols in §6 are deliberately plain: fixed-width big-endian
//! integers followed by fixed-width ring elements, no length-prefixed
//! strings beyond the single-byte lengths used in the control channel's
//! enrollment envelope. This module is the one place that turns bytes on a
//! `TcpStream` into those shapes, mirroring how `tcp_channel` turns raw
//! `Read`/`Write` calls into typed values.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::ring::{Ring, RingVec};

/// Read a single byte (an op code or a subprotocol tag).
pub fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Write a single byte.
pub fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    w.write_all(&[v])?;
    Ok(())
}

/// Read a big-endian `u32` (dimensions, shares).
pub fn read_u32_be<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Write a big-endian `u32`.
pub fn write_u32_be<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_all(&v.to_be_bytes())?;
    Ok(())
}

/// Read a big-endian `u64` (session ids).
pub fn read_u64_be<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

/// Write a big-endian `u64`.
pub fn write_u64_be<W: Write>(w: &mut W, v: u64) -> Result<()> {
    w.write_all(&v.to_be_bytes())?;
    Ok(())
}

/// Read a single big-endian ring element.
pub fn read_ring<R: Read>(r: &mut R) -> Result<Ring> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(Ring::from_be_bytes(buf))
}

/// Write a single big-endian ring element.
pub fn write_ring<W: Write>(w: &mut W, v: Ring) -> Result<()> {
    w.write_all(&v.to_be_bytes())?;
    Ok(())
}

/// Read `dim` consecutive big-endian ring elements.
pub fn read_ring_vec<R: Read>(r: &mut R, dim: usize) -> Result<RingVec> {
    let mut out = Vec::with_capacity(dim);
    for _ in 0..dim {
        out.push(read_ring(r)?);
    }
    Ok(out)
}

/// Write a vector of ring elements, one after another.
pub fn write_ring_vec<W: Write>(w: &mut W, v: &[Ring]) -> Result<()> {
    for &x in v {
        write_ring(w, x)?;
    }
    Ok(())
}

/// Check `got == expected`, producing a [`Error::DimensionMismatch`]
/// otherwise. Every op in §4 performs this check before trusting its
/// payload.
pub fn check_dim(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::DimensionMismatch { expected, got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_scalars() {
        let mut buf = Vec::new();
        write_u8(&mut buf, 0x31).unwrap();
        write_u32_be(&mut buf, 42).unwrap();
        write_u64_be(&mut buf, 0xdead_beef_1234_5678).unwrap();

        let mut cur = Cursor::new(buf);
        assert_eq!(read_u8(&mut cur).unwrap(), 0x31);
        assert_eq!(read_u32_be(&mut cur).unwrap(), 42);
        assert_eq!(read_u64_be(&mut cur).unwrap(), 0xdead_beef_1234_5678);
    }

    #[test]
    fn round_trips_ring_vec() {
        let v = vec![Ring::new(1), Ring::new(2), Ring::new(0x7fff_ffff)];
        let mut buf = Vec::new();
        write_ring_vec(&mut buf, &v).unwrap();

        let mut cur = Cursor::new(buf);
        let out = read_ring_vec(&mut cur, v.len()).unwrap();
        assert_eq!(out, v);
    }

    #[test]
    fn truncated_frame_is_transport_error() {
        let mut cur = Cursor::new(vec![0u8; 2]);
        let err = read_u32_be(&mut cur).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn dim_check_rejects_mismatch() {
        assert!(check_dim(4, 4).is_ok());
        assert!(matches!(
            check_dim(4, 5),
            Err(Error::DimensionMismatch {
                expected: 4,
                got: 5
            })
        ));
    }
}
