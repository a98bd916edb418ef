//! Coordinator (C4, §4.4): turns a logical read/write request into a pair
//! of additive selector shares, drives both parties concurrently, and
//! reassembles their replies.

use std::io::{Read, Write};
use std::net::TcpStream;

use rand::rngs::OsRng;
use rand::Rng;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::party::server::{OP_READ_SECURE, OP_WRITE_VEC};
use crate::ring::{one_hot, vec_sub, Ring, RingVec};
use crate::wire::{read_u32_be, write_ring_vec, write_u32_be, write_u8};

/// Split a standard-basis-scaled vector `e` (with `e[idx] = value`) into two
/// additive shares `(share0, share1)` such that `share0 + share1 = e`
/// (§4.4). Generic over the RNG, the same way [`crate::pairing::sample_triple`]
/// is, so callers that need reproducibility (the obliviousness statistical
/// test, §8 property 5) can supply a seeded one instead of [`OsRng`].
pub fn split_selector<R: Rng>(
    dim: usize,
    idx: usize,
    value: Ring,
    rng: &mut R,
) -> Result<(RingVec, RingVec)> {
    if idx >= dim {
        return Err(Error::OutOfRange { idx, dim });
    }
    let e = one_hot(dim, idx, value);
    let f: RingVec = (0..dim).map(|_| Ring::new(rng.gen())).collect();
    let share0 = vec_sub(&e, &f);
    let share1 = f;
    Ok((share0, share1))
}

/// Issue a READ for `idx` against a database of dimension `dim`, split
/// across the two party addresses `party_a` and `party_b`. Returns the
/// reconstructed value.
pub fn read(party_a: &str, party_b: &str, dim: usize, idx: usize) -> Result<Ring> {
    let (share_a, share_b) = split_selector(dim, idx, Ring::ONE, &mut OsRng)?;

    let addr_a = party_a.to_string();
    let addr_b = party_b.to_string();
    let (result_a, result_b) = std::thread::scope(|s| {
        let handle_a = s.spawn(|| send_read(&addr_a, dim, &share_a));
        let handle_b = s.spawn(|| send_read(&addr_b, dim, &share_b));
        (
            handle_a.join().expect("party A thread panicked"),
            handle_b.join().expect("party B thread panicked"),
        )
    });

    let s0 = result_a?;
    let s1 = result_b?;
    info!(idx, dim, "read reconstructed");
    Ok(s0 + s1)
}

/// Issue a WRITE of `value` at `idx` against a database of dimension `dim`,
/// split across the two party addresses. Both parties must acknowledge for
/// this to report success (§4.4; no rollback on partial failure, see §9).
pub fn write(party_a: &str, party_b: &str, dim: usize, idx: usize, value: Ring) -> Result<()> {
    let (share_a, share_b) = split_selector(dim, idx, value, &mut OsRng)?;

    let addr_a = party_a.to_string();
    let addr_b = party_b.to_string();
    let (ack_a, ack_b) = std::thread::scope(|s| {
        let handle_a = s.spawn(|| send_write(&addr_a, dim, &share_a));
        let handle_b = s.spawn(|| send_write(&addr_b, dim, &share_b));
        (
            handle_a.join().expect("party A thread panicked"),
            handle_b.join().expect("party B thread panicked"),
        )
    });

    if let Err(e) = &ack_a {
        warn!(error = %e, "party A write failed; party B's share may already be applied");
    }
    if let Err(e) = &ack_b {
        warn!(error = %e, "party B write failed; party A's share may already be applied");
    }
    ack_a?;
    ack_b?;
    info!(idx, dim, "write committed on both parties");
    Ok(())
}

fn send_read(addr: &str, dim: usize, share: &[Ring]) -> Result<Ring> {
    let mut stream = TcpStream::connect(addr)?;
    write_u8(&mut stream, OP_READ_SECURE)?;
    write_u32_be(&mut stream, dim as u32)?;
    write_ring_vec(&mut stream, share)?;
    stream.flush()?;

    let value = read_u32_be(&mut stream)?;
    Ok(Ring::new(value))
}

fn send_write(addr: &str, dim: usize, share: &[Ring]) -> Result<()> {
    let mut stream = TcpStream::connect(addr)?;
    write_u8(&mut stream, OP_WRITE_VEC)?;
    write_u32_be(&mut stream, dim as u32)?;
    write_ring_vec(&mut stream, share)?;
    stream.flush()?;

    let mut ack = [0u8; 2];
    stream.read_exact(&mut ack)?;
    if &ack != b"OK" {
        return Err(Error::ProtocolFormat(format!(
            "expected OK acknowledgement, got {:?}",
            ack
        )));
    }
    Ok(())
}
