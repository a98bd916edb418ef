//! Pairing server loop (C2, §4.2): matches two concurrent requests for the
//! same dimension and ships each requester its half of a fresh Du–Atallah
//! triple.

use std::collections::HashMap;
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

use rand::rngs::OsRng;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pairing::protocol::RESPONSE_OP;
use crate::pairing::sample_triple;
use crate::wire::{read_u32_be, read_u8, write_u32_be, write_u64_be, write_ring_vec, write_ring, write_u8};

/// A socket parked while it waits for a peer request of the same dimension.
struct Parked {
    stream: TcpStream,
}

type Queue = Arc<Mutex<HashMap<u32, Parked>>>;

/// Run the pairing server, accepting connections forever on `listener`.
///
/// Each accepted connection is handled on its own thread. The first arrival
/// for a given dimension is parked in `queue` until a second arrival shows
/// up, at which point both are served concurrently and removed from the
/// queue.
pub fn run_pairing_server(listener: TcpListener) -> Result<()> {
    let queue: Queue = Arc::new(Mutex::new(HashMap::new()));
    info!(addr = ?listener.local_addr().ok(), "pairing server listening");

    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let queue = Arc::clone(&queue);
        std::thread::spawn(move || {
            if let Err(e) = handle_connection(stream, queue) {
                debug!(error = %e, "pairing connection closed with error");
            }
        });
    }

    Ok(())
}

fn handle_connection(mut stream: TcpStream, queue: Queue) -> Result<()> {
    let op = read_u8(&mut stream)?;
    if op != crate::pairing::protocol::REQUEST_OP {
        return Err(crate::error::Error::ProtocolFormat(format!(
            "expected pairing request op {:#x}, got {:#x}",
            crate::pairing::protocol::REQUEST_OP,
            op
        )));
    }
    let dim = read_u32_be(&mut stream)?;
    if dim == 0 {
        return Err(crate::error::Error::ProtocolFormat(
            "dimension must be positive".to_string(),
        ));
    }

    // A queued entry may belong to a requester that has since dropped its
    // socket. Discard dead entries and keep looking rather than matching
    // against a corpse and leaving the live requester (this connection)
    // hanging forever (§4.2 "Failure semantics").
    loop {
        let mut guard = queue.lock().expect("pairing queue poisoned");
        let matched = guard.remove(&dim);
        match matched {
            Some(parked) if !is_dead(&parked.stream) => {
                // Matched pair: release the queue lock before doing any I/O
                // so other dimensions aren't blocked while we generate and
                // send.
                drop(guard);
                debug!(dim, "matched pair, generating triple");
                let session_id = OsRng.gen::<u64>();
                let [share0, share1] = sample_triple(dim as usize, &mut OsRng);

                let mut first = parked.stream;
                let mut second = stream;

                send_half(&mut first, dim, session_id, &share0)?;
                send_half(&mut second, dim, session_id, &share1)?;
                return Ok(());
            }
            Some(_dead) => {
                // The queued entry dropped before it was matched; discard
                // it and retry with the (now possibly empty) queue.
                drop(guard);
                debug!(dim, "discarding dead parked socket, retrying match");
                continue;
            }
            None => {
                // First arrival for this dimension: park it within the same
                // critical section that checked the queue, so a concurrent
                // first arrival for the same dimension cannot also find the
                // queue empty and park alongside it unmatched.
                guard.insert(dim, Parked { stream });
                drop(guard);
                debug!(dim, "parked first arrival");
                return Ok(());
            }
        }
    }
}

/// Probe whether a parked socket is still open, without consuming any
/// protocol bytes it may eventually send. A parked requester never writes
/// anything while waiting, so any readable byte would only ever be the
/// other end closing the connection (an orderly FIN surfaces as a
/// zero-length peek).
fn is_dead(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return false;
    }
    let mut probe = [0u8; 1];
    let result = stream.peek(&mut probe);
    let _ = stream.set_nonblocking(false);
    match result {
        Ok(0) => true,
        Ok(_) => false,
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => false,
        Err(_) => true,
    }
}

fn send_half<W: Write>(
    w: &mut W,
    dim: u32,
    session_id: u64,
    share: &crate::pairing::TripleShare,
) -> Result<()> {
    write_u8(w, RESPONSE_OP)?;
    write_u32_be(w, dim)?;
    write_u64_be(w, session_id)?;
    write_ring_vec(w, &share.a)?;
    write_ring_vec(w, &share.b)?;
    write_ring(w, share.c)?;
    w.flush()?;
    Ok(())
}
