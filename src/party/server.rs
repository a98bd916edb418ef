//! Client-facing accept loop and op handlers for the party node (§4.3, §6).

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::party::duatallah::{self, PartyRole, Side, TAG_01, TAG_10};
use crate::party::peer::PeerLink;
use crate::party::state::ShareStore;
use crate::ring::Ring;
use crate::wire::{check_dim, read_ring_vec, read_u32_be, read_u8, write_u32_be};

/// Client-facing op: apply a local additive write.
pub const OP_WRITE_VEC: u8 = 0x40;
/// Client-facing op: run a secure read via the Du–Atallah protocol.
pub const OP_READ_SECURE: u8 = 0x41;

/// Everything one party instance needs to serve client and peer traffic.
pub struct PartyContext {
    /// Whether this process is party A or party B.
    pub role: PartyRole,
    /// This party's share of the logical database.
    pub store: ShareStore,
    /// Address of the pairing server to fetch triples from.
    pub pairing_addr: String,
    /// Link to the peer party's peer-facing port.
    pub peer: Arc<PeerLink>,
}

/// Run the client-facing accept loop forever, handling each connection on
/// its own thread (§5).
pub fn run_client_server(listener: TcpListener, ctx: Arc<PartyContext>) {
    info!(addr = ?listener.local_addr().ok(), role = ?ctx.role, "party client port listening");
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to accept client connection");
                continue;
            }
        };
        let ctx = Arc::clone(&ctx);
        std::thread::spawn(move || {
            if let Err(e) = handle_client_connection(stream, &ctx) {
                debug!(error = %e, "client connection closed with error");
            }
        });
    }
}

fn handle_client_connection(mut stream: TcpStream, ctx: &PartyContext) -> Result<()> {
    let op = read_u8(&mut stream)?;
    match op {
        OP_WRITE_VEC => handle_write_vec(&mut stream, ctx),
        OP_READ_SECURE => handle_read_secure(&mut stream, ctx),
        other => Err(Error::ProtocolFormat(format!("unknown client op {other:#x}"))),
    }
}

fn handle_write_vec(stream: &mut TcpStream, ctx: &PartyContext) -> Result<()> {
    let dim = read_u32_be(stream)? as usize;
    check_dim(ctx.store.rows(), dim)?;
    let update = read_ring_vec(stream, dim)?;
    ctx.store.apply_write(&update);
    use std::io::Write;
    stream.write_all(b"OK")?;
    stream.flush()?;
    Ok(())
}

fn handle_read_secure(stream: &mut TcpStream, ctx: &PartyContext) -> Result<()> {
    let dim = read_u32_be(stream)? as usize;
    check_dim(ctx.store.rows(), dim)?;
    let selector = read_ring_vec(stream, dim)?;

    let share = run_read_secure(ctx, dim, &selector)?;

    write_u32_be(stream, share.value())?;
    use std::io::Write;
    stream.flush()?;
    Ok(())
}

/// The Du–Atallah online protocol for a single READ_SECURE (§4.3): fetch a
/// triple, compute the self term locally, and reconstruct the two cross
/// terms with the peer over the dedicated peer port.
fn run_read_secure(ctx: &PartyContext, dim: usize, selector: &[Ring]) -> Result<Ring> {
    let triple_half = crate::pairing::fetch_triple(&ctx.pairing_addr, dim)?;
    let session_id = triple_half.session_id;
    let triple = &triple_half.share;

    // Snapshot S_P once: it's both the self term's operand and this
    // party's contribution to whichever tag it plays X-side on.
    let own_share = ctx.store.snapshot();
    let self_term = crate::ring::dot(&own_share, selector);

    let z01 = run_tag(ctx, session_id, TAG_01, &own_share, selector, triple)?;
    let z10 = run_tag(ctx, session_id, TAG_10, &own_share, selector, triple)?;

    Ok(self_term + z01 + z10)
}

/// Run one tagged Du–Atallah exchange and return this party's share of the
/// resulting cross term. `own_share` is this party's row vector (used when
/// playing X-side); `selector` is the received request vector (used when
/// playing Y-side).
fn run_tag(
    ctx: &PartyContext,
    session_id: u64,
    tag: u8,
    own_share: &[Ring],
    selector: &[Ring],
    triple: &crate::pairing::TripleShare,
) -> Result<Ring> {
    let side = duatallah::side_for_tag(ctx.role, tag);
    let (u, v) = match side {
        Side::X => {
            let u = duatallah::mask_x(own_share, triple);
            ctx.peer.send(session_id, tag, &u)?;
            let v = ctx.peer.recv(session_id, tag, u.len())?;
            (u, v)
        }
        Side::Y => {
            let u = ctx.peer.recv(session_id, tag, selector.len())?;
            let v = duatallah::mask_y(selector, triple);
            ctx.peer.send(session_id, tag, &v)?;
            (u, v)
        }
    };
    Ok(duatallah::inner_product_share(ctx.role, &u, &v, triple))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::Ring;

    #[test]
    fn unknown_op_is_protocol_format_error() {
        let err = Error::ProtocolFormat("unknown client op 0x99".into());
        assert!(matches!(err, Error::ProtocolFormat(_)));
    }

    #[test]
    fn role_and_tag_determine_side_consistently() {
        // Sanity check that both parties agree on who is X vs Y per tag,
        // mirroring the wiring in `run_tag`.
        assert_eq!(duatallah::side_for_tag(PartyRole::A, TAG_01), Side::X);
        assert_eq!(duatallah::side_for_tag(PartyRole::B, TAG_01), Side::Y);
        assert_eq!(duatallah::side_for_tag(PartyRole::A, TAG_10), Side::Y);
        assert_eq!(duatallah::side_for_tag(PartyRole::B, TAG_10), Side::X);
    }

    #[test]
    fn self_dot_is_zero_on_fresh_store() {
        let store = ShareStore::new(4);
        let selector = vec![Ring::ONE, Ring::ZERO, Ring::ZERO, Ring::ZERO];
        assert_eq!(store.self_dot(&selector), Ring::ZERO);
    }
}
