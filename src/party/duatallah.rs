//! The Du–Atallah online inner-product subprotocol (§4.3) and the party's
//! per-READ_SECURE reconstruction logic. Pure math, no sockets — the
//! networking glue lives in [`super::peer`] and [`super::server`].

use crate::pairing::TripleShare;
use crate::ring::{dot, vec_add, Ring, RingVec};

/// Which of the two parties this node is. Fixed for the lifetime of a
/// party process and threaded through every READ_SECURE it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    /// Party A.
    A,
    /// Party B.
    B,
}

impl PartyRole {
    /// The other party.
    pub fn other(self) -> PartyRole {
        match self {
            PartyRole::A => PartyRole::B,
            PartyRole::B => PartyRole::A,
        }
    }
}

/// Which side of a single tagged inner-product exchange this party plays.
/// The X-side contributes `x` and sends first; the Y-side contributes `y`
/// and receives first (§4.3, "Send–receive ordering").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Holds `x`; masks it with the triple's `a` and sends `u = x + a` first.
    X,
    /// Holds `y`; receives `u` first, then sends `v = y + b`.
    Y,
}

/// Tag for the `z_01 = <S_A, e_B>` cross term: A is X-side, B is Y-side.
pub const TAG_01: u8 = 0x01;
/// Tag for the `z_10 = <S_B, e_A>` cross term: B is X-side, A is Y-side.
pub const TAG_10: u8 = 0x10;

/// This party's additive share of `<x, y>` given both masked vectors `u`
/// and `v` and this party's half of the triple that masked them.
///
/// Party A's share omits the `<u, v>` term; party B's includes it, so that
/// `s_A + s_B = <u,v> - <u,b> - <a,y> + c = <x,y>` once both shares are
/// summed (the masking terms cancel against `c = <a,b> = c_A + c_B`).
pub fn inner_product_share(role: PartyRole, u: &[Ring], v: &[Ring], triple: &TripleShare) -> Ring {
    let base = -dot(u, &triple.b) - dot(&triple.a, v) + triple.c;
    match role {
        PartyRole::A => base,
        PartyRole::B => dot(u, v) + base,
    }
}

/// Mask this party's local input for the X-side of a tagged exchange:
/// `u = x + a`.
pub fn mask_x(x: &[Ring], triple: &TripleShare) -> RingVec {
    vec_add(x, &triple.a)
}

/// Mask this party's local input for the Y-side of a tagged exchange:
/// `v = y + b`.
pub fn mask_y(y: &[Ring], triple: &TripleShare) -> RingVec {
    vec_add(y, &triple.b)
}

/// Which side `role` plays for a given tag (§4.3: A is X on 0x01 and Y on
/// 0x10; B is the mirror image).
pub fn side_for_tag(role: PartyRole, tag: u8) -> Side {
    match (role, tag) {
        (PartyRole::A, TAG_01) => Side::X,
        (PartyRole::A, TAG_10) => Side::Y,
        (PartyRole::B, TAG_01) => Side::Y,
        (PartyRole::B, TAG_10) => Side::X,
        _ => unreachable!("only TAG_01 and TAG_10 are defined"),
    }
}
