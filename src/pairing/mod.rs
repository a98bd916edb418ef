//! Pairing server (C2): the correlated-randomness helper.
//!
//! Two parties each ask for a triple of the same dimension; the first
//! arrival is parked until a second shows up, at which point the server
//! mints a triple and a session id and ships one half to each. See §4.2.

pub mod protocol;
pub mod server;

pub use protocol::{fetch_triple, TripleHalf, REQUEST_OP, RESPONSE_OP};
pub use server::run_pairing_server;

use rand::Rng;

use crate::ring::{Ring, RingVec};

/// One party's half of a Du–Atallah triple (§3): `(a, b, c)` with
/// `a`/`b` of length `dim` and `c` a single scalar.
#[derive(Debug, Clone)]
pub struct TripleShare {
    /// This party's share of the first random vector.
    pub a: RingVec,
    /// This party's share of the second random vector.
    pub b: RingVec,
    /// This party's share of the scalar `c = <a0+a1, b0+b1>`.
    pub c: Ring,
}

/// Sample a fresh Du–Atallah triple of dimension `dim`, split additively
/// between the two parties: `(a0, a1, b0, b1)` uniform, `c0 + c1 = <a0+a1,
/// b0+b1>`.
pub fn sample_triple<R: Rng>(dim: usize, rng: &mut R) -> [TripleShare; 2] {
    let a0: RingVec = (0..dim).map(|_| Ring::new(rng.gen())).collect();
    let a1: RingVec = (0..dim).map(|_| Ring::new(rng.gen())).collect();
    let b0: RingVec = (0..dim).map(|_| Ring::new(rng.gen())).collect();
    let b1: RingVec = (0..dim).map(|_| Ring::new(rng.gen())).collect();

    let a_sum = crate::ring::vec_add(&a0, &a1);
    let b_sum = crate::ring::vec_add(&b0, &b1);
    let c = crate::ring::dot(&a_sum, &b_sum);

    let c0 = Ring::new(rng.gen());
    let c1 = c - c0;

    [
        TripleShare { a: a0, b: b0, c: c0 },
        TripleShare { a: a1, b: b1, c: c1 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn triple_identity_holds() {
        let mut rng = StdRng::seed_from_u64(7);
        let [s0, s1] = sample_triple(5, &mut rng);

        let a_sum = crate::ring::vec_add(&s0.a, &s1.a);
        let b_sum = crate::ring::vec_add(&s0.b, &s1.b);
        let expected = crate::ring::dot(&a_sum, &b_sum);

        assert_eq!(s0.c + s1.c, expected);
    }
}
