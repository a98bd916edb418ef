//! The party's sole piece of mutable state: its share of the logical
//! database (§3, §5). A single `RwLock` suffices because every write is a
//! full-vector addition and every read is a full-vector dot product — there
//! is no sub-row locking.

use std::sync::RwLock;

use crate::ring::{dot, Ring, RingVec};

/// One party's additive share of the logical database, `S_P` in the
/// specification.
pub struct ShareStore {
    rows: usize,
    share: RwLock<RingVec>,
}

impl ShareStore {
    /// Allocate a fresh, all-zero share vector of length `rows`.
    pub fn new(rows: usize) -> Self {
        ShareStore {
            rows,
            share: RwLock::new(vec![Ring::ZERO; rows]),
        }
    }

    /// The fixed dimension every request against this party must match.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Apply `S_P[i] += update[i]` for all `i` (WRITE_VEC, §4.3). Purely
    /// local: no inter-party communication.
    pub fn apply_write(&self, update: &[Ring]) {
        let mut guard = self.share.write().expect("share lock poisoned");
        for (slot, &delta) in guard.iter_mut().zip(update) {
            *slot += delta;
        }
    }

    /// Take a read lock and return a clone of the current share vector,
    /// used both for the self term and as this party's cross-term input
    /// (§4.3 step 2 and step 3).
    pub fn snapshot(&self) -> RingVec {
        let guard = self.share.read().expect("share lock poisoned");
        guard.clone()
    }

    /// `<S_P, e_P>`, the local contribution to the reconstructed inner
    /// product (§4.3 step 2).
    pub fn self_dot(&self, selector: &[Ring]) -> Ring {
        let guard = self.share.read().expect("share lock poisoned");
        dot(&guard, selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_accumulates() {
        let store = ShareStore::new(4);
        store.apply_write(&[Ring::new(1), Ring::new(2), Ring::ZERO, Ring::ZERO]);
        store.apply_write(&[Ring::new(10), Ring::ZERO, Ring::ZERO, Ring::ZERO]);
        let snap = store.snapshot();
        assert_eq!(snap, vec![Ring::new(11), Ring::new(2), Ring::ZERO, Ring::ZERO]);
    }

    #[test]
    fn self_dot_matches_snapshot_dot() {
        let store = ShareStore::new(3);
        store.apply_write(&[Ring::new(5), Ring::new(7), Ring::new(9)]);
        let selector = vec![Ring::ONE, Ring::ZERO, Ring::ONE];
        assert_eq!(store.self_dot(&selector), Ring::new(5 + 9));
    }
}
