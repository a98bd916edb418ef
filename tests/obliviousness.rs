//! Statistical test for testable property 5: a single party's received
//! selector share is uniform over R^d regardless of which index (or
//! value) the logical request targets -- the whole point of secret
//! sharing the one-hot vector instead of sending it in the clear.
//!
//! Verified with a fixed seed (§8 property 5) so the result is
//! reproducible rather than an occasionally-flaky statistical fluke.

use duoram::coordinator::split_selector;
use duoram::ring::{Ring, MASK};
use rand::rngs::StdRng;
use rand::SeedableRng;

const MODULUS: f64 = (1u64 << 31) as f64;

fn mean_of_share0(dim: usize, idx: usize, value: Ring, samples: usize, seed: u64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut total = 0f64;
    let mut count = 0usize;
    for _ in 0..samples {
        let (share0, _share1) = split_selector(dim, idx, value, &mut rng).unwrap();
        for r in share0 {
            total += r.value() as f64;
            count += 1;
        }
    }
    total / count as f64
}

/// Property 5: the empirical mean of a party's received share vector sits
/// near the ring's population mean (2^31 / 2) and does not depend on which
/// index was targeted -- there is no detectable signal leaking the index
/// through the share distribution. Fixed seeds make this reproducible.
#[test]
fn share0_distribution_is_independent_of_target_index() {
    let dim = 4;
    let samples = 4000;

    let mean_idx0 = mean_of_share0(dim, 0, Ring::ONE, samples, 0xD00);
    let mean_idx_last = mean_of_share0(dim, dim - 1, Ring::ONE, samples, 0xD01);

    let expected = MODULUS / 2.0;
    // Generous tolerance: central-limit standard error at this sample size
    // is on the order of 1e7, so 5% of the modulus is a wide margin.
    let tolerance = MODULUS * 0.05;

    assert!(
        (mean_idx0 - expected).abs() < tolerance,
        "idx=0 share mean {mean_idx0} too far from population mean {expected}"
    );
    assert!(
        (mean_idx_last - expected).abs() < tolerance,
        "idx={} share mean {mean_idx_last} too far from population mean {expected}",
        dim - 1
    );
    assert!(
        (mean_idx0 - mean_idx_last).abs() < tolerance,
        "share distributions for different indices diverge: {mean_idx0} vs {mean_idx_last}"
    );
}

/// Every share element respects the ring's top-bit-clear invariant (it is
/// a valid `Ring` value on the wire), independent of index or value.
#[test]
fn share_elements_stay_within_ring_bounds() {
    let mut rng = StdRng::seed_from_u64(0xD02);
    let (share0, share1) = split_selector(8, 5, Ring::new(12345), &mut rng).unwrap();
    for r in share0.into_iter().chain(share1) {
        assert_eq!(r.value() & !MASK, 0);
    }
}
