//! Proptest strategies for stakers inputs

use kyve_core::{Fraction, FRACTION_ONE};
use proptest::prelude::*;

/// Fractions in `[0, 1]` at full 18-decimal precision
pub fn arb_fraction() -> impl Strategy<Value = Fraction> {
    (0..=FRACTION_ONE).prop_map(Fraction::from_parts)
}

/// Non-zero voting power caps
pub fn arb_voting_power() -> impl Strategy<Value = Fraction> {
    (1..=FRACTION_ONE).prop_map(Fraction::from_parts)
}

/// Bonded stakes of up to `max_members` validators
pub fn arb_bonded_stakes(max_members: usize) -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(1u64..10_000_000_000, 1..=max_members)
}

/// Delays between blocks, in seconds
pub fn arb_block_gaps(max_blocks: usize) -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(0u64..200, 1..=max_blocks)
}
