//! Effective stake under a per-pool voting power cap
//!
//! A member's nominal stake in a pool is `floor(bonded * stake_fraction)`.
//! Effective stake caps every member at `C` such that no member holds more
//! than `max_voting_power` of the pool total, while the total stays as large
//! as possible (water-filling):
//!
//! * members are sorted by nominal stake, largest first;
//! * for `k = 0, 1, ..` the top `k` members are capped at
//!   `C = f * R / (1 - k f)` where `R` is the nominal sum of the others;
//! * the first `k` with `n[k-1] >= C >= n[k]` is the solution.
//!
//! The comparisons are exact rationals over 256-bit intermediates; only the
//! final cap is rounded down. If fewer than `1 / f` members hold stake no
//! assignment can satisfy the cap and every member is reported with zero
//! effective stake. A zero cap is always infeasible, even for an empty pool.

use crate::keeper::StakersKeeper;
use kyve_core::{Address, Fraction, KvStore, PoolId, Result, FRACTION_ONE};
use serde::{Deserialize, Serialize};
use sp_arithmetic::helpers_128bit::multiply_by_rational_with_rounding;
use sp_arithmetic::per_things::Rounding;
use std::collections::BTreeMap;

/// Effective stake of every member of a pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStakes {
    /// Effective stake per member
    pub stakes: BTreeMap<Address, u64>,
    /// Sum of effective stakes
    pub total: u64,
    /// No assignment satisfies the voting power cap
    pub voting_power_too_high: bool,
}

impl PoolStakes {
    /// Effective stake of `staker`, zero for non-members
    pub fn stake_of(&self, staker: &Address) -> u64 {
        self.stakes.get(staker).copied().unwrap_or(0)
    }

    /// Member with the lowest effective stake, ties going to the first address
    pub fn lowest(&self) -> Option<(&Address, u64)> {
        self.stakes
            .iter()
            .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(address, stake)| (address, *stake))
    }
}

/// Cap nominal stakes at the voting power limit `max_voting_power`
pub fn compute_effective_stakes(
    nominal: &BTreeMap<Address, u64>,
    max_voting_power: Fraction,
) -> PoolStakes {
    let mut stakes: BTreeMap<Address, u64> =
        nominal.keys().map(|address| (address.clone(), 0)).collect();

    let mut active: Vec<(&Address, u64)> = nominal
        .iter()
        .filter(|(_, stake)| **stake > 0)
        .map(|(address, stake)| (address, *stake))
        .collect();

    let f = u128::from(max_voting_power.parts());
    if f == 0 {
        return PoolStakes {
            stakes,
            total: 0,
            voting_power_too_high: true,
        };
    }

    if active.is_empty() {
        return PoolStakes {
            stakes,
            total: 0,
            voting_power_too_high: false,
        };
    }

    let one = u128::from(FRACTION_ONE);
    if (active.len() as u128) * f < one {
        return PoolStakes {
            stakes,
            total: 0,
            voting_power_too_high: true,
        };
    }

    active.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    // rest[k] = sum of nominal stakes from position k onward
    let mut rest = vec![0u128; active.len() + 1];
    for k in (0..active.len()).rev() {
        rest[k] = rest[k + 1] + u128::from(active[k].1);
    }

    let cap = (0..active.len()).find_map(|capped| cap_for(&active, &rest, capped, f));

    match cap {
        Some(None) => {
            for (address, stake) in &active {
                stakes.insert((*address).clone(), *stake);
            }
            PoolStakes {
                stakes,
                total: saturate(rest[0]),
                voting_power_too_high: false,
            }
        }
        Some(Some((capped, cap))) => {
            for (position, (address, stake)) in active.iter().enumerate() {
                let effective = if position < capped { cap } else { *stake };
                stakes.insert((*address).clone(), effective);
            }
            let total = u128::from(cap) * capped as u128 + rest[capped];
            PoolStakes {
                stakes,
                total: saturate(total),
                voting_power_too_high: false,
            }
        }
        None => {
            tracing::error!(
                members = active.len(),
                max_voting_power = %max_voting_power,
                "no consistent voting power cap found"
            );
            PoolStakes {
                stakes,
                total: 0,
                voting_power_too_high: true,
            }
        }
    }
}

/// Test `capped` as the number of capped members
///
/// `Some(None)` means no member needs a cap, `Some(Some((k, C)))` caps the
/// top `k` at `C`, `None` means this `k` is inconsistent.
fn cap_for(active: &[(&Address, u64)], rest: &[u128], capped: usize, f: u128) -> Option<Option<(usize, u64)>> {
    let one = u128::from(FRACTION_ONE);
    if capped == 0 {
        // largest <= f * total
        let largest = u128::from(active[0].1);
        let allowed = multiply_by_rational_with_rounding(rest[0], f, one, Rounding::Down)?;
        return (largest <= allowed).then_some(None);
    }

    let used = (capped as u128).checked_mul(f)?;
    if used >= one {
        return None;
    }
    let denominator = one - used;
    let remaining = rest[capped];

    // n[capped-1] >= f R / (1 - k f)  <=>  n >= ceil(...)
    let lower = multiply_by_rational_with_rounding(remaining, f, denominator, Rounding::Up)?;
    let smallest_capped = u128::from(active[capped - 1].1);
    if smallest_capped < lower {
        return None;
    }
    // n[capped] <= f R / (1 - k f)  <=>  n <= floor(...)
    let cap = multiply_by_rational_with_rounding(remaining, f, denominator, Rounding::Down)?;
    if u128::from(active[capped].1) > cap {
        return None;
    }
    Some(Some((capped, saturate(cap))))
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

impl StakersKeeper {
    /// `floor(bonded * stake_fraction)` for a membership, zero for non-members
    pub fn nominal_stake(&self, store: &dyn KvStore, pool_id: PoolId, staker: &Address) -> Result<u64> {
        Ok(match self.get_valaccount(store, pool_id, staker)? {
            Some(valaccount) => valaccount
                .stake_fraction
                .mul_floor(self.validators.bonded_stake(staker)),
            None => 0,
        })
    }

    /// Effective stakes of every member of a pool
    pub fn pool_stakes(&self, store: &dyn KvStore, pool_id: PoolId) -> Result<PoolStakes> {
        let nominal: BTreeMap<Address, u64> = self
            .valaccounts_of_pool(store, pool_id)?
            .into_iter()
            .map(|valaccount| {
                let bonded = self.validators.bonded_stake(&valaccount.staker);
                (valaccount.staker, valaccount.stake_fraction.mul_floor(bonded))
            })
            .collect();
        Ok(compute_effective_stakes(
            &nominal,
            self.pools.max_voting_power(pool_id),
        ))
    }

    /// Effective stake of `staker` in `pool_id`
    pub fn stake_in_pool(&self, store: &dyn KvStore, pool_id: PoolId, staker: &Address) -> Result<u64> {
        if !self.is_member(store, pool_id, staker) {
            return Ok(0);
        }
        Ok(self.pool_stakes(store, pool_id)?.stake_of(staker))
    }

    /// Sum of effective stakes in `pool_id`
    pub fn total_stake_of_pool(&self, store: &dyn KvStore, pool_id: PoolId) -> Result<u64> {
        Ok(self.pool_stakes(store, pool_id)?.total)
    }

    /// Whether no stake assignment of `pool_id` satisfies its voting power cap
    pub fn is_voting_power_too_high(&self, store: &dyn KvStore, pool_id: PoolId) -> Result<bool> {
        Ok(self.pool_stakes(store, pool_id)?.voting_power_too_high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn members(stakes: &[u64]) -> BTreeMap<Address, u64> {
        stakes
            .iter()
            .enumerate()
            .map(|(i, stake)| (Address::new(format!("kyve1member{i}")).unwrap(), *stake))
            .collect()
    }

    fn effective(result: &PoolStakes) -> Vec<u64> {
        result.stakes.values().copied().collect()
    }

    #[test]
    fn test_half_cap_clips_largest() {
        let result = compute_effective_stakes(&members(&[100, 250, 100]), Fraction::from_percent(50));
        assert_eq!(effective(&result), vec![100, 200, 100]);
        assert_eq!(result.total, 400);
        assert!(!result.voting_power_too_high);
    }

    #[test]
    fn test_two_members_capped() {
        let result = compute_effective_stakes(&members(&[600, 500, 120]), Fraction::from_percent(35));
        assert_eq!(effective(&result), vec![140, 140, 120]);
        assert_eq!(result.total, 400);
    }

    #[test]
    fn test_infeasible_cap_zeroes_pool() {
        let result = compute_effective_stakes(&members(&[100, 100, 100]), Fraction::from_percent(20));
        assert!(result.voting_power_too_high);
        assert_eq!(result.total, 0);
        assert_eq!(effective(&result), vec![0, 0, 0]);
    }

    #[test]
    fn test_full_power_single_member() {
        let result = compute_effective_stakes(&members(&[100]), Fraction::one());
        assert_eq!(effective(&result), vec![100]);
        assert_eq!(result.total, 100);
    }

    #[test]
    fn test_zero_cap_is_infeasible() {
        let result = compute_effective_stakes(&members(&[100, 200]), Fraction::zero());
        assert!(result.voting_power_too_high);
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_zero_cap_flags_pools_without_stake() {
        let empty = compute_effective_stakes(&BTreeMap::new(), Fraction::zero());
        assert!(empty.voting_power_too_high);
        assert_eq!(empty.total, 0);

        let unstaked = compute_effective_stakes(&members(&[0, 0]), Fraction::zero());
        assert!(unstaked.voting_power_too_high);
        assert_eq!(effective(&unstaked), vec![0, 0]);
    }

    #[test]
    fn test_all_zero_delegation_is_not_flagged() {
        let result = compute_effective_stakes(&members(&[0, 0, 0]), Fraction::from_percent(50));
        assert!(!result.voting_power_too_high);
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_zero_stake_members_do_not_count_towards_feasibility() {
        let result = compute_effective_stakes(&members(&[100, 0, 0]), Fraction::from_percent(50));
        assert!(result.voting_power_too_high);
    }

    #[test]
    fn test_exact_threshold_caps_all_at_smallest() {
        // two members at f = 0.5 must be equal
        let result = compute_effective_stakes(&members(&[300, 100]), Fraction::from_percent(50));
        assert_eq!(effective(&result), vec![100, 100]);
        assert_eq!(result.total, 200);
    }

    #[test]
    fn test_lowest_breaks_ties_by_address() {
        let result = compute_effective_stakes(&members(&[50, 10, 10]), Fraction::one());
        let (address, stake) = result.lowest().unwrap();
        assert_eq!(address.as_str(), "kyve1member1");
        assert_eq!(stake, 10);
    }

    proptest! {
        #[test]
        fn prop_cap_holds_and_stakes_never_grow(
            stakes in proptest::collection::vec(0u64..1_000_000_000_000, 1..50),
            percent in 1u64..=100,
        ) {
            let nominal = members(&stakes);
            let f = Fraction::from_percent(percent);
            let result = compute_effective_stakes(&nominal, f);

            for (address, stake) in &result.stakes {
                prop_assert!(*stake <= nominal[address]);
            }
            if result.voting_power_too_high {
                prop_assert_eq!(result.total, 0);
            } else {
                let sum: u64 = result.stakes.values().sum();
                prop_assert_eq!(sum, result.total);
                let limit = f.mul_floor_u128(u128::from(result.total));
                for stake in result.stakes.values() {
                    prop_assert!(u128::from(*stake) <= limit);
                }
            }
        }

        #[test]
        fn prop_uncapped_when_cap_is_one(stakes in proptest::collection::vec(0u64..1_000_000, 1..20)) {
            let nominal = members(&stakes);
            let result = compute_effective_stakes(&nominal, Fraction::one());
            prop_assert!(!result.voting_power_too_high);
            prop_assert_eq!(result.total, stakes.iter().sum::<u64>());
        }
    }
}
