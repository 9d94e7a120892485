//! Structural invariant checks over the whole module store
//!
//! These walk every table and are meant for tests, simulations and operator
//! tooling, not for per-block execution.

use crate::commission::CommissionQueue;
use crate::keeper::StakersKeeper;
use crate::keys;
use crate::leave::LeaveQueue;
use crate::queue::{DeferredQueue, QueueEntry};
use crate::stake_fraction::StakeFractionQueue;
use crate::types::MAX_STAKERS_PER_POOL;
use kyve_core::{Address, KvStore, PoolId, Result, StakersError};
use std::collections::BTreeMap;

impl StakersKeeper {
    /// Verify counters, indexes and queue bookkeeping agree with the records
    pub fn check_invariants(&self, store: &dyn KvStore) -> Result<()> {
        let valaccounts = self.all_valaccounts(store)?;

        let mut per_pool: BTreeMap<PoolId, u64> = BTreeMap::new();
        let mut per_staker: BTreeMap<Address, u64> = BTreeMap::new();
        for valaccount in &valaccounts {
            *per_pool.entry(valaccount.pool_id).or_default() += 1;
            *per_staker.entry(valaccount.staker.clone()).or_default() += 1;

            if valaccount.valaddress == valaccount.staker {
                return Err(broken(format!(
                    "{} uses its own address as valaddress in pool {}",
                    valaccount.staker, valaccount.pool_id
                )));
            }
            let owner = self.valaddress_owner(store, &valaccount.valaddress)?;
            if owner != Some((valaccount.staker.clone(), valaccount.pool_id)) {
                return Err(broken(format!(
                    "valaddress {} is not indexed to {} in pool {}",
                    valaccount.valaddress, valaccount.staker, valaccount.pool_id
                )));
            }
            if !store.has(&keys::valaccount_by_staker_key(
                &valaccount.staker,
                valaccount.pool_id,
            )) {
                return Err(broken(format!(
                    "missing staker index for {} in pool {}",
                    valaccount.staker, valaccount.pool_id
                )));
            }
            let leave = self.pending_leave(store, &valaccount.staker, valaccount.pool_id)?;
            if valaccount.is_leaving != leave.is_some() {
                return Err(broken(format!(
                    "{} in pool {} has is_leaving={} but leave entry present={}",
                    valaccount.staker,
                    valaccount.pool_id,
                    valaccount.is_leaving,
                    leave.is_some()
                )));
            }
        }

        let indexed_valaddresses = store.prefix_scan(keys::VALADDRESS_PREFIX).len();
        if indexed_valaddresses != valaccounts.len() {
            return Err(broken(format!(
                "{indexed_valaddresses} indexed valaddresses for {} memberships",
                valaccounts.len()
            )));
        }

        for (pool_id, count) in &per_pool {
            let stored = self.pool_staker_count(store, *pool_id)?;
            if stored != *count {
                return Err(broken(format!(
                    "pool {pool_id} counter is {stored}, found {count} members"
                )));
            }
            if *count > MAX_STAKERS_PER_POOL {
                return Err(broken(format!("pool {pool_id} holds {count} members")));
            }
        }
        if store.prefix_scan(keys::POOL_STAKER_COUNT_PREFIX).len() != per_pool.len() {
            return Err(broken("pool counter for a pool without members"));
        }

        for (staker, count) in &per_staker {
            let stored = self.active_pool_count(store, staker)?;
            if stored != *count {
                return Err(broken(format!(
                    "{staker} active counter is {stored}, found {count} memberships"
                )));
            }
        }
        if self.active_stakers(store)?.len() != per_staker.len() {
            return Err(broken("active counter for a staker without memberships"));
        }

        check_queue_bounds(&CommissionQueue::all(store)?, CommissionQueue::state(store)?)?;
        check_queue_bounds(&LeaveQueue::all(store)?, LeaveQueue::state(store)?)?;
        check_queue_bounds(
            &StakeFractionQueue::all(store)?,
            StakeFractionQueue::state(store)?,
        )?;
        for entry in LeaveQueue::all(store)? {
            if !self.is_member(store, entry.pool_id, &entry.staker) {
                return Err(broken(format!(
                    "leave entry {} points at departed member {}",
                    entry.index, entry.staker
                )));
            }
        }
        check_subject_index::<crate::types::CommissionChangeEntry>(store)?;
        check_subject_index::<crate::types::LeavePoolEntry>(store)?;
        check_subject_index::<crate::types::StakeFractionChangeEntry>(store)?;
        Ok(())
    }
}

fn check_queue_bounds<E: QueueEntry>(entries: &[E], state: crate::types::QueueState) -> Result<()> {
    if state.low_index > state.high_index {
        return Err(broken(format!(
            "{} queue low index {} above high index {}",
            E::QUEUE.name(),
            state.low_index,
            state.high_index
        )));
    }
    for entry in entries {
        if entry.index() <= state.low_index || entry.index() > state.high_index {
            return Err(broken(format!(
                "{} entry {} outside ({}, {}]",
                E::QUEUE.name(),
                entry.index(),
                state.low_index,
                state.high_index
            )));
        }
    }
    Ok(())
}

fn check_subject_index<E: QueueEntry>(store: &dyn KvStore) -> Result<()> {
    for entry in DeferredQueue::<E>::all(store)? {
        let indexed = DeferredQueue::<E>::get_by_subject(store, &entry.subject())?;
        if indexed.map(|found| found.index()) != Some(entry.index()) {
            return Err(broken(format!(
                "{} entry {} is not reachable from its subject",
                E::QUEUE.name(),
                entry.index()
            )));
        }
    }
    Ok(())
}

fn broken(message: impl Into<String>) -> StakersError {
    StakersError::corrupted(message)
}
