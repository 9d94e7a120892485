//! Read-only queries for clients and collaborating modules

use crate::commission::CommissionQueue;
use crate::effective_stake::PoolStakes;
use crate::keeper::StakersKeeper;
use crate::leave::LeaveQueue;
use crate::queue::QueueId;
use crate::stake_fraction::StakeFractionQueue;
use crate::types::{
    CommissionChangeEntry, LeavePoolEntry, QueueState, StakeFractionChangeEntry, Staker,
    Valaccount,
};
use kyve_core::{Address, KvStore, PoolId, Result};
use serde::{Deserialize, Serialize};

/// Staker record together with its memberships and pending changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullStaker {
    /// Staker record
    pub staker: Staker,
    /// Bonded tokens reported by the validator set
    pub bonded_stake: u64,
    /// Memberships in pool order
    pub valaccounts: Vec<Valaccount>,
    /// Pending commission change
    pub pending_commission_change: Option<CommissionChangeEntry>,
}

impl StakersKeeper {
    /// Addresses of all members of a pool
    pub fn get_all_staker_addresses_of_pool(&self, store: &dyn KvStore, pool_id: PoolId) -> Result<Vec<Address>> {
        Ok(self
            .valaccounts_of_pool(store, pool_id)?
            .into_iter()
            .map(|valaccount| valaccount.staker)
            .collect())
    }

    /// Effective stakes of every member of a pool
    pub fn get_validator_pool_stakes(&self, store: &dyn KvStore, pool_id: PoolId) -> Result<PoolStakes> {
        self.pool_stakes(store, pool_id)
    }

    /// Total effective stake of a pool
    pub fn get_delegation_of_pool(&self, store: &dyn KvStore, pool_id: PoolId) -> Result<u64> {
        self.total_stake_of_pool(store, pool_id)
    }

    /// Total and highest effective stake of a pool
    pub fn get_total_and_highest_delegation_of_pool(
        &self,
        store: &dyn KvStore,
        pool_id: PoolId,
    ) -> Result<(u64, u64)> {
        let stakes = self.pool_stakes(store, pool_id)?;
        let highest = stakes.stakes.values().copied().max().unwrap_or(0);
        Ok((stakes.total, highest))
    }

    /// Staker record with memberships and pending commission change
    pub fn get_full_staker(&self, store: &dyn KvStore, address: &Address) -> Result<Option<FullStaker>> {
        let Some(staker) = self.get_staker(store, address)? else {
            return Ok(None);
        };
        Ok(Some(FullStaker {
            bonded_stake: self.validators.bonded_stake(address),
            valaccounts: self.valaccounts_of_staker(store, address)?,
            pending_commission_change: self.pending_commission_change(store, address)?,
            staker,
        }))
    }

    /// Cursor pair of a queue
    pub fn get_queue_state(&self, store: &dyn KvStore, queue: QueueId) -> Result<QueueState> {
        match queue {
            QueueId::Commission => CommissionQueue::state(store),
            QueueId::Leave => LeaveQueue::state(store),
            QueueId::StakeFraction => StakeFractionQueue::state(store),
        }
    }

    /// Every pending commission change in index order
    pub fn get_all_commission_change_entries(&self, store: &dyn KvStore) -> Result<Vec<CommissionChangeEntry>> {
        CommissionQueue::all(store)
    }

    /// Every pending leave in index order
    pub fn get_all_leave_pool_entries(&self, store: &dyn KvStore) -> Result<Vec<LeavePoolEntry>> {
        LeaveQueue::all(store)
    }

    /// Every pending stake fraction decrease in index order
    pub fn get_all_stake_fraction_change_entries(
        &self,
        store: &dyn KvStore,
    ) -> Result<Vec<StakeFractionChangeEntry>> {
        StakeFractionQueue::all(store)
    }
}
