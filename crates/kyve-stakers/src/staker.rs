//! Staker records and the active-staker counter

use crate::keeper::StakersKeeper;
use crate::keys;
use crate::types::Staker;
use kyve_core::store::{get_value, scan_values, set_value};
use kyve_core::{Address, KvStore, Result, StakersError};

impl StakersKeeper {
    /// Staker record of `address`
    pub fn get_staker(&self, store: &dyn KvStore, address: &Address) -> Result<Option<Staker>> {
        get_value(store, &keys::staker_key(address))
    }

    /// Staker record of `address`, `NoStaker` if absent
    pub fn require_staker(&self, store: &dyn KvStore, address: &Address) -> Result<Staker> {
        self.get_staker(store, address)?
            .ok_or_else(|| StakersError::NoStaker {
                staker: address.clone(),
            })
    }

    /// Whether a staker record exists
    pub fn does_staker_exist(&self, store: &dyn KvStore, address: &Address) -> bool {
        store.has(&keys::staker_key(address))
    }

    pub(crate) fn set_staker(&self, store: &mut dyn KvStore, staker: &Staker) -> Result<()> {
        set_value(store, &keys::staker_key(&staker.address), staker)
    }

    /// Every staker record in address key order
    pub fn all_stakers(&self, store: &dyn KvStore) -> Result<Vec<Staker>> {
        scan_values(store, keys::STAKER_PREFIX)
    }

    /// Number of pools `address` is a member of
    pub fn active_pool_count(&self, store: &dyn KvStore, address: &Address) -> Result<u64> {
        Ok(get_value(store, &keys::active_staker_key(address))?.unwrap_or(0))
    }

    /// Stakers that are a member of at least one pool
    pub fn active_stakers(&self, store: &dyn KvStore) -> Result<Vec<Address>> {
        store
            .prefix_scan(keys::ACTIVE_STAKER_PREFIX)
            .into_iter()
            .map(|(key, _)| {
                let segment = key.get(keys::ACTIVE_STAKER_PREFIX.len() + 1..).ok_or_else(|| {
                    StakersError::corrupted("active staker key without address")
                })?;
                Address::from_key_bytes(segment)
            })
            .collect()
    }

    pub(crate) fn increment_active_staker(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
    ) -> Result<()> {
        let count = self.active_pool_count(store, address)?;
        set_value(store, &keys::active_staker_key(address), &(count + 1))
    }

    pub(crate) fn decrement_active_staker(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
    ) -> Result<()> {
        let key = keys::active_staker_key(address);
        match self.active_pool_count(store, address)? {
            0 => Err(StakersError::corrupted(format!(
                "active pool counter of {address} would underflow"
            ))),
            1 => {
                store.delete(&key);
                Ok(())
            }
            count => set_value(store, &key, &(count - 1)),
        }
    }

    /// Sum of bonded tokens over all stakers that are a member of any pool
    pub fn total_bonded_tokens(&self, store: &dyn KvStore) -> Result<u128> {
        Ok(self
            .active_stakers(store)?
            .iter()
            .map(|address| u128::from(self.validators.bonded_stake(address)))
            .sum())
    }
}
