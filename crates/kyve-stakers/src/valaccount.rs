//! Pool membership registry
//!
//! A [`Valaccount`] binds a staker to a pool through a valaddress. Three
//! indexes are kept in step with the primary `pool | staker` table: the
//! `staker | pool` index for per-staker iteration, the global valaddress index
//! for uniqueness checks, and the per-pool member counter.

use crate::keeper::StakersKeeper;
use crate::keys;
use crate::queue::DeferredQueue;
use crate::types::{LeavePoolEntry, StakeFractionChangeEntry, Valaccount};
use kyve_core::store::{get_value, scan_values, set_value};
use kyve_core::{Address, Context, KvStore, PoolId, Result, StakersError, StakersEvent};
use tracing::{debug, info};

impl StakersKeeper {
    /// Membership of `staker` in `pool_id`
    pub fn get_valaccount(
        &self,
        store: &dyn KvStore,
        pool_id: PoolId,
        staker: &Address,
    ) -> Result<Option<Valaccount>> {
        get_value(store, &keys::valaccount_key(pool_id, staker))
    }

    /// Membership of `staker` in `pool_id`, `NoValaccount` if absent
    pub fn require_valaccount(
        &self,
        store: &dyn KvStore,
        pool_id: PoolId,
        staker: &Address,
    ) -> Result<Valaccount> {
        self.get_valaccount(store, pool_id, staker)?
            .ok_or_else(|| StakersError::NoValaccount {
                staker: staker.clone(),
                pool_id,
            })
    }

    /// Whether `staker` is a member of `pool_id`
    pub fn is_member(&self, store: &dyn KvStore, pool_id: PoolId, staker: &Address) -> bool {
        store.has(&keys::valaccount_key(pool_id, staker))
    }

    pub(crate) fn set_valaccount(&self, store: &mut dyn KvStore, valaccount: &Valaccount) -> Result<()> {
        set_value(
            store,
            &keys::valaccount_key(valaccount.pool_id, &valaccount.staker),
            valaccount,
        )
    }

    /// Members of a pool in staker key order
    pub fn valaccounts_of_pool(&self, store: &dyn KvStore, pool_id: PoolId) -> Result<Vec<Valaccount>> {
        scan_values(store, &keys::valaccount_pool_prefix(pool_id))
    }

    /// Memberships of a staker in pool order
    pub fn valaccounts_of_staker(
        &self,
        store: &dyn KvStore,
        staker: &Address,
    ) -> Result<Vec<Valaccount>> {
        let mut valaccounts = Vec::new();
        for (key, _) in store.prefix_scan(&keys::valaccount_by_staker_prefix(staker)) {
            let pool_id = keys::pool_from_index_key(&key)?;
            let valaccount = self.get_valaccount(store, pool_id, staker)?.ok_or_else(|| {
                StakersError::corrupted(format!(
                    "staker index of {staker} points at missing membership in pool {pool_id}"
                ))
            })?;
            valaccounts.push(valaccount);
        }
        Ok(valaccounts)
    }

    /// Every membership in pool order
    pub fn all_valaccounts(&self, store: &dyn KvStore) -> Result<Vec<Valaccount>> {
        scan_values(store, keys::VALACCOUNT_PREFIX)
    }

    /// Owner of a valaddress as `(staker, pool)`
    pub fn valaddress_owner(
        &self,
        store: &dyn KvStore,
        valaddress: &Address,
    ) -> Result<Option<(Address, PoolId)>> {
        get_value(store, &keys::valaddress_key(valaddress))
    }

    /// Number of members of a pool
    pub fn pool_staker_count(&self, store: &dyn KvStore, pool_id: PoolId) -> Result<u64> {
        Ok(get_value(store, &keys::pool_staker_count_key(pool_id))?.unwrap_or(0))
    }

    fn set_pool_staker_count(&self, store: &mut dyn KvStore, pool_id: PoolId, count: u64) -> Result<()> {
        let key = keys::pool_staker_count_key(pool_id);
        if count == 0 {
            store.delete(&key);
            Ok(())
        } else {
            set_value(store, &key, &count)
        }
    }

    /// Insert a new membership and all its indexes
    pub(crate) fn add_valaccount(&self, store: &mut dyn KvStore, valaccount: &Valaccount) -> Result<()> {
        self.set_valaccount(store, valaccount)?;
        store.set(
            &keys::valaccount_by_staker_key(&valaccount.staker, valaccount.pool_id),
            Vec::new(),
        );
        set_value(
            store,
            &keys::valaddress_key(&valaccount.valaddress),
            &(valaccount.staker.clone(), valaccount.pool_id),
        )?;
        let count = self.pool_staker_count(store, valaccount.pool_id)?;
        self.set_pool_staker_count(store, valaccount.pool_id, count + 1)?;
        self.increment_active_staker(store, &valaccount.staker)?;
        debug!(
            pool_id = valaccount.pool_id,
            staker = %valaccount.staker,
            valaddress = %valaccount.valaddress,
            "valaccount added"
        );
        Ok(())
    }

    /// Delete a membership, its indexes and its pending per-membership changes
    fn remove_valaccount(&self, store: &mut dyn KvStore, valaccount: &Valaccount) -> Result<()> {
        store.delete(&keys::valaccount_key(valaccount.pool_id, &valaccount.staker));
        store.delete(&keys::valaccount_by_staker_key(
            &valaccount.staker,
            valaccount.pool_id,
        ));
        store.delete(&keys::valaddress_key(&valaccount.valaddress));

        let count = self.pool_staker_count(store, valaccount.pool_id)?;
        let count = count.checked_sub(1).ok_or_else(|| {
            StakersError::corrupted(format!(
                "member counter of pool {} would underflow",
                valaccount.pool_id
            ))
        })?;
        self.set_pool_staker_count(store, valaccount.pool_id, count)?;
        self.decrement_active_staker(store, &valaccount.staker)?;

        let subject = keys::membership_subject(&valaccount.staker, valaccount.pool_id);
        DeferredQueue::<LeavePoolEntry>::remove_subject(store, &subject)?;
        DeferredQueue::<StakeFractionChangeEntry>::remove_subject(store, &subject)?;
        Ok(())
    }

    /// Remove `staker` from `pool_id` immediately
    ///
    /// Used for queued leaves that became due, slot eviction, validator set
    /// removal and forced exits requested by the bundle module. Emits
    /// `LeavePool`.
    pub fn leave_pool(&self, ctx: &mut Context<'_>, staker: &Address, pool_id: PoolId) -> Result<()> {
        let valaccount = self.require_valaccount(ctx.store(), pool_id, staker)?;
        self.remove_valaccount(ctx.store_mut(), &valaccount)?;
        ctx.emit(StakersEvent::LeavePool {
            pool_id,
            staker: staker.clone(),
        });
        info!(pool_id, staker = %staker, "staker left pool");
        Ok(())
    }

    /// Fail unless `valaddress` is the registered signer of `staker` in `pool_id`
    pub fn assert_valaccount_authorized(
        &self,
        store: &dyn KvStore,
        pool_id: PoolId,
        staker: &Address,
        valaddress: &Address,
    ) -> Result<()> {
        let valaccount = self.require_valaccount(store, pool_id, staker)?;
        if &valaccount.valaddress != valaddress {
            return Err(StakersError::ValaccountUnauthorized {
                staker: staker.clone(),
                pool_id,
                valaddress: valaddress.clone(),
            });
        }
        Ok(())
    }

    /// Add one missed-participation point, returning the new total
    ///
    /// Non-members have no points and yield zero.
    pub fn increment_points(&self, store: &mut dyn KvStore, pool_id: PoolId, staker: &Address) -> Result<u64> {
        let Some(mut valaccount) = self.get_valaccount(store, pool_id, staker)? else {
            return Ok(0);
        };
        valaccount.points = valaccount.points.saturating_add(1);
        self.set_valaccount(store, &valaccount)?;
        Ok(valaccount.points)
    }

    /// Clear missed-participation points, returning the previous value
    pub fn reset_points(&self, store: &mut dyn KvStore, pool_id: PoolId, staker: &Address) -> Result<u64> {
        let Some(mut valaccount) = self.get_valaccount(store, pool_id, staker)? else {
            return Ok(0);
        };
        let previous = valaccount.points;
        if previous > 0 {
            valaccount.points = 0;
            self.set_valaccount(store, &valaccount)?;
        }
        Ok(previous)
    }
}
