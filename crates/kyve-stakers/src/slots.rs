//! Pool slot admission
//!
//! Pools hold at most [`MAX_STAKERS_PER_POOL`] members. A join into a full
//! pool succeeds only by displacing the member with the lowest effective
//! stake, and only if the joiner's nominal stake is strictly higher.

use crate::keeper::StakersKeeper;
use crate::types::MAX_STAKERS_PER_POOL;
use kyve_core::{Address, Context, Fraction, KvStore, PoolId, Result, StakersError};
use tracing::info;

impl StakersKeeper {
    /// Free member slots of a pool
    pub fn available_slots(&self, store: &dyn KvStore, pool_id: PoolId) -> Result<u64> {
        Ok(MAX_STAKERS_PER_POOL.saturating_sub(self.pool_staker_count(store, pool_id)?))
    }

    /// Lowest member a joiner with `stake` would displace, if the pool is full
    ///
    /// `Ok(None)` means a slot is free. `StakeTooLow` is returned when the
    /// pool is full and `stake` does not exceed the lowest effective stake.
    pub fn slot_victim(&self, store: &dyn KvStore, pool_id: PoolId, stake: u64) -> Result<Option<Address>> {
        if self.available_slots(store, pool_id)? > 0 {
            return Ok(None);
        }
        let stakes = self.pool_stakes(store, pool_id)?;
        let (lowest, minimum) = stakes
            .lowest()
            .ok_or_else(|| StakersError::corrupted(format!("pool {pool_id} is full without members")))?;
        if stake > minimum {
            Ok(Some(lowest.clone()))
        } else {
            Err(StakersError::StakeTooLow { minimum })
        }
    }

    /// Make room for `staker` joining `pool_id` with `stake_fraction`
    ///
    /// Evicts the lowest member of a full pool through [`leave_pool`], which
    /// emits `LeavePool` for it.
    ///
    /// [`leave_pool`]: StakersKeeper::leave_pool
    pub fn ensure_free_slot(
        &self,
        ctx: &mut Context<'_>,
        pool_id: PoolId,
        staker: &Address,
        stake_fraction: Fraction,
    ) -> Result<()> {
        let stake = stake_fraction.mul_floor(self.validators.bonded_stake(staker));
        if let Some(victim) = self.slot_victim(ctx.store(), pool_id, stake)? {
            info!(pool_id, joiner = %staker, evicted = %victim, stake, "evicting lowest staker");
            self.leave_pool(ctx, &victim, pool_id)?;
        }
        Ok(())
    }
}
