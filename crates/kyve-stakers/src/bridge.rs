//! Validator set bridge
//!
//! Reacts to validator set changes and turns pool-level misbehaviour into
//! validator-level slashes. A staker that stops being an active validator is
//! removed from every pool it serves, and so is a staker slashed by the
//! consensus layer.

use crate::keeper::StakersKeeper;
use kyve_core::{
    Address, Context, Fraction, PoolId, Result, SlashType, StakersEvent, ValidatorSetObserver,
};
use tracing::{info, warn};

impl StakersKeeper {
    /// Remove `staker` from every pool, returning the pools it left
    pub fn evict_from_all_pools(&self, ctx: &mut Context<'_>, staker: &Address) -> Result<Vec<PoolId>> {
        let pools: Vec<PoolId> = self
            .valaccounts_of_staker(ctx.store(), staker)?
            .into_iter()
            .map(|valaccount| valaccount.pool_id)
            .collect();
        for pool_id in &pools {
            self.leave_pool(ctx, staker, *pool_id)?;
        }
        if !pools.is_empty() {
            info!(staker = %staker, pools = pools.len(), "staker evicted from all pools");
        }
        Ok(pools)
    }

    /// Slash a member for misbehaviour in `pool_id` at the params rate of `slash_type`
    pub fn slash(
        &self,
        ctx: &mut Context<'_>,
        pool_id: PoolId,
        staker: &Address,
        slash_type: SlashType,
    ) -> Result<u64> {
        let params = self.params(ctx.store())?;
        let slash_fraction = match slash_type {
            SlashType::Timeout => params.timeout_slash,
            SlashType::Vote => params.vote_slash,
            SlashType::Upload => params.upload_slash,
        };
        self.slash_with_fraction(ctx, pool_id, staker, slash_fraction, slash_type)
    }

    /// Slash `slash_fraction` of a member's effective stake in `pool_id`
    ///
    /// The slashed amount is `floor(effective_stake * slash_fraction)`, applied
    /// to the validator as the equivalent share of its bonded tokens. Returns
    /// the amount burned by the validator set.
    pub fn slash_with_fraction(
        &self,
        ctx: &mut Context<'_>,
        pool_id: PoolId,
        staker: &Address,
        slash_fraction: Fraction,
        slash_type: SlashType,
    ) -> Result<u64> {
        self.require_valaccount(ctx.store(), pool_id, staker)?;
        let effective = self.stake_in_pool(ctx.store(), pool_id, staker)?;
        let amount = slash_fraction.mul_floor(effective);
        let bonded = self.validators.bonded_stake(staker);
        if amount == 0 || bonded == 0 {
            warn!(staker = %staker, pool_id, %slash_type, effective, "slash amount is zero");
            return Ok(0);
        }

        let share = Fraction::from_rational(amount, bonded);
        let burned = self.validators.slash(staker, share)?;
        ctx.emit(StakersEvent::Slash {
            pool_id,
            staker: staker.clone(),
            amount: burned,
            slash_type,
        });
        info!(staker = %staker, pool_id, %slash_type, burned, "staker slashed");
        Ok(burned)
    }
}

impl ValidatorSetObserver for StakersKeeper {
    fn on_validator_removed_from_active_set(
        &self,
        ctx: &mut Context<'_>,
        validator: &Address,
    ) -> Result<()> {
        self.evict_from_all_pools(ctx, validator).map(|_| ())
    }

    fn on_validator_slashed(&self, ctx: &mut Context<'_>, validator: &Address) -> Result<()> {
        self.evict_from_all_pools(ctx, validator).map(|_| ())
    }
}
