//! Stake fraction changes
//!
//! Raising the share of stake committed to a pool only adds security and is
//! applied at once. Lowering it is queued for `stake_fraction_change_time`, so
//! a member cannot shed exposure right before a slash.

use crate::keeper::StakersKeeper;
use crate::keys;
use crate::queue::{is_due, DeferredQueue};
use crate::types::StakeFractionChangeEntry;
use kyve_core::{Address, Context, Fraction, KvStore, PoolId, Result, StakersError, StakersEvent};
use tracing::{debug, info, warn};

/// Stake fraction decrease queue
pub type StakeFractionQueue = DeferredQueue<StakeFractionChangeEntry>;

impl StakersKeeper {
    /// Change the stake fraction of a membership
    ///
    /// Any pending decrease is discarded first. Returns the queued entry when
    /// the change is a decrease, `None` when it was applied directly.
    pub fn update_stake_fraction(
        &self,
        ctx: &mut Context<'_>,
        staker: &Address,
        pool_id: PoolId,
        stake_fraction: Fraction,
    ) -> Result<Option<StakeFractionChangeEntry>> {
        let Some(mut valaccount) = self.get_valaccount(ctx.store(), pool_id, staker)? else {
            return Err(StakersError::UnauthorizedChange {
                staker: staker.clone(),
                pool_id,
            });
        };

        let subject = keys::membership_subject(staker, pool_id);
        if let Some(previous) = StakeFractionQueue::remove_subject(ctx.store_mut(), &subject)? {
            debug!(staker = %staker, pool_id, index = previous.index, "discarding pending stake fraction change");
        }

        if stake_fraction < valaccount.stake_fraction {
            let creation_date = ctx.block_time();
            let entry = StakeFractionQueue::enqueue(ctx.store_mut(), |index| {
                StakeFractionChangeEntry {
                    index,
                    staker: staker.clone(),
                    pool_id,
                    stake_fraction,
                    creation_date,
                }
            })?;
            ctx.emit(StakersEvent::StakeFractionChangeScheduled {
                staker: staker.clone(),
                pool_id,
                stake_fraction,
                creation_date,
            });
            return Ok(Some(entry));
        }

        valaccount.stake_fraction = stake_fraction;
        self.set_valaccount(ctx.store_mut(), &valaccount)?;
        ctx.emit(StakersEvent::UpdateStakeFraction {
            staker: staker.clone(),
            pool_id,
            stake_fraction,
        });
        info!(staker = %staker, pool_id, stake_fraction = %stake_fraction, "stake fraction raised");
        Ok(None)
    }

    /// Pending stake fraction decrease of a membership
    pub fn pending_stake_fraction_change(
        &self,
        store: &dyn KvStore,
        staker: &Address,
        pool_id: PoolId,
    ) -> Result<Option<StakeFractionChangeEntry>> {
        StakeFractionQueue::get_by_subject(store, &keys::membership_subject(staker, pool_id))
    }

    /// Apply every stake fraction decrease whose delay has passed
    pub fn process_stake_fraction_change_queue(&self, ctx: &mut Context<'_>) -> Result<usize> {
        let delay = self.params(ctx.store())?.stake_fraction_change_time;
        let now = ctx.block_time();
        StakeFractionQueue::drain_due(
            ctx,
            |entry| is_due(entry.creation_date, delay, now),
            |ctx, entry| {
                let Some(mut valaccount) =
                    self.get_valaccount(ctx.store(), entry.pool_id, &entry.staker)?
                else {
                    warn!(staker = %entry.staker, pool_id = entry.pool_id, "stake fraction change for departed member skipped");
                    return Ok(());
                };
                valaccount.stake_fraction = entry.stake_fraction;
                self.set_valaccount(ctx.store_mut(), &valaccount)?;
                ctx.emit(StakersEvent::UpdateStakeFraction {
                    staker: entry.staker.clone(),
                    pool_id: entry.pool_id,
                    stake_fraction: entry.stake_fraction,
                });
                info!(staker = %entry.staker, pool_id = entry.pool_id, stake_fraction = %entry.stake_fraction, "stake fraction lowered");
                Ok(())
            },
        )
    }
}
