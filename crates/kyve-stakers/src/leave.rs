//! Scheduled pool leaves

use crate::keeper::StakersKeeper;
use crate::keys;
use crate::queue::{is_due, DeferredQueue};
use crate::types::LeavePoolEntry;
use kyve_core::{Address, Context, KvStore, PoolId, Result, StakersError, StakersEvent};
use tracing::{info, warn};

/// Pool leave queue
pub type LeaveQueue = DeferredQueue<LeavePoolEntry>;

impl StakersKeeper {
    /// Mark a membership as leaving and queue its removal
    pub fn schedule_leave_pool(
        &self,
        ctx: &mut Context<'_>,
        staker: &Address,
        pool_id: PoolId,
    ) -> Result<LeavePoolEntry> {
        let Some(mut valaccount) = self.get_valaccount(ctx.store(), pool_id, staker)? else {
            return Err(StakersError::AlreadyLeftPool {
                staker: staker.clone(),
                pool_id,
            });
        };
        let subject = keys::membership_subject(staker, pool_id);
        if valaccount.is_leaving || LeaveQueue::contains_subject(ctx.store(), &subject) {
            return Err(StakersError::PoolLeaveAlreadyInProgress {
                staker: staker.clone(),
                pool_id,
            });
        }

        valaccount.is_leaving = true;
        self.set_valaccount(ctx.store_mut(), &valaccount)?;
        let creation_date = ctx.block_time();
        let entry = LeaveQueue::enqueue(ctx.store_mut(), |index| LeavePoolEntry {
            index,
            staker: staker.clone(),
            pool_id,
            creation_date,
        })?;
        ctx.emit(StakersEvent::LeavePoolScheduled {
            pool_id,
            staker: staker.clone(),
            creation_date,
        });
        info!(
            staker = %staker,
            pool_id,
            index = entry.index,
            height = ctx.block_height(),
            "pool leave scheduled"
        );
        Ok(entry)
    }

    /// Pending leave of a membership
    pub fn pending_leave(
        &self,
        store: &dyn KvStore,
        staker: &Address,
        pool_id: PoolId,
    ) -> Result<Option<LeavePoolEntry>> {
        LeaveQueue::get_by_subject(store, &keys::membership_subject(staker, pool_id))
    }

    /// Remove every member whose leave delay has passed
    pub fn process_leave_pool_queue(&self, ctx: &mut Context<'_>) -> Result<usize> {
        let delay = self.params(ctx.store())?.leave_pool_time;
        let now = ctx.block_time();
        LeaveQueue::drain_due(
            ctx,
            |entry| is_due(entry.creation_date, delay, now),
            |ctx, entry| {
                if !self.is_member(ctx.store(), entry.pool_id, &entry.staker) {
                    warn!(staker = %entry.staker, pool_id = entry.pool_id, "leave for departed member skipped");
                    return Ok(());
                }
                self.leave_pool(ctx, &entry.staker, entry.pool_id)
            },
        )
    }
}
