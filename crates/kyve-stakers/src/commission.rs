//! Commission changes and the commission rewards ledger

use crate::keeper::StakersKeeper;
use crate::keys;
use crate::queue::{is_due, DeferredQueue};
use crate::types::CommissionChangeEntry;
use kyve_core::{
    Address, Coins, Context, Fraction, KvStore, PoolId, Result, StakersError, StakersEvent,
};
use tracing::{debug, info, warn};

/// Commission change queue
pub type CommissionQueue = DeferredQueue<CommissionChangeEntry>;

impl StakersKeeper {
    /// Queue a commission change for `staker`, replacing any pending one
    pub fn order_new_commission(
        &self,
        ctx: &mut Context<'_>,
        staker: &Address,
        pool_id: PoolId,
        commission: Fraction,
    ) -> Result<CommissionChangeEntry> {
        let subject = keys::address_segment(staker);
        if let Some(previous) = CommissionQueue::remove_subject(ctx.store_mut(), &subject)? {
            debug!(staker = %staker, index = previous.index, "replacing pending commission change");
        }
        let creation_date = ctx.block_time();
        let entry = CommissionQueue::enqueue(ctx.store_mut(), |index| CommissionChangeEntry {
            index,
            staker: staker.clone(),
            pool_id,
            commission,
            creation_date,
        })?;
        ctx.emit(StakersEvent::CommissionChangeScheduled {
            staker: staker.clone(),
            pool_id,
            commission,
            creation_date,
        });
        Ok(entry)
    }

    /// Pending commission change of `staker`
    pub fn pending_commission_change(
        &self,
        store: &dyn KvStore,
        staker: &Address,
    ) -> Result<Option<CommissionChangeEntry>> {
        CommissionQueue::get_by_subject(store, &keys::address_segment(staker))
    }

    /// Apply every commission change whose delay has passed
    pub fn process_commission_change_queue(&self, ctx: &mut Context<'_>) -> Result<usize> {
        let delay = self.params(ctx.store())?.commission_change_time;
        let now = ctx.block_time();
        CommissionQueue::drain_due(
            ctx,
            |entry| is_due(entry.creation_date, delay, now),
            |ctx, entry| {
                let Some(mut staker) = self.get_staker(ctx.store(), &entry.staker)? else {
                    warn!(staker = %entry.staker, index = entry.index, "commission change for unknown staker skipped");
                    return Ok(());
                };
                staker.commission = entry.commission;
                self.set_staker(ctx.store_mut(), &staker)?;
                ctx.emit(StakersEvent::UpdateCommission {
                    staker: entry.staker.clone(),
                    commission: entry.commission,
                });
                info!(staker = %entry.staker, commission = %entry.commission, "commission updated");
                Ok(())
            },
        )
    }

    /// Pay `amount` of accumulated commission out of the module escrow
    pub fn claim_commission_rewards(
        &self,
        ctx: &mut Context<'_>,
        staker: &Address,
        amount: &Coins,
    ) -> Result<()> {
        let mut record = self.require_staker(ctx.store(), staker)?;
        let remaining = record.commission_rewards.checked_sub(amount).ok_or_else(|| {
            StakersError::NotEnoughRewards {
                requested: amount.to_string(),
                available: record.commission_rewards.to_string(),
            }
        })?;
        record.commission_rewards = remaining;
        self.set_staker(ctx.store_mut(), &record)?;
        self.bank.transfer(self.module_account(), staker, amount)?;
        ctx.emit(StakersEvent::ClaimCommissionRewards {
            staker: staker.clone(),
            amount: amount.clone(),
        });
        info!(staker = %staker, amount = %amount, "commission rewards claimed");
        Ok(())
    }

    /// Credit commission paid by `payer` to `staker`
    ///
    /// The coins move into the module escrow and are added to the staker's
    /// claimable balance.
    pub fn payout_additional_commission_rewards(
        &self,
        ctx: &mut Context<'_>,
        staker: &Address,
        payer: &Address,
        amount: &Coins,
    ) -> Result<()> {
        let mut record = self.require_staker(ctx.store(), staker)?;
        record.commission_rewards = record
            .commission_rewards
            .checked_add(amount)
            .ok_or_else(|| StakersError::corrupted(format!("commission rewards of {staker} overflow")))?;
        self.set_staker(ctx.store_mut(), &record)?;
        self.bank.transfer(payer, self.module_account(), amount)?;
        ctx.emit(StakersEvent::PayoutCommissionRewards {
            staker: staker.clone(),
            amount: amount.clone(),
        });
        debug!(staker = %staker, amount = %amount, "commission rewards credited");
        Ok(())
    }

    /// Hand delegation rewards paid by `payer` to the validator set distribution
    pub fn payout_rewards(
        &self,
        ctx: &mut Context<'_>,
        staker: &Address,
        payer: &Address,
        amount: &Coins,
    ) -> Result<()> {
        self.require_staker(ctx.store(), staker)?;
        if amount.is_zero() {
            return Ok(());
        }
        self.validators.allocate_rewards(staker, payer, amount)?;
        debug!(staker = %staker, amount = %amount, "delegation rewards allocated");
        Ok(())
    }
}
