//! Message handlers
//!
//! Each handler runs against a cached [`Context`]; an `Err` from any step
//! discards every write made before it. External effects (bank transfers,
//! self-delegation) are issued after all checks have passed.

use crate::keeper::StakersKeeper;
use crate::msgs::{
    MsgClaimCommissionRewards, MsgCreateStaker, MsgJoinPool, MsgLeavePool, MsgUpdateCommission,
    MsgUpdateMetadata, MsgUpdateStakeFraction, StakersMsg,
};
use crate::types::{default_commission, Staker, StakerMetadata, Valaccount};
use kyve_core::{Coins, Context, Fraction, Result, StakersError, StakersEvent};
use tracing::{debug, info};

impl StakersKeeper {
    /// Validate and execute a message
    pub fn handle(&self, ctx: &mut Context<'_>, msg: StakersMsg) -> Result<()> {
        msg.validate_basic()?;
        debug!(msg = msg.name(), creator = %msg.creator(), "handling message");
        match msg {
            StakersMsg::CreateStaker(msg) => self.create_staker(ctx, msg),
            StakersMsg::JoinPool(msg) => self.join_pool(ctx, msg),
            StakersMsg::LeavePool(msg) => self.request_leave_pool(ctx, msg),
            StakersMsg::UpdateCommission(msg) => self.update_commission(ctx, msg),
            StakersMsg::UpdateStakeFraction(msg) => self.request_stake_fraction_change(ctx, msg),
            StakersMsg::UpdateMetadata(msg) => self.update_metadata(ctx, msg),
            StakersMsg::ClaimCommissionRewards(msg) => self.claim_commission(ctx, msg),
        }
    }

    /// Register a staker, optionally self-delegating
    pub fn create_staker(&self, ctx: &mut Context<'_>, msg: MsgCreateStaker) -> Result<()> {
        if self.does_staker_exist(ctx.store(), &msg.creator) {
            return Err(StakersError::StakerAlreadyCreated {
                staker: msg.creator,
            });
        }
        let commission = msg.commission.unwrap_or_else(default_commission);
        self.set_staker(ctx.store_mut(), &Staker::new(msg.creator.clone(), commission))?;
        if msg.amount > 0 {
            self.validators.self_delegate(&msg.creator, msg.amount)?;
        }
        ctx.emit(StakersEvent::CreateStaker {
            staker: msg.creator.clone(),
            amount: msg.amount,
            commission,
        });
        info!(staker = %msg.creator, amount = msg.amount, commission = %commission, "staker created");
        Ok(())
    }

    /// Admit a staker into a pool
    pub fn join_pool(&self, ctx: &mut Context<'_>, msg: MsgJoinPool) -> Result<()> {
        let pool = self
            .pools
            .pool(msg.pool_id)
            .ok_or(StakersError::PoolNotFound {
                pool_id: msg.pool_id,
            })?;
        if pool.disabled {
            return Err(StakersError::CanNotJoinDisabledPool {
                pool_id: msg.pool_id,
            });
        }

        let staker = self.require_staker(ctx.store(), &msg.creator)?;
        if !self.validators.is_in_active_set(&msg.creator) {
            return Err(StakersError::ValidatorNotInActiveSet {
                staker: msg.creator,
            });
        }
        if msg.valaddress == msg.creator {
            return Err(StakersError::ValaddressSameAsStaker {
                staker: msg.creator,
            });
        }
        if self.is_member(ctx.store(), msg.pool_id, &msg.creator) {
            return Err(StakersError::AlreadyJoinedPool {
                staker: msg.creator,
                pool_id: msg.pool_id,
            });
        }
        if self.valaddress_owner(ctx.store(), &msg.valaddress)?.is_some() {
            return Err(StakersError::ValaddressAlreadyUsed {
                valaddress: msg.valaddress,
            });
        }

        let stake_fraction = msg.stake_fraction.unwrap_or_else(Fraction::one);
        self.ensure_free_slot(ctx, msg.pool_id, &msg.creator, stake_fraction)?;

        self.add_valaccount(
            ctx.store_mut(),
            &Valaccount {
                pool_id: msg.pool_id,
                staker: msg.creator.clone(),
                valaddress: msg.valaddress.clone(),
                stake_fraction,
                points: 0,
                is_leaving: false,
            },
        )?;

        if msg.commission != staker.commission {
            self.order_new_commission(ctx, &msg.creator, msg.pool_id, msg.commission)?;
        }

        if msg.amount > 0 {
            self.bank
                .transfer(&msg.creator, &msg.valaddress, &Coins::native(msg.amount))?;
        }

        ctx.emit(StakersEvent::JoinPool {
            pool_id: msg.pool_id,
            staker: msg.creator.clone(),
            valaddress: msg.valaddress.clone(),
            amount: msg.amount,
            stake_fraction,
        });
        info!(
            pool_id = msg.pool_id,
            staker = %msg.creator,
            valaddress = %msg.valaddress,
            stake_fraction = %stake_fraction,
            "staker joined pool"
        );
        Ok(())
    }

    fn request_leave_pool(&self, ctx: &mut Context<'_>, msg: MsgLeavePool) -> Result<()> {
        self.schedule_leave_pool(ctx, &msg.creator, msg.pool_id)
            .map(|_| ())
    }

    /// Queue a staker-wide commission change
    pub fn update_commission(&self, ctx: &mut Context<'_>, msg: MsgUpdateCommission) -> Result<()> {
        self.require_staker(ctx.store(), &msg.creator)?;
        self.order_new_commission(ctx, &msg.creator, msg.pool_id, msg.commission)
            .map(|_| ())
    }

    fn request_stake_fraction_change(
        &self,
        ctx: &mut Context<'_>,
        msg: MsgUpdateStakeFraction,
    ) -> Result<()> {
        self.update_stake_fraction(ctx, &msg.creator, msg.pool_id, msg.stake_fraction)
            .map(|_| ())
    }

    /// Replace the metadata of a staker
    pub fn update_metadata(&self, ctx: &mut Context<'_>, msg: MsgUpdateMetadata) -> Result<()> {
        let mut staker = self.require_staker(ctx.store(), &msg.creator)?;
        staker.metadata = StakerMetadata {
            moniker: msg.moniker.clone(),
            website: msg.website.clone(),
            identity: msg.identity.clone(),
            security_contact: msg.security_contact.clone(),
            details: msg.details.clone(),
        };
        self.set_staker(ctx.store_mut(), &staker)?;
        ctx.emit(StakersEvent::UpdateMetadata {
            staker: msg.creator,
            moniker: msg.moniker,
            website: msg.website,
            identity: msg.identity,
            security_contact: msg.security_contact,
            details: msg.details,
        });
        Ok(())
    }

    fn claim_commission(&self, ctx: &mut Context<'_>, msg: MsgClaimCommissionRewards) -> Result<()> {
        self.claim_commission_rewards(ctx, &msg.creator, &msg.amount)
    }
}
