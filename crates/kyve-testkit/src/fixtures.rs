//! Deterministic addresses and message builders

use kyve_core::{Address, Fraction, PoolId};
use kyve_stakers::{MsgCreateStaker, MsgJoinPool, MsgLeavePool, MsgUpdateStakeFraction};

/// Staker address number `n`
pub fn staker(n: u32) -> Address {
    Address::new(format!("kyve1staker{n:03}")).unwrap()
}

/// Valaddress number `n`
pub fn valaddress(n: u32) -> Address {
    Address::new(format!("kyve1valaddress{n:03}")).unwrap()
}

/// Funding account used as reward payer
pub fn payer() -> Address {
    Address::from_static("kyve1payer")
}

/// CreateStaker with the default commission and no self-delegation
pub fn create_staker(n: u32) -> MsgCreateStaker {
    MsgCreateStaker {
        creator: staker(n),
        amount: 0,
        commission: None,
    }
}

/// JoinPool builder
#[derive(Debug, Clone)]
pub struct JoinPoolBuilder {
    msg: MsgJoinPool,
}

impl JoinPoolBuilder {
    /// Staker `n` joining `pool_id` with valaddress `n` and full stake
    pub fn new(n: u32, pool_id: PoolId) -> Self {
        Self {
            msg: MsgJoinPool {
                creator: staker(n),
                pool_id,
                valaddress: valaddress(n),
                amount: 0,
                commission: kyve_stakers::types::default_commission(),
                stake_fraction: None,
            },
        }
    }

    /// Use a different valaddress
    pub fn valaddress(mut self, valaddress: Address) -> Self {
        self.msg.valaddress = valaddress;
        self
    }

    /// Fund the valaddress with `amount`
    pub fn amount(mut self, amount: u64) -> Self {
        self.msg.amount = amount;
        self
    }

    /// Request a commission
    pub fn commission(mut self, commission: Fraction) -> Self {
        self.msg.commission = commission;
        self
    }

    /// Commit only `stake_fraction` of bonded stake
    pub fn stake_fraction(mut self, stake_fraction: Fraction) -> Self {
        self.msg.stake_fraction = Some(stake_fraction);
        self
    }

    /// Finished message
    pub fn build(self) -> MsgJoinPool {
        self.msg
    }
}

/// LeavePool for staker `n`
pub fn leave_pool(n: u32, pool_id: PoolId) -> MsgLeavePool {
    MsgLeavePool {
        creator: staker(n),
        pool_id,
    }
}

/// UpdateStakeFraction for staker `n`
pub fn update_stake_fraction(n: u32, pool_id: PoolId, stake_fraction: Fraction) -> MsgUpdateStakeFraction {
    MsgUpdateStakeFraction {
        creator: staker(n),
        pool_id,
        stake_fraction,
    }
}
