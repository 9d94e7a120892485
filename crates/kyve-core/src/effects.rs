//! Interfaces to collaborating modules
//!
//! The stakers engine does not own balances, pools or validators. It reaches
//! them through these traits, which the host chain implements and the testkit
//! fakes. All methods take `&self`; implementations that mutate state use
//! interior mutability.

use crate::coins::Coins;
use crate::context::Context;
use crate::errors::Result;
use crate::fraction::Fraction;
use crate::identifiers::{Address, PoolId};
use serde::{Deserialize, Serialize};

/// Token transfers between accounts
pub trait BankEffects: Send + Sync {
    /// Move `amount` from `from` to `to`
    fn transfer(&self, from: &Address, to: &Address, amount: &Coins) -> Result<()>;
}

/// Pool attributes the stakers engine depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    /// Pool identifier
    pub id: PoolId,
    /// Disabled pools accept no new members
    pub disabled: bool,
    /// Maximum share of total effective stake any single member may hold
    pub max_voting_power: Fraction,
}

/// Read access to the pool registry
pub trait PoolRegistry: Send + Sync {
    /// Pool attributes, `None` if the pool does not exist
    fn pool(&self, pool_id: PoolId) -> Option<PoolInfo>;

    /// Voting power cap of a pool, zero for unknown pools
    fn max_voting_power(&self, pool_id: PoolId) -> Fraction {
        self.pool(pool_id)
            .map(|pool| pool.max_voting_power)
            .unwrap_or_default()
    }
}

/// Bonding state of a validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondStatus {
    /// In the active set
    Bonded,
    /// Leaving the active set
    Unbonding,
    /// Outside the active set
    Unbonded,
}

/// Validator attributes the stakers engine depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    /// Operator address, identical to the staker address
    pub address: Address,
    /// Bonded tokens
    pub tokens: u64,
    /// Bonding state
    pub status: BondStatus,
}

/// The chain's validator set
pub trait ValidatorSet: Send + Sync {
    /// Validator attributes, `None` if no validator exists for `address`
    fn validator(&self, address: &Address) -> Option<ValidatorInfo>;

    /// Bonded tokens of a validator, zero if it is not bonded
    fn bonded_stake(&self, address: &Address) -> u64 {
        match self.validator(address) {
            Some(info) if info.status == BondStatus::Bonded => info.tokens,
            _ => 0,
        }
    }

    /// Whether the validator is in the bonded active set
    fn is_in_active_set(&self, address: &Address) -> bool {
        self.validator(address)
            .is_some_and(|info| info.status == BondStatus::Bonded)
    }

    /// Self-delegate `amount` native tokens
    fn self_delegate(&self, address: &Address, amount: u64) -> Result<()>;

    /// Slash `fraction` of the validator's bonded tokens, returning the burned amount
    fn slash(&self, address: &Address, fraction: Fraction) -> Result<u64>;

    /// Distribute rewards paid by `payer` to the validator and its delegators
    fn allocate_rewards(&self, address: &Address, payer: &Address, amount: &Coins) -> Result<()>;
}

/// Hooks the validator set invokes on membership changes
pub trait ValidatorSetObserver {
    /// The validator started unbonding or was removed from the active set
    fn on_validator_removed_from_active_set(
        &self,
        ctx: &mut Context<'_>,
        validator: &Address,
    ) -> Result<()>;

    /// The validator was slashed by the consensus layer
    fn on_validator_slashed(&self, ctx: &mut Context<'_>, validator: &Address) -> Result<()>;
}
