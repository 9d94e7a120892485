//! Stakers keeper
//!
//! The keeper owns no state itself. It holds handles to the collaborating
//! modules and implements every read and transition over a caller-supplied
//! store or [`Context`](kyve_core::Context). Operations are spread over the
//! sibling modules (`staker`, `valaccount`, `commission`, ...) as further
//! `impl StakersKeeper` blocks.

use crate::keys;
use kyve_core::store::{get_value, set_value};
use kyve_core::{Address, BankEffects, KvStore, Params, PoolRegistry, Result, ValidatorSet};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Name of the module escrow account
pub const MODULE_NAME: &str = "stakers";

/// Entry point for stakers state reads and transitions
#[derive(Clone)]
pub struct StakersKeeper {
    pub(crate) bank: Arc<dyn BankEffects>,
    pub(crate) pools: Arc<dyn PoolRegistry>,
    pub(crate) validators: Arc<dyn ValidatorSet>,
    module_account: Address,
}

impl StakersKeeper {
    /// Keeper over the given collaborators
    pub fn new(
        bank: Arc<dyn BankEffects>,
        pools: Arc<dyn PoolRegistry>,
        validators: Arc<dyn ValidatorSet>,
    ) -> Self {
        Self {
            bank,
            pools,
            validators,
            module_account: Address::module(MODULE_NAME),
        }
    }

    /// Escrow account holding unclaimed commission
    pub fn module_account(&self) -> &Address {
        &self.module_account
    }

    /// Validator set handle
    pub fn validators(&self) -> &Arc<dyn ValidatorSet> {
        &self.validators
    }

    /// Pool registry handle
    pub fn pools(&self) -> &Arc<dyn PoolRegistry> {
        &self.pools
    }

    /// Stored params, defaults if none were ever written
    pub fn params(&self, store: &dyn KvStore) -> Result<Params> {
        Ok(get_value(store, keys::PARAMS_KEY)?.unwrap_or_default())
    }

    /// Validate and store params
    pub fn set_params(&self, store: &mut dyn KvStore, params: &Params) -> Result<()> {
        params.validate()?;
        set_value(store, keys::PARAMS_KEY, params)?;
        info!(
            commission_change_time = params.commission_change_time,
            leave_pool_time = params.leave_pool_time,
            stake_fraction_change_time = params.stake_fraction_change_time,
            "stakers params updated"
        );
        Ok(())
    }
}

impl fmt::Debug for StakersKeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StakersKeeper")
            .field("module_account", &self.module_account)
            .finish_non_exhaustive()
    }
}
