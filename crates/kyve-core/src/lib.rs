//! # KYVE Core
//!
//! Foundation layer for the KYVE stakers engine: identifiers, fixed-point
//! fractions, coin sets, the ordered key-value store abstraction, the binary
//! codec, module parameters, typed events and the interfaces to collaborating
//! modules (bank, pool registry, validator set).
//!
//! Nothing in this crate knows about pool membership; see `kyve-stakers` for
//! the engine itself.

pub mod codec;
pub mod coins;
pub mod context;
pub mod effects;
pub mod errors;
pub mod events;
pub mod fraction;
pub mod identifiers;
pub mod params;
pub mod store;

pub use coins::{Coins, NATIVE_DENOM};
pub use context::{BlockHeader, Context};
pub use effects::{
    BankEffects, BondStatus, PoolInfo, PoolRegistry, ValidatorInfo, ValidatorSet,
    ValidatorSetObserver,
};
pub use errors::{ErrorCategory, Result, StakersError};
pub use events::{EventManager, SlashType, StakersEvent};
pub use fraction::{Fraction, ParseFractionError, FRACTION_ONE};
pub use identifiers::{Address, PoolId};
pub use params::Params;
pub use store::{CacheStore, KvStore, MemoryStore};
