//! # KYVE Stakers
//!
//! Staker registry and pool membership engine for KYVE storage pools.
//!
//! Chain validators register as stakers, join pools through a dedicated
//! valaddress and commit a fraction of their bonded stake to each pool. The
//! engine caps every member's voting power per pool, evicts the weakest member
//! when a full pool receives a stronger applicant, and routes commission,
//! stake fraction decreases and pool leaves through delayed queues drained at
//! the end of every block.
//!
//! ## Layout
//!
//! - [`keeper`]: the [`StakersKeeper`] and module params
//! - [`queue`]: the generic deferred change queue
//! - [`effective_stake`]: voting power capping
//! - [`msg_server`] / [`msgs`]: transaction handling
//! - [`module`]: the block-driven runtime
//!
//! Memberships, slot admission, commission, stake fraction, leave and
//! validator set handling are further `impl StakersKeeper` blocks in their own
//! modules.

pub mod bridge;
pub mod commission;
pub mod effective_stake;
pub mod invariants;
pub mod keeper;
pub mod keys;
pub mod leave;
pub mod module;
pub mod msg_server;
pub mod msgs;
pub mod query;
pub mod queue;
pub mod slots;
pub mod stake_fraction;
pub mod staker;
pub mod types;
pub mod valaccount;

pub use effective_stake::{compute_effective_stakes, PoolStakes};
pub use keeper::StakersKeeper;
pub use module::{MsgResponse, StakersModule};
pub use msgs::{
    MsgClaimCommissionRewards, MsgCreateStaker, MsgJoinPool, MsgLeavePool, MsgUpdateCommission,
    MsgUpdateMetadata, MsgUpdateStakeFraction, StakersMsg,
};
pub use query::FullStaker;
pub use queue::{DeferredQueue, QueueEntry, QueueId};
pub use types::{
    CommissionChangeEntry, LeavePoolEntry, QueueState, StakeFractionChangeEntry, Staker,
    StakerMetadata, Valaccount, MAX_STAKERS_PER_POOL,
};
