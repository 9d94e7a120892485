//! Stored records of the stakers module

use kyve_core::{Address, Coins, Fraction, PoolId};
use serde::{Deserialize, Serialize};

/// Maximum number of members per pool
pub const MAX_STAKERS_PER_POOL: u64 = 50;

/// Commission a staker starts with when none is given
pub fn default_commission() -> Fraction {
    Fraction::from_percent(10)
}

/// Length limits of staker metadata fields
pub const MAX_MONIKER_LENGTH: usize = 255;
/// Maximum website length
pub const MAX_WEBSITE_LENGTH: usize = 255;
/// Maximum security contact length
pub const MAX_SECURITY_CONTACT_LENGTH: usize = 255;
/// Maximum details length
pub const MAX_DETAILS_LENGTH: usize = 255;
/// Identity is empty or exactly this many hex characters
pub const IDENTITY_LENGTH: usize = 16;

/// Descriptive metadata of a staker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerMetadata {
    /// Display name
    pub moniker: String,
    /// Website
    pub website: String,
    /// Keybase-style 16 hex character identity
    pub identity: String,
    /// Security contact
    pub security_contact: String,
    /// Free-form details
    pub details: String,
}

/// Protocol-specific extension of a chain validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staker {
    /// Validator operator address
    pub address: Address,
    /// Share of pool rewards retained before delegators are paid
    pub commission: Fraction,
    /// Accumulated unclaimed commission
    pub commission_rewards: Coins,
    /// Descriptive metadata
    pub metadata: StakerMetadata,
}

impl Staker {
    /// Fresh staker with no rewards and empty metadata
    pub fn new(address: Address, commission: Fraction) -> Self {
        Self {
            address,
            commission,
            commission_rewards: Coins::new(),
            metadata: StakerMetadata::default(),
        }
    }
}

/// Membership of one staker in one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valaccount {
    /// Pool identifier
    pub pool_id: PoolId,
    /// Staker address
    pub staker: Address,
    /// Key the protocol node signs with
    pub valaddress: Address,
    /// Share of the staker's bonded stake committed to the pool
    pub stake_fraction: Fraction,
    /// Consecutive missed-participation counter
    pub points: u64,
    /// A leave request is queued
    pub is_leaving: bool,
}

/// Cursor pair of a deferred queue
///
/// Live entries sit at indices in `(low_index, high_index]`; the next enqueue
/// uses `high_index + 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    /// Index of the last resolved entry
    pub low_index: u64,
    /// Index of the last assigned entry
    pub high_index: u64,
}

/// Queued commission change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionChangeEntry {
    /// Queue index
    pub index: u64,
    /// Staker address
    pub staker: Address,
    /// Pool the request was sent for
    pub pool_id: PoolId,
    /// Requested commission
    pub commission: Fraction,
    /// Block time the request was made
    pub creation_date: i64,
}

/// Queued pool leave
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePoolEntry {
    /// Queue index
    pub index: u64,
    /// Staker address
    pub staker: Address,
    /// Pool identifier
    pub pool_id: PoolId,
    /// Block time the request was made
    pub creation_date: i64,
}

/// Queued stake fraction decrease
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeFractionChangeEntry {
    /// Queue index
    pub index: u64,
    /// Staker address
    pub staker: Address,
    /// Pool identifier
    pub pool_id: PoolId,
    /// Requested stake fraction
    pub stake_fraction: Fraction,
    /// Block time the request was made
    pub creation_date: i64,
}
