//! Typed events emitted by stakers state transitions

use crate::coins::Coins;
use crate::fraction::Fraction;
use crate::identifiers::{Address, PoolId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason a staker is slashed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashType {
    /// Upload timeout
    Timeout,
    /// Invalid vote
    Vote,
    /// Invalid upload
    Upload,
}

impl fmt::Display for SlashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Vote => "vote",
            Self::Upload => "upload",
        };
        f.write_str(name)
    }
}

/// Event emitted by the stakers module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StakersEvent {
    /// A staker record was created
    CreateStaker {
        /// Staker address
        staker: Address,
        /// Initial self-delegation
        amount: u64,
        /// Initial commission
        commission: Fraction,
    },
    /// A staker joined a pool
    JoinPool {
        /// Pool identifier
        pool_id: PoolId,
        /// Staker address
        staker: Address,
        /// Protocol-node signing address
        valaddress: Address,
        /// Native amount sent to the valaddress
        amount: u64,
        /// Stake fraction committed to the pool
        stake_fraction: Fraction,
    },
    /// A staker left a pool
    LeavePool {
        /// Pool identifier
        pool_id: PoolId,
        /// Staker address
        staker: Address,
    },
    /// A staker asked to leave a pool
    LeavePoolScheduled {
        /// Pool identifier
        pool_id: PoolId,
        /// Staker address
        staker: Address,
        /// Creation time of the queued request
        creation_date: i64,
    },
    /// A commission change took effect
    UpdateCommission {
        /// Staker address
        staker: Address,
        /// New commission
        commission: Fraction,
    },
    /// A commission change was queued
    CommissionChangeScheduled {
        /// Staker address
        staker: Address,
        /// Pool the request was sent for
        pool_id: PoolId,
        /// Requested commission
        commission: Fraction,
        /// Creation time of the queued request
        creation_date: i64,
    },
    /// A stake fraction change took effect
    UpdateStakeFraction {
        /// Staker address
        staker: Address,
        /// Pool identifier
        pool_id: PoolId,
        /// New stake fraction
        stake_fraction: Fraction,
    },
    /// A stake fraction decrease was queued
    StakeFractionChangeScheduled {
        /// Staker address
        staker: Address,
        /// Pool identifier
        pool_id: PoolId,
        /// Requested stake fraction
        stake_fraction: Fraction,
        /// Creation time of the queued request
        creation_date: i64,
    },
    /// Staker metadata was replaced
    UpdateMetadata {
        /// Staker address
        staker: Address,
        /// Display name
        moniker: String,
        /// Website
        website: String,
        /// Keybase-style identity
        identity: String,
        /// Security contact
        security_contact: String,
        /// Free-form details
        details: String,
    },
    /// Commission rewards were paid out to a staker
    ClaimCommissionRewards {
        /// Staker address
        staker: Address,
        /// Claimed coins
        amount: Coins,
    },
    /// Commission rewards were credited to a staker
    PayoutCommissionRewards {
        /// Staker address
        staker: Address,
        /// Credited coins
        amount: Coins,
    },
    /// A staker was slashed for misbehaviour in a pool
    Slash {
        /// Pool identifier
        pool_id: PoolId,
        /// Staker address
        staker: Address,
        /// Burned amount
        amount: u64,
        /// Reason
        slash_type: SlashType,
    },
}

impl StakersEvent {
    /// Short event name
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateStaker { .. } => "create_staker",
            Self::JoinPool { .. } => "join_pool",
            Self::LeavePool { .. } => "leave_pool",
            Self::LeavePoolScheduled { .. } => "leave_pool_scheduled",
            Self::UpdateCommission { .. } => "update_commission",
            Self::CommissionChangeScheduled { .. } => "commission_change_scheduled",
            Self::UpdateStakeFraction { .. } => "update_stake_fraction",
            Self::StakeFractionChangeScheduled { .. } => "stake_fraction_change_scheduled",
            Self::UpdateMetadata { .. } => "update_metadata",
            Self::ClaimCommissionRewards { .. } => "claim_commission_rewards",
            Self::PayoutCommissionRewards { .. } => "payout_commission_rewards",
            Self::Slash { .. } => "slash",
        }
    }
}

/// Ordered sink for events emitted during one transition
#[derive(Debug, Clone, Default)]
pub struct EventManager {
    events: Vec<StakersEvent>,
}

impl EventManager {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn emit(&mut self, event: StakersEvent) {
        tracing::trace!(kind = event.kind(), "event emitted");
        self.events.push(event);
    }

    /// Events in emission order
    pub fn events(&self) -> &[StakersEvent] {
        &self.events
    }

    /// Take ownership of the recorded events
    pub fn into_events(self) -> Vec<StakersEvent> {
        self.events
    }
}
