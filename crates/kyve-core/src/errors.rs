//! Error system for the stakers engine
//!
//! Every failure a message handler, an end-block step or a collaborator can
//! produce is a variant of [`StakersError`]. Variants carry the registered
//! module code (`1103..`) so host chains can surface stable ABCI codes, and a
//! coarse [`ErrorCategory`] for logging and client handling.

use crate::identifiers::{Address, PoolId};
use serde::{Deserialize, Serialize};

/// Coarse classification of stakers errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Input failed stateless or stateful validation
    Validation,
    /// A referenced record does not exist
    NotFound,
    /// The operation conflicts with existing state
    Conflict,
    /// The sender may not perform the operation
    Authorization,
    /// Pool capacity or stake admission failure
    Capacity,
    /// Balance or reward accounting failure
    Funds,
    /// Collaborator, storage or encoding failure
    Internal,
}

/// Unified error type for staker and pool membership operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum StakersError {
    /// Joining a full pool with stake not above the lowest member
    #[error("stake too low: minimum effective stake to join is {minimum}")]
    StakeTooLow {
        /// Effective stake of the lowest member that would have been evicted
        minimum: u64,
    },

    /// Staker record does not exist
    #[error("staker {staker} does not exist")]
    NoStaker {
        /// Address that was looked up
        staker: Address,
    },

    /// Staker is already a member of the pool
    #[error("staker {staker} already joined pool {pool_id}")]
    AlreadyJoinedPool {
        /// Staker address
        staker: Address,
        /// Pool identifier
        pool_id: PoolId,
    },

    /// Staker is not a member of the pool it tries to leave
    #[error("staker {staker} already left pool {pool_id}")]
    AlreadyLeftPool {
        /// Staker address
        staker: Address,
        /// Pool identifier
        pool_id: PoolId,
    },

    /// Valaddress is bound to another membership
    #[error("valaddress {valaddress} is already used")]
    ValaddressAlreadyUsed {
        /// Offending valaddress
        valaddress: Address,
    },

    /// Metadata field exceeds its length limit
    #[error("{field} exceeds maximum length of {max} characters")]
    StringMaxLengthExceeded {
        /// Name of the metadata field
        field: String,
        /// Maximum allowed length
        max: usize,
    },

    /// Staker record already exists
    #[error("staker {staker} is already created")]
    StakerAlreadyCreated {
        /// Staker address
        staker: Address,
    },

    /// Valaddress equals the staker address
    #[error("valaddress may not be equal to staker address {staker}")]
    ValaddressSameAsStaker {
        /// Staker address
        staker: Address,
    },

    /// Pool is disabled
    #[error("can not join disabled pool {pool_id}")]
    CanNotJoinDisabledPool {
        /// Pool identifier
        pool_id: PoolId,
    },

    /// Identity field is not a 16 character hex string
    #[error("invalid identity {identity}: expected 16 hex characters")]
    InvalidIdentity {
        /// Rejected identity
        identity: String,
    },

    /// Claim exceeds the accumulated commission rewards
    #[error("not enough commission rewards: requested {requested}, available {available}")]
    NotEnoughRewards {
        /// Requested coins
        requested: String,
        /// Accumulated coins
        available: String,
    },

    /// A leave request for this membership is already queued
    #[error("staker {staker} is already leaving pool {pool_id}")]
    PoolLeaveAlreadyInProgress {
        /// Staker address
        staker: Address,
        /// Pool identifier
        pool_id: PoolId,
    },

    /// The signer is not the valaddress registered for the membership
    #[error("{valaddress} is not authorized for staker {staker} in pool {pool_id}")]
    ValaccountUnauthorized {
        /// Staker address
        staker: Address,
        /// Pool identifier
        pool_id: PoolId,
        /// Signer that claimed the membership
        valaddress: Address,
    },

    /// Validator is not part of the bonded active set
    #[error("validator {staker} is not in the active set")]
    ValidatorNotInActiveSet {
        /// Validator address
        staker: Address,
    },

    /// Membership record does not exist
    #[error("no valaccount for staker {staker} in pool {pool_id}")]
    NoValaccount {
        /// Staker address
        staker: Address,
        /// Pool identifier
        pool_id: PoolId,
    },

    /// A member-only change was requested by a non-member
    #[error("{staker} is not allowed to change pool {pool_id}: no membership")]
    UnauthorizedChange {
        /// Sender address
        staker: Address,
        /// Pool identifier
        pool_id: PoolId,
    },

    /// Commission outside `[0, 1]`
    #[error("invalid commission: {message}")]
    InvalidCommission {
        /// Details
        message: String,
    },

    /// Stake fraction outside `[0, 1]`
    #[error("invalid stake fraction: {message}")]
    InvalidStakeFraction {
        /// Details
        message: String,
    },

    /// Pool is unknown to the pool registry
    #[error("pool {pool_id} does not exist")]
    PoolNotFound {
        /// Pool identifier
        pool_id: PoolId,
    },

    /// Address failed validation
    #[error("invalid address: {message}")]
    InvalidAddress {
        /// Details
        message: String,
    },

    /// Bank collaborator refused a transfer
    #[error("bank error: {message}")]
    Bank {
        /// Details
        message: String,
    },

    /// Validator set collaborator failed
    #[error("validator set error: {message}")]
    ValidatorSet {
        /// Details
        message: String,
    },

    /// Encoding or decoding a stored value failed
    #[error("serialization error: {message}")]
    Serialization {
        /// Details
        message: String,
    },

    /// Parameter or configuration problem
    #[error("config error: {message}")]
    Config {
        /// Details
        message: String,
    },

    /// Stored state violates a structural invariant
    #[error("corrupted state: {message}")]
    Corrupted {
        /// Details
        message: String,
    },
}

impl StakersError {
    /// Registered module error code
    pub fn code(&self) -> u32 {
        match self {
            Self::StakeTooLow { .. } => 1103,
            Self::NoStaker { .. } => 1105,
            Self::AlreadyJoinedPool { .. } => 1106,
            Self::AlreadyLeftPool { .. } => 1107,
            Self::ValaddressAlreadyUsed { .. } => 1108,
            Self::StringMaxLengthExceeded { .. } => 1109,
            Self::StakerAlreadyCreated { .. } => 1110,
            Self::ValaddressSameAsStaker { .. } => 1111,
            Self::CanNotJoinDisabledPool { .. } => 1112,
            Self::InvalidIdentity { .. } => 1113,
            Self::NotEnoughRewards { .. } => 1114,
            Self::PoolLeaveAlreadyInProgress { .. } => 1117,
            Self::ValaccountUnauthorized { .. } => 1118,
            Self::ValidatorNotInActiveSet { .. } => 1119,
            Self::NoValaccount { .. } => 1120,
            Self::UnauthorizedChange { .. } => 1121,
            Self::InvalidCommission { .. } => 1122,
            Self::InvalidStakeFraction { .. } => 1123,
            Self::PoolNotFound { .. } => 1124,
            Self::InvalidAddress { .. } => 1125,
            Self::Bank { .. } => 1126,
            Self::ValidatorSet { .. } => 1127,
            Self::Serialization { .. } => 1128,
            Self::Config { .. } => 1129,
            Self::Corrupted { .. } => 1130,
        }
    }

    /// Error category for logging and client handling
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StringMaxLengthExceeded { .. }
            | Self::ValaddressSameAsStaker { .. }
            | Self::InvalidIdentity { .. }
            | Self::InvalidCommission { .. }
            | Self::InvalidStakeFraction { .. }
            | Self::InvalidAddress { .. }
            | Self::CanNotJoinDisabledPool { .. }
            | Self::ValidatorNotInActiveSet { .. } => ErrorCategory::Validation,
            Self::NoStaker { .. } | Self::NoValaccount { .. } | Self::PoolNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::AlreadyJoinedPool { .. }
            | Self::AlreadyLeftPool { .. }
            | Self::ValaddressAlreadyUsed { .. }
            | Self::StakerAlreadyCreated { .. }
            | Self::PoolLeaveAlreadyInProgress { .. } => ErrorCategory::Conflict,
            Self::ValaccountUnauthorized { .. } | Self::UnauthorizedChange { .. } => {
                ErrorCategory::Authorization
            }
            Self::StakeTooLow { .. } => ErrorCategory::Capacity,
            Self::NotEnoughRewards { .. } => ErrorCategory::Funds,
            Self::Bank { .. }
            | Self::ValidatorSet { .. }
            | Self::Serialization { .. }
            | Self::Config { .. }
            | Self::Corrupted { .. } => ErrorCategory::Internal,
        }
    }

    /// Create a bank error
    pub fn bank(message: impl Into<String>) -> Self {
        Self::Bank {
            message: message.into(),
        }
    }

    /// Create a validator set error
    pub fn validator_set(message: impl Into<String>) -> Self {
        Self::ValidatorSet {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a corrupted state error
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Create an invalid address error
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: message.into(),
        }
    }
}

/// Standard Result type for stakers operations
pub type Result<T> = std::result::Result<T, StakersError>;

impl From<bincode::Error> for StakersError {
    fn from(err: bincode::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for StakersError {
    fn from(err: std::io::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_codes() {
        let err = StakersError::StakeTooLow { minimum: 10 };
        assert_eq!(err.code(), 1103);
        assert_eq!(err.category(), ErrorCategory::Capacity);

        let err = StakersError::NoValaccount {
            staker: Address::from_static("kyve1staker"),
            pool_id: 0,
        };
        assert_eq!(err.code(), 1120);
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_error_display() {
        let err = StakersError::PoolLeaveAlreadyInProgress {
            staker: Address::from_static("kyve1staker"),
            pool_id: 3,
        };
        assert_eq!(err.to_string(), "staker kyve1staker is already leaving pool 3");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "params.toml");
        let err = StakersError::from(io_err);
        assert!(matches!(err, StakersError::Config { .. }));
    }
}
