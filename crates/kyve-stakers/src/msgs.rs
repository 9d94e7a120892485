//! Transaction messages and stateless validation

use crate::types::{
    IDENTITY_LENGTH, MAX_DETAILS_LENGTH, MAX_MONIKER_LENGTH, MAX_SECURITY_CONTACT_LENGTH,
    MAX_WEBSITE_LENGTH,
};
use kyve_core::{Address, Coins, Fraction, PoolId, Result, StakersError};
use serde::{Deserialize, Serialize};

/// Register the sender as a staker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateStaker {
    /// Validator operator address
    pub creator: Address,
    /// Native amount to self-delegate
    pub amount: u64,
    /// Initial commission, the module default when absent
    #[serde(default, with = "kyve_core::fraction::option_commission")]
    pub commission: Option<Fraction>,
}

/// Join a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgJoinPool {
    /// Staker address
    pub creator: Address,
    /// Pool to join
    pub pool_id: PoolId,
    /// Protocol-node signing address
    pub valaddress: Address,
    /// Native amount sent to the valaddress for fees
    pub amount: u64,
    /// Commission the staker wants to run with
    #[serde(with = "kyve_core::fraction::commission")]
    pub commission: Fraction,
    /// Share of bonded stake committed to the pool, all of it when absent
    #[serde(default, with = "kyve_core::fraction::option_stake_fraction")]
    pub stake_fraction: Option<Fraction>,
}

/// Schedule leaving a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLeavePool {
    /// Staker address
    pub creator: Address,
    /// Pool to leave
    pub pool_id: PoolId,
}

/// Schedule a commission change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateCommission {
    /// Staker address
    pub creator: Address,
    /// Pool the request is sent for
    pub pool_id: PoolId,
    /// Requested commission
    #[serde(with = "kyve_core::fraction::commission")]
    pub commission: Fraction,
}

/// Change the stake fraction of a membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateStakeFraction {
    /// Staker address
    pub creator: Address,
    /// Pool of the membership
    pub pool_id: PoolId,
    /// Requested stake fraction
    #[serde(with = "kyve_core::fraction::stake_fraction")]
    pub stake_fraction: Fraction,
}

/// Replace staker metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateMetadata {
    /// Staker address
    pub creator: Address,
    /// Display name
    pub moniker: String,
    /// Website
    pub website: String,
    /// Keybase-style identity
    pub identity: String,
    /// Security contact
    pub security_contact: String,
    /// Free-form details
    pub details: String,
}

/// Withdraw accumulated commission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgClaimCommissionRewards {
    /// Staker address
    pub creator: Address,
    /// Coins to withdraw
    pub amount: Coins,
}

/// Any stakers transaction message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StakersMsg {
    /// See [`MsgCreateStaker`]
    CreateStaker(MsgCreateStaker),
    /// See [`MsgJoinPool`]
    JoinPool(MsgJoinPool),
    /// See [`MsgLeavePool`]
    LeavePool(MsgLeavePool),
    /// See [`MsgUpdateCommission`]
    UpdateCommission(MsgUpdateCommission),
    /// See [`MsgUpdateStakeFraction`]
    UpdateStakeFraction(MsgUpdateStakeFraction),
    /// See [`MsgUpdateMetadata`]
    UpdateMetadata(MsgUpdateMetadata),
    /// See [`MsgClaimCommissionRewards`]
    ClaimCommissionRewards(MsgClaimCommissionRewards),
}

impl StakersMsg {
    /// Sender of the message
    pub fn creator(&self) -> &Address {
        match self {
            Self::CreateStaker(msg) => &msg.creator,
            Self::JoinPool(msg) => &msg.creator,
            Self::LeavePool(msg) => &msg.creator,
            Self::UpdateCommission(msg) => &msg.creator,
            Self::UpdateStakeFraction(msg) => &msg.creator,
            Self::UpdateMetadata(msg) => &msg.creator,
            Self::ClaimCommissionRewards(msg) => &msg.creator,
        }
    }

    /// Short message name
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateStaker(_) => "create_staker",
            Self::JoinPool(_) => "join_pool",
            Self::LeavePool(_) => "leave_pool",
            Self::UpdateCommission(_) => "update_commission",
            Self::UpdateStakeFraction(_) => "update_stake_fraction",
            Self::UpdateMetadata(_) => "update_metadata",
            Self::ClaimCommissionRewards(_) => "claim_commission_rewards",
        }
    }

    /// Checks that need no state
    pub fn validate_basic(&self) -> Result<()> {
        validate_address(self.creator())?;
        match self {
            Self::JoinPool(msg) => {
                validate_address(&msg.valaddress)?;
                if msg.valaddress == msg.creator {
                    return Err(StakersError::ValaddressSameAsStaker {
                        staker: msg.creator.clone(),
                    });
                }
                Ok(())
            }
            Self::UpdateMetadata(msg) => msg.validate_fields(),
            Self::CreateStaker(_)
            | Self::LeavePool(_)
            | Self::UpdateCommission(_)
            | Self::UpdateStakeFraction(_)
            | Self::ClaimCommissionRewards(_) => Ok(()),
        }
    }
}

impl MsgUpdateMetadata {
    fn validate_fields(&self) -> Result<()> {
        for (field, value, max) in [
            ("moniker", &self.moniker, MAX_MONIKER_LENGTH),
            ("website", &self.website, MAX_WEBSITE_LENGTH),
            ("security_contact", &self.security_contact, MAX_SECURITY_CONTACT_LENGTH),
            ("details", &self.details, MAX_DETAILS_LENGTH),
        ] {
            if value.len() > max {
                return Err(StakersError::StringMaxLengthExceeded {
                    field: field.to_string(),
                    max,
                });
            }
        }
        if !self.identity.is_empty()
            && (self.identity.len() != IDENTITY_LENGTH
                || !self.identity.chars().all(|c| c.is_ascii_hexdigit()))
        {
            return Err(StakersError::InvalidIdentity {
                identity: self.identity.clone(),
            });
        }
        Ok(())
    }
}

fn validate_address(address: &Address) -> Result<()> {
    Address::new(address.as_str()).map(|_| ())
}

macro_rules! impl_from_msg {
    ($($msg:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$msg> for StakersMsg {
                fn from(msg: $msg) -> Self {
                    Self::$variant(msg)
                }
            }
        )*
    };
}

impl_from_msg! {
    MsgCreateStaker => CreateStaker,
    MsgJoinPool => JoinPool,
    MsgLeavePool => LeavePool,
    MsgUpdateCommission => UpdateCommission,
    MsgUpdateStakeFraction => UpdateStakeFraction,
    MsgUpdateMetadata => UpdateMetadata,
    MsgClaimCommissionRewards => ClaimCommissionRewards,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn metadata() -> MsgUpdateMetadata {
        MsgUpdateMetadata {
            creator: Address::from_static("kyve1alice"),
            moniker: "Alice".to_string(),
            website: "https://alice.example".to_string(),
            identity: "0123456789abcdef".to_string(),
            security_contact: "sec@alice.example".to_string(),
            details: String::new(),
        }
    }

    #[test]
    fn test_join_pool_rejects_own_address_as_valaddress() {
        let msg = StakersMsg::from(MsgJoinPool {
            creator: Address::from_static("kyve1alice"),
            pool_id: 0,
            valaddress: Address::from_static("kyve1alice"),
            amount: 0,
            commission: Fraction::from_percent(10),
            stake_fraction: None,
        });
        assert_matches!(
            msg.validate_basic(),
            Err(StakersError::ValaddressSameAsStaker { .. })
        );
    }

    #[test]
    fn test_metadata_limits() {
        assert!(StakersMsg::from(metadata()).validate_basic().is_ok());

        let mut long = metadata();
        long.moniker = "m".repeat(MAX_MONIKER_LENGTH + 1);
        assert_matches!(
            StakersMsg::from(long).validate_basic(),
            Err(StakersError::StringMaxLengthExceeded { field, .. }) if field == "moniker"
        );

        let mut bad_identity = metadata();
        bad_identity.identity = "not-hex-identity".to_string();
        assert_matches!(
            StakersMsg::from(bad_identity).validate_basic(),
            Err(StakersError::InvalidIdentity { .. })
        );

        let mut no_identity = metadata();
        no_identity.identity = String::new();
        assert!(StakersMsg::from(no_identity).validate_basic().is_ok());
    }

    #[test]
    fn test_empty_creator_is_rejected() {
        let msg = StakersMsg::from(MsgLeavePool {
            creator: Address::from_static(""),
            pool_id: 0,
        });
        assert_matches!(msg.validate_basic(), Err(StakersError::InvalidAddress { .. }));
        assert_eq!(msg.name(), "leave_pool");
    }

    #[test]
    fn test_msg_json_is_tagged() {
        let msg = StakersMsg::from(MsgUpdateStakeFraction {
            creator: Address::from_static("kyve1alice"),
            pool_id: 1,
            stake_fraction: Fraction::from_percent(50),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "update_stake_fraction");
        assert_eq!(json["stake_fraction"], "0.500000000000000000");
    }
}
