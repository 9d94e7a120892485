//! In-memory fakes of the collaborating modules

use kyve_core::{
    Address, BankEffects, BondStatus, Coins, Fraction, PoolId, PoolInfo, PoolRegistry, Result,
    StakersError, ValidatorInfo, ValidatorSet,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Account balances with strict overdraft checks
#[derive(Debug, Default)]
pub struct MockBank {
    balances: RwLock<BTreeMap<Address, Coins>>,
}

impl MockBank {
    /// Empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` into `account`
    pub fn fund(&self, account: &Address, amount: &Coins) {
        let mut balances = self.balances.write();
        let balance = balances.entry(account.clone()).or_default();
        *balance = balance.checked_add(amount).unwrap();
    }

    /// Current balance of `account`
    pub fn balance(&self, account: &Address) -> Coins {
        self.balances.read().get(account).cloned().unwrap_or_default()
    }
}

impl BankEffects for MockBank {
    fn transfer(&self, from: &Address, to: &Address, amount: &Coins) -> Result<()> {
        let mut balances = self.balances.write();
        let source = balances.get(from).cloned().unwrap_or_default();
        let remaining = source.checked_sub(amount).ok_or_else(|| {
            StakersError::bank(format!("{from} holds {source}, cannot send {amount}"))
        })?;
        balances.insert(from.clone(), remaining);
        let target = balances.entry(to.clone()).or_default();
        *target = target
            .checked_add(amount)
            .ok_or_else(|| StakersError::bank(format!("balance of {to} overflows")))?;
        Ok(())
    }
}

/// Pool registry backed by a map
#[derive(Debug, Default)]
pub struct MockPoolRegistry {
    pools: RwLock<BTreeMap<PoolId, PoolInfo>>,
}

impl MockPoolRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enabled pool with the given voting power cap
    pub fn add_pool(&self, id: PoolId, max_voting_power: Fraction) {
        self.pools.write().insert(
            id,
            PoolInfo {
                id,
                disabled: false,
                max_voting_power,
            },
        );
    }

    /// Enable or disable a pool
    pub fn set_disabled(&self, id: PoolId, disabled: bool) {
        if let Some(pool) = self.pools.write().get_mut(&id) {
            pool.disabled = disabled;
        }
    }

    /// Change a pool's voting power cap
    pub fn set_max_voting_power(&self, id: PoolId, max_voting_power: Fraction) {
        if let Some(pool) = self.pools.write().get_mut(&id) {
            pool.max_voting_power = max_voting_power;
        }
    }
}

impl PoolRegistry for MockPoolRegistry {
    fn pool(&self, pool_id: PoolId) -> Option<PoolInfo> {
        self.pools.read().get(&pool_id).cloned()
    }
}

/// Recorded validator slash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashRecord {
    /// Slashed validator
    pub validator: Address,
    /// Requested share of bonded tokens
    pub fraction: Fraction,
    /// Burned tokens
    pub burned: u64,
}

/// Recorded reward allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardRecord {
    /// Rewarded validator
    pub validator: Address,
    /// Account that paid
    pub payer: Address,
    /// Allocated coins
    pub amount: Coins,
}

/// Validator set with directly controllable bonding state
#[derive(Debug, Default)]
pub struct MockValidatorSet {
    validators: RwLock<BTreeMap<Address, ValidatorInfo>>,
    slashes: RwLock<Vec<SlashRecord>>,
    rewards: RwLock<Vec<RewardRecord>>,
}

impl MockValidatorSet {
    /// Empty validator set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a bonded validator
    pub fn add_validator(&self, address: &Address, tokens: u64) {
        self.validators.write().insert(
            address.clone(),
            ValidatorInfo {
                address: address.clone(),
                tokens,
                status: BondStatus::Bonded,
            },
        );
    }

    /// Overwrite bonded tokens
    pub fn set_tokens(&self, address: &Address, tokens: u64) {
        if let Some(info) = self.validators.write().get_mut(address) {
            info.tokens = tokens;
        }
    }

    /// Overwrite bonding status
    pub fn set_status(&self, address: &Address, status: BondStatus) {
        if let Some(info) = self.validators.write().get_mut(address) {
            info.status = status;
        }
    }

    /// Slashes applied so far
    pub fn slashes(&self) -> Vec<SlashRecord> {
        self.slashes.read().clone()
    }

    /// Reward allocations so far
    pub fn rewards(&self) -> Vec<RewardRecord> {
        self.rewards.read().clone()
    }
}

impl ValidatorSet for MockValidatorSet {
    fn validator(&self, address: &Address) -> Option<ValidatorInfo> {
        self.validators.read().get(address).cloned()
    }

    fn self_delegate(&self, address: &Address, amount: u64) -> Result<()> {
        let mut validators = self.validators.write();
        let info = validators
            .entry(address.clone())
            .or_insert_with(|| ValidatorInfo {
                address: address.clone(),
                tokens: 0,
                status: BondStatus::Bonded,
            });
        info.tokens = info
            .tokens
            .checked_add(amount)
            .ok_or_else(|| StakersError::validator_set(format!("tokens of {address} overflow")))?;
        Ok(())
    }

    fn slash(&self, address: &Address, fraction: Fraction) -> Result<u64> {
        let mut validators = self.validators.write();
        let info = validators
            .get_mut(address)
            .ok_or_else(|| StakersError::validator_set(format!("no validator {address}")))?;
        let burned = fraction.mul_floor(info.tokens);
        info.tokens -= burned;
        self.slashes.write().push(SlashRecord {
            validator: address.clone(),
            fraction,
            burned,
        });
        Ok(burned)
    }

    fn allocate_rewards(&self, address: &Address, payer: &Address, amount: &Coins) -> Result<()> {
        if self.validator(address).is_none() {
            return Err(StakersError::validator_set(format!("no validator {address}")));
        }
        self.rewards.write().push(RewardRecord {
            validator: address.clone(),
            payer: payer.clone(),
            amount: amount.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_rejects_overdraft() {
        let bank = MockBank::new();
        let alice = Address::from_static("kyve1alice");
        let bob = Address::from_static("kyve1bob");
        bank.fund(&alice, &Coins::native(10));
        assert!(bank.transfer(&alice, &bob, &Coins::native(11)).is_err());
        bank.transfer(&alice, &bob, &Coins::native(4)).unwrap();
        assert_eq!(bank.balance(&alice), Coins::native(6));
        assert_eq!(bank.balance(&bob), Coins::native(4));
    }

    #[test]
    fn test_validator_slash_burns_share() {
        let validators = MockValidatorSet::new();
        let alice = Address::from_static("kyve1alice");
        validators.add_validator(&alice, 1_000);
        let burned = validators.slash(&alice, Fraction::from_percent(10)).unwrap();
        assert_eq!(burned, 100);
        assert_eq!(validators.bonded_stake(&alice), 900);
    }

    #[test]
    fn test_unbonding_validator_has_no_bonded_stake() {
        let validators = MockValidatorSet::new();
        let alice = Address::from_static("kyve1alice");
        validators.add_validator(&alice, 1_000);
        validators.set_status(&alice, BondStatus::Unbonding);
        assert_eq!(validators.bonded_stake(&alice), 0);
        assert!(!validators.is_in_active_set(&alice));
    }
}
