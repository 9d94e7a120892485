//! Multi-denomination coin amounts

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Native staking denomination
pub const NATIVE_DENOM: &str = "ukyve";

/// A set of coin amounts keyed by denomination
///
/// Zero amounts are never stored, so two equal sets always compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Coins(BTreeMap<String, u128>);

impl<'de> Deserialize<'de> for Coins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(BTreeMap::<String, u128>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}

impl Coins {
    /// Empty coin set
    pub fn new() -> Self {
        Self::default()
    }

    /// Single coin of `denom`
    pub fn coin(denom: impl Into<String>, amount: u128) -> Self {
        let mut coins = Self::new();
        coins.insert(denom.into(), amount);
        coins
    }

    /// Single coin of the native denomination
    pub fn native(amount: u64) -> Self {
        Self::coin(NATIVE_DENOM, u128::from(amount))
    }

    fn insert(&mut self, denom: String, amount: u128) {
        if amount == 0 {
            self.0.remove(&denom);
        } else {
            self.0.insert(denom, amount);
        }
    }

    /// Amount held of `denom`
    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0.get(denom).copied().unwrap_or(0)
    }

    /// Whether every amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(denom, amount)` pairs in denomination order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u128)> {
        self.0.iter().map(|(denom, amount)| (denom.as_str(), *amount))
    }

    /// `self + other`, `None` on overflow
    pub fn checked_add(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.clone();
        for (denom, amount) in other.iter() {
            let sum = out.amount_of(denom).checked_add(amount)?;
            out.insert(denom.to_string(), sum);
        }
        Some(out)
    }

    /// `self - other`, `None` if any denomination would go negative
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.clone();
        for (denom, amount) in other.iter() {
            let diff = out.amount_of(denom).checked_sub(amount)?;
            out.insert(denom.to_string(), diff);
        }
        Some(out)
    }

    /// Whether `self` holds at least `other` in every denomination
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other
            .iter()
            .all(|(denom, amount)| self.amount_of(denom) >= amount)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .iter()
            .map(|(denom, amount)| format!("{amount}{denom}"))
            .collect();
        f.write_str(&rendered.join(","))
    }
}

impl FromIterator<(String, u128)> for Coins {
    fn from_iter<I: IntoIterator<Item = (String, u128)>>(iter: I) -> Self {
        let mut coins = Coins::new();
        for (denom, amount) in iter {
            let total = coins.amount_of(&denom).saturating_add(amount);
            coins.insert(denom, total);
        }
        coins
    }
}
