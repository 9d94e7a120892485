//! 18-decimal fixed-point fractions in `[0, 1]`
//!
//! Commission rates, stake fractions, slash fractions and the per-pool voting
//! power cap are all expressed as [`Fraction`]. The value is backed by
//! [`Perquintill`], so it has exactly 18 decimal digits of precision and every
//! multiplication against an integer amount rounds down.
//!
//! The textual form is a decimal string such as `"0.35"` or
//! `"0.100000000000000000"`. Serde uses the same representation so params
//! files and JSON events stay human readable.
//!
//! Parsing reports a neutral [`ParseFractionError`]. Message fields that carry
//! a commission or a stake fraction go through the [`commission`] and
//! [`stake_fraction`] serde adapters so a bad value surfaces as
//! `InvalidCommission` or `InvalidStakeFraction` respectively.

use crate::errors::{Result, StakersError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sp_arithmetic::helpers_128bit::multiply_by_rational_with_rounding;
use sp_arithmetic::per_things::Rounding;
use sp_arithmetic::{PerThing, Perquintill};
use std::fmt;
use std::str::FromStr;

/// Number of decimal digits carried by a [`Fraction`]
pub const FRACTION_DECIMALS: usize = 18;

/// Raw parts representing `1.0`
pub const FRACTION_ONE: u64 = 1_000_000_000_000_000_000;

/// Decimal string that is not a fraction in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{input:?}: {reason}")]
pub struct ParseFractionError {
    input: String,
    reason: &'static str,
}

/// A fixed-point value in `[0, 1]` with 18 decimals
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fraction(Perquintill);

impl Fraction {
    /// `0.0`
    pub fn zero() -> Self {
        Self(Perquintill::zero())
    }

    /// `1.0`
    pub fn one() -> Self {
        Self(Perquintill::one())
    }

    /// Build from raw parts per `10^18`, saturating at one
    pub fn from_parts(parts: u64) -> Self {
        Self(Perquintill::from_parts(parts))
    }

    /// Build from a whole percentage
    pub fn from_percent(percent: u64) -> Self {
        Self(Perquintill::from_percent(percent))
    }

    /// `numerator / denominator` rounded down, saturating at one
    ///
    /// A zero denominator yields zero.
    pub fn from_rational(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            return Self::zero();
        }
        let parts = multiply_by_rational_with_rounding(
            u128::from(numerator),
            u128::from(FRACTION_ONE),
            u128::from(denominator),
            Rounding::Down,
        )
        .unwrap_or(u128::from(FRACTION_ONE))
        .min(u128::from(FRACTION_ONE));
        Self::from_parts(parts as u64)
    }

    /// Raw parts per `10^18`
    pub fn parts(self) -> u64 {
        self.0.deconstruct()
    }

    /// Whether the value is exactly zero
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Whether the value is exactly one
    pub fn is_one(self) -> bool {
        self.parts() == FRACTION_ONE
    }

    /// `floor(amount * self)`
    pub fn mul_floor(self, amount: u64) -> u64 {
        self.0.mul_floor(amount)
    }

    /// `floor(amount * self)` for wide amounts
    pub fn mul_floor_u128(self, amount: u128) -> u128 {
        multiply_by_rational_with_rounding(
            amount,
            u128::from(self.parts()),
            u128::from(FRACTION_ONE),
            Rounding::Down,
        )
        .unwrap_or(amount)
    }

    /// Parse a commission rate, `InvalidCommission` on failure
    pub fn parse_commission(s: &str) -> Result<Self> {
        s.parse().map_err(|e: ParseFractionError| StakersError::InvalidCommission {
            message: e.to_string(),
        })
    }

    /// Parse a stake fraction, `InvalidStakeFraction` on failure
    pub fn parse_stake_fraction(s: &str) -> Result<Self> {
        s.parse().map_err(|e: ParseFractionError| StakersError::InvalidStakeFraction {
            message: e.to_string(),
        })
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.parts();
        write!(
            f,
            "{}.{:0width$}",
            parts / FRACTION_ONE,
            parts % FRACTION_ONE,
            width = FRACTION_DECIMALS
        )
    }
}

impl fmt::Debug for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fraction({self})")
    }
}

impl FromStr for Fraction {
    type Err = ParseFractionError;

    fn from_str(s: &str) -> std::result::Result<Self, ParseFractionError> {
        let invalid = |reason: &'static str| ParseFractionError {
            input: s.to_string(),
            reason,
        };
        let trimmed = s.trim();
        let (whole, decimals) = match trimmed.split_once('.') {
            Some((whole, decimals)) => (whole, decimals),
            None => (trimmed, ""),
        };
        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number"));
        }
        if !decimals.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number"));
        }
        if decimals.len() > FRACTION_DECIMALS {
            return Err(invalid("more than 18 decimal places"));
        }
        let whole: u64 = whole.parse().map_err(|_| invalid("integer part overflows"))?;
        let mut fractional: u64 = 0;
        if !decimals.is_empty() {
            fractional = decimals
                .parse::<u64>()
                .map_err(|_| invalid("fractional part overflows"))?
                * 10u64.pow((FRACTION_DECIMALS - decimals.len()) as u32);
        }
        match whole {
            0 => Ok(Self::from_parts(fractional)),
            1 if fractional == 0 => Ok(Self::one()),
            _ => Err(invalid("value must lie in [0, 1]")),
        }
    }
}

impl Serialize for Fraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

macro_rules! fraction_field {
    ($name:ident, $option:ident, $parse:path, $what:literal) => {
        #[doc = concat!("Serde adapter for a ", $what, " field")]
        pub mod $name {
            use super::Fraction;
            use serde::{Deserialize, Deserializer, Serialize, Serializer};

            /// Serialize as the decimal string
            pub fn serialize<S: Serializer>(
                value: &Fraction,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                value.serialize(serializer)
            }

            /// Parse the decimal string
            pub fn deserialize<'de, D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Fraction, D::Error> {
                let raw = String::deserialize(deserializer)?;
                $parse(&raw).map_err(serde::de::Error::custom)
            }
        }

        #[doc = concat!("Serde adapter for an optional ", $what, " field")]
        pub mod $option {
            use super::Fraction;
            use serde::{Deserialize, Deserializer, Serialize, Serializer};

            /// Serialize as the decimal string or null
            pub fn serialize<S: Serializer>(
                value: &Option<Fraction>,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                value.serialize(serializer)
            }

            /// Parse the decimal string, null as `None`
            pub fn deserialize<'de, D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Option<Fraction>, D::Error> {
                Option::<String>::deserialize(deserializer)?
                    .map(|raw| $parse(&raw))
                    .transpose()
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

fraction_field!(commission, option_commission, Fraction::parse_commission, "commission");
fraction_field!(
    stake_fraction,
    option_stake_fraction,
    Fraction::parse_stake_fraction,
    "stake fraction"
);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_display() {
        let f: Fraction = "0.35".parse().unwrap();
        assert_eq!(f.parts(), 350_000_000_000_000_000);
        assert_eq!(f.to_string(), "0.350000000000000000");
        assert_eq!("1".parse::<Fraction>().unwrap(), Fraction::one());
        assert_eq!("1.000".parse::<Fraction>().unwrap(), Fraction::one());
        assert_eq!("0".parse::<Fraction>().unwrap(), Fraction::zero());
        assert_eq!(Fraction::one().to_string(), "1.000000000000000000");
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!("1.01".parse::<Fraction>().is_err());
        assert!("2".parse::<Fraction>().is_err());
        assert!("-0.1".parse::<Fraction>().is_err());
        assert!("0.1234567890123456789".parse::<Fraction>().is_err());
        assert!("abc".parse::<Fraction>().is_err());
        assert!(".5".parse::<Fraction>().is_err());
    }

    #[test]
    fn test_parse_maps_to_field_error() {
        assert!(matches!(
            Fraction::parse_commission("1.5"),
            Err(StakersError::InvalidCommission { .. })
        ));
        assert!(matches!(
            Fraction::parse_stake_fraction("1.5"),
            Err(StakersError::InvalidStakeFraction { .. })
        ));
        assert_eq!(Fraction::parse_commission("0.2").unwrap(), Fraction::from_percent(20));
        let err = "1.5".parse::<Fraction>().unwrap_err();
        assert_eq!(err.to_string(), "\"1.5\": value must lie in [0, 1]");
    }

    #[test]
    fn test_mul_floor_rounds_down() {
        let f = Fraction::from_percent(35);
        assert_eq!(f.mul_floor(1_000), 350);
        assert_eq!(Fraction::from_parts(FRACTION_ONE / 3).mul_floor(10), 3);
        assert_eq!(Fraction::one().mul_floor(u64::MAX), u64::MAX);
        assert_eq!(Fraction::zero().mul_floor(1_000), 0);
    }

    #[test]
    fn test_from_rational() {
        assert_eq!(Fraction::from_rational(1, 4), Fraction::from_percent(25));
        assert_eq!(Fraction::from_rational(5, 4), Fraction::one());
        assert_eq!(Fraction::from_rational(5, 0), Fraction::zero());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Fraction::from_percent(10)).unwrap();
        assert_eq!(json, "\"0.100000000000000000\"");
        let back: Fraction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Fraction::from_percent(10));
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(parts in 0u64..=FRACTION_ONE) {
            let f = Fraction::from_parts(parts);
            prop_assert_eq!(f.to_string().parse::<Fraction>().unwrap(), f);
        }

        #[test]
        fn prop_mul_floor_never_exceeds_amount(parts in 0u64..=FRACTION_ONE, amount in any::<u64>()) {
            prop_assert!(Fraction::from_parts(parts).mul_floor(amount) <= amount);
        }
    }
}
