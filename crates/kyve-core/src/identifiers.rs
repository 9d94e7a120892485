//! Account and pool identifiers

use crate::errors::{Result, StakersError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier of a storage pool
pub type PoolId = u64;

/// Maximum encoded length of an address
pub const MAX_ADDRESS_LENGTH: usize = 255;

/// Bech32-style account address
///
/// The engine never interprets the human-readable part; it only requires a
/// non-empty string without whitespace that fits a one-byte length prefix in
/// composite store keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create a validated address
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(StakersError::invalid_address("address is empty"));
        }
        if value.len() > MAX_ADDRESS_LENGTH {
            return Err(StakersError::invalid_address(format!(
                "address {value} exceeds {MAX_ADDRESS_LENGTH} bytes"
            )));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(StakersError::invalid_address(format!(
                "address {value:?} contains whitespace"
            )));
        }
        Ok(Self(value))
    }

    /// Address from a literal known to be well formed
    pub fn from_static(value: &'static str) -> Self {
        Self(value.to_string())
    }

    /// Escrow account owned by a module
    pub fn module(name: &str) -> Self {
        Self(format!("module/{name}"))
    }

    /// Borrow the address string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes used in store keys
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Rebuild an address from key bytes
    pub fn from_key_bytes(bytes: &[u8]) -> Result<Self> {
        let value = std::str::from_utf8(bytes)
            .map_err(|e| StakersError::corrupted(format!("address key is not utf-8: {e}")))?;
        Self::new(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = StakersError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        assert!(Address::new("kyve1abc").is_ok());
        assert!(Address::new("").is_err());
        assert!(Address::new("kyve 1abc").is_err());
        assert!(Address::new("k".repeat(MAX_ADDRESS_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_module_account() {
        assert_eq!(Address::module("stakers").as_str(), "module/stakers");
    }
}
