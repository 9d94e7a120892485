//! Module parameters
//!
//! Governance-controlled settings of the stakers module. Parameters are stored
//! in the module store, can be loaded from a TOML file at genesis and are
//! validated before every write.

use crate::errors::{Result, StakersError};
use crate::fraction::Fraction;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default delay for every deferred change, five days
pub const DEFAULT_QUEUE_DELAY_SECONDS: u64 = 5 * 24 * 60 * 60;

/// Stakers module parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// Delay in seconds before a commission change is applied
    pub commission_change_time: u64,
    /// Delay in seconds before a pool leave is applied
    pub leave_pool_time: u64,
    /// Delay in seconds before a stake fraction decrease is applied
    pub stake_fraction_change_time: u64,
    /// Fraction of effective stake slashed for an invalid vote
    pub vote_slash: Fraction,
    /// Fraction of effective stake slashed for an invalid upload
    pub upload_slash: Fraction,
    /// Fraction of effective stake slashed for an upload timeout
    pub timeout_slash: Fraction,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            commission_change_time: DEFAULT_QUEUE_DELAY_SECONDS,
            leave_pool_time: DEFAULT_QUEUE_DELAY_SECONDS,
            stake_fraction_change_time: DEFAULT_QUEUE_DELAY_SECONDS,
            vote_slash: Fraction::from_percent(1),
            upload_slash: Fraction::from_percent(2),
            timeout_slash: Fraction::from_parts(2_000_000_000_000_000),
        }
    }
}

impl Params {
    /// Check ranges that the type system does not enforce
    pub fn validate(&self) -> Result<()> {
        for (name, delay) in [
            ("commission_change_time", self.commission_change_time),
            ("leave_pool_time", self.leave_pool_time),
            ("stake_fraction_change_time", self.stake_fraction_change_time),
        ] {
            if delay > i64::MAX as u64 {
                return Err(StakersError::config(format!(
                    "{name} of {delay} seconds does not fit a block time"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate params from TOML
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let params: Params = toml::from_str(input)
            .map_err(|e| StakersError::config(format!("invalid params TOML: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    /// Load params from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StakersError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Render params as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| StakersError::config(format!("failed to render params: {e}")))
    }

    /// Set a single parameter from its textual value
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        let seconds = |value: &str| {
            value
                .parse::<u64>()
                .map_err(|e| StakersError::config(format!("{key}: {e}")))
        };
        let fraction = |value: &str| {
            value
                .parse::<Fraction>()
                .map_err(|e| StakersError::config(format!("{key}: {e}")))
        };
        match key {
            "commission_change_time" => self.commission_change_time = seconds(value)?,
            "leave_pool_time" => self.leave_pool_time = seconds(value)?,
            "stake_fraction_change_time" => self.stake_fraction_change_time = seconds(value)?,
            "vote_slash" => self.vote_slash = fraction(value)?,
            "upload_slash" => self.upload_slash = fraction(value)?,
            "timeout_slash" => self.timeout_slash = fraction(value)?,
            other => {
                return Err(StakersError::config(format!("unknown parameter {other}")));
            }
        }
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let params = Params::default();
        assert_eq!(params.leave_pool_time, 432_000);
        assert_eq!(params.vote_slash.to_string(), "0.010000000000000000");
        assert_eq!(params.upload_slash.to_string(), "0.020000000000000000");
        assert_eq!(params.timeout_slash.to_string(), "0.002000000000000000");
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let params = Params::from_toml_str("leave_pool_time = 60\nvote_slash = \"0.5\"\n").unwrap();
        assert_eq!(params.leave_pool_time, 60);
        assert_eq!(params.vote_slash, Fraction::from_percent(50));
        assert_eq!(params.commission_change_time, DEFAULT_QUEUE_DELAY_SECONDS);
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(Params::from_toml_str("vote_slash = \"1.5\"").is_err());
        assert!(Params::from_toml_str("unknown_field = 1").is_err());
        assert!(Params::from_toml_str("leave_pool_time = 18446744073709551615").is_err());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let mut params = Params::default();
        params.stake_fraction_change_time = 10;
        let rendered = params.to_toml_string().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(rendered.as_bytes()).unwrap();
        let loaded = Params::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn test_set_from_string() {
        let mut params = Params::default();
        params.set_from_string("timeout_slash", "0.1").unwrap();
        assert_eq!(params.timeout_slash, Fraction::from_percent(10));
        assert!(params.set_from_string("leave_pool_time", "soon").is_err());
        assert!(params.set_from_string("nope", "1").is_err());
    }
}
