//! Binary encoding for stored values
//!
//! Store values use bincode with its default fixed-width little-endian
//! configuration. Keys are built separately in big-endian form so that ordered
//! scans follow numeric order.

use crate::errors::{Result, StakersError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value for storage
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value)
        .map_err(|e| StakersError::serialization(format!("failed to encode value: {e}")))
}

/// Decode a stored value
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| StakersError::serialization(format!("failed to decode value: {e}")))
}

/// Render bytes for log output
pub fn display_key(key: &[u8]) -> String {
    hex::encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraction::Fraction;

    #[test]
    fn test_fraction_survives_encoding() {
        let bytes = to_vec(&Fraction::from_percent(35)).unwrap();
        let back: Fraction = from_slice(&bytes).unwrap();
        assert_eq!(back, Fraction::from_percent(35));
    }

    #[test]
    fn test_truncated_bytes_fail() {
        let bytes = to_vec(&(7u64, 9u64)).unwrap();
        let result: Result<(u64, u64)> = from_slice(&bytes[..4]);
        assert!(matches!(result, Err(StakersError::Serialization { .. })));
    }

    #[test]
    fn test_display_key() {
        assert_eq!(display_key(&[0x02, 0x00, 0xff]), "0200ff");
    }
}
