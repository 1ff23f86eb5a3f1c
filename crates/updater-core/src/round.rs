//! Beacon round records.

use alloy::primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Round number as published by the beacon and stored by the oracle.
///
/// Zero means "never updated" for the oracle cursor.
pub type RoundNumber = u64;

/// One beacon publication.
///
/// Produced by either the backfill or the live feed path, moved through the
/// single-slot queue and consumed exactly once by the round processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Beacon round number.
    pub round: RoundNumber,
    /// Round randomness (sha256 of the signature).
    pub randomness: B256,
    /// Beacon threshold signature, forwarded opaquely for on-chain verification.
    pub signature: Bytes,
}

impl RoundRecord {
    /// Create a new round record.
    pub fn new(round: RoundNumber, randomness: B256, signature: impl Into<Bytes>) -> Self {
        Self {
            round,
            randomness,
            signature: signature.into(),
        }
    }

    /// Build a record from raw byte slices, checking the randomness length.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidRandomness` if `randomness` is not 32 bytes.
    pub fn from_parts(round: RoundNumber, randomness: &[u8], signature: &[u8]) -> Result<Self> {
        if randomness.len() != 32 {
            return Err(CoreError::InvalidRandomness(randomness.len()));
        }
        Ok(Self {
            round,
            randomness: B256::from_slice(randomness),
            signature: Bytes::copy_from_slice(signature),
        })
    }
}

impl std::fmt::Display for RoundRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "round {} ({})", self.round, self.randomness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_accepts_32_byte_randomness() {
        let record = RoundRecord::from_parts(7, &[0xab; 32], &[1, 2, 3]).unwrap();
        assert_eq!(record.round, 7);
        assert_eq!(record.randomness, B256::repeat_byte(0xab));
        assert_eq!(record.signature.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_from_parts_rejects_short_randomness() {
        let result = RoundRecord::from_parts(7, &[0xab; 31], &[]);
        assert!(matches!(result, Err(CoreError::InvalidRandomness(31))));
    }

    #[test]
    fn test_display_includes_round() {
        let record = RoundRecord::new(42, B256::ZERO, vec![0u8; 4]);
        assert!(record.to_string().starts_with("round 42"));
    }
}
