//! Ledger transaction hash returned by the signer after broadcast.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 32-byte transaction hash, rendered as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed (or bare) 64-character hex string.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let body = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(body).map_err(|e| TypesError::InvalidHash(format!("{raw}: {e}")))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidHash(format!("{raw}: expected 32 bytes")))?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash(0x{})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for TxHash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TxHash {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TxHash> for String {
    fn from(hash: TxHash) -> Self {
        hash.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parses_back() {
        let hash = TxHash::new([0xab; 32]);
        assert_eq!(TxHash::parse(&hash.to_string()).unwrap(), hash);
    }

    #[test]
    fn rejects_short_hash() {
        assert!(TxHash::parse("0xdeadbeef").is_err());
    }

    #[test]
    fn zero_hash() {
        assert!(TxHash::ZERO.is_zero());
        assert!(!TxHash::new([1; 32]).is_zero());
    }
}
