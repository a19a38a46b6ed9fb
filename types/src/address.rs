//! Wallet identity type: a `0x`-prefixed, 20-byte hex account address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A connected wallet's account address.
///
/// Addresses are normalised to lowercase so that the same account always maps
/// to the same key, regardless of the checksum casing the wallet reports.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The standard prefix for all account addresses.
    pub const PREFIX: &'static str = "0x";

    /// Number of bytes encoded by an address.
    pub const BYTE_LEN: usize = 20;

    /// Parse and validate a raw address string.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix(Self::PREFIX)
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidAddress(format!("missing 0x prefix: {raw}")))?;

        if body.len() != Self::BYTE_LEN * 2 {
            return Err(TypesError::InvalidAddress(format!(
                "expected {} hex characters, got {}",
                Self::BYTE_LEN * 2,
                body.len()
            )));
        }
        hex::decode(body)
            .map_err(|e| TypesError::InvalidAddress(format!("{raw}: {e}")))?;

        Ok(Self(format!("{}{}", Self::PREFIX, body.to_ascii_lowercase())))
    }

    /// Return the normalised address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
