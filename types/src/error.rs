//! Errors raised while constructing domain values.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction hash: {0}")]
    InvalidHash(String),

    #[error("invalid voting period: start {start} must be before end {end}")]
    InvalidPeriod { start: u64, end: u64 },
}
