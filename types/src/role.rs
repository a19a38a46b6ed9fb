//! The role a connected identity plays in the election.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived role of a connected identity.
///
/// Never stored: it is recomputed from the registry whenever the identity or
/// the registry state changes. Admin takes precedence over Voter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May manage candidates and the voting period.
    Admin,
    /// Registered and allowed to cast a single vote.
    Voter,
    /// Connected but neither admin nor registered voter.
    Unregistered,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn is_voter(&self) -> bool {
        matches!(self, Self::Voter)
    }

    /// Whether this identity may submit a voter registration.
    pub fn can_register(&self) -> bool {
        matches!(self, Self::Unregistered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Voter => "voter",
            Self::Unregistered => "unregistered",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
