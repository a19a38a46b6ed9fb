//! Role resolution for a connected identity.

use std::sync::Arc;
use votechain_registry::{Registry, RegistryError};
use votechain_types::{Address, Role, VoterRecord};

/// A resolved role, with the voter record when it was read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleResolution {
    pub role: Role,
    /// `None` when the identity is an admin (the voter query is skipped).
    pub voter: Option<VoterRecord>,
}

/// Derives an identity's [`Role`] from the registry.
///
/// The admin check runs first; an admin never triggers the voter query.
#[derive(Clone)]
pub struct RoleResolver {
    registry: Arc<dyn Registry>,
}

impl RoleResolver {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    /// Resolve, collapsing any read failure to [`Role::Unregistered`].
    ///
    /// The result is advisory. It never grants Admin on failure.
    pub async fn resolve(&self, identity: &Address) -> Role {
        self.resolve_with_record(identity).await.role
    }

    /// Like [`resolve`](Self::resolve), keeping the voter record that was read.
    pub async fn resolve_with_record(&self, identity: &Address) -> RoleResolution {
        match self.try_resolve(identity).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!(%identity, error = %e, "role lookup failed, treating as unregistered");
                RoleResolution {
                    role: Role::Unregistered,
                    voter: None,
                }
            }
        }
    }

    /// Resolve, surfacing read failures.
    ///
    /// Used where an action's precondition must not pass on a failed read.
    pub async fn try_resolve(&self, identity: &Address) -> Result<RoleResolution, RegistryError> {
        if self.registry.is_admin(identity).await? {
            tracing::debug!(%identity, "resolved admin");
            return Ok(RoleResolution {
                role: Role::Admin,
                voter: None,
            });
        }
        let record = self.registry.voter(identity).await?;
        let role = if record.is_registered {
            Role::Voter
        } else {
            Role::Unregistered
        };
        tracing::debug!(%identity, %role, "resolved role");
        Ok(RoleResolution {
            role,
            voter: Some(record),
        })
    }
}
