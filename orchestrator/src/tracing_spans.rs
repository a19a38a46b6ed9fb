//! Pre-built [`tracing::Span`] constructors for common client operations.
//!
//! Consistent span names and field sets make it easy to follow a single
//! user action from precondition checks through confirmation.

use tracing::{info_span, Span};

use crate::AttemptId;

/// Span covering one façade action, from precondition check to reconciliation.
pub fn action_span(action: &str, identity: &str) -> Span {
    info_span!("action", action = %action, identity = %identity)
}

/// Span covering one transaction attempt through signing and confirmation.
pub fn attempt_span(id: AttemptId, action: &str) -> Span {
    info_span!("attempt", attempt = id, action = %action)
}

/// Span covering one iteration of a background polling loop.
pub fn poll_span(loop_name: &str) -> Span {
    info_span!("poll", name = %loop_name)
}
