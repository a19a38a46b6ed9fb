mod common;

use common::*;
use votechain_election::{ActionKey, ElectionError, Reconciliation};
use votechain_nullables::SignerBehavior;
use votechain_orchestrator::{AbandonSignal, AttemptStatus, TxError};
use votechain_types::Role;

#[tokio::test]
async fn owner_grants_and_revokes_admin() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();

    let granted = h.client.add_admin(DEPUTY, AbandonSignal::never()).await.unwrap();
    assert!(granted.reconciliation.is_fresh());
    assert_eq!(granted.state(), Some(&Role::Admin));

    let revoked = h
        .client
        .remove_admin(DEPUTY, AbandonSignal::never())
        .await
        .unwrap();
    assert!(revoked.reconciliation.is_fresh());
    assert_eq!(revoked.state(), Some(&Role::Unregistered));
    assert_eq!(h.registry.calls("build_add_admin"), 1);
    assert_eq!(h.registry.calls("build_remove_admin"), 1);
}

#[tokio::test]
async fn deputy_admin_grant_reverts_on_chain() {
    let h = harness();
    h.registry.add_admin(&addr(DEPUTY));
    h.client.connect(DEPUTY).unwrap();

    let err = h
        .client
        .add_admin(STRANGER, AbandonSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ElectionError::Transaction(TxError::OnChainFailure { .. })
    ));
    h.client.connect(STRANGER).unwrap();
    assert_eq!(h.client.refresh_role().await.unwrap(), Role::Unregistered);
}

#[tokio::test]
async fn admin_grant_preconditions() {
    let h = harness();
    h.registry.add_admin(&addr(DEPUTY));

    h.client.connect(VOTER).unwrap();
    let err = h.client.add_admin(STRANGER, AbandonSignal::never()).await.unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));

    h.client.connect(ADMIN).unwrap();
    let err = h.client.add_admin(DEPUTY, AbandonSignal::never()).await.unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));

    let err = h.client.add_admin("0x1234", AbandonSignal::never()).await.unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.builds(), 0);
}

#[tokio::test]
async fn admin_cannot_revoke_itself() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    let calls = h.registry.total_calls();

    let err = h
        .client
        .remove_admin(ADMIN, AbandonSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.total_calls(), calls);
}

#[tokio::test]
async fn revoking_a_non_admin_is_refused() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    let err = h
        .client
        .remove_admin(STRANGER, AbandonSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.builds(), 0);
}

#[tokio::test]
async fn admin_removes_a_voter() {
    let h = harness();
    h.registry.add_voter(&addr(VOTER));
    h.registry.add_voter(&addr(STRANGER));
    h.client.connect(ADMIN).unwrap();

    let outcome = h
        .client
        .remove_voter(VOTER, AbandonSignal::never())
        .await
        .unwrap();

    assert!(outcome.reconciliation.is_fresh());
    let voters = outcome.state().unwrap();
    assert_eq!(voters.len(), 1);
    assert_eq!(voters[0].address, addr(STRANGER));

    h.client.connect(VOTER).unwrap();
    assert_eq!(h.client.refresh_role().await.unwrap(), Role::Unregistered);
}

#[tokio::test]
async fn removing_an_unregistered_voter_is_refused() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    let err = h
        .client
        .remove_voter(STRANGER, AbandonSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.builds(), 0);
}

#[tokio::test]
async fn voters_cannot_remove_voters() {
    let h = harness();
    h.registry.add_voter(&addr(VOTER));
    h.registry.add_voter(&addr(STRANGER));
    h.client.connect(VOTER).unwrap();
    let err = h
        .client
        .remove_voter(STRANGER, AbandonSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.builds(), 0);
}

#[tokio::test]
async fn second_voter_removal_while_broadcast_is_rejected() {
    let h = harness();
    h.registry.add_voter(&addr(VOTER));
    h.registry.add_voter(&addr(STRANGER));
    h.client.connect(ADMIN).unwrap();
    let mut status = h.latest_status();
    h.signer.push(SignerBehavior::HoldReceipt);

    let first = {
        let client = h.client.clone();
        tokio::spawn(async move { client.remove_voter(VOTER, AbandonSignal::never()).await })
    };
    status
        .wait_for(|s| *s == Some(AttemptStatus::Broadcast))
        .await
        .unwrap();

    let err = h
        .client
        .remove_voter(VOTER, AbandonSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::ActionInFlight("remove_voter")));
    assert!(h.client.is_in_flight(&ActionKey::RemoveVoter(addr(VOTER))));
    assert!(!h.client.is_in_flight(&ActionKey::RemoveVoter(addr(STRANGER))));

    h.signer.release();
    assert!(first.await.unwrap().unwrap().reconciliation.is_fresh());
    assert!(!h.client.is_in_flight(&ActionKey::RemoveVoter(addr(VOTER))));
}

#[tokio::test]
async fn ignored_admin_grant_is_unverified() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    h.registry.freeze(true);

    let outcome = h.client.add_admin(DEPUTY, AbandonSignal::never()).await.unwrap();

    assert!(matches!(
        outcome.reconciliation,
        Reconciliation::Unverified { state: Role::Unregistered, .. }
    ));
    assert!(outcome.reconciliation.warning().is_some());
}
