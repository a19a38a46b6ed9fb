mod common;

use common::*;
use votechain_election::{ActionKey, ElectionError, Phase, Reconciliation};
use votechain_nullables::SignerBehavior;
use votechain_orchestrator::{AbandonSignal, AttemptStatus, TxError};
use votechain_registry::ImageUpload;

#[tokio::test]
async fn set_period_in_the_past_never_reaches_the_backend() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();

    let err = h
        .client
        .set_voting_period(at(-10), at(100), AbandonSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.total_calls(), 0);
}

#[tokio::test]
async fn inverted_window_is_refused() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    let err = h
        .client
        .set_voting_period(at(200), at(100), AbandonSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.total_calls(), 0);
}

#[tokio::test]
async fn period_moves_through_its_phases() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();

    let outcome = h
        .client
        .set_voting_period(at(3_600), at(7_200), AbandonSignal::never())
        .await
        .unwrap();
    let view = outcome.state().unwrap();
    assert!(outcome.reconciliation.is_fresh());
    assert_eq!(view.phase, Phase::Pending);

    h.clock.advance(4_000);
    let view = h.client.period().await.unwrap();
    assert_eq!(view.phase, Phase::Active);
    assert_eq!(view.remaining.unwrap().total_secs(), 3_200);

    h.clock.advance(4_000);
    assert_eq!(h.client.period().await.unwrap().phase, Phase::Ended);
}

#[tokio::test]
async fn active_period_cannot_be_rescheduled() {
    let h = harness();
    h.open_period();
    h.client.connect(ADMIN).unwrap();
    let err = h
        .client
        .set_voting_period(at(10_000), at(20_000), AbandonSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.builds(), 0);
}

#[tokio::test]
async fn stop_ends_an_active_period() {
    let h = harness();
    h.open_period();
    h.client.connect(ADMIN).unwrap();

    let outcome = h.client.stop_voting_period(AbandonSignal::never()).await.unwrap();

    assert!(outcome.reconciliation.is_fresh());
    assert_eq!(outcome.state().unwrap().phase, Phase::Ended);
}

#[tokio::test]
async fn stop_requires_an_active_period() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    let err = h.client.stop_voting_period(AbandonSignal::never()).await.unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
}

#[tokio::test]
async fn voters_cannot_manage_candidates() {
    let h = harness();
    h.registry.add_voter(&addr(VOTER));
    h.client.connect(VOTER).unwrap();

    let image = ImageUpload::new("alice.png", "image/png", vec![1, 2, 3]);
    let err = h
        .client
        .add_candidate("Alice", Some(image), AbandonSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert!(h.content.uploads().is_empty());
    assert_eq!(h.registry.builds(), 0);
}

#[tokio::test]
async fn add_candidate_uploads_image_first() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();

    let image = ImageUpload::new("alice.png", "image/png", vec![1, 2, 3]);
    let outcome = h
        .client
        .add_candidate("  Alice ", Some(image), AbandonSignal::never())
        .await
        .unwrap();

    let candidates = outcome.state().unwrap();
    assert!(outcome.reconciliation.is_fresh());
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "Alice");
    assert_eq!(candidates[0].image_cid.as_deref(), Some("bafynull1"));
}

#[tokio::test]
async fn failed_upload_aborts_before_build() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    h.content.fail_uploads("gateway down");

    let image = ImageUpload::new("alice.png", "image/png", vec![1]);
    let err = h
        .client
        .add_candidate("Alice", Some(image), AbandonSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, ElectionError::UploadFailed(_)));
    assert_eq!(h.registry.builds(), 0);
    assert!(h.signer.submitted().is_empty());
}

#[tokio::test]
async fn blank_candidate_name_is_refused_locally() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    let err = h
        .client
        .add_candidate("   ", None, AbandonSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.total_calls(), 0);
}

#[tokio::test]
async fn removing_unknown_candidate_is_refused() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    let err = h
        .client
        .remove_candidate(7, AbandonSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
}

#[tokio::test]
async fn second_remove_while_broadcast_is_rejected_not_queued() {
    let h = harness();
    let alice = h.registry.add_candidate("Alice");
    let bob = h.registry.add_candidate("Bob");
    h.client.connect(ADMIN).unwrap();
    let mut status = h.latest_status();
    h.signer.push(SignerBehavior::HoldReceipt);

    let first = {
        let client = h.client.clone();
        tokio::spawn(async move { client.remove_candidate(alice, AbandonSignal::never()).await })
    };
    status
        .wait_for(|s| *s == Some(AttemptStatus::Broadcast))
        .await
        .unwrap();

    let err = h
        .client
        .remove_candidate(alice, AbandonSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ElectionError::ActionInFlight("remove_candidate")));
    assert_eq!(h.registry.calls("build_remove_candidate"), 1);
    assert!(h.client.is_in_flight(&ActionKey::RemoveCandidate(alice)));
    assert!(!h.client.is_in_flight(&ActionKey::RemoveCandidate(bob)));

    h.signer.release();
    let outcome = first.await.unwrap().unwrap();
    assert!(outcome.reconciliation.is_fresh());
    assert!(outcome.state().unwrap().iter().all(|c| c.id != alice));
    assert!(!h.client.is_in_flight(&ActionKey::RemoveCandidate(alice)));
}

#[tokio::test]
async fn reverted_transaction_is_on_chain_failure() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    h.signer.push(SignerBehavior::Revert);

    let err = h
        .client
        .add_candidate("Alice", None, AbandonSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ElectionError::Transaction(TxError::OnChainFailure { .. })
    ));
    assert!(!err.may_have_landed());
    assert!(h.client.candidates().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_receipt_times_out_and_may_have_landed() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    h.signer.push(SignerBehavior::NeverConfirm);

    let err = h
        .client
        .add_candidate("Alice", None, AbandonSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ElectionError::Transaction(TxError::ConfirmationTimeout { .. })
    ));
    assert!(err.may_have_landed());
    assert!(!h.client.is_in_flight(&ActionKey::AddCandidate));
}

#[tokio::test]
async fn winner_of_ended_election() {
    let h = harness();
    let alice = h.registry.add_candidate("Alice");
    h.registry.add_candidate("Bob");
    h.registry.add_vote(&addr(VOTER), alice);
    h.registry.set_period(at(-7_200), at(-3_600));
    h.client.connect(ADMIN).unwrap();

    let outcome = h.client.declare_winner(AbandonSignal::never()).await.unwrap();

    assert_eq!(outcome.winner.name, "Alice");
    assert!(outcome.stopped.is_none());
    assert!(h.signer.submitted().is_empty());
}

#[tokio::test]
async fn winner_stops_an_active_period_first() {
    let h = harness();
    let alice = h.registry.add_candidate("Alice");
    h.registry.add_vote(&addr(VOTER), alice);
    h.open_period();
    h.client.connect(ADMIN).unwrap();
    let statuses = h.record_statuses();

    let outcome = h.client.declare_winner(AbandonSignal::never()).await.unwrap();

    assert_eq!(outcome.winner.name, "Alice");
    let stopped = outcome.stopped.unwrap();
    assert_eq!(stopped.state().unwrap().phase, Phase::Ended);
    assert_eq!(statuses.lock().unwrap().last(), Some(&AttemptStatus::Confirmed));
    assert_eq!(h.registry.calls("build_stop_voting_period"), 1);
}

#[tokio::test]
async fn failed_stop_is_a_prerequisite_failure() {
    let h = harness();
    h.registry.add_candidate("Alice");
    h.open_period();
    h.client.connect(ADMIN).unwrap();
    h.signer.push(SignerBehavior::Reject);

    let err = h.client.declare_winner(AbandonSignal::never()).await.unwrap_err();

    match err {
        ElectionError::PrerequisiteFailed {
            prerequisite,
            source,
        } => {
            assert_eq!(prerequisite, "stop_voting_period");
            assert!(matches!(
                *source,
                ElectionError::Transaction(TxError::SigningRejected { .. })
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.registry.calls("winner"), 0);
}

#[tokio::test]
async fn winner_needs_a_period_to_have_run() {
    let h = harness();
    h.client.connect(ADMIN).unwrap();
    let err = h.client.declare_winner(AbandonSignal::never()).await.unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));

    h.registry.set_period(at(3_600), at(7_200));
    let err = h.client.declare_winner(AbandonSignal::never()).await.unwrap_err();
    assert!(matches!(err, ElectionError::PreconditionFailed { .. }));
    assert_eq!(h.registry.builds(), 0);
}

#[tokio::test]
async fn silently_ignored_stop_is_unverified() {
    let h = harness();
    h.open_period();
    h.registry.freeze(true);
    h.client.connect(ADMIN).unwrap();

    let outcome = h.client.stop_voting_period(AbandonSignal::never()).await.unwrap();

    match outcome.reconciliation {
        Reconciliation::Unverified { state, .. } => assert_eq!(state.phase, Phase::Active),
        other => panic!("expected unverified, got {other:?}"),
    }
}
