mod common;

use common::*;
use std::time::Duration;
use votechain_election::Phase;
use votechain_orchestrator::{AbandonSignal, AttemptStatus};
use votechain_types::Role;

#[tokio::test]
async fn attempt_events_arrive_in_order() {
    let h = harness();
    h.client.connect(VOTER).unwrap();
    let statuses = h.record_statuses();

    h.client.register_voter(AbandonSignal::never()).await.unwrap();

    assert_eq!(
        *statuses.lock().unwrap(),
        vec![
            AttemptStatus::Built,
            AttemptStatus::AwaitingSignature,
            AttemptStatus::Broadcast,
            AttemptStatus::Confirmed,
        ]
    );
}

#[tokio::test]
async fn tally_and_counts() {
    let h = harness();
    let alice = h.registry.add_candidate("Alice");
    let bob = h.registry.add_candidate("Bob");
    h.registry.add_vote(&addr(VOTER), alice);
    h.registry.add_vote(&addr(STRANGER), alice);
    h.registry.add_vote(&addr(ADMIN), bob);

    let tally = h.client.tally().await.unwrap();
    assert_eq!(tally.total_votes, 3);
    assert_eq!(tally.leader().unwrap().candidate.id, alice);
    assert_eq!(tally.entries[1].percentage, 33.33);

    let counts = h.client.counts().await.unwrap();
    assert_eq!(counts.candidates, 2);
    assert_eq!(counts.voters, 3);
    assert_eq!(h.client.voters().await.unwrap().len(), 3);
}

#[tokio::test]
async fn snapshot_reads_everything_for_the_identity() {
    let h = harness();
    h.registry.add_candidate("Alice");
    h.registry.add_voter(&addr(VOTER));
    h.open_period();
    h.client.connect(VOTER).unwrap();

    let snapshot = h.client.snapshot().await.unwrap();

    assert_eq!(snapshot.role, Some(Role::Voter));
    assert!(snapshot.voter.unwrap().is_registered);
    assert_eq!(snapshot.period.phase, Phase::Active);
    assert_eq!(snapshot.candidates.len(), 1);
    assert_eq!(h.client.cached_role(), Some(Role::Voter));
}

#[tokio::test]
async fn snapshot_role_fails_closed_like_refresh() {
    let h = harness();
    h.registry.add_voter(&addr(VOTER));
    h.client.connect(VOTER).unwrap();
    h.registry.fail("voter", "connection reset");

    let snapshot = h.client.snapshot().await.unwrap();
    assert_eq!(snapshot.role, Some(Role::Unregistered));
    assert_eq!(snapshot.voter, None);
    assert_eq!(h.client.cached_role(), Some(Role::Unregistered));
    assert_eq!(h.client.refresh_role().await.unwrap(), Role::Unregistered);
}

#[tokio::test]
async fn snapshot_without_identity() {
    let h = harness();
    let snapshot = h.client.snapshot().await.unwrap();
    assert_eq!(snapshot.identity, None);
    assert_eq!(snapshot.role, None);
    assert_eq!(snapshot.period.phase, Phase::NotSet);
}

#[tokio::test]
async fn snapshot_fails_when_backend_is_down() {
    let h = harness();
    h.registry.fail("candidates", "connection refused");
    assert!(h.client.snapshot().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn period_watch_tracks_the_countdown() {
    let h = harness();
    h.registry.set_period(at(-10), at(3));

    let watch = h
        .client
        .watch_period(Duration::from_secs(60), Duration::from_secs(1));
    let mut views = watch.views();
    views.changed().await.unwrap();
    assert_eq!(views.borrow().unwrap().phase, Phase::Active);

    views
        .wait_for(|v| v.is_some_and(|v| v.phase == Phase::Ended))
        .await
        .unwrap();
    watch.stop().await;
}
