//! Background loops for the voting period.
//!
//! [`PeriodPoller`] re-reads the period from the backend on a slow cadence;
//! [`CountdownTicker`] recomputes the phase and countdown from the latest
//! snapshot on a fast one, extrapolating ledger time from elapsed local time.
//! Both publish through a `watch` channel and stop when their
//! [`PollerHandle`] is stopped or dropped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::Instrument;
use votechain_orchestrator::tracing_spans::poll_span;
use votechain_registry::Registry;

use crate::period::PeriodView;

/// A period read together with the local instant it was taken.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodSnapshot {
    pub view: PeriodView,
    pub observed_at: Instant,
}

impl PeriodSnapshot {
    /// The view as it should look `now`, assuming ledger time advanced in
    /// step with local time since the read.
    pub fn extrapolate(&self, now: Instant) -> PeriodView {
        let elapsed = now.saturating_duration_since(self.observed_at).as_secs();
        let period = self.view.period;
        PeriodView::of(period.at(period.chain_time.plus(elapsed)))
    }
}

/// Owns a background loop and the channel it publishes on.
///
/// Dropping the handle aborts the loop; [`PollerHandle::stop`] lets it
/// finish its current iteration first.
pub struct PollerHandle<T> {
    shutdown: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
    rx: watch::Receiver<T>,
}

impl<T: Clone> PollerHandle<T> {
    /// A receiver that observes every published value.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }

    pub fn latest(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Signal the loop to exit and wait for it.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(());
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<T> Drop for PollerHandle<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn interval(every: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Periodic voting-period refresh.
pub struct PeriodPoller;

impl PeriodPoller {
    /// Read the period immediately, then every `every`.
    ///
    /// Failed reads keep the last good snapshot.
    pub fn spawn(registry: Arc<dyn Registry>, every: Duration) -> PollerHandle<Option<PeriodSnapshot>> {
        let (shutdown, mut shutdown_rx) = broadcast::channel(1);
        let (tx, rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut interval = interval(every);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("period poller shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let read = registry.voting_period().instrument(poll_span("period")).await;
                        match read {
                            Ok(period) => {
                                let view = PeriodView::of(period);
                                tracing::debug!(phase = %view.phase, "period refreshed");
                                tx.send_replace(Some(PeriodSnapshot {
                                    view,
                                    observed_at: Instant::now(),
                                }));
                            }
                            Err(e) => tracing::warn!(error = %e, "period refresh failed"),
                        }
                    }
                }
            }
        });

        PollerHandle {
            shutdown,
            task: Some(task),
            rx,
        }
    }
}

/// Periodic phase and countdown recomputation.
pub struct CountdownTicker;

impl CountdownTicker {
    /// Recompute from the latest snapshot in `periods` every `every`.
    ///
    /// Publishes only when the view changes.
    pub fn spawn(
        periods: watch::Receiver<Option<PeriodSnapshot>>,
        every: Duration,
    ) -> PollerHandle<Option<PeriodView>> {
        let (shutdown, mut shutdown_rx) = broadcast::channel(1);
        let (tx, rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut interval = interval(every);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("countdown ticker shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let snapshot = *periods.borrow();
                        let Some(snapshot) = snapshot else { continue };
                        let view = snapshot.extrapolate(Instant::now());
                        tx.send_if_modified(|current| {
                            if *current == Some(view) {
                                return false;
                            }
                            if current.is_some_and(|c| c.phase != view.phase) {
                                tracing::info!(phase = %view.phase, "voting phase changed");
                            }
                            *current = Some(view);
                            true
                        });
                    }
                }
            }
        });

        PollerHandle {
            shutdown,
            task: Some(task),
            rx,
        }
    }
}

/// A period poller and the countdown ticker fed by it.
pub struct PeriodWatch {
    pub poller: PollerHandle<Option<PeriodSnapshot>>,
    pub ticker: PollerHandle<Option<PeriodView>>,
}

impl PeriodWatch {
    pub fn start(registry: Arc<dyn Registry>, refresh: Duration, tick: Duration) -> Self {
        let poller = PeriodPoller::spawn(registry, refresh);
        let ticker = CountdownTicker::spawn(poller.subscribe(), tick);
        Self { poller, ticker }
    }

    /// Views as the ticker publishes them.
    pub fn views(&self) -> watch::Receiver<Option<PeriodView>> {
        self.ticker.subscribe()
    }

    pub async fn stop(self) {
        self.ticker.stop().await;
        self.poller.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Phase;
    use votechain_nullables::{NullClock, NullRegistry};
    use votechain_types::Timestamp;

    const T: u64 = 1_700_000_000;

    fn registry() -> Arc<NullRegistry> {
        let registry = Arc::new(NullRegistry::new(Arc::new(NullClock::new(T))));
        registry.set_period(Timestamp::new(T - 10), Timestamp::new(T + 5));
        registry
    }

    #[tokio::test(start_paused = true)]
    async fn poller_reads_immediately_and_on_cadence() {
        let registry = registry();
        let poller = PeriodPoller::spawn(registry.clone(), Duration::from_secs(60));
        let mut rx = poller.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().unwrap().view.phase, Phase::Active);
        assert_eq!(registry.calls("voting_period"), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(registry.calls("voting_period"), 2);
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn poller_keeps_last_snapshot_on_failure() {
        let registry = registry();
        let poller = PeriodPoller::spawn(registry.clone(), Duration::from_secs(60));
        let mut rx = poller.subscribe();
        rx.changed().await.unwrap();

        registry.fail("voting_period", "timeout");
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(poller.latest().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_counts_down_into_ended() {
        let registry = registry();
        let poller = PeriodPoller::spawn(registry.clone(), Duration::from_secs(3_600));
        let ticker = CountdownTicker::spawn(poller.subscribe(), Duration::from_secs(1));
        let mut views = ticker.subscribe();

        views.changed().await.unwrap();
        let first = views.borrow().unwrap();
        assert_eq!(first.phase, Phase::Active);
        assert!(first.remaining.unwrap().total_secs() <= 5);

        tokio::time::sleep(Duration::from_secs(6)).await;
        let last = ticker.latest().unwrap();
        assert_eq!(last.phase, Phase::Ended);
        assert_eq!(last.remaining, None);

        ticker.stop().await;
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_polling() {
        let registry = registry();
        let poller = PeriodPoller::spawn(registry.clone(), Duration::from_secs(1));
        let mut rx = poller.subscribe();
        rx.changed().await.unwrap();
        drop(poller);

        let calls = registry.calls("voting_period");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(registry.calls("voting_period"), calls);
    }
}
