#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use votechain_election::ElectionClient;
use votechain_nullables::{NullClock, NullContentStore, NullRegistry, NullSigner};
use votechain_orchestrator::{AttemptStatus, OrchestratorConfig, TransactionOrchestrator};
use votechain_types::{Address, Timestamp};

pub const T: u64 = 1_700_000_000;
pub const ADMIN: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const VOTER: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const STRANGER: &str = "0xcccccccccccccccccccccccccccccccccccccccc";
/// An admin that is not the contract owner.
pub const DEPUTY: &str = "0xdddddddddddddddddddddddddddddddddddddddd";

pub struct Harness {
    pub clock: Arc<NullClock>,
    pub registry: Arc<NullRegistry>,
    pub signer: Arc<NullSigner>,
    pub content: Arc<NullContentStore>,
    pub client: Arc<ElectionClient>,
}

/// Client wired to nullables, with confirmed transactions applied to the
/// registry and ledger time at `T`. `ADMIN` owns the contract.
pub fn harness() -> Harness {
    let clock = Arc::new(NullClock::new(T));
    let registry = Arc::new(NullRegistry::new(clock.clone()));
    let signer = Arc::new(NullSigner::new());
    let content = Arc::new(NullContentStore::new());
    {
        let registry = registry.clone();
        signer.on_confirm(move |tx| registry.apply(tx));
    }
    let orchestrator = Arc::new(TransactionOrchestrator::new(
        signer.clone(),
        OrchestratorConfig {
            confirmation_timeout: Duration::from_secs(30),
        },
    ));
    let client = Arc::new(ElectionClient::new(
        registry.clone(),
        content.clone(),
        orchestrator,
        clock.clone(),
    ));
    registry.set_owner(&addr(ADMIN));
    Harness {
        clock,
        registry,
        signer,
        content,
        client,
    }
}

pub fn addr(raw: &str) -> Address {
    Address::parse(raw).unwrap()
}

pub fn at(offset: i64) -> Timestamp {
    Timestamp::new((T as i64 + offset) as u64)
}

impl Harness {
    /// A voting window that is active right now.
    pub fn open_period(&self) {
        self.registry.set_period(at(-600), at(3_600));
    }

    /// Every attempt status announced, in order.
    pub fn record_statuses(&self) -> Arc<Mutex<Vec<AttemptStatus>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        self.client
            .events()
            .subscribe(Box::new(move |event| sink.lock().unwrap().push(event.status())));
        seen
    }

    /// The most recent attempt status, observable from async code.
    pub fn latest_status(&self) -> watch::Receiver<Option<AttemptStatus>> {
        let (tx, rx) = watch::channel(None);
        self.client
            .events()
            .subscribe(Box::new(move |event| {
                tx.send_replace(Some(event.status()));
            }));
        rx
    }
}
