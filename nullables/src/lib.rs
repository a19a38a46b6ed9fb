//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the election client (backend registry,
//! wallet signer, content store, clock) is abstracted behind a trait. This
//! crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (scripted failures, held steps)
//! - Record every call for assertions
//! - Never touch the filesystem or network
//!
//! [`NullRegistry::apply`] plays the ledger: wire it to
//! [`NullSigner::on_confirm`] and confirmed transactions change what the
//! registry reports, exactly as a real chain would.

pub mod clock;
pub mod content;
pub mod registry;
pub mod signer;

pub use clock::NullClock;
pub use content::NullContentStore;
pub use registry::{Mutation, NullRegistry};
pub use signer::{NullSigner, SignerBehavior};
