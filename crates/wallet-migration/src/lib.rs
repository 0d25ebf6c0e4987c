//! Wallet file format migration engine
//!
//! Upgrades persisted wallet records from the legacy encoding to the
//! structured encoding without putting private key material at risk.
//!
//! ## Pipeline
//!
//! - **Format Detector**: picks out wallets still in the legacy encoding
//! - **Dry-Run Verifier**: converts a disposable copy and reloads it
//! - **Commit Executor**: backs up the original, converts it in place, reloads it
//! - **Migration Reporter**: collects per-wallet outcomes and progress lines
//! - **Migrator**: drives verify then commit for each candidate, one at a time
//!
//! The engine is synchronous and blocking. Callers that need to keep an
//! interactive thread free run [`Migrator::run_batch`] on a worker of their
//! choosing and consume progress through a [`MessageSink`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commit;
pub mod detector;
pub mod error;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory_store;
pub mod models;
pub mod orchestrator;
pub mod reporter;
pub mod sink;
pub mod store;
pub mod verifier;

pub use commit::{CommitExecutor, Committed};
pub use detector::{is_legacy, select_candidates};
pub use error::{CommitFailure, MigrationErrorKind, StoreError, StoreResult, VerificationFailure};
#[cfg(any(test, feature = "test-helpers"))]
pub use memory_store::{Fault, MemoryWalletStore, StoreOp, StoredWallet};
pub use models::{StoredKey, WalletPayload, WalletRecord, WalletVersion};
pub use orchestrator::{CandidateState, Migrator};
pub use reporter::{MigrationOutcome, MigrationPhase, MigrationReport, MigrationReporter};
pub use sink::{CallbackSink, MemorySink, MessageSink, NullSink, TeeSink, TracingSink};
pub use store::WalletStore;
pub use verifier::{DryRunVerifier, Verified};
