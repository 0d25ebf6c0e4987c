//! Batch migration driver
//!
//! Candidates are processed strictly one after another. For each one the
//! dry run must pass before the commit executor is invoked, and every
//! candidate ends in exactly one outcome. A failing wallet never aborts the
//! batch, and there is no cancellation once a batch has started.
//!
//! The caller must hold exclusive access to every record (no balance
//! updates, sync writes or other loads/saves of the same files) for the
//! duration of the batch.

use crate::{
    is_legacy, CommitExecutor, DryRunVerifier, MessageSink, MigrationReport, MigrationReporter,
    WalletRecord, WalletStore,
};
use tracing::{debug, info};

/// Per-candidate state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    /// Picked by the format detector
    Selected,
    /// Dry run in progress
    Verifying,
    /// Dry run failed (terminal)
    VerifyFailed,
    /// Dry run passed
    VerifyPassed,
    /// Real migration in progress
    Committing,
    /// Real migration failed (terminal)
    CommitFailed,
    /// Real migration succeeded (terminal)
    CommitSucceeded,
}

impl CandidateState {
    /// True for states that end a candidate's processing
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::VerifyFailed | Self::CommitFailed | Self::CommitSucceeded
        )
    }
}

/// Drives verify then commit over a batch of candidates
pub struct Migrator<S, K> {
    store: S,
    sink: K,
    verifier: DryRunVerifier,
    executor: CommitExecutor,
}

impl<S: WalletStore, K: MessageSink> Migrator<S, K> {
    /// Create migrator over `store`, streaming progress to `sink`
    pub fn new(store: S, sink: K) -> Self {
        Self {
            store,
            sink,
            verifier: DryRunVerifier::new(),
            executor: CommitExecutor::new(),
        }
    }

    /// Replace the dry-run verifier (e.g. to set a scratch directory)
    pub fn with_verifier(mut self, verifier: DryRunVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Select legacy wallets from `registry` and migrate them in order
    pub fn migrate_registry(&self, registry: &mut [WalletRecord]) -> MigrationReport {
        self.run_batch(registry.iter_mut().filter(|record| is_legacy(record)))
    }

    /// Migrate each candidate. Records that are no longer legacy when their
    /// turn comes are skipped and produce no outcome.
    pub fn run_batch<'r, I>(&self, candidates: I) -> MigrationReport
    where
        I: IntoIterator<Item = &'r mut WalletRecord>,
    {
        let mut reporter = MigrationReporter::new(&self.sink);
        reporter.batch_started();
        info!("Wallet migration batch started");

        for record in candidates {
            if !is_legacy(record) {
                debug!(wallet = %record.path.display(), "Skipping wallet that is no longer legacy");
                continue;
            }
            let state = self.migrate_one(record, &mut reporter);
            debug_assert!(state.is_terminal());
        }

        let report = reporter.finish();
        info!(
            candidates = report.len(),
            failed = report.failed().count(),
            "Wallet migration batch finished"
        );
        report
    }

    /// Dry-run each candidate without committing anything
    pub fn verify_batch<'r, I>(&self, candidates: I) -> MigrationReport
    where
        I: IntoIterator<Item = &'r WalletRecord>,
    {
        let mut reporter = MigrationReporter::new(&self.sink);
        reporter.batch_started();

        for record in candidates {
            if !is_legacy(record) {
                continue;
            }
            reporter.candidate(record);
            match self.verifier.verify(&self.store, record) {
                Ok(_) => reporter.verified(record),
                Err(failure) => reporter.verify_failed(record, &failure),
            }
        }

        reporter.finish()
    }

    fn migrate_one<R: MessageSink + ?Sized>(
        &self,
        record: &mut WalletRecord,
        reporter: &mut MigrationReporter<'_, R>,
    ) -> CandidateState {
        let mut state = CandidateState::Selected;
        reporter.candidate(record);

        loop {
            debug!(wallet = %record.path.display(), state = ?state, "Candidate state");
            state = match state {
                CandidateState::Selected => CandidateState::Verifying,
                CandidateState::Verifying => match self.verifier.verify(&self.store, record) {
                    Ok(_) => CandidateState::VerifyPassed,
                    Err(failure) => {
                        reporter.verify_failed(record, &failure);
                        CandidateState::VerifyFailed
                    }
                },
                CandidateState::VerifyPassed => CandidateState::Committing,
                CandidateState::Committing => match self.executor.commit(&self.store, record) {
                    Ok(committed) => {
                        reporter.backed_up(&committed.backup_path);
                        reporter.committed(record, &committed);
                        CandidateState::CommitSucceeded
                    }
                    Err(failure) => {
                        if let Some(backup) = &failure.backup_path {
                            reporter.backed_up(backup);
                        }
                        reporter.commit_failed(record, &failure);
                        CandidateState::CommitFailed
                    }
                },
                terminal => return terminal,
            };
        }
    }
}
