//! Migration outcomes, batch report and progress lines
//!
//! A test (dry-run) failure and a real (commit) failure have different
//! recovery actions, so they are recorded with distinct phases and rendered
//! with distinct wording.

use crate::{
    CommitFailure, Committed, MessageSink, MigrationErrorKind, VerificationFailure, WalletRecord,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Title used for the start/end lines of a batch
pub const BATCH_TITLE: &str = "Migrate wallets";

/// Step at which a wallet reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    /// Dry run on a copy
    Verify,
    /// Real migration of the original
    Commit,
}

/// Result for one candidate wallet. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    path: PathBuf,
    description: String,
    succeeded: bool,
    phase: MigrationPhase,
    error_kind: Option<MigrationErrorKind>,
    detail_message: String,
    backup_path: Option<PathBuf>,
}

impl MigrationOutcome {
    fn new(record: &WalletRecord, phase: MigrationPhase) -> Self {
        Self {
            path: record.path.clone(),
            description: record.display_name(),
            succeeded: false,
            phase,
            error_kind: None,
            detail_message: String::new(),
            // Only a backup taken in this run counts; a stale one from an
            // earlier run stays on the record
            backup_path: None,
        }
    }

    /// Dry run failed; the wallet was left as legacy
    pub fn verify_failed(record: &WalletRecord, failure: &VerificationFailure) -> Self {
        Self {
            error_kind: Some(failure.kind),
            detail_message: failure.message.clone(),
            ..Self::new(record, MigrationPhase::Verify)
        }
    }

    /// Dry run passed and no commit was requested
    pub fn verified(record: &WalletRecord) -> Self {
        Self {
            succeeded: true,
            detail_message: "test migration succeeded".to_string(),
            ..Self::new(record, MigrationPhase::Verify)
        }
    }

    /// Real migration failed; reuse the backup
    pub fn commit_failed(record: &WalletRecord, failure: &CommitFailure) -> Self {
        Self {
            error_kind: Some(failure.kind),
            detail_message: failure.message.clone(),
            backup_path: failure.backup_path.clone(),
            ..Self::new(record, MigrationPhase::Commit)
        }
    }

    /// Real migration succeeded
    pub fn committed(record: &WalletRecord, committed: &Committed) -> Self {
        Self {
            succeeded: true,
            detail_message: "migrated to structured".to_string(),
            backup_path: Some(committed.backup_path.clone()),
            ..Self::new(record, MigrationPhase::Commit)
        }
    }

    /// Wallet path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wallet description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the wallet reached a successful terminal state
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Terminal phase
    pub fn phase(&self) -> MigrationPhase {
        self.phase
    }

    /// Failure kind, `None` on success
    pub fn error_kind(&self) -> Option<MigrationErrorKind> {
        self.error_kind
    }

    /// Detail text
    pub fn detail_message(&self) -> &str {
        &self.detail_message
    }

    /// Backup taken before the real migration, if any
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }
}

/// Ordered outcomes of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    outcomes: Vec<MigrationOutcome>,
    had_failures: bool,
}

impl MigrationReport {
    /// Build a report, deriving the failure flag
    pub fn from_outcomes(outcomes: Vec<MigrationOutcome>) -> Self {
        let had_failures = outcomes.iter().any(|o| !o.succeeded);
        Self {
            outcomes,
            had_failures,
        }
    }

    fn push(&mut self, outcome: MigrationOutcome) {
        self.had_failures |= !outcome.succeeded;
        self.outcomes.push(outcome);
    }

    /// Outcomes in candidate order
    pub fn outcomes(&self) -> &[MigrationOutcome] {
        &self.outcomes
    }

    /// True iff at least one outcome failed
    pub fn had_failures(&self) -> bool {
        self.had_failures
    }

    /// Whether any wallet still needs operator attention
    pub fn needs_attention(&self) -> bool {
        self.had_failures
    }

    /// Successful outcomes
    pub fn succeeded(&self) -> impl Iterator<Item = &MigrationOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded)
    }

    /// Failed outcomes
    pub fn failed(&self) -> impl Iterator<Item = &MigrationOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded)
    }

    /// Outcome for a wallet path
    pub fn outcome_for(&self, path: &Path) -> Option<&MigrationOutcome> {
        self.outcomes.iter().find(|o| o.path == path)
    }

    /// Number of outcomes
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True if no candidate was processed
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Accumulates outcomes and streams progress lines to a sink
pub struct MigrationReporter<'a, K: MessageSink + ?Sized> {
    sink: &'a K,
    report: MigrationReport,
}

impl<'a, K: MessageSink + ?Sized> MigrationReporter<'a, K> {
    /// Create reporter writing to `sink`
    pub fn new(sink: &'a K) -> Self {
        Self {
            sink,
            report: MigrationReport::default(),
        }
    }

    fn line(&self, line: &str) {
        self.sink.emit(line);
    }

    fn error_line(&self, kind: MigrationErrorKind, message: &str) {
        self.line(&format!("The error was '{} {}'", kind, message));
    }

    /// Batch header
    pub fn batch_started(&self) {
        self.line(" ");
        self.line(&format!("Start: {}", BATCH_TITLE));
    }

    /// Candidate picked up
    pub fn candidate(&self, record: &WalletRecord) {
        self.line(" ");
        self.line(&format!(
            "Wallet '{}' is legacy - needs migrating.",
            record.display_name()
        ));
    }

    /// Dry run failed
    pub fn verify_failed(&mut self, record: &WalletRecord, failure: &VerificationFailure) {
        self.line("Test wallet migration was not successful. Leaving wallet as 'legacy'.");
        if failure.kind != MigrationErrorKind::FormatMismatch {
            self.error_line(failure.kind, &failure.message);
        }
        self.report.push(MigrationOutcome::verify_failed(record, failure));
    }

    /// Dry run passed in a verify-only batch
    pub fn verified(&mut self, record: &WalletRecord) {
        self.line(&format!(
            "Test migration of wallet '{}' to structured was successful.",
            record.display_name()
        ));
        self.report.push(MigrationOutcome::verified(record));
    }

    /// Backup written ahead of the real migration
    pub fn backed_up(&self, backup_path: &Path) {
        self.line(&format!(
            "Backing up legacy wallet to '{}'",
            backup_path.display()
        ));
    }

    /// Real migration failed
    pub fn commit_failed(&mut self, record: &WalletRecord, failure: &CommitFailure) {
        match &failure.backup_path {
            Some(backup) => self.line(&format!(
                "Real wallet migration was not successful. Please reuse the backup at '{}'.",
                backup.display()
            )),
            None => self.line(
                "Real wallet migration was not successful. No backup could be made; the wallet was left as 'legacy'.",
            ),
        }
        if failure.kind != MigrationErrorKind::FormatMismatch {
            self.error_line(failure.kind, &failure.message);
        }
        self.report.push(MigrationOutcome::commit_failed(record, failure));
    }

    /// Real migration succeeded
    pub fn committed(&mut self, record: &WalletRecord, committed: &Committed) {
        self.line(&format!(
            "Migration of wallet '{}' to structured was successful.",
            record.display_name()
        ));
        self.report.push(MigrationOutcome::committed(record, committed));
    }

    /// Batch footer; returns the finished report
    pub fn finish(self) -> MigrationReport {
        self.line(" ");
        if self.report.had_failures() {
            warn!(
                failed = self.report.failed().count(),
                total = self.report.len(),
                "Wallet migration batch finished with failures"
            );
            self.line(
                "To help improve the wallet migration code, please copy the messages above into a bug report.",
            );
        }
        self.line(&format!("End: {}", BATCH_TITLE));
        self.line(" ");
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemorySink, WalletVersion};

    fn record(path: &str) -> WalletRecord {
        WalletRecord::new(path, WalletVersion::Legacy, "Main")
    }

    #[test]
    fn test_empty_report_has_no_failures() {
        let report = MigrationReport::default();
        assert!(report.is_empty());
        assert!(!report.had_failures());
        assert!(!report.needs_attention());
    }

    #[test]
    fn test_report_failure_flag() {
        let ok = MigrationOutcome::verified(&record("a.wallet"));
        let bad = MigrationOutcome::verify_failed(
            &record("b.wallet"),
            &VerificationFailure::new(MigrationErrorKind::Io, "boom"),
        );

        assert!(!MigrationReport::from_outcomes(vec![ok.clone()]).had_failures());
        let report = MigrationReport::from_outcomes(vec![ok, bad]);
        assert!(report.had_failures());
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.succeeded().count(), 1);
    }

    #[test]
    fn test_failure_classes_render_differently() {
        let sink = MemorySink::new();
        let mut reporter = MigrationReporter::new(&sink);
        reporter.batch_started();

        let a = record("a.wallet");
        reporter.candidate(&a);
        reporter.verify_failed(&a, &VerificationFailure::new(MigrationErrorKind::Load, "bad header"));

        let b = record("b.wallet");
        reporter.candidate(&b);
        reporter.backed_up(Path::new("b-1.wallet.bak"));
        reporter.commit_failed(
            &b,
            &CommitFailure {
                kind: MigrationErrorKind::Save,
                message: "disk full".to_string(),
                backup_path: Some(PathBuf::from("b-1.wallet.bak")),
            },
        );
        let report = reporter.finish();

        assert!(sink.contains("Leaving wallet as 'legacy'"));
        assert!(sink.contains("The error was 'LoadFailure bad header'"));
        assert!(sink.contains("Please reuse the backup at 'b-1.wallet.bak'"));
        assert!(sink.contains("bug report"));
        assert_eq!(sink.lines().last().map(String::as_str), Some(" "));

        assert_eq!(report.len(), 2);
        assert_eq!(report.outcomes()[0].phase(), MigrationPhase::Verify);
        assert_eq!(report.outcomes()[1].phase(), MigrationPhase::Commit);
        assert_eq!(
            report.outcomes()[1].backup_path(),
            Some(Path::new("b-1.wallet.bak"))
        );
    }

    #[test]
    fn test_format_mismatch_has_no_error_line() {
        let sink = MemorySink::new();
        let mut reporter = MigrationReporter::new(&sink);
        let a = record("a.wallet");
        reporter.verify_failed(&a, &VerificationFailure::format_mismatch(WalletVersion::Legacy));
        assert!(!sink.contains("The error was"));
    }

    #[test]
    fn test_verify_outcome_ignores_earlier_backup() {
        let mut a = record("a.wallet");
        a.backup_path = Some(PathBuf::from("a-20200101000000.wallet.bak"));

        let failed = MigrationOutcome::verify_failed(
            &a,
            &VerificationFailure::new(MigrationErrorKind::Load, "truncated"),
        );
        assert_eq!(failed.backup_path(), None);
        assert_eq!(MigrationOutcome::verified(&a).backup_path(), None);

        let json = serde_json::to_value(MigrationReport::from_outcomes(vec![failed])).unwrap();
        assert!(json["outcomes"][0]["backup_path"].is_null());
    }

    #[test]
    fn test_report_serializes() {
        let report = MigrationReport::from_outcomes(vec![MigrationOutcome::verified(&record("a.wallet"))]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["had_failures"], false);
        assert_eq!(json["outcomes"][0]["phase"], "verify");
        assert_eq!(json["outcomes"][0]["path"], "a.wallet");
    }
}
