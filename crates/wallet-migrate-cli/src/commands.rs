//! Subcommand implementations

use crate::progress;
use crate::registry;
use anyhow::Context;
use indicatif::ProgressDrawTarget;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wallet_migration::{is_legacy, DryRunVerifier, MigrationReport, Migrator, TeeSink, TracingSink};
use wallet_store_file::FileWalletStore;

/// What a batch is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Dry run only; originals are never written
    VerifyOnly,
    /// Dry run, then back up and convert
    Migrate,
}

/// List wallets with their encoding; legacy wallets are marked with `*`
pub fn scan(store: &FileWalletStore, paths: &[PathBuf]) -> anyhow::Result<()> {
    let registry = registry::load(store, paths)?;
    let mut candidates = 0;
    for record in &registry {
        let marker = if is_legacy(record) {
            candidates += 1;
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<10} {}  ({})",
            marker,
            record.version.to_string(),
            record.path.display(),
            record.display_name()
        );
    }
    println!(
        "{} wallet(s) found, {} need migrating",
        registry.len(),
        candidates
    );
    Ok(())
}

/// Run a batch on a blocking worker while the printer task streams progress
pub async fn run_batch(
    store: FileWalletStore,
    paths: &[PathBuf],
    verifier: DryRunVerifier,
    mode: BatchMode,
) -> anyhow::Result<MigrationReport> {
    let mut registry = registry::load(&store, paths)?;
    info!(
        wallets = registry.len(),
        mode = ?mode,
        scratch = ?verifier.scratch_dir(),
        "Registry loaded"
    );

    let (sink, rx) = progress::channel();
    let printer = progress::spawn_printer(rx, io::stdout(), ProgressDrawTarget::stderr());

    // The migrator owns the only sink; dropping it with the worker closes the printer
    let migrator = Migrator::new(store, TeeSink(sink, TracingSink)).with_verifier(verifier);
    let report = tokio::task::spawn_blocking(move || match mode {
        BatchMode::VerifyOnly => migrator.verify_batch(&registry),
        BatchMode::Migrate => migrator.migrate_registry(&mut registry),
    })
    .await
    .context("migration worker panicked")?;

    printer
        .await
        .context("progress printer panicked")?
        .context("failed to write progress to stdout")?;

    let failed = report.failed().count();
    if failed > 0 {
        warn!(failed, total = report.len(), "Some wallets need attention");
    }
    println!(
        "{} candidate(s): {} succeeded, {} failed",
        report.len(),
        report.succeeded().count(),
        failed
    );
    Ok(report)
}

/// Write the report as pretty JSON
pub fn write_report(report: &MigrationReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(report).context("failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))?;
    info!(path = %path.display(), "Report written");
    Ok(())
}
