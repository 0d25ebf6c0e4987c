//! Real migration of the original wallet file
//!
//! Backup first, then convert in place, then reload. The executor trusts its
//! caller to have obtained a passing dry run for the same record; it does
//! not re-verify and it never rolls back. On failure the backup is the
//! recovery path.

use crate::{CommitFailure, WalletRecord, WalletStore, WalletVersion};
use std::path::PathBuf;
use tracing::{error, info};

/// A wallet now stored in the structured encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    /// Wallet path
    pub path: PathBuf,
    /// Backup of the pre-migration file
    pub backup_path: PathBuf,
}

/// Performs backup-then-convert-then-reload on the original file
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitExecutor;

impl CommitExecutor {
    /// Create executor
    pub fn new() -> Self {
        Self
    }

    /// Migrate `record` in place.
    ///
    /// `record.backup_path` is set as soon as the backup exists, before the
    /// original is overwritten. `record.version` becomes `Structured` only
    /// once the reloaded file confirms it; on any failure it stays `Legacy`.
    pub fn commit<S: WalletStore + ?Sized>(
        &self,
        store: &S,
        record: &mut WalletRecord,
    ) -> Result<Committed, CommitFailure> {
        let backup_path = store
            .backup(record)
            .map_err(|e| CommitFailure::from_store(e, None))?;
        record.backup_path = Some(backup_path.clone());
        info!(
            wallet = %record.path.display(),
            backup = %backup_path.display(),
            "Backed up legacy wallet"
        );

        let mut converted = record.clone();
        converted.version = WalletVersion::Structured;

        let result = store
            .save(&converted, &record.path, true)
            .and_then(|()| store.load(&record.path))
            .map_err(|e| CommitFailure::from_store(e, Some(backup_path.clone())))
            .and_then(|reloaded| {
                if reloaded.version == WalletVersion::Structured {
                    Ok(())
                } else {
                    Err(CommitFailure::format_mismatch(reloaded.version, backup_path.clone()))
                }
            });

        match result {
            Ok(()) => {
                record.version = WalletVersion::Structured;
                info!(wallet = %record.path.display(), "Wallet migrated to structured encoding");
                Ok(Committed {
                    path: record.path.clone(),
                    backup_path,
                })
            }
            Err(failure) => {
                error!(
                    wallet = %record.path.display(),
                    backup = %backup_path.display(),
                    kind = %failure.kind,
                    message = %failure.message,
                    "Wallet migration failed, backup must be reused"
                );
                Err(failure)
            }
        }
    }
}
