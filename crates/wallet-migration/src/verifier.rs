//! Dry-run verification on a disposable copy
//!
//! The original wallet is copied to a uniquely-named temp file, converted to
//! the structured encoding there, and reloaded. The original is only read.
//! The temp copy is released on every exit path, including early failures.

use crate::{VerificationFailure, WalletRecord, WalletStore, WalletVersion};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

const TEMP_PREFIX: &str = "migrate-wallet-";
const TEMP_SUFFIX: &str = ".wallet";

/// Proof that a wallet survived a legacy-to-structured round trip on a copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Original wallet path
    pub path: PathBuf,
}

/// Scratch wallet file owned by a single `verify` call.
///
/// On drop the store is asked to delete the wallet and its sidecar, then the
/// temp path itself is removed if anything is still there.
struct TempCopy<'a, S: WalletStore + ?Sized> {
    store: &'a S,
    path: TempPath,
}

impl<'a, S: WalletStore + ?Sized> TempCopy<'a, S> {
    fn create(store: &'a S, scratch_dir: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(TEMP_SUFFIX);
        let file = match scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(Self {
            store,
            path: file.into_temp_path(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl<S: WalletStore + ?Sized> Drop for TempCopy<'_, S> {
    fn drop(&mut self) {
        let stub = WalletRecord::new(self.path.to_path_buf(), WalletVersion::Legacy, "");
        self.store.delete_wallet_and_sidecar(&stub);
        // `TempPath` removes whatever is left when the field drops
    }
}

/// Runs the migration against a disposable copy
#[derive(Debug, Clone, Default)]
pub struct DryRunVerifier {
    scratch_dir: Option<PathBuf>,
}

impl DryRunVerifier {
    /// Use the system temp directory for scratch copies
    pub fn new() -> Self {
        Self::default()
    }

    /// Put scratch copies in `dir` instead of the system temp directory
    pub fn with_scratch_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: Some(dir.into()),
        }
    }

    /// Scratch directory, if one was configured
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch_dir.as_deref()
    }

    /// Prove that `record` converts to the structured encoding without
    /// touching the original file
    pub fn verify<S: WalletStore + ?Sized>(
        &self,
        store: &S,
        record: &WalletRecord,
    ) -> Result<Verified, VerificationFailure> {
        let temp = TempCopy::create(store, self.scratch_dir.as_deref())?;
        debug!(
            wallet = %record.path.display(),
            temp = %temp.path().display(),
            "Starting dry-run migration"
        );

        let result = round_trip(store, record, temp.path());
        drop(temp);

        match &result {
            Ok(_) => debug!(wallet = %record.path.display(), "Dry-run migration passed"),
            Err(failure) => warn!(
                wallet = %record.path.display(),
                kind = %failure.kind,
                message = %failure.message,
                "Dry-run migration failed"
            ),
        }
        result
    }
}

fn round_trip<S: WalletStore + ?Sized>(
    store: &S,
    record: &WalletRecord,
    temp_path: &Path,
) -> Result<Verified, VerificationFailure> {
    store.copy_file(&record.path, temp_path)?;

    let mut scratch = store.load(temp_path)?;
    scratch.version = WalletVersion::Structured;
    store.save(&scratch, temp_path, true)?;

    let reloaded = store.load(temp_path)?;
    if reloaded.version != WalletVersion::Structured {
        return Err(VerificationFailure::format_mismatch(reloaded.version));
    }

    Ok(Verified {
        path: record.path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fault, MemoryWalletStore, MigrationErrorKind, StoreOp, StoredKey, WalletPayload};
    use tempfile::TempDir;

    fn payload() -> WalletPayload {
        WalletPayload {
            network: "prodnet".to_string(),
            keys: vec![StoredKey {
                public_key: vec![2; 33],
                private_key: vec![7; 32],
                creation_time: 1_325_376_000,
                label: Some("first".to_string()),
            }],
            last_block_height: 210_000,
        }
    }

    fn legacy_store(path: &str) -> (MemoryWalletStore, WalletRecord) {
        let store = MemoryWalletStore::new();
        store.insert(path, WalletVersion::Legacy, "Main", payload());
        let record = store.load(Path::new(path)).unwrap();
        (store, record)
    }

    fn temp_paths(store: &MemoryWalletStore) -> Vec<PathBuf> {
        store
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                StoreOp::Copy { dst, .. } => Some(dst),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_verify_passes_and_cleans_up() {
        let scratch = TempDir::new().unwrap();
        let (store, record) = legacy_store("/wallets/a.wallet");
        let verifier = DryRunVerifier::with_scratch_dir(scratch.path());

        let verified = verifier.verify(&store, &record).unwrap();
        assert_eq!(verified.path, PathBuf::from("/wallets/a.wallet"));

        // Original untouched
        let original = store.file(Path::new("/wallets/a.wallet")).unwrap();
        assert_eq!(original.version, WalletVersion::Legacy);
        assert_eq!(original.payload, payload());

        // Temp copy gone from the store and from disk
        let temps = temp_paths(&store);
        assert_eq!(temps.len(), 1);
        assert!(temps[0].starts_with(scratch.path()));
        assert!(!store.contains(&temps[0]));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_verify_saves_temp_with_forced_structured() {
        let scratch = TempDir::new().unwrap();
        let (store, record) = legacy_store("/wallets/a.wallet");
        DryRunVerifier::with_scratch_dir(scratch.path())
            .verify(&store, &record)
            .unwrap();

        let temp = temp_paths(&store).remove(0);
        assert!(store.saw(|op| *op == StoreOp::Save { path: temp.clone(), structured: true }));
        assert!(!store.saw(|op| matches!(op, StoreOp::Save { path, .. } if path == Path::new("/wallets/a.wallet"))));
    }

    #[test]
    fn test_broken_encoder_is_format_mismatch() {
        let scratch = TempDir::new().unwrap();
        let (store, record) = legacy_store("/wallets/a.wallet");
        store.inject(Fault::WritesLegacy);

        let failure = DryRunVerifier::with_scratch_dir(scratch.path())
            .verify(&store, &record)
            .unwrap_err();
        assert_eq!(failure.kind, MigrationErrorKind::FormatMismatch);
        assert_eq!(
            store.file(Path::new("/wallets/a.wallet")).unwrap().version,
            WalletVersion::Legacy
        );
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_each_failure_kind_still_cleans_up() {
        let cases = [
            (Fault::CopyFrom(PathBuf::from("/wallets/a.wallet")), MigrationErrorKind::Io),
            (Fault::LoadAlways, MigrationErrorKind::Load),
            (Fault::SaveAlways, MigrationErrorKind::Save),
            (Fault::InvalidStateOnSave, MigrationErrorKind::InvalidState),
            (Fault::LoadUnclassified, MigrationErrorKind::Unclassified),
        ];

        for (fault, expected) in cases {
            let scratch = TempDir::new().unwrap();
            let (store, record) = legacy_store("/wallets/a.wallet");
            store.inject(fault);

            let failure = DryRunVerifier::with_scratch_dir(scratch.path())
                .verify(&store, &record)
                .unwrap_err();
            assert_eq!(failure.kind, expected);

            assert_eq!(store.paths(), vec![PathBuf::from("/wallets/a.wallet")]);
            assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
            assert!(store.saw(|op| matches!(op, StoreOp::Delete(_))));
        }
    }

    #[test]
    fn test_missing_scratch_dir_is_io_failure() {
        let (store, record) = legacy_store("/wallets/a.wallet");
        let failure = DryRunVerifier::with_scratch_dir("/definitely/not/here")
            .verify(&store, &record)
            .unwrap_err();
        assert_eq!(failure.kind, MigrationErrorKind::Io);
        assert!(store.ops().is_empty());
    }
}
