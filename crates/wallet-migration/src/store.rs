//! Wallet store adapter contract
//!
//! The legacy and structured encodings are owned by the store. The engine's
//! only contract with them is the [`WalletVersion`](crate::WalletVersion)
//! flag it can read back after a save/load round trip.

use crate::{StoreResult, WalletRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loads, saves, copies, deletes and backs up wallet files
pub trait WalletStore {
    /// Load a wallet from `path`. The returned record's `version` reflects
    /// the encoding actually found on disk.
    fn load(&self, path: &Path) -> StoreResult<WalletRecord>;

    /// Save `record` to `path`. When `force_structured` is set the store must
    /// write the structured encoding regardless of `record.version`.
    fn save(&self, record: &WalletRecord, path: &Path, force_structured: bool) -> StoreResult<()>;

    /// Copy the raw wallet bytes from `src` to `dst`
    fn copy_file(&self, src: &Path, dst: &Path) -> StoreResult<()>;

    /// Remove the wallet file and any sidecar info. Best effort: failures are
    /// logged by the store and never surfaced.
    fn delete_wallet_and_sidecar(&self, record: &WalletRecord);

    /// Copy the wallet to a sibling backup location and return its path
    fn backup(&self, record: &WalletRecord) -> StoreResult<PathBuf>;
}

impl<S: WalletStore + ?Sized> WalletStore for &S {
    fn load(&self, path: &Path) -> StoreResult<WalletRecord> {
        (**self).load(path)
    }

    fn save(&self, record: &WalletRecord, path: &Path, force_structured: bool) -> StoreResult<()> {
        (**self).save(record, path, force_structured)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> StoreResult<()> {
        (**self).copy_file(src, dst)
    }

    fn delete_wallet_and_sidecar(&self, record: &WalletRecord) {
        (**self).delete_wallet_and_sidecar(record)
    }

    fn backup(&self, record: &WalletRecord) -> StoreResult<PathBuf> {
        (**self).backup(record)
    }
}

impl<S: WalletStore + ?Sized> WalletStore for Arc<S> {
    fn load(&self, path: &Path) -> StoreResult<WalletRecord> {
        (**self).load(path)
    }

    fn save(&self, record: &WalletRecord, path: &Path, force_structured: bool) -> StoreResult<()> {
        (**self).save(record, path, force_structured)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> StoreResult<()> {
        (**self).copy_file(src, dst)
    }

    fn delete_wallet_and_sidecar(&self, record: &WalletRecord) {
        (**self).delete_wallet_and_sidecar(record)
    }

    fn backup(&self, record: &WalletRecord) -> StoreResult<PathBuf> {
        (**self).backup(record)
    }
}
