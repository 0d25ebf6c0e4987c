//! In-memory wallet store for tests
//!
//! Files are kept as decoded [`StoredWallet`] entries keyed by path. Every
//! call is appended to an operation log so tests can assert ordering, and
//! [`Fault`]s can be injected to drive each failure path.

#![allow(missing_docs)]

use crate::{StoreError, StoreResult, WalletPayload, WalletRecord, WalletStore, WalletVersion};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What a "file" in the memory store holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredWallet {
    pub version: WalletVersion,
    pub description: String,
    pub backup_path: Option<PathBuf>,
    pub payload: WalletPayload,
}

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Load(PathBuf),
    Save { path: PathBuf, structured: bool },
    Copy { src: PathBuf, dst: PathBuf },
    Delete(PathBuf),
    Backup { src: PathBuf, dst: PathBuf },
}

/// Injected failure or misbehavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// `copy_file` from this source fails with an IO error
    CopyFrom(PathBuf),
    /// Every `load` fails
    LoadAlways,
    /// Every `load` fails with an unclassified error
    LoadUnclassified,
    /// Every `save` fails
    SaveAlways,
    /// `save` to this exact path fails
    SaveTo(PathBuf),
    /// Every `save` reports an invalid state
    InvalidStateOnSave,
    /// Every `save` persists the legacy encoding whatever was requested
    WritesLegacy,
    /// `save` to this exact path persists the legacy encoding
    WritesLegacyTo(PathBuf),
    /// Every `backup` fails
    BackupFails,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<PathBuf, StoredWallet>,
    ops: Vec<StoreOp>,
    faults: Vec<Fault>,
    backups_taken: u32,
}

impl Inner {
    fn has(&self, fault: &Fault) -> bool {
        self.faults.contains(fault)
    }
}

/// Scripted in-memory [`WalletStore`]
#[derive(Debug, Default)]
pub struct MemoryWalletStore {
    inner: Mutex<Inner>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a wallet "file" at `path`
    pub fn insert(&self, path: impl Into<PathBuf>, version: WalletVersion, description: &str, payload: WalletPayload) {
        self.inner.lock().files.insert(
            path.into(),
            StoredWallet {
                version,
                description: description.to_string(),
                backup_path: None,
                payload,
            },
        );
    }

    /// Put a file for `record` as it currently is
    pub fn insert_record(&self, record: &WalletRecord) {
        self.insert(
            record.path.clone(),
            record.version,
            &record.description,
            record.payload.clone(),
        );
    }

    pub fn inject(&self, fault: Fault) {
        self.inner.lock().faults.push(fault);
    }

    pub fn file(&self, path: &Path) -> Option<StoredWallet> {
        self.inner.lock().files.get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.lock().files.contains_key(path)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.inner.lock().files.keys().cloned().collect()
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.inner.lock().ops.clone()
    }

    /// True if any recorded op matches
    pub fn saw(&self, pred: impl Fn(&StoreOp) -> bool) -> bool {
        self.inner.lock().ops.iter().any(pred)
    }
}

impl WalletStore for MemoryWalletStore {
    fn load(&self, path: &Path) -> StoreResult<WalletRecord> {
        let mut inner = self.inner.lock();
        inner.ops.push(StoreOp::Load(path.to_path_buf()));

        if inner.has(&Fault::LoadAlways) {
            return Err(StoreError::Load(format!("cannot parse {}", path.display())));
        }
        if inner.has(&Fault::LoadUnclassified) {
            return Err(StoreError::Other("unexpected store failure".to_string()));
        }

        let stored = inner
            .files
            .get(path)
            .ok_or_else(|| StoreError::Load(format!("no wallet at {}", path.display())))?;

        Ok(WalletRecord {
            path: path.to_path_buf(),
            version: stored.version,
            description: stored.description.clone(),
            backup_path: stored.backup_path.clone(),
            payload: stored.payload.clone(),
        })
    }

    fn save(&self, record: &WalletRecord, path: &Path, force_structured: bool) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let structured = force_structured || record.version == WalletVersion::Structured;
        inner.ops.push(StoreOp::Save {
            path: path.to_path_buf(),
            structured,
        });

        if inner.has(&Fault::SaveAlways) || inner.has(&Fault::SaveTo(path.to_path_buf())) {
            return Err(StoreError::Save(format!("cannot write {}", path.display())));
        }
        if inner.has(&Fault::InvalidStateOnSave) {
            return Err(StoreError::InvalidState("wallet is busy".to_string()));
        }

        let writes_legacy =
            inner.has(&Fault::WritesLegacy) || inner.has(&Fault::WritesLegacyTo(path.to_path_buf()));
        let version = if structured && !writes_legacy {
            WalletVersion::Structured
        } else {
            WalletVersion::Legacy
        };

        inner.files.insert(
            path.to_path_buf(),
            StoredWallet {
                version,
                description: record.description.clone(),
                backup_path: record.backup_path.clone(),
                payload: record.payload.clone(),
            },
        );
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.ops.push(StoreOp::Copy {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
        });

        if inner.has(&Fault::CopyFrom(src.to_path_buf())) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("cannot read {}", src.display()),
            )));
        }

        let file = inner.files.get(src).cloned().ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", src.display()),
            ))
        })?;
        inner.files.insert(dst.to_path_buf(), file);
        Ok(())
    }

    fn delete_wallet_and_sidecar(&self, record: &WalletRecord) {
        let mut inner = self.inner.lock();
        inner.ops.push(StoreOp::Delete(record.path.clone()));
        inner.files.remove(&record.path);
    }

    fn backup(&self, record: &WalletRecord) -> StoreResult<PathBuf> {
        let mut inner = self.inner.lock();
        inner.backups_taken += 1;
        let mut name = record.path.clone().into_os_string();
        name.push(format!(".{}.bak", inner.backups_taken));
        let dst = PathBuf::from(name);
        inner.ops.push(StoreOp::Backup {
            src: record.path.clone(),
            dst: dst.clone(),
        });

        if inner.has(&Fault::BackupFails) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "backup volume unavailable",
            )));
        }

        let file = inner.files.get(&record.path).cloned().ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", record.path.display()),
            ))
        })?;
        inner.files.insert(dst.clone(), file);
        Ok(dst)
    }
}
