//! End-to-end migration over real wallet files

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wallet_migration::{
    DryRunVerifier, MemorySink, MigrationErrorKind, MigrationPhase, Migrator, StoreError,
    StoreResult, StoredKey, WalletPayload, WalletRecord, WalletStore, WalletVersion,
};
use wallet_store_file::{encode, FileStoreConfig, FileWalletStore, STRUCTURED_MAGIC};

fn payload(seed: u8) -> WalletPayload {
    WalletPayload {
        network: "prodnet".to_string(),
        keys: vec![
            StoredKey {
                public_key: vec![seed; 33],
                private_key: vec![seed ^ 0x5a; 32],
                creation_time: 1_320_000_000 + seed as i64,
                label: Some(format!("key-{}", seed)),
            },
            StoredKey {
                public_key: vec![seed.wrapping_add(1); 65],
                private_key: vec![seed ^ 0xa5; 32],
                creation_time: 1_330_000_000,
                label: None,
            },
        ],
        last_block_height: 200_000 + seed as u64,
    }
}

fn write_wallet(dir: &Path, name: &str, version: WalletVersion, seed: u8) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, encode(&payload(seed), version).unwrap()).unwrap();
    path
}

fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

fn names_ending_with(dir: &Path, suffix: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(suffix))
        .collect();
    names.sort();
    names
}

#[test]
fn test_migrates_legacy_wallets_on_disk() {
    let wallets = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let a = write_wallet(wallets.path(), "a.wallet", WalletVersion::Legacy, 1);
    let b = write_wallet(wallets.path(), "b.wallet", WalletVersion::Structured, 2);
    let original_a = fs::read(&a).unwrap();
    let original_b = fs::read(&b).unwrap();

    let store = FileWalletStore::default();
    let mut registry = store.discover(wallets.path()).unwrap();
    assert_eq!(registry.len(), 2);

    let sink = MemorySink::new();
    let migrator = Migrator::new(&store, &sink)
        .with_verifier(DryRunVerifier::with_scratch_dir(scratch.path()));
    let report = migrator.migrate_registry(&mut registry);

    assert_eq!(report.len(), 1);
    assert!(!report.had_failures());
    let outcome = report.outcome_for(&a).unwrap();
    assert!(outcome.succeeded());
    assert_eq!(outcome.phase(), MigrationPhase::Commit);

    // Converted in place, keys intact
    let bytes = fs::read(&a).unwrap();
    assert!(bytes.starts_with(STRUCTURED_MAGIC));
    let reloaded = store.load(&a).unwrap();
    assert_eq!(reloaded.version, WalletVersion::Structured);
    assert_eq!(reloaded.payload, payload(1));

    // Backup holds the original bytes and is recorded in the sidecar
    let backup = outcome.backup_path().unwrap().to_path_buf();
    assert_eq!(fs::read(&backup).unwrap(), original_a);
    assert_eq!(reloaded.backup_path.as_deref(), Some(backup.as_path()));
    assert_eq!(registry[0].version, WalletVersion::Structured);
    assert_eq!(registry[0].backup_path.as_deref(), Some(backup.as_path()));

    // Structured wallet untouched, scratch cleaned up
    assert_eq!(fs::read(&b).unwrap(), original_b);
    assert!(dir_is_empty(scratch.path()));

    assert!(sink.contains("Wallet 'a' is legacy - needs migrating."));
    assert!(sink.contains("Migration of wallet 'a' to structured was successful."));
    assert!(!sink.contains("bug report"));
}

#[test]
fn test_rediscovery_ignores_backups_and_sidecars() {
    let wallets = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    write_wallet(wallets.path(), "a.wallet", WalletVersion::Legacy, 1);

    let store = FileWalletStore::default();
    let mut registry = store.discover(wallets.path()).unwrap();
    Migrator::new(&store, MemorySink::new())
        .with_verifier(DryRunVerifier::with_scratch_dir(scratch.path()))
        .migrate_registry(&mut registry);

    assert_eq!(names_ending_with(wallets.path(), ".wallet.bak").len(), 1);
    assert_eq!(names_ending_with(wallets.path(), ".info"), vec!["a.info"]);

    let registry = store.discover(wallets.path()).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry[0].version, WalletVersion::Structured);

    // Nothing left to migrate on a second pass
    let mut registry = registry;
    let report = Migrator::new(&store, MemorySink::new())
        .with_verifier(DryRunVerifier::with_scratch_dir(scratch.path()))
        .migrate_registry(&mut registry);
    assert!(report.is_empty());
}

#[test]
fn test_backups_go_to_configured_dir() {
    let wallets = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let backups = wallets.path().join("backups");
    write_wallet(wallets.path(), "a.wallet", WalletVersion::Legacy, 3);

    let store = FileWalletStore::new(FileStoreConfig::default().with_backup_dir(&backups));
    let mut registry = store.discover(wallets.path()).unwrap();
    let report = Migrator::new(&store, MemorySink::new())
        .with_verifier(DryRunVerifier::with_scratch_dir(scratch.path()))
        .migrate_registry(&mut registry);

    let backup = report.outcomes()[0].backup_path().unwrap();
    assert!(backup.starts_with(&backups));
    assert!(names_ending_with(wallets.path(), ".bak").is_empty());
}

#[test]
fn test_verify_batch_leaves_files_alone() {
    let wallets = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let a = write_wallet(wallets.path(), "a.wallet", WalletVersion::Legacy, 4);
    let original = fs::read(&a).unwrap();

    let store = FileWalletStore::default();
    let registry = store.discover(wallets.path()).unwrap();
    let sink = MemorySink::new();
    let report = Migrator::new(&store, &sink)
        .with_verifier(DryRunVerifier::with_scratch_dir(scratch.path()))
        .verify_batch(&registry);

    assert_eq!(report.len(), 1);
    assert!(report.outcomes()[0].succeeded());
    assert_eq!(report.outcomes()[0].phase(), MigrationPhase::Verify);
    assert_eq!(fs::read(&a).unwrap(), original);
    assert!(names_ending_with(wallets.path(), ".bak").is_empty());
    assert!(dir_is_empty(scratch.path()));
    assert!(sink.contains("Test migration of wallet 'a' to structured was successful."));
}

/// File store whose structured encoder is broken: saves always write legacy bytes
struct LegacyOnlyStore(FileWalletStore);

impl WalletStore for LegacyOnlyStore {
    fn load(&self, path: &Path) -> StoreResult<WalletRecord> {
        self.0.load(path)
    }

    fn save(&self, record: &WalletRecord, path: &Path, _force_structured: bool) -> StoreResult<()> {
        let mut legacy = record.clone();
        legacy.version = WalletVersion::Legacy;
        self.0.save(&legacy, path, false)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> StoreResult<()> {
        self.0.copy_file(src, dst)
    }

    fn delete_wallet_and_sidecar(&self, record: &WalletRecord) {
        self.0.delete_wallet_and_sidecar(record)
    }

    fn backup(&self, record: &WalletRecord) -> StoreResult<PathBuf> {
        self.0.backup(record)
    }
}

#[test]
fn test_broken_encoder_never_touches_originals() {
    let wallets = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let a = write_wallet(wallets.path(), "a.wallet", WalletVersion::Legacy, 5);
    let original = fs::read(&a).unwrap();

    let store = LegacyOnlyStore(FileWalletStore::default());
    let mut registry = store.0.discover(wallets.path()).unwrap();
    let sink = MemorySink::new();
    let report = Migrator::new(&store, &sink)
        .with_verifier(DryRunVerifier::with_scratch_dir(scratch.path()))
        .migrate_registry(&mut registry);

    assert!(report.had_failures());
    let outcome = report.outcome_for(&a).unwrap();
    assert_eq!(outcome.phase(), MigrationPhase::Verify);
    assert_eq!(outcome.error_kind(), Some(MigrationErrorKind::FormatMismatch));

    assert_eq!(fs::read(&a).unwrap(), original);
    assert_eq!(registry[0].version, WalletVersion::Legacy);
    assert!(names_ending_with(wallets.path(), ".bak").is_empty());
    assert!(dir_is_empty(scratch.path()));
    assert!(sink.contains("Leaving wallet as 'legacy'"));
    assert!(!sink.contains("The error was"));
    assert!(sink.contains("bug report"));
}

/// Store whose backups always fail
struct NoBackupStore(FileWalletStore);

impl WalletStore for NoBackupStore {
    fn load(&self, path: &Path) -> StoreResult<WalletRecord> {
        self.0.load(path)
    }

    fn save(&self, record: &WalletRecord, path: &Path, force_structured: bool) -> StoreResult<()> {
        self.0.save(record, path, force_structured)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> StoreResult<()> {
        self.0.copy_file(src, dst)
    }

    fn delete_wallet_and_sidecar(&self, record: &WalletRecord) {
        self.0.delete_wallet_and_sidecar(record)
    }

    fn backup(&self, _record: &WalletRecord) -> StoreResult<PathBuf> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "backup volume is read-only",
        )))
    }
}

#[test]
fn test_failed_backup_keeps_original() {
    let wallets = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let a = write_wallet(wallets.path(), "a.wallet", WalletVersion::Legacy, 6);
    let original = fs::read(&a).unwrap();

    let store = NoBackupStore(FileWalletStore::default());
    let mut registry = store.0.discover(wallets.path()).unwrap();
    let sink = MemorySink::new();
    let report = Migrator::new(&store, &sink)
        .with_verifier(DryRunVerifier::with_scratch_dir(scratch.path()))
        .migrate_registry(&mut registry);

    let outcome = report.outcome_for(&a).unwrap();
    assert!(!outcome.succeeded());
    assert_eq!(outcome.phase(), MigrationPhase::Commit);
    assert_eq!(outcome.error_kind(), Some(MigrationErrorKind::Io));
    assert_eq!(outcome.backup_path(), None);
    assert_eq!(fs::read(&a).unwrap(), original);
    assert!(sink.contains("No backup could be made"));
}
