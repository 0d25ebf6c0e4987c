//! Filesystem implementation of the wallet store contract

use crate::backup;
use crate::codec;
use crate::config::FileStoreConfig;
use crate::sidecar::{self, WalletInfo};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use wallet_migration::{StoreError, StoreResult, WalletRecord, WalletStore, WalletVersion};

/// Wallet store backed by files on disk
#[derive(Debug, Clone, Default)]
pub struct FileWalletStore {
    config: FileStoreConfig,
}

impl FileWalletStore {
    /// Create store
    pub fn new(config: FileStoreConfig) -> Self {
        Self { config }
    }

    /// Store configuration
    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    /// Sidecar info path for `wallet`
    pub fn sidecar_path(&self, wallet: &Path) -> PathBuf {
        sidecar::sidecar_path(wallet, &self.config.sidecar_extension)
    }

    /// Load every wallet file in `dir` into a registry, sorted by path.
    /// Files that fail to load are logged and left out.
    pub fn discover(&self, dir: &Path) -> StoreResult<Vec<WalletRecord>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && self.is_wallet_file(path))
            .collect();
        paths.sort();

        let mut registry = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load(&path) {
                Ok(record) => registry.push(record),
                Err(e) => warn!(wallet = %path.display(), error = %e, "Skipping unreadable wallet"),
            }
        }
        debug!(dir = %dir.display(), wallets = registry.len(), "Discovered wallets");
        Ok(registry)
    }

    fn is_wallet_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy() == self.config.wallet_extension.as_str())
            .unwrap_or(false)
    }

    fn default_description(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn backup_dir_for(&self, wallet: &Path) -> PathBuf {
        match &self.config.backup_dir {
            Some(dir) => dir.clone(),
            None => parent_dir(wallet).to_path_buf(),
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write via a temp file in the same directory, then rename over `path`.
/// An existing file keeps its permissions; a new one is owner-only.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(bytes)?;
    match fs::metadata(path) {
        Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Open `path` for writing without loosening its mode. Files created here
/// are owner-only on Unix.
fn open_private(path: &Path) -> io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

impl WalletStore for FileWalletStore {
    fn load(&self, path: &Path) -> StoreResult<WalletRecord> {
        let bytes = fs::read(path)?;
        let (version, payload) = codec::decode(&bytes)
            .map_err(|e| StoreError::Load(format!("{}: {}", path.display(), e)))?;

        let info = sidecar::read(&self.sidecar_path(path))
            .map_err(|e| StoreError::Load(format!("sidecar for {}: {}", path.display(), e)))?;

        let (description, backup_path) = match info {
            Some(info) => {
                if info.version != version {
                    warn!(
                        wallet = %path.display(),
                        sidecar = %info.version,
                        detected = %version,
                        "Sidecar version disagrees with file contents, using file contents"
                    );
                }
                (info.description, info.backup_path)
            }
            None => (Self::default_description(path), None),
        };

        debug!(wallet = %path.display(), version = %version, keys = payload.keys.len(), "Loaded wallet");
        Ok(WalletRecord {
            path: path.to_path_buf(),
            version,
            description,
            backup_path,
            payload,
        })
    }

    fn save(&self, record: &WalletRecord, path: &Path, force_structured: bool) -> StoreResult<()> {
        if record.payload.keys.is_empty() {
            return Err(StoreError::InvalidState(format!(
                "refusing to save {} with no keys",
                path.display()
            )));
        }

        let version = if force_structured {
            WalletVersion::Structured
        } else {
            record.version
        };
        let bytes = codec::encode(&record.payload, version)
            .map_err(|e| StoreError::Save(format!("{}: {}", path.display(), e)))?;
        write_atomic(path, &bytes)
            .map_err(|e| StoreError::Save(format!("{}: {}", path.display(), e)))?;

        let info = WalletInfo {
            description: record.description.clone(),
            version,
            backup_path: record.backup_path.clone(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        let sidecar = self.sidecar_path(path);
        sidecar::to_bytes(&info)
            .and_then(|bytes| write_atomic(&sidecar, &bytes))
            .map_err(|e| StoreError::Save(format!("sidecar {}: {}", sidecar.display(), e)))?;

        debug!(wallet = %path.display(), version = %version, "Saved wallet");
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> StoreResult<()> {
        // Copy the bytes only; `fs::copy` would also carry over the source mode
        let mut reader = fs::File::open(src)?;
        let mut writer = open_private(dst)?;
        io::copy(&mut reader, &mut writer)?;
        writer.sync_all()?;
        Ok(())
    }

    fn delete_wallet_and_sidecar(&self, record: &WalletRecord) {
        for path in [record.path.clone(), self.sidecar_path(&record.path)] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Deleted"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete"),
            }
        }
    }

    fn backup(&self, record: &WalletRecord) -> StoreResult<PathBuf> {
        let dir = self.backup_dir_for(&record.path);
        fs::create_dir_all(&dir)?;

        let plan = backup::plan(
            &record.path,
            &dir,
            &self.config.sidecar_extension,
            &backup::timestamp(),
        );
        backup::copy_verified(&record.path, &plan.wallet, self.config.verify_backups)?;

        let sidecar = self.sidecar_path(&record.path);
        if sidecar.exists() {
            backup::copy_verified(&sidecar, &plan.sidecar, self.config.verify_backups)?;
        }

        info!(
            wallet = %record.path.display(),
            backup = %plan.wallet.display(),
            "Wallet backed up"
        );
        Ok(plan.wallet)
    }
}
