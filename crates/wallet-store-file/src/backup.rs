//! Pre-migration backups
//!
//! Backups are named `<stem>-<YYYYMMDDHHMMSS>.<ext>.bak`, with a numeric
//! suffix when two backups land in the same second. The `.bak` suffix keeps
//! them out of wallet discovery.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Backup locations for a wallet and its sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    /// Wallet backup path
    pub wallet: PathBuf,
    /// Sidecar backup path
    pub sidecar: PathBuf,
}

/// Current UTC time formatted for backup names
pub fn timestamp() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// Pick unused backup paths in `backup_dir`
pub fn plan(
    wallet: &Path,
    backup_dir: &Path,
    sidecar_extension: &str,
    stamp: &str,
) -> BackupPlan {
    let stem = wallet
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "wallet".to_string());
    let extension = wallet
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "wallet".to_string());

    let mut attempt = 0u32;
    loop {
        let base = if attempt == 0 {
            format!("{}-{}", stem, stamp)
        } else {
            format!("{}-{}-{}", stem, stamp, attempt)
        };
        let candidate = BackupPlan {
            wallet: backup_dir.join(format!("{}.{}.bak", base, extension)),
            sidecar: backup_dir.join(format!("{}.{}.bak", base, sidecar_extension)),
        };
        if !candidate.wallet.exists() && !candidate.sidecar.exists() {
            return candidate;
        }
        attempt += 1;
    }
}

/// Hex SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Copy `src` to `dst`; when `verify` is set, fail unless the copy hashes
/// identically to the source
pub fn copy_verified(src: &Path, dst: &Path, verify: bool) -> io::Result<()> {
    fs::copy(src, dst)?;
    if verify {
        let expected = sha256_file(src)?;
        let actual = sha256_file(dst)?;
        if expected != actual {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "backup {} does not match {} (sha256 {} != {})",
                    dst.display(),
                    src.display(),
                    actual,
                    expected
                ),
            ));
        }
    }
    Ok(())
}
