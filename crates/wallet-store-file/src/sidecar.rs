//! Sidecar info file stored next to each wallet

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use wallet_migration::WalletVersion;

/// Contents of `<wallet>.info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    /// Display string
    pub description: String,
    /// Encoding last written by the store
    pub version: WalletVersion,
    /// Pre-migration backup, once one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    /// RFC 3339 timestamp of the last write
    pub updated_at: String,
}

/// Sidecar path for a wallet: same stem, sidecar extension
pub fn sidecar_path(wallet: &Path, extension: &str) -> PathBuf {
    wallet.with_extension(extension)
}

/// Read the sidecar, `Ok(None)` if it does not exist
pub fn read(path: &Path) -> io::Result<Option<WalletInfo>> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Serialize the sidecar
pub fn to_bytes(info: &WalletInfo) -> io::Result<Vec<u8>> {
    serde_json::to_vec_pretty(info).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
