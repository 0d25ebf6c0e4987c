//! File store configuration

use std::path::PathBuf;

/// Default wallet file extension
pub const DEFAULT_WALLET_EXTENSION: &str = "wallet";
/// Default sidecar info file extension
pub const DEFAULT_SIDECAR_EXTENSION: &str = "info";

/// Configuration for [`crate::FileWalletStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStoreConfig {
    /// Extension of wallet files picked up by discovery
    pub wallet_extension: String,
    /// Extension of the sidecar info file (replaces the wallet extension)
    pub sidecar_extension: String,
    /// Where backups go. `None` puts them next to the wallet.
    pub backup_dir: Option<PathBuf>,
    /// Re-hash each backup and compare it with the original
    pub verify_backups: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            wallet_extension: DEFAULT_WALLET_EXTENSION.to_string(),
            sidecar_extension: DEFAULT_SIDECAR_EXTENSION.to_string(),
            backup_dir: None,
            verify_backups: true,
        }
    }
}

impl FileStoreConfig {
    /// Send backups to `dir`
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Only discover files with this extension
    pub fn with_wallet_extension(mut self, extension: impl Into<String>) -> Self {
        self.wallet_extension = extension.into();
        self
    }
}
