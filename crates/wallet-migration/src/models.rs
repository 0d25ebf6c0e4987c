//! Wallet record models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

/// On-disk encoding of a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletVersion {
    /// Older serialized encoding being phased out
    Legacy,
    /// Newer schema-based encoding
    Structured,
}

impl WalletVersion {
    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Structured => "structured",
        }
    }
}

impl fmt::Display for WalletVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key pair held by a wallet
#[derive(Clone, PartialEq, Eq)]
pub struct StoredKey {
    /// Public key bytes
    pub public_key: Vec<u8>,
    /// Private key bytes (zeroized on drop)
    pub private_key: Vec<u8>,
    /// Creation time (unix seconds)
    pub creation_time: i64,
    /// Optional user label
    pub label: Option<String>,
}

impl fmt::Debug for StoredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredKey")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("creation_time", &self.creation_time)
            .field("label", &self.label)
            .finish()
    }
}

impl Drop for StoredKey {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// Wallet contents round-tripped by the store. The engine never inspects it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletPayload {
    /// Network the wallet belongs to
    pub network: String,
    /// Keys
    pub keys: Vec<StoredKey>,
    /// Last block height seen by the wallet
    pub last_block_height: u64,
}

/// A persisted wallet, identified by its file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRecord {
    /// Wallet file path (identity)
    pub path: PathBuf,
    /// Encoding the wallet is currently stored in
    pub version: WalletVersion,
    /// Display string
    pub description: String,
    /// Set once a pre-migration backup exists; never cleared
    pub backup_path: Option<PathBuf>,
    /// Wallet contents
    pub payload: WalletPayload,
}

impl WalletRecord {
    /// Create a record with an empty payload
    pub fn new(path: impl Into<PathBuf>, version: WalletVersion, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version,
            description: description.into(),
            backup_path: None,
            payload: WalletPayload::default(),
        }
    }

    /// Attach wallet contents
    pub fn with_payload(mut self, payload: WalletPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Wallet file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Description, falling back to the file path when empty
    pub fn display_name(&self) -> String {
        if self.description.is_empty() {
            self.path.display().to_string()
        } else {
            self.description.clone()
        }
    }
}
