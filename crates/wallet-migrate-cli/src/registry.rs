//! Builds the wallet registry from command-line paths

use anyhow::Context;
use std::collections::HashSet;
use std::path::PathBuf;
use wallet_migration::{WalletRecord, WalletStore};
use wallet_store_file::FileWalletStore;

/// Load every wallet named by `paths`. Directories are discovered, files are
/// loaded directly. A wallet named twice is kept once, at its first position.
pub fn load(store: &FileWalletStore, paths: &[PathBuf]) -> anyhow::Result<Vec<WalletRecord>> {
    let mut registry = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = store
                .discover(path)
                .with_context(|| format!("failed to read wallet directory {}", path.display()))?;
            registry.extend(found);
        } else {
            let record = store
                .load(path)
                .with_context(|| format!("failed to load wallet {}", path.display()))?;
            registry.push(record);
        }
    }

    let mut seen = HashSet::new();
    registry.retain(|record| seen.insert(record.path.clone()));
    Ok(registry)
}
