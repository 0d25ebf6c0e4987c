//! Format detection and candidate selection

use crate::{WalletRecord, WalletVersion};

/// True when the wallet is still stored in the legacy encoding
pub fn is_legacy(record: &WalletRecord) -> bool {
    record.version == WalletVersion::Legacy
}

/// Wallets eligible for migration, in registry order. Pure filter.
pub fn select_candidates(registry: &[WalletRecord]) -> Vec<&WalletRecord> {
    registry.iter().filter(|record| is_legacy(record)).collect()
}
