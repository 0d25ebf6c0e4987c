//! Filesystem wallet store
//!
//! Implements the migration engine's [`WalletStore`](wallet_migration::WalletStore)
//! contract over plain files:
//!
//! - **Legacy encoding**: JSON document with hex-encoded keys
//! - **Structured encoding**: `WLT2` magic followed by a protobuf message
//! - **Sidecar info**: `<wallet>.info` JSON holding description, version and backup path
//! - **Backups**: timestamped `.bak` siblings, SHA-256 checked after copying

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backup;
pub mod codec;
pub mod config;
pub mod proto;
pub mod sidecar;
pub mod store;

pub use codec::{decode, encode, CodecError, STRUCTURED_MAGIC};
pub use config::FileStoreConfig;
pub use sidecar::WalletInfo;
pub use store::FileWalletStore;
