//! Error types
//!
//! Failures are produced at the store boundary as [`StoreError`], then
//! normalized into [`VerificationFailure`] or [`CommitFailure`] at the
//! verify/commit step boundary. Nothing in this module terminates a batch.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Closed taxonomy of migration failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationErrorKind {
    /// Filesystem failure (copy, temp file, backup)
    Io,
    /// Wallet could not be loaded
    Load,
    /// Wallet could not be saved
    Save,
    /// Store rejected the wallet as being in an invalid state
    InvalidState,
    /// Save/load round trip did not yield the structured version
    FormatMismatch,
    /// Any other failure surfaced by the store
    Unclassified,
}

impl MigrationErrorKind {
    /// Stable short name used in progress lines and logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Io => "IoFailure",
            Self::Load => "LoadFailure",
            Self::Save => "SaveFailure",
            Self::InvalidState => "InvalidState",
            Self::FormatMismatch => "FormatMismatch",
            Self::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for MigrationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors returned by a [`crate::WalletStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Load error
    #[error("Load error: {0}")]
    Load(String),

    /// Save error
    #[error("Save error: {0}")]
    Save(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Anything the store could not classify
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Map onto the migration taxonomy
    pub fn kind(&self) -> MigrationErrorKind {
        match self {
            Self::Io(_) => MigrationErrorKind::Io,
            Self::Load(_) => MigrationErrorKind::Load,
            Self::Save(_) => MigrationErrorKind::Save,
            Self::InvalidState(_) => MigrationErrorKind::InvalidState,
            Self::Other(_) => MigrationErrorKind::Unclassified,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Dry run did not certify the wallet; the original is left as legacy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("verification failed ({kind}): {message}")]
pub struct VerificationFailure {
    /// Failure kind
    pub kind: MigrationErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl VerificationFailure {
    /// Create a failure of the given kind
    pub fn new(kind: MigrationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Round trip persisted something other than the structured encoding
    pub fn format_mismatch(found: crate::WalletVersion) -> Self {
        Self::new(
            MigrationErrorKind::FormatMismatch,
            format!("test copy reloaded as {} instead of structured", found),
        )
    }
}

impl From<StoreError> for VerificationFailure {
    fn from(err: StoreError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<std::io::Error> for VerificationFailure {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err).into()
    }
}

/// Real migration failed; the backup (if one was taken) is the recovery path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("commit failed ({kind}): {message}")]
pub struct CommitFailure {
    /// Failure kind
    pub kind: MigrationErrorKind,
    /// Human-readable detail
    pub message: String,
    /// Backup to restore from. `None` only when the backup step itself failed,
    /// in which case the original was never touched.
    pub backup_path: Option<PathBuf>,
}

impl CommitFailure {
    /// Wrap a store error raised at a point where `backup_path` is known
    pub fn from_store(err: StoreError, backup_path: Option<PathBuf>) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            backup_path,
        }
    }

    /// Reloaded wallet was not in the structured encoding
    pub fn format_mismatch(found: crate::WalletVersion, backup_path: PathBuf) -> Self {
        Self {
            kind: MigrationErrorKind::FormatMismatch,
            message: format!("wallet reloaded as {} instead of structured", found),
            backup_path: Some(backup_path),
        }
    }
}
