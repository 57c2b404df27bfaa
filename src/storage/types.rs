use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Ledger storage errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Reading, writing or renaming the ledger file failed
    #[error("Ledger I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger file exists but is not a valid ledger
    #[error("Ledger file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the in-memory ledger failed
    #[error("Failed to encode ledger: {0}")]
    Encode(#[from] serde_json::Error),

    /// The ledger key cannot be used as a file name
    #[error("Invalid ledger key: {0:?}")]
    InvalidKey(String),
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// On-disk format
// ============================================================================

/// Serialized form of a ledger: ids in the order they were submitted.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct LedgerFile {
    pub submitted: Vec<String>,
}
