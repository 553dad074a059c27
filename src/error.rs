//! Error types for chainproof
//!
//! Store failures and proof-decoding failures are kept in separate enums so
//! that an operational fault can never be mistaken for a failed proof.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the batch block store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is truncated: expected at least {expected} bytes, got {actual}", path.display())]
    Truncated {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("block with given height ({height}) is not present in batch file ({available} blocks written)")]
    OutOfRange { height: u64, available: usize },

    #[error("block with given height ({height}) is beyond chain height ({chain_height})")]
    BeyondChainHeight { height: u64, chain_height: u64 },

    #[error("corrupt block at offset {offset}: {reason}")]
    CorruptBlock { offset: u64, reason: String },

    #[error("batch size must be greater than zero")]
    InvalidBatchSize,
}

impl StoreError {
    /// True for missing, unreadable or truncated files.
    pub fn is_io(&self) -> bool {
        matches!(self, StoreError::Io { .. } | StoreError::Truncated { .. })
    }

    /// True when the requested height has not been written.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            StoreError::OutOfRange { .. } | StoreError::BeyondChainHeight { .. }
        )
    }
}

/// Errors raised while decoding externally supplied proof data.
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("hash must be 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error("malformed proof: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias used by the store
pub type Result<T> = std::result::Result<T, StoreError>;
