//! Error types for the precursor ledger

use std::path::PathBuf;
use thiserror::Error;

/// Host-level failures. Validation and load outcomes have their own types
/// because callers are expected to recover from them.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Chain tip or pending pool changed while mining")]
    StaleTip,
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<LoadError> for ChainError {
    fn from(err: LoadError) -> Self {
        ChainError::PersistenceError(err.to_string())
    }
}

/// Reasons a stored chain could not be loaded. The in-memory chain is left
/// untouched in every case.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no chain data found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("chain data is malformed: {0}")]
    Parse(String),
    #[error("failed to read chain data: {0}")]
    Io(String),
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

/// First check that failed while walking the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("block #{index} has been tampered with (hash mismatch)")]
    HashMismatch { index: u64 },
    #[error("block #{index} does not link correctly to the previous block")]
    LinkMismatch { index: u64 },
    #[error("block #{index} failed proof-of-work verification")]
    PowUnsatisfied { index: u64 },
}

impl ValidationFailure {
    /// Index of the offending block.
    pub fn index(&self) -> u64 {
        match self {
            ValidationFailure::HashMismatch { index }
            | ValidationFailure::LinkMismatch { index }
            | ValidationFailure::PowUnsatisfied { index } => *index,
        }
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
