//! Chain persistence
//!
//! The chain is stored as a pretty-printed JSON array with one record per
//! block: `index`, `timestamp`, `transactions`, `previous_hash`, `nonce` and
//! `hash`. Decoding recomputes every hash; see [`Block`].

use crate::blockchain::Block;
use crate::error::{ChainError, LoadError};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::info;

/// Abstraction for persistence backends. Saving replaces the whole stored
/// chain; loading never mutates anything.
pub trait Persistence: Send + Sync {
    fn save_chain(&self, blocks: &[Block]) -> Result<(), ChainError>;
    fn load_chain(&self) -> Result<Vec<Block>, LoadError>;
}

/// Pretty-print `blocks` with four-space indentation.
pub fn encode_chain(blocks: &[Block]) -> Result<Vec<u8>, ChainError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    blocks.serialize(&mut serializer)?;
    Ok(out)
}

/// Decode a stored chain. An empty array has no genesis block and is
/// rejected.
pub fn decode_chain(data: &str) -> Result<Vec<Block>, LoadError> {
    let blocks: Vec<Block> =
        serde_json::from_str(data).map_err(|e| LoadError::Parse(e.to_string()))?;
    if blocks.is_empty() {
        return Err(LoadError::Parse("chain has no genesis block".to_string()));
    }
    Ok(blocks)
}

/// JSON file backend.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFilePersistence { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFilePersistence {
    /// Writes to a sibling temporary file and renames it over the target, so
    /// readers see either the old or the new chain.
    fn save_chain(&self, blocks: &[Block]) -> Result<(), ChainError> {
        let data = encode_chain(blocks)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&data)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| {
            ChainError::PersistenceError(format!(
                "Failed to write {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        info!(path = %self.path.display(), blocks = blocks.len(), "Blockchain saved");
        Ok(())
    }

    fn load_chain(&self) -> Result<Vec<Block>, LoadError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LoadError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(LoadError::Io(e.to_string())),
        };
        decode_chain(&data)
    }
}

/// Simple in-memory persistence implementation useful for tests and
/// ephemeral runs. Goes through the same JSON encoding as the file backend.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    data: Arc<Mutex<Option<Vec<u8>>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored bytes, e.g. to simulate an edited file.
    pub fn set_raw(&self, data: impl Into<Vec<u8>>) {
        *self.data.lock() = Some(data.into());
    }

    pub fn raw(&self) -> Option<Vec<u8>> {
        self.data.lock().clone()
    }
}

impl Persistence for InMemoryPersistence {
    fn save_chain(&self, blocks: &[Block]) -> Result<(), ChainError> {
        let data = encode_chain(blocks)?;
        *self.data.lock() = Some(data);
        Ok(())
    }

    fn load_chain(&self) -> Result<Vec<Block>, LoadError> {
        let guard = self.data.lock();
        let data = guard
            .as_ref()
            .ok_or_else(|| LoadError::NotFound(PathBuf::from("<memory>")))?;
        let text = std::str::from_utf8(data).map_err(|e| LoadError::Parse(e.to_string()))?;
        decode_chain(text)
    }
}
