use crate::canonical::to_canonical_string;
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// `previous_hash` carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Current local time as recorded on blocks, e.g. `2024-05-01 13:45:10.123456`.
pub fn block_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// Everything a block hash covers except the nonce. Building it once lets
/// the miner try nonces without re-encoding the transactions.
#[derive(Debug, Clone)]
pub struct HashPreimage {
    head: String,
    previous_hash: String,
}

impl HashPreimage {
    pub fn new(
        index: u64,
        timestamp: &str,
        transactions: &[Transaction],
        previous_hash: &str,
    ) -> Result<Self> {
        let transactions = to_canonical_string(transactions)?;
        Ok(HashPreimage {
            head: format!("{}{}{}", index, timestamp, transactions),
            previous_hash: previous_hash.to_string(),
        })
    }

    /// Lowercase hex SHA-256 of `index ‖ timestamp ‖ transactions ‖ previous_hash ‖ nonce`.
    pub fn digest(&self, nonce: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.head.as_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A sealed batch of transactions linked to its predecessor by hash.
///
/// Content fields are private and never change after construction. Blocks
/// decoded from a persisted record get their hash recomputed; the digest
/// found in the record is kept separately so the validator can compare it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BlockRecord")]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) timestamp: String,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) previous_hash: String,
    pub(crate) nonce: u64,
    pub(crate) hash: String,
    #[serde(skip_serializing)]
    pub(crate) recorded_hash: Option<String>,
}

/// On-disk shape of a block.
#[derive(Deserialize)]
struct BlockRecord {
    index: u64,
    timestamp: String,
    transactions: Vec<Transaction>,
    previous_hash: String,
    nonce: u64,
    hash: String,
}

impl TryFrom<BlockRecord> for Block {
    type Error = ChainError;

    fn try_from(record: BlockRecord) -> Result<Self> {
        let mut block = Block::new(
            record.index,
            record.timestamp,
            record.transactions,
            record.previous_hash,
            record.nonce,
        )?;
        block.recorded_hash = Some(record.hash);
        Ok(block)
    }
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: impl Into<String>,
        transactions: Vec<Transaction>,
        previous_hash: impl Into<String>,
        nonce: u64,
    ) -> Result<Self> {
        let timestamp = timestamp.into();
        let previous_hash = previous_hash.into();
        let hash = HashPreimage::new(index, &timestamp, &transactions, &previous_hash)?.digest(nonce);

        Ok(Block {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce,
            hash,
            recorded_hash: None,
        })
    }

    /// Build a block whose hash the miner already computed for `nonce`.
    pub(crate) fn sealed(
        index: u64,
        timestamp: String,
        transactions: Vec<Transaction>,
        previous_hash: String,
        nonce: u64,
        hash: String,
    ) -> Self {
        Block {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce,
            hash,
            recorded_hash: None,
        }
    }

    /// Genesis blocks are not mined: no transactions, nonce 0.
    pub fn genesis(timestamp: impl Into<String>) -> Result<Self> {
        Block::new(0, timestamp, Vec::new(), GENESIS_PREVIOUS_HASH, 0)
    }

    /// Recompute the hash from the block's current content.
    pub fn calculate_hash(&self) -> Result<String> {
        Ok(self.preimage()?.digest(self.nonce))
    }

    pub fn preimage(&self) -> Result<HashPreimage> {
        HashPreimage::new(self.index, &self.timestamp, &self.transactions, &self.previous_hash)
    }

    /// True when both the stored hash and, for a loaded block, the hash
    /// found on disk match a fresh computation.
    pub fn is_intact(&self) -> bool {
        match self.calculate_hash() {
            Ok(actual) => {
                actual == self.hash
                    && self.recorded_hash.as_ref().map_or(true, |recorded| *recorded == actual)
            }
            Err(_) => false,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Digest found in the persisted record this block was decoded from.
    pub fn recorded_hash(&self) -> Option<&str> {
        self.recorded_hash.as_deref()
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}
