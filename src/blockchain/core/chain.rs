use crate::blockchain::core::block::{block_timestamp, Block, HashPreimage};
use crate::blockchain::core::validation::validate_chain;
use crate::error::{ChainError, LoadError, ValidationFailure};
use crate::mempool::TransactionPool;
use crate::miner::{PowTarget, ProofOfWork};
use crate::persistence::Persistence;
use crate::transaction::{NewTransaction, Transaction};
use tracing::{debug, info, warn};

/// Result of a mining request.
#[derive(Debug, Clone, PartialEq)]
pub enum MineOutcome {
    Mined(Block),
    /// The pool was empty; nothing changed.
    NoOp,
}

/// Work needed to extend the chain by one block, detached from the chain so
/// the search can run without holding its lock.
#[derive(Debug, Clone)]
pub struct MiningJob {
    index: u64,
    previous_hash: String,
    transactions: Vec<Transaction>,
    pow: ProofOfWork,
}

impl MiningJob {
    /// Run the proof-of-work search and seal the block. CPU bound and
    /// unbounded in duration.
    pub fn solve(self) -> Result<Block, ChainError> {
        match self.pow.target() {
            PowTarget::PreviousHash => {
                let nonce = self.pow.find_nonce(&self.previous_hash);
                Block::new(
                    self.index,
                    block_timestamp(),
                    self.transactions,
                    self.previous_hash,
                    nonce,
                )
            }
            PowTarget::BlockHash => {
                let timestamp = block_timestamp();
                let preimage =
                    HashPreimage::new(self.index, &timestamp, &self.transactions, &self.previous_hash)?;
                let (nonce, hash) = self.pow.find_block_nonce(&preimage);
                Ok(Block::sealed(
                    self.index,
                    timestamp,
                    self.transactions,
                    self.previous_hash,
                    nonce,
                    hash,
                ))
            }
        }
    }
}

/// The canonical chain plus its pending pool. Never empty: index 0 is the
/// genesis block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    pool: TransactionPool,
    pow: ProofOfWork,
}

impl Blockchain {
    /// Create a chain holding only a freshly timestamped genesis block.
    pub fn new(pow: ProofOfWork) -> Result<Self, ChainError> {
        let genesis = Block::genesis(block_timestamp())?;
        info!(hash = %genesis.hash(), "Genesis block created");

        Ok(Blockchain {
            blocks: vec![genesis],
            pool: TransactionPool::new(),
            pow,
        })
    }

    /// Queue a transaction and return the index of the block it will land
    /// in when next mined.
    pub fn submit_transaction(&mut self, fields: NewTransaction) -> u64 {
        let predicted = self.blocks.len() as u64;
        let tx = self.pool.submit(fields);
        debug!(
            event_type = %tx.event_type(),
            chemical_urn = %tx.chemical_urn(),
            predicted_block = predicted,
            "Transaction added to pending pool"
        );
        predicted
    }

    /// Snapshot the tip and the pending pool for an out-of-lock search.
    /// `None` when there is nothing to mine.
    pub fn prepare_mining(&self) -> Option<MiningJob> {
        if self.pool.is_empty() {
            return None;
        }
        let tip = self.latest_block();
        Some(MiningJob {
            index: tip.index() + 1,
            previous_hash: tip.hash().to_string(),
            transactions: self.pool.pending().to_vec(),
            pow: self.pow,
        })
    }

    /// Append a block produced by [`MiningJob::solve`], removing exactly its
    /// transactions from the front of the pool. Fails with
    /// [`ChainError::StaleTip`] if the chain or pool moved underneath the job;
    /// callers that serialize mining never see it.
    pub fn commit_mined(&mut self, block: Block) -> Result<Block, ChainError> {
        let tip = self.latest_block();
        if block.index() != tip.index() + 1 || block.previous_hash() != tip.hash() {
            return Err(ChainError::StaleTip);
        }
        if !self.pool.pending().starts_with(block.transactions()) {
            return Err(ChainError::StaleTip);
        }

        self.pool.take_front(block.transactions().len());
        info!(
            index = block.index(),
            nonce = block.nonce(),
            hash = %block.hash(),
            transactions = block.transactions().len(),
            "Block mined"
        );
        self.blocks.push(block.clone());
        Ok(block)
    }

    /// Mine every pending transaction into a new block, blocking the caller
    /// for the whole search.
    pub fn mine(&mut self) -> Result<MineOutcome, ChainError> {
        let job = match self.prepare_mining() {
            Some(job) => job,
            None => return Ok(MineOutcome::NoOp),
        };
        let block = job.solve()?;
        self.commit_mined(block).map(MineOutcome::Mined)
    }

    /// Check hash integrity, linkage and proof-of-work of every non-genesis
    /// block. The first failure is logged and returned.
    pub fn validate(&self) -> Result<(), ValidationFailure> {
        validate_chain(&self.blocks, &self.pow).map_err(|failure| {
            warn!(index = failure.index(), reason = %failure, "Chain validation failed");
            failure
        })
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Write every block to `persistence`.
    pub fn save(&self, persistence: &dyn Persistence) -> Result<(), ChainError> {
        persistence.save_chain(&self.blocks)
    }

    /// Replace the blocks with the ones stored in `persistence`. On any
    /// failure the current chain is kept. The pending pool is never touched.
    pub fn load(&mut self, persistence: &dyn Persistence) -> Result<usize, LoadError> {
        let blocks = persistence.load_chain()?;
        if blocks.is_empty() {
            return Err(LoadError::Parse("chain has no genesis block".to_string()));
        }
        self.blocks = blocks;
        info!(length = self.blocks.len(), "Blockchain loaded");
        Ok(self.blocks.len())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn latest_block(&self) -> &Block {
        // `blocks` is never empty; every constructor and `load` guarantee it.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        self.pool.pending()
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn difficulty(&self) -> usize {
        self.pow.difficulty()
    }

    pub fn pow_target(&self) -> PowTarget {
        self.pow.target()
    }
}
