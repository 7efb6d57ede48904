//! Shared ledger handle for concurrent hosts
//!
//! Readers share the chain lock. Submissions and commits take it
//! exclusively. Mining searches for a nonce on a blocking worker without
//! holding the chain lock, then commits and saves under the exclusive lock,
//! so a concurrent load never observes a half-written file. Mine requests
//! are serialized by their own mutex.

use crate::blockchain::{Block, Blockchain, MineOutcome};
use crate::error::{ChainError, LoadError, ValidationFailure};
use crate::miner::ProofOfWork;
use crate::persistence::Persistence;
use crate::transaction::{NewTransaction, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

pub struct Node {
    blockchain: Arc<RwLock<Blockchain>>,
    persistence: Arc<dyn Persistence>,
    mining: Mutex<()>,
}

impl Node {
    pub fn new(blockchain: Blockchain, persistence: Arc<dyn Persistence>) -> Self {
        Self {
            blockchain: Arc::new(RwLock::new(blockchain)),
            persistence,
            mining: Mutex::new(()),
        }
    }

    /// Construct a fresh chain, then replace it with the stored one when
    /// `persistence` has a readable chain. Load failures are logged and the
    /// fresh chain is kept.
    pub fn bootstrap(pow: ProofOfWork, persistence: Arc<dyn Persistence>) -> Result<Self, ChainError> {
        let mut blockchain = Blockchain::new(pow)?;
        match blockchain.load(persistence.as_ref()) {
            Ok(length) => info!(length, "Resuming stored chain"),
            Err(LoadError::NotFound(path)) => {
                info!(path = %path.display(), "No existing blockchain data found. Starting new chain.")
            }
            Err(e) => warn!(error = %e, "Error loading blockchain. Starting new chain."),
        }
        Ok(Self::new(blockchain, persistence))
    }

    pub async fn submit_transaction(&self, fields: NewTransaction) -> u64 {
        self.blockchain.write().await.submit_transaction(fields)
    }

    /// Mine all transactions pending when the search starts. Transactions
    /// submitted during the search stay queued for the next block.
    ///
    /// The mining mutex is also taken by [`Node::reload`], so the tip and the
    /// head of the pool cannot move while the nonce search runs.
    pub async fn mine(&self) -> Result<MineOutcome, ChainError> {
        let _mining = self.mining.lock().await;

        let job = match self.blockchain.read().await.prepare_mining() {
            Some(job) => job,
            None => return Ok(MineOutcome::NoOp),
        };

        let block = tokio::task::spawn_blocking(move || job.solve())
            .await
            .map_err(|e| ChainError::Internal(format!("mining task failed: {}", e)))??;

        let mut chain = self.blockchain.write().await;
        let block = chain.commit_mined(block)?;

        let blocks = chain.blocks().to_vec();
        let persistence = self.persistence.clone();
        tokio::task::spawn_blocking(move || persistence.save_chain(&blocks))
            .await
            .map_err(|e| ChainError::Internal(format!("save task failed: {}", e)))??;

        Ok(MineOutcome::Mined(block))
    }

    pub async fn chain(&self) -> Vec<Block> {
        self.blockchain.read().await.blocks().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.blockchain.read().await.len()
    }

    pub async fn pending(&self) -> Vec<Transaction> {
        self.blockchain.read().await.pending().to_vec()
    }

    pub async fn validate(&self) -> Result<(), ValidationFailure> {
        self.blockchain.read().await.validate()
    }

    /// Replace the in-memory chain with the stored one, keeping it on failure.
    pub async fn reload(&self) -> Result<usize, LoadError> {
        let _mining = self.mining.lock().await;
        self.blockchain.write().await.load(self.persistence.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::PowTarget;
    use crate::persistence::InMemoryPersistence;
    use crate::transaction::EventType;
    use serde_json::{Map, Number};

    fn fields(chemical: &str) -> NewTransaction {
        NewTransaction {
            sender_urn: "urn:lab:a".to_string(),
            recipient_urn: "urn:lab:b".to_string(),
            chemical_urn: chemical.to_string(),
            quantity: Number::from(1),
            unit: "kg".to_string(),
            event_type: EventType::Receive,
            details: Map::new(),
        }
    }

    fn quick_pow() -> ProofOfWork {
        ProofOfWork::new(2, PowTarget::BlockHash)
    }

    #[tokio::test]
    async fn test_mine_persists_chain() {
        let storage = InMemoryPersistence::new();
        let node = Node::bootstrap(quick_pow(), Arc::new(storage.clone())).unwrap();

        assert_eq!(node.mine().await.unwrap(), MineOutcome::NoOp);
        assert!(storage.raw().is_none());

        node.submit_transaction(fields("a")).await;
        let outcome = node.mine().await.unwrap();
        assert!(matches!(outcome, MineOutcome::Mined(ref block) if block.index() == 1));
        assert!(node.pending().await.is_empty());

        let stored = storage.load_chain().unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn test_bootstrap_resumes_stored_chain() {
        let storage = InMemoryPersistence::new();
        {
            let node = Node::bootstrap(quick_pow(), Arc::new(storage.clone())).unwrap();
            node.submit_transaction(fields("a")).await;
            node.mine().await.unwrap();
        }

        let node = Node::bootstrap(quick_pow(), Arc::new(storage)).unwrap();
        assert_eq!(node.len().await, 2);
        assert_eq!(node.validate().await, Ok(()));
    }

    #[tokio::test]
    async fn test_bootstrap_ignores_corrupt_storage() {
        let storage = InMemoryPersistence::new();
        storage.set_raw("[");
        let node = Node::bootstrap(quick_pow(), Arc::new(storage)).unwrap();
        assert_eq!(node.len().await, 1);
    }

    #[tokio::test]
    async fn test_reload_failure_keeps_state() {
        let storage = InMemoryPersistence::new();
        let node = Node::bootstrap(quick_pow(), Arc::new(storage.clone())).unwrap();
        node.submit_transaction(fields("a")).await;
        node.mine().await.unwrap();

        storage.set_raw("not json");
        assert!(matches!(node.reload().await, Err(LoadError::Parse(_))));
        assert_eq!(node.len().await, 2);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_mined_block() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing").join("chain.json");
        let storage = crate::persistence::JsonFilePersistence::new(missing);
        let node = Node::new(Blockchain::new(quick_pow()).unwrap(), Arc::new(storage));

        node.submit_transaction(fields("a")).await;
        assert!(matches!(node.mine().await, Err(ChainError::IoError(_))));
        assert_eq!(node.len().await, 2);
        assert!(node.pending().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_are_not_lost() {
        let node = Arc::new(Node::bootstrap(quick_pow(), Arc::new(InMemoryPersistence::new())).unwrap());

        let mut tasks = Vec::new();
        for i in 0..20 {
            let node = node.clone();
            tasks.push(tokio::spawn(async move {
                node.submit_transaction(fields(&format!("chem-{}", i))).await;
                if i % 5 == 0 {
                    node.mine().await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        node.mine().await.unwrap();

        let chain = node.chain().await;
        let mined: usize = chain.iter().map(|block| block.transactions().len()).sum();
        assert_eq!(mined, 20);
        assert!(node.pending().await.is_empty());
        assert_eq!(node.validate().await, Ok(()));
    }
}
