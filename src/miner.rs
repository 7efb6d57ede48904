//! Proof-of-work search
//!
//! The difficulty is the number of leading `'0'` hex characters a digest
//! must start with. The search is sequential from nonce 0 and has no
//! cancellation; callers that must stay responsive run it on a blocking
//! worker.

use crate::blockchain::HashPreimage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

pub const DEFAULT_DIFFICULTY: usize = 4;

/// Longest prefix a SHA-256 hex digest can have.
pub const MAX_DIFFICULTY: usize = 64;

/// Which digest the puzzle has to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowTarget {
    /// `SHA256(previous_hash ‖ nonce)`. The stored block hash is a different
    /// digest, so the validator's proof-of-work check usually rejects blocks
    /// mined this way.
    #[default]
    PreviousHash,
    /// The block's own hash. Mined blocks pass the validator's check.
    BlockHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
    target: PowTarget,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        ProofOfWork::new(DEFAULT_DIFFICULTY, PowTarget::default())
    }
}

impl ProofOfWork {
    pub fn new(difficulty: usize, target: PowTarget) -> Self {
        ProofOfWork { difficulty, target }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn target(&self) -> PowTarget {
        self.target
    }

    pub fn meets_difficulty(&self, hash: &str) -> bool {
        hash.len() >= self.difficulty && hash.bytes().take(self.difficulty).all(|b| b == b'0')
    }

    /// Digest checked by the [`PowTarget::PreviousHash`] puzzle.
    pub fn puzzle_hash(previous_hash: &str, nonce: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(previous_hash.as_bytes());
        hasher.update(nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Smallest nonce whose puzzle hash over `previous_hash` meets the difficulty.
    pub fn find_nonce(&self, previous_hash: &str) -> u64 {
        let mut nonce = 0u64;
        while !self.meets_difficulty(&Self::puzzle_hash(previous_hash, nonce)) {
            nonce += 1;
        }
        debug!(nonce, difficulty = self.difficulty, "pow.solved");
        nonce
    }

    /// Smallest nonce whose full block hash meets the difficulty, together
    /// with that hash.
    pub fn find_block_nonce(&self, preimage: &HashPreimage) -> (u64, String) {
        let mut nonce = 0u64;
        loop {
            let hash = preimage.digest(nonce);
            if self.meets_difficulty(&hash) {
                debug!(nonce, difficulty = self.difficulty, "pow.solved");
                return (nonce, hash);
            }
            nonce += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meets_difficulty() {
        let pow = ProofOfWork::new(4, PowTarget::PreviousHash);
        assert!(pow.meets_difficulty("0000abcd"));
        assert!(!pow.meets_difficulty("000abcde"));
        assert!(!pow.meets_difficulty("000"));

        let trivial = ProofOfWork::new(0, PowTarget::PreviousHash);
        assert!(trivial.meets_difficulty("ffff"));
    }

    #[test]
    fn test_find_nonce_is_minimal() {
        let pow = ProofOfWork::new(2, PowTarget::PreviousHash);
        let nonce = pow.find_nonce("abc123");
        assert!(pow.meets_difficulty(&ProofOfWork::puzzle_hash("abc123", nonce)));
        for earlier in 0..nonce {
            assert!(!pow.meets_difficulty(&ProofOfWork::puzzle_hash("abc123", earlier)));
        }
    }

    #[test]
    fn test_find_nonce_default_difficulty() {
        let pow = ProofOfWork::default();
        let nonce = pow.find_nonce("0");
        assert!(ProofOfWork::puzzle_hash("0", nonce).starts_with("0000"));
    }

    #[test]
    fn test_find_block_nonce_returns_matching_hash() {
        let pow = ProofOfWork::new(2, PowTarget::BlockHash);
        let preimage = HashPreimage::new(1, "2024-01-01 00:00:00.000000", &[], "prev").unwrap();
        let (nonce, hash) = pow.find_block_nonce(&preimage);
        assert_eq!(hash, preimage.digest(nonce));
        assert!(hash.starts_with("00"));
    }

    #[test]
    fn test_pow_target_config_names() {
        assert_eq!(serde_json::to_string(&PowTarget::PreviousHash).unwrap(), "\"previous-hash\"");
        assert_eq!(
            serde_json::from_str::<PowTarget>("\"block-hash\"").unwrap(),
            PowTarget::BlockHash
        );
    }
}
