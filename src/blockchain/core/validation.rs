use crate::blockchain::core::block::Block;
use crate::error::ValidationFailure;
use crate::miner::ProofOfWork;

/// Walk the chain from the first non-genesis block and stop at the first
/// failure. Per block: hash integrity, then linkage, then proof-of-work.
/// Genesis is never checked for proof-of-work.
pub fn validate_chain(blocks: &[Block], pow: &ProofOfWork) -> Result<(), ValidationFailure> {
    for pair in blocks.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let index = current.index();

        if !current.is_intact() {
            return Err(ValidationFailure::HashMismatch { index });
        }

        if current.previous_hash() != previous.hash() {
            return Err(ValidationFailure::LinkMismatch { index });
        }

        if !pow.meets_difficulty(current.hash()) {
            return Err(ValidationFailure::PowUnsatisfied { index });
        }
    }
    Ok(())
}
