// core.rs splits responsibilities into submodules: the block and its hash,
// chain orchestration (pool, mining, load/save), and validation.
pub mod block;
pub mod chain;
pub mod validation;

pub use block::*;
pub use chain::*;
pub use validation::*;
