// Thin re-export module: implementation is in `blockchain/core.rs`, split
// into the block itself, chain orchestration and validation.

pub mod core;
pub use self::core::*;
