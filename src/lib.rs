//! Precursor Ledger - an append-only chemical inventory ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, hashing, mining orchestration and validation
//! - [`transaction`] - Transaction types and submission checks
//! - [`mempool`] - Pending transaction pool
//! - [`canonical`] - Canonical JSON used as the hash preimage
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work search
//!
//! ## State Management
//! - [`persistence`] - JSON chain file codec and storage backends
//! - [`node`] - Shared, lock-guarded ledger handle
//!
//! ## Integration
//! - [`api`] - HTTP request layer
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod canonical;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus
// ============================================================================
pub mod miner;

// ============================================================================
// State Management
// ============================================================================
pub mod node;
pub mod persistence;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
