//! chainproof - block store reader and Merkle proof verifier for a
//! file-backed chain
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Block Storage
//! - [`store`] - Batch block store over the sharded on-disk layout
//! - [`cache`] - Single-slot batch file cache
//! - [`block`] - Block header decoding
//!
//! ## Proofs
//! - [`merkle`] - Flat and Patricia Merkle proof verification
//! - [`crypto`] - Hash primitive and 256-bit hash type
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - CLI utilities

#![forbid(unsafe_code)]

// ============================================================================
// Block Storage
// ============================================================================
pub mod block;
pub mod cache;
pub mod store;

// ============================================================================
// Proofs
// ============================================================================
pub mod crypto;
pub mod merkle;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use block::{BlockDecoder, BlockHeader, HeaderDecoder, RawBlock};
pub use crypto::{Hash256, HashAlgorithm, Hasher256};
pub use error::{ProofError, Result, StoreError};
pub use merkle::{prove_merkle, prove_patricia_merkle, MerklePart, MerkleVerifier, StateProofResult, TreeNode};
pub use store::{BatchBlockStore, SharedBlockStore};
