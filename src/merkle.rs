//! Merkle proof verification.
//!
//! Transaction inclusion is proven against the flat binary tree whose root is
//! a block's transactions hash. State inclusion and exclusion are proven
//! against the Patricia trie of one subcache, whose root composes with the
//! other subcache roots into the block's state hash.

pub mod flat;
pub mod nibbles;
pub mod node;
pub mod patricia;

pub use flat::{prove_merkle_with, MerkleHashBuilder, MerklePart, MerkleTree};
pub use nibbles::NibblePath;
pub use node::{decode_proof_path, decode_tree_nodes, encode_tree_nodes, TreeNode};
pub use patricia::{compose_state_hash, prove_patricia_merkle_with, StateProofResult};

use crate::crypto::{Hash256, HashAlgorithm, Hasher256};

/// Stateless proof verifier bound to one hash primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct MerkleVerifier<H: Hasher256 = HashAlgorithm> {
    hasher: H,
}

impl<H: Hasher256> MerkleVerifier<H> {
    pub fn new(hasher: H) -> Self {
        Self { hasher }
    }

    pub fn prove_merkle(&self, leaf_hash: &Hash256, path: &[MerklePart], root_hash: &Hash256) -> bool {
        prove_merkle_with(&self.hasher, leaf_hash, path, root_hash)
    }

    pub fn prove_patricia_merkle(
        &self,
        encoded_key: &[u8],
        leaf_value_hash: &Hash256,
        proof_path: &[TreeNode],
        state_root: &Hash256,
        subcache_roots: &[Hash256],
    ) -> StateProofResult {
        prove_patricia_merkle_with(
            &self.hasher,
            encoded_key,
            leaf_value_hash,
            proof_path,
            state_root,
            subcache_roots,
        )
    }
}

/// Flat proof check with SHA3-256.
pub fn prove_merkle(leaf_hash: &Hash256, path: &[MerklePart], root_hash: &Hash256) -> bool {
    MerkleVerifier::new(HashAlgorithm::Sha3_256).prove_merkle(leaf_hash, path, root_hash)
}

/// State proof check with SHA3-256.
pub fn prove_patricia_merkle(
    encoded_key: &[u8],
    leaf_value_hash: &Hash256,
    proof_path: &[TreeNode],
    state_root: &Hash256,
    subcache_roots: &[Hash256],
) -> StateProofResult {
    MerkleVerifier::new(HashAlgorithm::Sha3_256).prove_patricia_merkle(
        encoded_key,
        leaf_value_hash,
        proof_path,
        state_root,
        subcache_roots,
    )
}
