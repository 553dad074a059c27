//! State proofs over the Patricia trie.
//!
//! The state hash committed in a block header is the hash of the
//! concatenated subcache roots, in order. A proof is valid when its path
//! reconstructs one of those roots; it then either proves the key's value
//! (positive) or proves that the key holds some other value or is absent
//! (negative).

use super::nibbles::NibblePath;
use super::node::TreeNode;
use crate::crypto::{Hash256, Hasher256};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateProofResult {
    /// The key is present with the expected value.
    ValidPositive,
    /// The key is absent, or present with a different value.
    ValidNegative,
    /// The path does not reconstruct any subcache root, or is malformed.
    Invalid,
    /// The subcache roots do not compose to the state hash.
    PathMismatch,
}

impl StateProofResult {
    pub fn is_valid(&self) -> bool {
        matches!(
            self,
            StateProofResult::ValidPositive | StateProofResult::ValidNegative
        )
    }
}

impl fmt::Display for StateProofResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StateProofResult::ValidPositive => "valid (positive)",
            StateProofResult::ValidNegative => "valid (negative)",
            StateProofResult::Invalid => "invalid",
            StateProofResult::PathMismatch => "path mismatch",
        };
        f.write_str(text)
    }
}

/// `H(root_0 ++ root_1 ++ ...)` over the subcache roots in their given order.
pub fn compose_state_hash<H: Hasher256>(hasher: &H, subcache_roots: &[Hash256]) -> Hash256 {
    let parts: Vec<&[u8]> = subcache_roots.iter().map(|root| root.as_ref()).collect();
    hasher.digest(&parts)
}

/// Verify a state proof.
///
/// `proof_path` is ordered leaf to root: index 0 is the deepest node the
/// prover reached for `encoded_key`.
pub fn prove_patricia_merkle_with<H: Hasher256>(
    hasher: &H,
    encoded_key: &[u8],
    leaf_value_hash: &Hash256,
    proof_path: &[TreeNode],
    state_root: &Hash256,
    subcache_roots: &[Hash256],
) -> StateProofResult {
    let composed = compose_state_hash(hasher, subcache_roots);
    if composed != *state_root {
        debug!(
            "subcache roots compose to {}, expected state hash {}",
            composed, state_root
        );
        return StateProofResult::PathMismatch;
    }

    let key = NibblePath::from_bytes(encoded_key);
    let Some((outcome, slots)) = walk(&key, leaf_value_hash, proof_path) else {
        debug!("proof path for key {} is not walkable", key);
        return StateProofResult::Invalid;
    };

    let Some(root) = reconstruct_root(hasher, proof_path, &slots) else {
        return StateProofResult::Invalid;
    };
    if subcache_roots.contains(&root) {
        outcome
    } else {
        debug!("reconstructed root {} matches no subcache root", root);
        StateProofResult::Invalid
    }
}

// Walks the path root to leaf, consuming key nibbles. Returns the outcome
// decided at the deepest node and, per path index, the child slot used when
// folding the node below into it.
fn walk(
    key: &NibblePath,
    leaf_value_hash: &Hash256,
    proof_path: &[TreeNode],
) -> Option<(StateProofResult, Vec<u8>)> {
    let (deepest, upper) = proof_path.split_first()?;
    let mut slots = vec![0u8; proof_path.len()];
    let mut offset = 0;

    for (index, node) in upper.iter().enumerate().rev() {
        match node {
            TreeNode::Leaf { .. } => return None,
            TreeNode::Extension { path, .. } => {
                if !key.matches_at(offset, path) {
                    return None;
                }
                offset += path.len();
            }
            TreeNode::Branch { path, .. } => {
                if !key.matches_at(offset, path) {
                    return None;
                }
                offset += path.len();
                slots[index + 1] = key.get(offset)?;
                offset += 1;
            }
        }
    }

    let outcome = match deepest {
        TreeNode::Leaf { path, value } => {
            if key.equals_at(offset, path) && value == leaf_value_hash {
                StateProofResult::ValidPositive
            } else {
                StateProofResult::ValidNegative
            }
        }
        TreeNode::Extension { path, .. } => {
            // A matching extension must lead somewhere the proof does not show.
            if key.matches_at(offset, path) {
                return None;
            }
            StateProofResult::ValidNegative
        }
        TreeNode::Branch { path, links } => {
            if !key.matches_at(offset, path) {
                StateProofResult::ValidNegative
            } else {
                let nibble = key.get(offset + path.len())?;
                if links[nibble as usize].is_some() {
                    return None;
                }
                StateProofResult::ValidNegative
            }
        }
    };

    Some((outcome, slots))
}

fn reconstruct_root<H: Hasher256>(
    hasher: &H,
    proof_path: &[TreeNode],
    slots: &[u8],
) -> Option<Hash256> {
    let (deepest, upper) = proof_path.split_first()?;
    let root = upper
        .iter()
        .zip(&slots[1..])
        .fold(deepest.hash(hasher), |child, (node, &slot)| {
            node.hash_with_child(hasher, slot, child)
        });
    Some(root)
}
