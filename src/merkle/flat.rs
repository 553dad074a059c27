//! Flat binary Merkle tree: root computation and inclusion proofs for
//! transaction hashes.

use crate::crypto::{Hash256, Hasher256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One step of a flat proof path.
///
/// `is_left` means the sibling is the left child, so the parent is
/// `H(sibling ++ current)`; otherwise it is `H(current ++ sibling)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerklePart {
    pub hash: Hash256,
    pub is_left: bool,
}

impl MerklePart {
    pub fn new(hash: Hash256, is_left: bool) -> Self {
        Self { hash, is_left }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Position {
    Left,
    Right,
}

// REST shape: {"hash": "...", "position": "left" | "right"}
#[derive(Serialize, Deserialize)]
struct PartRepr {
    hash: Hash256,
    position: Position,
}

impl Serialize for MerklePart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PartRepr {
            hash: self.hash,
            position: if self.is_left {
                Position::Left
            } else {
                Position::Right
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MerklePart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PartRepr::deserialize(deserializer)?;
        Ok(MerklePart {
            hash: repr.hash,
            is_left: matches!(repr.position, Position::Left),
        })
    }
}

/// Fold `path` over `leaf_hash` and compare with `root_hash`.
///
/// An empty path proves a single-leaf tree, so it succeeds iff the leaf is
/// the root.
pub fn prove_merkle_with<H: Hasher256>(
    hasher: &H,
    leaf_hash: &Hash256,
    path: &[MerklePart],
    root_hash: &Hash256,
) -> bool {
    let computed = path.iter().fold(*leaf_hash, |current, part| {
        if part.is_left {
            hasher.hash_pair(&part.hash, &current)
        } else {
            hasher.hash_pair(&current, &part.hash)
        }
    });
    computed == *root_hash
}

/// Accumulates leaf hashes and computes their Merkle root.
///
/// Levels with an odd number of hashes pair the last hash with itself. No
/// leaves yields the zero hash.
pub struct MerkleHashBuilder<H: Hasher256> {
    hasher: H,
    hashes: Vec<Hash256>,
}

impl<H: Hasher256> MerkleHashBuilder<H> {
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            hashes: Vec::new(),
        }
    }

    pub fn update(&mut self, hash: Hash256) {
        self.hashes.push(hash);
    }

    pub fn finalize(self) -> Hash256 {
        MerkleTree::build(self.hasher, self.hashes).root()
    }
}

/// All levels of a flat Merkle tree, leaves first.
pub struct MerkleTree {
    levels: Vec<Vec<Hash256>>,
}

impl MerkleTree {
    pub fn build<H: Hasher256>(hasher: H, leaves: Vec<Hash256>) -> Self {
        let mut levels = vec![leaves];
        while levels.last().map_or(false, |level| level.len() > 1) {
            let level = &levels[levels.len() - 1];
            let next: Vec<Hash256> = level
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(&pair[0]);
                    hasher.hash_pair(&pair[0], right)
                })
                .collect();
            levels.push(next);
        }
        Self { levels }
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    pub fn root(&self) -> Hash256 {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_else(Hash256::zero)
    }

    /// Proof path for the leaf at `index`, ordered leaf to root.
    pub fn proof(&self, index: usize) -> Option<Vec<MerklePart>> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut path = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut index = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let part = if index % 2 == 1 {
                MerklePart::new(level[index - 1], true)
            } else {
                // A trailing odd node is paired with itself.
                let sibling = level.get(index + 1).unwrap_or(&level[index]);
                MerklePart::new(*sibling, false)
            };
            path.push(part);
            index /= 2;
        }
        Some(path)
    }
}
