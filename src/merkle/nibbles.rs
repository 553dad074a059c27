//! Nibble paths for the Patricia trie.
//!
//! Keys are walked four bits at a time, high nibble of each byte first,
//! giving the trie its 16-way branching.

use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NibblePath {
    // One nibble per byte, each < 16.
    nibbles: Vec<u8>,
}

impl NibblePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path from raw nibble values.
    ///
    /// Returns `None` if any value does not fit in four bits.
    pub fn from_nibbles(nibbles: Vec<u8>) -> Option<Self> {
        if nibbles.iter().all(|&n| n < 16) {
            Some(Self { nibbles })
        } else {
            None
        }
    }

    /// Every nibble of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_packed(bytes, bytes.len() * 2)
    }

    /// The first `count` nibbles of `packed`. `count` must not exceed
    /// `packed.len() * 2`.
    pub fn from_packed(packed: &[u8], count: usize) -> Self {
        let nibbles = (0..count)
            .map(|i| {
                let byte = packed[i / 2];
                if i % 2 == 0 {
                    byte >> 4
                } else {
                    byte & 0x0F
                }
            })
            .collect();
        Self { nibbles }
    }

    pub fn len(&self) -> usize {
        self.nibbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nibbles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.nibbles.get(index).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.nibbles
    }

    /// True if the nibbles of `self` starting at `offset` begin with `prefix`.
    pub fn matches_at(&self, offset: usize, prefix: &NibblePath) -> bool {
        self.nibbles
            .get(offset..)
            .map_or(false, |rest| rest.starts_with(&prefix.nibbles))
    }

    /// True if the nibbles of `self` starting at `offset` equal `other`.
    pub fn equals_at(&self, offset: usize, other: &NibblePath) -> bool {
        self.nibbles.get(offset..) == Some(other.nibbles.as_slice())
    }

    /// Pack two nibbles per byte, padding an odd tail with a zero nibble.
    pub fn to_packed(&self) -> Vec<u8> {
        self.nibbles
            .chunks(2)
            .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
            .collect()
    }

    /// Encode the path for node hashing.
    ///
    /// The first byte carries the flags: `0x20` for a leaf, and for an odd
    /// nibble count `0x10` together with the first nibble. Remaining nibbles
    /// are packed two per byte.
    pub fn encode(&self, is_leaf: bool) -> Vec<u8> {
        let leaf_flag = if is_leaf { 0x20 } else { 0x00 };
        let mut encoded = Vec::with_capacity(1 + self.len() / 2);

        let rest = if self.len() % 2 == 1 {
            encoded.push(leaf_flag | 0x10 | self.nibbles[0]);
            &self.nibbles[1..]
        } else {
            encoded.push(leaf_flag);
            &self.nibbles[..]
        };

        encoded.extend(rest.chunks(2).map(|pair| (pair[0] << 4) | pair[1]));
        encoded
    }
}

impl fmt::Display for NibblePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for nibble in &self.nibbles {
            write!(f, "{:X}", nibble)?;
        }
        Ok(())
    }
}
