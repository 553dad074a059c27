//! Patricia trie proof nodes and their wire format.
//!
//! Three node kinds appear in a proof path:
//! - Leaf: remaining key path plus the hash of the stored value
//! - Branch: a shared path prefix followed by up to 16 child links
//! - Extension: a shared path prefix leading to a single child
//!
//! Branch nodes carry their own path prefix, so the chain's wire format only
//! ever contains leaves and branches. Extensions can be constructed directly
//! by callers that assemble proofs themselves.

use super::nibbles::NibblePath;
use crate::crypto::{Hash256, Hasher256, HASH_SIZE};
use crate::error::ProofError;

pub const BRANCH_WIDTH: usize = 16;

const LEAF_MARKER: u8 = 0xFF;
const BRANCH_MARKER: u8 = 0x00;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeNode {
    Leaf {
        path: NibblePath,
        value: Hash256,
    },
    Branch {
        path: NibblePath,
        links: [Option<Hash256>; BRANCH_WIDTH],
    },
    Extension {
        path: NibblePath,
        child: Hash256,
    },
}

impl TreeNode {
    pub fn leaf(path: NibblePath, value: Hash256) -> Self {
        TreeNode::Leaf { path, value }
    }

    pub fn branch(path: NibblePath, links: [Option<Hash256>; BRANCH_WIDTH]) -> Self {
        TreeNode::Branch { path, links }
    }

    pub fn extension(path: NibblePath, child: Hash256) -> Self {
        TreeNode::Extension { path, child }
    }

    pub fn path(&self) -> &NibblePath {
        match self {
            TreeNode::Leaf { path, .. }
            | TreeNode::Branch { path, .. }
            | TreeNode::Extension { path, .. } => path,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    /// Hash of this node as recorded.
    pub fn hash<H: Hasher256>(&self, hasher: &H) -> Hash256 {
        match self {
            TreeNode::Leaf { path, value } => {
                hasher.digest(&[&path.encode(true), value.as_ref()])
            }
            TreeNode::Branch { path, links } => branch_hash(hasher, path, links),
            TreeNode::Extension { path, child } => {
                hasher.digest(&[&path.encode(false), child.as_ref()])
            }
        }
    }

    /// Hash of this node with the child at `slot` replaced by `child`.
    ///
    /// For an extension the slot is ignored since it has exactly one child;
    /// a leaf has no children and hashes as recorded.
    pub fn hash_with_child<H: Hasher256>(&self, hasher: &H, slot: u8, child: Hash256) -> Hash256 {
        match self {
            TreeNode::Branch { path, links } => {
                let mut links = *links;
                links[slot as usize] = Some(child);
                branch_hash(hasher, path, &links)
            }
            TreeNode::Extension { path, .. } => {
                hasher.digest(&[&path.encode(false), child.as_ref()])
            }
            TreeNode::Leaf { .. } => self.hash(hasher),
        }
    }
}

fn branch_hash<H: Hasher256>(
    hasher: &H,
    path: &NibblePath,
    links: &[Option<Hash256>; BRANCH_WIDTH],
) -> Hash256 {
    let encoded_path = path.encode(false);
    let zero = Hash256::zero();
    let mut parts: Vec<&[u8]> = Vec::with_capacity(1 + BRANCH_WIDTH);
    parts.push(&encoded_path);
    parts.extend(links.iter().map(|link| link.as_ref().unwrap_or(&zero).as_ref()));
    hasher.digest(&parts)
}

/// Decode serialized proof nodes in wire (root-first) order.
///
/// Each node is a marker byte (`0xFF` leaf, `0x00` branch), a nibble count,
/// the packed path, then either a 32-byte value hash or a little-endian `u16`
/// link mask followed by one 32-byte hash per set bit.
pub fn decode_tree_nodes(bytes: &[u8]) -> Result<Vec<TreeNode>, ProofError> {
    let mut reader = Reader { bytes, position: 0 };
    let mut nodes = Vec::new();

    while !reader.is_empty() {
        let start = reader.position;
        let marker = reader.take(1)?[0];
        let nibble_count = reader.take(1)?[0] as usize;
        let packed = reader.take(nibble_count.div_ceil(2))?;
        let path = NibblePath::from_packed(packed, nibble_count);

        let node = match marker {
            LEAF_MARKER => TreeNode::leaf(path, reader.hash()?),
            BRANCH_MARKER => {
                let mask_bytes = reader.take(2)?;
                let mask = u16::from_le_bytes([mask_bytes[0], mask_bytes[1]]);
                let mut links = [None; BRANCH_WIDTH];
                for (i, link) in links.iter_mut().enumerate() {
                    if mask & (1 << i) != 0 {
                        *link = Some(reader.hash()?);
                    }
                }
                TreeNode::branch(path, links)
            }
            other => {
                return Err(ProofError::Malformed(format!(
                    "unknown node marker 0x{:02X} at byte {}",
                    other, start
                )))
            }
        };
        nodes.push(node);
    }

    Ok(nodes)
}

/// Decode serialized proof nodes and return them leaf-to-root, the order
/// the verifier walks.
pub fn decode_proof_path(bytes: &[u8]) -> Result<Vec<TreeNode>, ProofError> {
    let mut nodes = decode_tree_nodes(bytes)?;
    nodes.reverse();
    Ok(nodes)
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], ProofError> {
        let end = self.position + count;
        let slice = self.bytes.get(self.position..end).ok_or_else(|| {
            ProofError::Malformed(format!(
                "unexpected end of proof: need {} bytes at {}, have {}",
                count,
                self.position,
                self.bytes.len() - self.position
            ))
        })?;
        self.position = end;
        Ok(slice)
    }

    fn hash(&mut self) -> Result<Hash256, ProofError> {
        Hash256::from_slice(self.take(HASH_SIZE)?)
    }
}

/// Serialize nodes (root-first) into the wire format read by
/// [`decode_tree_nodes`]. Extensions have no wire form and are rejected.
pub fn encode_tree_nodes(nodes: &[TreeNode]) -> Result<Vec<u8>, ProofError> {
    let mut bytes = Vec::new();
    for node in nodes {
        let path = node.path();
        let packed = path.to_packed();

        match node {
            TreeNode::Leaf { value, .. } => {
                bytes.push(LEAF_MARKER);
                bytes.push(path.len() as u8);
                bytes.extend_from_slice(&packed);
                bytes.extend_from_slice(value.as_ref());
            }
            TreeNode::Branch { links, .. } => {
                bytes.push(BRANCH_MARKER);
                bytes.push(path.len() as u8);
                bytes.extend_from_slice(&packed);
                let mask = links
                    .iter()
                    .enumerate()
                    .filter(|(_, link)| link.is_some())
                    .fold(0u16, |mask, (i, _)| mask | (1 << i));
                bytes.extend_from_slice(&mask.to_le_bytes());
                for link in links.iter().flatten() {
                    bytes.extend_from_slice(link.as_ref());
                }
            }
            TreeNode::Extension { .. } => {
                return Err(ProofError::Malformed(
                    "extension nodes have no wire encoding".to_string(),
                ))
            }
        }
    }
    Ok(bytes)
}
