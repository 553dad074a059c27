//! Integration tests for transaction and state proof verification

use chainproof::crypto::{Hash256, HashAlgorithm, Hasher256};
use chainproof::merkle::{
    compose_state_hash, decode_proof_path, encode_tree_nodes, prove_merkle, prove_patricia_merkle,
    MerkleHashBuilder, MerklePart, MerkleTree, MerkleVerifier, NibblePath, StateProofResult,
    TreeNode,
};

const SHA3: HashAlgorithm = HashAlgorithm::Sha3_256;

/// Helper to derive distinct transaction hashes
fn transaction_hashes(count: u8) -> Vec<Hash256> {
    (0..count).map(|i| SHA3.digest(&[b"transaction", &[i]])).collect()
}

#[test]
fn test_transaction_proofs_round_trip() {
    for count in [1u8, 2, 5, 7, 16] {
        let hashes = transaction_hashes(count);
        let tree = MerkleTree::build(SHA3, hashes.clone());

        let mut builder = MerkleHashBuilder::new(SHA3);
        for hash in &hashes {
            builder.update(*hash);
        }
        assert_eq!(builder.finalize(), tree.root());

        for (index, leaf) in hashes.iter().enumerate() {
            let path = tree.proof(index).expect("leaf index in range");
            assert!(prove_merkle(leaf, &path, &tree.root()));
        }
    }
}

#[test]
fn test_flipping_any_sibling_fails() {
    let hashes = transaction_hashes(7);
    let tree = MerkleTree::build(SHA3, hashes.clone());
    let root = tree.root();

    for (index, leaf) in hashes.iter().enumerate() {
        let path = tree.proof(index).expect("leaf index in range");
        for step in 0..path.len() {
            let mut tampered = path.clone();
            tampered[step].hash.0[0] ^= 0x01;
            assert!(!prove_merkle(leaf, &tampered, &root), "leaf {index} step {step}");
        }
    }
}

#[test]
fn test_single_transaction_block() {
    let leaf = transaction_hashes(1)[0];
    let other = transaction_hashes(2)[1];
    assert!(prove_merkle(&leaf, &[], &leaf));
    assert!(!prove_merkle(&leaf, &[], &other));
}

#[test]
fn test_rest_proof_document_verifies() -> Result<(), Box<dyn std::error::Error>> {
    let hashes = transaction_hashes(4);
    let tree = MerkleTree::build(SHA3, hashes.clone());
    let path = tree.proof(1).ok_or("leaf index out of range")?;

    let json = serde_json::to_string(&path)?;
    let parsed: Vec<MerklePart> = serde_json::from_str(&json)?;
    assert_eq!(parsed, path);
    assert!(prove_merkle(&hashes[1], &parsed, &tree.root()));

    Ok(())
}

struct StateFixture {
    key: Vec<u8>,
    value: Hash256,
    root: TreeNode,
    inner: TreeNode,
    leaf: TreeNode,
    subcache_roots: Vec<Hash256>,
}

impl StateFixture {
    // Two-level trie: root branch -> branch at nibble 7 -> leaf at nibble 4.
    fn new() -> Self {
        let mut key = vec![0x74];
        key.extend_from_slice(&[0xAA; 31]);
        let value = SHA3.digest(&[b"account state"]);

        let leaf = TreeNode::leaf(NibblePath::from_bytes(&key[1..]), value);

        let mut inner_links = [None; 16];
        inner_links[0x4] = Some(leaf.hash(&SHA3));
        inner_links[0x9] = Some(SHA3.digest(&[b"neighbour account"]));
        let inner = TreeNode::branch(NibblePath::new(), inner_links);

        let mut root_links = [None; 16];
        root_links[0x7] = Some(inner.hash(&SHA3));
        root_links[0x1] = Some(SHA3.digest(&[b"far subtree"]));
        let root = TreeNode::branch(NibblePath::new(), root_links);

        let subcache_roots = vec![
            root.hash(&SHA3),
            SHA3.digest(&[b"namespace subcache"]),
            SHA3.digest(&[b"mosaic subcache"]),
        ];

        Self {
            key,
            value,
            root,
            inner,
            leaf,
            subcache_roots,
        }
    }

    fn state_root(&self) -> Hash256 {
        compose_state_hash(&SHA3, &self.subcache_roots)
    }

    fn wire_proof(&self, nodes: &[&TreeNode]) -> Vec<TreeNode> {
        let nodes: Vec<TreeNode> = nodes.iter().map(|node| (*node).clone()).collect();
        let bytes = encode_tree_nodes(&nodes).expect("branches and leaves encode");
        decode_proof_path(&bytes).expect("encoded proof decodes")
    }
}

#[test]
fn test_state_inclusion_over_wire_format() {
    let f = StateFixture::new();
    let path = f.wire_proof(&[&f.root, &f.inner, &f.leaf]);

    let result = prove_patricia_merkle(&f.key, &f.value, &path, &f.state_root(), &f.subcache_roots);
    assert_eq!(result, StateProofResult::ValidPositive);
}

#[test]
fn test_state_exclusion_over_wire_format() {
    let f = StateFixture::new();
    let mut absent_key = f.key.clone();
    absent_key[0] = 0x75;
    let path = f.wire_proof(&[&f.root, &f.inner]);

    let result =
        prove_patricia_merkle(&absent_key, &f.value, &path, &f.state_root(), &f.subcache_roots);
    assert_eq!(result, StateProofResult::ValidNegative);
}

#[test]
fn test_stale_value_is_negative() {
    let f = StateFixture::new();
    let path = f.wire_proof(&[&f.root, &f.inner, &f.leaf]);
    let stale = SHA3.digest(&[b"old account state"]);

    let result = prove_patricia_merkle(&f.key, &stale, &path, &f.state_root(), &f.subcache_roots);
    assert_eq!(result, StateProofResult::ValidNegative);
}

#[test]
fn test_reordered_subcache_roots_are_path_mismatch() {
    let f = StateFixture::new();
    let path = f.wire_proof(&[&f.root, &f.inner, &f.leaf]);
    let mut reordered = f.subcache_roots.clone();
    reordered.swap(1, 2);

    let result = prove_patricia_merkle(&f.key, &f.value, &path, &f.state_root(), &reordered);
    assert_eq!(result, StateProofResult::PathMismatch);
}

#[test]
fn test_proof_for_unknown_subcache_is_invalid() {
    let f = StateFixture::new();
    let path = f.wire_proof(&[&f.root, &f.inner, &f.leaf]);
    let others = f.subcache_roots[1..].to_vec();
    let state_root = compose_state_hash(&SHA3, &others);

    let result = prove_patricia_merkle(&f.key, &f.value, &path, &state_root, &others);
    assert_eq!(result, StateProofResult::Invalid);
}

#[test]
fn test_state_proof_is_deterministic() {
    let f = StateFixture::new();
    let path = f.wire_proof(&[&f.root, &f.inner, &f.leaf]);
    let verifier = MerkleVerifier::new(SHA3);

    let results: Vec<StateProofResult> = (0..4)
        .map(|_| {
            verifier.prove_patricia_merkle(&f.key, &f.value, &path, &f.state_root(), &f.subcache_roots)
        })
        .collect();
    assert!(results.iter().all(|r| *r == StateProofResult::ValidPositive));
}

#[test]
fn test_hash_algorithm_must_match() {
    let f = StateFixture::new();
    let path = f.wire_proof(&[&f.root, &f.inner, &f.leaf]);
    let sha256 = MerkleVerifier::new(HashAlgorithm::Sha256);

    let result =
        sha256.prove_patricia_merkle(&f.key, &f.value, &path, &f.state_root(), &f.subcache_roots);
    assert_eq!(result, StateProofResult::PathMismatch);
}
