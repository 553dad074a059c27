//! Command handling for the `chainproof` binary: subcommands, exit
//! statuses, store construction from configuration, logging setup and the
//! JSON documents proofs arrive in.

use crate::block::RawBlock;
use crate::config::Config;
use crate::crypto::Hash256;
use crate::error::{ConfigError, ProofError, StoreError};
use crate::merkle::{decode_proof_path, MerklePart, MerkleVerifier, StateProofResult, TreeNode};
use crate::store::BatchBlockStore;
use clap::Subcommand;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Read succeeded or proof holds.
pub const EXIT_OK: u8 = 0;
/// Proof was checked and does not hold.
pub const EXIT_PROOF_FAILED: u8 = 1;
/// No verdict could be reached.
pub const EXIT_OPERATIONAL_ERROR: u8 = 2;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Prints the chain height recorded in index.dat
    Height,
    /// Prints the header of the block at the given height
    Block {
        height: u64,
        /// Re-read the batch file even if it is cached
        #[arg(long)]
        force_reread: bool,
        /// Refuse heights above the recorded chain height
        #[arg(long)]
        confirmed: bool,
    },
    /// Verifies that a transaction hash belongs to a transactions root
    ProveTx {
        /// Leaf hash (hex)
        #[arg(long)]
        leaf: Hash256,
        /// Expected root (hex)
        #[arg(long)]
        root: Hash256,
        /// JSON document with a `merklePath` array
        #[arg(long)]
        path: PathBuf,
    },
    /// Verifies a state entry against a block's state hash
    ProveState {
        /// Encoded state key (hex)
        #[arg(long)]
        key: String,
        /// Hash of the expected state value (hex)
        #[arg(long)]
        value: Hash256,
        /// JSON document with the serialized proof under `raw`
        #[arg(long)]
        proof: PathBuf,
        /// Block JSON holding the state hash and subcache roots
        #[arg(long)]
        block: PathBuf,
    },
}

/// What a command found.
#[derive(Debug)]
pub enum Outcome {
    Height(u64),
    Block(RawBlock),
    TransactionProof { leaf: Hash256, valid: bool },
    StateProof(StateProofResult),
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::TransactionProof { valid: false, .. } => EXIT_PROOF_FAILED,
            Outcome::StateProof(result) if !result.is_valid() => EXIT_PROOF_FAILED,
            _ => EXIT_OK,
        }
    }
}

/// Exit status for a finished command. A failed proof and a failed read
/// never share a status.
pub fn exit_code(result: &Result<Outcome, CliError>) -> u8 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(_) => EXIT_OPERATIONAL_ERROR,
    }
}

pub fn run(command: &Commands, config: &Config) -> Result<Outcome, CliError> {
    match command {
        Commands::Height => {
            let store = open_store_from_config(config)?;
            Ok(Outcome::Height(store.get_chain_height()?))
        }
        Commands::Block {
            height,
            force_reread,
            confirmed,
        } => {
            let mut store = open_store_from_config(config)?;
            let block = if *confirmed {
                store.get_confirmed_block(*height, *force_reread)?
            } else {
                store.get_block(*height, *force_reread)?
            };
            info!("read block {} from {:?}", height, store.cached_path());
            Ok(Outcome::Block(block))
        }
        Commands::ProveTx { leaf, root, path } => {
            let document: TransactionProofDocument = read_json(path)?;
            let verifier = MerkleVerifier::new(config.proof.hash);
            let valid = verifier.prove_merkle(leaf, &document.merkle_path, root);
            info!(
                "checked {}-step transaction proof with {}",
                document.merkle_path.len(),
                config.proof.hash
            );
            Ok(Outcome::TransactionProof { leaf: *leaf, valid })
        }
        Commands::ProveState {
            key,
            value,
            proof,
            block,
        } => {
            let key = hex::decode(key.trim()).map_err(ProofError::from)?;
            let proof_document: StateProofDocument = read_json(proof)?;
            let block_document: BlockStateDocument = read_json(block)?;
            let proof_path = proof_document.proof_path()?;

            let verifier = MerkleVerifier::new(config.proof.hash);
            let result = verifier.prove_patricia_merkle(
                &key,
                value,
                &proof_path,
                &block_document.block.state_hash,
                &block_document.meta.state_hash_sub_cache_merkle_roots,
            );
            info!("checked {}-node state proof: {}", proof_path.len(), result);
            Ok(Outcome::StateProof(result))
        }
    }
}

/// Anything that stops the CLI from reaching a verdict.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Install the fmt subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub fn open_store_from_config(config: &Config) -> Result<BatchBlockStore, StoreError> {
    BatchBlockStore::new(&config.store.data_dir, config.store.batch_size)
}

/// Read and deserialize a JSON document from disk.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&contents).map_err(ProofError::from)?;
    Ok(value)
}

/// Transaction proof as served by the REST gateway.
#[derive(Debug, Deserialize)]
pub struct TransactionProofDocument {
    #[serde(rename = "merklePath")]
    pub merkle_path: Vec<MerklePart>,
}

/// State proof carrying the serialized trie nodes as hex.
#[derive(Debug, Deserialize)]
pub struct StateProofDocument {
    pub raw: String,
}

impl StateProofDocument {
    /// Decoded nodes, leaf to root.
    pub fn proof_path(&self) -> Result<Vec<TreeNode>, ProofError> {
        let bytes = hex::decode(self.raw.trim())?;
        decode_proof_path(&bytes)
    }
}

/// The parts of a block document needed to check a state proof.
#[derive(Debug, Deserialize)]
pub struct BlockStateDocument {
    pub block: BlockStateFields,
    pub meta: BlockMetaFields,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStateFields {
    pub state_hash: Hash256,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetaFields {
    #[serde(default)]
    pub state_hash_sub_cache_merkle_roots: Vec<Hash256>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{HashAlgorithm, Hasher256};
    use crate::merkle::{compose_state_hash, encode_tree_nodes, MerkleTree, NibblePath};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> Config {
        let mut config = Config::default();
        config.store.data_dir = dir.to_path_buf();
        config.store.batch_size = 3;
        config
    }

    fn write_json(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn transaction_command(dir: &Path, tamper: bool) -> Commands {
        let leaves: Vec<Hash256> = (0..4u8)
            .map(|i| HashAlgorithm::Sha3_256.digest(&[&[i]]))
            .collect();
        let tree = MerkleTree::build(HashAlgorithm::Sha3_256, leaves.clone());
        let mut merkle_path = tree.proof(2).unwrap();
        if tamper {
            merkle_path[0].hash.0[0] ^= 0xFF;
        }
        let path = write_json(dir, "tx.json", json!({ "merklePath": merkle_path }));

        Commands::ProveTx {
            leaf: leaves[2],
            root: tree.root(),
            path,
        }
    }

    #[test]
    fn test_valid_transaction_proof_exits_zero() {
        let dir = TempDir::new().unwrap();
        let result = run(&transaction_command(dir.path(), false), &config_for(dir.path()));
        assert!(matches!(result, Ok(Outcome::TransactionProof { valid: true, .. })));
        assert_eq!(exit_code(&result), EXIT_OK);
    }

    #[test]
    fn test_failed_transaction_proof_exits_one() {
        let dir = TempDir::new().unwrap();
        let result = run(&transaction_command(dir.path(), true), &config_for(dir.path()));
        assert!(matches!(result, Ok(Outcome::TransactionProof { valid: false, .. })));
        assert_eq!(exit_code(&result), EXIT_PROOF_FAILED);
    }

    #[test]
    fn test_state_proof_path_mismatch_exits_one() {
        let dir = TempDir::new().unwrap();
        let hasher = HashAlgorithm::Sha3_256;
        let key = [0xABu8; 32];
        let value = hasher.digest(&[b"account"]);
        let leaf = TreeNode::leaf(NibblePath::from_bytes(&key), value);
        let raw = hex::encode(encode_tree_nodes(&[leaf.clone()]).unwrap());
        let proof = write_json(dir.path(), "proof.json", json!({ "raw": raw }));

        let roots = vec![hasher.digest(&[b"mosaics"]), leaf.hash(&hasher)];
        let mut reordered = roots.clone();
        reordered.reverse();
        let block = write_json(
            dir.path(),
            "block.json",
            json!({
                "block": { "stateHash": compose_state_hash(&hasher, &roots) },
                "meta": { "stateHashSubCacheMerkleRoots": reordered },
            }),
        );

        let command = Commands::ProveState {
            key: hex::encode(key),
            value,
            proof: proof.clone(),
            block,
        };
        let result = run(&command, &config_for(dir.path()));
        assert!(matches!(
            result,
            Ok(Outcome::StateProof(StateProofResult::PathMismatch))
        ));
        assert_eq!(exit_code(&result), EXIT_PROOF_FAILED);

        let block = write_json(
            dir.path(),
            "block.json",
            json!({
                "block": { "stateHash": compose_state_hash(&hasher, &roots) },
                "meta": { "stateHashSubCacheMerkleRoots": roots },
            }),
        );
        let command = Commands::ProveState {
            key: hex::encode(key),
            value,
            proof,
            block,
        };
        let result = run(&command, &config_for(dir.path()));
        assert!(matches!(
            result,
            Ok(Outcome::StateProof(StateProofResult::ValidPositive))
        ));
        assert_eq!(exit_code(&result), EXIT_OK);
    }

    #[test]
    fn test_missing_batch_file_exits_two() {
        let dir = TempDir::new().unwrap();
        let command = Commands::Block {
            height: 5,
            force_reread: false,
            confirmed: false,
        };
        let result = run(&command, &config_for(dir.path()));
        assert!(matches!(&result, Err(CliError::Store(e)) if e.is_io()));
        assert_eq!(exit_code(&result), EXIT_OPERATIONAL_ERROR);
    }

    #[test]
    fn test_bad_key_hex_exits_two() {
        let dir = TempDir::new().unwrap();
        let command = Commands::ProveState {
            key: "not hex".to_string(),
            value: Hash256::zero(),
            proof: dir.path().join("proof.json"),
            block: dir.path().join("block.json"),
        };
        let result = run(&command, &config_for(dir.path()));
        assert!(matches!(result, Err(CliError::Proof(ProofError::InvalidHex(_)))));
        assert_eq!(exit_code(&result), EXIT_OPERATIONAL_ERROR);
    }

    #[test]
    fn test_height_exits_zero() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.dat"), 42u64.to_le_bytes()).unwrap();
        let result = run(&Commands::Height, &config_for(dir.path()));
        assert!(matches!(result, Ok(Outcome::Height(42))));
        assert_eq!(exit_code(&result), EXIT_OK);
    }

    #[test]
    fn test_transaction_proof_document() {
        let json = r#"{"merklePath": [
            {"hash": "11111111111111111111111111111111111111111111111111111111111111AA", "position": "right"}
        ]}"#;
        let doc: TransactionProofDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.merkle_path.len(), 1);
        assert!(!doc.merkle_path[0].is_left);
        assert_eq!(doc.merkle_path[0].hash.as_bytes()[31], 0xAA);
    }

    #[test]
    fn test_block_state_document() {
        let root = "22".repeat(32);
        let json = format!(
            r#"{{"block": {{"stateHash": "{root}", "height": "9"}},
                "meta": {{"hash": "x", "stateHashSubCacheMerkleRoots": ["{root}", "{root}"]}}}}"#
        );
        let doc: BlockStateDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.block.state_hash, Hash256([0x22; 32]));
        assert_eq!(doc.meta.state_hash_sub_cache_merkle_roots.len(), 2);
    }

    #[test]
    fn test_state_proof_document_decodes_leaf_first() {
        let value = Hash256([0x42; 32]);
        let mut links = [None; 16];
        links[1] = Some(Hash256([0x01; 32]));
        let nodes = vec![
            TreeNode::branch(NibblePath::new(), links),
            TreeNode::leaf(NibblePath::from_bytes(&[0xAB]), value),
        ];
        let raw = hex::encode(encode_tree_nodes(&nodes).unwrap());

        let doc = StateProofDocument { raw };
        let path = doc.proof_path().unwrap();
        assert!(path[0].is_leaf());
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_state_proof_document_rejects_bad_hex() {
        let doc = StateProofDocument {
            raw: "zz".to_string(),
        };
        assert!(matches!(doc.proof_path(), Err(ProofError::InvalidHex(_))));
    }

    #[test]
    fn test_read_json_missing_file() {
        let dir = TempDir::new().unwrap();
        let result: Result<StateProofDocument, _> = read_json(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(CliError::Read { .. })));
    }
}
