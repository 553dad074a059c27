//! Block decoding
//!
//! The store hands every decoder the batch buffer from the block's offset to
//! the end of the file. Blocks are length-prefixed, so a decoder is
//! responsible for cutting its own slice.

use crate::crypto::Hash256;
use crate::error::{Result, StoreError};

/// Size of the common block header in bytes.
pub const HEADER_SIZE: usize = 372;

pub const SIGNATURE_SIZE: usize = 64;
pub const PUBLIC_KEY_SIZE: usize = 32;
pub const ADDRESS_SIZE: usize = 24;

// Field offsets within the header.
const SIGNATURE_OFFSET: usize = 8;
const SIGNER_OFFSET: usize = 72;
const VERSION_OFFSET: usize = 108;
const NETWORK_OFFSET: usize = 109;
const TYPE_OFFSET: usize = 110;
const HEIGHT_OFFSET: usize = 112;
const TIMESTAMP_OFFSET: usize = 120;
const DIFFICULTY_OFFSET: usize = 128;
const PREVIOUS_HASH_OFFSET: usize = 216;
const TRANSACTIONS_HASH_OFFSET: usize = 248;
const RECEIPTS_HASH_OFFSET: usize = 280;
const STATE_HASH_OFFSET: usize = 312;
const BENEFICIARY_OFFSET: usize = 344;
const FEE_MULTIPLIER_OFFSET: usize = 368;

/// Turns the bytes at a block offset into a block.
pub trait BlockDecoder {
    type Block;

    fn decode(&self, bytes: &[u8], offset: u64) -> Result<Self::Block>;
}

impl<F, B> BlockDecoder for F
where
    F: Fn(&[u8]) -> Result<B>,
{
    type Block = B;

    fn decode(&self, bytes: &[u8], _offset: u64) -> Result<B> {
        self(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub size: u32,
    pub signature: [u8; SIGNATURE_SIZE],
    pub signer_public_key: [u8; PUBLIC_KEY_SIZE],
    pub version: u8,
    pub network: u8,
    pub block_type: u16,
    pub height: u64,
    pub timestamp: u64,
    pub difficulty: u64,
    pub previous_block_hash: Hash256,
    pub transactions_hash: Hash256,
    pub receipts_hash: Hash256,
    pub state_hash: Hash256,
    pub beneficiary_address: [u8; ADDRESS_SIZE],
    pub fee_multiplier: u32,
}

impl BlockHeader {
    /// Parse the common header from the start of `bytes`.
    pub fn parse(bytes: &[u8], offset: u64) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::CorruptBlock {
                offset,
                reason: format!(
                    "header needs {} bytes, {} available",
                    HEADER_SIZE,
                    bytes.len()
                ),
            });
        }

        Ok(BlockHeader {
            size: read_u32(bytes, 0),
            signature: read_array(bytes, SIGNATURE_OFFSET),
            signer_public_key: read_array(bytes, SIGNER_OFFSET),
            version: bytes[VERSION_OFFSET],
            network: bytes[NETWORK_OFFSET],
            block_type: u16::from_le_bytes(read_array(bytes, TYPE_OFFSET)),
            height: read_u64(bytes, HEIGHT_OFFSET),
            timestamp: read_u64(bytes, TIMESTAMP_OFFSET),
            difficulty: read_u64(bytes, DIFFICULTY_OFFSET),
            previous_block_hash: Hash256(read_array(bytes, PREVIOUS_HASH_OFFSET)),
            transactions_hash: Hash256(read_array(bytes, TRANSACTIONS_HASH_OFFSET)),
            receipts_hash: Hash256(read_array(bytes, RECEIPTS_HASH_OFFSET)),
            state_hash: Hash256(read_array(bytes, STATE_HASH_OFFSET)),
            beneficiary_address: read_array(bytes, BENEFICIARY_OFFSET),
            fee_multiplier: read_u32(bytes, FEE_MULTIPLIER_OFFSET),
        })
    }

    /// Serialize the header into its `HEADER_SIZE`-byte layout. Reserved
    /// fields and the generation hash proof are written as zeros.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.size.to_le_bytes());
        write_at(&mut bytes, SIGNATURE_OFFSET, &self.signature);
        write_at(&mut bytes, SIGNER_OFFSET, &self.signer_public_key);
        bytes[VERSION_OFFSET] = self.version;
        bytes[NETWORK_OFFSET] = self.network;
        write_at(&mut bytes, TYPE_OFFSET, &self.block_type.to_le_bytes());
        write_at(&mut bytes, HEIGHT_OFFSET, &self.height.to_le_bytes());
        write_at(&mut bytes, TIMESTAMP_OFFSET, &self.timestamp.to_le_bytes());
        write_at(&mut bytes, DIFFICULTY_OFFSET, &self.difficulty.to_le_bytes());
        write_at(&mut bytes, PREVIOUS_HASH_OFFSET, self.previous_block_hash.as_bytes());
        write_at(&mut bytes, TRANSACTIONS_HASH_OFFSET, self.transactions_hash.as_bytes());
        write_at(&mut bytes, RECEIPTS_HASH_OFFSET, self.receipts_hash.as_bytes());
        write_at(&mut bytes, STATE_HASH_OFFSET, self.state_hash.as_bytes());
        write_at(&mut bytes, BENEFICIARY_OFFSET, &self.beneficiary_address);
        write_at(&mut bytes, FEE_MULTIPLIER_OFFSET, &self.fee_multiplier.to_le_bytes());
        bytes
    }
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            size: HEADER_SIZE as u32,
            signature: [0u8; SIGNATURE_SIZE],
            signer_public_key: [0u8; PUBLIC_KEY_SIZE],
            version: 1,
            network: 0x68,
            block_type: 0x8143,
            height: 0,
            timestamp: 0,
            difficulty: 0,
            previous_block_hash: Hash256::zero(),
            transactions_hash: Hash256::zero(),
            receipts_hash: Hash256::zero(),
            state_hash: Hash256::zero(),
            beneficiary_address: [0u8; ADDRESS_SIZE],
            fee_multiplier: 0,
        }
    }
}

/// A decoded block: its header plus exactly `header.size` raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub header: BlockHeader,
    pub bytes: Vec<u8>,
}

impl RawBlock {
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Bytes following the header (transactions and block-type specific fields).
    pub fn body(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }
}

/// Default decoder: reads the size prefix and the common header.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder;

impl BlockDecoder for HeaderDecoder {
    type Block = RawBlock;

    fn decode(&self, bytes: &[u8], offset: u64) -> Result<RawBlock> {
        if bytes.len() < 4 {
            return Err(StoreError::CorruptBlock {
                offset,
                reason: "missing size prefix".to_string(),
            });
        }

        let size = read_u32(bytes, 0) as usize;
        if size < HEADER_SIZE {
            return Err(StoreError::CorruptBlock {
                offset,
                reason: format!("declared size {} is smaller than the header", size),
            });
        }
        if size > bytes.len() {
            return Err(StoreError::CorruptBlock {
                offset,
                reason: format!(
                    "declared size {} exceeds the {} bytes left in the batch file",
                    size,
                    bytes.len()
                ),
            });
        }

        let bytes = &bytes[..size];
        let header = BlockHeader::parse(bytes, offset)?;
        Ok(RawBlock {
            header,
            bytes: bytes.to_vec(),
        })
    }
}

// Callers guarantee the slice is long enough.
fn read_array<const N: usize>(bytes: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(read_array(bytes, at))
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    u64::from_le_bytes(read_array(bytes, at))
}

fn write_at(bytes: &mut [u8], at: usize, value: &[u8]) {
    bytes[at..at + value.len()].copy_from_slice(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> BlockHeader {
        BlockHeader {
            height: 1234,
            timestamp: 98_765,
            difficulty: 100_000_000_000_000,
            transactions_hash: Hash256([0xAA; 32]),
            state_hash: Hash256([0x55; 32]),
            fee_multiplier: 7,
            ..BlockHeader::default()
        }
    }

    #[test]
    fn test_decode_header_fields() {
        let header = sample_header();
        let block = HeaderDecoder.decode(&header.to_bytes(), 0).unwrap();

        assert_eq!(block.header, header);
        assert_eq!(block.height(), 1234);
        assert_eq!(block.bytes.len(), HEADER_SIZE);
        assert!(block.body().is_empty());
    }

    #[test]
    fn test_decode_cuts_at_declared_size() {
        let mut header = sample_header();
        header.size = (HEADER_SIZE + 4) as u32;
        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        // Trailing bytes belong to the next block.
        bytes.extend_from_slice(&[9; 50]);

        let block = HeaderDecoder.decode(&bytes, 24).unwrap();
        assert_eq!(block.bytes.len(), HEADER_SIZE + 4);
        assert_eq!(block.body(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_rejects_oversized_block() {
        let mut header = sample_header();
        header.size = (HEADER_SIZE + 100) as u32;
        let result = HeaderDecoder.decode(&header.to_bytes(), 24);
        assert!(matches!(
            result,
            Err(StoreError::CorruptBlock { offset: 24, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_undersized_block() {
        let mut bytes = sample_header().to_bytes();
        bytes[0..4].copy_from_slice(&10u32.to_le_bytes());
        assert!(HeaderDecoder.decode(&bytes, 0).is_err());
        assert!(HeaderDecoder.decode(&[1, 2], 0).is_err());
    }

    #[test]
    fn test_closure_decoder() {
        let decoder = |bytes: &[u8]| -> Result<usize> { Ok(bytes.len()) };
        assert_eq!(decoder.decode(&[0u8; 10], 0).unwrap(), 10);
    }
}
