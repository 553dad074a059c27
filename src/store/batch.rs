//! Read-only block store over height-indexed batch files.

use super::layout::{entry_in_batch, index_file_path, offset_table_size, OFFSET_SIZE};
use crate::block::{BlockDecoder, HeaderDecoder};
use crate::cache::BatchCache;
use crate::error::{Result, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads blocks by height from a batch-file store.
///
/// At most one batch file is buffered at a time. The store never keeps a file
/// handle open between calls, only the bytes. `get_block` mutates the cache,
/// so sharing one instance between threads needs a lock (see
/// [`SharedBlockStore`](super::SharedBlockStore)).
pub struct BatchBlockStore<D: BlockDecoder = HeaderDecoder> {
    data_dir: PathBuf,
    batch_size: u64,
    decoder: D,
    cache: BatchCache,
}

impl BatchBlockStore<HeaderDecoder> {
    pub fn new(data_dir: impl Into<PathBuf>, batch_size: u64) -> Result<Self> {
        Self::with_decoder(data_dir, batch_size, HeaderDecoder)
    }
}

impl<D: BlockDecoder> BatchBlockStore<D> {
    pub fn with_decoder(data_dir: impl Into<PathBuf>, batch_size: u64, decoder: D) -> Result<Self> {
        if batch_size == 0 || offset_table_size(batch_size).is_none() {
            return Err(StoreError::InvalidBatchSize);
        }

        Ok(Self {
            data_dir: data_dir.into(),
            batch_size,
            decoder,
            cache: BatchCache::new(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Number of batch files physically read since construction.
    pub fn batch_reads(&self) -> u64 {
        self.cache.reads()
    }

    /// Path of the currently buffered batch file, if any.
    pub fn cached_path(&self) -> Option<&Path> {
        self.cache.path()
    }

    /// Read the chain height from `index.dat`.
    pub fn get_chain_height(&self) -> Result<u64> {
        let path = index_file_path(&self.data_dir);
        let data = fs::read(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        if data.len() < OFFSET_SIZE {
            return Err(StoreError::Truncated {
                path,
                expected: OFFSET_SIZE,
                actual: data.len(),
            });
        }

        let mut raw = [0u8; OFFSET_SIZE];
        raw.copy_from_slice(&data[..OFFSET_SIZE]);
        Ok(u64::from_le_bytes(raw))
    }

    /// Return the block at `height`.
    ///
    /// The covering batch file is read only if it is not the buffered one or
    /// `force_reread` is set. Offsets are absolute positions in the batch
    /// file, and the decoder receives everything from the offset onwards.
    pub fn get_block(&mut self, height: u64, force_reread: bool) -> Result<D::Block> {
        let batch = self
            .cache
            .load(&self.data_dir, self.batch_size, height, force_reread)?;

        let entry = entry_in_batch(height, self.batch_size);
        let offset = *batch.offsets.get(entry).ok_or(StoreError::OutOfRange {
            height,
            available: batch.offsets.len(),
        })?;

        if offset >= batch.data.len() as u64 {
            return Err(StoreError::CorruptBlock {
                offset,
                reason: format!(
                    "offset is beyond the end of {} ({} bytes)",
                    batch.path.display(),
                    batch.data.len()
                ),
            });
        }

        debug!(height, entry, offset, "decoding block");
        self.decoder.decode(&batch.data[offset as usize..], offset)
    }

    /// Like `get_block`, but first rejects heights above the chain height.
    pub fn get_confirmed_block(&mut self, height: u64, force_reread: bool) -> Result<D::Block> {
        let chain_height = self.get_chain_height()?;
        if height > chain_height {
            return Err(StoreError::BeyondChainHeight {
                height,
                chain_height,
            });
        }
        self.get_block(height, force_reread)
    }
}
