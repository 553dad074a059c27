//! Single-slot cache for the most recently read batch file
//!
//! The slot is either empty or holds one fully buffered batch file together
//! with its parsed offset table, so path, bytes and offsets can never
//! disagree with each other.

use crate::error::{Result, StoreError};
use crate::store::layout::{batch_file_path, group_id};
use crate::store::offsets::parse_offsets;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A batch file held in memory together with its parsed offset table.
#[derive(Debug, Clone)]
pub struct LoadedBatch {
    pub path: PathBuf,
    pub group_id: u64,
    pub data: Vec<u8>,
    pub offsets: Vec<u64>,
}

impl LoadedBatch {
    /// Read and parse the batch file with the given group id.
    pub fn read(data_dir: &Path, group_id: u64, batch_size: u64) -> Result<Self> {
        let path = batch_file_path(data_dir, group_id);
        let data = fs::read(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let offsets = parse_offsets(&data, batch_size, group_id == 0, &path)?;

        Ok(Self {
            path,
            group_id,
            data,
            offsets,
        })
    }
}

/// Capacity-1 cache keyed by batch file path.
#[derive(Debug, Default)]
pub struct BatchCache {
    slot: Option<LoadedBatch>,
    reads: u64,
    hits: u64,
}

impl BatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the batch covering `height`, reading it from disk unless it is
    /// already buffered and `force_reread` is false.
    ///
    /// A failed read leaves the previously buffered batch in place.
    pub fn load(
        &mut self,
        data_dir: &Path,
        batch_size: u64,
        height: u64,
        force_reread: bool,
    ) -> Result<&LoadedBatch> {
        let group_id = group_id(height, batch_size);
        let path = batch_file_path(data_dir, group_id);

        let batch = match self.slot.take() {
            Some(batch) if batch.path == path && !force_reread => {
                debug!(height, path = %path.display(), "batch cache hit");
                self.hits += 1;
                batch
            }
            previous => {
                debug!(height, path = %path.display(), force_reread, "reading batch file");
                match LoadedBatch::read(data_dir, group_id, batch_size) {
                    Ok(batch) => {
                        self.reads += 1;
                        batch
                    }
                    Err(e) => {
                        self.slot = previous;
                        return Err(e);
                    }
                }
            }
        };

        let batch: &LoadedBatch = self.slot.insert(batch);
        Ok(batch)
    }

    pub fn path(&self) -> Option<&Path> {
        self.slot.as_ref().map(|batch| batch.path.as_path())
    }

    /// Number of batch files physically read.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
