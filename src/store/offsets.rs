//! Offset table parsing.
//!
//! A batch file starts with `batch_size` little-endian `u64` offsets, each
//! an absolute position within the same file. A zero offset marks the first
//! unwritten slot, except in slot 0 of the very first batch file where zero
//! is the genuine position of the first stored block.

use super::layout::{offset_table_size, OFFSET_SIZE};
use crate::error::{Result, StoreError};
use std::path::Path;
use tracing::{debug, warn};

/// Parse the offset table at the head of a batch file.
///
/// `first_batch` must be true only for the batch with group id 0. The
/// returned table holds one entry per written block.
pub fn parse_offsets(
    data: &[u8],
    batch_size: u64,
    first_batch: bool,
    path: &Path,
) -> Result<Vec<u64>> {
    let table_size = offset_table_size(batch_size).ok_or(StoreError::InvalidBatchSize)?;
    if data.len() < table_size {
        warn!(
            path = %path.display(),
            expected = table_size,
            actual = data.len(),
            "offset table is shorter than batch size"
        );
        return Err(StoreError::Truncated {
            path: path.to_path_buf(),
            expected: table_size,
            actual: data.len(),
        });
    }

    let mut offsets = Vec::with_capacity(table_size / OFFSET_SIZE);
    for (slot, chunk) in data[..table_size].chunks_exact(OFFSET_SIZE).enumerate() {
        let mut raw = [0u8; OFFSET_SIZE];
        raw.copy_from_slice(chunk);
        let offset = u64::from_le_bytes(raw);

        if offset == 0 && !(first_batch && slot == 0) {
            break;
        }
        offsets.push(offset);
    }

    debug!(
        path = %path.display(),
        written = offsets.len(),
        first_batch,
        "parsed offset table"
    );
    Ok(offsets)
}
