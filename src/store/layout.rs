//! On-disk layout of the batch block store.
//!
//! `<data_dir>/index.dat` holds the chain height. Blocks live in batch files
//! at `<data_dir>/<dir5>/<file5>.dat`, where the batch's group id is split
//! into a directory and a file number of `OBJECTS_PER_STORAGE_DIRECTORY`.

use std::path::{Path, PathBuf};

pub const OBJECTS_PER_STORAGE_DIRECTORY: u64 = 10_000;
pub const INDEX_FILE_NAME: &str = "index.dat";
pub const OFFSET_SIZE: usize = 8;

/// Height of the first block in the batch covering `height`.
pub fn group_id(height: u64, batch_size: u64) -> u64 {
    (height / batch_size) * batch_size
}

/// Slot of `height` within its batch.
pub fn entry_in_batch(height: u64, batch_size: u64) -> usize {
    (height % batch_size) as usize
}

/// Byte length of the offset table at the head of each batch file, or `None`
/// if `batch_size` offsets cannot be addressed on this platform.
pub fn offset_table_size(batch_size: u64) -> Option<usize> {
    batch_size
        .checked_mul(OFFSET_SIZE as u64)
        .and_then(|size| usize::try_from(size).ok())
}

pub fn batch_file_path(data_dir: &Path, group_id: u64) -> PathBuf {
    let directory = format!("{:05}", group_id / OBJECTS_PER_STORAGE_DIRECTORY);
    let name = format!("{:05}.dat", group_id % OBJECTS_PER_STORAGE_DIRECTORY);
    data_dir.join(directory).join(name)
}

pub fn index_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(INDEX_FILE_NAME)
}
