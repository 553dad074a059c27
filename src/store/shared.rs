//! Lock-guarded block store for use across threads.

use super::BatchBlockStore;
use crate::block::{BlockDecoder, HeaderDecoder};
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to one `BatchBlockStore` behind a mutex.
///
/// The lock is held for the whole of `get_block` so a concurrent request for
/// another batch cannot swap the cached file mid-read.
pub struct SharedBlockStore<D: BlockDecoder = HeaderDecoder> {
    inner: Arc<Mutex<BatchBlockStore<D>>>,
}

impl<D: BlockDecoder> SharedBlockStore<D> {
    pub fn new(store: BatchBlockStore<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn get_chain_height(&self) -> Result<u64> {
        self.inner.lock().get_chain_height()
    }

    pub fn get_block(&self, height: u64, force_reread: bool) -> Result<D::Block> {
        self.inner.lock().get_block(height, force_reread)
    }

    pub fn get_confirmed_block(&self, height: u64, force_reread: bool) -> Result<D::Block> {
        self.inner.lock().get_confirmed_block(height, force_reread)
    }

    pub fn batch_reads(&self) -> u64 {
        self.inner.lock().batch_reads()
    }
}

impl<D: BlockDecoder> Clone for SharedBlockStore<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
