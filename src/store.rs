// Batch block store: layout helpers, offset-table parsing, the store itself
// and a lock-guarded handle for multi-threaded callers.

pub mod batch;
pub mod layout;
pub mod offsets;
pub mod shared;

pub use batch::BatchBlockStore;
pub use offsets::parse_offsets;
pub use shared::SharedBlockStore;
