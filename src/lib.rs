//! A blocked (unrolled) singly-linked list of integers.
//!
//! [`BlockedList`] keeps its values in a plain singly-linked chain of nodes and
//! overlays it with an index of fixed-capacity blocks, each caching a run of
//! consecutive nodes. Positional `get`, `insert` and `remove_at` jump through
//! the index instead of walking the chain. Full blocks split in half, and
//! neighbouring blocks merge back together once they fit in one.
//!
//! Nodes live in an arena and are addressed by index, so blocks never hold
//! dangling references after a removal.

mod arena;
mod error;
mod list;

pub use error::{Error, Result};
pub use list::{BlockedList, Iter};

/// Default number of nodes a block can hold.
pub const BLOCK_CAPACITY: usize = 64;

/// Smallest block capacity for which a split leaves both halves non-empty.
pub const MIN_BLOCK_CAPACITY: usize = 2;

/// Number of blocks the index has room for before its first growth.
pub const INITIAL_BLOCKS: usize = 16;
