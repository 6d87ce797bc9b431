use std::collections::TryReserveError;

/// Errors that can be produced by [`BlockedList`](crate::BlockedList).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Position outside `0..len` (or `0..=len` for inserts).
    #[error("position {pos} is out of range for a list of length {len}")]
    OutOfRange { pos: usize, len: usize },

    /// Memory for a node, a block or the block index could not be reserved.
    /// The list is left exactly as it was before the call.
    #[error("allocation failed: {0}")]
    AllocationFailure(#[from] TryReserveError),

    #[error("block capacity {capacity} is too small, the minimum is {min}")]
    InvalidBlockCapacity { capacity: usize, min: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
