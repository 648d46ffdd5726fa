//! Positional checksum over a block array

use crate::block::{Block, BlockStore};
use crate::error::{DiskError, Result};

/// Sum of `position * file_id` over every occupied block
///
/// Empty blocks contribute nothing. Fails with
/// [`DiskError::ChecksumOverflow`] rather than wrapping.
pub fn checksum(store: &BlockStore) -> Result<u64> {
    store
        .blocks()
        .iter()
        .enumerate()
        .try_fold(0u64, |acc, (pos, block)| match block {
            Block::Empty => Ok(acc),
            Block::Occupied(id) => u64::try_from(pos)
                .ok()
                .and_then(|p| p.checked_mul(*id))
                .and_then(|term| acc.checked_add(term))
                .ok_or(DiskError::ChecksumOverflow { position: pos }),
        })
}
