//! Two-pointer block compaction
//!
//! Moves the rightmost occupied block into the leftmost empty block until
//! the cursors cross. Files are split freely; only final (position, id)
//! pairs matter to the checksum.
//!
//! ```text
//! 0..111....22222
//! 02.111....2222.
//! 022111....222..
//! 0221112...22...
//! ```

use crate::block::{Block, BlockStore};
use crate::compact::{trace_store, CompactionReport, Compactor};
use crate::config::CompactionPolicy;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct FragmentingCompactor {
    trace: bool,
}

impl FragmentingCompactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dump the block map after every move
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

impl Compactor for FragmentingCompactor {
    fn policy(&self) -> CompactionPolicy {
        CompactionPolicy::Fragment
    }

    fn compact(&mut self, store: &mut BlockStore) -> Result<CompactionReport> {
        let mut report = CompactionReport {
            policy: Some(self.policy()),
            ..Default::default()
        };

        trace_store(self.trace, store);

        let mut left = store.next_empty(0);
        let mut right = store.last_occupied(store.len());

        while let (Some(l), Some(r)) = (left, right) {
            if l >= r {
                break;
            }

            let moved = store.get(r)?;
            store.set(l, moved)?;
            store.set(r, Block::Empty)?;
            report.blocks_moved += 1;

            trace_store(self.trace, store);

            left = store.next_empty(l + 1);
            right = store.last_occupied(r);
        }

        tracing::debug!("Fragmenting compaction moved {} blocks", report.blocks_moved);

        Ok(report)
    }
}
