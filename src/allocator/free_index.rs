//! Segregated free list keyed by run length
//!
//! Every free run is filed under the bucket matching its length. Each bucket
//! is a min-heap of run start positions, so its head is always the leftmost
//! run of that length.
//!
//! Lookups are leftmost-fit: among all runs at least as long as the request,
//! the one with the smallest start wins, however much larger than needed it
//! is. Adjacent runs are never coalesced.

use crate::block::BlockStore;
use crate::error::{DiskError, Result};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

/// Free runs bucketed by length
#[derive(Debug, Clone, Default)]
pub struct FreeSpaceIndex {
    /// Run length -> start positions, smallest start on top
    buckets: BTreeMap<usize, BinaryHeap<Reverse<usize>>>,

    /// Number of runs currently registered
    entries: usize,
}

impl FreeSpaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every maximal free run in a single left-to-right scan
    pub fn build(store: &BlockStore) -> Self {
        let mut index = FreeSpaceIndex::new();
        for run in store.free_runs() {
            index.insert(run.start, run.length);
        }

        tracing::debug!(
            "Built free space index: {} runs in {} buckets",
            index.entries,
            index.buckets.len()
        );

        index
    }

    /// Take the leftmost run holding at least `min_length` blocks
    ///
    /// Only the head of each long-enough bucket is examined. On success the
    /// entry is removed from its bucket; on [`DiskError::NoSpaceFound`] the
    /// index is left untouched.
    pub fn find_first_suitable(&mut self, min_length: usize) -> Result<usize> {
        let best = self
            .buckets
            .range(min_length..)
            .filter_map(|(&length, heap)| heap.peek().map(|&Reverse(start)| (start, length)))
            .min();

        let (start, length) = best.ok_or(DiskError::NoSpaceFound { min_length })?;

        if let Some(heap) = self.buckets.get_mut(&length) {
            heap.pop();
            if heap.is_empty() {
                self.buckets.remove(&length);
            }
        }
        self.entries -= 1;

        Ok(start)
    }

    /// Measure the free run beginning at `start` and file it by length
    ///
    /// `start` must sit on a run boundary. A zero-length measurement
    /// registers nothing.
    pub fn register(&mut self, store: &BlockStore, start: usize) {
        let length = store.empty_run_length(start);
        if length == 0 {
            return;
        }
        tracing::trace!("Registering free run at {} ({} blocks)", start, length);
        self.insert(start, length);
    }

    fn insert(&mut self, start: usize, length: usize) {
        self.buckets
            .entry(length)
            .or_default()
            .push(Reverse(start));
        self.entries += 1;
    }

    /// Number of runs registered
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of distinct run lengths with at least one entry
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Check whether a run starting at `start` is registered
    pub fn contains(&self, start: usize) -> bool {
        self.buckets
            .values()
            .any(|heap| heap.iter().any(|&Reverse(s)| s == start))
    }
}
