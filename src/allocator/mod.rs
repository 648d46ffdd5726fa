//! Space accounting over a [`BlockStore`]
//!
//! Extents and free runs are derived views: they are recomputed from the
//! block array on demand rather than stored alongside it.
//!
//! - [`Extent`] - maximal run of blocks owned by one file
//! - [`FreeRun`] - maximal run of empty blocks
//! - [`free_index`] - segregated free list used by the extent defragmenter

pub mod free_index;

use crate::block::{Block, BlockStore, FileId};
use serde::{Deserialize, Serialize};

pub use free_index::FreeSpaceIndex;

/// A maximal contiguous run of blocks sharing one file id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub file_id: FileId,
    /// First block of the run
    pub start: usize,
    /// Number of contiguous blocks
    pub length: usize,
}

impl Extent {
    pub fn new(file_id: FileId, start: usize, length: usize) -> Self {
        Extent {
            file_id,
            start,
            length,
        }
    }

    /// One past the last block
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end()
    }
}

/// A maximal contiguous run of empty blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRun {
    pub start: usize,
    pub length: usize,
}

impl FreeRun {
    pub fn new(start: usize, length: usize) -> Self {
        FreeRun { start, length }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Check if this run can hold `length` blocks
    pub fn fits(&self, length: usize) -> bool {
        self.length >= length
    }
}

impl BlockStore {
    /// All extents, left to right
    pub fn extents(&self) -> Vec<Extent> {
        let blocks = self.blocks();
        let mut extents = Vec::new();
        let mut pos = 0;

        while pos < blocks.len() {
            match blocks[pos] {
                Block::Empty => pos += 1,
                Block::Occupied(id) => {
                    let start = pos;
                    while pos < blocks.len() && blocks[pos] == Block::Occupied(id) {
                        pos += 1;
                    }
                    extents.push(Extent::new(id, start, pos - start));
                }
            }
        }

        extents
    }

    /// All free runs, left to right
    pub fn free_runs(&self) -> Vec<FreeRun> {
        let blocks = self.blocks();
        let mut runs = Vec::new();
        let mut pos = 0;

        while pos < blocks.len() {
            if blocks[pos].is_occupied() {
                pos += 1;
                continue;
            }
            let start = pos;
            pos += self.empty_run_length(start);
            runs.push(FreeRun::new(start, pos - start));
        }

        runs
    }

    /// Number of consecutive empty blocks beginning at `start`
    ///
    /// Returns 0 when `start` is occupied or past the end.
    pub fn empty_run_length(&self, start: usize) -> usize {
        self.blocks()
            .get(start..)
            .map_or(0, |tail| tail.iter().take_while(|b| b.is_empty()).count())
    }

    /// Position of the first empty block at or after `from`
    pub fn next_empty(&self, from: usize) -> Option<usize> {
        let tail = self.blocks().get(from..)?;
        tail.iter().position(Block::is_empty).map(|i| from + i)
    }

    /// Position of the last occupied block strictly before `before`
    pub fn last_occupied(&self, before: usize) -> Option<usize> {
        let end = before.min(self.len());
        self.blocks()[..end].iter().rposition(Block::is_occupied)
    }

    /// The extent ending at the last occupied block strictly before `before`
    pub fn last_extent(&self, before: usize) -> Option<Extent> {
        let last = self.last_occupied(before)?;
        let blocks = self.blocks();
        let id = blocks[last].file_id()?;

        let start = blocks[..last]
            .iter()
            .rposition(|b| *b != Block::Occupied(id))
            .map_or(0, |p| p + 1);

        Some(Extent::new(id, start, last + 1 - start))
    }
}
