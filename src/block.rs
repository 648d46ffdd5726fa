//! Block array for the simulated disk
//!
//! A disk is a fixed-length sequence of blocks. Each block is either empty
//! or holds one block of a file, identified by an opaque integer id.
//!
//! Disks are built from the dense disk map encoding: an alternating string
//! of decimal digits where even positions give file lengths and odd
//! positions give the length of the free run that follows.
//!
//! ```text
//! dense map   12345
//! block map   0..111....22222
//! ```

use crate::error::{DiskError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Opaque file identifier, assigned left to right starting at 0
pub type FileId = u64;

/// A single storage unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Block {
    Empty,
    Occupied(FileId),
}

impl Block {
    pub fn is_empty(&self) -> bool {
        matches!(self, Block::Empty)
    }

    pub fn is_occupied(&self) -> bool {
        !self.is_empty()
    }

    /// File id stored in this block, if any
    pub fn file_id(&self) -> Option<FileId> {
        match self {
            Block::Empty => None,
            Block::Occupied(id) => Some(*id),
        }
    }
}

/// Fixed-length, in-place mutable block array
///
/// The length never changes after construction. Compactors mutate the
/// store through [`BlockStore::set`] and [`BlockStore::fill`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStore {
    blocks: Vec<Block>,

    /// Number of file ids handed out during parsing (including zero-length files)
    file_count: u64,
}

impl BlockStore {
    /// Parse a dense disk map into a block array
    ///
    /// Fails with [`DiskError::EmptyInput`] on an empty string and with
    /// [`DiskError::MalformedInput`] on the first non-digit character.
    pub fn build(dense_map: &str) -> Result<Self> {
        if dense_map.is_empty() {
            return Err(DiskError::EmptyInput);
        }

        let mut lengths = Vec::with_capacity(dense_map.len());
        for (position, found) in dense_map.chars().enumerate() {
            let digit = found
                .to_digit(10)
                .ok_or(DiskError::MalformedInput { position, found })?;
            lengths.push(digit as usize);
        }

        let total: usize = lengths.iter().sum();
        let mut blocks = Vec::with_capacity(total);
        let mut next_id: FileId = 0;

        for (i, &length) in lengths.iter().enumerate() {
            if i % 2 == 0 {
                blocks.extend(std::iter::repeat(Block::Occupied(next_id)).take(length));
                next_id += 1;
            } else {
                blocks.extend(std::iter::repeat(Block::Empty).take(length));
            }
        }

        tracing::debug!(
            "Parsed disk map: {} digits, {} blocks, {} files",
            lengths.len(),
            blocks.len(),
            next_id
        );

        Ok(BlockStore {
            blocks,
            file_count: next_id,
        })
    }

    /// Wrap an existing block array
    ///
    /// The file count is derived from the largest id present.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let file_count = blocks
            .iter()
            .filter_map(Block::file_id)
            .max()
            .map_or(0, |id| id + 1);
        BlockStore { blocks, file_count }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of file ids assigned at parse time
    pub fn file_count(&self) -> u64 {
        self.file_count
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, pos: usize) -> Result<Block> {
        self.blocks
            .get(pos)
            .copied()
            .ok_or(DiskError::OutOfBounds {
                position: pos,
                len: self.blocks.len(),
            })
    }

    pub fn set(&mut self, pos: usize, value: Block) -> Result<()> {
        let len = self.blocks.len();
        let slot = self
            .blocks
            .get_mut(pos)
            .ok_or(DiskError::OutOfBounds { position: pos, len })?;
        *slot = value;
        Ok(())
    }

    /// Overwrite `length` blocks starting at `start` with `value`
    ///
    /// The range does not need to be homogeneous beforehand. The whole
    /// range is bounds-checked before anything is written.
    pub fn fill(&mut self, start: usize, length: usize, value: Block) -> Result<()> {
        let len = self.blocks.len();
        let end = start
            .checked_add(length)
            .filter(|&end| end <= len)
            .ok_or(DiskError::OutOfBounds {
                position: start.saturating_add(length).saturating_sub(1),
                len,
            })?;
        self.blocks[start..end].fill(value);
        Ok(())
    }

    pub fn occupied_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_occupied()).count()
    }

    pub fn free_count(&self) -> usize {
        self.len() - self.occupied_count()
    }

    /// True when no empty block precedes an occupied block
    pub fn is_packed(&self) -> bool {
        let occupied = self.occupied_count();
        self.blocks[..occupied].iter().all(Block::is_occupied)
    }

    /// Number of blocks held by each file id
    pub fn file_block_counts(&self) -> BTreeMap<FileId, usize> {
        let mut counts = BTreeMap::new();
        for id in self.blocks.iter().filter_map(Block::file_id) {
            *counts.entry(id).or_insert(0) += 1;
        }
        counts
    }

    /// True when every file's blocks form a single run
    pub fn is_contiguous(&self) -> bool {
        let counts = self.file_block_counts();
        let extents = self.extents();
        extents.len() == counts.len()
            && extents
                .iter()
                .all(|e| counts.get(&e.file_id) == Some(&e.length))
    }
}

impl FromStr for BlockStore {
    type Err = DiskError;

    fn from_str(s: &str) -> Result<Self> {
        BlockStore::build(s)
    }
}

/// Renders the block map: ids in decimal, empty blocks as `.`
impl fmt::Display for BlockStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            match block {
                Block::Empty => f.write_str(".")?,
                Block::Occupied(id) => write!(f, "{}", id)?,
            }
        }
        Ok(())
    }
}
