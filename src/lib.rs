//! # diskpack - Block Disk Compaction
//!
//! `diskpack` simulates a linear, block-addressed disk and compacts it under
//! one of two policies, then verifies the result with a positional checksum.
//!
//! - **Fragmenting compaction**: single-block two-pointer moves; packs every
//!   occupied block to the left, splitting files as needed
//! - **Extent defragmentation**: whole-file relocation into the leftmost free
//!   run that fits, backed by a segregated free list of size-bucketed
//!   min-heaps
//!
//! ## Quick Start
//!
//! ```rust
//! use diskpack::{compact_with, BlockStore, CompactionConfig, CompactionPolicy, Result};
//!
//! # fn main() -> Result<()> {
//! let mut store = BlockStore::build("2333133121414131402")?;
//! let report = compact_with(&mut store, &CompactionConfig::new(CompactionPolicy::Defragment))?;
//! assert_eq!(report.checksum, Some(2858));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! dense map ──► BlockStore ──► FreeSpaceIndex (defragment only)
//!                   │
//!                   ├──► FragmentingCompactor ─┐
//!                   └──► ExtentDefragmenter ───┴──► checksum
//! ```
//!
//! - [`block`] - block array, parsing and rendering
//! - [`allocator`] - extent/free-run views and the free space index
//! - [`compact`] - the two compaction policies
//! - [`checksum`] - positional checksum
//! - [`config`] - policy selection and trace flag

pub mod allocator;
pub mod block;
pub mod checksum;
pub mod compact;
pub mod config;
pub mod error;

pub use allocator::{Extent, FreeRun, FreeSpaceIndex};
pub use block::{Block, BlockStore, FileId};
pub use checksum::checksum;
pub use compact::{
    compact_with, compactor_for, CompactionReport, Compactor, ExtentDefragmenter,
    FragmentingCompactor,
};
pub use config::{CompactionConfig, CompactionPolicy, TRACE_TARGET};
pub use error::{DiskError, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
