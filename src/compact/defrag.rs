//! Whole-file defragmentation
//!
//! Files are visited once each in descending id order by scanning extents
//! from the right end of the disk backward. Each file moves, intact, into
//! the leftmost free run that can hold it, provided that run starts before
//! the file. Otherwise it stays put. No file is attempted twice.
//!
//! ```text
//! 00...111...2...333.44.5555.6666.777.888899
//! 0099.111...2...333.44.5555.6666.777.8888..
//! 0099.1117772...333.44.5555.6666.....8888..
//! 0099.111777244.333....5555.6666.....8888..
//! 00992111777.44.333....5555.6666.....8888..
//! ```
//!
//! Vacated source ranges are never registered with the [`FreeSpaceIndex`].
//! They lie at or right of the scan pointer, and every later destination
//! must start left of a file that is itself left of the pointer.

use crate::allocator::{Extent, FreeSpaceIndex};
use crate::block::{Block, BlockStore, FileId};
use crate::compact::{trace_store, CompactionReport, Compactor};
use crate::config::CompactionPolicy;
use crate::error::{DiskError, Result};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct ExtentDefragmenter {
    trace: bool,
}

impl ExtentDefragmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dump the block map after every relocation
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Move `extent` to `dest` and re-register what is left of the free run
    fn relocate(
        &self,
        store: &mut BlockStore,
        index: &mut FreeSpaceIndex,
        extent: Extent,
        dest: usize,
    ) -> Result<()> {
        if store.empty_run_length(dest) < extent.length {
            return Err(DiskError::Inconsistent(format!(
                "free run at {} cannot hold file {} ({} blocks)",
                dest, extent.file_id, extent.length
            )));
        }

        store.fill(dest, extent.length, Block::Occupied(extent.file_id))?;
        store.fill(extent.start, extent.length, Block::Empty)?;
        index.register(store, dest + extent.length);

        Ok(())
    }
}

impl Compactor for ExtentDefragmenter {
    fn policy(&self) -> CompactionPolicy {
        CompactionPolicy::Defragment
    }

    fn compact(&mut self, store: &mut BlockStore) -> Result<CompactionReport> {
        let mut report = CompactionReport {
            policy: Some(self.policy()),
            ..Default::default()
        };

        let mut index = FreeSpaceIndex::build(store);
        let mut attempted: HashSet<FileId> = HashSet::new();
        let mut pointer = store.len();

        trace_store(self.trace, store);

        while let Some(extent) = store.last_extent(pointer) {
            pointer = extent.start;

            if !attempted.insert(extent.file_id) {
                continue;
            }

            let dest = match index.find_first_suitable(extent.length) {
                Ok(dest) if dest < extent.start => Some(dest),
                Ok(_) | Err(DiskError::NoSpaceFound { .. }) => None,
                Err(e) => return Err(e),
            };

            match dest {
                Some(dest) => {
                    tracing::debug!(
                        "Moving file {} ({} blocks) from {} to {}",
                        extent.file_id,
                        extent.length,
                        extent.start,
                        dest
                    );
                    self.relocate(store, &mut index, extent, dest)?;
                    report.files_relocated += 1;
                    report.blocks_moved += extent.length;
                    trace_store(self.trace, store);
                }
                None => {
                    tracing::debug!(
                        "Leaving file {} ({} blocks) at {}",
                        extent.file_id,
                        extent.length,
                        extent.start
                    );
                    report.files_retained += 1;
                }
            }
        }

        tracing::debug!(
            "Defragmentation relocated {} files, retained {}",
            report.files_relocated,
            report.files_retained
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::checksum;

    fn run(map: &str) -> (BlockStore, CompactionReport) {
        let mut store = BlockStore::build(map).unwrap();
        let report = ExtentDefragmenter::new().compact(&mut store).unwrap();
        (store, report)
    }

    #[test]
    fn test_example_layout() {
        let (store, report) = run("2333133121414131402");
        assert_eq!(
            store.to_string(),
            "00992111777.44.333....5555.6666.....8888.."
        );
        assert_eq!(checksum(&store).unwrap(), 2858);
        assert_eq!(report.files_relocated, 4);
        assert_eq!(report.files_retained, 6);
        assert_eq!(report.blocks_moved, 2 + 3 + 2 + 1);
    }

    #[test]
    fn test_small_map_nothing_fits() {
        // Neither file 2 (5 blocks) nor file 1 (3 blocks) fit a gap to their left
        let (store, report) = run("12345");
        assert_eq!(store.to_string(), "0..111....22222");
        assert_eq!(report.files_relocated, 0);
        assert_eq!(report.files_retained, 3);
    }

    #[test]
    fn test_file_never_moves_right() {
        // File 1 fits the trailing gap only, which lies to its right
        let (store, report) = run("1023");
        assert_eq!(store.to_string(), "011...");
        assert_eq!(report.files_relocated, 0);
    }

    #[test]
    fn test_moved_file_not_retried() {
        // File 2 lands between 0 and 1; the scan passes it again but leaves it
        let (store, report) = run("11121");
        assert_eq!(store.to_string(), "021...");
        assert_eq!(report.files_relocated, 1);
        assert_eq!(report.files_retained, 2);
    }

    #[test]
    fn test_leftover_is_reused() {
        // The 4-block gap takes file 3, then files 2 and 1 from successive leftovers
        let (store, report) = run("1412221");
        assert_eq!(store.to_string(), "03221........");
        assert_eq!(report.files_relocated, 3);
        assert!(store.is_contiguous());
    }

    #[test]
    fn test_second_pass_uses_merged_gaps() {
        let (mut store, _) = run("2333133121414131402");

        // Moving file 4 out left a 4-block gap that only a fresh pass sees
        let report = ExtentDefragmenter::new().compact(&mut store).unwrap();
        assert_eq!(report.files_relocated, 1);
        assert_eq!(
            store.to_string(),
            "00992111777.44.33388885555.6666..........."
        );

        let settled = store.clone();
        let report = ExtentDefragmenter::new().compact(&mut store).unwrap();
        assert_eq!(report.files_relocated, 0);
        assert_eq!(store, settled);
    }

    #[test]
    fn test_empty_and_full_disks() {
        let (store, report) = run("0");
        assert!(store.is_empty());
        assert_eq!(
            report,
            CompactionReport {
                policy: Some(CompactionPolicy::Defragment),
                ..Default::default()
            }
        );

        let (store, report) = run("9");
        assert_eq!(store.to_string(), "000000000");
        assert_eq!(report.files_retained, 1);
    }

    #[test]
    fn test_relocate_rejects_occupied_destination() {
        let mut store = BlockStore::build("12345").unwrap();
        let mut index = FreeSpaceIndex::new();
        let defrag = ExtentDefragmenter::new();
        let result = defrag.relocate(&mut store, &mut index, Extent::new(2, 10, 5), 0);
        assert!(matches!(result, Err(DiskError::Inconsistent(_))));
        assert_eq!(store.to_string(), "0..111....22222");
    }
}
