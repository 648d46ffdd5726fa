//! Compaction strategies
//!
//! Two mutually exclusive policies over the same [`BlockStore`]:
//! - [`fragment::FragmentingCompactor`] - moves single blocks, packs fully
//! - [`defrag::ExtentDefragmenter`] - moves whole files, keeps them contiguous
//!
//! Pick one, run it to completion, then take the checksum.

pub mod defrag;
pub mod fragment;

use crate::block::BlockStore;
use crate::checksum::checksum;
use crate::config::{CompactionConfig, CompactionPolicy, TRACE_TARGET};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub use defrag::ExtentDefragmenter;
pub use fragment::FragmentingCompactor;

/// Compactor trait
///
/// A compactor owns the store exclusively for the duration of the run.
pub trait Compactor {
    /// Policy this compactor implements
    fn policy(&self) -> CompactionPolicy;

    /// Run to completion, mutating the store in place
    fn compact(&mut self, store: &mut BlockStore) -> Result<CompactionReport>;
}

/// Outcome of one compaction run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionReport {
    pub policy: Option<CompactionPolicy>,

    /// Individual blocks written to a new position
    pub blocks_moved: usize,

    /// Files relocated as a whole (defragment only)
    pub files_relocated: usize,

    /// Files examined but left in place (defragment only)
    pub files_retained: usize,

    /// Checksum of the store after the run, filled in by [`compact_with`]
    pub checksum: Option<u64>,
}

/// Build the compactor for a configuration
pub fn compactor_for(config: &CompactionConfig) -> Box<dyn Compactor> {
    match config.policy {
        CompactionPolicy::Fragment => {
            Box::new(FragmentingCompactor::new().with_trace(config.trace))
        }
        CompactionPolicy::Defragment => {
            Box::new(ExtentDefragmenter::new().with_trace(config.trace))
        }
    }
}

/// Run the configured policy over `store` and checksum the result
pub fn compact_with(store: &mut BlockStore, config: &CompactionConfig) -> Result<CompactionReport> {
    tracing::info!(
        "Compacting {} blocks with policy {}",
        store.len(),
        config.policy
    );

    let mut compactor = compactor_for(config);
    let mut report = compactor.compact(store)?;
    report.checksum = Some(checksum(store)?);

    tracing::info!(
        "Compaction finished: {} blocks moved, {} files relocated, checksum {}",
        report.blocks_moved,
        report.files_relocated,
        report.checksum.unwrap_or_default()
    );

    Ok(report)
}

/// Emit the block map at trace level when the hook is enabled
pub(crate) fn trace_store(enabled: bool, store: &BlockStore) {
    if enabled {
        tracing::trace!(target: TRACE_TARGET, "{}", store);
    }
}
