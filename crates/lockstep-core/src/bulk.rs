//! Bulk bookkeeping records
//!
//! A bulk is one `submit` call: a shared [`Runnable`] plus a task count and
//! the ids of earlier bulks it must wait for. The scheduler tracks two
//! counters per bulk, how many task indices have been handed to workers and
//! how many have come back finished.

use crate::runnable::Runnable;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Unique identifier for a submitted bulk
///
/// Ids are handed out by a single executor in strictly increasing order,
/// so later submissions always compare greater than earlier ones. Ids from
/// different executors are unrelated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BulkId(u64);

impl BulkId {
    /// Get the numeric id value
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Create a BulkId from a u64 value
    pub fn from_u64(id: u64) -> Self {
        BulkId(id)
    }
}

/// One submitted bulk and its scheduling counters
pub(crate) struct Bulk {
    /// Identifier assigned at submission
    pub(crate) id: BulkId,

    /// The work shared by every task in the bulk
    pub(crate) runnable: Arc<dyn Runnable>,

    /// Number of task indices in `0..total`
    pub(crate) total: usize,

    /// Bulks that must finish before any task here may start
    pub(crate) deps: Vec<BulkId>,

    /// Indices already claimed by workers
    pub(crate) dispatched: usize,

    /// Indices whose execution has returned
    pub(crate) completed: usize,
}

impl Bulk {
    pub(crate) fn new(
        id: BulkId,
        runnable: Arc<dyn Runnable>,
        total: usize,
        deps: Vec<BulkId>,
    ) -> Self {
        Self {
            id,
            runnable,
            total,
            deps,
            dispatched: 0,
            completed: 0,
        }
    }

    /// True when every declared dependency is in the finished set.
    ///
    /// An id absent from `finished` counts as unfinished whether it refers
    /// to a live bulk or to nothing at all; ids are never validated.
    pub(crate) fn deps_satisfied(&self, finished: &FxHashSet<BulkId>) -> bool {
        self.deps.iter().all(|dep| finished.contains(dep))
    }

    /// True once every index has been handed to some worker.
    pub(crate) fn fully_dispatched(&self) -> bool {
        self.dispatched >= self.total
    }
}
