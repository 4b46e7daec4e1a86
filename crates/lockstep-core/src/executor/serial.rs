//! Single-threaded reference executor

use crate::bulk::BulkId;
use crate::executor::Executor;
use crate::runnable::Runnable;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Executor that runs every task inline on the calling thread
///
/// The correctness baseline the parallel executors are measured against.
/// `submit` executes the bulk on the spot and ignores its dependency
/// list, so by the time an id is handed out the bulk it names has
/// already finished; `sync` never has anything to wait for.
pub struct SerialExecutor {
    next_id: AtomicU64,
}

impl SerialExecutor {
    /// Create a serial executor.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
        }
    }
}

impl Default for SerialExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for SerialExecutor {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn run(&self, runnable: Arc<dyn Runnable>, total: usize) {
        for index in 0..total {
            runnable.execute(index, total);
        }
    }

    fn submit(&self, runnable: Arc<dyn Runnable>, total: usize, _deps: &[BulkId]) -> BulkId {
        self.run(runnable, total);
        BulkId::from_u64(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn sync(&self) {}
}
