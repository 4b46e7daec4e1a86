//! Executor that spawns fresh threads for every run

use crate::bulk::BulkId;
use crate::error::{SchedulerError, SchedulerResult};
use crate::executor::Executor;
use crate::runnable::Runnable;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// Executor that pays thread creation on every `run` call
///
/// Each call spawns up to `threads` short-lived worker threads that pull
/// task indices off a shared counter until the bulk is exhausted, then
/// joins them all before returning. No state survives between calls,
/// which makes the per-call thread cost easy to measure against the
/// pooled executors. `submit` degenerates to inline serial execution and
/// ignores dependencies.
pub struct SpawnExecutor {
    threads: usize,
    next_id: AtomicU64,
}

impl SpawnExecutor {
    /// Create an executor spawning up to `threads` threads per run.
    ///
    /// Zero is rejected with [`SchedulerError::NoWorkers`].
    pub fn new(threads: usize) -> SchedulerResult<Self> {
        if threads == 0 {
            return Err(SchedulerError::NoWorkers);
        }
        Ok(Self {
            threads,
            next_id: AtomicU64::new(0),
        })
    }

    /// Create an executor spawning one thread per available CPU.
    pub fn with_default_threads() -> SchedulerResult<Self> {
        Self::new(num_cpus::get())
    }

    /// Upper bound on threads spawned per `run` call.
    pub fn thread_count(&self) -> usize {
        self.threads
    }
}

impl Executor for SpawnExecutor {
    fn name(&self) -> &'static str {
        "spawn-per-run"
    }

    fn run(&self, runnable: Arc<dyn Runnable>, total: usize) {
        let spawned = self.threads.min(total);
        if spawned == 0 {
            return;
        }

        // Claiming off one shared counter balances uneven task costs
        // without any per-thread partitioning.
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(spawned);

        for id in 0..spawned {
            let runnable = Arc::clone(&runnable);
            let cursor = Arc::clone(&cursor);
            let handle = thread::Builder::new()
                .name(format!("lockstep-spawn-{}", id))
                .spawn(move || loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    if index >= total {
                        break;
                    }
                    runnable.execute(index, total);
                })
                .expect("failed to spawn run thread");
            handles.push(handle);
        }

        for handle in handles {
            handle.join().expect("run thread panicked");
        }
    }

    fn submit(&self, runnable: Arc<dyn Runnable>, total: usize, _deps: &[BulkId]) -> BulkId {
        for index in 0..total {
            runnable.execute(index, total);
        }
        BulkId::from_u64(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn sync(&self) {}
}
