//! Sleeping thread-pool executor with dependency scheduling
//!
//! The full-featured executor: a fixed set of worker threads drains a
//! dependency-aware [`BulkQueue`] behind a single mutex, parking on a
//! condvar whenever no task index is claimable. Submitting threads never
//! block; `sync` parks the caller until the queue drains.

use crate::bulk::BulkId;
use crate::error::{SchedulerError, SchedulerResult};
use crate::executor::queue::BulkQueue;
use crate::executor::worker::Worker;
use crate::executor::Executor;
use crate::runnable::Runnable;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use tracing::{debug, trace};

/// State shared between the executor handle and its workers
pub(crate) struct PoolShared {
    /// All scheduling state, behind the pool's single mutex
    pub(crate) queue: Mutex<BulkQueue>,

    /// Signalled when claimable work may exist or shutdown begins;
    /// workers park here
    pub(crate) work_ready: Condvar,

    /// Signalled when a bulk finishes; `sync` callers park here
    pub(crate) bulk_finished: Condvar,
}

impl PoolShared {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(BulkQueue::new()),
            work_ready: Condvar::new(),
            bulk_finished: Condvar::new(),
        }
    }
}

/// Thread-pool executor whose idle workers sleep
///
/// Accepts bulks with declared dependencies through [`Executor::submit`]
/// and runs each task exactly once, never starting a bulk before every
/// bulk it depends on has finished. Workers are spawned once at
/// construction; dropping the executor signals them, waits for in-flight
/// tasks to return, and abandons anything not yet dispatched.
pub struct PoolExecutor {
    /// Queue and condvars shared with the workers
    shared: Arc<PoolShared>,

    /// Worker threads, joined at shutdown
    workers: Vec<Worker>,
}

impl PoolExecutor {
    /// Create a pool with `workers` threads.
    ///
    /// A count of zero is rejected with [`SchedulerError::NoWorkers`]
    /// rather than silently adjusted.
    pub fn new(workers: usize) -> SchedulerResult<Self> {
        if workers == 0 {
            return Err(SchedulerError::NoWorkers);
        }

        let shared = Arc::new(PoolShared::new());
        let mut pool = Self {
            shared: Arc::clone(&shared),
            workers: Vec::with_capacity(workers),
        };

        debug!(workers, "starting worker pool");
        for id in 0..workers {
            match Worker::spawn(id, Arc::clone(&shared)) {
                Ok(worker) => pool.workers.push(worker),
                Err(err) => {
                    // Tear down the workers that did start before reporting.
                    pool.shutdown();
                    return Err(err);
                }
            }
        }

        Ok(pool)
    }

    /// Create a pool with one worker per available CPU.
    pub fn with_default_workers() -> SchedulerResult<Self> {
        Self::new(num_cpus::get())
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of accepted bulks that have not finished yet.
    pub fn outstanding_bulks(&self) -> usize {
        self.shared.queue.lock().outstanding()
    }

    /// Signal the workers and wait for them to exit.
    ///
    /// Idempotent. In-flight task executions run to completion; task
    /// indices never dispatched are dropped silently, even when bulks are
    /// still waiting on dependencies.
    fn shutdown(&mut self) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.is_shutdown() {
                return;
            }
            queue.begin_shutdown();
            self.shared.work_ready.notify_all();
        }

        debug!("shutting down worker pool");
        for worker in &mut self.workers {
            worker.join();
        }
    }
}

impl Executor for PoolExecutor {
    fn name(&self) -> &'static str {
        "parking-pool"
    }

    fn run(&self, runnable: Arc<dyn Runnable>, total: usize) {
        self.submit(runnable, total, &[]);
        self.sync();
    }

    fn submit(&self, runnable: Arc<dyn Runnable>, total: usize, deps: &[BulkId]) -> BulkId {
        let mut queue = self.shared.queue.lock();
        let id = queue.submit(runnable, total, deps);
        trace!(
            bulk = id.as_u64(),
            total,
            deps = deps.len(),
            "bulk submitted"
        );

        // The admitting resolver pass may have opened work for dispatch.
        self.shared.work_ready.notify_all();
        drop(queue);
        id
    }

    fn sync(&self) {
        let mut queue = self.shared.queue.lock();
        while !queue.is_idle() {
            self.shared.bulk_finished.wait(&mut queue);
        }
    }
}

impl Drop for PoolExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
