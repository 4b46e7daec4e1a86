//! Thread-pool executor whose idle workers busy-wait
//!
//! Same fixed-pool shape as the parking executor but with no condvars:
//! workers poll a single shared bulk slot in a tight loop, trading idle
//! CPU for the lowest possible wake-up latency. One bulk is in flight at
//! a time; `run` installs it and busy-waits for the completion count.

use crate::bulk::BulkId;
use crate::error::{SchedulerError, SchedulerResult};
use crate::executor::Executor;
use crate::runnable::Runnable;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// The one bulk currently installed, plus its dispatch counters
struct SpinSlot {
    /// Work for the current `run` call, `None` between calls
    runnable: Option<Arc<dyn Runnable>>,
    total: usize,
    dispatched: usize,
    completed: usize,
}

/// State shared with the spinning workers
struct SpinShared {
    slot: Mutex<SpinSlot>,
    stop: AtomicBool,
}

/// Thread-pool executor that never sleeps
///
/// Kept as a measuring stick for the parking pool: identical dispatch
/// behavior, but idle workers burn a core spinning on the slot mutex.
/// `submit` degenerates to inline serial execution and ignores
/// dependencies.
pub struct SpinningExecutor {
    shared: Arc<SpinShared>,
    workers: Vec<JoinHandle<()>>,
    next_id: AtomicU64,
}

impl SpinningExecutor {
    /// Create a pool of `workers` spinning threads.
    ///
    /// Zero is rejected with [`SchedulerError::NoWorkers`].
    pub fn new(workers: usize) -> SchedulerResult<Self> {
        if workers == 0 {
            return Err(SchedulerError::NoWorkers);
        }

        let shared = Arc::new(SpinShared {
            slot: Mutex::new(SpinSlot {
                runnable: None,
                total: 0,
                dispatched: 0,
                completed: 0,
            }),
            stop: AtomicBool::new(false),
        });

        let mut pool = Self {
            shared: Arc::clone(&shared),
            workers: Vec::with_capacity(workers),
            next_id: AtomicU64::new(0),
        };

        for id in 0..workers {
            let shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("lockstep-spin-{}", id))
                .spawn(move || Self::spin(&shared));
            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(err) => {
                    pool.stop_workers();
                    return Err(SchedulerError::WorkerSpawn(err));
                }
            }
        }

        Ok(pool)
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Worker loop: poll the slot for an unclaimed index, never park.
    fn spin(shared: &SpinShared) {
        loop {
            if shared.stop.load(Ordering::Acquire) {
                break;
            }

            let mut slot = shared.slot.lock();
            let claim = if slot.dispatched < slot.total {
                slot.runnable.clone().map(|runnable| {
                    let index = slot.dispatched;
                    slot.dispatched += 1;
                    (runnable, index, slot.total)
                })
            } else {
                None
            };
            drop(slot);

            match claim {
                Some((runnable, index, total)) => {
                    runnable.execute(index, total);
                    shared.slot.lock().completed += 1;
                }
                None => std::hint::spin_loop(),
            }
        }
    }

    fn stop_workers(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        for handle in self.workers.drain(..) {
            handle.join().expect("spinning worker panicked");
        }
    }
}

impl Executor for SpinningExecutor {
    fn name(&self) -> &'static str {
        "spinning-pool"
    }

    fn run(&self, runnable: Arc<dyn Runnable>, total: usize) {
        // Install the bulk; if another run is mid-flight on a different
        // thread, wait for the slot to clear first.
        loop {
            let mut slot = self.shared.slot.lock();
            if slot.runnable.is_none() {
                slot.runnable = Some(runnable);
                slot.total = total;
                slot.dispatched = 0;
                slot.completed = 0;
                break;
            }
            drop(slot);
            std::hint::spin_loop();
        }

        // Busy-wait for the workers to drain the bulk, then clear the
        // slot so the next run can install.
        loop {
            let mut slot = self.shared.slot.lock();
            if slot.completed == slot.total {
                slot.runnable = None;
                slot.total = 0;
                return;
            }
            drop(slot);
            std::hint::spin_loop();
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

impl Drop for SpinningExecutor {
    fn drop(&mut self) {
        self.stop_workers();
    }
}
