//! Worker thread for the parking pool
//!
//! Each worker repeats the same cycle: claim one task index under the pool
//! mutex, run it with the mutex released, then report the completion. With
//! nothing to claim it parks on the pool's condvar instead of polling.

use crate::error::{SchedulerError, SchedulerResult};
use crate::executor::pool::PoolShared;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::trace;

/// Handle to one pool worker thread
pub(crate) struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker thread running the claim/execute/complete loop.
    pub(crate) fn spawn(id: usize, shared: Arc<PoolShared>) -> SchedulerResult<Self> {
        let handle = thread::Builder::new()
            .name(format!("lockstep-worker-{}", id))
            .spawn(move || Self::run_loop(id, &shared))
            .map_err(SchedulerError::WorkerSpawn)?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Wait for the thread to exit.
    ///
    /// Only returns promptly after shutdown has been signalled on the
    /// shared queue. A panic that killed the thread is re-raised here.
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("worker thread panicked");
            trace!(worker = self.id, "worker joined");
        }
    }

    /// Worker thread main loop
    fn run_loop(id: usize, shared: &PoolShared) {
        trace!(worker = id, "worker started");

        let mut queue = shared.queue.lock();
        loop {
            // Shutdown is checked under the mutex on every iteration, so a
            // signal sent while this worker was executing a task is seen as
            // soon as the lock is reacquired.
            if queue.is_shutdown() {
                break;
            }

            match queue.claim() {
                Some(claim) => {
                    drop(queue);
                    claim.runnable.execute(claim.index, claim.total);

                    queue = shared.queue.lock();
                    if queue.complete(claim.bulk) {
                        // The bulk finished: dependents may now be ready and
                        // the queue may have gone idle. Wake both the parked
                        // workers and any thread blocked in sync().
                        shared.work_ready.notify_all();
                        shared.bulk_finished.notify_all();
                    }
                }
                None => {
                    // Park until new work is promoted or shutdown begins.
                    // The mutex is released atomically while waiting and
                    // reacquired before the wait returns, and every notify
                    // follows a state change made under the same mutex, so
                    // no wakeup can slip between the claim attempt and the
                    // wait.
                    shared.work_ready.wait(&mut queue);
                }
            }
        }
        drop(queue);

        trace!(worker = id, "worker stopped");
    }
}
