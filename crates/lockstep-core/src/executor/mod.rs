//! Executor implementations
//!
//! Four executors share one interface. [`SerialExecutor`],
//! [`SpawnExecutor`] and [`SpinningExecutor`] are deliberately simple
//! baselines; [`PoolExecutor`] is the full scheduler with sleeping
//! workers and dependency-aware submission.

mod pool;
mod queue;
mod serial;
mod spawn;
mod spinning;
mod worker;

pub use pool::PoolExecutor;
pub use serial::SerialExecutor;
pub use spawn::SpawnExecutor;
pub use spinning::SpinningExecutor;

use crate::bulk::BulkId;
use crate::runnable::Runnable;
use std::sync::Arc;

/// Common interface of all bulk executors
///
/// Every executor runs bulks of homogeneous tasks and answers the same
/// three calls: `run` for synchronous bulks, `submit`/`sync` for
/// asynchronous ones. The baselines implement `submit` degenerately
/// (execute on the spot, ignore dependencies) but still satisfy the
/// contract that after `sync` returns, every task of every submitted
/// bulk has finished.
pub trait Executor: Send + Sync {
    /// Short human-readable name, stable per implementation.
    fn name(&self) -> &'static str;

    /// Run a bulk of `total` tasks and return once all of them finished.
    ///
    /// Equivalent to `submit` with no dependencies followed by `sync`,
    /// but baselines implement it directly.
    fn run(&self, runnable: Arc<dyn Runnable>, total: usize);

    /// Submit a bulk of `total` tasks that may only start after every
    /// bulk in `deps` has finished.
    ///
    /// Returns the bulk's id immediately; ids increase strictly with
    /// submission order on a given executor. Dependency ids are taken on
    /// faith: an id that was never returned by this executor is simply
    /// never satisfied, and the bulk waits forever. A bulk with
    /// `total == 0` finishes as soon as its dependencies have, without
    /// any task running.
    fn submit(&self, runnable: Arc<dyn Runnable>, total: usize, deps: &[BulkId]) -> BulkId;

    /// Block until every task of every submitted bulk has finished.
    ///
    /// Returns immediately when nothing is outstanding. Bulks submitted
    /// by other threads while this call is blocked are waited for as
    /// well.
    fn sync(&self);
}
