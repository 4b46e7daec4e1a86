//! Lockstep Core
//!
//! Bulk-synchronous task executors behind one trait:
//! - **Runnable**: the unit of work, invoked once per task index (`runnable` module)
//! - **Executor**: `run`/`submit`/`sync` interface plus four implementations (`executor` module)
//! - **PoolExecutor**: fixed worker pool with sleeping workers and
//!   dependency-aware asynchronous submission
//! - **Serial/Spawn/Spinning**: simpler baselines sharing the same interface
//!
//! # Example
//!
//! ```rust,ignore
//! use lockstep_core::{Executor, PoolExecutor};
//! use std::sync::Arc;
//!
//! let pool = PoolExecutor::new(8)?;
//!
//! // Double every slot, then sum in a dependent bulk.
//! let first = pool.submit(Arc::new(|i, _n| double_slot(i)), 1024, &[]);
//! let second = pool.submit(Arc::new(|_i, _n| sum_slots()), 1, &[first]);
//! pool.sync();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod bulk;
mod error;
mod runnable;

/// Executor module: the `Executor` trait and its four implementations
pub mod executor;

pub use bulk::BulkId;
pub use error::{SchedulerError, SchedulerResult};
pub use executor::{Executor, PoolExecutor, SerialExecutor, SpawnExecutor, SpinningExecutor};
pub use runnable::Runnable;
