//! Error types for executor construction
//!
//! Configuration problems are reported synchronously by the constructors;
//! nothing in the hot scheduling path returns an error.

/// Errors raised while building an executor
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Worker count of zero was requested
    #[error("executor requires at least one worker thread, got 0")]
    NoWorkers,

    /// The OS refused to spawn a worker thread
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

/// Result of executor construction
pub type SchedulerResult<T> = Result<T, SchedulerError>;
