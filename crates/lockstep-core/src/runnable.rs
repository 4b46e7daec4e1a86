//! The unit of work handed to an executor
//!
//! A [`Runnable`] describes a whole bulk of `total` identical tasks; the
//! executor calls [`Runnable::execute`] once for every index in
//! `0..total`, possibly from many threads at once. Implementations must
//! therefore be safe to share and must key any per-task effects off the
//! `index` argument alone.

/// A bulk of homogeneous tasks, invoked once per index.
///
/// The same receiver is shared by every worker thread running the bulk,
/// so implementations need `&self` methods and internal synchronization
/// (or disjoint per-index output slots) for any mutation.
///
/// Closures of the shape `Fn(usize, usize)` implement this trait
/// automatically, which keeps call sites short:
///
/// ```rust,ignore
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&hits);
/// executor.run(Arc::new(move |_index, _total| {
///     counter.fetch_add(1, Ordering::Relaxed);
/// }), 64);
/// ```
pub trait Runnable: Send + Sync {
    /// Execute task `index` of a bulk of `total` tasks.
    ///
    /// Called exactly once per index per bulk. `index` is in
    /// `0..total`. A panic here is fatal to the executor.
    fn execute(&self, index: usize, total: usize);
}

impl<F> Runnable for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn execute(&self, index: usize, total: usize) {
        self(index, total)
    }
}
