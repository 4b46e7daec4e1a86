//! Newton-refined square root kernel
//!
//! Every element is refined independently until the guess converges, so
//! runtime varies per element and the kernel makes a good smoke test for
//! dynamic task claiming: chunks with slow-converging inputs take visibly
//! longer than their neighbors.

use lockstep_core::{Executor, Runnable};
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Iteration stops once |guess² · x − 1| falls below this.
const CONVERGENCE: f32 = 1e-5;

/// Starting guess for every element.
const INITIAL_GUESS: f32 = 1.0;

/// Refine toward `sqrt(x)` with Newton steps on the inverse root.
///
/// Converges for `x` in (0, 3); outside that interval the iteration
/// diverges, so inputs must be generated accordingly.
fn refine(x: f32) -> f32 {
    let mut guess = INITIAL_GUESS;
    let mut error = (guess * guess * x - 1.0).abs();
    while error > CONVERGENCE {
        guess = (3.0 * guess - x * guess * guess * guess) * 0.5;
        error = (guess * guess * x - 1.0).abs();
    }
    x * guess
}

/// Square roots of `values`, one element at a time on the calling thread.
pub fn sqrt_serial(values: &[f32]) -> Vec<f32> {
    values.iter().copied().map(refine).collect()
}

/// One task refines one contiguous chunk of elements
struct SqrtBulk {
    values: Arc<Vec<f32>>,
    output: Arc<Vec<AtomicU32>>,
    chunk: usize,
}

impl Runnable for SqrtBulk {
    fn execute(&self, index: usize, _total: usize) {
        let start = index * self.chunk;
        let end = (start + self.chunk).min(self.values.len());
        for i in start..end {
            let root = refine(self.values[i]);
            self.output[i].store(root.to_bits(), Ordering::Relaxed);
        }
    }
}

/// Square roots of `values` computed as one bulk of chunked tasks.
///
/// Chunks are disjoint, so tasks write without coordination; the
/// executor's completion barrier publishes the stores before the output
/// is read back.
pub fn sqrt_parallel(executor: &dyn Executor, values: &[f32], chunk: usize) -> Vec<f32> {
    assert!(chunk > 0, "chunk size must be positive");

    let total = values.len().div_ceil(chunk);
    let output: Arc<Vec<AtomicU32>> =
        Arc::new((0..values.len()).map(|_| AtomicU32::new(0)).collect());

    executor.run(
        Arc::new(SqrtBulk {
            values: Arc::new(values.to_vec()),
            output: Arc::clone(&output),
            chunk,
        }),
        total,
    );

    output
        .iter()
        .map(|cell| f32::from_bits(cell.load(Ordering::Relaxed)))
        .collect()
}

/// Deterministic inputs inside the kernel's convergence interval.
pub fn random_values(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..len).map(|_| 0.001 + 2.998 * rng.gen::<f32>()).collect()
}
