//! Dense matrix multiply-accumulate kernel
//!
//! Computes `C' = alpha * A·B + beta * C` for square row-major matrices
//! of `f64`. Tasks own disjoint row bands of `C`, so the bulk needs no
//! locking and the parallel result matches the serial one bit for bit.

use lockstep_core::{Executor, Runnable};
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One task updates one band of `rows_per_task` rows of C
struct GemmBulk {
    n: usize,
    a: Arc<Vec<f64>>,
    b: Arc<Vec<f64>>,
    c: Arc<Vec<AtomicU64>>,
    alpha: f64,
    beta: f64,
    rows_per_task: usize,
}

impl GemmBulk {
    fn load(&self, idx: usize) -> f64 {
        f64::from_bits(self.c[idx].load(Ordering::Relaxed))
    }

    fn store(&self, idx: usize, value: f64) {
        self.c[idx].store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Runnable for GemmBulk {
    fn execute(&self, index: usize, _total: usize) {
        let n = self.n;
        let first = index * self.rows_per_task;
        let last = (first + self.rows_per_task).min(n);

        for i in first..last {
            let row = i * n;
            for j in 0..n {
                self.store(row + j, self.beta * self.load(row + j));
            }
            for k in 0..n {
                let aik = self.alpha * self.a[row + k];
                let brow = k * n;
                for j in 0..n {
                    self.store(row + j, self.load(row + j) + aik * self.b[brow + j]);
                }
            }
        }
    }
}

/// `alpha * A·B + beta * C` on the calling thread.
///
/// All matrices are `n`×`n` row-major slices of length `n * n`.
pub fn gemm_serial(n: usize, a: &[f64], b: &[f64], c: &[f64], alpha: f64, beta: f64) -> Vec<f64> {
    check_dims(n, a, b, c);

    let mut out = c.to_vec();
    for i in 0..n {
        let row = i * n;
        for j in 0..n {
            out[row + j] *= beta;
        }
        for k in 0..n {
            let aik = alpha * a[row + k];
            let brow = k * n;
            for j in 0..n {
                out[row + j] += aik * b[brow + j];
            }
        }
    }
    out
}

/// `alpha * A·B + beta * C` as one bulk of row-band tasks on `executor`.
pub fn gemm_parallel(
    executor: &dyn Executor,
    n: usize,
    a: &[f64],
    b: &[f64],
    c: &[f64],
    alpha: f64,
    beta: f64,
    rows_per_task: usize,
) -> Vec<f64> {
    check_dims(n, a, b, c);
    assert!(rows_per_task > 0, "rows per task must be positive");

    let cells: Arc<Vec<AtomicU64>> =
        Arc::new(c.iter().map(|&v| AtomicU64::new(v.to_bits())).collect());
    let total = n.div_ceil(rows_per_task);

    executor.run(
        Arc::new(GemmBulk {
            n,
            a: Arc::new(a.to_vec()),
            b: Arc::new(b.to_vec()),
            c: Arc::clone(&cells),
            alpha,
            beta,
            rows_per_task,
        }),
        total,
    );

    cells
        .iter()
        .map(|cell| f64::from_bits(cell.load(Ordering::Relaxed)))
        .collect()
}

fn check_dims(n: usize, a: &[f64], b: &[f64], c: &[f64]) {
    assert_eq!(a.len(), n * n, "A must be n*n");
    assert_eq!(b.len(), n * n, "B must be n*n");
    assert_eq!(c.len(), n * n, "C must be n*n");
}

/// Deterministic `n`×`n` matrix with entries in [-1, 1).
pub fn random_matrix(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n * n).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect()
}

/// The `n`×`n` identity matrix.
pub fn identity(n: usize) -> Vec<f64> {
    let mut m = vec![0.0; n * n];
    for i in 0..n {
        m[i * n + i] = 1.0;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_core::PoolExecutor;

    fn assert_close(got: &[f64], want: &[f64]) {
        assert_eq!(got.len(), want.len());
        for (index, (g, w)) in got.iter().zip(want).enumerate() {
            assert!(
                (g - w).abs() < 1e-12,
                "cell {} differs: {} vs {}",
                index,
                g,
                w
            );
        }
    }

    #[test]
    fn test_identity_times_matrix() {
        let n = 8;
        let b = random_matrix(n, 1);
        let c = vec![0.0; n * n];
        let got = gemm_serial(n, &identity(n), &b, &c, 1.0, 0.0);
        assert_close(&got, &b);
    }

    #[test]
    fn test_beta_scales_existing_c() {
        let n = 4;
        let zero = vec![0.0; n * n];
        let c = random_matrix(n, 2);
        let got = gemm_serial(n, &zero, &zero, &c, 1.0, 2.5);
        let want: Vec<f64> = c.iter().map(|v| v * 2.5).collect();
        assert_close(&got, &want);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let n = 16;
        let a = random_matrix(n, 3);
        let b = random_matrix(n, 4);
        let c = random_matrix(n, 5);

        let want = gemm_serial(n, &a, &b, &c, 1.5, -0.5);
        let pool = PoolExecutor::new(4).unwrap();
        let got = gemm_parallel(&pool, n, &a, &b, &c, 1.5, -0.5, 3);
        assert_close(&got, &want);
    }

    #[test]
    fn test_band_bigger_than_matrix() {
        let n = 5;
        let a = random_matrix(n, 6);
        let b = random_matrix(n, 7);
        let c = vec![0.0; n * n];

        let pool = PoolExecutor::new(2).unwrap();
        let got = gemm_parallel(&pool, n, &a, &b, &c, 1.0, 0.0, 64);
        assert_close(&got, &gemm_serial(n, &a, &b, &c, 1.0, 0.0));
    }
}
