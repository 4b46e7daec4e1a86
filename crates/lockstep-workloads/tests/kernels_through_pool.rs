//! Integration tests running every kernel through every executor
//!
//! The serial kernel implementations are the ground truth; each executor
//! must reproduce them.

use lockstep_core::{Executor, PoolExecutor, SerialExecutor, SpawnExecutor, SpinningExecutor};
use lockstep_workloads::gemm::{gemm_parallel, gemm_serial, random_matrix};
use lockstep_workloads::pagerank::{pagerank_parallel, pagerank_serial, Graph};
use lockstep_workloads::sqrt::{random_values, sqrt_parallel, sqrt_serial};
use std::sync::Arc;

fn all_executors(threads: usize) -> Vec<Box<dyn Executor>> {
    vec![
        Box::new(SerialExecutor::new()) as Box<dyn Executor>,
        Box::new(SpawnExecutor::new(threads).expect("Failed to build spawn executor")),
        Box::new(SpinningExecutor::new(threads).expect("Failed to build spinning executor")),
        Box::new(PoolExecutor::new(threads).expect("Failed to build pool executor")),
    ]
}

#[test]
fn test_sqrt_identical_on_every_executor() {
    let values = random_values(2_000, 100);
    let want = sqrt_serial(&values);

    for executor in all_executors(4) {
        let got = sqrt_parallel(executor.as_ref(), &values, 128);
        assert_eq!(got, want, "{}", executor.name());
    }
}

#[test]
fn test_sqrt_with_single_element_chunks() {
    let values = random_values(64, 8);
    let want = sqrt_serial(&values);

    let pool = PoolExecutor::new(8).expect("Failed to build pool executor");
    let got = sqrt_parallel(&pool, &values, 1);
    assert_eq!(got, want);
}

#[test]
fn test_gemm_identical_on_every_executor() {
    let n = 24;
    let a = random_matrix(n, 200);
    let b = random_matrix(n, 201);
    let c = random_matrix(n, 202);
    let want = gemm_serial(n, &a, &b, &c, 2.0, 0.25);

    for executor in all_executors(4) {
        let got = gemm_parallel(executor.as_ref(), n, &a, &b, &c, 2.0, 0.25, 4);
        assert_eq!(got.len(), want.len());
        for (index, (g, w)) in got.iter().zip(&want).enumerate() {
            assert!(
                (g - w).abs() < 1e-12,
                "{}: cell {} differs: {} vs {}",
                executor.name(),
                index,
                g,
                w
            );
        }
    }
}

#[test]
fn test_pagerank_close_on_every_executor() {
    let graph = Arc::new(Graph::random(600, 6, 300));
    let want = pagerank_serial(&graph, 0.85, 1e-10);

    for executor in all_executors(4) {
        let got = pagerank_parallel(executor.as_ref(), Arc::clone(&graph), 0.85, 1e-10, 50);
        assert_eq!(got.len(), want.len());
        for (g, w) in got.iter().zip(&want) {
            assert!(
                (g - w).abs() < 1e-6,
                "{}: {} vs {}",
                executor.name(),
                g,
                w
            );
        }
    }
}

#[test]
fn test_pagerank_mass_conserved_through_pool() {
    let graph = Arc::new(Graph::random(1_000, 8, 400));
    let pool = PoolExecutor::new(8).expect("Failed to build pool executor");
    let scores = pagerank_parallel(&pool, graph, 0.85, 1e-9, 64);

    let mass: f64 = scores.iter().sum();
    assert!((mass - 1.0).abs() < 1e-6, "total mass {}", mass);
}

#[test]
fn test_kernels_share_one_pool() {
    // One executor instance serving unrelated kernels back to back, the
    // way a long-lived pool would be used.
    let pool = PoolExecutor::new(4).expect("Failed to build pool executor");

    let values = random_values(512, 9);
    assert_eq!(sqrt_parallel(&pool, &values, 32), sqrt_serial(&values));

    let n = 12;
    let a = random_matrix(n, 10);
    let b = random_matrix(n, 11);
    let c = vec![0.0; n * n];
    let want = gemm_serial(n, &a, &b, &c, 1.0, 0.0);
    let got = gemm_parallel(&pool, n, &a, &b, &c, 1.0, 0.0, 2);
    for (g, w) in got.iter().zip(&want) {
        assert!((g - w).abs() < 1e-12);
    }

    let graph = Arc::new(Graph::random(300, 5, 12));
    let serial_scores = pagerank_serial(&graph, 0.85, 1e-9);
    let pool_scores = pagerank_parallel(&pool, graph, 0.85, 1e-9, 25);
    for (g, w) in pool_scores.iter().zip(&serial_scores) {
        assert!((g - w).abs() < 1e-6);
    }

    assert_eq!(pool.outstanding_bulks(), 0);
}
