//! PageRank with damping and dangling-mass redistribution
//!
//! The one kernel here that leans on asynchronous submission: every
//! iteration is three dependent bulks (dangling mass, vertex update, L1
//! difference) chained by bulk ids, with a single sync before the
//! convergence check. On graphs without dangling vertices the first bulk
//! has zero tasks and finishes purely through dependency resolution.

use lockstep_core::Executor;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Directed graph stored as incoming-edge lists
///
/// Incoming edges are what the score update walks; out-degrees and the
/// list of dangling vertices (no outgoing edges) are precomputed at
/// construction.
pub struct Graph {
    /// CSR offsets into `in_edges`, length `num_nodes + 1`
    in_starts: Vec<usize>,
    /// Source vertex of every incoming edge, grouped by destination
    in_edges: Vec<u32>,
    /// Outgoing edge count per vertex
    out_degree: Vec<u32>,
    /// Vertices with no outgoing edges
    dangling: Vec<u32>,
}

impl Graph {
    /// Build a graph from `(source, destination)` edge pairs.
    ///
    /// Vertices are `0..num_nodes`; duplicate edges and self-loops are
    /// kept as given.
    pub fn from_edges(num_nodes: usize, edges: &[(u32, u32)]) -> Self {
        let mut out_degree = vec![0u32; num_nodes];
        let mut in_counts = vec![0usize; num_nodes];
        for &(src, dst) in edges {
            out_degree[src as usize] += 1;
            in_counts[dst as usize] += 1;
        }

        let mut in_starts = Vec::with_capacity(num_nodes + 1);
        let mut acc = 0;
        in_starts.push(0);
        for &count in &in_counts {
            acc += count;
            in_starts.push(acc);
        }

        let mut cursor: Vec<usize> = in_starts[..num_nodes].to_vec();
        let mut in_edges = vec![0u32; edges.len()];
        for &(src, dst) in edges {
            in_edges[cursor[dst as usize]] = src;
            cursor[dst as usize] += 1;
        }

        let dangling = (0..num_nodes as u32)
            .filter(|&v| out_degree[v as usize] == 0)
            .collect();

        Self {
            in_starts,
            in_edges,
            out_degree,
            dangling,
        }
    }

    /// Deterministic random graph; roughly a tenth of the vertices are
    /// dangling, the rest emit between one and `max_out` edges.
    pub fn random(num_nodes: usize, max_out: usize, seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut edges = Vec::new();
        for src in 0..num_nodes as u32 {
            if rng.gen_bool(0.1) {
                continue;
            }
            for _ in 0..rng.gen_range(1..=max_out) {
                edges.push((src, rng.gen_range(0..num_nodes) as u32));
            }
        }
        Self::from_edges(num_nodes, &edges)
    }

    /// Number of vertices.
    pub fn num_nodes(&self) -> usize {
        self.out_degree.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.in_edges.len()
    }

    /// Number of vertices with no outgoing edges.
    pub fn num_dangling(&self) -> usize {
        self.dangling.len()
    }

    fn incoming(&self, v: usize) -> &[u32] {
        &self.in_edges[self.in_starts[v]..self.in_starts[v + 1]]
    }
}

/// PageRank scores computed on the calling thread.
///
/// Iterates until the L1 change between rounds drops below
/// `convergence`. Scores sum to one.
pub fn pagerank_serial(graph: &Graph, damping: f64, convergence: f64) -> Vec<f64> {
    let n = graph.num_nodes();
    assert!(n > 0, "pagerank needs a non-empty graph");

    let uniform = 1.0 / n as f64;
    let mut old = vec![uniform; n];
    let mut new = vec![0.0; n];

    loop {
        let mut dangling_mass = 0.0;
        for &v in &graph.dangling {
            dangling_mass += damping * old[v as usize] / n as f64;
        }

        for v in 0..n {
            let mut sum = 0.0;
            for &src in graph.incoming(v) {
                sum += old[src as usize] / graph.out_degree[src as usize] as f64;
            }
            new[v] = damping * sum + (1.0 - damping) / n as f64 + dangling_mass;
        }

        let mut diff = 0.0;
        for v in 0..n {
            diff += (new[v] - old[v]).abs();
        }

        std::mem::swap(&mut old, &mut new);
        if diff < convergence {
            return old;
        }
    }
}

fn load(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Relaxed))
}

fn float_cells(len: usize, value: f64) -> Arc<Vec<AtomicU64>> {
    Arc::new((0..len).map(|_| AtomicU64::new(value.to_bits())).collect())
}

/// PageRank scores computed as chained bulks on `executor`.
///
/// `chunk` vertices (or dangling vertices) per task. Each iteration
/// submits the three phase bulks with dependencies and syncs once, so
/// workers flow from phase to phase without the caller mediating between
/// phases.
pub fn pagerank_parallel(
    executor: &dyn Executor,
    graph: Arc<Graph>,
    damping: f64,
    convergence: f64,
    chunk: usize,
) -> Vec<f64> {
    let n = graph.num_nodes();
    assert!(n > 0, "pagerank needs a non-empty graph");
    assert!(chunk > 0, "chunk size must be positive");

    let uniform = 1.0 / n as f64;
    let mut old = float_cells(n, uniform);
    let mut new = float_cells(n, 0.0);

    let vertex_tasks = n.div_ceil(chunk);
    let dangling_tasks = graph.dangling.len().div_ceil(chunk);
    let mass_partials = float_cells(dangling_tasks, 0.0);
    let diff_partials = float_cells(vertex_tasks, 0.0);

    let mut iterations = 0u32;
    loop {
        iterations += 1;

        // Phase 1: per-chunk partial sums of the dangling vertex mass.
        // Zero tasks when the graph has no dangling vertices.
        let mass_id = {
            let graph = Arc::clone(&graph);
            let old = Arc::clone(&old);
            let partials = Arc::clone(&mass_partials);
            executor.submit(
                Arc::new(move |index: usize, _total: usize| {
                    let start = index * chunk;
                    let end = (start + chunk).min(graph.dangling.len());
                    let mut sum = 0.0;
                    for &v in &graph.dangling[start..end] {
                        sum += damping * load(&old[v as usize]) / graph.num_nodes() as f64;
                    }
                    partials[index].store(sum.to_bits(), Ordering::Relaxed);
                }),
                dangling_tasks,
                &[],
            )
        };

        // Phase 2: new score per vertex from incoming edges plus the
        // accumulated dangling mass.
        let update_id = {
            let graph = Arc::clone(&graph);
            let old = Arc::clone(&old);
            let new = Arc::clone(&new);
            let partials = Arc::clone(&mass_partials);
            executor.submit(
                Arc::new(move |index: usize, _total: usize| {
                    let dangling_mass: f64 = partials.iter().map(load).sum();
                    let n = graph.num_nodes();

                    let start = index * chunk;
                    let end = (start + chunk).min(n);
                    for v in start..end {
                        let mut sum = 0.0;
                        for &src in graph.incoming(v) {
                            sum += load(&old[src as usize])
                                / graph.out_degree[src as usize] as f64;
                        }
                        let score = damping * sum + (1.0 - damping) / n as f64 + dangling_mass;
                        new[v].store(score.to_bits(), Ordering::Relaxed);
                    }
                }),
                vertex_tasks,
                &[mass_id],
            )
        };

        // Phase 3: per-chunk L1 difference between the score rounds.
        {
            let old = Arc::clone(&old);
            let new = Arc::clone(&new);
            let partials = Arc::clone(&diff_partials);
            executor.submit(
                Arc::new(move |index: usize, _total: usize| {
                    let start = index * chunk;
                    let end = (start + chunk).min(old.len());
                    let mut sum = 0.0;
                    for v in start..end {
                        sum += (load(&new[v]) - load(&old[v])).abs();
                    }
                    partials[index].store(sum.to_bits(), Ordering::Relaxed);
                }),
                vertex_tasks,
                &[update_id],
            );
        }

        executor.sync();

        let diff: f64 = diff_partials.iter().map(load).sum();
        std::mem::swap(&mut old, &mut new);

        if diff < convergence {
            debug!(iterations, diff, "pagerank converged");
            return old.iter().map(load).collect();
        }
    }
}
