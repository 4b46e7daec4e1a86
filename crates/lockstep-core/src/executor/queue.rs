//! Dependency-aware bulk queue
//!
//! Pure bookkeeping shared by the pool executor: which bulks are still
//! blocked on dependencies, which are open for dispatch, and which have
//! finished. All methods assume the caller holds the pool's single mutex;
//! nothing here blocks or spawns.

use crate::bulk::{Bulk, BulkId};
use crate::runnable::Runnable;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::trace;

/// A single task index handed to a worker.
///
/// Carries everything needed to run the task outside the lock.
pub(crate) struct Claim {
    /// Bulk the index belongs to
    pub(crate) bulk: BulkId,
    /// Shared work of that bulk
    pub(crate) runnable: Arc<dyn Runnable>,
    /// Index to execute
    pub(crate) index: usize,
    /// Task count of the bulk
    pub(crate) total: usize,
}

/// Scheduling state for every bulk the executor has accepted
pub(crate) struct BulkQueue {
    /// Next id to assign, increases by one per submission
    next_id: u64,

    /// Bulks with at least one unfinished dependency
    pending: Vec<Bulk>,

    /// Bulks whose dependencies are all finished, open for dispatch
    ready: Vec<Bulk>,

    /// Ids of bulks whose every task has completed
    finished: FxHashSet<BulkId>,

    /// Set once at teardown; workers exit instead of sleeping
    shutdown: bool,
}

impl BulkQueue {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
            ready: Vec::new(),
            finished: FxHashSet::default(),
            shutdown: false,
        }
    }

    /// Admit a new bulk and run a resolver pass.
    ///
    /// The bulk starts out pending even with no dependencies; the resolver
    /// pass promotes it before this call returns, so an unconstrained bulk
    /// is dispatchable the moment `submit` finishes. Dependency ids are
    /// recorded as given, never validated against known bulks.
    pub(crate) fn submit(
        &mut self,
        runnable: Arc<dyn Runnable>,
        total: usize,
        deps: &[BulkId],
    ) -> BulkId {
        let id = BulkId::from_u64(self.next_id);
        self.next_id += 1;

        self.pending.push(Bulk::new(id, runnable, total, deps.to_vec()));
        self.resolve();
        id
    }

    /// Hand out one not-yet-dispatched task index, if any bulk has one.
    ///
    /// Each index of each bulk is returned exactly once across all calls.
    pub(crate) fn claim(&mut self) -> Option<Claim> {
        for bulk in &mut self.ready {
            if !bulk.fully_dispatched() {
                let index = bulk.dispatched;
                bulk.dispatched += 1;
                return Some(Claim {
                    bulk: bulk.id,
                    runnable: Arc::clone(&bulk.runnable),
                    index,
                    total: bulk.total,
                });
            }
        }
        None
    }

    /// Record that one task of `id` has returned.
    ///
    /// Returns true when this was the bulk's last task; the bulk is then
    /// moved to the finished set and a resolver pass promotes any bulks
    /// that were waiting on it.
    pub(crate) fn complete(&mut self, id: BulkId) -> bool {
        let Some(pos) = self.ready.iter().position(|bulk| bulk.id == id) else {
            debug_assert!(false, "completion for bulk {:?} not in flight", id);
            return false;
        };

        let bulk = &mut self.ready[pos];
        bulk.completed += 1;
        debug_assert!(
            bulk.completed <= bulk.dispatched,
            "bulk {:?} completed more tasks than were dispatched",
            id
        );

        if bulk.completed < bulk.total {
            return false;
        }

        let bulk = self.ready.swap_remove(pos);
        trace!(bulk = bulk.id.as_u64(), "bulk finished");
        self.finished.insert(bulk.id);
        self.resolve();
        true
    }

    /// Promote every pending bulk whose dependencies are all finished.
    ///
    /// Empty bulks have no tasks to dispatch and are marked finished on
    /// the spot. Finishing one can satisfy a dependency of a bulk already
    /// scanned this sweep, so the scan repeats until no empty bulk
    /// finishes; a whole chain of empty bulks resolves in one call.
    fn resolve(&mut self) {
        loop {
            let mut finished_empty = false;

            let mut i = 0;
            while i < self.pending.len() {
                if self.pending[i].deps_satisfied(&self.finished) {
                    let bulk = self.pending.swap_remove(i);
                    if bulk.total == 0 {
                        trace!(bulk = bulk.id.as_u64(), "empty bulk finished");
                        self.finished.insert(bulk.id);
                        finished_empty = true;
                    } else {
                        trace!(bulk = bulk.id.as_u64(), total = bulk.total, "bulk ready");
                        self.ready.push(bulk);
                    }
                } else {
                    i += 1;
                }
            }

            if !finished_empty {
                break;
            }
        }
    }

    /// True when no bulk is pending or in flight.
    pub(crate) fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.ready.is_empty()
    }

    /// Number of accepted bulks that have not finished yet.
    pub(crate) fn outstanding(&self) -> usize {
        self.pending.len() + self.ready.len()
    }

    pub(crate) fn begin_shutdown(&mut self) {
        self.shutdown = true;
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<dyn Runnable> {
        Arc::new(|_index: usize, _total: usize| {})
    }

    /// Dispatch and complete every claimable index once.
    fn drain(queue: &mut BulkQueue) -> usize {
        let mut ran = 0;
        while let Some(claim) = queue.claim() {
            claim.runnable.execute(claim.index, claim.total);
            queue.complete(claim.bulk);
            ran += 1;
        }
        ran
    }

    #[test]
    fn test_ids_increase_by_one() {
        let mut queue = BulkQueue::new();
        let a = queue.submit(noop(), 1, &[]);
        let b = queue.submit(noop(), 1, &[]);
        let c = queue.submit(noop(), 1, &[]);
        assert!(a < b && b < c);
        assert_eq!(c.as_u64(), a.as_u64() + 2);
    }

    #[test]
    fn test_submit_without_deps_is_immediately_claimable() {
        let mut queue = BulkQueue::new();
        queue.submit(noop(), 3, &[]);
        assert!(queue.claim().is_some());
    }

    #[test]
    fn test_submit_with_unfinished_dep_stays_pending() {
        let mut queue = BulkQueue::new();
        let a = queue.submit(noop(), 1, &[]);
        queue.submit(noop(), 1, &[a]);

        // Only bulk a's single index is claimable.
        let claim = queue.claim().unwrap();
        assert_eq!(claim.bulk, a);
        assert!(queue.claim().is_none());
    }

    #[test]
    fn test_each_index_claimed_exactly_once() {
        let mut queue = BulkQueue::new();
        queue.submit(noop(), 5, &[]);

        let mut seen = Vec::new();
        while let Some(claim) = queue.claim() {
            seen.push(claim.index);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_claim_skips_fully_dispatched_bulk() {
        let mut queue = BulkQueue::new();
        let a = queue.submit(noop(), 1, &[]);
        let b = queue.submit(noop(), 1, &[]);

        // Dispatch all of a without completing it; b's index must still come out.
        let first = queue.claim().unwrap();
        assert_eq!(first.bulk, a);
        let second = queue.claim().unwrap();
        assert_eq!(second.bulk, b);
        assert!(queue.claim().is_none());
    }

    #[test]
    fn test_completion_promotes_dependent() {
        let mut queue = BulkQueue::new();
        let a = queue.submit(noop(), 2, &[]);
        let b = queue.submit(noop(), 1, &[a]);

        let c0 = queue.claim().unwrap();
        let c1 = queue.claim().unwrap();
        assert!(queue.claim().is_none());

        assert!(!queue.complete(c0.bulk));
        assert!(queue.claim().is_none());

        // Last completion finishes a and promotes b in the same pass.
        assert!(queue.complete(c1.bulk));
        let next = queue.claim().unwrap();
        assert_eq!(next.bulk, b);
    }

    #[test]
    fn test_empty_bulk_finishes_at_submission() {
        let mut queue = BulkQueue::new();
        let z = queue.submit(noop(), 0, &[]);
        assert!(queue.is_idle());
        assert!(queue.finished.contains(&z));
        assert!(queue.claim().is_none());
    }

    #[test]
    fn test_empty_bulk_waits_for_deps() {
        let mut queue = BulkQueue::new();
        let a = queue.submit(noop(), 1, &[]);
        let z = queue.submit(noop(), 0, &[a]);

        assert!(!queue.finished.contains(&z));

        let claim = queue.claim().unwrap();
        queue.complete(claim.bulk);
        assert!(queue.finished.contains(&z));
        assert!(queue.is_idle());
    }

    #[test]
    fn test_empty_chain_resolves_in_one_pass() {
        let mut queue = BulkQueue::new();
        let a = queue.submit(noop(), 1, &[]);
        let z1 = queue.submit(noop(), 0, &[a]);
        let z2 = queue.submit(noop(), 0, &[z1]);
        let b = queue.submit(noop(), 1, &[z2]);

        let claim = queue.claim().unwrap();
        assert_eq!(claim.bulk, a);

        // Finishing a must cascade through both empty bulks and leave b
        // claimable without any further completions.
        assert!(queue.complete(a));
        assert!(queue.finished.contains(&z1));
        assert!(queue.finished.contains(&z2));
        let next = queue.claim().unwrap();
        assert_eq!(next.bulk, b);
    }

    #[test]
    fn test_unknown_dep_never_satisfied() {
        let mut queue = BulkQueue::new();
        let ghost = BulkId::from_u64(1_000);
        queue.submit(noop(), 1, &[ghost]);

        assert!(queue.claim().is_none());
        assert!(!queue.is_idle());

        // More submissions and resolver passes change nothing.
        let a = queue.submit(noop(), 1, &[]);
        let claim = queue.claim().unwrap();
        assert_eq!(claim.bulk, a);
        queue.complete(a);
        assert!(queue.claim().is_none());
        assert_eq!(queue.outstanding(), 1);
    }

    #[test]
    fn test_diamond_drains_in_dependency_order() {
        let mut queue = BulkQueue::new();
        let top = queue.submit(noop(), 2, &[]);
        let left = queue.submit(noop(), 2, &[top]);
        let right = queue.submit(noop(), 2, &[top]);
        let bottom = queue.submit(noop(), 2, &[left, right]);

        // First wave: only top is claimable.
        let mut wave: Vec<BulkId> = Vec::new();
        while let Some(claim) = queue.claim() {
            wave.push(claim.bulk);
        }
        assert!(wave.iter().all(|&id| id == top));
        for id in wave {
            queue.complete(id);
        }

        // Second wave: left and right, in either order.
        let mut wave: Vec<BulkId> = Vec::new();
        while let Some(claim) = queue.claim() {
            wave.push(claim.bulk);
        }
        assert!(wave.iter().all(|&id| id == left || id == right));
        assert_eq!(wave.len(), 4);
        for id in wave {
            queue.complete(id);
        }

        // Third wave: bottom only, then idle.
        let mut wave: Vec<BulkId> = Vec::new();
        while let Some(claim) = queue.claim() {
            wave.push(claim.bulk);
        }
        assert!(wave.iter().all(|&id| id == bottom));
        for id in wave {
            queue.complete(id);
        }
        assert!(queue.is_idle());
    }

    #[test]
    fn test_drain_runs_every_task() {
        let mut queue = BulkQueue::new();
        let a = queue.submit(noop(), 3, &[]);
        queue.submit(noop(), 0, &[a]);
        queue.submit(noop(), 4, &[a]);

        assert_eq!(drain(&mut queue), 7);
        assert!(queue.is_idle());
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn test_shutdown_flag() {
        let mut queue = BulkQueue::new();
        assert!(!queue.is_shutdown());
        queue.begin_shutdown();
        assert!(queue.is_shutdown());
    }
}
