//! Removal of the least-changed vertices.
//!
//! Pruning strips the vertices whose delta is lowest so that later region
//! growth concentrates on the part of the network that actually moved. It
//! never recomputes distortion: the scores computed before the first prune
//! keep ranking the survivors.

use crate::delta::Distortion;
use crate::graph::{GraphPair, VertexId};
use tracing::debug;

/// Removes the `floor(step * n)` lowest-distortion vertices from both graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdPruner;

impl ThresholdPruner {
    /// Create a new pruner.
    pub fn new() -> Self {
        Self
    }

    /// Number of vertices a call with this `step` and reference count removes.
    pub fn removal_count(step: f64, reference_count: usize) -> usize {
        if !step.is_finite() || step <= 0.0 {
            return 0;
        }
        (step * reference_count as f64).floor() as usize
    }

    /// Prune `pair` in place and return the removed ids in removal order.
    ///
    /// Candidates are the vertices currently present in either version,
    /// ranked with [`Distortion::by_distortion_ascending`] (ties go to the
    /// lower id). Each removed id is stripped from both versions together
    /// with every incident edge.
    pub fn prune(
        &self,
        pair: &mut GraphPair,
        distortion: &Distortion,
        step: f64,
        reference_count: usize,
    ) -> Vec<VertexId> {
        let quota = Self::removal_count(step, reference_count);
        if quota == 0 {
            return Vec::new();
        }
        let candidates = distortion.rank_ascending(pair.vertex_union());
        let removed: Vec<VertexId> = candidates.into_iter().take(quota).collect();
        for &id in &removed {
            pair.remove_vertex(id);
        }
        debug!(
            step,
            reference_count,
            removed = removed.len(),
            remaining = pair.after.vertex_count(),
            "pruned low-distortion vertices"
        );
        removed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::delta::DeltaEngine;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn v(id: u32) -> VertexId {
        VertexId(id)
    }

    fn path_pair() -> GraphPair {
        GraphPair::from_triples(
            [(1, 2, 5), (2, 3, 5), (3, 4, 5)],
            [(1, 2, 9), (2, 3, 5), (3, 4, 1)],
        )
    }

    #[test]
    fn half_step_removes_two_of_four() {
        let mut pair = path_pair();
        let d = DeltaEngine::new().compute(&pair);
        let removed = ThresholdPruner::new().prune(&mut pair, &d, 0.5, 4);
        // All deltas tie at 4, so the lowest ids go first.
        assert_eq!(removed, vec![v(1), v(2)]);
        assert_eq!(pair.before.ids(), vec![v(3), v(4)]);
        assert_eq!(pair.after.ids(), vec![v(3), v(4)]);
        assert_eq!(pair.before.edge_count(), 1);
        assert_eq!(pair.after.edge_count(), 1);
        for id in pair.after.ids() {
            for (n, _) in pair.after.neighbors(id) {
                assert!(pair.after.contains(n));
            }
        }
    }

    #[test]
    fn lowest_distortion_goes_first() {
        let mut pair = GraphPair::from_triples([(1, 2, 1), (2, 3, 1)], [(1, 2, 1), (2, 3, 9)]);
        let d = DeltaEngine::new().compute(&pair);
        let removed = ThresholdPruner::new().prune(&mut pair, &d, 0.34, 3);
        assert_eq!(removed, vec![v(1)]);
    }

    #[test]
    fn zero_or_negative_step_is_noop() {
        let mut pair = path_pair();
        let d = DeltaEngine::new().compute(&pair);
        assert!(ThresholdPruner::new().prune(&mut pair, &d, 0.0, 4).is_empty());
        assert!(ThresholdPruner::new().prune(&mut pair, &d, -1.0, 4).is_empty());
        assert!(ThresholdPruner::new().prune(&mut pair, &d, f64::NAN, 4).is_empty());
        assert_eq!(pair.after.vertex_count(), 4);
    }

    #[test]
    fn oversized_step_empties_graphs() {
        let mut pair = path_pair();
        let d = DeltaEngine::new().compute(&pair);
        let removed = ThresholdPruner::new().prune(&mut pair, &d, 3.0, 4);
        assert_eq!(removed.len(), 4);
        assert!(pair.before.is_empty());
        assert!(pair.after.is_empty());
    }

    #[test]
    fn vertex_present_in_one_version_only_is_pruned() {
        let mut pair = GraphPair::from_triples([(1, 2, 1)], [(1, 2, 1), (2, 3, 1)]);
        let d = Distortion::from_values([(v(1), 5.0), (v(2), 5.0), (v(3), 0.0)]);
        let removed = ThresholdPruner::new().prune(&mut pair, &d, 0.34, 3);
        assert_eq!(removed, vec![v(3)]);
        assert!(!pair.after.contains(v(3)));
        assert_eq!(pair.after.degree(v(2)), 1);
    }

    #[test]
    fn removal_count_floors() {
        assert_eq!(ThresholdPruner::removal_count(0.1, 25), 2);
        assert_eq!(ThresholdPruner::removal_count(0.5, 4), 2);
        assert_eq!(ThresholdPruner::removal_count(0.3, 0), 0);
    }

    proptest! {
        #[test]
        fn survivors_shrink_monotonically(
            e1 in proptest::collection::vec((1u32..15, 1u32..15, 1i64..10), 1..40),
            e2 in proptest::collection::vec((1u32..15, 1u32..15, 1i64..10), 1..40),
            s1 in 0.0f64..1.0,
            s2 in 0.0f64..1.0,
        ) {
            let (lo, hi) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
            let start = GraphPair::from_triples(e1, e2);
            let d = DeltaEngine::new().compute(&start);
            let n = start.vertex_union().len();

            let mut a = start.clone();
            ThresholdPruner::new().prune(&mut a, &d, lo, n);
            let mut b = start;
            ThresholdPruner::new().prune(&mut b, &d, hi, n);

            let survivors_a: BTreeSet<VertexId> = a.vertex_union().into_iter().collect();
            let survivors_b: BTreeSet<VertexId> = b.vertex_union().into_iter().collect();
            prop_assert!(survivors_b.is_subset(&survivors_a));
        }
    }
}
