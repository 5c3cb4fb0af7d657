//! Per-vertex change scoring.
//!
//! ## The Delta
//!
//! For a vertex `v` with neighbor weights `w1` in the earlier graph and `w2`
//! in the later one:
//!
//! ```text
//! delta(v) = Σ_{n ∈ N1(v)} |w1(v,n) - w2(v,n)|     (w2 = 0 when the edge is gone)
//!          + Σ_{n ∈ N2(v) \ N1(v)} w2(v,n)         (edges that appeared)
//! ```
//!
//! A vertex missing from one version simply has no neighbors there, so its
//! delta is the total weight of its edges in the other version.
//!
//! The value is kept once per logical vertex in a [`Distortion`] map keyed by
//! [`VertexId`]; both versions read the same number.

use crate::error::{Error, Result};
use crate::graph::{GraphPair, VertexId};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Per-vertex scores with the observed range.
///
/// Produced by [`DeltaEngine::compute`], or from an external ranking slice
/// via [`Distortion::from_ranking_slice`]. Vertices without an entry score
/// `0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distortion {
    values: HashMap<VertexId, f64>,
    min: f64,
    max: f64,
}

impl Distortion {
    /// Build from explicit values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (VertexId, f64)>,
    {
        let values: HashMap<VertexId, f64> = values.into_iter().collect();
        let (min, max) = if values.is_empty() {
            (0.0, 0.0)
        } else {
            values
                .values()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
        };
        Self { values, min, max }
    }

    /// Scores for ids `1..=vertex_count` taken from one slice of a flat
    /// ranking array laid out as `ranking[(slice - 1) * vertex_count + (id - 1)]`.
    ///
    /// Returns `None` when the array is empty, `slice` is 0, or the slice runs
    /// past the end of the array.
    pub fn from_ranking_slice(ranking: &[f64], slice: usize, vertex_count: usize) -> Option<Self> {
        if ranking.is_empty() || slice == 0 || vertex_count == 0 {
            return None;
        }
        let start = (slice - 1).checked_mul(vertex_count)?;
        let end = start.checked_add(vertex_count)?;
        let window = ranking.get(start..end)?;
        Some(Self::from_values(
            window
                .iter()
                .enumerate()
                .map(|(i, &score)| (VertexId(i as u32 + 1), score)),
        ))
    }

    /// Score of `id` (0.0 when unknown).
    pub fn get(&self, id: VertexId) -> f64 {
        self.values.get(&id).copied().unwrap_or(0.0)
    }

    /// Smallest observed score.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest observed score.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Number of scored vertices.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was scored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(id, score)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, f64)> + '_ {
        self.values.iter().map(|(&id, &v)| (id, v))
    }

    /// Sum of scores over `ids`.
    pub fn sum<'a, I>(&self, ids: I) -> f64
    where
        I: IntoIterator<Item = &'a VertexId>,
    {
        ids.into_iter().map(|&id| self.get(id)).sum()
    }

    /// Higher score first; equal scores order by ascending id.
    pub fn by_distortion_descending(&self, a: VertexId, b: VertexId) -> Ordering {
        self.get(b).total_cmp(&self.get(a)).then(a.cmp(&b))
    }

    /// Lower score first; equal scores order by ascending id.
    pub fn by_distortion_ascending(&self, a: VertexId, b: VertexId) -> Ordering {
        self.get(a).total_cmp(&self.get(b)).then(a.cmp(&b))
    }

    /// Sort `ids` with [`Self::by_distortion_descending`].
    pub fn rank_descending(&self, mut ids: Vec<VertexId>) -> Vec<VertexId> {
        ids.sort_by(|&a, &b| self.by_distortion_descending(a, b));
        ids
    }

    /// Sort `ids` with [`Self::by_distortion_ascending`].
    pub fn rank_ascending(&self, mut ids: Vec<VertexId>) -> Vec<VertexId> {
        ids.sort_by(|&a, &b| self.by_distortion_ascending(a, b));
        ids
    }

    /// Linear position of `id` between `min` and `max`, in `[0, 1]`.
    ///
    /// A flat range maps everything to 0.
    pub fn normalized(&self, id: VertexId) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            ((self.get(id) - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Computes [`Distortion`] from a [`GraphPair`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaEngine;

impl DeltaEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self
    }

    /// Delta of every vertex present in either version.
    pub fn compute(&self, pair: &GraphPair) -> Distortion {
        let ids = pair.vertex_union();
        let values = ids.iter().map(|&id| (id, Self::vertex_delta(pair, id) as f64));
        let distortion = Distortion::from_values(values);
        debug!(
            vertices = distortion.len(),
            min = distortion.min(),
            max = distortion.max(),
            "computed distortion"
        );
        distortion
    }

    /// Like [`Self::compute`] but rejects a pair with no vertices at all.
    pub fn compute_checked(&self, pair: &GraphPair) -> Result<Distortion> {
        if pair.before.is_empty() && pair.after.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(self.compute(pair))
    }

    /// Delta of a single vertex. Saturates at `u64::MAX`.
    pub fn vertex_delta(pair: &GraphPair, id: VertexId) -> u64 {
        let before: HashMap<VertexId, i64> = pair.before.neighbors(id).collect();
        let mut delta = 0u64;
        for (&n, &w1) in &before {
            let w2 = pair.after.weight(id, n).unwrap_or(0);
            delta = delta.saturating_add(w1.abs_diff(w2));
        }
        for (n, w2) in pair.after.neighbors(id) {
            if !before.contains_key(&n) {
                delta = delta.saturating_add(w2.unsigned_abs());
            }
        }
        delta
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(id: u32) -> VertexId {
        VertexId(id)
    }

    #[test]
    fn path_reweighting_scenario() {
        let pair = GraphPair::from_triples(
            [(1, 2, 5), (2, 3, 5), (3, 4, 5)],
            [(1, 2, 9), (2, 3, 5), (3, 4, 1)],
        );
        let d = DeltaEngine::new().compute(&pair);
        for id in 1..=4 {
            assert_eq!(d.get(v(id)), 4.0, "vertex {id}");
        }
        assert_eq!(d.min(), 4.0);
        assert_eq!(d.max(), 4.0);
    }

    #[test]
    fn vertex_missing_from_one_version() {
        // 3 exists only in the later graph.
        let pair = GraphPair::from_triples([(1, 2, 2)], [(1, 2, 2), (2, 3, 7)]);
        let d = DeltaEngine::new().compute(&pair);
        assert_eq!(d.get(v(1)), 0.0);
        assert_eq!(d.get(v(2)), 7.0);
        assert_eq!(d.get(v(3)), 7.0);
    }

    #[test]
    fn removed_edges_count_full_weight() {
        let pair = GraphPair::from_triples([(1, 2, 3), (1, 3, 4)], [(1, 2, 3)]);
        let d = DeltaEngine::new().compute(&pair);
        assert_eq!(d.get(v(1)), 4.0);
        assert_eq!(d.get(v(3)), 4.0);
        assert_eq!(d.get(v(2)), 0.0);
    }

    #[test]
    fn extreme_weights_do_not_overflow() {
        let big = i64::MAX;
        let pair = GraphPair::from_triples([(1, 2, big), (1, 3, big)], [(1, 2, 1), (1, 4, big)]);
        assert_eq!(DeltaEngine::vertex_delta(&pair, v(2)), (big - 1) as u64);
        assert_eq!(DeltaEngine::vertex_delta(&pair, v(1)), u64::MAX);
        let d = DeltaEngine::new().compute(&pair);
        assert!(d.iter().all(|(_, x)| x.is_finite() && x >= 0.0));
    }

    #[test]
    fn empty_pair_is_rejected_when_checked() {
        let pair = GraphPair::default();
        assert_eq!(DeltaEngine::new().compute_checked(&pair), Err(Error::EmptyInput));
        assert!(DeltaEngine::new().compute(&pair).is_empty());
    }

    #[test]
    fn orderings_break_ties_by_id() {
        let d = Distortion::from_values([(v(3), 1.0), (v(1), 1.0), (v(2), 5.0)]);
        assert_eq!(d.rank_descending(vec![v(1), v(2), v(3)]), vec![v(2), v(1), v(3)]);
        assert_eq!(d.rank_ascending(vec![v(2), v(3), v(1)]), vec![v(1), v(3), v(2)]);
    }

    #[test]
    fn ranking_slice_addressing() {
        let ranking = [0.1, 0.2, 0.3, 1.1, 1.2, 1.3];
        let s2 = Distortion::from_ranking_slice(&ranking, 2, 3).unwrap();
        assert_eq!(s2.get(v(1)), 1.1);
        assert_eq!(s2.get(v(3)), 1.3);
        assert!(Distortion::from_ranking_slice(&ranking, 3, 3).is_none());
        assert!(Distortion::from_ranking_slice(&[], 1, 3).is_none());
        assert!(Distortion::from_ranking_slice(&ranking, 0, 3).is_none());
    }

    #[test]
    fn normalized_handles_flat_range() {
        let d = Distortion::from_values([(v(1), 2.0), (v(2), 2.0)]);
        assert_eq!(d.normalized(v(1)), 0.0);
        let d = Distortion::from_values([(v(1), 2.0), (v(2), 6.0)]);
        assert_eq!(d.normalized(v(2)), 1.0);
    }

    fn edges() -> impl Strategy<Value = Vec<(u32, u32, i64)>> {
        proptest::collection::vec((1u32..12, 1u32..12, 1i64..20), 0..30)
    }

    proptest! {
        #[test]
        fn delta_is_nonnegative_and_zero_iff_unchanged(e1 in edges(), e2 in edges()) {
            let pair = GraphPair::from_triples(e1, e2);
            let d = DeltaEngine::new().compute(&pair);
            for id in pair.vertex_union() {
                prop_assert!(d.get(id) >= 0.0);
                let n1: HashMap<VertexId, i64> = pair.before.neighbors(id).collect();
                let n2: HashMap<VertexId, i64> = pair.after.neighbors(id).collect();
                prop_assert_eq!(d.get(id) == 0.0, n1 == n2);
            }
        }

        #[test]
        fn delta_of_identical_graphs_is_zero(e in edges()) {
            let pair = GraphPair::from_triples(e.clone(), e);
            let d = DeltaEngine::new().compute(&pair);
            prop_assert!(d.iter().all(|(_, x)| x == 0.0));
        }

        #[test]
        fn delta_is_symmetric_in_version_order(e1 in edges(), e2 in edges()) {
            let engine = DeltaEngine::new();
            let forward = engine.compute(&GraphPair::from_triples(e1.clone(), e2.clone()));
            let backward = engine.compute(&GraphPair::from_triples(e2, e1));
            prop_assert_eq!(forward, backward);
        }
    }
}
