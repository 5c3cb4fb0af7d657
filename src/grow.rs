//! Region growing.
//!
//! Every policy starts from one seed vertex of the current graph and expands
//! outward until it holds a target number of vertices (or, for
//! [`RadiusBfs`], until every vertex within a hop radius has been reached).
//!
//! | Policy | Frontier | Stops at |
//! |--------|----------|----------|
//! | [`Bfs`] | FIFO | `size` vertices |
//! | [`RadiusBfs`] | FIFO with hop depth | queue drained; depth `radius` not expanded |
//! | [`BiasedBfs`] | FIFO, only top-`k` neighbors per step | `size` vertices |
//! | [`PriorityBfs`] | max-heap on score | `size` vertices |
//!
//! Neighbors are visited in ascending id order and score ties break toward
//! the lower id, so growing twice from the same input gives the same region.
//! After the vertex set is fixed, edges are restricted to those with both
//! endpoints inside it.

use crate::delta::Distortion;
use crate::graph::{VertexId, WeightedGraph};
use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashSet, VecDeque};

/// A region-growing policy.
pub trait Traversal: Send + Sync {
    /// Grow a region from `seed` over `graph`, ordering by `scores` where the
    /// policy cares about order.
    ///
    /// A seed absent from `graph` yields the singleton region `{seed}`.
    fn grow(&self, graph: &WeightedGraph, scores: &Distortion, seed: VertexId) -> Region;

    /// Short policy name for logs and reports.
    fn name(&self) -> &'static str;

    /// Vertex count the policy aims for, if it aims for one.
    fn target_size(&self) -> Option<usize>;
}

/// Plain breadth-first growth.
#[derive(Debug, Clone, Copy)]
pub struct Bfs {
    size: usize,
}

impl Bfs {
    /// Grow up to `size` vertices.
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }
}

impl Traversal for Bfs {
    fn grow(&self, graph: &WeightedGraph, _scores: &Distortion, seed: VertexId) -> Region {
        let mut found: HashSet<VertexId> = HashSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        let mut members = BTreeSet::new();

        while let Some(current) = queue.pop_front() {
            members.insert(current);
            if members.len() == self.size {
                break;
            }
            for n in graph.sorted_neighbors(current) {
                if found.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        Region::induced(seed, members, graph, 0)
    }

    fn name(&self) -> &'static str {
        "bfs"
    }

    fn target_size(&self) -> Option<usize> {
        Some(self.size)
    }
}

/// Breadth-first growth bounded by hop distance from the seed.
#[derive(Debug, Clone, Copy)]
pub struct RadiusBfs {
    radius: usize,
}

impl RadiusBfs {
    /// Include every vertex within `radius` hops.
    pub fn new(radius: usize) -> Self {
        Self { radius }
    }

    /// Configured hop bound.
    pub fn radius(&self) -> usize {
        self.radius
    }
}

impl Traversal for RadiusBfs {
    fn grow(&self, graph: &WeightedGraph, _scores: &Distortion, seed: VertexId) -> Region {
        let mut found: HashSet<VertexId> = HashSet::from([seed]);
        let mut queue = VecDeque::from([(seed, 0usize)]);
        let mut members = BTreeSet::new();
        let mut reached = 0;

        while let Some((current, depth)) = queue.pop_front() {
            members.insert(current);
            reached = reached.max(depth);
            if depth == self.radius {
                continue;
            }
            for n in graph.sorted_neighbors(current) {
                if found.insert(n) {
                    queue.push_back((n, depth + 1));
                }
            }
        }
        Region::induced(seed, members, graph, reached)
    }

    fn name(&self) -> &'static str {
        "radius-bfs"
    }

    fn target_size(&self) -> Option<usize> {
        None
    }
}

/// Breadth-first growth that only follows the `k` most distorted unvisited
/// neighbors of each dequeued vertex.
///
/// Neighbors not chosen at a step are dropped for that step; they can still
/// be reached later through a different vertex.
#[derive(Debug, Clone, Copy)]
pub struct BiasedBfs {
    size: usize,
    k: usize,
}

impl BiasedBfs {
    /// Grow up to `size` vertices following the top `k` neighbors.
    /// With `k = 0` no neighbor is followed and the region is the seed alone.
    pub fn new(size: usize, k: usize) -> Self {
        Self {
            size: size.max(1),
            k,
        }
    }

    /// Set the bias factor.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

impl Traversal for BiasedBfs {
    fn grow(&self, graph: &WeightedGraph, scores: &Distortion, seed: VertexId) -> Region {
        let mut found: HashSet<VertexId> = HashSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        let mut members = BTreeSet::new();

        while let Some(current) = queue.pop_front() {
            members.insert(current);
            if members.len() == self.size {
                break;
            }
            let unvisited: Vec<VertexId> = graph
                .neighbors(current)
                .map(|(n, _)| n)
                .filter(|n| !found.contains(n))
                .collect();
            for n in scores.rank_descending(unvisited).into_iter().take(self.k) {
                found.insert(n);
                queue.push_back(n);
            }
        }
        Region::induced(seed, members, graph, 0)
    }

    fn name(&self) -> &'static str {
        "biased-bfs"
    }

    fn target_size(&self) -> Option<usize> {
        Some(self.size)
    }
}

/// Best-first growth: the most distorted frontier vertex is expanded next.
#[derive(Debug, Clone, Copy)]
pub struct PriorityBfs {
    size: usize,
}

impl PriorityBfs {
    /// Grow up to `size` vertices.
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }
}

/// Heap entry: higher score first, then lower id.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    score: f64,
    id: VertexId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl Traversal for PriorityBfs {
    fn grow(&self, graph: &WeightedGraph, scores: &Distortion, seed: VertexId) -> Region {
        let mut found: HashSet<VertexId> = HashSet::from([seed]);
        let mut heap = BinaryHeap::from([Frontier {
            score: scores.get(seed),
            id: seed,
        }]);
        let mut members = BTreeSet::new();

        while let Some(Frontier { id: current, .. }) = heap.pop() {
            members.insert(current);
            if members.len() == self.size {
                break;
            }
            for (n, _) in graph.neighbors(current) {
                if found.insert(n) {
                    heap.push(Frontier {
                        score: scores.get(n),
                        id: n,
                    });
                }
            }
        }
        Region::induced(seed, members, graph, 0)
    }

    fn name(&self) -> &'static str {
        "priority-bfs"
    }

    fn target_size(&self) -> Option<usize> {
        Some(self.size)
    }
}

/// Serializable choice of traversal policy.
///
/// The target size is supplied separately (it is a selector setting), so a
/// method can be reused across region sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraversalMethod {
    /// [`Bfs`].
    Bfs,
    /// [`RadiusBfs`] with a fixed hop bound.
    RadiusBfs {
        /// Hop bound.
        radius: usize,
    },
    /// [`BiasedBfs`] with bias factor `k`.
    BiasedBfs {
        /// Neighbors followed per step.
        k: usize,
    },
    /// [`PriorityBfs`].
    PriorityBfs,
}

impl TraversalMethod {
    /// Instantiate the policy for regions of `size` vertices.
    pub fn build(&self, size: usize) -> Box<dyn Traversal> {
        match *self {
            TraversalMethod::Bfs => Box::new(Bfs::new(size)),
            TraversalMethod::RadiusBfs { radius } => Box::new(RadiusBfs::new(radius)),
            TraversalMethod::BiasedBfs { k } => Box::new(BiasedBfs::new(size, k)),
            TraversalMethod::PriorityBfs => Box::new(PriorityBfs::new(size)),
        }
    }
}

impl Default for TraversalMethod {
    fn default() -> Self {
        TraversalMethod::PriorityBfs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::delta::DeltaEngine;
    use crate::graph::GraphPair;
    use proptest::prelude::*;

    fn v(id: u32) -> VertexId {
        VertexId(id)
    }

    fn ids(r: &Region) -> Vec<u32> {
        r.vertices.iter().map(|v| v.0).collect()
    }

    /// Star centered on 1 with leaves 2..=5, plus a tail 5-6-7.
    fn star() -> WeightedGraph {
        WeightedGraph::from_triples([
            (1, 2, 1),
            (1, 3, 1),
            (1, 4, 1),
            (1, 5, 1),
            (5, 6, 1),
            (6, 7, 1),
        ])
    }

    fn scores(pairs: &[(u32, f64)]) -> Distortion {
        Distortion::from_values(pairs.iter().map(|&(i, s)| (v(i), s)))
    }

    #[test]
    fn bfs_on_reweighted_path() {
        let pair = GraphPair::from_triples(
            [(1, 2, 5), (2, 3, 5), (3, 4, 5)],
            [(1, 2, 9), (2, 3, 5), (3, 4, 1)],
        );
        let d = DeltaEngine::new().compute(&pair);
        let r = Bfs::new(2).grow(&pair.after, &d, v(1));
        assert_eq!(ids(&r), vec![1, 2]);
        assert_eq!(r.edges, vec![(v(1), v(2))]);
    }

    #[test]
    fn bfs_visits_in_id_order() {
        let r = Bfs::new(3).grow(&star(), &Distortion::default(), v(1));
        assert_eq!(ids(&r), vec![1, 2, 3]);
    }

    #[test]
    fn bfs_returns_smaller_region_when_exhausted() {
        let g = WeightedGraph::from_triples([(1, 2, 1)]);
        let r = Bfs::new(5).grow(&g, &Distortion::default(), v(1));
        assert_eq!(r.size(), 2);
    }

    #[test]
    fn absent_seed_is_singleton() {
        let r = PriorityBfs::new(4).grow(&star(), &Distortion::default(), v(42));
        assert_eq!(ids(&r), vec![42]);
        assert!(r.edges.is_empty());
    }

    #[test]
    fn radius_bfs_stops_at_radius() {
        let g = star();
        let r = RadiusBfs::new(1).grow(&g, &Distortion::default(), v(5));
        assert_eq!(ids(&r), vec![1, 5, 6]);
        assert_eq!(r.radius, 1);

        let r = RadiusBfs::new(0).grow(&g, &Distortion::default(), v(5));
        assert_eq!(ids(&r), vec![5]);

        let r = RadiusBfs::new(10).grow(&g, &Distortion::default(), v(7));
        assert_eq!(r.size(), 7);
        // 7 -> 6 -> 5 -> 1 -> leaves: four hops at most.
        assert_eq!(r.radius, 4);
    }

    #[test]
    fn biased_bfs_follows_top_k() {
        let g = star();
        let s = scores(&[(2, 1.0), (3, 9.0), (4, 8.0), (5, 0.5), (6, 100.0)]);
        let r = BiasedBfs::new(3, 2).grow(&g, &s, v(1));
        assert_eq!(ids(&r), vec![1, 3, 4]);

        // With k = 1 only the tail through 3 is taken; 3 is a leaf so growth ends.
        let r = BiasedBfs::new(5, 1).grow(&g, &s, v(1));
        assert_eq!(ids(&r), vec![1, 3]);
    }

    #[test]
    fn biased_bfs_with_zero_k_stays_at_seed() {
        let r = BiasedBfs::new(4, 0).grow(&star(), &Distortion::default(), v(1));
        assert_eq!(ids(&r), vec![1]);
    }

    #[test]
    fn priority_bfs_expands_best_frontier() {
        let g = star();
        let s = scores(&[(1, 0.0), (2, 1.0), (3, 2.0), (4, 3.0), (5, 4.0), (6, 50.0), (7, 60.0)]);
        // From 1: frontier {2,3,4,5}; 5 wins, then 6 (50), then 7 (60).
        let r = PriorityBfs::new(4).grow(&g, &s, v(1));
        assert_eq!(ids(&r), vec![1, 5, 6, 7]);
    }

    #[test]
    fn priority_ties_prefer_lower_id() {
        let r = PriorityBfs::new(2).grow(&star(), &Distortion::default(), v(1));
        assert_eq!(ids(&r), vec![1, 2]);
    }

    #[test]
    fn method_builds_matching_policy() {
        assert_eq!(TraversalMethod::Bfs.build(3).name(), "bfs");
        assert_eq!(TraversalMethod::BiasedBfs { k: 2 }.build(3).target_size(), Some(3));
        assert_eq!(TraversalMethod::RadiusBfs { radius: 2 }.build(3).target_size(), None);
        assert_eq!(TraversalMethod::default(), TraversalMethod::PriorityBfs);
    }

    #[test]
    fn method_serde_shape() {
        let json = serde_json::to_string(&TraversalMethod::BiasedBfs { k: 5 }).unwrap();
        assert_eq!(json, r#"{"kind":"biased_bfs","k":5}"#);
        let back: TraversalMethod = serde_json::from_str(r#"{"kind":"priority_bfs"}"#).unwrap();
        assert_eq!(back, TraversalMethod::PriorityBfs);
    }

    fn methods() -> impl Strategy<Value = TraversalMethod> {
        prop_oneof![
            Just(TraversalMethod::Bfs),
            (0usize..4).prop_map(|radius| TraversalMethod::RadiusBfs { radius }),
            (0usize..4).prop_map(|k| TraversalMethod::BiasedBfs { k }),
            Just(TraversalMethod::PriorityBfs),
        ]
    }

    proptest! {
        #[test]
        fn growth_is_deterministic_bounded_and_closed(
            e1 in proptest::collection::vec((1u32..20, 1u32..20, 1i64..10), 1..50),
            e2 in proptest::collection::vec((1u32..20, 1u32..20, 1i64..10), 1..50),
            size in 1usize..8,
            method in methods(),
        ) {
            let pair = GraphPair::from_triples(e1, e2);
            let d = DeltaEngine::new().compute(&pair);
            let traversal = method.build(size);
            for seed in pair.after.ids() {
                let a = traversal.grow(&pair.after, &d, seed);
                let b = traversal.grow(&pair.after, &d, seed);
                prop_assert_eq!(&a, &b);
                prop_assert!(a.contains(seed));
                if let Some(target) = traversal.target_size() {
                    prop_assert!(a.size() <= target);
                }
                for (x, y) in &a.edges {
                    prop_assert!(a.contains(*x) && a.contains(*y));
                }
                prop_assert_eq!(a.edges.len(), pair.after.internal_edge_count(&a.vertices));
            }
        }
    }
}
