//! Region value types.

use crate::graph::{VertexId, WeightedGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A vertex set produced by one traversal run.
///
/// `edges` are the edges of the graph the region was grown over whose two
/// endpoints are both in `vertices`; nothing dangles out of the region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Vertex the traversal started from.
    pub seed: VertexId,
    /// Member vertices.
    pub vertices: BTreeSet<VertexId>,
    /// Induced edges, `(low, high)`, sorted.
    pub edges: Vec<(VertexId, VertexId)>,
    /// Ranking score assigned by the selector (0 until ranked).
    pub score: f64,
    /// Largest hop distance reached (radius-bounded traversal only).
    pub radius: usize,
}

impl Region {
    /// Build a region and restrict `graph`'s edges to it.
    pub fn induced(
        seed: VertexId,
        vertices: BTreeSet<VertexId>,
        graph: &WeightedGraph,
        radius: usize,
    ) -> Self {
        let edges = graph.induced_edges(&vertices);
        Self {
            seed,
            vertices,
            edges,
            score: 0.0,
            radius,
        }
    }

    /// Realized number of vertices.
    pub fn size(&self) -> usize {
        self.vertices.len()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains(&id)
    }

    /// Fraction of this region's vertices already in `selected`.
    pub fn overlap_with(&self, selected: &BTreeSet<VertexId>) -> f64 {
        if self.vertices.is_empty() {
            return 0.0;
        }
        let shared = self.vertices.intersection(selected).count();
        shared as f64 / self.vertices.len() as f64
    }

    /// Same vertex set seen through another graph version.
    pub fn view_in(&self, graph: &WeightedGraph) -> RegionView {
        RegionView::of(&self.vertices, graph)
    }

    /// Set the ranking score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }
}

/// A vertex set with the edges it induces in one particular graph version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionView {
    /// Member vertices.
    pub vertices: BTreeSet<VertexId>,
    /// Induced edges in the viewed graph, `(low, high)`, sorted.
    pub edges: Vec<(VertexId, VertexId)>,
}

impl RegionView {
    /// Induced subgraph of `vertices` in `graph`. Members absent from `graph`
    /// are kept as isolated vertices.
    pub fn of(vertices: &BTreeSet<VertexId>, graph: &WeightedGraph) -> Self {
        Self {
            vertices: vertices.clone(),
            edges: graph.induced_edges(vertices),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u32]) -> BTreeSet<VertexId> {
        ids.iter().map(|&i| VertexId(i)).collect()
    }

    #[test]
    fn overlap_fraction() {
        let g = WeightedGraph::from_triples([(1, 2, 1), (2, 3, 1), (3, 4, 1)]);
        let r = Region::induced(VertexId(1), set(&[1, 2, 3, 4]), &g, 0);
        assert_eq!(r.overlap_with(&set(&[3, 4, 9])), 0.5);
        assert_eq!(r.overlap_with(&BTreeSet::new()), 0.0);
        assert_eq!(r.edges.len(), 3);
    }

    #[test]
    fn view_in_other_version() {
        let g2 = WeightedGraph::from_triples([(1, 2, 1), (2, 3, 1)]);
        let g1 = WeightedGraph::from_triples([(1, 3, 1)]);
        let r = Region::induced(VertexId(1), set(&[1, 2, 3]), &g2, 0);
        let before = r.view_in(&g1);
        assert_eq!(before.vertices, r.vertices);
        assert_eq!(before.edges, vec![(VertexId(1), VertexId(3))]);
    }
}
