//! Weighted undirected graphs, one per version.
//!
//! Both versions of the network live in separate [`WeightedGraph`] arenas and
//! are correlated only through the external [`VertexId`]. There are no
//! references between the two: looking up a vertex that one version lacks
//! yields an empty neighbor set, a degree of zero and no edge weights.
//!
//! ```rust
//! use graphdelta::graph::{GraphPair, VertexId};
//!
//! let pair = GraphPair::from_triples(
//!     [(1, 2, 5), (2, 3, 5)],
//!     [(1, 2, 9)],
//! );
//! assert_eq!(pair.after.degree(VertexId(3)), 0);
//! assert_eq!(pair.before.weight(VertexId(1), VertexId(2)), Some(5));
//! ```

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// External vertex identifier, shared by both graph versions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VertexId(pub u32);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VertexId {
    fn from(id: u32) -> Self {
        VertexId(id)
    }
}

/// Weighted, undirected adjacency structure keyed by [`VertexId`].
///
/// Backed by a petgraph stable graph so that vertex removal during pruning
/// keeps the remaining indices valid. Symmetry of the adjacency is a
/// property of the undirected storage.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    graph: StableUnGraph<VertexId, i64>,
    index: HashMap<VertexId, NodeIndex>,
}

impl WeightedGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(from, to, weight)` triples.
    ///
    /// Repeated pairs keep the last weight; self loops and non-positive
    /// weights are dropped.
    pub fn from_triples<I>(triples: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32, i64)>,
    {
        let mut graph = Self::new();
        for (from, to, weight) in triples {
            graph.add_edge(VertexId(from), VertexId(to), weight);
        }
        graph
    }

    /// Insert a vertex if it is not already present.
    pub fn add_vertex(&mut self, id: VertexId) -> NodeIndex {
        if let Some(&ix) = self.index.get(&id) {
            return ix;
        }
        let ix = self.graph.add_node(id);
        self.index.insert(id, ix);
        ix
    }

    /// Insert or overwrite the undirected edge `a - b`.
    ///
    /// Both endpoints are inserted even when the edge itself is skipped
    /// (self loop or `weight < 1`).
    pub fn add_edge(&mut self, a: VertexId, b: VertexId, weight: i64) {
        let ia = self.add_vertex(a);
        let ib = self.add_vertex(b);
        if ia == ib || weight < 1 {
            return;
        }
        self.graph.update_edge(ia, ib, weight);
    }

    /// Remove a vertex and all incident edges. Returns whether it existed.
    pub fn remove_vertex(&mut self, id: VertexId) -> bool {
        match self.index.remove(&id) {
            Some(ix) => self.graph.remove_node(ix).is_some(),
            None => false,
        }
    }

    /// Whether the vertex is present.
    pub fn contains(&self, id: VertexId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All vertex ids in ascending order.
    pub fn ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self.index.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Neighbors of `id` with edge weights. Empty for an absent vertex.
    ///
    /// Iteration order follows the arena, not the id; callers that need a
    /// deterministic order sort the result.
    pub fn neighbors(&self, id: VertexId) -> impl Iterator<Item = (VertexId, i64)> + '_ {
        self.index.get(&id).into_iter().flat_map(move |&ix| {
            self.graph.edges(ix).map(move |edge| {
                let other = if edge.source() == ix {
                    edge.target()
                } else {
                    edge.source()
                };
                (self.graph[other], *edge.weight())
            })
        })
    }

    /// Neighbor ids of `id` in ascending order.
    pub fn sorted_neighbors(&self, id: VertexId) -> Vec<VertexId> {
        let mut out: Vec<VertexId> = self.neighbors(id).map(|(n, _)| n).collect();
        out.sort_unstable();
        out
    }

    /// Weight of the edge `a - b`, if present.
    pub fn weight(&self, a: VertexId, b: VertexId) -> Option<i64> {
        let ia = *self.index.get(&a)?;
        let ib = *self.index.get(&b)?;
        let edge = self.graph.find_edge(ia, ib)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Full degree of `id` (0 for an absent vertex).
    pub fn degree(&self, id: VertexId) -> usize {
        self.neighbors(id).count()
    }

    /// Edges with both endpoints in `vertices`, each once as `(low, high)`,
    /// sorted.
    pub fn induced_edges(&self, vertices: &BTreeSet<VertexId>) -> Vec<(VertexId, VertexId)> {
        let mut edges = Vec::new();
        for &v in vertices {
            for (n, _) in self.neighbors(v) {
                if v < n && vertices.contains(&n) {
                    edges.push((v, n));
                }
            }
        }
        edges.sort_unstable();
        edges
    }

    /// Number of edges with both endpoints in `vertices`.
    pub fn internal_edge_count(&self, vertices: &BTreeSet<VertexId>) -> usize {
        vertices
            .iter()
            .map(|&v| {
                self.neighbors(v)
                    .filter(|(n, _)| v < *n && vertices.contains(n))
                    .count()
            })
            .sum()
    }

    /// Sum of full degrees over `vertices`.
    pub fn degree_sum(&self, vertices: &BTreeSet<VertexId>) -> usize {
        vertices.iter().map(|&v| self.degree(v)).sum()
    }

    /// Largest vertex id present, if any.
    pub fn max_id(&self) -> Option<VertexId> {
        self.index.keys().copied().max()
    }
}

/// The two versions being compared.
///
/// `before` is graph-1, `after` is graph-2 (the "current" graph that regions
/// are grown over).
#[derive(Debug, Clone, Default)]
pub struct GraphPair {
    /// Earlier version (graph-1).
    pub before: WeightedGraph,
    /// Later version (graph-2).
    pub after: WeightedGraph,
}

impl GraphPair {
    /// Pair two already-built graphs.
    pub fn new(before: WeightedGraph, after: WeightedGraph) -> Self {
        Self { before, after }
    }

    /// Build both versions from triples.
    pub fn from_triples<A, B>(before: A, after: B) -> Self
    where
        A: IntoIterator<Item = (u32, u32, i64)>,
        B: IntoIterator<Item = (u32, u32, i64)>,
    {
        Self::new(
            WeightedGraph::from_triples(before),
            WeightedGraph::from_triples(after),
        )
    }

    /// Ids present in either version, ascending.
    pub fn vertex_union(&self) -> Vec<VertexId> {
        let set: BTreeSet<VertexId> = self
            .before
            .ids()
            .into_iter()
            .chain(self.after.ids())
            .collect();
        set.into_iter().collect()
    }

    /// Dense vertex count: the maximum id seen in either version.
    pub fn id_span(&self) -> usize {
        let a = self.before.max_id().map_or(0, |v| v.0);
        let b = self.after.max_id().map_or(0, |v| v.0);
        a.max(b) as usize
    }

    /// Remove a vertex from both versions. Returns whether either had it.
    pub fn remove_vertex(&mut self, id: VertexId) -> bool {
        let a = self.before.remove_vertex(id);
        let b = self.after.remove_vertex(id);
        a || b
    }
}
