//! # graphdelta
//!
//! Compare two versions of a weighted undirected graph and find the regions
//! that changed most.
//!
//! The pipeline:
//!
//! 1. [`DeltaEngine`] scores every vertex by how much its incident edge
//!    weights moved between versions ([`Distortion`]).
//! 2. [`ThresholdPruner`] optionally strips the least-changed vertices.
//! 3. A [`Traversal`] grows a connected [`Region`] from a seed over the later
//!    graph (plain, radius-bounded, top-`k` biased or priority BFS).
//! 4. A [`RegionSelector`] picks the regions to report (greedy
//!    non-overlapping, exhaustive, radius sweep, top vertices).
//! 5. [`RegionEvaluator`] scores them with six normalized metrics, and
//!    [`ParameterSearch`] sweeps pruning thresholds / ranking cutoffs,
//!    keeping the best result per method in [`BestScores`].
//!
//! **Default build** is single-threaded. The `parallel` feature grows
//! exhaustive candidate regions on rayon.
//!
//! ```
//! use graphdelta::{DeltaEngine, GraphPair, GreedySelector, RegionEvaluator, RegionSelector};
//!
//! let pair = GraphPair::from_triples(
//!     [(1, 2, 5), (2, 3, 5), (3, 4, 5)],
//!     [(1, 2, 9), (2, 3, 5), (3, 4, 1)],
//! );
//! let distortion = DeltaEngine::new().compute(&pair);
//! let regions = GreedySelector::new(2, 2).select(&pair, &distortion);
//! let metrics = RegionEvaluator::new().evaluate(&pair, &distortion, &regions);
//! assert_eq!(metrics[0][0], 8.0);
//! ```

pub mod delta;
/// Error types used across `graphdelta`.
pub mod error;
pub mod evaluate;
pub mod graph;
pub mod grow;
pub mod ingest;
pub mod prune;
pub mod region;
pub mod render;
pub mod search;
pub mod select;


pub use delta::{DeltaEngine, Distortion};
pub use error::{Error, Result};
pub use evaluate::{
    column_sums, BestRecord, BestScores, BestSlot, Improvement, MethodId, MetricMatrix,
    MetricVector, RegionEvaluator, Trial, METRIC_NAMES,
};
pub use graph::{GraphPair, VertexId, WeightedGraph};
pub use grow::{BiasedBfs, Bfs, PriorityBfs, RadiusBfs, Traversal, TraversalMethod};
pub use ingest::{parse_triples, read_records, read_triples};
pub use prune::ThresholdPruner;
pub use region::{Region, RegionView};
pub use render::{format_metric, render_region, RegionRender};
pub use search::{
    KRange, MethodReport, ParameterSearch, RankingSource, SearchConfig, SearchMethod,
    SearchReport, SweepKind,
};
pub use select::{
    map_to_graph, top_vertices, ExhaustiveSelector, GreedySelector, RadiusScore, RadiusSelector,
    RegionSelector, SelectionParams, SelectorKind, TopVertices,
};
