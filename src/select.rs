//! Region selection.
//!
//! A selector turns a graph pair and a score map into a ranked list of
//! [`Region`]s. Growth always runs over the later graph (`pair.after`);
//! scoring may look at both versions.
//!
//! | Selector | Seeds | Overlap | Score |
//! |----------|-------|---------|-------|
//! | [`GreedySelector`] | by score, descending | bounded | mean distortion |
//! | [`ExhaustiveSelector`] | every vertex | optional bound | edge-normalized (slot 2) |
//! | [`RadiusSelector`] | every vertex | none | mean or edge-normalized |
//! | [`top_vertices`] | by score, descending | none (singletons) | vertex score |
//!
//! Rankings sort by score descending; equal scores keep the lower seed id
//! first.

use crate::delta::Distortion;
use crate::evaluate::RegionEvaluator;
use crate::graph::{GraphPair, VertexId, WeightedGraph};
use crate::grow::{RadiusBfs, Traversal, TraversalMethod};
use crate::region::{Region, RegionView};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A region-selection strategy.
pub trait RegionSelector {
    /// Select regions over `pair`, ranking and growing by `scores`.
    fn select(&self, pair: &GraphPair, scores: &Distortion) -> Vec<Region>;

    /// Short strategy name for logs and reports.
    fn name(&self) -> &'static str;
}

fn by_score_then_seed(a: &Region, b: &Region) -> Ordering {
    b.score.total_cmp(&a.score).then(a.seed.cmp(&b.seed))
}

/// Greedy non-overlapping selection.
///
/// Seeds are tried from highest to lowest score; a seed already covered by an
/// accepted region is skipped. A grown region is accepted when at most
/// `overlap_threshold` of its vertices are already covered and it passes the
/// size rule.
#[derive(Debug, Clone)]
pub struct GreedySelector {
    traversal: TraversalMethod,
    region_count: usize,
    region_size: usize,
    overlap_threshold: f64,
    require_exact_size: bool,
}

impl GreedySelector {
    /// Select up to `region_count` regions of `region_size` vertices.
    pub fn new(region_count: usize, region_size: usize) -> Self {
        Self {
            traversal: TraversalMethod::Bfs,
            region_count,
            region_size,
            overlap_threshold: 0.0,
            require_exact_size: true,
        }
    }

    /// Set the growth policy.
    pub fn with_traversal(mut self, traversal: TraversalMethod) -> Self {
        self.traversal = traversal;
        self
    }

    /// Set the maximum covered fraction of a new region.
    pub fn with_overlap_threshold(mut self, threshold: f64) -> Self {
        self.overlap_threshold = threshold;
        self
    }

    /// Require regions of exactly `region_size` vertices (default on).
    ///
    /// When off, any size is accepted as long as the region has at least one
    /// internal edge.
    pub fn with_exact_size(mut self, exact: bool) -> Self {
        self.require_exact_size = exact;
        self
    }

    fn size_ok(&self, traversal: &dyn Traversal, region: &Region) -> bool {
        if self.require_exact_size {
            match traversal.target_size() {
                Some(target) => region.size() == target,
                None => true,
            }
        } else {
            !region.edges.is_empty()
        }
    }
}

impl Default for GreedySelector {
    fn default() -> Self {
        Self::new(10, 5)
    }
}

impl RegionSelector for GreedySelector {
    fn select(&self, pair: &GraphPair, scores: &Distortion) -> Vec<Region> {
        let mut accepted = Vec::new();
        if self.region_count == 0 {
            return accepted;
        }
        let traversal = self.traversal.build(self.region_size);
        let evaluator = RegionEvaluator::new();
        let mut covered: BTreeSet<VertexId> = BTreeSet::new();

        for seed in scores.rank_descending(pair.after.ids()) {
            if covered.contains(&seed) {
                continue;
            }
            let region = traversal.grow(&pair.after, scores, seed);
            let overlap = region.overlap_with(&covered);
            if overlap > self.overlap_threshold || !self.size_ok(traversal.as_ref(), &region) {
                trace!(%seed, size = region.size(), overlap, "rejected region");
                continue;
            }
            let score = evaluator.mean_distortion(scores, &region.vertices);
            covered.extend(region.vertices.iter().copied());
            accepted.push(region.with_score(score));
            if accepted.len() == self.region_count {
                break;
            }
        }
        debug!(
            traversal = traversal.name(),
            selected = accepted.len(),
            wanted = self.region_count,
            "greedy selection"
        );
        accepted
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

/// Grow from every vertex, keep the best-scoring regions of the target size.
///
/// Score is `S / min(max(1,E1), max(1,E2))`. Regions may share vertices
/// unless an overlap threshold is set.
#[derive(Debug, Clone)]
pub struct ExhaustiveSelector {
    traversal: TraversalMethod,
    region_count: usize,
    region_size: usize,
    overlap_threshold: Option<f64>,
}

impl ExhaustiveSelector {
    /// Select the top `region_count` regions of `region_size` vertices.
    pub fn new(region_count: usize, region_size: usize) -> Self {
        Self {
            traversal: TraversalMethod::PriorityBfs,
            region_count,
            region_size,
            overlap_threshold: None,
        }
    }

    /// Set the growth policy.
    pub fn with_traversal(mut self, traversal: TraversalMethod) -> Self {
        self.traversal = traversal;
        self
    }

    /// Bound the covered fraction of each accepted region (off by default).
    pub fn with_overlap_threshold(mut self, threshold: Option<f64>) -> Self {
        self.overlap_threshold = threshold;
        self
    }

    fn grow_all(
        traversal: &dyn Traversal,
        graph: &WeightedGraph,
        scores: &Distortion,
        seeds: &[VertexId],
    ) -> Vec<Region> {
        #[cfg(feature = "parallel")]
        let grown: Vec<Region> = seeds
            .par_iter()
            .map(|&seed| traversal.grow(graph, scores, seed))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let grown: Vec<Region> = seeds
            .iter()
            .map(|&seed| traversal.grow(graph, scores, seed))
            .collect();

        grown
    }
}

impl Default for ExhaustiveSelector {
    fn default() -> Self {
        Self::new(10, 5)
    }
}

impl RegionSelector for ExhaustiveSelector {
    fn select(&self, pair: &GraphPair, scores: &Distortion) -> Vec<Region> {
        if self.region_count == 0 {
            return Vec::new();
        }
        let traversal = self.traversal.build(self.region_size);
        let evaluator = RegionEvaluator::new();
        let seeds = pair.after.ids();
        let grown = Self::grow_all(traversal.as_ref(), &pair.after, scores, &seeds);

        let target = traversal.target_size();
        let mut candidates: Vec<Region> = grown
            .into_iter()
            .filter(|r| target.map_or(true, |t| r.size() == t))
            .map(|r| {
                let score = evaluator.edge_normalized(pair, scores, &r.vertices);
                r.with_score(score)
            })
            .collect();
        candidates.sort_by(by_score_then_seed);

        let selected: Vec<Region> = match self.overlap_threshold {
            None => candidates.into_iter().take(self.region_count).collect(),
            Some(threshold) => {
                let mut covered: BTreeSet<VertexId> = BTreeSet::new();
                let mut out = Vec::new();
                for region in candidates {
                    if region.overlap_with(&covered) > threshold {
                        continue;
                    }
                    covered.extend(region.vertices.iter().copied());
                    out.push(region);
                    if out.len() == self.region_count {
                        break;
                    }
                }
                out
            }
        };
        debug!(
            traversal = traversal.name(),
            seeds = seeds.len(),
            selected = selected.len(),
            "exhaustive selection"
        );
        selected
    }

    fn name(&self) -> &'static str {
        "exhaustive"
    }
}

/// How [`RadiusSelector`] scores a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusScore {
    /// `S / |R|`.
    #[default]
    Mean,
    /// `S / min(max(1,E1), max(1,E2))`.
    EdgeNormalized,
}

/// Smallest-radius neighborhoods of at least `min_size` vertices.
///
/// For each vertex the hop bound grows from 0 until the neighborhood is big
/// enough; vertices whose whole component is smaller than `min_size` yield
/// nothing.
#[derive(Debug, Clone)]
pub struct RadiusSelector {
    region_count: usize,
    min_size: usize,
    score: RadiusScore,
}

impl RadiusSelector {
    /// Select the top `region_count` neighborhoods of at least `min_size` vertices.
    pub fn new(region_count: usize, min_size: usize) -> Self {
        Self {
            region_count,
            min_size,
            score: RadiusScore::Mean,
        }
    }

    /// Set the scoring rule.
    pub fn with_score(mut self, score: RadiusScore) -> Self {
        self.score = score;
        self
    }

    fn smallest_neighborhood(
        &self,
        graph: &WeightedGraph,
        scores: &Distortion,
        seed: VertexId,
    ) -> Option<Region> {
        let limit = graph.vertex_count();
        let mut last_size = 0;
        for radius in 0..=limit {
            let region = RadiusBfs::new(radius).grow(graph, scores, seed);
            if region.size() >= self.min_size {
                return Some(region);
            }
            if radius > 0 && region.size() == last_size {
                // Component exhausted.
                return None;
            }
            last_size = region.size();
        }
        None
    }
}

impl RegionSelector for RadiusSelector {
    fn select(&self, pair: &GraphPair, scores: &Distortion) -> Vec<Region> {
        if self.region_count == 0 {
            return Vec::new();
        }
        let evaluator = RegionEvaluator::new();
        let mut candidates: Vec<Region> = pair
            .after
            .ids()
            .into_iter()
            .filter_map(|seed| self.smallest_neighborhood(&pair.after, scores, seed))
            .map(|r| {
                let score = match self.score {
                    RadiusScore::Mean => evaluator.mean_distortion(scores, &r.vertices),
                    RadiusScore::EdgeNormalized => {
                        evaluator.edge_normalized(pair, scores, &r.vertices)
                    }
                };
                r.with_score(score)
            })
            .collect();
        candidates.sort_by(by_score_then_seed);
        candidates.truncate(self.region_count);
        debug!(
            min_size = self.min_size,
            selected = candidates.len(),
            "radius selection"
        );
        candidates
    }

    fn name(&self) -> &'static str {
        "radius"
    }
}

/// The `count` highest-scoring vertices of the later graph, as singletons.
pub fn top_vertices(pair: &GraphPair, scores: &Distortion, count: usize) -> Vec<Region> {
    scores
        .rank_descending(pair.after.ids())
        .into_iter()
        .take(count)
        .map(|id| {
            let vertices: BTreeSet<VertexId> = [id].into_iter().collect();
            Region::induced(id, vertices, &pair.after, 0).with_score(scores.get(id))
        })
        .collect()
}

/// [`top_vertices`] as a [`RegionSelector`].
#[derive(Debug, Clone, Copy)]
pub struct TopVertices {
    count: usize,
}

impl TopVertices {
    /// Select the `count` highest-scoring vertices.
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl RegionSelector for TopVertices {
    fn select(&self, pair: &GraphPair, scores: &Distortion) -> Vec<Region> {
        top_vertices(pair, scores, self.count)
    }

    fn name(&self) -> &'static str {
        "top_vertices"
    }
}

/// The vertex set of `region` with the edges it induces in `graph`.
///
/// Used to show a region found in the later graph as it looked before.
pub fn map_to_graph(region: &Region, graph: &WeightedGraph) -> RegionView {
    region.view_in(graph)
}

/// Serializable choice of selection strategy.
///
/// Counts, sizes and the overlap bound come from the surrounding
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorKind {
    /// [`GreedySelector`].
    #[default]
    Greedy,
    /// [`ExhaustiveSelector`]; `bounded` applies the overlap threshold.
    Exhaustive {
        /// Whether to apply the overlap threshold.
        #[serde(default)]
        bounded: bool,
    },
    /// [`RadiusSelector`] with `region_size` as the minimum size.
    Radius {
        /// Scoring rule.
        #[serde(default)]
        score: RadiusScore,
    },
    /// [`TopVertices`].
    TopVertices,
}

/// Shared numeric settings for [`SelectorKind::build`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionParams {
    /// Regions wanted.
    pub region_count: usize,
    /// Target (or minimum) region size.
    pub region_size: usize,
    /// Maximum covered fraction of a new region.
    pub overlap_threshold: f64,
    /// Greedy exact-size rule.
    pub require_exact_size: bool,
}

impl SelectorKind {
    /// Instantiate the strategy.
    pub fn build(
        &self,
        traversal: TraversalMethod,
        params: SelectionParams,
    ) -> Box<dyn RegionSelector> {
        match *self {
            SelectorKind::Greedy => Box::new(
                GreedySelector::new(params.region_count, params.region_size)
                    .with_traversal(traversal)
                    .with_overlap_threshold(params.overlap_threshold)
                    .with_exact_size(params.require_exact_size),
            ),
            SelectorKind::Exhaustive { bounded } => Box::new(
                ExhaustiveSelector::new(params.region_count, params.region_size)
                    .with_traversal(traversal)
                    .with_overlap_threshold(bounded.then_some(params.overlap_threshold)),
            ),
            SelectorKind::Radius { score } => Box::new(
                RadiusSelector::new(params.region_count, params.region_size).with_score(score),
            ),
            SelectorKind::TopVertices => Box::new(TopVertices::new(params.region_count)),
        }
    }
}
