//! Region quality metrics.
//!
//! For a region `R` with total distortion `S`:
//!
//! | Slot | Metric | Denominator |
//! |------|--------|-------------|
//! | 0 | edges before | `max(1, E1)` |
//! | 1 | edges after | `max(1, E2)` |
//! | 2 | edges min | `min(max(1, E1), max(1, E2))` |
//! | 3 | degree before | `max(1, D1)` |
//! | 4 | degree after | `max(1, D2)` |
//! | 5 | degree min | `min(max(1, D1), max(1, D2))` |
//!
//! `E1`/`E2` count undirected edges with both endpoints in `R` (once each) in
//! the earlier/later graph; `D1`/`D2` sum the full degrees of `R`'s vertices.
//! Flooring every denominator at 1 keeps singleton and edgeless regions
//! finite.
//!
//! [`BestScores`] accumulates, per method, the best column sum seen for each
//! slot across repeated evaluations (a threshold or parameter sweep).

use crate::delta::Distortion;
use crate::graph::{GraphPair, VertexId};
use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::trace;

/// Number of metrics per region.
pub const METRIC_COUNT: usize = 6;

/// Metric names, indexed by slot.
pub const METRIC_NAMES: [&str; METRIC_COUNT] = [
    "edges_before",
    "edges_after",
    "edges_min",
    "degree_before",
    "degree_after",
    "degree_min",
];

/// Six metrics for one region.
pub type MetricVector = [f64; METRIC_COUNT];

/// One [`MetricVector`] per region.
pub type MetricMatrix = Vec<MetricVector>;

/// Sum of each metric column.
pub fn column_sums(matrix: &[MetricVector]) -> MetricVector {
    let mut sums = [0.0; METRIC_COUNT];
    for row in matrix {
        for (acc, x) in sums.iter_mut().zip(row) {
            *acc += x;
        }
    }
    sums
}

/// Computes [`MetricVector`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionEvaluator;

impl RegionEvaluator {
    /// Create a new evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Metrics of one vertex set.
    pub fn metrics(
        &self,
        pair: &GraphPair,
        distortion: &Distortion,
        vertices: &BTreeSet<VertexId>,
    ) -> MetricVector {
        let s = distortion.sum(vertices);
        let e1 = floor_one(pair.before.internal_edge_count(vertices));
        let e2 = floor_one(pair.after.internal_edge_count(vertices));
        let d1 = floor_one(pair.before.degree_sum(vertices));
        let d2 = floor_one(pair.after.degree_sum(vertices));
        [
            s / e1,
            s / e2,
            s / e1.min(e2),
            s / d1,
            s / d2,
            s / d1.min(d2),
        ]
    }

    /// Metric matrix for `regions`, one row per region in order.
    pub fn evaluate(
        &self,
        pair: &GraphPair,
        distortion: &Distortion,
        regions: &[Region],
    ) -> MetricMatrix {
        regions
            .iter()
            .map(|r| {
                let row = self.metrics(pair, distortion, &r.vertices);
                trace!(seed = %r.seed, size = r.size(), ?row, "evaluated region");
                row
            })
            .collect()
    }

    /// Evaluate and fold the result into `best` under `method`.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_into(
        &self,
        pair: &GraphPair,
        distortion: &Distortion,
        regions: &[Region],
        best: &mut BestScores,
        method: MethodId,
        trial: Trial,
        mode: Improvement,
    ) -> MetricMatrix {
        let matrix = self.evaluate(pair, distortion, regions);
        best.record(method, &matrix, trial, mode);
        matrix
    }

    /// Slot 2 alone: `S / min(max(1,E1), max(1,E2))`.
    pub fn edge_normalized(
        &self,
        pair: &GraphPair,
        distortion: &Distortion,
        vertices: &BTreeSet<VertexId>,
    ) -> f64 {
        let e1 = floor_one(pair.before.internal_edge_count(vertices));
        let e2 = floor_one(pair.after.internal_edge_count(vertices));
        distortion.sum(vertices) / e1.min(e2)
    }

    /// Mean distortion over a vertex set (0 for an empty set).
    pub fn mean_distortion(&self, distortion: &Distortion, vertices: &BTreeSet<VertexId>) -> f64 {
        if vertices.is_empty() {
            0.0
        } else {
            distortion.sum(vertices) / vertices.len() as f64
        }
    }
}

fn floor_one(count: usize) -> f64 {
    count.max(1) as f64
}

/// Identifier of a region-selection method within one search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(pub u32);

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method-{}", self.0)
    }
}

/// When a new column sum replaces the recorded best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Improvement {
    /// Replace on `>=`; later settings win ties.
    NonStrict,
    /// Replace on `>`; the first setting to reach a value keeps it.
    Strict,
}

impl Improvement {
    fn beats(self, candidate: f64, best: f64) -> bool {
        match self {
            Improvement::NonStrict => candidate >= best,
            Improvement::Strict => candidate > best,
        }
    }
}

/// The sweep coordinates that produced an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Trial {
    /// Pruning threshold.
    pub threshold: f64,
    /// Secondary parameter (e.g. the rank cutoff `k`), if swept.
    pub parameter: Option<usize>,
}

impl Trial {
    /// Trial at a threshold with no secondary parameter.
    pub fn at(threshold: f64) -> Self {
        Self {
            threshold,
            parameter: None,
        }
    }

    /// Attach a secondary parameter.
    pub fn with_parameter(mut self, parameter: usize) -> Self {
        self.parameter = Some(parameter);
        self
    }
}

/// Best observation for one metric slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BestSlot {
    /// Per-row values of the winning matrix in this slot.
    pub column: Vec<f64>,
    /// Column sum of the winning matrix (0 until something wins).
    pub sum: f64,
    /// Trial that produced it; `None` until something wins.
    pub trial: Option<Trial>,
}

/// Best observations for all six slots of one method.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BestRecord {
    /// One entry per metric slot.
    pub slots: [BestSlot; METRIC_COUNT],
}

impl BestRecord {
    /// Best column sums.
    pub fn sums(&self) -> MetricVector {
        let mut out = [0.0; METRIC_COUNT];
        for (o, slot) in out.iter_mut().zip(&self.slots) {
            *o = slot.sum;
        }
        out
    }
}

/// Per-method best-score accumulator for one search session.
///
/// Keyed by [`MethodId`] so that different strategies never overwrite each
/// other's history. Create one per session and pass it explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestScores {
    records: HashMap<MethodId, BestRecord>,
}

impl BestScores {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a metric matrix into the record for `method`.
    ///
    /// Returns how many slots improved.
    pub fn record(
        &mut self,
        method: MethodId,
        matrix: &[MetricVector],
        trial: Trial,
        mode: Improvement,
    ) -> usize {
        let record = self.records.entry(method).or_default();
        let sums = column_sums(matrix);
        let mut improved = 0;
        for (slot_ix, slot) in record.slots.iter_mut().enumerate() {
            if mode.beats(sums[slot_ix], slot.sum) {
                slot.sum = sums[slot_ix];
                slot.column = matrix.iter().map(|row| row[slot_ix]).collect();
                slot.trial = Some(trial);
                improved += 1;
            }
        }
        improved
    }

    /// Record for `method`, if any evaluation was folded in.
    pub fn get(&self, method: MethodId) -> Option<&BestRecord> {
        self.records.get(&method)
    }

    /// Methods with a record, ascending.
    pub fn methods(&self) -> Vec<MethodId> {
        let mut ids: Vec<MethodId> = self.records.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::delta::DeltaEngine;
    use crate::grow::{Bfs, Traversal, TraversalMethod};
    use proptest::prelude::*;

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
    fn metrics_on_path_region() {
        let pair = path_pair();
        let d = DeltaEngine::new().compute(&pair);
        let r = Bfs::new(2).grow(&pair.after, &d, v(1));
        let m = RegionEvaluator::new().metrics(&pair, &d, &r.vertices);
        // S = 8, E1 = E2 = 1, D1 = D2 = 1 + 2.
        assert_eq!(m[0], 8.0);
        assert_eq!(m[1], 8.0);
        assert_eq!(m[2], 8.0);
        assert!((m[3] - 8.0 / 3.0).abs() < 1e-12);
        assert!((m[5] - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn min_denominator_metrics_dominate() {
        // E1 = 2, E2 = 1; D1 = 4, D2 = 2.
        let pair = GraphPair::from_triples([(1, 2, 1), (2, 3, 1)], [(1, 2, 5)]);
        let d = DeltaEngine::new().compute(&pair);
        let set: BTreeSet<VertexId> = [v(1), v(2), v(3)].into_iter().collect();
        let m = RegionEvaluator::new().metrics(&pair, &d, &set);
        assert_eq!(m, [5.0, 10.0, 10.0, 2.5, 5.0, 5.0]);
        assert!(m[2] > m[0]);
        assert!(m[5] > m[3]);
    }

    #[test]
    fn singleton_denominators_floor_at_one() {
        let pair = GraphPair::from_triples([(1, 2, 3)], [(5, 6, 1)]);
        let d = DeltaEngine::new().compute(&pair);
        let set: BTreeSet<VertexId> = [v(1)].into_iter().collect();
        let m = RegionEvaluator::new().metrics(&pair, &d, &set);
        // Vertex 1 is absent from the later graph: degree 0 there.
        assert_eq!(m, [3.0, 3.0, 3.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn column_sums_add_rows() {
        let m = vec![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [1.0; 6]];
        assert_eq!(column_sums(&m), [2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(column_sums(&[]), [0.0; 6]);
    }

    #[test]
    fn strict_keeps_first_tie_non_strict_takes_last() {
        let rows = vec![[1.0; 6]];
        let mut best = BestScores::new();
        best.record(MethodId(1), &rows, Trial::at(0.0), Improvement::Strict);
        best.record(MethodId(1), &rows, Trial::at(0.3), Improvement::Strict);
        let slot = &best.get(MethodId(1)).unwrap().slots[0];
        assert_eq!(slot.trial.unwrap().threshold, 0.0);

        let mut best = BestScores::new();
        best.record(MethodId(1), &rows, Trial::at(0.0), Improvement::NonStrict);
        best.record(MethodId(1), &rows, Trial::at(0.3), Improvement::NonStrict);
        let slot = &best.get(MethodId(1)).unwrap().slots[0];
        assert_eq!(slot.trial.unwrap().threshold, 0.3);
    }

    #[test]
    fn strict_mode_ignores_all_zero_matrix() {
        let mut best = BestScores::new();
        let improved =
            best.record(MethodId(2), &[[0.0; 6]], Trial::at(0.1), Improvement::Strict);
        assert_eq!(improved, 0);
        assert!(best.get(MethodId(2)).unwrap().slots[0].trial.is_none());
    }

    #[test]
    fn slots_improve_independently() {
        let mut best = BestScores::new();
        best.record(
            MethodId(1),
            &[[5.0, 1.0, 0.0, 0.0, 0.0, 0.0]],
            Trial::at(0.0),
            Improvement::Strict,
        );
        let improved = best.record(
            MethodId(1),
            &[[4.0, 2.0, 0.0, 0.0, 0.0, 0.0]],
            Trial::at(0.1).with_parameter(12),
            Improvement::Strict,
        );
        assert_eq!(improved, 1);
        let rec = best.get(MethodId(1)).unwrap();
        assert_eq!(rec.sums()[0], 5.0);
        assert_eq!(rec.sums()[1], 2.0);
        assert_eq!(rec.slots[1].trial.unwrap().parameter, Some(12));
        assert_eq!(rec.slots[0].column, vec![5.0]);
    }

    #[test]
    fn methods_do_not_clobber_each_other() {
        let mut best = BestScores::new();
        best.record(MethodId(1), &[[9.0; 6]], Trial::at(0.0), Improvement::Strict);
        best.record(MethodId(2), &[[1.0; 6]], Trial::at(0.5), Improvement::Strict);
        assert_eq!(best.get(MethodId(1)).unwrap().sums(), [9.0; 6]);
        assert_eq!(best.get(MethodId(2)).unwrap().sums(), [1.0; 6]);
        assert_eq!(best.methods(), vec![MethodId(1), MethodId(2)]);
    }

    #[test]
    fn evaluate_into_returns_matrix_and_records() {
        let pair = path_pair();
        let d = DeltaEngine::new().compute(&pair);
        let regions: Vec<Region> = [1, 3]
            .iter()
            .map(|&s| Bfs::new(2).grow(&pair.after, &d, v(s)))
            .collect();
        let mut best = BestScores::new();
        let m = RegionEvaluator::new().evaluate_into(
            &pair,
            &d,
            &regions,
            &mut best,
            MethodId(7),
            Trial::at(0.2),
            Improvement::NonStrict,
        );
        assert_eq!(m.len(), 2);
        assert_eq!(best.get(MethodId(7)).unwrap().sums(), column_sums(&m));
    }

    proptest! {
        #[test]
        fn metric_bounds_and_idempotence(
            e1 in proptest::collection::vec((1u32..15, 1u32..15, 1i64..10), 1..40),
            e2 in proptest::collection::vec((1u32..15, 1u32..15, 1i64..10), 1..40),
            size in 1usize..6,
        ) {
            let pair = GraphPair::from_triples(e1, e2);
            let d = DeltaEngine::new().compute(&pair);
            let traversal = TraversalMethod::PriorityBfs.build(size);
            let regions: Vec<Region> = pair
                .after
                .ids()
                .into_iter()
                .map(|s| traversal.grow(&pair.after, &d, s))
                .collect();
            let eval = RegionEvaluator::new();
            let m = eval.evaluate(&pair, &d, &regions);
            prop_assert_eq!(&m, &eval.evaluate(&pair, &d, &regions));
            for row in &m {
                prop_assert!(row.iter().all(|&x| x >= 0.0));
                // A min-denominator never shrinks the quotient.
                prop_assert!(row[2] >= row[0].max(row[1]) - 1e-12);
                prop_assert!(row[5] >= row[3].max(row[4]) - 1e-12);
            }
        }
    }
}
