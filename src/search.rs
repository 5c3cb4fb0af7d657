//! Parameter sweeps over pruning threshold and ranking cutoff.
//!
//! Two sweeps share one [`SearchConfig`]:
//!
//! - [`ParameterSearch::sweep_thresholds`] computes distortion once, then at
//!   each step selects and evaluates regions with every configured method
//!   before pruning a further `step` fraction of the original vertex count.
//!   A setting replaces the recorded best only when strictly better.
//! - [`ParameterSearch::sweep_ranking`] asks a [`RankingSource`] for a flat
//!   multi-slice ranking at each `(threshold, k)` pair, selects one batch of
//!   regions per slice, evaluates them against the engine's own distortion
//!   and sums over slices. Later settings win ties.
//!
//! Both return a [`SearchReport`] together with the [`BestScores`]
//! accumulator, which the caller owns.
//!
//! ```
//! use graphdelta::{GraphPair, ParameterSearch, SearchConfig, SearchMethod};
//!
//! let pair = GraphPair::from_triples(
//!     [(1, 2, 5), (2, 3, 5), (3, 4, 5)],
//!     [(1, 2, 9), (2, 3, 5), (3, 4, 1)],
//! );
//! let config = SearchConfig::default().with_region_size(2).with_steps(2);
//! let (report, _best) = ParameterSearch::new(config)
//!     .sweep_thresholds(&pair, &[SearchMethod::default()])
//!     .unwrap();
//! assert_eq!(report.methods.len(), 1);
//! ```

use crate::delta::{DeltaEngine, Distortion};
use crate::error::{Error, Result};
use crate::evaluate::{
    column_sums, BestRecord, BestScores, Improvement, MethodId, MetricVector, RegionEvaluator,
    Trial,
};
use crate::graph::GraphPair;
use crate::grow::TraversalMethod;
use crate::prune::ThresholdPruner;
use crate::select::{RegionSelector, SelectionParams, SelectorKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Inclusive range of rank cutoffs `k`, visited every `stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KRange {
    /// First cutoff.
    pub start: usize,
    /// Last cutoff (further capped at the vertex count).
    pub end: usize,
    /// Distance between cutoffs.
    pub stride: usize,
}

impl KRange {
    /// Cutoffs to try for a graph of `vertex_count` vertices.
    pub fn values(&self, vertex_count: usize) -> impl Iterator<Item = usize> {
        (self.start..=self.end.min(vertex_count)).step_by(self.stride.max(1))
    }
}

impl Default for KRange {
    fn default() -> Self {
        Self {
            start: 12,
            end: 400,
            stride: 2,
        }
    }
}

/// Sweep settings.
///
/// Every field has a default, so a TOML document only needs the keys it
/// changes:
///
/// ```toml
/// step = 0.05
/// steps = 20
/// region_size = 8
///
/// [k_range]
/// start = 12
/// end = 100
/// stride = 4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Fraction of the original vertex count pruned per step.
    pub step: f64,
    /// Number of thresholds tried (`0, step, 2*step, ...`).
    pub steps: usize,
    /// Regions selected per evaluation.
    pub region_count: usize,
    /// Target region size.
    pub region_size: usize,
    /// Maximum covered fraction of a newly selected region.
    pub overlap_threshold: f64,
    /// Greedy exact-size rule.
    pub require_exact_size: bool,
    /// Rank cutoffs for the ranking sweep.
    pub k_range: KRange,
    /// Ranking slices per cutoff.
    pub slices: usize,
    /// Leading regions of each slice that are evaluated.
    pub regions_per_slice: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            step: 0.05,
            steps: 10,
            region_count: 10,
            region_size: 5,
            overlap_threshold: 0.0,
            require_exact_size: true,
            k_range: KRange::default(),
            slices: 10,
            regions_per_slice: 1,
        }
    }
}

impl SearchConfig {
    /// Create with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document and validate it.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SearchConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the pruning step.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Set the number of thresholds.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Set the number of regions per evaluation.
    pub fn with_region_count(mut self, count: usize) -> Self {
        self.region_count = count;
        self
    }

    /// Set the target region size.
    pub fn with_region_size(mut self, size: usize) -> Self {
        self.region_size = size;
        self
    }

    /// Set the overlap threshold.
    pub fn with_overlap_threshold(mut self, threshold: f64) -> Self {
        self.overlap_threshold = threshold;
        self
    }

    /// Toggle the greedy exact-size rule.
    pub fn with_exact_size(mut self, exact: bool) -> Self {
        self.require_exact_size = exact;
        self
    }

    /// Set the rank cutoffs.
    pub fn with_k_range(mut self, start: usize, end: usize, stride: usize) -> Self {
        self.k_range = KRange { start, end, stride };
        self
    }

    /// Set the number of ranking slices.
    pub fn with_slices(mut self, slices: usize) -> Self {
        self.slices = slices;
        self
    }

    /// Set how many leading regions of each slice are evaluated.
    pub fn with_regions_per_slice(mut self, count: usize) -> Self {
        self.regions_per_slice = count;
        self
    }

    /// Reject settings that cannot describe a sweep.
    pub fn validate(&self) -> Result<()> {
        if !self.step.is_finite() || self.step < 0.0 {
            return Err(Error::invalid(
                "step",
                format!("must be finite and >= 0, got {}", self.step),
            ));
        }
        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return Err(Error::invalid(
                "overlap_threshold",
                format!("must be in [0, 1], got {}", self.overlap_threshold),
            ));
        }
        if self.region_size == 0 {
            return Err(Error::invalid("region_size", "must be at least 1"));
        }
        if self.k_range.stride == 0 {
            return Err(Error::invalid("k_range.stride", "must be at least 1"));
        }
        if self.slices == 0 {
            return Err(Error::invalid("slices", "must be at least 1"));
        }
        Ok(())
    }

    /// Selector settings derived from this config.
    pub fn selection_params(&self) -> SelectionParams {
        SelectionParams {
            region_count: self.region_count,
            region_size: self.region_size,
            overlap_threshold: self.overlap_threshold,
            require_exact_size: self.require_exact_size,
        }
    }

    fn threshold(&self, i: usize) -> f64 {
        i as f64 * self.step
    }
}

/// One region-selection method under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMethod {
    /// Key in the [`BestScores`] accumulator.
    pub id: MethodId,
    /// Selection strategy.
    pub selector: SelectorKind,
    /// Growth policy.
    pub traversal: TraversalMethod,
}

impl SearchMethod {
    /// Method `id` with the given strategy and policy.
    pub fn new(id: u32, selector: SelectorKind, traversal: TraversalMethod) -> Self {
        Self {
            id: MethodId(id),
            selector,
            traversal,
        }
    }

    fn build(&self, params: SelectionParams) -> Box<dyn RegionSelector> {
        self.selector.build(self.traversal, params)
    }

    fn label(&self, selector: &dyn RegionSelector) -> String {
        format!("{}/{}", selector.name(), self.traversal.build(1).name())
    }
}

impl Default for SearchMethod {
    fn default() -> Self {
        Self::new(1, SelectorKind::Greedy, TraversalMethod::Bfs)
    }
}

/// Supplies flat multi-slice rankings for the ranking sweep.
///
/// The returned array is laid out as `ranking[(slice - 1) * n + (id - 1)]`
/// for `n` = the largest vertex id. An empty array or an error skips the
/// `(k, threshold)` combination.
pub trait RankingSource {
    /// Ranking for cutoff `k` at pruning `threshold`.
    fn ranking(&mut self, k: usize, threshold: f64) -> Result<Vec<f64>>;
}

impl<F> RankingSource for F
where
    F: FnMut(usize, f64) -> Result<Vec<f64>>,
{
    fn ranking(&mut self, k: usize, threshold: f64) -> Result<Vec<f64>> {
        self(k, threshold)
    }
}

/// Which sweep produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    /// [`ParameterSearch::sweep_thresholds`].
    Threshold,
    /// [`ParameterSearch::sweep_ranking`].
    Ranking,
}

/// Outcome for one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodReport {
    /// Method key.
    pub id: MethodId,
    /// `selector/traversal`.
    pub label: String,
    /// Settings that produced at least one region and were evaluated.
    pub evaluations: usize,
    /// Settings skipped for lack of regions or ranking data.
    pub skipped: usize,
    /// Best record, if anything was evaluated.
    pub best: Option<BestRecord>,
}

/// Summary of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Sweep that produced the report.
    pub sweep: SweepKind,
    /// Per-method outcome, in the order the methods were given.
    pub methods: Vec<MethodReport>,
}

impl SearchReport {
    /// Pretty JSON rendering.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Outcome for `id`.
    pub fn method(&self, id: MethodId) -> Option<&MethodReport> {
        self.methods.iter().find(|m| m.id == id)
    }
}

/// Runs sweeps under one [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct ParameterSearch {
    config: SearchConfig,
}

impl ParameterSearch {
    /// Create a search with the given settings.
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Settings in use.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Threshold sweep with incremental pruning.
    ///
    /// Thresholds are `i * step` for `i` in `0..steps`. At each threshold
    /// every method selects and evaluates on the current graphs; then
    /// another `floor(step * n)` lowest-distortion vertices are pruned, `n`
    /// being the vertex count before the first prune.
    pub fn sweep_thresholds(
        &self,
        pair: &GraphPair,
        methods: &[SearchMethod],
    ) -> Result<(SearchReport, BestScores)> {
        self.config.validate()?;
        let distortion = DeltaEngine::new().compute_checked(pair)?;
        let original_count = pair.vertex_union().len();
        let params = self.config.selection_params();
        let evaluator = RegionEvaluator::new();
        let pruner = ThresholdPruner::new();
        let selectors: Vec<Box<dyn RegionSelector>> =
            methods.iter().map(|m| m.build(params)).collect();

        let mut best = BestScores::new();
        let mut tallies = vec![(0usize, 0usize); methods.len()];
        let mut current = pair.clone();

        for i in 0..self.config.steps {
            let threshold = self.config.threshold(i);
            for ((method, selector), tally) in
                methods.iter().zip(&selectors).zip(tallies.iter_mut())
            {
                let regions = selector.select(&current, &distortion);
                if regions.is_empty() {
                    debug!(method = %method.id, threshold, "no regions; skipping");
                    tally.1 += 1;
                    continue;
                }
                evaluator.evaluate_into(
                    &current,
                    &distortion,
                    &regions,
                    &mut best,
                    method.id,
                    Trial::at(threshold),
                    Improvement::Strict,
                );
                tally.0 += 1;
            }
            pruner.prune(&mut current, &distortion, self.config.step, original_count);
        }

        let report = Self::report(SweepKind::Threshold, methods, &selectors, &tallies, &best);
        info!(
            methods = methods.len(),
            steps = self.config.steps,
            vertices = original_count,
            "threshold sweep finished"
        );
        Ok((report, best))
    }

    /// Ranking sweep over `(threshold, k)`.
    ///
    /// For every threshold `i * step` (`i` in `0..steps`) the pair is copied
    /// and pruned once with that cumulative fraction. For every `k` in the
    /// configured range the source's ranking is split into `slices` score
    /// maps; each slice selects regions on the pruned pair, and the first
    /// `regions_per_slice` of them are evaluated with the engine's
    /// distortion. The per-slice metric sums form the rows recorded under
    /// `method.id`.
    ///
    /// A combination is skipped when the source fails or returns nothing,
    /// when a slice runs past the end of the ranking, or when a slice
    /// selects no region.
    pub fn sweep_ranking<R>(
        &self,
        pair: &GraphPair,
        source: &mut R,
        method: &SearchMethod,
    ) -> Result<(SearchReport, BestScores)>
    where
        R: RankingSource + ?Sized,
    {
        self.config.validate()?;
        let distortion = DeltaEngine::new().compute_checked(pair)?;
        let original_count = pair.vertex_union().len();
        let span = pair.id_span();
        let selector = method.build(self.config.selection_params());

        let mut best = BestScores::new();
        let mut evaluations = 0usize;
        let mut skipped = 0usize;

        for i in 0..self.config.steps {
            let threshold = self.config.threshold(i);
            let mut pruned = pair.clone();
            ThresholdPruner::new().prune(&mut pruned, &distortion, threshold, original_count);

            for k in self.config.k_range.values(original_count) {
                let ranking = match source.ranking(k, threshold) {
                    Ok(r) if !r.is_empty() => r,
                    Ok(_) => {
                        debug!(k, threshold, "empty ranking; skipping");
                        skipped += 1;
                        continue;
                    }
                    Err(err) => {
                        debug!(k, threshold, %err, "ranking failed; skipping");
                        skipped += 1;
                        continue;
                    }
                };
                match self.slice_rows(&pruned, &distortion, &ranking, span, selector.as_ref()) {
                    Some(rows) => {
                        best.record(
                            method.id,
                            &rows,
                            Trial::at(threshold).with_parameter(k),
                            Improvement::NonStrict,
                        );
                        evaluations += 1;
                    }
                    None => skipped += 1,
                }
            }
        }

        let report = SearchReport {
            sweep: SweepKind::Ranking,
            methods: vec![MethodReport {
                id: method.id,
                label: method.label(selector.as_ref()),
                evaluations,
                skipped,
                best: best.get(method.id).cloned(),
            }],
        };
        info!(evaluations, skipped, "ranking sweep finished");
        Ok((report, best))
    }

    /// Per-slice metric sums, or `None` if the combination is unusable.
    fn slice_rows(
        &self,
        pair: &GraphPair,
        distortion: &Distortion,
        ranking: &[f64],
        span: usize,
        selector: &dyn RegionSelector,
    ) -> Option<Vec<MetricVector>> {
        let evaluator = RegionEvaluator::new();
        let mut rows = Vec::with_capacity(self.config.slices);
        for slice in 1..=self.config.slices {
            let Some(scores) = Distortion::from_ranking_slice(ranking, slice, span) else {
                debug!(slice, len = ranking.len(), "slice out of range; skipping");
                return None;
            };
            let regions = selector.select(pair, &scores);
            let take = self.config.regions_per_slice.min(regions.len());
            if take == 0 {
                debug!(slice, "slice selected no region; skipping");
                return None;
            }
            let matrix = evaluator.evaluate(pair, distortion, &regions[..take]);
            rows.push(column_sums(&matrix));
        }
        Some(rows)
    }

    fn report(
        sweep: SweepKind,
        methods: &[SearchMethod],
        selectors: &[Box<dyn RegionSelector>],
        tallies: &[(usize, usize)],
        best: &BestScores,
    ) -> SearchReport {
        let methods = methods
            .iter()
            .zip(selectors)
            .zip(tallies)
            .map(|((m, s), &(evaluations, skipped))| MethodReport {
                id: m.id,
                label: m.label(s.as_ref()),
                evaluations,
                skipped,
                best: best.get(m.id).cloned(),
            })
            .collect();
        SearchReport { sweep, methods }
    }
}
