//! Per-seed gap between two acquisition strategies and top-K seed selection.
//!
//! Rows are filtered to the two configured strategies at the control `A_t`,
//! pivoted to one cell per `(seed_idx, num_queries)`, and only cells holding
//! both strategies survive. The gap `baseline - comparison` is averaged per
//! seed and seeds are ranked by that mean, largest first. Ties keep
//! ascending `seed_idx` order.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::RankConfig;
use crate::record::Observation;
use crate::stats::RunningMean;

/// One surviving pivot cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedGap {
    pub seed_idx: i64,
    pub num_queries: i64,
    pub baseline_mse: f64,
    pub comparison_mse: f64,
    /// `baseline_mse - comparison_mse`.
    pub gap: f64,
}

/// Mean gap of one seed over every query count it has a pair for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedGap {
    pub seed_idx: i64,
    /// NaN when every gap of the seed was NaN.
    pub mean_gap: f64,
    /// Number of `(seed_idx, num_queries)` pairs with a non-NaN gap.
    pub pairs: usize,
}

/// Descending order with NaN gaps last.
fn by_gap_desc(a: &SeedGap, b: &SeedGap) -> Ordering {
    match (a.mean_gap.is_nan(), b.mean_gap.is_nan()) {
        (false, false) => b.mean_gap.total_cmp(&a.mean_gap),
        (nan_a, nan_b) => nan_a.cmp(&nan_b),
    }
}

/// Non-fatal outcome worth reporting to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankCondition {
    /// No pair had both strategies present.
    NoData,
    /// Fewer ranked seeds than requested.
    Shortfall { requested: usize, available: usize },
}

/// Result of a ranking run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedRanking {
    /// Every seed with at least one pair, sorted by descending mean gap.
    pub gaps: Vec<SeedGap>,
    /// The first `min(top_k, gaps.len())` seed ids of `gaps`.
    pub top: Vec<i64>,
    pub requested: usize,
    /// `None` when `top` holds exactly `requested` seeds.
    pub condition: Option<RankCondition>,
}

impl SeedRanking {
    pub fn new(gaps: Vec<SeedGap>, requested: usize) -> Self {
        let top = gaps.iter().take(requested).map(|g| g.seed_idx).collect();
        let condition = if gaps.is_empty() {
            Some(RankCondition::NoData)
        } else if gaps.len() < requested {
            Some(RankCondition::Shortfall {
                requested,
                available: gaps.len(),
            })
        } else {
            None
        };
        Self {
            gaps,
            top,
            requested,
            condition,
        }
    }

    pub fn condition(&self) -> Option<RankCondition> {
        self.condition
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }
}

#[derive(Default)]
struct Cell {
    baseline: RunningMean,
    comparison: RunningMean,
}

/// Pivot the table and return the complete pairs in `(seed_idx, num_queries)` order.
pub fn paired_gaps(observations: &[Observation], cfg: &RankConfig) -> Vec<PairedGap> {
    let mut cells: BTreeMap<(i64, i64), Cell> = BTreeMap::new();

    for obs in observations {
        if !cfg.matches_control(obs.a_t) {
            continue;
        }
        let is_baseline = obs.strategy == cfg.baseline;
        if !is_baseline && obs.strategy != cfg.comparison {
            continue;
        }
        let Some(mse) = obs.valid_mse() else {
            continue;
        };
        let cell = cells.entry((obs.seed_idx, obs.num_queries)).or_default();
        let slot = if is_baseline {
            &mut cell.baseline
        } else {
            &mut cell.comparison
        };
        slot.push(mse);
        if slot.count() > 1 {
            debug!(
                seed_idx = obs.seed_idx,
                num_queries = obs.num_queries,
                strategy = %obs.strategy,
                "duplicate pivot cell, averaging"
            );
        }
    }

    cells
        .into_iter()
        .filter_map(|((seed_idx, num_queries), cell)| {
            match (cell.baseline.value(), cell.comparison.value()) {
                (Some(baseline_mse), Some(comparison_mse)) => Some(PairedGap {
                    seed_idx,
                    num_queries,
                    baseline_mse,
                    comparison_mse,
                    gap: baseline_mse - comparison_mse,
                }),
                _ => {
                    debug!(seed_idx, num_queries, "dropping incomplete pair");
                    None
                }
            }
        })
        .collect()
}

/// Rank seeds by mean gap and keep the best `cfg.top_k`.
pub fn rank_seeds(observations: &[Observation], cfg: &RankConfig) -> SeedRanking {
    let mut per_seed: BTreeMap<i64, RunningMean> = BTreeMap::new();
    for pair in paired_gaps(observations, cfg) {
        let mean = per_seed.entry(pair.seed_idx).or_default();
        // inf - inf; the seed stays ranked but the gap is not averaged.
        if !pair.gap.is_nan() {
            mean.push(pair.gap);
        }
    }

    let mut gaps: Vec<SeedGap> = per_seed
        .into_iter()
        .map(|(seed_idx, m)| SeedGap {
            seed_idx,
            mean_gap: m.value().unwrap_or(f64::NAN),
            pairs: m.count(),
        })
        .collect();
    // Stable: equal gaps stay in ascending seed order.
    gaps.sort_by(by_gap_desc);

    SeedRanking::new(gaps, cfg.top_k)
}
