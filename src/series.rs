//! Chart series derived from the rows of the top-ranked seeds.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::record::Observation;
use crate::stats::{beta_variance, summarize};

/// Aggregated measurement at one x position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: f64,
    pub mean: f64,
    /// Sample standard deviation; absent for single observations.
    pub sd: Option<f64>,
    pub n: usize,
}

impl SeriesPoint {
    pub fn lower(&self) -> f64 {
        self.mean - self.sd.unwrap_or(0.0)
    }

    pub fn upper(&self) -> f64 {
        self.mean + self.sd.unwrap_or(0.0)
    }
}

/// One line of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySeries {
    /// Legend label.
    pub label: String,
    /// Points sorted by x.
    pub points: Vec<SeriesPoint>,
}

/// Human readable legend label for a raw strategy name.
pub fn legend_label(strategy: &str, cfg: &Config) -> String {
    if strategy == cfg.rank.comparison {
        cfg.report.comparison_label.clone()
    } else if strategy == cfg.rank.baseline {
        cfg.report.baseline_label.clone()
    } else {
        strategy.to_string()
    }
}

/// Every row (all strategies, all `A_t`) belonging to one of `seeds`.
pub fn select_seeds<'a>(observations: &'a [Observation], seeds: &[i64]) -> Vec<&'a Observation> {
    observations
        .iter()
        .filter(|o| seeds.contains(&o.seed_idx))
        .collect()
}

/// Legend labels in order of first appearance.
pub fn palette_order(rows: &[&Observation], cfg: &Config) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for row in rows {
        let label = legend_label(&row.strategy, cfg);
        if !order.contains(&label) {
            order.push(label);
        }
    }
    order
}

/// Group `(label, x, mse)` triples into series ordered by first label appearance.
fn group_series<I>(triples: I) -> Vec<StrategySeries>
where
    I: IntoIterator<Item = (String, f64, f64)>,
{
    let mut labels: Vec<String> = Vec::new();
    // Keyed by the bit pattern so equal floats share a bucket; ordered by x below.
    let mut buckets: Vec<BTreeMap<u64, (f64, Vec<f64>)>> = Vec::new();

    for (label, x, mse) in triples {
        let idx = match labels.iter().position(|l| *l == label) {
            Some(i) => i,
            None => {
                labels.push(label);
                buckets.push(BTreeMap::new());
                labels.len() - 1
            }
        };
        buckets[idx]
            .entry(x.to_bits())
            .or_insert_with(|| (x, Vec::new()))
            .1
            .push(mse);
    }

    labels
        .into_iter()
        .zip(buckets)
        .map(|(label, bucket)| {
            let mut points: Vec<SeriesPoint> = bucket
                .into_values()
                .filter_map(|(x, values)| {
                    let s = summarize(&values)?;
                    Some(SeriesPoint {
                        x,
                        mean: s.mean,
                        sd: s.sd,
                        n: s.n,
                    })
                })
                .collect();
            points.sort_by(|a, b| a.x.total_cmp(&b.x));
            StrategySeries { label, points }
        })
        .filter(|s| !s.points.is_empty())
        .collect()
}

/// Error per query count at the control value.
pub fn trajectory_series(rows: &[&Observation], cfg: &Config) -> Vec<StrategySeries> {
    group_series(rows.iter().filter(|o| cfg.rank.matches_control(o.a_t)).filter_map(|o| {
        Some((
            legend_label(&o.strategy, cfg),
            o.num_queries as f64,
            o.valid_mse()?,
        ))
    }))
}

/// Error at the final query count against the Beta variance of the latent state.
pub fn robustness_series(rows: &[&Observation], cfg: &Config) -> Vec<StrategySeries> {
    group_series(
        rows.iter()
            .filter(|o| o.num_queries == cfg.report.final_query)
            .filter_map(|o| {
                Some((
                    legend_label(&o.strategy, cfg),
                    beta_variance(o.a_t, o.b_t),
                    o.valid_mse()?,
                ))
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(seed: i64, nq: i64, strategy: &str, a_t: f64, b_t: f64, mse: f64) -> Observation {
        Observation {
            seed_idx: seed,
            num_queries: nq,
            strategy: strategy.to_string(),
            a_t,
            b_t,
            mse: Some(mse),
        }
    }

    #[test]
    fn labels_follow_config() {
        let cfg = Config::default();
        assert_eq!(legend_label("PQAL", &cfg), "CME uncertainty");
        assert_eq!(legend_label("PQAL_random", &cfg), "Random");
        assert_eq!(legend_label("Z_Uncertainty", &cfg), "Z_Uncertainty");
    }

    #[test]
    fn selection_keeps_all_rows_of_seed() {
        let rows = vec![
            obs(1, 5, "PQAL", 2.0, 2.0, 0.1),
            obs(1, 5, "Other", 7.0, 2.0, 0.2),
            obs(2, 5, "PQAL", 2.0, 2.0, 0.3),
        ];
        assert_eq!(select_seeds(&rows, &[1]).len(), 2);
        assert!(select_seeds(&rows, &[]).is_empty());
    }

    #[test]
    fn trajectory_aggregates_over_seeds() {
        let cfg = Config::default();
        let rows = vec![
            obs(1, 10, "PQAL", 2.0, 2.0, 1.0),
            obs(2, 10, "PQAL", 2.0, 2.0, 3.0),
            obs(1, 5, "PQAL", 2.0, 2.0, 4.0),
            obs(1, 5, "PQAL", 3.0, 2.0, 99.0),
            obs(1, 5, "PQAL_random", 2.0, 2.0, 5.0),
        ];
        let refs: Vec<&Observation> = rows.iter().collect();
        let series = trajectory_series(&refs, &cfg);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "CME uncertainty");
        let xs: Vec<f64> = series[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![5.0, 10.0]);
        let p = series[0].points[1];
        assert_eq!(p.mean, 2.0);
        assert_eq!(p.n, 2);
        assert!((p.sd.unwrap() - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(series[0].points[0].sd, None);
        assert_eq!(series[1].label, "Random");
    }

    #[test]
    fn robustness_uses_final_query_and_variance() {
        let cfg = Config::default();
        let rows = vec![
            obs(1, 45, "PQAL", 2.0, 2.0, 0.2),
            obs(1, 45, "PQAL", 1.0, 1.0, 0.4),
            obs(1, 40, "PQAL", 2.0, 2.0, 9.0),
        ];
        let refs: Vec<&Observation> = rows.iter().collect();
        let series = robustness_series(&refs, &cfg);
        assert_eq!(series.len(), 1);
        let pts = &series[0].points;
        assert_eq!(pts.len(), 2);
        assert!((pts[0].x - 0.05).abs() < 1e-12);
        assert!((pts[1].x - 1.0 / 12.0).abs() < 1e-12);
        assert_eq!(pts[0].mean, 0.2);
    }

    #[test]
    fn palette_order_is_first_appearance() {
        let cfg = Config::default();
        let rows = vec![
            obs(1, 5, "PQAL_random", 2.0, 2.0, 0.1),
            obs(1, 5, "Other", 2.0, 2.0, 0.1),
            obs(1, 5, "PQAL", 2.0, 2.0, 0.1),
            obs(1, 6, "PQAL_random", 2.0, 2.0, 0.1),
        ];
        let refs: Vec<&Observation> = rows.iter().collect();
        assert_eq!(
            palette_order(&refs, &cfg),
            vec!["Random", "Other", "CME uncertainty"]
        );
    }
}
