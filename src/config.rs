use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::SeedGapError;

/// How the `A_t` column is compared against the configured control value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ControlMatch {
    /// Bitwise float equality, as the recorded analysis did it.
    Exact,
    /// `|A_t - control| <= epsilon`.
    Tolerance { epsilon: f64 },
}

/// Parameters of the gap ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    /// Strategy whose error is the reference (gap = baseline - comparison).
    pub baseline: String,
    /// Strategy expected to beat the baseline.
    pub comparison: String,
    /// Fixed `A_t` value the gap is measured at.
    pub control_value: f64,
    pub control_match: ControlMatch,
    /// Number of seeds to keep.
    pub top_k: usize,
}

impl RankConfig {
    /// Whether an `A_t` value counts as the control value.
    pub fn matches_control(&self, a_t: f64) -> bool {
        match self.control_match {
            ControlMatch::Exact => a_t == self.control_value,
            ControlMatch::Tolerance { epsilon } => (a_t - self.control_value).abs() <= epsilon,
        }
    }
}

/// Everything the report stage needs besides the ranking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Results table tried first.
    pub input: PathBuf,
    /// Results table tried when `input` does not exist.
    pub fallback_input: PathBuf,
    pub out_dir: PathBuf,
    pub trajectory_file: String,
    pub robustness_file: String,
    /// Query count whose rows feed the robustness chart.
    pub final_query: i64,
    /// Upper x limit of the trajectory chart.
    pub max_queries: i64,
    /// Legend label for the baseline strategy.
    pub baseline_label: String,
    /// Legend label for the comparison strategy.
    pub comparison_label: String,
    pub dpi: u32,
    /// Explicit y tick values for the trajectory chart.
    #[serde(default)]
    pub trajectory_y_ticks: Option<Vec<f64>>,
}

impl ReportConfig {
    pub fn trajectory_path(&self) -> PathBuf {
        self.out_dir.join(&self.trajectory_file)
    }

    pub fn robustness_path(&self) -> PathBuf {
        self.out_dir.join(&self.robustness_file)
    }
}

/// The two recorded analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Discrete shift ablation, `PQAL` vs `PQAL_random`.
    Discrete,
    /// Continuous shift ablation, `CME_Uncertainty` vs `Random`.
    Continuous,
}

impl std::str::FromStr for Variant {
    type Err = SeedGapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discrete" => Ok(Variant::Discrete),
            "continuous" | "cont" => Ok(Variant::Continuous),
            other => Err(SeedGapError::Config(format!("unknown variant '{other}'"))),
        }
    }
}

/// Runtime configuration for ranking and report generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub rank: RankConfig,
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::preset(Variant::Discrete)
    }
}

impl Config {
    /// Configuration reproducing one of the recorded analyses.
    pub fn preset(variant: Variant) -> Self {
        let (baseline, comparison, input, suffix, ticks) = match variant {
            Variant::Discrete => (
                "PQAL_random",
                "PQAL",
                "outputs/final_ablation_all_seeds_discrete.csv",
                "",
                None,
            ),
            Variant::Continuous => (
                "Random",
                "CME_Uncertainty",
                "outputs/final_ablation_all_seeds_Cont.csv",
                "_Cont",
                Some(vec![0.2, 0.3, 0.4, 0.5, 0.7, 1.0, 1.5, 2.0, 3.0]),
            ),
        };
        Self {
            rank: RankConfig {
                baseline: baseline.to_string(),
                comparison: comparison.to_string(),
                control_value: 2.0,
                control_match: ControlMatch::Exact,
                top_k: 4,
            },
            report: ReportConfig {
                input: PathBuf::from(input),
                fallback_input: PathBuf::from("final_ablation_all_seeds.csv"),
                out_dir: PathBuf::from("outputs"),
                trajectory_file: format!("top_4_seeds_trajectory_final{suffix}.png"),
                robustness_file: format!("top_4_seeds_shift_robustness_final{suffix}.png"),
                final_query: 45,
                max_queries: 45,
                baseline_label: "Random".to_string(),
                comparison_label: "CME uncertainty".to_string(),
                dpi: 300,
                trajectory_y_ticks: ticks,
            },
        }
    }

    /// Load a full configuration document from JSON.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, SeedGapError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SeedGapError> {
        let rank = &self.rank;
        if rank.top_k == 0 {
            return Err(SeedGapError::Config("top_k must be at least 1".into()));
        }
        if rank.baseline == rank.comparison {
            return Err(SeedGapError::Config(format!(
                "baseline and comparison are both '{}'",
                rank.baseline
            )));
        }
        if !rank.control_value.is_finite() {
            return Err(SeedGapError::Config("control_value must be finite".into()));
        }
        if let ControlMatch::Tolerance { epsilon } = rank.control_match {
            if !epsilon.is_finite() || epsilon < 0.0 {
                return Err(SeedGapError::Config(format!(
                    "tolerance {epsilon} must be a finite non-negative number"
                )));
            }
        }
        if self.report.dpi == 0 {
            return Err(SeedGapError::Config("dpi must be positive".into()));
        }
        if self.report.max_queries <= 0 {
            return Err(SeedGapError::Config("max_queries must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        Config::preset(Variant::Discrete).validate().unwrap();
        Config::preset(Variant::Continuous).validate().unwrap();
    }

    #[test]
    fn continuous_preset_names() {
        let cfg = Config::preset(Variant::Continuous);
        assert_eq!(cfg.rank.baseline, "Random");
        assert_eq!(cfg.rank.comparison, "CME_Uncertainty");
        assert_eq!(
            cfg.report.trajectory_path(),
            PathBuf::from("outputs/top_4_seeds_trajectory_final_Cont.png")
        );
        assert!(cfg.report.trajectory_y_ticks.is_some());
    }

    #[test]
    fn exact_match_is_bitwise() {
        let cfg = Config::default();
        assert!(cfg.rank.matches_control(2.0));
        assert!(!cfg.rank.matches_control(2.0 + 1e-12));
    }

    #[test]
    fn tolerance_match() {
        let mut cfg = Config::default();
        cfg.rank.control_match = ControlMatch::Tolerance { epsilon: 1e-9 };
        assert!(cfg.rank.matches_control(2.0 + 1e-12));
        assert!(!cfg.rank.matches_control(2.1));
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.rank.top_k = 0;
        assert!(matches!(cfg.validate(), Err(SeedGapError::Config(_))));

        let mut cfg = Config::default();
        cfg.rank.comparison = cfg.rank.baseline.clone();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.rank.control_match = ControlMatch::Tolerance { epsilon: -1.0 };
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.report.dpi = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_roundtrip_keeps_control_mode() {
        let mut cfg = Config::preset(Variant::Continuous);
        cfg.rank.control_match = ControlMatch::Tolerance { epsilon: 0.5 };
        let text = serde_json::to_string(&cfg).unwrap();
        assert!(text.contains("\"mode\":\"tolerance\""));
        let back: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(back.rank, cfg.rank);
        assert_eq!(back.report.out_dir, cfg.report.out_dir);
    }

    #[test]
    fn variant_from_str() {
        assert_eq!("discrete".parse::<Variant>().unwrap(), Variant::Discrete);
        assert_eq!("cont".parse::<Variant>().unwrap(), Variant::Continuous);
        assert!("other".parse::<Variant>().is_err());
    }
}
