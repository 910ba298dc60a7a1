//! Seed ranking and chart generation for active-learning ablation results.
//!
//! The results table holds one row per `(seed_idx, num_queries, strategy)`
//! with the latent Beta shape parameters `A_t`, `B_t` and the resulting
//! `mse`. [`rank_seeds`] measures, per seed, how far a comparison strategy
//! beats a baseline at a fixed `A_t`, and keeps the best seeds; the
//! [`report`] module turns those seeds into a trajectory chart and a
//! robustness chart.

pub mod config;
mod error;
pub mod io_utils;
pub mod plot;
pub mod rank;
pub mod record;
pub mod report;
pub mod series;
pub mod stats;

pub use config::{Config, ControlMatch, RankConfig, ReportConfig, Variant};
pub use error::SeedGapError;
pub use rank::{paired_gaps, rank_seeds, PairedGap, RankCondition, SeedGap, SeedRanking};
pub use record::{load_observations, read_observations, resolve_input, Observation};
pub use report::{generate_report, run_report, write_gaps_csv, ReportSummary};
pub use stats::beta_variance;
