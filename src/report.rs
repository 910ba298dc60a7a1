//! Read, rank, select, plot and save: the only place with filesystem side effects.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::plot::{render_robustness, render_trajectory, Palette};
use crate::rank::{rank_seeds, RankCondition, SeedRanking};
use crate::record::{load_observations, resolve_input, Observation};
use crate::series::{palette_order, robustness_series, select_seeds, trajectory_series};
use crate::SeedGapError;

/// What a report run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub input: PathBuf,
    pub ranking: SeedRanking,
    /// Rows belonging to the top seeds.
    pub selected_rows: usize,
    /// Written charts, last one last.
    pub artifacts: Vec<PathBuf>,
}

/// Log ranking conditions; `NoData` is fatal for a report.
pub fn check_ranking(ranking: &SeedRanking) -> Result<(), SeedGapError> {
    match ranking.condition() {
        Some(RankCondition::NoData) => {
            warn!(
                requested = ranking.requested,
                "no seed has both strategies at the control value"
            );
            Err(SeedGapError::NoData(
                "no (seed_idx, num_queries) pair has both strategies at the control value".into(),
            ))
        }
        Some(RankCondition::Shortfall {
            requested,
            available,
        }) => {
            warn!(requested, available, "fewer ranked seeds than requested");
            Ok(())
        }
        None => Ok(()),
    }
}

/// Rank an already loaded table and render both charts into `cfg.report.out_dir`.
pub fn render_report(
    observations: &[Observation],
    cfg: &Config,
) -> Result<(SeedRanking, usize, Vec<PathBuf>), SeedGapError> {
    let ranking = rank_seeds(observations, &cfg.rank);
    check_ranking(&ranking)?;
    info!(top = ?ranking.top, "ranked seeds by gap");

    let rows = select_seeds(observations, &ranking.top);
    let palette = Palette::tab10(&palette_order(&rows, cfg));

    std::fs::create_dir_all(&cfg.report.out_dir)?;

    let trajectory = cfg.report.trajectory_path();
    render_trajectory(&trajectory, &trajectory_series(&rows, cfg), &palette, &cfg.report)?;
    info!(path = %trajectory.display(), "wrote trajectory chart");

    let robustness = cfg.report.robustness_path();
    render_robustness(
        &robustness,
        &robustness_series(&rows, cfg),
        &palette,
        &cfg.report,
        ranking.top.len(),
    )?;
    info!(path = %robustness.display(), "wrote robustness chart");

    Ok((ranking, rows.len(), vec![trajectory, robustness]))
}

/// Full pipeline from a known input path.
pub fn generate_report(cfg: &Config, input: &Path) -> Result<ReportSummary, SeedGapError> {
    cfg.validate()?;
    info!(input = %input.display(), "loading results table");
    let observations = load_observations(input)?;
    info!(rows = observations.len(), "loaded observations");
    let (ranking, selected_rows, artifacts) = render_report(&observations, cfg)?;
    Ok(ReportSummary {
        input: input.to_path_buf(),
        ranking,
        selected_rows,
        artifacts,
    })
}

/// Full pipeline with input resolution.
///
/// A missing input is reported on stderr and yields `Ok(None)`; no charts
/// are written.
pub fn run_report(cfg: &Config) -> Result<Option<ReportSummary>, SeedGapError> {
    let input = match resolve_input(&cfg.report.input, &cfg.report.fallback_input) {
        Ok(p) => p,
        Err(e @ SeedGapError::MissingInput(_)) => {
            eprintln!("{e}");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    generate_report(cfg, &input).map(Some)
}

/// Write the sorted gap series as `rank,seed_idx,mean_gap,pairs`.
pub fn write_gaps_csv<P: AsRef<Path>>(ranking: &SeedRanking, path: P) -> Result<(), SeedGapError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["rank", "seed_idx", "mean_gap", "pairs"])?;
    for (i, g) in ranking.gaps.iter().enumerate() {
        wtr.write_record(&[
            (i + 1).to_string(),
            g.seed_idx.to_string(),
            g.mean_gap.to_string(),
            g.pairs.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
