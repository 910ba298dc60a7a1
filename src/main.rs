use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use seedgap::io_utils::{init_logging, io_cli_error, seedgap_cli_error};
use seedgap::report::check_ranking;
use seedgap::{
    load_observations, rank_seeds, resolve_input, run_report, write_gaps_csv, Config,
    ControlMatch, SeedGapError, SeedRanking, Variant,
};

#[derive(Parser)]
#[command(about = "Rank seeds by the gap between two acquisition strategies and plot the best ones")]
struct Args {
    /// Preset: discrete or continuous
    #[arg(long, default_value = "discrete")]
    variant: Variant,
    /// JSON configuration replacing the preset
    #[arg(long)]
    config: Option<PathBuf>,
    /// Results table (disables the fallback path)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Directory receiving the charts
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Number of seeds to keep
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
    /// Match A_t within this distance of the control value instead of exactly
    #[arg(long)]
    tolerance: Option<f64>,
    /// Rank only, skip the charts
    #[arg(long)]
    rank_only: bool,
    /// Print the result as JSON on stdout
    #[arg(long)]
    json: bool,
    /// Write the full sorted gap series as CSV
    #[arg(long)]
    gaps_csv: Option<PathBuf>,
    /// Print the active configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn build_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut cfg = match &args.config {
        Some(path) => Config::load_json(path).map_err(|e| match e {
            SeedGapError::Io(io) => io_cli_error("reading config", path, io),
            other => seedgap_cli_error("loading config", other),
        })?,
        None => Config::preset(args.variant),
    };
    if let Some(input) = &args.input {
        cfg.report.input = input.clone();
        cfg.report.fallback_input = input.clone();
    }
    if let Some(dir) = &args.out_dir {
        cfg.report.out_dir = dir.clone();
    }
    if let Some(k) = args.top_k {
        cfg.rank.top_k = k;
    }
    if let Some(epsilon) = args.tolerance {
        cfg.rank.control_match = ControlMatch::Tolerance { epsilon };
    }
    cfg.validate()
        .map_err(|e| seedgap_cli_error("checking configuration", e))?;
    Ok(cfg)
}

fn emit<T: Serialize>(
    args: &Args,
    ranking: &SeedRanking,
    payload: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &args.gaps_csv {
        write_gaps_csv(ranking, path).map_err(|e| seedgap_cli_error("writing gaps csv", e))?;
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(payload)?);
    } else {
        println!(
            "Top {} seeds identified by gap: {:?}",
            ranking.top.len(),
            ranking.top
        );
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);
    let cfg = build_config(&args)?;

    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    if args.rank_only {
        let input = match resolve_input(&cfg.report.input, &cfg.report.fallback_input) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("{e}");
                return Ok(());
            }
        };
        let observations =
            load_observations(&input).map_err(|e| seedgap_cli_error("reading results table", e))?;
        let ranking = rank_seeds(&observations, &cfg.rank);
        check_ranking(&ranking).map_err(|e| seedgap_cli_error("ranking seeds", e))?;
        return emit(&args, &ranking, &ranking);
    }

    let summary = match run_report(&cfg).map_err(|e| seedgap_cli_error("generating report", e))? {
        Some(s) => s,
        None => return Ok(()),
    };
    emit(&args, &summary.ranking, &summary)?;
    let last = summary
        .artifacts
        .last()
        .ok_or_else(|| {
            seedgap_cli_error(
                "generating report",
                SeedGapError::Internal("report produced no charts".into()),
            )
        })?;
    eprintln!("Last chart: {}", last.display());
    Ok(())
}
