//! Rank the top seeds and write both charts into `outputs/`.
//!
//! Discrete shift ablation: PQAL against PQAL_random. Takes no arguments.

use seedgap::io_utils::{init_logging, io_cli_error, seedgap_cli_error};
use seedgap::{run_report, Config, Variant};

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(false);
    let cfg = Config::preset(Variant::Discrete);
    std::fs::create_dir_all(&cfg.report.out_dir)
        .map_err(|e| io_cli_error("creating output directory", &cfg.report.out_dir, e))?;

    if let Some(summary) =
        run_report(&cfg).map_err(|e| seedgap_cli_error("plotting top seeds", e))?
    {
        println!(
            "Top {} seeds identified by gap: {:?}",
            summary.ranking.top.len(),
            summary.ranking.top
        );
    }
    Ok(())
}
