//! Erlang loss sweep: theory vs. simulation
//!
//! Usage:
//!   cargo run --release -p erlang_loss -- --config erlang_loss/configs/baseline.toml
//!   cargo run --release -p erlang_loss -- --time-unit-ms 50 --parallel
//!   cargo run --release -p erlang_loss -- --config my.toml --sequential

use clap::Parser;
use erlang_loss::{ExperimentRunner, ModelConfig, SweepResults, plot, report};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "erlang_loss")]
#[command(about = "Compare Erlang-B theory against a simulated M/M/n/n loss system", long_about = None)]
struct Cli {
    /// TOML experiment configuration (baseline when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory for the table, CSV, JSON and charts
    #[arg(short, long, default_value = "results")]
    output_dir: PathBuf,
    /// Override the base seed
    #[arg(long)]
    seed: Option<u64>,
    /// Override wall-clock milliseconds per model time unit
    #[arg(long)]
    time_unit_ms: Option<f64>,
    /// Run sweep points concurrently
    #[arg(long)]
    parallel: bool,
    /// Run sweep points one after the other, even if the config says parallel
    #[arg(long, conflicts_with = "parallel")]
    sequential: bool,
    /// Skip chart rendering
    #[arg(long)]
    no_plots: bool,
}

fn load_config(cli: &Cli) -> erlang_loss::Result<ModelConfig> {
    let mut config = match &cli.config {
        Some(path) => ModelConfig::from_toml_file(path)?,
        None => ModelConfig::baseline(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(ms) = cli.time_unit_ms {
        config.time_unit_ms = ms;
    }
    if cli.parallel {
        config.parallel = true;
    } else if cli.sequential {
        config.parallel = false;
    }
    config.validate()?;
    Ok(config)
}

/// Write every output; returns how many of them failed
fn write_outputs(results: &SweepResults, dir: &Path, plots: bool) -> usize {
    let mut failures = 0;
    let mut step = |name: &str, path: PathBuf, outcome: erlang_loss::Result<()>| match outcome {
        Ok(()) => log::info!("wrote {} to {}", name, path.display()),
        Err(e) => {
            log::error!("failed to write {} to {}: {}", name, path.display(), e);
            failures += 1;
        }
    };

    let table = dir.join("data.txt");
    step("table", table.clone(), report::write_table_file(results, &table));
    let csv = dir.join("metrics.csv");
    step("CSV", csv.clone(), report::write_csv(results, &csv));
    let json = dir.join("metrics.json");
    step("JSON", json.clone(), report::write_json(results, &json));

    if plots {
        match plot::render_all(results, dir) {
            Ok(paths) => log::info!("rendered {} charts into {}", paths.len(), dir.display()),
            Err(e) => {
                log::error!("failed to render charts into {}: {}", dir.display(), e);
                failures += 1;
            }
        }
    }
    failures
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let results = match ExperimentRunner::new(config).and_then(|runner| runner.run()) {
        Ok(results) => results,
        Err(e) => {
            log::error!("sweep failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = fs::create_dir_all(&cli.output_dir) {
        log::error!("cannot create {}: {}", cli.output_dir.display(), e);
        if let Err(e) = report::write_table(&results, std::io::stdout().lock()) {
            log::error!("failed to print table: {}", e);
        }
        return ExitCode::FAILURE;
    }

    let failures = write_outputs(&results, &cli.output_dir, !cli.no_plots);
    if failures > 0 {
        log::error!("{} output(s) failed, the others were written", failures);
        return ExitCode::FAILURE;
    }
    log::info!("simulation finished, results in {}", cli.output_dir.display());
    ExitCode::SUCCESS
}
