mod error;
mod output;
mod scenario;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use fcr_features::{
    Annotations, DisplayRanges, NadirFeature, ViewPreset, frequency_title, power_title,
};
use fcr_sim::{
    SimOptions, SweepDefinition, SweepParameter, SweepType, run_sweep, simulate_with,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;
use crate::output::{RunSummary, to_csv};
use crate::scenario::{ParamArgs, Scenario};

#[derive(Parser)]
#[command(name = "fcr")]
#[command(about = "Grid frequency response to a load step, with droop FCR", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file
    Validate {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
    },
    /// Simulate one scenario
    Run {
        #[command(flatten)]
        params: ParamArgs,
        /// Zoom the frequency axis on 49-50 Hz
        #[arg(long)]
        zoom: bool,
        /// Write the time series as CSV to this file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print a JSON summary instead of text
        #[arg(long)]
        json: bool,
    },
    /// Simulate a range of values of one parameter
    Sweep {
        #[command(flatten)]
        params: ParamArgs,
        /// Parameter to vary: inertia, droop, lag, load-step
        #[arg(long)]
        parameter: SweepParameter,
        #[arg(long, allow_hyphen_values = true)]
        start: f64,
        #[arg(long, allow_hyphen_values = true)]
        end: f64,
        /// Number of points, endpoints included
        #[arg(long, default_value_t = 5)]
        points: usize,
        /// Space points logarithmically
        #[arg(long)]
        log: bool,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Run {
            params,
            zoom,
            csv,
            json,
        } => cmd_run(&params, zoom, csv.as_deref(), json),
        Commands::Sweep {
            params,
            parameter,
            start,
            end,
            points,
            log,
        } => {
            let sweep_type = if log {
                SweepType::Logarithmic
            } else {
                SweepType::Linear
            };
            let sweep = SweepDefinition::new(parameter, start, end, points, sweep_type)?;
            cmd_sweep(&params, &sweep)
        }
    }
}

fn cmd_validate(scenario_path: &Path) -> CliResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = Scenario::load(scenario_path)?;
    let window = scenario.window()?;
    scenario.resolve(&window)?;
    println!("✓ Scenario is valid");
    Ok(())
}

fn cmd_run(args: &ParamArgs, zoom: bool, csv: Option<&Path>, json: bool) -> CliResult<()> {
    let scenario = args.scenario()?;
    let window = scenario.window()?;
    let params = scenario.resolve(&window)?;

    let result = simulate_with(&params, &SimOptions::for_window(window))?;
    info!(
        samples = result.len(),
        blackout = result.terminated_by_blackout,
        "simulation finished"
    );
    let annotations = Annotations::from_run(&params, &result, &window);
    let ranges = DisplayRanges::from_preset(ViewPreset::from_zoom(zoom), &params, &result, &window);

    if let Some(path) = csv {
        std::fs::write(path, to_csv(&result, &annotations))?;
        if !json {
            println!("✓ Exported {} samples to {}", result.len(), path.display());
        }
    }

    if json {
        let summary = RunSummary::new(&params, window, &result, &annotations, ranges);
        println!("{}", summary.to_json()?);
        return Ok(());
    }

    println!("{}", frequency_title(&params));
    println!("  {}", annotations.rocof_label());
    if let Some(label) = annotations.floor_label() {
        println!("  {}", label);
    }
    match &annotations.nadir {
        Some(nadir) => println!(
            "  Nadir: {:.3} Hz at t = {:.2} s",
            nadir.frequency, nadir.time
        ),
        None => println!("  Nadir: none"),
    }
    if let Some(f_end) = result.final_frequency() {
        println!("  Final frequency: {:.3} Hz", f_end);
    }
    if let Some((t0, t1)) = annotations.blackout_span {
        println!("  ✗ Blackout from t = {:.2} s to {:.2} s", t0, t1);
    }

    println!("{}", power_title(&params));
    if let Some(p_end) = result.regulation_power.last() {
        println!("  Final FCR power: {:.4} pu", p_end);
    }
    if let Some((t0, t1)) = annotations.lag_span {
        println!("  Lag span: {:.1} - {:.1} s", t0, t1);
    }

    println!(
        "\nView: f in [{:.3}, {:.3}] Hz, t in [{}, {}] s",
        ranges.frequency.min, ranges.frequency.max, ranges.time.min, ranges.time.max
    );
    print_stats(&result.stats);
    Ok(())
}

fn cmd_sweep(args: &ParamArgs, sweep: &SweepDefinition) -> CliResult<()> {
    let scenario = args.scenario()?;
    let window = scenario.window()?;
    let base = scenario.resolve(&window)?;

    println!("{}", sweep);
    let points = run_sweep(&base, sweep, &SimOptions::for_window(window));

    println!(
        "  {:>10}  {:>10}  {:>10}  {:>10}  {:>8}",
        sweep.parameter.to_string(),
        "min (Hz)",
        "nadir (Hz)",
        "final (Hz)",
        "blackout"
    );
    for point in &points {
        match &point.outcome {
            Ok(result) => {
                let min = result.frequency.iter().copied().fold(f64::INFINITY, f64::min);
                let nadir = NadirFeature::from_series(&result.time, &result.frequency)
                    .map(|n| format!("{:.3}", n.frequency))
                    .unwrap_or_else(|| "-".to_string());
                let f_end = result.final_frequency().unwrap_or(f64::NAN);
                println!(
                    "  {:>10.4}  {:>10.3}  {:>10}  {:>10.3}  {:>8}",
                    point.value,
                    min,
                    nadir,
                    f_end,
                    if result.terminated_by_blackout { "yes" } else { "no" }
                );
            }
            Err(e) => println!("  {:>10.4}  ✗ {}", point.value, e),
        }
    }
    Ok(())
}

fn print_stats(stats: &fcr_sim::SolverStats) {
    println!("\nSolver summary:");
    println!("  Accepted steps: {}", stats.accepted_steps);
    println!("  Rejected steps: {}", stats.rejected_steps);
    println!("  Failed stage solves: {}", stats.failed_stage_solves);
    println!("  RHS evaluations: {}", stats.rhs_evals);
    println!("  Newton iterations: {}", stats.newton_iters);
}
