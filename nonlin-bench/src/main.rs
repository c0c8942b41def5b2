//! Benchmarking CLI for the nonlin solver.

mod test_problems;

use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nonlin_core::{minimize, Options, TerminationStatus};
use test_problems::registry;

#[derive(Parser)]
#[command(name = "nonlin-bench")]
#[command(about = "Benchmarking CLI for the nonlin solver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Trust region + QP + Leyffer filter
    Filtersqp,
    /// Line search + interior point + Waechter filter
    Ipopt,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in problem registry
    Run {
        /// Solver preset
        #[arg(long, value_enum, default_value = "filtersqp")]
        preset: Preset,
        /// Run a single problem by name
        #[arg(long)]
        problem: Option<String>,
        /// Maximum iterations per problem
        #[arg(long, default_value = "2000")]
        max_iterations: usize,
        /// Print the per-iteration statistics table
        #[arg(long)]
        verbose: bool,
    },
    /// List the built-in problems
    List,
}

fn build_options(preset: Preset, max_iterations: usize, verbose: bool) -> Options {
    let mut options = match preset {
        Preset::Filtersqp => Options::filtersqp_preset(),
        Preset::Ipopt => Options::ipopt_preset(),
    };
    options.set("max_iterations", &max_iterations.to_string());
    options.set("verbose", if verbose { "yes" } else { "no" });
    options
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::List => {
            for problem in registry() {
                println!("{:<16} expected: {}", problem.name, problem.expected_status);
            }
            Ok(())
        }
        Commands::Run {
            preset,
            problem,
            max_iterations,
            verbose,
        } => {
            let options = build_options(preset, max_iterations, verbose);
            let problems: Vec<_> = registry()
                .into_iter()
                .filter(|entry| problem.as_deref().map_or(true, |name| name == entry.name))
                .collect();
            if problems.is_empty() {
                bail!("no matching problem");
            }

            println!(
                "{:<16} {:>24} {:>14} {:>6} {:>10} {:>6}",
                "problem", "status", "objective", "iters", "time (ms)", "ok"
            );
            let mut failures = 0;
            for entry in &problems {
                let model = (entry.builder)();
                let start = Instant::now();
                let result = minimize(model.as_ref(), &options)?;
                let elapsed = start.elapsed().as_secs_f64() * 1e3;

                let objective_ok = entry
                    .expected_objective
                    .map(|expected| (result.objective() - expected).abs() < 1e-4)
                    .unwrap_or(true);
                let ok = result.status == entry.expected_status && objective_ok;
                if !ok {
                    failures += 1;
                }
                println!(
                    "{:<16} {:>24} {:>14.6e} {:>6} {:>10.2} {:>6}",
                    entry.name,
                    result.status.to_string(),
                    result.objective(),
                    result.iterations,
                    elapsed,
                    if ok { "yes" } else { "NO" }
                );
            }
            if 0 < failures {
                bail!("{failures} problem(s) deviated from the expected outcome");
            }
            Ok(())
        }
    }
}
