//! Firesweep CLI - grid sweep of the fire/alarm/mobilisation network
//!
//! Usage:
//!   firesweep                                   # Reference run, appends to sim_out.txt
//!   firesweep --true-alarm 1:3 -o out.txt       # Smaller grid, different file
//!   firesweep --estimator bayes --pseudo-count 2 --truncate

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use firesweep_core::sweep::config::DEFAULT_OUTPUT;
use firesweep_core::{run_to_file, Estimator, ParamRange, SweepConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EstimatorArg {
    /// Maximum likelihood (relative frequencies)
    Ml,
    /// Dirichlet-smoothed frequencies
    Bayes,
}

#[derive(Parser)]
#[command(name = "firesweep")]
#[command(version)]
#[command(about = "Sweep synthetic alarm counts and record P(Fire | Alarm, Mobilised)")]
#[command(
    long_about = "Fits the network F->A, F->M, A->M for every (trueAlarm, falseAlarm, discardedAlarm) \
                  combination and appends one record per combination to the output file"
)]
struct Cli {
    /// Output file (appended to unless --truncate)
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Range of true-alarm counts, inclusive
    #[arg(long, value_name = "LO:HI", default_value = "1:10", value_parser = parse_range)]
    true_alarm: ParamRange,

    /// Range of false-alarm counts, inclusive
    #[arg(long, value_name = "LO:HI", default_value = "1:50", value_parser = parse_range)]
    false_alarm: ParamRange,

    /// Range of discarded-alarm counts, inclusive
    #[arg(long, value_name = "LO:HI", default_value = "1:50", value_parser = parse_range)]
    discarded_alarm: ParamRange,

    /// Parameter estimator
    #[arg(long, value_enum, default_value = "ml")]
    estimator: EstimatorArg,

    /// Equivalent sample size for --estimator bayes [default: 1]
    #[arg(long, value_name = "N")]
    pseudo_count: Option<f64>,

    /// Truncate the output file before writing
    #[arg(long)]
    truncate: bool,
}

fn parse_range(s: &str) -> Result<ParamRange, String> {
    s.parse::<ParamRange>().map_err(|e| e.to_string())
}

impl Cli {
    fn into_config(self) -> Result<SweepConfig, clap::Error> {
        let estimator = match (self.estimator, self.pseudo_count) {
            (EstimatorArg::Ml, None) => Estimator::MaximumLikelihood,
            (EstimatorArg::Ml, Some(_)) => {
                return Err(Cli::command().error(
                    ErrorKind::ArgumentConflict,
                    "--pseudo-count only applies to --estimator bayes",
                ));
            }
            (EstimatorArg::Bayes, pseudo_count) => Estimator::BayesianDirichlet {
                pseudo_count: pseudo_count.unwrap_or(1.0),
            },
        };
        Ok(SweepConfig {
            true_alarm: self.true_alarm,
            false_alarm: self.false_alarm,
            discarded_alarm: self.discarded_alarm,
            output: self.output,
            truncate: self.truncate,
            estimator,
            ..SweepConfig::default()
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config().unwrap_or_else(|e| e.exit());
    info!(output = %config.output.display(), estimator = ?config.estimator, "firesweep");

    match run_to_file(&config) {
        Ok(summary) => {
            println!(
                "✓ {} records written to {}",
                summary.records,
                config.output.display()
            );
        }
        Err(e) => {
            error!("sweep failed: {}", e);
            process::exit(1);
        }
    }
}
