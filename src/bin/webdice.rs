//! Run a DICE scenario from the command line
//!
//! Reads an optional TOML scenario file, applies parameter overrides given on
//! the command line, runs the scenario and writes the flat JSON output.
//!
//! # Usage
//!
//! ```bash
//! webdice scenarios/default.toml --optimize -p elasmu=1.5 -p damages_model=tipping_point
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webdice::config::{load_scenario_file, ScenarioFile};
use webdice::errors::DiceResult;
use webdice::parameters::ParameterValue;

#[derive(Parser, Debug)]
#[command(name = "webdice")]
#[command(about = "Run a DICE integrated assessment scenario")]
struct Cli {
    /// Path to a TOML scenario file
    scenario: Option<PathBuf>,

    /// Search for the welfare maximising control path
    #[arg(long)]
    optimize: bool,

    /// Skip the social cost of carbon
    #[arg(long)]
    no_scc: bool,

    /// Parameter override as NAME=VALUE (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_override)]
    overrides: Vec<(String, ParameterValue)>,

    /// Output file for the JSON results (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn parse_override(s: &str) -> Result<(String, ParameterValue), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", s))?;
    let value = match value {
        "true" => ParameterValue::Bool(true),
        "false" => ParameterValue::Bool(false),
        other => other
            .parse::<f64>()
            .map(ParameterValue::Number)
            .unwrap_or_else(|_| ParameterValue::Text(other.to_string())),
    };
    Ok((name.trim().to_string(), value))
}

fn run(cli: Cli) -> DiceResult<()> {
    let mut file = match &cli.scenario {
        Some(path) => {
            info!("Loading scenario from: {}", path.display());
            load_scenario_file(path)?
        }
        None => ScenarioFile::default(),
    };
    file.optimize |= cli.optimize;
    file.scc &= !cli.no_scc;
    file.parameters.extend(cli.overrides);

    let scenario = file.scenario()?;
    let result = scenario.run_with(file.run_options())?;
    if let Some(report) = &result.optimization {
        info!(
            status = ?report.status,
            iterations = report.iterations,
            evaluations = report.evaluations,
            "optimisation finished"
        );
    }
    info!(welfare = result.welfare, "run finished");

    let json = scenario.output(&result.state).to_json(cli.pretty)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Wrote results to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webdice=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
