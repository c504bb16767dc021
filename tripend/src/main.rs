use tripend::{ScenarioConfig, Scenario, TrajectoryRecord};
use tripend::bench_schemes;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file under `scenarios/`
    #[arg(short, default_value = "triple_pendulum.yaml")]
    file_name: String,

    /// Stream every trajectory record to stdout as CSV
    #[arg(long)]
    csv: bool,

    /// Time the integration schemes on the reference scenario instead
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path).with_context(|| format!("opening {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg = ScenarioConfig::from_reader(reader)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.bench {
        bench_schemes();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let scenario = Scenario::build_scenario(scenario_cfg)?;

    // a run that failed mid-way still hands back what it computed
    let (trajectory, failure) = match scenario.run() {
        Ok(buf) => (buf, None),
        Err(f) if f.error.is_runtime() => (f.partial, Some(f.error)),
        Err(f) => return Err(f.error.into()),
    };

    if args.csv {
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        writeln!(out, "{}", TrajectoryRecord::csv_header())?;
        for record in trajectory.records() {
            writeln!(out, "{}", record.to_csv_row())?;
        }
        out.flush()?;
    }

    if let Some(last) = trajectory.last() {
        let drift = trajectory.energy_drift(&scenario.dynamics())?;
        info!(
            samples = trajectory.len(),
            t_end = last.t,
            energy_drift = drift,
            "trajectory ready"
        );
    }

    if let Some(error) = failure {
        warn!(%error, "run stopped early");
        return Err(error.into());
    }

    Ok(())
}
