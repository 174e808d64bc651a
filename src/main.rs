use chargesim::{ScenarioConfig, Scenario, TrajectoryRecorder};
use chargesim::{run, bench_forces, bench_step};

use clap::Parser;
use anyhow::{Context, Result};

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(about = "Charged particles in a reflecting 2D box")]
struct Args {
    /// Scenario file under scenarios/
    #[arg(short, default_value = "reference.yaml")]
    file_name: String,

    /// Override the integration time step
    #[arg(long)]
    dt: Option<f64>,

    /// Override the simulated time
    #[arg(long)]
    t_end: Option<f64>,

    /// CSV output path (default: output/simulation_<unix-seconds>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Steps between progress lines
    #[arg(long)]
    progress: Option<usize>,

    /// Run the force and tick benchmarks instead of a simulation
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let scenario_cfg = ScenarioConfig::from_yaml_file(&config_path)
        .with_context(|| format!("failed to load scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn default_output() -> PathBuf {
    let stamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    PathBuf::from("output").join(format!("simulation_{stamp}.csv"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.bench {
        bench_forces();
        bench_step();
        return Ok(());
    }

    let mut scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    if let Some(dt) = args.dt {
        scenario_cfg.parameters.dt = dt;
    }
    if let Some(t_end) = args.t_end {
        scenario_cfg.parameters.t_end = t_end;
    }
    if let Some(progress) = args.progress {
        scenario_cfg.engine.progress_interval = progress;
    }

    let mut scenario = Scenario::build_scenario(scenario_cfg)?;
    let mut recorder = TrajectoryRecorder::new(scenario.particles().len());

    let summary = run(&mut scenario, &mut recorder);
    println!("{summary}");

    let output = args.output.unwrap_or_else(default_output);
    recorder.write_csv(&output)?;
    println!("trajectory written to {}", output.display());

    Ok(())
}
