use clap::Parser;
use masim_rs::scenario::{self, ScenarioSpec};
use masim_rs::sim::{Engine, ProgressMonitor, TraceLogger};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "scenario-sim",
    about = "Run scenario.json on the masim-rs simulation engine"
)]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,

    /// Output step trace JSON file
    #[arg(long)]
    trace_json: Option<PathBuf>,

    /// Override the scenario's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the step limit
    #[arg(long)]
    max_steps: Option<u64>,

    /// Override the simulated-time limit (seconds)
    #[arg(long)]
    max_time_s: Option<f64>,

    /// Commit up to this many independent occurrences per scheduling window
    #[arg(long)]
    batch: Option<usize>,

    /// Log progress every N steps
    #[arg(long)]
    progress_every: Option<u64>,

    /// Print per-node molecule contents after the run
    #[arg(long)]
    final_state: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    let raw = fs::read_to_string(&args.scenario).expect("read scenario.json");
    let mut spec: ScenarioSpec = serde_json::from_str(&raw).expect("parse scenario.json");

    if let Some(seed) = args.seed {
        spec.seed = Some(seed);
    }
    if args.max_steps.is_some() || args.max_time_s.is_some() {
        let termination = spec.termination.get_or_insert_with(Default::default);
        if args.max_steps.is_some() {
            termination.max_steps = args.max_steps;
        }
        if args.max_time_s.is_some() {
            termination.max_sim_time_s = args.max_time_s;
        }
    }

    let env = match scenario::build_environment(&spec) {
        Ok(env) => env,
        Err(e) => panic!("scenario rejected: {e}"),
    };
    let mut config = match scenario::engine_config(&spec) {
        Ok(config) => config,
        Err(e) => panic!("scenario rejected: {e}"),
    };
    config.batch = args.batch;

    let mut engine = Engine::new(env, config);
    let trace = args.trace_json.as_ref().map(|_| {
        let logger = TraceLogger::new();
        engine.add_monitor(Box::new(logger.clone()));
        logger
    });
    if let Some(every) = args.progress_every {
        engine.add_monitor(Box::new(ProgressMonitor::new(every)));
    }

    engine.initialize().expect("initialize engine");
    if let Err(e) = engine.run() {
        panic!("simulation failed: {e}");
    }

    if let (Some(path), Some(logger)) = (args.trace_json, trace) {
        let json = serde_json::to_string_pretty(&logger.records()).expect("serialize trace");
        fs::write(&path, json).expect("write trace json");
        eprintln!("wrote step trace to {}", path.display());
    }

    println!(
        "done @ {:.6}s, steps={}, fired={}, skipped={}, status={:?}",
        engine.current_time().as_secs(),
        engine.stats.steps,
        engine.stats.fired,
        engine.stats.skipped,
        engine.status(),
    );

    if args.final_state {
        let env = engine.environment();
        for id in env.node_ids() {
            let node = env.node(id).expect("listed node exists");
            let contents = node
                .contents_sorted()
                .into_iter()
                .map(|(molecule, value)| format!("{molecule}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("node {} @ ({:.3}, {:.3}): {contents}", id.0, node.position().x, node.position().y);
        }
    }
}
