//! 衰变链仿真
//!
//! 运行单节点 A → B → C 衰变链示例

use clap::Parser;
use masim_rs::demo::{DecayChainOpts, build_decay_chain};
use masim_rs::model::{Environment, Molecule, NoLinks};
use masim_rs::sim::{Engine, EngineConfig, SimTime};

#[derive(Debug, Parser)]
#[command(name = "decay-chain", about = "衰变链仿真：单节点 A->B->C 随机衰变")]
struct Args {
    /// A 的初始浓度
    #[arg(long, default_value_t = 1000.0)]
    initial_a: f64,
    /// A → B 的基础速率
    #[arg(long, default_value_t = 1.0)]
    rate_ab: f64,
    /// B → C 的基础速率
    #[arg(long, default_value_t = 0.5)]
    rate_bc: f64,
    /// 仿真运行到多少秒
    #[arg(long, default_value_t = 30.0)]
    until_s: f64,
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() {
    // 初始化 tracing
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

    let mut env = Environment::new(Box::new(NoLinks));
    let opts = DecayChainOpts {
        initial_a: args.initial_a,
        rate_ab: args.rate_ab,
        rate_bc: args.rate_bc,
    };
    let node = build_decay_chain(&mut env, &opts);

    let config = EngineConfig {
        max_sim_time: Some(SimTime::from_secs(args.until_s)),
        seed: args.seed,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(env, config);
    engine.initialize().expect("initialize engine");
    engine.run().expect("run simulation");

    let env = engine.environment();
    println!(
        "done @ {:.3}s, steps={}, fired={}, A={}, B={}, C={}",
        engine.current_time().as_secs(),
        engine.stats.steps,
        engine.stats.fired,
        env.concentration(node, &Molecule::new("A")),
        env.concentration(node, &Molecule::new("B")),
        env.concentration(node, &Molecule::new("C")),
    );
}
