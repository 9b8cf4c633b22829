use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use xylonomial::scenario::ScenarioLoader;

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless forest succession runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/valley.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print a progress report every N ticks (0 disables)
    #[arg(long, default_value_t = 20)]
    report_every: u64,

    /// Emit reports as JSON lines instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(scenario.config.logging.level.as_str()),
    )
    .init();

    let seed = cli.seed.unwrap_or(scenario.seed);
    let mut engine = scenario.build_engine_with_seed(seed)?;
    let ticks = scenario.ticks(cli.ticks);

    for _ in 0..ticks {
        let tick = engine.tick();
        if cli.report_every > 0 && tick.tick % cli.report_every == 0 {
            if cli.json {
                let line = serde_json::to_string(&engine.snapshot())
                    .context("Failed to serialise snapshot")?;
                println!("{line}");
            } else {
                let stats = engine.stats();
                println!(
                    "year {:>7.1}  trees {:>6} ({:>6.2}%)  seeds {:>6}  deaths {:>7}",
                    engine.current_year(),
                    stats.tree_count,
                    stats.tree_percentage,
                    stats.seed_count,
                    stats.death_count
                );
            }
        }
    }

    let stats = engine.stats();
    let mean_tick = engine
        .scheduler()
        .average_tick_time()
        .map(|d| d.as_secs_f64() * 1_000.0)
        .unwrap_or(0.0);
    println!(
        "Scenario '{}' completed {} ticks ({:.1} years). Living trees: {} ({:.2}% cover), deaths: {}, mean tick {:.3} ms",
        engine.name(),
        ticks,
        engine.current_year(),
        stats.tree_count,
        stats.tree_percentage,
        engine.death_count(),
        mean_tick
    );
    Ok(())
}
