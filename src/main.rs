/*!
 * SRT Scheduler - Simulation Entry Point
 *
 * Runs a scripted scenario through the scheduler engine:
 * - Loads configuration from the environment
 * - Reads the scenario JSON named on the command line
 * - Prints the run report as JSON
 */

use anyhow::{bail, Context, Result};
use tracing::info;

use srt_scheduler::{init_tracing, Scenario, SchedulerConfig, Simulation};

fn main() -> Result<()> {
    init_tracing();

    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => bail!("usage: sched-sim <scenario.json>"),
    };

    let config = SchedulerConfig::from_env().context("Failed to load scheduler configuration")?;
    info!(
        hz = config.hz,
        new_task_slice = config.new_task_slice(),
        max_tasks = config.max_tasks,
        "Configuration loaded"
    );

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read scenario {}", path))?;
    let mut scenario = Scenario::from_json(&text)
        .with_context(|| format!("Failed to parse scenario {}", path))?;
    if scenario.name.is_empty() {
        scenario.name = path.clone();
    }

    info!(path = %path, events = scenario.events.len(), "Running scenario");

    let report = Simulation::new(config)
        .context("Failed to create simulation")?
        .run(&scenario)
        .context("Simulation failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
