use anyhow::{Context, anyhow};
use tread::blackboard::{Blackboard, snapshot};
use tread::bus::Topic;
use tread::robot::PoseSample;
use tread::settings::{self, Settings};
use tread::simulation::Simulation;
use tread::{reporter, scheduler};

use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{self, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Tread simulator started.");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| settings::DEFAULT_CONFIG_PATH.to_string());
    let settings = settings::load_config(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;

    match run(settings).await {
        Ok(()) => {
            info!("Simulation finished successfully.");
            Ok(())
        }
        Err(e) => {
            error!("Simulation failed: {:?}", e);
            Err(e)
        }
    }
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let mut simulation = Simulation::from_settings(&settings)?;
    for robot in simulation.robots() {
        info!(robot = robot.name(), drive = %robot.drive(), start = %robot.pose(), "Robot configured");
    }

    let bb: Blackboard = Arc::default();
    let pose_topic: Topic<PoseSample> = Topic::new("pose", 64);
    let pose_rx = pose_topic.subscribe();
    let period = Duration::from_millis(settings.simulation.tick_period_ms);
    let report_interval = Duration::from_millis(settings.simulation.report_interval_ms);
    let max_ticks = settings.simulation.max_ticks;

    simulation.play();

    info!("Spawning tick thread...");
    let tick_thread = std::thread::Builder::new()
        .name("tick".into())
        .spawn({
            let bb = Arc::clone(&bb);
            move || scheduler::tick_loop(simulation, bb, pose_topic, period, max_ticks)
        })?;

    let watchdog = tokio::spawn(scheduler::watchdog(Arc::clone(&bb), period));
    // Ends once the tick thread drops the pose topic.
    let final_poses = reporter::report_task(pose_rx, report_interval).await?;
    let joined = tokio::task::spawn_blocking(move || tick_thread.join()).await?;
    watchdog.abort();
    let ticks = joined.map_err(|_| anyhow!("tick thread panicked"))?;

    let state = snapshot(&bb);
    info!(ticks, robots = final_poses.len(), faults = state.faults.len(), "Simulation complete.");
    for fault in &state.faults {
        warn!(%fault, "Fault raised during simulation");
    }
    Ok(())
}
