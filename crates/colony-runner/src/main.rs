//! Headless runner: builds a world from config, runs it to the finish day, and records the run.

mod manifest;
mod recorder;
mod telemetry;

use anyhow::{Context, Result};
use chrono::Utc;
use colony_core::{RunId, RunnerConfig, SimulationConfig};
use colony_world::SimulationClock;
use manifest::RunManifest;
use recorder::{ProgressLogger, SnapshotWriter, TraceRecorder};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let config_path = std::env::args().nth(1);
    let simulation = load_simulation_config(config_path.as_deref()).await?;
    let simulation = override_seed(simulation, std::env::var("COLONY_SEED").ok())?;
    let runner = RunnerConfig::from_env()?;
    let run_id = RunId::new();

    info!(
        %run_id,
        seed = simulation.seed,
        output_dir = %runner.output_dir,
        "Starting Colony runner"
    );

    let output_dir = PathBuf::from(&runner.output_dir);
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let stop = Arc::new(AtomicBool::new(false));
    let mut clock = SimulationClock::new(simulation.clone())?
        .with_stop_flag(stop.clone())
        .with_observer(ProgressLogger::new(runner.log_every));
    if let Some(file) = &runner.trace_file {
        clock.add_observer(Box::new(TraceRecorder::create(output_dir.join(file))?));
    }
    if runner.snapshot_every > 0 {
        clock.add_observer(Box::new(SnapshotWriter::new(
            &output_dir,
            runner.snapshot_every,
        )));
    }

    let started_at = Utc::now();
    let mut handle = tokio::task::spawn_blocking(move || clock.run());

    let report = tokio::select! {
        joined = &mut handle => joined??,
        _ = shutdown_signal() => {
            stop.store(true, Ordering::Relaxed);
            info!("Finishing the current tick before stopping");
            handle.await??
        }
    };

    let manifest = RunManifest::new(run_id, started_at, simulation, runner, &report);
    let path = manifest.write(&output_dir).await?;
    info!(
        %run_id,
        ticks = report.ticks,
        cancelled = report.cancelled,
        manifest = %path.display(),
        "Run recorded"
    );

    Ok(())
}

async fn load_simulation_config(path: Option<&str>) -> Result<SimulationConfig> {
    match path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading config {path}"))?;
            let config = SimulationConfig::from_json(&json)
                .with_context(|| format!("parsing config {path}"))?;
            info!(path, "Configuration loaded");
            Ok(config)
        }
        None => {
            info!("No config file given, using defaults");
            Ok(SimulationConfig::default())
        }
    }
}

fn override_seed(mut config: SimulationConfig, seed: Option<String>) -> Result<SimulationConfig> {
    if let Some(seed) = seed {
        config.seed = seed
            .trim()
            .parse()
            .with_context(|| format!("COLONY_SEED must be an integer, got {seed:?}"))?;
    }
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
