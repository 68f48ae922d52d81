//! Run manifest written next to the trace.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colony_core::{FamilyId, RunId, RunnerConfig, SimulationConfig};
use colony_world::RunReport;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub simulation: SimulationConfig,
    pub runner: RunnerConfig,
    pub ticks: u64,
    pub final_day: u64,
    pub cancelled: bool,
    pub surviving_families: Vec<FamilyId>,
}

impl RunManifest {
    pub fn new(
        run_id: RunId,
        started_at: DateTime<Utc>,
        simulation: SimulationConfig,
        runner: RunnerConfig,
        report: &RunReport,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            simulation,
            runner,
            ticks: report.ticks,
            final_day: report.final_day,
            cancelled: report.cancelled,
            surviving_families: report.survivors().iter().map(|f| f.id).collect(),
        }
    }

    pub async fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
