//! Simulation clock: owns a grid and drives it until the finish day.

use crate::family::Family;
use crate::grid::Grid;
use crate::observer::TickObserver;
use colony_core::{Result, SimulationConfig, TickSummary};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{event, info, instrument, trace, Level};

pub struct SimulationClock {
    grid: Grid,
    config: SimulationConfig,
    observers: Vec<Box<dyn TickObserver + Send>>,
    stop: Option<Arc<AtomicBool>>,
    last: Option<TickSummary>,
}

impl SimulationClock {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let grid = Grid::from_config(&config)?;
        info!(
            seed = config.seed,
            width = grid.width,
            height = grid.height,
            families = grid.families().len(),
            finish_day = config.finish_day,
            "🌱 World seeded"
        );

        Ok(Self {
            grid,
            config,
            observers: Vec::new(),
            stop: None,
            last: None,
        })
    }

    pub fn with_observer(mut self, observer: impl TickObserver + Send + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn TickObserver + Send>) {
        self.observers.push(observer);
    }

    /// Stop between ticks once `flag` is set
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn last_summary(&self) -> Option<&TickSummary> {
        self.last.as_ref()
    }

    /// The run is over once the day counter passes the finish day
    pub fn is_finished(&self) -> bool {
        self.grid.day() > self.config.finish_day
    }

    fn is_cancelled(&self) -> bool {
        self.stop
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    /// Advance one tick and notify observers
    pub fn tick(&mut self) -> Result<TickSummary> {
        let summary = self.grid.step();
        trace!(
            tick = summary.tick,
            occupied = summary.occupied_cells,
            births = summary.births,
            deaths = summary.deaths,
            "Tick complete"
        );

        let was_alive = self.last.as_ref().map_or(true, |last| !last.is_barren());
        if was_alive && summary.is_barren() {
            info!(tick = summary.tick, day = summary.day, "🪦 Every family is extinct");
        }

        for observer in &mut self.observers {
            observer.observe(&self.grid, &summary)?;
        }
        self.last = Some(summary.clone());
        Ok(summary)
    }

    /// Advance up to `ticks` ticks, ignoring the finish day
    pub fn run_ticks(&mut self, ticks: u64) -> Result<Vec<TickSummary>> {
        (0..ticks).map(|_| self.tick()).collect()
    }

    /// Run until the finish day passes or the stop flag is raised
    #[instrument(skip(self), fields(seed = self.config.seed, finish_day = self.config.finish_day))]
    pub fn run(&mut self) -> Result<RunReport> {
        info!("Starting simulation until day {}", self.config.finish_day);

        let mut cancelled = false;
        while !self.is_finished() {
            if self.is_cancelled() {
                info!(tick = self.grid.tick(), "Stop requested, ending run early");
                cancelled = true;
                break;
            }
            self.tick()?;
        }

        let report = self.report(cancelled);
        self.emit_run_summary(&report);

        for observer in &mut self.observers {
            observer.finish(&report)?;
        }
        Ok(report)
    }

    fn report(&self, cancelled: bool) -> RunReport {
        RunReport {
            ticks: self.grid.tick(),
            final_day: self.grid.day(),
            cancelled,
            last: self.last.clone(),
            families: self.grid.families().to_vec(),
        }
    }

    fn emit_run_summary(&self, report: &RunReport) {
        let survivors = report.survivors();
        info!(
            event = "run_summary",
            total_ticks = report.ticks,
            final_day = report.final_day,
            cancelled = report.cancelled,
            surviving_families = survivors.len(),
            occupied_cells = report.last.as_ref().map_or(0, |s| s.occupied_cells),
            "🏁 RUN COMPLETE"
        );

        for family in &report.families {
            info!(
                event = "family_summary",
                family = %family.id,
                births = family.stats.births,
                deaths = family.stats.deaths,
                eaten = family.stats.eaten,
                peak_cells = family.stats.peak_cells,
                extinct_at = ?family.stats.extinct_at,
                "Family result"
            );
        }

        event!(
            Level::INFO,
            gauge_name = "surviving_families",
            gauge_value = survivors.len(),
            "Surviving families gauge"
        );
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub ticks: u64,
    pub final_day: u64,
    /// Ended by the stop flag rather than the finish day
    pub cancelled: bool,
    pub last: Option<TickSummary>,
    pub families: Vec<Family>,
}

impl RunReport {
    /// Families with at least one cell at the end
    pub fn survivors(&self) -> Vec<&Family> {
        let Some(last) = &self.last else {
            return self.families.iter().collect();
        };
        self.families
            .iter()
            .filter(|family| last.cells_of(family.id) > 0)
            .collect()
    }
}
