//! Hooks for code that watches a running simulation.

use crate::grid::Grid;
use crate::simulation::RunReport;
use colony_core::{Result, TickSummary};

/// Called by the clock after every tick
pub trait TickObserver {
    fn observe(&mut self, grid: &Grid, summary: &TickSummary) -> Result<()>;

    /// Called once when the run ends, cancelled or not
    fn finish(&mut self, _report: &RunReport) -> Result<()> {
        Ok(())
    }
}
