//! Family and per-tick statistics.

use crate::FamilyId;
use serde::{Deserialize, Serialize};

/// Running counters for one family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyStats {
    /// Organisms placed on the grid, founder included
    pub births: u64,
    /// Organisms removed for any reason
    pub deaths: u64,
    /// Organisms this family lost to another family's placement
    pub eaten: u64,
    /// Largest number of cells held at the end of a tick
    pub peak_cells: u32,
    /// Tick at which the family last dropped to zero cells
    pub extinct_at: Option<u64>,
}

impl FamilyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_birth(&mut self) {
        self.births += 1;
    }

    pub fn record_death(&mut self) {
        self.deaths += 1;
    }

    pub fn record_eaten(&mut self) {
        self.eaten += 1;
        self.deaths += 1;
    }

    /// Fold in the end-of-tick cell count. Returns true when the family just went extinct.
    pub fn observe_cells(&mut self, cells: u32, tick: u64) -> bool {
        self.peak_cells = self.peak_cells.max(cells);
        if cells == 0 && self.extinct_at.is_none() {
            self.extinct_at = Some(tick);
            return true;
        }
        if cells > 0 {
            self.extinct_at = None;
        }
        false
    }
}

/// What one tick looked like, for reporting and traces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: u64,
    pub day: u64,
    pub light: f64,
    pub occupied_cells: u32,
    /// Families holding at least one cell
    pub live_families: u32,
    pub live_newborns: u32,
    /// Cells held per family, indexed by family id
    pub family_cells: Vec<u32>,
    pub births: u64,
    pub deaths: u64,
}

impl TickSummary {
    pub fn cells_of(&self, family: FamilyId) -> u32 {
        self.family_cells.get(family.index()).copied().unwrap_or(0)
    }

    /// True once no organism is left on the grid
    pub fn is_barren(&self) -> bool {
        self.occupied_cells == 0
    }
}
