//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Grid geometry and population parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width of the world in pixels
    pub width: i32,
    /// Height of the world in pixels
    pub height: i32,
    /// Side of one cell in pixels
    pub cell_pitch: i32,
    /// Number of founding families
    pub families: u16,
    /// Thickness (in cells) of the toxic border seeded at initialization
    pub border: i32,
}

impl GridConfig {
    /// Largest arena the engine will allocate, in cells
    pub const MAX_CELLS: i64 = 1 << 24;

    /// Number of cell columns
    pub fn cols(&self) -> i32 {
        self.width / self.cell_pitch
    }

    /// Number of cell rows
    pub fn rows(&self) -> i32 {
        self.height / self.cell_pitch
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            cell_pitch: 8,
            families: 4,
            border: 0,
        }
    }
}

/// Resource economy and life-cycle constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Organic level above which a cell is toxic to everything but roots
    pub organic_threshold: f64,
    /// Energy level above which a cell is toxic to everything but radios
    pub energy_threshold: f64,
    /// Energy of each founder
    pub founder_energy: f64,
    /// Max lifespan of each founder, in ticks
    pub founder_lifespan: f64,
    /// Multiplier in `exp(energy) * lifespan_constant`
    pub lifespan_constant: f64,
    /// Energy returned to a cell when its occupant is eaten
    pub energy_released: f64,
    /// Organic matter returned to a cell when its occupant is eaten
    pub soil_released: f64,
    /// Energy left on the builder's cell for every successful placement
    pub build_energy_residue: f64,
    /// Organic matter left on the builder's cell for every successful placement
    pub build_soil_residue: f64,
    /// Age added per survived tick
    pub age_increment: u32,
    /// Newborns below this energy after settlement are removed
    pub reproduction_floor: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            organic_threshold: 0.8,
            energy_threshold: 0.8,
            founder_energy: 30.0,
            founder_lifespan: 20.0,
            lifespan_constant: 10.0,
            energy_released: 0.001,
            soil_released: 0.001,
            build_energy_residue: 0.02,
            build_soil_residue: 0.001,
            age_increment: 1,
            reproduction_floor: 0.002,
        }
    }
}

/// Founder genome values. All `None` means every founder is randomized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenomeSeed {
    pub mutation_rate: Option<f64>,
    pub rotate_skills: Option<f64>,
    pub rotate_rate: Option<f64>,
    pub radio_rate: Option<f64>,
    pub root_rate: Option<f64>,
    pub leaf_rate: Option<f64>,
    pub newborn_rate: Option<f64>,
}

impl GenomeSeed {
    /// Seed with every trait set to `value`
    pub fn uniform(value: f64) -> Self {
        Self {
            mutation_rate: Some(value),
            rotate_skills: Some(value),
            rotate_rate: Some(value),
            radio_rate: Some(value),
            root_rate: Some(value),
            leaf_rate: Some(value),
            newborn_rate: Some(value),
        }
    }

    pub fn values(&self) -> [Option<f64>; 7] {
        [
            self.mutation_rate,
            self.rotate_skills,
            self.rotate_rate,
            self.radio_rate,
            self.root_rate,
            self.leaf_rate,
            self.newborn_rate,
        ]
    }

    /// Whether founders should be drawn at random
    pub fn is_random(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }
}

/// Everything the engine needs to build and run a world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// The run stops once the day counter exceeds this value
    pub finish_day: u64,
    /// Run tail removal from the cell a newborn just vacated
    pub prune_trail_on_advance: bool,
    pub grid: GridConfig,
    pub economy: EconomyConfig,
    pub genome: GenomeSeed,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            finish_day: 500,
            prune_trail_on_advance: false,
            grid: GridConfig::default(),
            economy: EconomyConfig::default(),
            genome: GenomeSeed::default(),
        }
    }
}

impl SimulationConfig {
    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<()> {
        let grid = &self.grid;
        if grid.width <= 0 || grid.height <= 0 {
            return Err(Error::Validation(format!(
                "grid must have positive size, got {}x{}",
                grid.width, grid.height
            )));
        }
        if grid.cell_pitch <= 0 {
            return Err(Error::Validation(format!(
                "cell pitch must be positive, got {}",
                grid.cell_pitch
            )));
        }
        if grid.width % grid.cell_pitch != 0 || grid.height % grid.cell_pitch != 0 {
            return Err(Error::Validation(format!(
                "cell pitch {} does not divide {}x{}",
                grid.cell_pitch, grid.width, grid.height
            )));
        }
        if grid.families == 0 {
            return Err(Error::Validation("at least one family is required".to_string()));
        }
        let cells = i64::from(grid.cols()) * i64::from(grid.rows());
        if cells > GridConfig::MAX_CELLS {
            return Err(Error::Validation(format!(
                "{}x{} cells exceed the limit of {}",
                grid.cols(),
                grid.rows(),
                GridConfig::MAX_CELLS
            )));
        }
        if i64::from(grid.families) > cells {
            return Err(Error::Validation(format!(
                "{} families do not fit in {} cells",
                grid.families, cells
            )));
        }
        if grid.border < 0 {
            return Err(Error::Validation(format!(
                "border must not be negative, got {}",
                grid.border
            )));
        }
        let thickest = grid.cols().min(grid.rows());
        if grid.border > thickest {
            return Err(Error::Validation(format!(
                "border {} is thicker than the {}x{} grid",
                grid.border,
                grid.cols(),
                grid.rows()
            )));
        }

        let eco = &self.economy;
        let constants = [
            ("organic_threshold", eco.organic_threshold),
            ("energy_threshold", eco.energy_threshold),
            ("founder_energy", eco.founder_energy),
            ("founder_lifespan", eco.founder_lifespan),
            ("lifespan_constant", eco.lifespan_constant),
            ("energy_released", eco.energy_released),
            ("soil_released", eco.soil_released),
            ("build_energy_residue", eco.build_energy_residue),
            ("build_soil_residue", eco.build_soil_residue),
            ("reproduction_floor", eco.reproduction_floor),
        ];
        if let Some((name, value)) = constants.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Validation(format!("{name} must be finite, got {value}")));
        }

        if let Some(value) = self.genome.values().into_iter().flatten().find(|v| !v.is_finite()) {
            return Err(Error::Validation(format!(
                "genome seed values must be finite, got {value}"
            )));
        }

        Ok(())
    }
}

impl SimulationConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Host-side settings for a headless run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory receiving the trace, snapshots and manifest
    pub output_dir: String,
    /// Trace file name inside `output_dir`; `None` disables the trace
    pub trace_file: Option<String>,
    /// Write a snapshot every N ticks (0 = never)
    pub snapshot_every: u64,
    /// Log a progress line every N ticks (0 = never)
    pub log_every: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            output_dir: "./colony-output".to_string(),
            trace_file: Some("trace.jsonl".to_string()),
            snapshot_every: 0,
            log_every: 50,
        }
    }
}

impl RunnerConfig {
    /// Defaults overridden by `COLONY_OUTPUT_DIR`, `COLONY_TRACE_FILE`,
    /// `COLONY_SNAPSHOT_EVERY` and `COLONY_LOG_EVERY`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(dir) = lookup("COLONY_OUTPUT_DIR") {
            config.output_dir = dir;
        }
        if let Some(file) = lookup("COLONY_TRACE_FILE") {
            config.trace_file = if file.is_empty() { None } else { Some(file) };
        }
        if let Some(every) = lookup("COLONY_SNAPSHOT_EVERY") {
            config.snapshot_every = parse_count("COLONY_SNAPSHOT_EVERY", &every)?;
        }
        if let Some(every) = lookup("COLONY_LOG_EVERY") {
            config.log_every = parse_count("COLONY_LOG_EVERY", &every)?;
        }
        Ok(config)
    }
}

fn parse_count(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("{key} must be a non-negative integer, got {value:?}")))
}
