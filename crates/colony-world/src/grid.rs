//! 2D toroidal grid of resource cells and the per-tick step rule.

use crate::behavior::{self, Outcome};
use crate::cell::ResourceCell;
use crate::family::Family;
use crate::genome::Genome;
use crate::organism::{Organism, OrganismKind};
use colony_core::{
    Direction, EconomyConfig, Error, FamilyId, GenomeSeed, GridConfig, Position, Result,
    SimulationConfig, TickSummary,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Light never drops below this at night
pub const LIGHT_MIN: f64 = 0.3;
pub const LIGHT_MAX: f64 = 1.0;
/// Degrees the day counter advances per tick
pub const DAY_INCREMENT: u64 = 3;
/// Upper bound of the random resource levels seeded at initialization
pub const INITIAL_LEVEL_MAX: f64 = 0.8;

/// A toroidal grid of cells plus the world-wide state the step rule needs.
///
/// Cells live in a flat arena indexed `y * width + x`; everything that refers to
/// another cell (neighbors, visitation order, cascade bookkeeping) uses that index.
#[derive(Debug, Clone)]
pub struct Grid {
    /// Columns
    pub width: i32,
    /// Rows
    pub height: i32,
    cell_pitch: i32,
    cells: Vec<ResourceCell>,
    order: Vec<usize>,
    light: f64,
    day: u64,
    tick: u64,
    pending_energy: Vec<f64>,
    families: Vec<Family>,
    economy: EconomyConfig,
    prune_trail_on_advance: bool,
    rng: ChaCha8Rng,
    births: u64,
    deaths: u64,
}

impl Grid {
    /// An empty grid: zero resource levels, no organisms, `families` metadata slots
    pub fn new(width: i32, height: i32, families: u16, economy: EconomyConfig, seed: u64) -> Self {
        debug_assert!(width > 0 && height > 0, "grid must have positive size");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let size = i64::from(width) * i64::from(height);
        debug_assert!(size <= GridConfig::MAX_CELLS, "{width}x{height} grid is too large");
        let size = size as usize;

        let cells = (0..size)
            .map(|i| {
                let i = i as i32;
                ResourceCell::new(Position::new(i % width, i / width), 0.0, 0.0)
            })
            .collect();
        let families = (0..families)
            .map(|id| Family::new(FamilyId(id), Genome::new(), &mut rng))
            .collect::<Vec<_>>();

        Self {
            width,
            height,
            cell_pitch: 1,
            cells,
            order: (0..size).collect(),
            light: LIGHT_MIN,
            day: 0,
            tick: 0,
            pending_energy: vec![0.0; families.len()],
            families,
            economy,
            prune_trail_on_advance: false,
            rng,
            births: 0,
            deaths: 0,
        }
    }

    /// Build and populate a world: random resource levels, toxic borders, one founder per family
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let grid_config = &config.grid;

        let mut grid = Self::new(
            grid_config.cols(),
            grid_config.rows(),
            grid_config.families,
            config.economy.clone(),
            config.seed,
        );
        grid.cell_pitch = grid_config.cell_pitch;
        grid.prune_trail_on_advance = config.prune_trail_on_advance;

        let rng = &mut grid.rng;
        for cell in &mut grid.cells {
            cell.energy = rng.gen_range(0.0..=INITIAL_LEVEL_MAX);
            cell.organic = rng.gen_range(0.0..=INITIAL_LEVEL_MAX);
        }

        grid.seed_borders(grid_config.border);
        grid.seed_founders(&config.genome)?;

        debug!(
            width = grid.width,
            height = grid.height,
            families = grid.families.len(),
            border = grid_config.border,
            "World initialized"
        );
        Ok(grid)
    }

    /// Poison the outer frame and a central cross so families grow apart for a while.
    ///
    /// The cross is one cell wide even without a border.
    fn seed_borders(&mut self, border: i32) {
        let (width, height) = (self.width, self.height);
        for cell in &mut self.cells {
            let Position { x, y } = cell.position;
            if x < border || x > width - border - 1 || y < border || y > height - border - 1 {
                cell.organic = 1.0;
            }
        }

        let half = border / 2;
        let (mid_x, mid_y) = (width / 2, height / 2);
        for x in mid_x - half..=mid_x + half {
            for y in 0..height {
                self.get_mut(Position::new(x, y)).organic = 1.0;
            }
        }
        for y in mid_y - half..=mid_y + half {
            for x in 0..width {
                self.get_mut(Position::new(x, y)).organic = 1.0;
            }
        }
    }

    fn seed_founders(&mut self, seed: &GenomeSeed) -> Result<()> {
        for slot in 0..self.families.len() {
            let genome = if seed.is_random() {
                Genome::random(&mut self.rng)
            } else {
                Genome::from_seed(seed)
            };

            let free: Vec<usize> = (0..self.cells.len())
                .filter(|&i| !self.cells[i].is_occupied())
                .collect();
            let index = *free.choose(&mut self.rng).ok_or_else(|| {
                Error::ResourceExhausted(format!("no free cell for the founder of family {slot}"))
            })?;

            let facing = Direction::from_index(self.rng.gen_range(0..4));
            let family = FamilyId(slot as u16);
            let founder = Organism::founder(family, facing, genome.clone(), &self.economy);
            self.families[slot].founder_genome = genome;
            self.insert_at(index, founder);

            trace!(
                family = %family,
                x = self.cells[index].position.x,
                y = self.cells[index].position.y,
                ?facing,
                "Founder placed"
            );
        }
        Ok(())
    }

    /// Light for a given day counter: a cosine over degrees rescaled into `[LIGHT_MIN, LIGHT_MAX]`
    pub fn light_at(day: u64) -> f64 {
        let wave = 0.5 * (day as f64).to_radians().cos() + 0.5;
        wave * (LIGHT_MAX - LIGHT_MIN) + LIGHT_MIN
    }

    pub fn cell_pitch(&self) -> i32 {
        self.cell_pitch
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn light(&self) -> f64 {
        self.light
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn economy(&self) -> &EconomyConfig {
        &self.economy
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn family(&self, id: FamilyId) -> Option<&Family> {
        self.families.get(id.index())
    }

    /// Energy gathered for `family` this tick and not yet handed to a newborn
    pub fn pending_energy(&self, family: FamilyId) -> f64 {
        self.pending_energy.get(family.index()).copied().unwrap_or(0.0)
    }

    /// Get cell at position (with toroidal wrapping)
    pub fn get(&self, pos: Position) -> &ResourceCell {
        &self.cells[self.index_of(pos)]
    }

    /// Get mutable cell at position
    pub fn get_mut(&mut self, pos: Position) -> &mut ResourceCell {
        let index = self.index_of(pos);
        &mut self.cells[index]
    }

    pub fn cell(&self, index: usize) -> &ResourceCell {
        &self.cells[index]
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut ResourceCell {
        &mut self.cells[index]
    }

    /// Arena index of a position, wrapping it first
    pub fn index_of(&self, pos: Position) -> usize {
        let wrapped = pos.wrap(self.width, self.height);
        (wrapped.y * self.width + wrapped.x) as usize
    }

    /// Get position from index
    pub fn position_of(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Index of the cell one step from `index` in `direction`
    pub fn neighbor(&self, index: usize, direction: Direction) -> usize {
        let pos = self.position_of(index).step(direction, self.width, self.height);
        self.index_of(pos)
    }

    /// Iterator over all cells in arena order
    pub fn iter(&self) -> impl Iterator<Item = &ResourceCell> + '_ {
        self.cells.iter()
    }

    pub fn set_levels(&mut self, pos: Position, organic: f64, energy: f64) {
        let cell = self.get_mut(pos);
        cell.organic = organic;
        cell.energy = energy;
    }

    /// Put an organism down directly, bypassing placement rules. Returns the displaced occupant.
    pub fn insert(&mut self, pos: Position, organism: Organism) -> Option<Organism> {
        let index = self.index_of(pos);
        self.insert_at(index, organism)
    }

    fn insert_at(&mut self, index: usize, organism: Organism) -> Option<Organism> {
        debug_assert!(
            organism.family.index() < self.families.len(),
            "organism of unknown {}",
            organism.family
        );
        self.record_birth(organism.family);
        let displaced = self.cells[index].set_occupant(organism);
        if let Some(old) = &displaced {
            self.record_death(old.family, false);
        }
        displaced
    }

    /// Clear a cell without running tail removal
    pub fn remove(&mut self, pos: Position) -> Option<Organism> {
        let index = self.index_of(pos);
        self.remove_at(index)
    }

    fn remove_at(&mut self, index: usize) -> Option<Organism> {
        let organism = self.cells[index].take_occupant()?;
        self.record_death(organism.family, false);
        Some(organism)
    }

    /// Kill the organism at `pos` the way the step rule does: its tail goes with it.
    ///
    /// Returns the number of organisms removed, the victim included.
    pub fn kill(&mut self, pos: Position) -> usize {
        let index = self.index_of(pos);
        self.kill_at(index)
    }

    fn kill_at(&mut self, index: usize) -> usize {
        let tail = self.remove_tail(index);
        tail + usize::from(self.remove_at(index).is_some())
    }

    fn record_birth(&mut self, family: FamilyId) {
        self.births += 1;
        if let Some(meta) = self.families.get_mut(family.index()) {
            meta.stats.record_birth();
        }
    }

    fn record_death(&mut self, family: FamilyId, eaten: bool) {
        self.deaths += 1;
        if let Some(meta) = self.families.get_mut(family.index()) {
            if eaten {
                meta.stats.record_eaten();
            } else {
                meta.stats.record_death();
            }
        }
    }

    /// Execute one tick and report what it looked like
    pub fn step(&mut self) -> TickSummary {
        self.tick += 1;
        self.births = 0;
        self.deaths = 0;

        self.update_daynight();

        let mut order = std::mem::take(&mut self.order);
        order.shuffle(&mut self.rng);

        for &index in &order {
            self.visit(index);
        }

        for cell in &mut self.cells {
            cell.drift_energy();
        }

        for &index in &order {
            self.settle(index);
        }

        self.order = order;
        self.summarize()
    }

    fn update_daynight(&mut self) {
        self.light = Self::light_at(self.day);
        self.day += DAY_INCREMENT;
    }

    /// Run the occupant's behavior, then age it and apply the death rules
    fn visit(&mut self, index: usize) {
        if !self.cells[index].is_occupied() {
            return;
        }

        if behavior::execute(self, index) == Outcome::Advanced {
            if self.prune_trail_on_advance {
                self.remove_tail(index);
            }
            return;
        }

        let cell = &mut self.cells[index];
        let Some(organism) = cell.occupant_mut() else {
            return;
        };
        organism.tick(self.economy.age_increment);
        let expired = organism.is_expired();
        let kind = organism.kind();
        let poisoned = cell.is_toxic_for(kind, &self.economy);

        if expired || poisoned {
            trace!(index, %kind, expired, poisoned, "Organism died");
            self.kill_at(index);
        }
    }

    /// Hand a newborn its family's gathered energy; starving newborns are dropped without their tail
    fn settle(&mut self, index: usize) {
        let cell = &mut self.cells[index];
        let Some(organism) = cell.occupant_mut() else {
            return;
        };
        if !organism.is(OrganismKind::Newborn) {
            return;
        }

        if let Some(pool) = self.pending_energy.get_mut(organism.family.index()) {
            organism.energy += *pool;
            *pool = 0.0;
        }

        if organism.energy < self.economy.reproduction_floor {
            trace!(index, energy = organism.energy, "Newborn starved");
            self.remove_at(index);
        }
    }

    /// Remove the trail left behind the organism at `root`.
    ///
    /// From each reached cell the walk looks at the cells to the left-of-back, back and
    /// right-of-back of its occupant's facing and follows every same-family occupant.
    /// Cells are marked visited once, so loops around the torus terminate. The root is
    /// left alone unless the walk comes back around to it. Returns the number removed.
    pub(crate) fn remove_tail(&mut self, root: usize) -> usize {
        let Some(family) = self.cells[root].occupant().map(|o| o.family) else {
            return 0;
        };

        let mut visited = HashSet::from([root]);
        let mut stack = vec![root];
        let mut doomed = Vec::new();

        while let Some(index) = stack.pop() {
            let Some(facing) = self.cells[index].occupant().map(|o| o.facing) else {
                continue;
            };
            let back = facing.opposite();
            for direction in [back.turn_left(), back, back.turn_right()] {
                let next = self.neighbor(index, direction);
                let kin = self.cells[next]
                    .occupant()
                    .map_or(false, |o| o.family == family);
                if kin {
                    doomed.push(next);
                    if visited.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }

        doomed
            .into_iter()
            .filter(|&index| self.remove_at(index).is_some())
            .count()
    }

    /// Whether the occupant of `target` refuses anything owned by `owner`
    pub(crate) fn is_refused(&self, target: usize, owner: Option<FamilyId>) -> bool {
        self.cells[target]
            .occupant()
            .map_or(false, |o| o.refuses(owner))
    }

    pub(crate) fn can_place(&self, target: usize, kind: OrganismKind, owner: Option<FamilyId>) -> bool {
        !self.is_refused(target, owner) && !self.cells[target].is_toxic_for(kind, &self.economy)
    }

    /// Grow `organism` from the cell at `from` into `target`, eating whatever lives there.
    ///
    /// A refused or toxic target is a silent no-op. Returns whether the organism was placed.
    pub(crate) fn try_place(
        &mut self,
        from: usize,
        target: usize,
        organism: Organism,
        owner: Option<FamilyId>,
    ) -> bool {
        if !self.can_place(target, organism.kind(), owner) {
            return false;
        }

        if let Some(victim) = self.cells[target].kill_occupant(&self.economy) {
            let eaten = victim.family != organism.family;
            if eaten {
                trace!(
                    eater = %organism.family,
                    victim = %victim.family,
                    victim_kind = %victim.kind(),
                    target,
                    "Organism eaten"
                );
            }
            self.record_death(victim.family, eaten);
        }

        let source = &mut self.cells[from];
        source.organic += self.economy.build_soil_residue;
        source.energy += self.economy.build_energy_residue;

        let family = organism.family;
        self.cells[target].set_occupant(organism);
        self.record_birth(family);
        true
    }

    /// Add to a family's pending energy
    pub(crate) fn deposit(&mut self, family: FamilyId, amount: f64) {
        if let Some(pool) = self.pending_energy.get_mut(family.index()) {
            *pool += amount;
        }
    }

    pub(crate) fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Count the grid without advancing it
    pub fn census(&self) -> TickSummary {
        let mut family_cells = vec![0u32; self.families.len()];
        let mut occupied_cells = 0;
        let mut live_newborns = 0;

        for organism in self.cells.iter().filter_map(ResourceCell::occupant) {
            occupied_cells += 1;
            if organism.is(OrganismKind::Newborn) {
                live_newborns += 1;
            }
            if let Some(count) = family_cells.get_mut(organism.family.index()) {
                *count += 1;
            }
        }

        TickSummary {
            tick: self.tick,
            day: self.day,
            light: self.light,
            occupied_cells,
            live_families: family_cells.iter().filter(|&&c| c > 0).count() as u32,
            live_newborns,
            family_cells,
            births: self.births,
            deaths: self.deaths,
        }
    }

    fn summarize(&mut self) -> TickSummary {
        let summary = self.census();
        for (family, &cells) in self.families.iter_mut().zip(&summary.family_cells) {
            if family.stats.observe_cells(cells, self.tick) {
                debug!(family = %family.id, tick = self.tick, "Family went extinct");
            }
        }
        summary
    }
}
