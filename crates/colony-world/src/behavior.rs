//! What each organism kind does when its cell is visited.

use crate::genome::Genome;
use crate::grid::Grid;
use crate::organism::{Body, Organism, OrganismKind};
use colony_core::Direction;
use rand::Rng;
use tracing::trace;

/// Fraction of a harvested level left in the cell
pub const HARVEST_DECAY: f64 = 0.7;
/// Fraction of the decayed level credited to the family
pub const HARVEST_SHARE: f64 = 0.3;

/// What a visit did to the visited cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The occupant stayed where it was; aging and death checks follow
    Settled,
    /// A newborn was replaced by its own pipe and moved on
    Advanced,
}

/// Which side branches a newborn tries to grow this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Left,
    Right,
    Both,
}

impl BuildMode {
    /// Roll weights for left-only, right-only, both
    pub const WEIGHTS: [f64; 3] = [0.1, 0.1, 0.8];

    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let r: f64 = rng.gen();
        if r < Self::WEIGHTS[0] {
            BuildMode::Left
        } else if r < Self::WEIGHTS[0] + Self::WEIGHTS[1] {
            BuildMode::Right
        } else {
            BuildMode::Both
        }
    }

    pub fn builds_left(self) -> bool {
        matches!(self, BuildMode::Left | BuildMode::Both)
    }

    pub fn builds_right(self) -> bool {
        matches!(self, BuildMode::Right | BuildMode::Both)
    }

    /// Energy handed to each offspring: half each when building both sides
    pub fn share(self, energy: f64) -> f64 {
        match self {
            BuildMode::Both => energy / 2.0,
            _ => energy,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pool {
    Organic,
    Energy,
}

/// Run the behavior of the organism at `index`
pub fn execute(grid: &mut Grid, index: usize) -> Outcome {
    let Some(kind) = grid.cell(index).occupant_kind() else {
        return Outcome::Settled;
    };

    match kind {
        OrganismKind::Leaf => {
            harvest_light(grid, index);
            Outcome::Settled
        }
        OrganismKind::Root => {
            harvest(grid, index, Pool::Organic);
            Outcome::Settled
        }
        OrganismKind::Radio => {
            harvest(grid, index, Pool::Energy);
            Outcome::Settled
        }
        OrganismKind::Pipe => Outcome::Settled,
        OrganismKind::Newborn => reproduce(grid, index),
    }
}

/// A leaf earns the current light unless any 4-neighbor is also a leaf
fn harvest_light(grid: &mut Grid, index: usize) {
    let Some(family) = grid.cell(index).occupant().map(|o| o.family) else {
        return;
    };

    let shaded = Direction::all()
        .into_iter()
        .map(|direction| grid.neighbor(index, direction))
        .filter(|&next| next != index)
        .any(|next| grid.cell(next).occupant_kind() == Some(OrganismKind::Leaf));

    let gain = if shaded { 0.0 } else { grid.light() };
    grid.deposit(family, gain);
}

fn harvest(grid: &mut Grid, index: usize, pool: Pool) {
    let cell = grid.cell_mut(index);
    let Some(family) = cell.occupant().map(|o| o.family) else {
        return;
    };

    let level = match pool {
        Pool::Organic => &mut cell.organic,
        Pool::Energy => &mut cell.energy,
    };
    *level *= HARVEST_DECAY;
    let gain = *level * HARVEST_SHARE;
    grid.deposit(family, gain);
}

/// Copy of `genome` with one mutation roll applied
fn inherit<R: Rng + ?Sized>(genome: &Genome, rng: &mut R) -> Genome {
    let mut child = genome.clone();
    child.mutate(rng);
    child
}

/// Grow side branches, push a newborn forward, then leave a pipe behind
fn reproduce(grid: &mut Grid, index: usize) -> Outcome {
    let Some(parent) = grid.cell(index).occupant().cloned() else {
        return Outcome::Settled;
    };
    let Organism {
        family,
        facing,
        energy,
        body,
        ..
    } = parent;
    let Body::Newborn(genome) = body else {
        return Outcome::Settled;
    };

    let economy = grid.economy().clone();
    let mode = BuildMode::roll(grid.rng_mut());
    let share = mode.share(energy);
    let owner = Some(family);

    let branches = [
        (mode.builds_left(), facing.turn_left()),
        (mode.builds_right(), facing.turn_right()),
    ];
    for (selected, side) in branches {
        let target = grid.neighbor(index, side);
        if grid.is_refused(target, owner) || !selected {
            continue;
        }
        let Some(kind) = genome.draw_kind(grid.rng_mut()) else {
            continue;
        };
        let body = Body::for_kind(kind, || inherit(&genome, grid.rng_mut()));
        let child = Organism::offspring(body, family, side, share, &economy);
        let placed = grid.try_place(index, target, child, owner);
        trace!(index, target, %kind, ?side, placed, "Branch grown");
    }

    let ahead = grid.neighbor(index, facing);
    let heir = Body::Newborn(inherit(&genome, grid.rng_mut()));
    let child = Organism::offspring(heir, family, facing, share, &economy);
    grid.try_place(index, ahead, child, owner);

    let pipe = Organism::offspring(Body::Pipe, family, facing, share, &economy);
    if grid.try_place(index, index, pipe, None) {
        Outcome::Advanced
    } else {
        Outcome::Settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Trait;
    use colony_core::{EconomyConfig, FamilyId, GenomeSeed, Position};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn newborn(genome: Genome, facing: Direction, energy: f64) -> Organism {
        Organism::offspring(
            Body::Newborn(genome),
            FamilyId(0),
            facing,
            energy,
            &EconomyConfig::default(),
        )
    }

    fn leaf_only() -> Genome {
        let mut genome = Genome::from_seed(&GenomeSeed::uniform(0.0));
        genome.set(Trait::LeafRate, 1.0);
        genome
    }

    #[test]
    fn test_build_mode_distribution() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut counts = [0u32; 3];
        for _ in 0..10_000 {
            match BuildMode::roll(&mut rng) {
                BuildMode::Left => counts[0] += 1,
                BuildMode::Right => counts[1] += 1,
                BuildMode::Both => counts[2] += 1,
            }
        }
        assert!((800..1200).contains(&counts[0]));
        assert!((800..1200).contains(&counts[1]));
        assert!((7600..8400).contains(&counts[2]));
        assert_eq!(BuildMode::Both.share(4.0), 2.0);
        assert_eq!(BuildMode::Left.share(4.0), 4.0);
    }

    #[test]
    fn test_newborn_advances_and_leaves_pipe() {
        let mut grid = Grid::new(7, 7, 1, EconomyConfig::default(), 3);
        grid.insert(Position::new(3, 3), newborn(leaf_only(), Direction::East, 2.0));
        let index = grid.index_of(Position::new(3, 3));

        assert_eq!(execute(&mut grid, index), Outcome::Advanced);

        let own = grid.get(Position::new(3, 3)).occupant().unwrap();
        assert_eq!(own.kind(), OrganismKind::Pipe);
        assert_eq!(own.family, FamilyId(0));
        assert_eq!(own.facing, Direction::East);

        let ahead = grid.get(Position::new(4, 3)).occupant().unwrap();
        assert_eq!(ahead.kind(), OrganismKind::Newborn);
        assert_eq!(ahead.facing, Direction::East);
        assert!(ahead.energy == 1.0 || ahead.energy == 2.0);

        // Whatever side branches grew are leaves facing their side
        for side in [Direction::North, Direction::South] {
            let pos = Position::new(3, 3).step(side, 7, 7);
            if let Some(branch) = grid.get(pos).occupant() {
                assert_eq!(branch.kind(), OrganismKind::Leaf);
                assert_eq!(branch.facing, side);
            }
        }

        // Each placement deposits residue on the newborn's own cell
        let cell = grid.get(Position::new(3, 3));
        assert!(cell.energy >= 0.02 * 2.0);
    }

    #[test]
    fn test_blocked_newborn_stays_settled() {
        let mut grid = Grid::new(5, 5, 1, EconomyConfig::default(), 3);
        // Its own cell is too energetic for a pipe
        grid.set_levels(Position::new(2, 2), 0.0, 0.79);
        grid.insert(Position::new(2, 2), newborn(leaf_only(), Direction::North, 1.0));
        let index = grid.index_of(Position::new(2, 2));

        assert_eq!(execute(&mut grid, index), Outcome::Settled);
        assert_eq!(
            grid.get(Position::new(2, 2)).occupant_kind(),
            Some(OrganismKind::Newborn)
        );
    }

    #[test]
    fn test_newborn_without_weights_only_moves_forward() {
        let mut grid = Grid::new(5, 5, 1, EconomyConfig::default(), 8);
        let genome = Genome::from_seed(&GenomeSeed::uniform(0.0));
        grid.insert(Position::new(2, 2), newborn(genome, Direction::South, 1.0));
        let index = grid.index_of(Position::new(2, 2));

        assert_eq!(execute(&mut grid, index), Outcome::Advanced);
        assert!(!grid.get(Position::new(1, 2)).is_occupied());
        assert!(!grid.get(Position::new(3, 2)).is_occupied());
        let ahead = Position::new(2, 2).step(Direction::South, 5, 5);
        assert_eq!(grid.get(ahead).occupant_kind(), Some(OrganismKind::Newborn));
    }

    #[test]
    fn test_pipe_does_nothing() {
        let mut grid = Grid::new(3, 3, 1, EconomyConfig::default(), 1);
        grid.set_levels(Position::new(1, 1), 0.5, 0.5);
        grid.insert(
            Position::new(1, 1),
            Organism::offspring(Body::Pipe, FamilyId(0), Direction::West, 1.0, &EconomyConfig::default()),
        );
        let index = grid.index_of(Position::new(1, 1));
        assert_eq!(execute(&mut grid, index), Outcome::Settled);
        assert_eq!(grid.pending_energy(FamilyId(0)), 0.0);
        assert_eq!(grid.get(Position::new(1, 1)).organic, 0.5);
    }
}
