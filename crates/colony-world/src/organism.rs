//! Organism state.

use crate::genome::Genome;
use colony_core::{Direction, EconomyConfig, FamilyId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five organism kinds, without per-kind payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganismKind {
    Leaf,
    Root,
    Radio,
    Pipe,
    Newborn,
}

impl OrganismKind {
    /// Kinds a newborn can grow as a branch, in genome weight order
    pub const SPAWNABLE: [OrganismKind; 4] = [
        OrganismKind::Leaf,
        OrganismKind::Root,
        OrganismKind::Radio,
        OrganismKind::Newborn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OrganismKind::Leaf => "leaf",
            OrganismKind::Root => "root",
            OrganismKind::Radio => "radio",
            OrganismKind::Pipe => "pipe",
            OrganismKind::Newborn => "newborn",
        }
    }
}

impl fmt::Display for OrganismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific part of an organism. Only newborns carry a genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Body {
    Leaf,
    Root,
    Radio,
    Pipe,
    Newborn(Genome),
}

impl Body {
    pub fn kind(&self) -> OrganismKind {
        match self {
            Body::Leaf => OrganismKind::Leaf,
            Body::Root => OrganismKind::Root,
            Body::Radio => OrganismKind::Radio,
            Body::Pipe => OrganismKind::Pipe,
            Body::Newborn(_) => OrganismKind::Newborn,
        }
    }

    /// Body for a drawn branch kind; `genome` is only called for newborns
    pub fn for_kind(kind: OrganismKind, genome: impl FnOnce() -> Genome) -> Self {
        match kind {
            OrganismKind::Leaf => Body::Leaf,
            OrganismKind::Root => Body::Root,
            OrganismKind::Radio => Body::Radio,
            OrganismKind::Pipe => Body::Pipe,
            OrganismKind::Newborn => Body::Newborn(genome()),
        }
    }
}

/// An organism occupying one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub family: FamilyId,
    pub facing: Direction,
    pub age: u32,
    pub max_lifespan: f64,
    pub energy: f64,
    pub body: Body,
}

impl Organism {
    /// A family founder placed by world initialization
    pub fn founder(
        family: FamilyId,
        facing: Direction,
        genome: Genome,
        economy: &EconomyConfig,
    ) -> Self {
        Self {
            family,
            facing,
            age: 0,
            max_lifespan: economy.founder_lifespan,
            energy: economy.founder_energy,
            body: Body::Newborn(genome),
        }
    }

    /// An organism grown by a newborn with `share` of its energy
    pub fn offspring(
        body: Body,
        family: FamilyId,
        facing: Direction,
        share: f64,
        economy: &EconomyConfig,
    ) -> Self {
        Self {
            family,
            facing,
            age: 0,
            max_lifespan: Self::lifespan_for(share, economy.lifespan_constant),
            energy: share,
            body,
        }
    }

    /// Max lifespan granted for a starting energy: `exp(energy) * constant`
    pub fn lifespan_for(energy: f64, constant: f64) -> f64 {
        energy.exp() * constant
    }

    pub fn kind(&self) -> OrganismKind {
        self.body.kind()
    }

    pub fn is(&self, kind: OrganismKind) -> bool {
        self.kind() == kind
    }

    pub fn genome(&self) -> Option<&Genome> {
        match &self.body {
            Body::Newborn(genome) => Some(genome),
            _ => None,
        }
    }

    pub fn tick(&mut self, increment: u32) {
        self.age = self.age.saturating_add(increment);
    }

    pub fn is_expired(&self) -> bool {
        self.age as f64 > self.max_lifespan
    }

    /// Whether this occupant refuses a newcomer owned by `owner`.
    ///
    /// Same-family occupants refuse their own kin; roots and pipes refuse everyone.
    /// `owner == None` is the ownerless placement a newborn uses on its own cell.
    pub fn refuses(&self, owner: Option<FamilyId>) -> bool {
        owner == Some(self.family) || matches!(self.kind(), OrganismKind::Root | OrganismKind::Pipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifespan_formula() {
        let economy = EconomyConfig::default();
        for share in [0.0, 1.0, 5.0] {
            let organism = Organism::offspring(
                Body::Newborn(Genome::new()),
                FamilyId(0),
                Direction::North,
                share,
                &economy,
            );
            assert!((organism.max_lifespan - share.exp() * 10.0).abs() < 1e-9);
            assert_eq!(organism.energy, share);
            assert_eq!(organism.age, 0);
        }
        assert_eq!(Organism::lifespan_for(0.0, 10.0), 10.0);
    }

    #[test]
    fn test_founder_defaults() {
        let economy = EconomyConfig::default();
        let founder = Organism::founder(FamilyId(2), Direction::East, Genome::new(), &economy);
        assert_eq!(founder.energy, 30.0);
        assert_eq!(founder.max_lifespan, 20.0);
        assert!(founder.is(OrganismKind::Newborn));
        assert!(founder.genome().is_some());
    }

    #[test]
    fn test_only_newborns_carry_genomes() {
        for kind in [
            OrganismKind::Leaf,
            OrganismKind::Root,
            OrganismKind::Radio,
            OrganismKind::Pipe,
        ] {
            let body = Body::for_kind(kind, Genome::new);
            assert_eq!(body.kind(), kind);
            let organism = Organism {
                family: FamilyId(0),
                facing: Direction::West,
                age: 0,
                max_lifespan: 1.0,
                energy: 0.0,
                body,
            };
            assert!(organism.genome().is_none());
        }
    }

    #[test]
    fn test_aging_and_expiry() {
        let economy = EconomyConfig::default();
        let mut leaf = Organism::offspring(Body::Leaf, FamilyId(0), Direction::South, 0.0, &economy);
        for _ in 0..10 {
            leaf.tick(1);
        }
        assert!(!leaf.is_expired());
        leaf.tick(1);
        assert!(leaf.is_expired());
    }

    #[test]
    fn test_refusal_rules() {
        let economy = EconomyConfig::default();
        let leaf = Organism::offspring(Body::Leaf, FamilyId(1), Direction::South, 1.0, &economy);
        assert!(leaf.refuses(Some(FamilyId(1))));
        assert!(!leaf.refuses(Some(FamilyId(2))));
        assert!(!leaf.refuses(None));

        let pipe = Organism::offspring(Body::Pipe, FamilyId(1), Direction::South, 1.0, &economy);
        assert!(pipe.refuses(Some(FamilyId(2))));
        assert!(pipe.refuses(None));

        let root = Organism::offspring(Body::Root, FamilyId(1), Direction::South, 1.0, &economy);
        assert!(root.refuses(Some(FamilyId(3))));
    }
}
