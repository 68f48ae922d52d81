//! Per-position resource state.

use crate::organism::{Organism, OrganismKind};
use colony_core::{EconomyConfig, Position};
use serde::{Deserialize, Serialize};

/// Energy levels drift into `[ENERGY_BAND_LOW, ENERGY_BAND_HIGH]`
pub const ENERGY_BAND_LOW: f64 = 0.2;
pub const ENERGY_BAND_HIGH: f64 = 0.3;
/// Per-tick drift step toward the band
pub const ENERGY_DRIFT_STEP: f64 = 0.005;

/// One grid cell: at most one organism plus the two resource levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCell {
    pub position: Position,
    pub organic: f64,
    pub energy: f64,
    occupant: Option<Organism>,
}

impl ResourceCell {
    pub fn new(position: Position, organic: f64, energy: f64) -> Self {
        Self {
            position,
            organic,
            energy,
            occupant: None,
        }
    }

    pub fn occupant(&self) -> Option<&Organism> {
        self.occupant.as_ref()
    }

    pub fn occupant_mut(&mut self) -> Option<&mut Organism> {
        self.occupant.as_mut()
    }

    pub fn occupant_kind(&self) -> Option<OrganismKind> {
        self.occupant.as_ref().map(Organism::kind)
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Put `organism` here, returning whatever was displaced
    pub fn set_occupant(&mut self, organism: Organism) -> Option<Organism> {
        self.occupant.replace(organism)
    }

    /// Clear the cell without touching its resource levels
    pub fn take_occupant(&mut self) -> Option<Organism> {
        self.occupant.take()
    }

    /// Kill the occupant, returning its remains to the soil and the air
    pub fn kill_occupant(&mut self, economy: &EconomyConfig) -> Option<Organism> {
        let victim = self.occupant.take()?;
        self.organic += economy.soil_released;
        self.energy += economy.energy_released;
        Some(victim)
    }

    /// Whether the cell's levels forbid an organism of `kind` living here
    pub fn is_toxic_for(&self, kind: OrganismKind, economy: &EconomyConfig) -> bool {
        (kind != OrganismKind::Radio && self.energy > economy.energy_threshold)
            || (kind != OrganismKind::Root && self.organic > economy.organic_threshold)
    }

    /// Nudge the energy level one step toward the equilibrium band
    pub fn drift_energy(&mut self) {
        if self.energy > ENERGY_BAND_HIGH {
            self.energy -= ENERGY_DRIFT_STEP;
        } else if self.energy < ENERGY_BAND_LOW {
            self.energy += ENERGY_DRIFT_STEP;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organism::Body;
    use colony_core::{Direction, FamilyId};

    fn leaf() -> Organism {
        Organism::offspring(
            Body::Leaf,
            FamilyId(0),
            Direction::North,
            1.0,
            &EconomyConfig::default(),
        )
    }

    #[test]
    fn test_kill_releases_remains() {
        let economy = EconomyConfig::default();
        let mut cell = ResourceCell::new(Position::new(0, 0), 0.1, 0.1);
        assert!(cell.kill_occupant(&economy).is_none());
        assert_eq!(cell.organic, 0.1);

        cell.set_occupant(leaf());
        let victim = cell.kill_occupant(&economy);
        assert_eq!(victim.map(|o| o.kind()), Some(OrganismKind::Leaf));
        assert!(!cell.is_occupied());
        assert!((cell.organic - 0.101).abs() < 1e-12);
        assert!((cell.energy - 0.101).abs() < 1e-12);
    }

    #[test]
    fn test_toxicity_per_kind() {
        let economy = EconomyConfig::default();
        let energetic = ResourceCell::new(Position::new(0, 0), 0.0, 0.9);
        assert!(!energetic.is_toxic_for(OrganismKind::Radio, &economy));
        for kind in [
            OrganismKind::Leaf,
            OrganismKind::Root,
            OrganismKind::Pipe,
            OrganismKind::Newborn,
        ] {
            assert!(energetic.is_toxic_for(kind, &economy));
        }

        let organic = ResourceCell::new(Position::new(0, 0), 0.9, 0.0);
        assert!(!organic.is_toxic_for(OrganismKind::Root, &economy));
        assert!(organic.is_toxic_for(OrganismKind::Radio, &economy));
        assert!(organic.is_toxic_for(OrganismKind::Newborn, &economy));
    }

    #[test]
    fn test_energy_drift_converges() {
        let mut high = ResourceCell::new(Position::new(0, 0), 0.0, 0.9);
        let mut low = ResourceCell::new(Position::new(0, 0), 0.0, 0.0);
        let mut previous = (high.energy, low.energy);
        for _ in 0..500 {
            high.drift_energy();
            low.drift_energy();
            assert!(high.energy <= previous.0);
            assert!(low.energy >= previous.1);
            previous = (high.energy, low.energy);
        }
        assert!(high.energy <= ENERGY_BAND_HIGH && high.energy > ENERGY_BAND_HIGH - ENERGY_DRIFT_STEP);
        assert!(low.energy >= ENERGY_BAND_LOW && low.energy < ENERGY_BAND_LOW + ENERGY_DRIFT_STEP);
    }
}
