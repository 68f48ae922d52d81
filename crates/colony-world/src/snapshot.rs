//! Serializable copy of a grid for renderers and replay tooling.

use crate::cell::ResourceCell;
use crate::family::Family;
use crate::grid::Grid;
use crate::organism::OrganismKind;
use colony_core::{Error, FamilyId, Position, Result};
use serde::{Deserialize, Serialize};

/// Everything a renderer needs to draw one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub tick: u64,
    pub day: u64,
    pub light: f64,
    pub width: i32,
    pub height: i32,
    /// Display size of one cell, in pixels
    pub cell_pitch: i32,
    pub cells: Vec<ResourceCell>,
    pub families: Vec<Family>,
}

impl GridSnapshot {
    /// Serialize snapshot to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize and check that the cell list matches the dimensions
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self =
            bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::InvalidState(format!(
                "snapshot has non-positive size {}x{}",
                self.width, self.height
            )));
        }
        let expected = (self.width as usize) * (self.height as usize);
        if self.cells.len() != expected {
            return Err(Error::InvalidState(format!(
                "snapshot holds {} cells, expected {}",
                self.cells.len(),
                expected
            )));
        }
        Ok(())
    }

    pub fn cell(&self, pos: Position) -> Option<&ResourceCell> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        self.cells.get((pos.y * self.width + pos.x) as usize)
    }

    /// Family and kind at a position, if occupied
    pub fn occupant_at(&self, pos: Position) -> Option<(FamilyId, OrganismKind)> {
        self.cell(pos)?
            .occupant()
            .map(|organism| (organism.family, organism.kind()))
    }

    /// Display color for the occupant at `pos`
    pub fn color_at(&self, pos: Position) -> Option<[u8; 3]> {
        let (family, _) = self.occupant_at(pos)?;
        self.families.get(family.index()).map(|f| f.color)
    }
}

impl Grid {
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            tick: self.tick(),
            day: self.day(),
            light: self.light(),
            width: self.width,
            height: self.height,
            cell_pitch: self.cell_pitch(),
            cells: self.iter().cloned().collect(),
            families: self.families().to_vec(),
        }
    }
}
