//! Per-family metadata owned by the grid.

use crate::genome::Genome;
use colony_core::{FamilyId, FamilyStats};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Metadata for one family, indexed by family id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: FamilyId,
    /// Display color handed to renderers
    pub color: [u8; 3],
    /// Genome the founder started with
    pub founder_genome: Genome,
    pub stats: FamilyStats,
}

impl Family {
    pub fn new<R: Rng + ?Sized>(id: FamilyId, founder_genome: Genome, rng: &mut R) -> Self {
        Self {
            id,
            color: [rng.gen(), rng.gen(), rng.gen()],
            founder_genome,
            stats: FamilyStats::new(),
        }
    }
}
