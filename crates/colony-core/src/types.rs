//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a family (a lineage grown from one founder)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FamilyId(pub u16);

impl FamilyId {
    /// Slot of this family in per-family tables
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "family-{}", self.0)
    }
}

/// Unique identifier for a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 2D position in cell units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Apply toroidal wrapping for given world dimensions
    pub fn wrap(&self, width: i32, height: i32) -> Self {
        Self {
            x: ((self.x % width) + width) % width,
            y: ((self.y % height) + height) % height,
        }
    }

    /// One cell in `direction`, wrapped onto a `width` x `height` torus
    pub fn step(&self, direction: Direction, width: i32, height: i32) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy).wrap(width, height)
    }
}

/// Facing of an organism.
///
/// The variants are listed in clockwise order; turning left or right walks
/// that cycle, so `West.turn_left()` is `South` and `South.turn_right()` is `West`.
/// Screen coordinates are used: `North` decreases `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    West,
    North,
    East,
    South,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::West => (-1, 0),
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
        }
    }

    pub fn all() -> [Direction; 4] {
        [
            Direction::West,
            Direction::North,
            Direction::East,
            Direction::South,
        ]
    }

    /// Direction for a cyclic index; any `usize` is accepted
    pub fn from_index(index: usize) -> Self {
        Self::all()[index % 4]
    }

    pub fn index(self) -> usize {
        match self {
            Direction::West => 0,
            Direction::North => 1,
            Direction::East => 2,
            Direction::South => 3,
        }
    }

    pub fn turn_left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn turn_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }
}
