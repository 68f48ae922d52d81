//! World simulation engine.
//!
//! A toroidal grid of resource cells where organism families grow, feed on each
//! other, and die back. [`SimulationClock`] drives a [`Grid`] one tick at a time.

pub mod behavior;
pub mod cell;
pub mod family;
pub mod genome;
pub mod grid;
pub mod observer;
pub mod organism;
pub mod simulation;
pub mod snapshot;

pub use behavior::{BuildMode, Outcome};
pub use cell::ResourceCell;
pub use family::Family;
pub use genome::{Genome, Trait};
pub use grid::Grid;
pub use observer::TickObserver;
pub use organism::{Body, Organism, OrganismKind};
pub use simulation::{RunReport, SimulationClock};
pub use snapshot::GridSnapshot;
