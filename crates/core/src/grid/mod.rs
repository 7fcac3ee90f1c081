//! The variable-resolution grid engine (spec.md "C1 Variable-Resolution
//! Grid Engine"): cell representation, nest model, construction, run-time
//! mutation, and emissions allocation.

pub mod builder;
pub mod cell;
pub mod emissions;
pub mod mutator;
pub mod nest;

pub use builder::{CensusPolygon, GridBuilder, GridBuilderConfig, MortalityPolygon};
pub use cell::{Cell, CellMet, Neighbors};
pub use emissions::{AllocateEmissions, Emissions, EmissionsRecord};
pub use mutator::{pop_conc_mutator_fires, population_mutator_fires, MutateGrid};
pub use nest::{NestConfig, NestIndex};
