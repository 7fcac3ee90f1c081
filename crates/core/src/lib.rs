//! InMAP Reduced-Form Air Quality Model Core
//!
//! A reduced-complexity atmospheric chemical transport model: C1 builds a
//! variable-resolution horizontal grid from population/mortality/CTM
//! inputs, C2 advances concentrations on that grid to steady state, and C3
//! drives a source-receptor matrix by running many unit-emission cases
//! through C2 and regridding the results onto a fixed receptor grid.

pub mod config;
pub mod core_types;
pub mod ctm;
pub mod domain;
pub mod error;
pub mod grid;
pub mod mechanism;
pub mod numerics;
pub mod simulation;
pub mod sr;

pub use config::{EmissionUnits, RunConfig, SrSectionConfig, VarGridConfig};
pub use ctm::{CtmData, Field3};
pub use domain::{ConvergenceConfig, ConvergenceStatus, Domain, DomainManipulator, OutputSummary, SetTimestepCfl, SteadyStateConvergenceCheck};
pub use error::{InMapError, Result};
pub use grid::{AllocateEmissions, CensusPolygon, Cell, CellMet, GridBuilder, GridBuilderConfig, MortalityPolygon, NestConfig, Neighbors};
pub use mechanism::{Mechanism, SimpleChem};
pub use numerics::Calculations;
pub use simulation::run_to_steady_state;
pub use sr::{SrConfig, SrDriver, SrLookup, SrReader};
