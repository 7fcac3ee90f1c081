//! The steady-state simulation core (spec.md "C2 Steady-State Simulation
//! Core"): the `Domain` aggregate, pluggable `DomainManipulator` phases,
//! the CFL timestep rule, and the convergence monitor.

pub mod cfl;
pub mod convergence;
pub mod domain;
pub mod manipulator;

pub use cfl::SetTimestepCfl;
pub use convergence::{ConvergenceConfig, ConvergenceStatus, SteadyStateConvergenceCheck};
pub use domain::{Domain, OutputSummary};
pub use manipulator::{DomainManipulator, Log, Output, RunPeriodically};
