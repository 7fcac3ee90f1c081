//! `Domain`: the mutable aggregate a simulation run operates on (spec.md
//! §4.2 "Domain aggregate").

use crate::core_types::Seconds;
use crate::error::Result;
use crate::grid::{Cell, Emissions};
use crate::mechanism::Mechanism;
use std::sync::Arc;

/// Summary statistics for one species, produced by the `Output` manipulator.
#[derive(Debug, Clone, Copy)]
pub struct OutputSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// The live simulation state: an ordered cell list, the injected chemistry
/// mechanism, the attached (immutable) emissions, the current timestep, and
/// the three manipulator phases run in order (spec.md §9 "Polymorphism over
/// manipulators": Init once, Run until done, Cleanup once).
pub struct Domain {
    pub cells: Vec<Cell>,
    pub mechanism: Arc<dyn Mechanism>,
    pub emissions: Emissions,
    pub dt: Seconds,
    pub step: usize,
    pub converged: bool,
    pub last_output: Option<Vec<OutputSummary>>,

    pub init: Vec<Box<dyn DomainManipulator>>,
    pub run: Vec<Box<dyn DomainManipulator>>,
    pub cleanup: Vec<Box<dyn DomainManipulator>>,
}

use crate::domain::manipulator::DomainManipulator;

impl Domain {
    #[must_use]
    pub fn new(cells: Vec<Cell>, mechanism: Arc<dyn Mechanism>, emissions: Emissions) -> Self {
        Domain {
            cells,
            mechanism,
            emissions,
            dt: Seconds::new(1.0),
            step: 0,
            converged: false,
            last_output: None,
            init: Vec::new(),
            run: Vec::new(),
            cleanup: Vec::new(),
        }
    }

    /// Run every `init` manipulator once, in order (spec.md §9). Takes the
    /// phase list out of `self` for the duration so each manipulator can
    /// mutably borrow the rest of `Domain` without an aliasing conflict.
    pub fn run_init(&mut self) -> Result<()> {
        let phase = std::mem::take(&mut self.init);
        let result = run_phase(&phase, self);
        self.init = phase;
        result
    }

    /// Run every `run` manipulator once (one simulation step).
    pub fn run_step(&mut self) -> Result<()> {
        let phase = std::mem::take(&mut self.run);
        let result = run_phase(&phase, self);
        self.run = phase;
        self.step += 1;
        result
    }

    /// Run every `cleanup` manipulator once, in order.
    pub fn run_cleanup(&mut self) -> Result<()> {
        let phase = std::mem::take(&mut self.cleanup);
        let result = run_phase(&phase, self);
        self.cleanup = phase;
        result
    }
}

fn run_phase(phase: &[Box<dyn DomainManipulator>], domain: &mut Domain) -> Result<()> {
    for manipulator in phase {
        manipulator.run(domain)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, Polygon, Rect};
    use crate::grid::Cell;
    use crate::mechanism::SimpleChem;

    fn one_cell_domain() -> Domain {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let cell = Cell::new(0, poly, 0, Meters::new(1.0), 8);
        Domain::new(vec![cell], Arc::new(SimpleChem::new()), Emissions::default())
    }

    #[test]
    fn phases_run_in_order_and_step_advances() {
        let mut domain = one_cell_domain();
        assert_eq!(domain.step, 0);
        domain.run_step().unwrap();
        assert_eq!(domain.step, 1);
    }
}
