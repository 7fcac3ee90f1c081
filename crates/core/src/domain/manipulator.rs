//! `DomainManipulator`: the manipulator-as-variant abstraction (spec.md §9
//! "Polymorphism over manipulators").
//!
//! Grounded in `fire-sim-core`'s `FieldSolver` trait (one capability,
//! multiple interchangeable implementations selected at setup time rather
//! than matched on at every call site) but generalized from "choose a
//! backend" to "compose an ordered pipeline": a `Domain` holds three
//! `Vec<Box<dyn DomainManipulator>>` phases (Init, Run, Cleanup) built up
//! from whichever concrete manipulators a caller wants, in whatever order.
//!
//! `RegularGrid` and `MutateGrid` (spec.md's grid-phase manipulator names)
//! are not implemented as `DomainManipulator`s here: they operate before a
//! `Domain` exists (`GridBuilder::build`) or need extra per-call arguments
//! a uniform `run(&Domain)` signature can't carry (`MutateGrid::split`'s
//! target row and factor), so callers invoke them directly. `Load`/`Save`/
//! `HTMLUI` are persistence and UI concerns outside this crate's scope
//! (spec.md Non-goals) and are left to external glue code; `SrConfig`
//! NetCDF I/O lives in the `sr` module instead of as a manipulator.

use crate::domain::domain::{Domain, OutputSummary};
use crate::error::Result;
use tracing::info;

/// One step of a simulation pipeline, composed into `Domain::{init,run,
/// cleanup}`.
pub trait DomainManipulator: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, domain: &mut Domain) -> Result<()>;
}

/// Wrap another manipulator so it only runs every `every` steps (spec.md §9
/// `RunPeriodically`).
pub struct RunPeriodically {
    pub every: usize,
    pub inner: Box<dyn DomainManipulator>,
}

impl RunPeriodically {
    #[must_use]
    pub fn new(every: usize, inner: Box<dyn DomainManipulator>) -> Self {
        RunPeriodically {
            every: every.max(1),
            inner,
        }
    }
}

impl DomainManipulator for RunPeriodically {
    fn name(&self) -> &'static str {
        "RunPeriodically"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        if domain.step % self.every == 0 {
            self.inner.run(domain)
        } else {
            Ok(())
        }
    }
}

/// Structured progress logging (spec.md §9 `Log`), via `tracing` rather
/// than a hand-rolled writer.
pub struct Log;

impl DomainManipulator for Log {
    fn name(&self) -> &'static str {
        "Log"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        info!(
            step = domain.step,
            dt_s = domain.dt.value(),
            converged = domain.converged,
            cells = domain.cells.len(),
            "simulation step"
        );
        Ok(())
    }
}

/// Per-species mean/min/max summary over every cell, stashed on `Domain`
/// for the caller to read back (spec.md §9 `Output`).
pub struct Output;

impl DomainManipulator for Output {
    fn name(&self) -> &'static str {
        "Output"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let n_species = domain.mechanism.len();
        let mut summaries = Vec::with_capacity(n_species);
        for s in 0..n_species {
            let mut mean = 0.0;
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for cell in &domain.cells {
                let v = cell.cf[s].value();
                mean += v;
                min = min.min(v);
                max = max.max(v);
            }
            if !domain.cells.is_empty() {
                mean /= domain.cells.len() as f64;
            }
            summaries.push(OutputSummary { mean, min, max });
        }
        domain.last_output = Some(summaries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, Polygon, Rect};
    use crate::grid::{Cell, Emissions};
    use crate::mechanism::SimpleChem;
    use std::sync::Arc;

    fn one_cell_domain() -> Domain {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let cell = Cell::new(0, poly, 0, Meters::new(1.0), 8);
        Domain::new(vec![cell], Arc::new(SimpleChem::new()), Emissions::default())
    }

    #[test]
    fn run_periodically_skips_intermediate_steps() {
        let mut domain = one_cell_domain();
        domain.step = 1;
        let wrapped = RunPeriodically::new(3, Box::new(Output));
        wrapped.run(&mut domain).unwrap();
        assert!(domain.last_output.is_none());
        domain.step = 3;
        wrapped.run(&mut domain).unwrap();
        assert!(domain.last_output.is_some());
    }

    #[test]
    fn output_summarizes_every_species() {
        let mut domain = one_cell_domain();
        Output.run(&mut domain).unwrap();
        assert_eq!(domain.last_output.unwrap().len(), domain.mechanism.len());
    }
}
