//! `Chemistry`: delegate to the injected `Mechanism::step` per cell
//! (spec.md §4.2 "Chemistry", §9 "Mechanism as an interface abstraction").
//!
//! Chemistry is a pointwise transformation (no neighbor reads), so unlike
//! the transport sub-steps it mutates `cf` directly rather than going
//! through the snapshot/`update_cf` two-buffer helper.

use crate::domain::domain::Domain;
use crate::domain::manipulator::DomainManipulator;
use crate::error::Result;
use crate::mechanism::ChemistryInputs;
use crate::numerics::PARALLEL_THRESHOLD;
use rayon::prelude::*;

pub struct Chemistry;

impl DomainManipulator for Chemistry {
    fn name(&self) -> &'static str {
        "Chemistry"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let dt = domain.dt;
        let mechanism = domain.mechanism.clone();
        let step = |cell: &mut crate::grid::Cell| {
            let inputs = ChemistryInputs {
                so2_oxidation: cell.met.so2_oxidation,
                a_org_partitioning: cell.met.a_org_partitioning.value(),
                b_org_partitioning: cell.met.b_org_partitioning.value(),
                no_partitioning: cell.met.no_partitioning.value(),
                s_partitioning: cell.met.s_partitioning.value(),
                nh_partitioning: cell.met.nh_partitioning.value(),
            };
            mechanism.step(&mut cell.cf, dt, &inputs);
        };

        if domain.cells.len() < PARALLEL_THRESHOLD {
            domain.cells.iter_mut().for_each(step);
        } else {
            domain.cells.par_iter_mut().for_each(step);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, MicrogramsPerCubicMeter, Polygon, Rect, Seconds};
    use crate::grid::{Cell, Emissions};
    use crate::mechanism::SimpleChem;
    use std::sync::Arc;

    #[test]
    fn chemistry_step_conserves_family_mass() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let mut cell = Cell::new(0, poly, 0, Meters::new(1.0), 8);
        cell.cf[4] = MicrogramsPerCubicMeter::new(10.0);
        cell.met.s_partitioning = crate::core_types::Fraction::new(0.4);
        let mut domain = Domain::new(vec![cell], Arc::new(SimpleChem::new()), Emissions::default());
        domain.dt = Seconds::new(60.0);
        let total_before: f64 = domain.cells[0].cf.iter().map(|c| c.value()).sum();
        Chemistry.run(&mut domain).unwrap();
        let total_after: f64 = domain.cells[0].cf.iter().map(|c| c.value()).sum();
        assert!((total_before - total_after).abs() < 1e-9);
    }
}
