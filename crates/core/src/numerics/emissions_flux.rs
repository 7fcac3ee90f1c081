//! `AddEmissionsFlux`: apply each cell's standing emissions flux for one
//! timestep (spec.md §4.2 "`Cf[i] += EmisFlux[i] * dt`").

use crate::core_types::MicrogramsPerCubicMeter;
use crate::domain::domain::Domain;
use crate::domain::manipulator::DomainManipulator;
use crate::error::Result;
use crate::numerics::PARALLEL_THRESHOLD;
use rayon::prelude::*;

pub struct AddEmissionsFlux;

impl DomainManipulator for AddEmissionsFlux {
    fn name(&self) -> &'static str {
        "AddEmissionsFlux"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let dt = domain.dt.value();
        let add_flux = |cell: &mut crate::grid::Cell| {
            for (c, flux) in cell.cf.iter_mut().zip(cell.emis_flux.iter()) {
                *c = MicrogramsPerCubicMeter::new(c.value() + flux.value() * dt);
            }
        };
        if domain.cells.len() < PARALLEL_THRESHOLD {
            domain.cells.iter_mut().for_each(add_flux);
        } else {
            domain.cells.par_iter_mut().for_each(add_flux);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, MicrogramsPerCubicMeterPerSecond, Polygon, Rect, Seconds};
    use crate::grid::{Cell, Emissions};
    use crate::mechanism::SimpleChem;
    use std::sync::Arc;

    #[test]
    fn flux_accumulates_over_dt() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let mut cell = Cell::new(0, poly, 0, Meters::new(1.0), 1);
        cell.emis_flux[0] = MicrogramsPerCubicMeterPerSecond::new(0.5);
        let mut domain = Domain::new(vec![cell], Arc::new(SimpleChem::new()), Emissions::default());
        domain.dt = Seconds::new(10.0);
        AddEmissionsFlux.run(&mut domain).unwrap();
        assert!((domain.cells[0].cf[0].value() - 5.0).abs() < 1e-9);
    }
}
