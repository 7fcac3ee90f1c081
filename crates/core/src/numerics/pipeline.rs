//! `Calculations`: the fixed per-step numerics pipeline (spec.md §4.2
//! "one step applies, in order: advection, mixing, meander, deposition,
//! chemistry, then emissions flux").

use crate::domain::domain::Domain;
use crate::domain::manipulator::DomainManipulator;
use crate::error::{InMapError, Result};
use crate::numerics::advection::Advection;
use crate::numerics::chemistry::Chemistry;
use crate::numerics::deposition::{DryDeposition, WetDeposition};
use crate::numerics::emissions_flux::AddEmissionsFlux;
use crate::numerics::meander::MeanderMixing;
use crate::numerics::mixing::Mixing;

pub struct Calculations {
    steps: Vec<Box<dyn DomainManipulator>>,
}

impl Calculations {
    #[must_use]
    pub fn new(meander_coefficient: f64) -> Self {
        Calculations {
            steps: vec![
                Box::new(Advection),
                Box::new(Mixing),
                Box::new(MeanderMixing::new(meander_coefficient)),
                Box::new(DryDeposition),
                Box::new(WetDeposition),
                Box::new(Chemistry),
                Box::new(AddEmissionsFlux),
            ],
        }
    }
}

impl DomainManipulator for Calculations {
    fn name(&self) -> &'static str {
        "Calculations"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        for step in &self.steps {
            step.run(domain)?;
        }
        if let Some(cell) = domain.cells.iter().find(|c| c.first_divergent_species().is_some()) {
            let species = cell.first_divergent_species().unwrap();
            return Err(InMapError::NumericDivergence {
                cell: cell.row,
                species,
                value: cell.cf[species].value(),
            });
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
    fn calculations_runs_every_sub_step_without_diverging() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut cell = Cell::new(0, poly, 0, Meters::new(10.0), 8);
        cell.emis_flux[0] = MicrogramsPerCubicMeterPerSecond::new(0.1);
        let mut domain = Domain::new(vec![cell], Arc::new(SimpleChem::new()), Emissions::default());
        domain.dt = Seconds::new(1.0);
        let calc = Calculations::new(0.01);
        calc.run(&mut domain).unwrap();
        assert!(domain.cells[0].cf[0].value() > 0.0);
    }
}
