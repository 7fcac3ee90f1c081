//! `MeanderMixing`: subgrid-scale stochastic horizontal exchange (spec.md
//! §4.2 "Meander").
//!
//! Low wind speed means the mean-wind advection and `Kxxyy` diffusion
//! terms underestimate horizontal spread (the wind meanders on a
//! sub-timestep scale advection can't resolve). Each step, every cell
//! exchanges a small, wind-speed-scaled random fraction of its mass with
//! one randomly chosen same-layer neighbor; because the same draw moves
//! mass out of one cell and into another, total mass is conserved exactly
//! (unlike a per-cell additive noise term, which would not be). Grounded
//! in `fire-sim-core`'s use of `rand` for its stochastic ignition/ember
//! model, applied here to a mass-conserving exchange instead.

use crate::core_types::MicrogramsPerCubicMeter;
use crate::domain::domain::Domain;
use crate::domain::manipulator::DomainManipulator;
use crate::error::Result;
use rand::Rng;

pub struct MeanderMixing {
    /// Scales how much of a cell's mass can meander away per step at its
    /// slowest modeled wind speed.
    pub coefficient: f64,
}

impl MeanderMixing {
    #[must_use]
    pub fn new(coefficient: f64) -> Self {
        MeanderMixing { coefficient }
    }
}

impl DomainManipulator for MeanderMixing {
    fn name(&self) -> &'static str {
        "MeanderMixing"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let n_species = domain.mechanism.len();
        let mut rng = rand::rng();
        for row in 0..domain.cells.len() {
            let same_layer_neighbors: Vec<usize> = {
                let cell = &domain.cells[row];
                [&cell.neighbors.west, &cell.neighbors.east, &cell.neighbors.south, &cell.neighbors.north]
                    .into_iter()
                    .flatten()
                    .copied()
                    .collect()
            };
            if same_layer_neighbors.is_empty() {
                continue;
            }
            let target = same_layer_neighbors[rng.random_range(0..same_layer_neighbors.len())];
            if target == row {
                continue;
            }

            // Meander strengthens at low wind speed: WindSpeedMinusThird
            // blows up as wind -> 0, so clamp it before scaling.
            let meander_strength = (self.coefficient * domain.cells[row].met.wind_speed_minus_third.min(10.0)).clamp(0.0, 0.2);

            for s in 0..n_species {
                let moved = domain.cells[row].cf[s].value() * meander_strength;
                if moved <= 0.0 {
                    continue;
                }
                domain.cells[row].cf[s] = MicrogramsPerCubicMeter::new(domain.cells[row].cf[s].value() - moved);
                domain.cells[target].cf[s] = MicrogramsPerCubicMeter::new(domain.cells[target].cf[s].value() + moved);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, MicrogramsPerCubicMeter as Conc, Polygon, Rect};
    use crate::grid::{Cell, Emissions, Neighbors};
    use crate::mechanism::SimpleChem;
    use std::sync::Arc;

    #[test]
    fn meander_conserves_total_mass() {
        let poly0 = Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let poly1 = Polygon::from_rect(Rect::new(10.0, 0.0, 20.0, 10.0));
        let mut a = Cell::new(0, poly0, 0, Meters::new(10.0), 2);
        let mut b = Cell::new(1, poly1, 0, Meters::new(10.0), 2);
        a.cf[0] = Conc::new(10.0);
        b.cf[0] = Conc::new(2.0);
        a.met.wind_speed_minus_third = 1.0;
        b.met.wind_speed_minus_third = 1.0;
        a.neighbors = Neighbors { east: vec![1], ..Default::default() };
        b.neighbors = Neighbors { west: vec![0], ..Default::default() };
        let mut domain = Domain::new(vec![a, b], Arc::new(SimpleChem::new()), Emissions::default());
        let total_before: f64 = domain.cells.iter().flat_map(|c| c.cf.iter()).map(|c| c.value()).sum();
        MeanderMixing::new(0.01).run(&mut domain).unwrap();
        let total_after: f64 = domain.cells.iter().flat_map(|c| c.cf.iter()).map(|c| c.value()).sum();
        assert!((total_before - total_after).abs() < 1e-9);
    }
}
