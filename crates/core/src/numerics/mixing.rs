//! Vertical (Kzz eddy diffusion + ACM2 non-local `M2u`/`M2d`) and
//! horizontal (`Kxxyy`) mixing (spec.md §4.2 "Mixing").
//!
//! The ACM2 non-local term here only exchanges a ground cell with its
//! immediate `above` neighbors rather than InMAP's full-column transport
//! (every layer in one step) — a deliberate reduction given this crate
//! models neighbors, not a column structure; see DESIGN.md.

use crate::core_types::MicrogramsPerCubicMeter;
use crate::domain::domain::Domain;
use crate::domain::manipulator::DomainManipulator;
use crate::error::Result;
use crate::numerics::{neighbor_mean, snapshot_cf, update_cf};

pub struct Mixing;

impl DomainManipulator for Mixing {
    fn name(&self) -> &'static str {
        "Mixing"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let dt = domain.dt.value();
        let n_species = domain.mechanism.len();
        let snapshot = snapshot_cf(&domain.cells);
        update_cf(&mut domain.cells, &snapshot, |i, cell, snap| {
            let here_dz = cell.dz.value().max(1e-9);
            let mut out = snap[i].clone();
            for s in 0..n_species {
                let here = snap[i][s].value();
                let mut d = 0.0;

                if let Some(below_mean) = neighbor_mean(&cell.neighbors.below, s, snap) {
                    d += cell.met.kzz_below.value() * (below_mean - here) / (here_dz * here_dz);
                }
                if let Some(above_mean) = neighbor_mean(&cell.neighbors.above, s, snap) {
                    d += cell.met.kzz_above.value() * (above_mean - here) / (here_dz * here_dz);
                }

                // ACM2 non-local convective exchange, ground layer only.
                if cell.is_ground_level() && !cell.neighbors.above.is_empty() {
                    if let Some(above_mean) = neighbor_mean(&cell.neighbors.above, s, snap) {
                        d += cell.met.m2d.value() * above_mean - cell.met.m2u.value() * here;
                    }
                }

                let dx = cell.dx.value().max(1e-9);
                let dy = cell.dy.value().max(1e-9);
                if let Some(west_mean) = neighbor_mean(&cell.neighbors.west, s, snap) {
                    d += cell.met.kxxyy.value() * (west_mean - here) / (dx * dx);
                }
                if let Some(east_mean) = neighbor_mean(&cell.neighbors.east, s, snap) {
                    d += cell.met.kxxyy.value() * (east_mean - here) / (dx * dx);
                }
                if let Some(south_mean) = neighbor_mean(&cell.neighbors.south, s, snap) {
                    d += cell.met.kxxyy.value() * (south_mean - here) / (dy * dy);
                }
                if let Some(north_mean) = neighbor_mean(&cell.neighbors.north, s, snap) {
                    d += cell.met.kxxyy.value() * (north_mean - here) / (dy * dy);
                }

                out[s] = MicrogramsPerCubicMeter::new((here + d * dt).max(0.0));
            }
            out
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, MicrogramsPerCubicMeter as Conc, Polygon, Rect, SquareMetersPerSecond};
    use crate::grid::{Cell, Emissions, Neighbors};
    use crate::mechanism::SimpleChem;
    use std::sync::Arc;

    #[test]
    fn mixing_moves_mass_toward_neighbor_mean() {
        let poly0 = Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let poly1 = Polygon::from_rect(Rect::new(10.0, 0.0, 20.0, 10.0));
        let mut hi = Cell::new(0, poly0, 0, Meters::new(10.0), 1);
        let mut lo = Cell::new(1, poly1, 0, Meters::new(10.0), 1);
        hi.cf[0] = Conc::new(10.0);
        lo.cf[0] = Conc::new(0.0);
        hi.met.kxxyy = SquareMetersPerSecond::new(10.0);
        lo.met.kxxyy = SquareMetersPerSecond::new(10.0);
        hi.neighbors = Neighbors {
            east: vec![1],
            ..Default::default()
        };
        lo.neighbors = Neighbors {
            west: vec![0],
            ..Default::default()
        };
        let mut domain = Domain::new(vec![hi, lo], Arc::new(SimpleChem::new()), Emissions::default());
        domain.dt = crate::core_types::Seconds::new(1.0);
        Mixing.run(&mut domain).unwrap();
        assert!(domain.cells[0].cf[0].value() < 10.0);
        assert!(domain.cells[1].cf[0].value() > 0.0);
    }
}
