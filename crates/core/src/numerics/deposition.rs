//! Dry and wet deposition (spec.md §4.2 "Deposition").
//!
//! `DryDeposition` only removes mass from ground-level cells (it models
//! surface uptake); `WetDeposition` applies to every layer (rain falls
//! through the whole column). Both are driven by the `Mechanism`'s
//! species-to-field mapping so the numerics stay chemistry-agnostic.

use crate::core_types::MicrogramsPerCubicMeter;
use crate::domain::domain::Domain;
use crate::domain::manipulator::DomainManipulator;
use crate::error::Result;
use crate::grid::Cell;
use crate::mechanism::{DryDepSpecies, WetDepSpecies};
use crate::numerics::{snapshot_cf, update_cf};

pub struct DryDeposition;

impl DomainManipulator for DryDeposition {
    fn name(&self) -> &'static str {
        "DryDeposition"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let dt = domain.dt.value();
        let mechanism = domain.mechanism.clone();
        let indices = mechanism.dry_dep_indices().to_vec();
        let snapshot = snapshot_cf(&domain.cells);
        update_cf(&mut domain.cells, &snapshot, |i, cell, snap| {
            let mut out = snap[i].clone();
            if cell.is_ground_level() {
                for &(species, field) in &indices {
                    let vd = dry_dep_velocity(cell, field);
                    let rate = vd / cell.dz.value().max(1e-9);
                    out[species] = decay(out[species], rate, dt);
                }
            }
            out
        });
        Ok(())
    }
}

fn dry_dep_velocity(cell: &Cell, field: DryDepSpecies) -> f64 {
    match field {
        DryDepSpecies::Particle => cell.met.particle_dry_dep.value(),
        DryDepSpecies::So2 => cell.met.so2_dry_dep.value(),
        DryDepSpecies::Nox => cell.met.nox_dry_dep.value(),
        DryDepSpecies::Nh3 => cell.met.nh3_dry_dep.value(),
        DryDepSpecies::Voc => cell.met.voc_dry_dep.value(),
    }
}

pub struct WetDeposition;

impl DomainManipulator for WetDeposition {
    fn name(&self) -> &'static str {
        "WetDeposition"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let dt = domain.dt.value();
        let mechanism = domain.mechanism.clone();
        let indices = mechanism.wet_dep_indices().to_vec();
        let snapshot = snapshot_cf(&domain.cells);
        update_cf(&mut domain.cells, &snapshot, |i, cell, snap| {
            let mut out = snap[i].clone();
            for &(species, field) in &indices {
                let rate = wet_dep_rate(cell, field);
                out[species] = decay(out[species], rate, dt);
            }
            out
        });
        Ok(())
    }
}

fn wet_dep_rate(cell: &Cell, field: WetDepSpecies) -> f64 {
    match field {
        WetDepSpecies::Particle => cell.met.particle_wet_dep.value(),
        WetDepSpecies::So2 => cell.met.so2_wet_dep.value(),
        WetDepSpecies::OtherGas => cell.met.other_gas_wet_dep.value(),
    }
}

fn decay(c: MicrogramsPerCubicMeter, rate: f64, dt: f64) -> MicrogramsPerCubicMeter {
    MicrogramsPerCubicMeter::new((c.value() * (1.0 - rate * dt)).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, MetersPerSecond, MicrogramsPerCubicMeter, Polygon, Rect, Seconds};
    use crate::grid::{Cell, Emissions};
    use crate::mechanism::SimpleChem;
    use std::sync::Arc;

    #[test]
    fn s3_dry_deposition_matches_closed_form_single_step() {
        // spec.md §8 S3: flat ground cell, no advection/mixing, a single
        // dry-deposited species. Over one step, ΔCf = -vd/dz * Cf * dt.
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut cell = Cell::new(0, poly, 0, Meters::new(20.0), 4);
        cell.cf[1] = MicrogramsPerCubicMeter::new(8.0);
        cell.met.nox_dry_dep = MetersPerSecond::new(0.01);
        // Species 1 (pNO) is declared with a Nox dry-deposition velocity.
        let mechanism = Arc::new(SimpleChem::new());
        let mut domain = Domain::new(vec![cell], mechanism, Emissions::default());
        domain.dt = Seconds::new(100.0);
        DryDeposition.run(&mut domain).unwrap();

        let vd = 0.01;
        let dz = 20.0;
        let dt = 100.0;
        let expected = 8.0 * (1.0 - vd / dz * dt);
        assert!((domain.cells[0].cf[1].value() - expected).abs() < 1e-9);
    }

    #[test]
    fn dry_deposition_does_not_touch_upper_layers() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut cell = Cell::new(0, poly, 1, Meters::new(20.0), 4);
        cell.cf[1] = MicrogramsPerCubicMeter::new(8.0);
        cell.met.nox_dry_dep = MetersPerSecond::new(0.01);
        let mut domain = Domain::new(vec![cell], Arc::new(SimpleChem::new()), Emissions::default());
        domain.dt = Seconds::new(100.0);
        DryDeposition.run(&mut domain).unwrap();
        assert!((domain.cells[0].cf[1].value() - 8.0).abs() < 1e-12);
    }
}
