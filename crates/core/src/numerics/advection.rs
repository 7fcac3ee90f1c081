//! Upwind advection using the six split wind-speed fields (spec.md §4.2
//! "Advection", §6 `UPlusSpeed`/`UMinusSpeed`/...).
//!
//! Wind is pre-split into a "plus" (eastward/northward/upward) and "minus"
//! (westward/southward/downward) component so the scheme never needs a
//! runtime sign check: the plus field always carries mass from a cell's
//! lower-index neighbor (west/south/below) into it and out to its
//! higher-index neighbor (east/north/above); the minus field the reverse.

use crate::core_types::MicrogramsPerCubicMeter;
use crate::domain::domain::Domain;
use crate::domain::manipulator::DomainManipulator;
use crate::error::Result;
use crate::grid::Cell;
use crate::numerics::{snapshot_cf, update_cf};

pub struct Advection;

impl DomainManipulator for Advection {
    fn name(&self) -> &'static str {
        "Advection"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let dt = domain.dt.value();
        let snapshot = snapshot_cf(&domain.cells);
        let n_species = domain.mechanism.len();
        update_cf(&mut domain.cells, &snapshot, |i, cell, snap| {
            advect_one_cell(i, cell, snap, n_species, dt)
        });
        Ok(())
    }
}

fn advect_one_cell(
    i: usize,
    cell: &Cell,
    snapshot: &[Vec<MicrogramsPerCubicMeter>],
    n_species: usize,
    dt: f64,
) -> Vec<MicrogramsPerCubicMeter> {
    let dx = cell.dx.value().max(1e-9);
    let dy = cell.dy.value().max(1e-9);
    let dz = cell.dz.value().max(1e-9);

    let mut out = snapshot[i].clone();
    for s in 0..n_species {
        let here = snapshot[i][s].value();
        let mut d = 0.0;

        d += directional_flux(&cell.neighbors.west, s, snapshot, here, cell.met.u_plus_speed.value(), dx);
        d -= here * cell.met.u_minus_speed.value() / dx * fraction(&cell.neighbors.west);
        d += directional_flux(&cell.neighbors.east, s, snapshot, here, cell.met.u_minus_speed.value(), dx);
        d -= here * cell.met.u_plus_speed.value() / dx * fraction(&cell.neighbors.east);

        d += directional_flux(&cell.neighbors.south, s, snapshot, here, cell.met.v_plus_speed.value(), dy);
        d -= here * cell.met.v_minus_speed.value() / dy * fraction(&cell.neighbors.south);
        d += directional_flux(&cell.neighbors.north, s, snapshot, here, cell.met.v_minus_speed.value(), dy);
        d -= here * cell.met.v_plus_speed.value() / dy * fraction(&cell.neighbors.north);

        d += directional_flux(&cell.neighbors.below, s, snapshot, here, cell.met.w_plus_speed.value(), dz);
        d -= here * cell.met.w_minus_speed.value() / dz * fraction(&cell.neighbors.below);
        d += directional_flux(&cell.neighbors.above, s, snapshot, here, cell.met.w_minus_speed.value(), dz);
        d -= here * cell.met.w_plus_speed.value() / dz * fraction(&cell.neighbors.above);

        out[s] = MicrogramsPerCubicMeter::new((here + d * dt).max(0.0));
    }
    out
}

/// Inbound flux from `neighbors`, averaged when more than one neighbor
/// shares the side (variable-resolution boundary).
fn directional_flux(
    neighbors: &[usize],
    species: usize,
    snapshot: &[Vec<MicrogramsPerCubicMeter>],
    _here: f64,
    speed: f64,
    length: f64,
) -> f64 {
    if neighbors.is_empty() {
        return 0.0;
    }
    let mean: f64 = neighbors.iter().map(|&r| snapshot[r][species].value()).sum::<f64>() / neighbors.len() as f64;
    mean * speed / length
}

fn fraction(neighbors: &[usize]) -> f64 {
    if neighbors.is_empty() {
        0.0
    } else {
        1.0
    }
}
