//! Per-step numerics (spec.md "C2 Steady-State Simulation Core" §4.2):
//! advection, mixing, meander, deposition, chemistry, and emissions flux,
//! each a `DomainManipulator` run in sequence by `Calculations`.
//!
//! Every sub-step reads a read-only snapshot of `Cf` taken at the start of
//! the sub-step and writes the result back into `Cell::cf`, mirroring
//! `fire-sim-core::solver::cpu::CpuFieldSolver`'s `temperature`/
//! `temperature_back` two-buffer scheme: neighbor reads must never observe
//! a value already updated by this same sub-step. Cells at or above
//! `PARALLEL_THRESHOLD` are updated with rayon (chunked via
//! `with_min_len`, the same knob `CpuFieldSolver::update_diffusion` tunes);
//! below it the per-cell overhead of spinning up the thread pool is not
//! worth it.

pub mod advection;
pub mod chemistry;
pub mod deposition;
pub mod emissions_flux;
pub mod meander;
pub mod mixing;
pub mod pipeline;

pub use pipeline::Calculations;

use crate::core_types::MicrogramsPerCubicMeter;
use crate::grid::Cell;
use rayon::prelude::*;

/// Below this cell count, a sequential loop beats rayon's dispatch
/// overhead (grounded in `CpuFieldSolver::PARALLEL_THRESHOLD`).
pub const PARALLEL_THRESHOLD: usize = 256;
const CHUNK_SIZE: usize = 64;

/// Snapshot every cell's current `cf`, the read-only "back buffer" each
/// sub-step's neighbor lookups use.
#[must_use]
pub fn snapshot_cf(cells: &[Cell]) -> Vec<Vec<MicrogramsPerCubicMeter>> {
    cells.iter().map(|c| c.cf.clone()).collect()
}

/// Replace every cell's `cf` with `f(index, cell, snapshot)`, run serially
/// or in parallel depending on `cells.len()`.
pub fn update_cf<F>(cells: &mut [Cell], snapshot: &[Vec<MicrogramsPerCubicMeter>], f: F)
where
    F: Fn(usize, &Cell, &[Vec<MicrogramsPerCubicMeter>]) -> Vec<MicrogramsPerCubicMeter> + Sync,
{
    if cells.len() < PARALLEL_THRESHOLD {
        for (i, cell) in cells.iter_mut().enumerate() {
            cell.cf = f(i, cell, snapshot);
        }
    } else {
        cells
            .par_iter_mut()
            .with_min_len(CHUNK_SIZE)
            .enumerate()
            .for_each(|(i, cell)| {
                cell.cf = f(i, cell, snapshot);
            });
    }
}

/// Mean of `values` at `neighbor_rows`' `species` slot in `snapshot`, or
/// `None` if there are no neighbors on that side.
#[must_use]
pub fn neighbor_mean(
    neighbor_rows: &[usize],
    species: usize,
    snapshot: &[Vec<MicrogramsPerCubicMeter>],
) -> Option<f64> {
    if neighbor_rows.is_empty() {
        return None;
    }
    let sum: f64 = neighbor_rows.iter().map(|&r| snapshot[r][species].value()).sum();
    Some(sum / neighbor_rows.len() as f64)
}
