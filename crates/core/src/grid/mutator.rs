//! Run-time grid mutation: `PopConcMutator` criterion and `MutateGrid`
//! split/merge (spec.md §4.1 "Population/concentration mutator").
//!
//! Unlike `GridBuilder`'s construction-time `PopulationMutator` criterion
//! (grounded on demographic population alone, evaluated once against the
//! census polygons), this module runs against a live, already-built cell
//! list during simulation and only has each cell's already-aggregated
//! fields to work with — there is no raw census/CTM polygon available
//! to re-intersect. Intensive quantities (concentration, meteorology,
//! mortality rate) are therefore replicated or area-weighted across a
//! split/merge; only the extensive quantity (population) is redistributed
//! by area, preserving its sum (spec.md §8 P4).

use crate::core_types::{Polygon, Rect};
use crate::error::{InMapError, Result};
use crate::grid::builder::relink_neighbors;
use crate::grid::cell::Cell;

/// Construction-time criterion (spec.md §4.1): used by `GridBuilder`
/// during recursion. Exposed here too so callers can evaluate it against
/// an already-built `Cell` (e.g. to decide whether a freshly split child
/// should itself be eligible for further construction-time refinement in
/// a re-run).
#[must_use]
pub fn population_mutator_fires(pop: f64, pop_density: f64, pop_cutoff: f64, pop_density_cutoff: f64) -> bool {
    pop > pop_cutoff || pop_density > pop_density_cutoff
}

/// Run-time criterion (spec.md §4.1): `pop(c) * concentration(c) >
/// PopConcThreshold`. `concentration` is the sum of `cf` across every
/// mechanism species the caller cares about (e.g. total PM2.5).
#[must_use]
pub fn pop_conc_mutator_fires(population: f64, concentration: f64, threshold: f64) -> bool {
    population * concentration > threshold
}

/// Split/merge driver (spec.md §4.1 "MutateGrid").
pub struct MutateGrid {
    pub bbox_offset: f64,
}

impl MutateGrid {
    #[must_use]
    pub fn new(bbox_offset: f64) -> Self {
        MutateGrid { bbox_offset }
    }

    /// Split cell `row` into an `nx x ny` grid of children, replacing it in
    /// place. Intensive fields (`cf`, `emis_flux`, `met`, `mortality_rate`)
    /// are copied unchanged to every child; `population` is divided by
    /// area fraction so the total is conserved (P4). Rows are reassigned
    /// and the spatial index, sort order, and neighbor lists are rebuilt
    /// from scratch, which is `O(n log n)` in the number of cells — fine
    /// for the occasional mutation pass spec.md §4.1 describes, not a
    /// per-timestep operation.
    pub fn split(&self, cells: &mut Vec<Cell>, row: usize, nx: usize, ny: usize) -> Result<()> {
        if row >= cells.len() {
            return Err(InMapError::GridInconsistent(format!(
                "split: row {row} out of range"
            )));
        }
        if nx == 0 || ny == 0 {
            return Err(InMapError::GridInconsistent(
                "split: nx and ny must be positive".into(),
            ));
        }

        let parent = cells.remove(row);
        let rect = parent.polygon.bounding_rect();
        let cw = rect.width() / nx as f64;
        let ch = rect.height() / ny as f64;
        let n_children = (nx * ny) as f64;

        let mut children = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let x0 = rect.x0 + i as f64 * cw;
                let y0 = rect.y0 + j as f64 * ch;
                let child_rect = Rect::new(x0, y0, x0 + cw, y0 + ch);
                let mut child = Cell::new(0, Polygon::from_rect(child_rect), parent.k, parent.dz, parent.cf.len());
                child.cf = parent.cf.clone();
                child.emis_flux = parent.emis_flux.clone();
                child.met = parent.met.clone();
                child.mortality_rate = parent.mortality_rate;
                child.population = parent
                    .population
                    .iter()
                    .map(|(name, total)| (name.clone(), total / n_children))
                    .collect();
                children.push(child);
            }
        }

        for (offset, child) in children.into_iter().enumerate() {
            cells.insert(row + offset, child);
        }
        self.renumber(cells);
        relink_neighbors(cells, self.bbox_offset)
    }

    /// Merge `rows` (which must all share a layer) into one cell spanning
    /// their combined bounding rectangle. `population` is summed (totals
    /// conserved); `cf`, `met`, and `mortality_rate` become volume-weighted
    /// averages, which is exact only when the merged cells carry equal
    /// `dz`, a precondition this enforces (spec.md §4.1 "merge is the
    /// inverse of split").
    pub fn merge(&self, cells: &mut Vec<Cell>, rows: &[usize]) -> Result<()> {
        if rows.len() < 2 {
            return Err(InMapError::GridInconsistent(
                "merge: need at least two cells".into(),
            ));
        }
        let k = cells[rows[0]].k;
        let dz = cells[rows[0]].dz;
        for &r in rows {
            if cells[r].k != k {
                return Err(InMapError::GridInconsistent(
                    "merge: cells span more than one layer".into(),
                ));
            }
            if (cells[r].dz.value() - dz.value()).abs() > 1e-9 {
                return Err(InMapError::GridInconsistent(
                    "merge: cells have mismatched layer thickness".into(),
                ));
            }
        }

        let mut sorted_rows = rows.to_vec();
        sorted_rows.sort_unstable();

        let rects: Vec<Rect> = sorted_rows.iter().map(|&r| cells[r].polygon.bounding_rect()).collect();
        let merged_rect = rects.iter().fold(rects[0], |acc, r| {
            Rect::new(
                acc.x0.min(r.x0),
                acc.y0.min(r.y0),
                acc.x1.max(r.x1),
                acc.y1.max(r.y1),
            )
        });

        let n_species = cells[sorted_rows[0]].cf.len();
        let mut cf = vec![crate::core_types::MicrogramsPerCubicMeter::new(0.0); n_species];
        let mut total_volume = 0.0;
        let mut population = std::collections::HashMap::<String, f64>::new();
        let mut mortality_weighted = 0.0;

        for &r in &sorted_rows {
            let c = &cells[r];
            let volume = c.volume();
            total_volume += volume;
            for (i, v) in c.cf.iter().enumerate() {
                cf[i] = cf[i] + crate::core_types::MicrogramsPerCubicMeter::new(v.value() * volume);
            }
            mortality_weighted += c.mortality_rate * volume;
            for (name, value) in &c.population {
                *population.entry(name.clone()).or_insert(0.0) += value;
            }
        }
        if total_volume > 0.0 {
            for v in &mut cf {
                *v = crate::core_types::MicrogramsPerCubicMeter::new(v.value() / total_volume);
            }
            mortality_weighted /= total_volume;
        }

        let met = cells[sorted_rows[0]].met.clone();
        let mut merged = Cell::new(0, Polygon::from_rect(merged_rect), k, dz, n_species);
        merged.cf = cf;
        merged.met = met;
        merged.mortality_rate = mortality_weighted;
        merged.population = population.into_iter().collect();

        // Remove merged cells highest-index-first so earlier indices stay valid.
        for &r in sorted_rows.iter().rev() {
            cells.remove(r);
        }
        let insert_at = sorted_rows[0].min(cells.len());
        cells.insert(insert_at, merged);

        self.renumber(cells);
        relink_neighbors(cells, self.bbox_offset)
    }

    fn renumber(&self, cells: &mut [Cell]) {
        for (row, cell) in cells.iter_mut().enumerate() {
            cell.row = row;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters as M, MicrogramsPerCubicMeter};

    fn flat_cell(row: usize, x0: f64, y0: f64, x1: f64, y1: f64, pop: f64) -> Cell {
        let mut cell = Cell::new(row, Polygon::from_rect(Rect::new(x0, y0, x1, y1)), 0, M::new(10.0), 1);
        cell.cf = vec![MicrogramsPerCubicMeter::new(4.0)];
        cell.population.insert("TotalPop".to_string(), pop);
        cell
    }

    #[test]
    fn split_conserves_population_total() {
        let mut cells = vec![flat_cell(0, 0.0, 0.0, 10.0, 10.0, 1000.0)];
        let mutator = MutateGrid::new(0.01);
        mutator.split(&mut cells, 0, 2, 2).unwrap();
        assert_eq!(cells.len(), 4);
        let total: f64 = cells.iter().map(|c| c.population_total()).sum();
        assert!((total - 1000.0).abs() < 1e-9);
        for c in &cells {
            assert!((c.cf[0].value() - 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn merge_conserves_population_total() {
        let mut cells = vec![
            flat_cell(0, 0.0, 0.0, 5.0, 10.0, 300.0),
            flat_cell(1, 5.0, 0.0, 10.0, 10.0, 700.0),
        ];
        let mutator = MutateGrid::new(0.01);
        mutator.merge(&mut cells, &[0, 1]).unwrap();
        assert_eq!(cells.len(), 1);
        assert!((cells[0].population_total() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn pop_conc_criterion_is_product_of_population_and_concentration() {
        assert!(pop_conc_mutator_fires(1000.0, 50.0, 10_000.0));
        assert!(!pop_conc_mutator_fires(10.0, 1.0, 10_000.0));
    }
}
