//! `RegularGrid` construction (spec.md §4.1 "Construction procedure")
//!
//! Single-threaded and deterministic by design (spec.md §5: "Grid
//! construction is single-threaded to guarantee deterministic row
//! numbers."), following `fire-sim-core::grid::simulation_grid`'s
//! single-threaded, index-ordered cell population loop. CTM aggregation
//! (step 5) is the one per-cell-parallel sub-step, mirroring
//! `SimulationGrid::update_diffusion`'s chunked-parallel pattern.

use crate::core_types::{Fraction, Meters, MetersPerSecond, MicrogramsPerCubicMeter, PerSecond, Polygon, Rect, Side, SquareMetersPerSecond, IndexedRect};
use crate::ctm::CtmData;
use crate::error::{InMapError, Result};
use crate::grid::cell::{Cell, CellMet, Neighbors};
use crate::grid::nest::{NestConfig, NestIndex};
use rayon::prelude::*;
use rstar::{RTree, AABB};
use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

/// A census polygon carrying population by demographic (spec.md §3
/// "population map (demographic -> value)").
#[derive(Debug, Clone)]
pub struct CensusPolygon {
    pub polygon: Polygon,
    pub population: FxHashMap<String, f64>,
}

/// A mortality-rate polygon.
#[derive(Debug, Clone)]
pub struct MortalityPolygon {
    pub polygon: Polygon,
    pub rate: f64,
}

/// Fixed, per-run configuration threaded through the builder instead of a
/// package-scoped global (spec.md §9 "Global mutable state").
#[derive(Debug, Clone)]
pub struct GridBuilderConfig {
    pub nest: NestConfig,
    pub pop_cutoff: f64,
    pub pop_density_cutoff: f64,
    pub pop_grid_column: String,
    /// Offset used to build neighbor-probe rectangles (spec.md §4.1:
    /// "much smaller than the smallest cell but well above float noise,
    /// e.g. 1.0 m").
    pub bbox_offset: f64,
}

pub struct GridBuilder {
    config: GridBuilderConfig,
    n_species: usize,
    /// Per-builder cache keyed by nest-index tuple, replacing the
    /// package-level cell cache the original design used (spec.md §9).
    cache: FxHashMap<NestIndex, Rect>,
}

impl GridBuilder {
    #[must_use]
    pub fn new(config: GridBuilderConfig, n_species: usize) -> Self {
        GridBuilder {
            config,
            n_species,
            cache: FxHashMap::default(),
        }
    }

    /// Build the full 3-D grid: one horizontal grid per hi-res layer, the
    /// coarsest nest reused above `HiResLayers` (spec.md §4.1).
    #[instrument(skip_all, fields(nz))]
    pub fn build(
        &mut self,
        nz: usize,
        census: &[CensusPolygon],
        mortality: &[MortalityPolygon],
        ctm: &CtmData,
        ctm_nx: usize,
        ctm_ny: usize,
    ) -> Result<Vec<Cell>> {
        let mut dz_by_layer = vec![Meters::new(0.0); nz];
        for (k, dz) in dz_by_layer.iter_mut().enumerate() {
            let kk = k.min(ctm.dz.nz - 1);
            *dz = Meters::new(ctm.dz.get(kk, 0, 0));
        }

        let mut candidates: Vec<(usize, NestIndex, Rect)> = Vec::new();
        for k in 0..nz {
            let hi_res = self.config.nest.layer_uses_hi_res(k);
            let layer_candidates = if hi_res {
                self.recurse_layer(census)
            } else {
                self.root_cells_only()
            };
            for (idx, rect) in layer_candidates {
                candidates.push((k, idx, rect));
            }
        }

        // Deterministic ordering: (layer, lexicographic index tuple).
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        info!(cells = candidates.len(), "grid candidates retained");

        let mut cells = Vec::with_capacity(candidates.len());
        for (row, (k, _idx, rect)) in candidates.into_iter().enumerate() {
            let polygon = Polygon::from_rect(rect);
            let (population, _) = aggregate_population(&rect, census, &self.config.pop_grid_column)?;
            let mortality_rate = aggregate_mortality(&rect, mortality)?;
            let mut cell = Cell::new(row, polygon, k, dz_by_layer[k], self.n_species);
            cell.population = population;
            cell.mortality_rate = mortality_rate;
            cells.push(cell);
        }

        relink_neighbors(&mut cells, self.config.bbox_offset)?;
        self.aggregate_ctm_onto_cells(&mut cells, ctm, ctm_nx, ctm_ny)?;

        debug!(total_cells = cells.len(), "grid construction complete");
        Ok(cells)
    }

    fn root_cells_only(&self) -> Vec<(NestIndex, Rect)> {
        let nest = &self.config.nest;
        let mut out = Vec::with_capacity(nest.nx * nest.ny);
        for j in 0..nest.ny {
            for i in 0..nest.nx {
                let idx = NestIndex::root(i as u32, j as u32);
                let rect = idx.rect(nest);
                out.push((idx, rect));
            }
        }
        out
    }

    fn recurse_layer(&mut self, census: &[CensusPolygon]) -> Vec<(NestIndex, Rect)> {
        let nest = self.config.nest.clone();
        let mut out = Vec::new();
        for j in 0..nest.ny {
            for i in 0..nest.nx {
                let idx = NestIndex::root(i as u32, j as u32);
                let rect = idx.rect(&nest);
                self.recurse_cell(idx, rect, 0, census, &mut out);
            }
        }
        out
    }

    fn recurse_cell(
        &mut self,
        idx: NestIndex,
        rect: Rect,
        level: usize,
        census: &[CensusPolygon],
        out: &mut Vec<(NestIndex, Rect)>,
    ) {
        self.cache.insert(idx.clone(), rect);
        let can_refine = level < self.config.nest.max_level();
        let fires = if can_refine {
            let (pop, area) = population_and_area(&rect, census, &self.config.pop_grid_column);
            let density = if area > 0.0 { pop / area } else { 0.0 };
            pop > self.config.pop_cutoff || density > self.config.pop_density_cutoff
        } else {
            false
        };

        if fires {
            let nlevel = self.config.nest.xnests[level];
            let mlevel = self.config.nest.ynests[level];
            let cw = rect.width() / nlevel as f64;
            let ch = rect.height() / mlevel as f64;
            for j in 0..mlevel {
                for i in 0..nlevel {
                    let child_idx = idx.child(i as u32, j as u32);
                    let x0 = rect.x0 + i as f64 * cw;
                    let y0 = rect.y0 + j as f64 * ch;
                    let child_rect = Rect::new(x0, y0, x0 + cw, y0 + ch);
                    self.recurse_cell(child_idx, child_rect, level + 1, census, out);
                }
            }
        } else {
            out.push((idx, rect));
        }
    }

    #[instrument(skip_all)]
    fn aggregate_ctm_onto_cells(
        &self,
        cells: &mut [Cell],
        ctm: &CtmData,
        ctm_nx: usize,
        ctm_ny: usize,
    ) -> Result<()> {
        let results: Vec<Result<CellMet>> = cells
            .par_iter()
            .map(|cell| aggregate_ctm_for_cell(cell, ctm, ctm_nx, ctm_ny))
            .collect();
        for (cell, met) in cells.iter_mut().zip(results) {
            cell.met = met?;
        }
        Ok(())
    }
}

/// Rebuild the per-layer R-tree index and fill in every cell's six
/// neighbor sets plus `IGroundLevel` (spec.md §4.1 step 4, §3 invariants
/// I1-I3). Shared by grid construction and by `MutateGrid`'s split/merge,
/// since both leave `cells[i].row` stable but change the spatial layout.
pub fn relink_neighbors(cells: &mut [Cell], bbox_offset: f64) -> Result<()> {
    let max_layer = cells.iter().map(|c| c.k).max().unwrap_or(0);
    let mut rtrees: Vec<RTree<IndexedRect>> = Vec::with_capacity(max_layer + 1);
    for k in 0..=max_layer {
        let entries: Vec<IndexedRect> = cells
            .iter()
            .filter(|c| c.k == k)
            .map(|c| IndexedRect {
                row: c.row,
                rect: c.polygon.bounding_rect(),
            })
            .collect();
        rtrees.push(RTree::bulk_load(entries));
    }

    let rows: Vec<(usize, usize, Rect)> = cells
        .iter()
        .map(|c| (c.row, c.k, c.polygon.bounding_rect()))
        .collect();

    for (row, k, rect) in &rows {
        let same_layer = &rtrees[*k];
        let west = probe(same_layer, rect.probe(Side::West, bbox_offset), *row);
        let east = probe(same_layer, rect.probe(Side::East, bbox_offset), *row);
        let south = probe(same_layer, rect.probe(Side::South, bbox_offset), *row);
        let north = probe(same_layer, rect.probe(Side::North, bbox_offset), *row);

        let above = if *k + 1 <= max_layer {
            probe(&rtrees[*k + 1], *rect, *row)
        } else {
            Vec::new()
        };
        let below = if *k > 0 {
            probe(&rtrees[*k - 1], *rect, *row)
        } else {
            Vec::new()
        };
        let ground_level = probe(&rtrees[0], *rect, usize::MAX);

        let cell = &mut cells[*row];
        cell.neighbors = Neighbors {
            west,
            east,
            south,
            north,
            above,
            below,
            ground_level,
        };
    }

    validate_neighbor_symmetry(cells)?;
    Ok(())
}

fn probe(tree: &RTree<IndexedRect>, probe_rect: Rect, exclude_row: usize) -> Vec<usize> {
    let aabb = AABB::from_corners(
        [probe_rect.x0, probe_rect.y0],
        [probe_rect.x1, probe_rect.y1],
    );
    let mut rows: Vec<usize> = tree
        .locate_in_envelope_intersecting(&aabb)
        .filter(|e| e.row != exclude_row)
        .map(|e| e.row)
        .collect();
    rows.sort_unstable();
    rows.dedup();
    rows
}

/// Population (of `pop_grid_column`'s demographic) and geometric area of
/// `rect`, used by the refinement criterion (spec.md §4.1).
fn population_and_area(rect: &Rect, census: &[CensusPolygon], pop_grid_column: &str) -> (f64, f64) {
    let cell_poly = Polygon::from_rect(*rect);
    let mut pop = 0.0;
    for c in census {
        let Some(&demographic) = c.population.get(pop_grid_column).as_ref() else {
            continue;
        };
        let overlap = cell_poly.intersection_area(&c.polygon);
        if overlap <= 0.0 {
            continue;
        }
        let census_area = c.polygon.area();
        if census_area <= 0.0 {
            continue;
        }
        pop += demographic * (overlap / census_area);
    }
    (pop, rect.area())
}

/// Area-weighted population by every demographic (spec.md §3 "population
/// conservation"); returns the map plus the named `pop_grid_column` value.
fn aggregate_population(
    rect: &Rect,
    census: &[CensusPolygon],
    pop_grid_column: &str,
) -> Result<(FxHashMap<String, f64>, f64)> {
    let cell_poly = Polygon::from_rect(*rect);
    let mut acc: FxHashMap<String, f64> = FxHashMap::default();
    for c in census {
        let overlap = cell_poly.intersection_area(&c.polygon);
        if overlap <= 0.0 {
            continue;
        }
        let census_area = c.polygon.area();
        if census_area <= 0.0 {
            return Err(InMapError::GridInconsistent(
                "census polygon has zero area".into(),
            ));
        }
        let fraction = overlap / census_area;
        for (name, value) in &c.population {
            if value.is_nan() {
                return Err(InMapError::GridInconsistent(format!(
                    "census demographic `{name}` is NaN"
                )));
            }
            *acc.entry(name.clone()).or_insert(0.0) += value * fraction;
        }
    }
    let named = acc.get(pop_grid_column).copied().unwrap_or(0.0);
    Ok((acc, named))
}

/// Area-weighted *average* mortality, not summed (spec.md §3 I5).
fn aggregate_mortality(rect: &Rect, mortality: &[MortalityPolygon]) -> Result<f64> {
    let cell_poly = Polygon::from_rect(*rect);
    let mut weighted = 0.0;
    let mut total_overlap = 0.0;
    for m in mortality {
        if m.rate.is_nan() {
            return Err(InMapError::GridInconsistent("mortality rate is NaN".into()));
        }
        let overlap = cell_poly.intersection_area(&m.polygon);
        if overlap <= 0.0 {
            continue;
        }
        weighted += m.rate * overlap;
        total_overlap += overlap;
    }
    if total_overlap > 0.0 {
        Ok(weighted / total_overlap)
    } else {
        Ok(0.0)
    }
}

fn ctm_index_range(rect: &Rect, ctm: &CtmData, n: usize, is_x: bool) -> (usize, usize) {
    let (origin, step, lo, hi) = if is_x {
        (ctm.x0, ctm.dx, rect.x0, rect.x1)
    } else {
        (ctm.y0, ctm.dy, rect.y0, rect.y1)
    };
    let i_lo = ((lo - origin) / step).floor().max(0.0) as usize;
    let i_hi = (((hi - origin) / step).ceil().max(0.0) as usize).min(n);
    (i_lo.min(n), i_hi)
}

/// Arithmetic mean of every overlapping CTM cell's fields onto one variable
/// cell (spec.md §4.1 step 5: "aggregate fields by arithmetic mean").
fn aggregate_ctm_for_cell(cell: &Cell, ctm: &CtmData, ctm_nx: usize, ctm_ny: usize) -> Result<CellMet> {
    let rect = cell.polygon.bounding_rect();
    let (ix_lo, ix_hi) = ctm_index_range(&rect, ctm, ctm_nx, true);
    let (iy_lo, iy_hi) = ctm_index_range(&rect, ctm, ctm_ny, false);

    let k = cell.k.min(ctm.temperature.nz - 1);
    let k_below = cell.k.min(ctm.kzz.nz - 1);
    let k_above = (cell.k + 1).min(ctm.kzz.nz - 1);

    let mut n = 0usize;
    let mut met = CellMet::default();
    for iy in iy_lo..iy_hi {
        for ix in ix_lo..ix_hi {
            let ctm_rect = ctm.cell_rect(ix, iy);
            if !rect.intersects(&ctm_rect) {
                continue;
            }
            n += 1;
            met.u_plus_speed += MetersPerSecond::new(ctm.u_plus_speed.get(k, iy, ix));
            met.u_minus_speed += MetersPerSecond::new(ctm.u_minus_speed.get(k, iy, ix));
            met.v_plus_speed += MetersPerSecond::new(ctm.v_plus_speed.get(k, iy, ix));
            met.v_minus_speed += MetersPerSecond::new(ctm.v_minus_speed.get(k, iy, ix));
            met.w_plus_speed += MetersPerSecond::new(ctm.w_plus_speed.get(k, iy, ix));
            met.w_minus_speed += MetersPerSecond::new(ctm.w_minus_speed.get(k, iy, ix));
            met.a_org_partitioning = Fraction::new(met.a_org_partitioning.value() + ctm.a_org_partitioning.get(k, iy, ix));
            met.b_org_partitioning = Fraction::new(met.b_org_partitioning.value() + ctm.b_org_partitioning.get(k, iy, ix));
            met.no_partitioning = Fraction::new(met.no_partitioning.value() + ctm.no_partitioning.get(k, iy, ix));
            met.s_partitioning = Fraction::new(met.s_partitioning.value() + ctm.s_partitioning.get(k, iy, ix));
            met.nh_partitioning = Fraction::new(met.nh_partitioning.value() + ctm.nh_partitioning.get(k, iy, ix));
            met.so2_oxidation += PerSecond::new(ctm.so2_oxidation.get(k, iy, ix));
            met.particle_dry_dep += MetersPerSecond::new(ctm.particle_dry_dep.get(k, iy, ix));
            met.so2_dry_dep += MetersPerSecond::new(ctm.so2_dry_dep.get(k, iy, ix));
            met.nox_dry_dep += MetersPerSecond::new(ctm.nox_dry_dep.get(k, iy, ix));
            met.nh3_dry_dep += MetersPerSecond::new(ctm.nh3_dry_dep.get(k, iy, ix));
            met.voc_dry_dep += MetersPerSecond::new(ctm.voc_dry_dep.get(k, iy, ix));
            met.kxxyy += SquareMetersPerSecond::new(ctm.kxxyy.get(k, iy, ix));
            met.kzz_below += SquareMetersPerSecond::new(ctm.kzz.get(k_below, iy, ix));
            met.kzz_above += SquareMetersPerSecond::new(ctm.kzz.get(k_above, iy, ix));
            met.m2u += PerSecond::new(ctm.m2u.get(k, iy, ix));
            met.m2d += PerSecond::new(ctm.m2d.get(k, iy, ix));
            met.particle_wet_dep += PerSecond::new(ctm.particle_wet_dep.get(k, iy, ix));
            met.so2_wet_dep += PerSecond::new(ctm.so2_wet_dep.get(k, iy, ix));
            met.other_gas_wet_dep += PerSecond::new(ctm.other_gas_wet_dep.get(k, iy, ix));
            met.wind_speed += MetersPerSecond::new(ctm.wind_speed.get(k, iy, ix));
            met.wind_speed_inverse += ctm.wind_speed_inverse.get(k, iy, ix);
            met.wind_speed_minus_third += ctm.wind_speed_minus_third.get(k, iy, ix);
            met.wind_speed_minus_one_point_four += ctm.wind_speed_minus_one_point_four.get(k, iy, ix);
            met.temperature += ctm.temperature.get(k, iy, ix);
            met.s1 += ctm.s1.get(k, iy, ix);
            met.sclass += ctm.sclass.get(k, iy, ix);
            met.total_pm25 += MicrogramsPerCubicMeter::new(ctm.total_pm25.get(k, iy, ix));
        }
    }

    if n == 0 {
        return Err(InMapError::GridInconsistent(format!(
            "cell {} (layer {}) has no overlapping CTM cells",
            cell.row, cell.k
        )));
    }
    let n_f = n as f64;
    met.u_plus_speed = met.u_plus_speed / n_f;
    met.u_minus_speed = met.u_minus_speed / n_f;
    met.v_plus_speed = met.v_plus_speed / n_f;
    met.v_minus_speed = met.v_minus_speed / n_f;
    met.w_plus_speed = met.w_plus_speed / n_f;
    met.w_minus_speed = met.w_minus_speed / n_f;
    met.a_org_partitioning = Fraction::new(met.a_org_partitioning.value() / n_f);
    met.b_org_partitioning = Fraction::new(met.b_org_partitioning.value() / n_f);
    met.no_partitioning = Fraction::new(met.no_partitioning.value() / n_f);
    met.s_partitioning = Fraction::new(met.s_partitioning.value() / n_f);
    met.nh_partitioning = Fraction::new(met.nh_partitioning.value() / n_f);
    met.so2_oxidation = met.so2_oxidation / n_f;
    met.particle_dry_dep = met.particle_dry_dep / n_f;
    met.so2_dry_dep = met.so2_dry_dep / n_f;
    met.nox_dry_dep = met.nox_dry_dep / n_f;
    met.nh3_dry_dep = met.nh3_dry_dep / n_f;
    met.voc_dry_dep = met.voc_dry_dep / n_f;
    met.kxxyy = met.kxxyy / n_f;
    met.kzz_below = met.kzz_below / n_f;
    met.kzz_above = met.kzz_above / n_f;
    met.m2u = met.m2u / n_f;
    met.m2d = met.m2d / n_f;
    met.particle_wet_dep = met.particle_wet_dep / n_f;
    met.so2_wet_dep = met.so2_wet_dep / n_f;
    met.other_gas_wet_dep = met.other_gas_wet_dep / n_f;
    met.wind_speed = met.wind_speed / n_f;
    met.wind_speed_inverse /= n_f;
    met.wind_speed_minus_third /= n_f;
    met.wind_speed_minus_one_point_four /= n_f;
    met.temperature /= n_f;
    met.s1 /= n_f;
    met.sclass /= n_f;
    met.total_pm25 = met.total_pm25 / n_f;
    Ok(met)
}

/// Check invariant I1: for every cell `c` and `n in c.IEast`, `c in
/// n.IWest`, and analogously for N/S (spec.md §3, §8 P3).
pub fn validate_neighbor_symmetry(cells: &[Cell]) -> Result<()> {
    for cell in cells {
        for &n in &cell.neighbors.east {
            if !cells[n].neighbors.west.contains(&cell.row) {
                return Err(InMapError::GridInconsistent(format!(
                    "cell {} has {} as east neighbor, but {} does not have {} as west neighbor",
                    cell.row, n, n, cell.row
                )));
            }
        }
        for &n in &cell.neighbors.north {
            if !cells[n].neighbors.south.contains(&cell.row) {
                return Err(InMapError::GridInconsistent(format!(
                    "cell {} has {} as north neighbor, but {} does not have {} as south neighbor",
                    cell.row, n, n, cell.row
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Rect;

    fn flat_census(x0: f64, y0: f64, x1: f64, y1: f64, pop: f64) -> CensusPolygon {
        let mut population = FxHashMap::default();
        population.insert("TotalPop".to_string(), pop);
        CensusPolygon {
            polygon: Polygon::from_rect(Rect::new(x0, y0, x1, y1)),
            population,
        }
    }

    fn small_config(xnests: Vec<usize>, ynests: Vec<usize>) -> GridBuilderConfig {
        GridBuilderConfig {
            nest: NestConfig {
                x0: -6.0,
                y0: -6.0,
                dx: 12.0,
                dy: 12.0,
                nx: 1,
                ny: 1,
                xnests,
                ynests,
                hi_res_layers: 1,
            },
            pop_cutoff: 50_000.0,
            pop_density_cutoff: 1e12,
            pop_grid_column: "TotalPop".to_string(),
            bbox_offset: 1.0,
        }
    }

    #[test]
    fn s1_grid_sanity_refines_where_population_is_dense() {
        // spec.md §8 S1: Nx=Ny=1, Xnests=Ynests=[1,3,3,4], PopCutoff=50000,
        // 100,000 people in a 1x1 km square at the origin, 0 elsewhere.
        let config = small_config(vec![1, 3, 3, 4], vec![1, 3, 3, 4]);
        let census = vec![flat_census(-0.5, -0.5, 0.5, 0.5, 100_000.0)];
        let mortality = vec![];
        let ctm = CtmData::synthetic_flat(1, 4, 4, 6.0, 6.0);
        let mut builder = GridBuilder::new(config, 1);
        let cells = builder.build(1, &census, &mortality, &ctm, 4, 4).unwrap();
        assert!(!cells.is_empty());
        // Deterministic: same inputs, same cell count every time (S1/S6).
        let mut builder2 = GridBuilder::new(small_config(vec![1, 3, 3, 4], vec![1, 3, 3, 4]), 1);
        let cells2 = builder2.build(1, &census, &mortality, &ctm, 4, 4).unwrap();
        assert_eq!(cells.len(), cells2.len());
        // The origin cell should have been refined past the outer 1x1 cell.
        let finest = cells.iter().map(|c| c.dx.value()).fold(f64::MAX, f64::min);
        assert!(finest < 12.0);
    }

    #[test]
    fn p1_population_is_conserved() {
        let config = small_config(vec![2, 2], vec![2, 2]);
        let census = vec![flat_census(-6.0, -6.0, 6.0, 6.0, 40_000.0)];
        let ctm = CtmData::synthetic_flat(1, 2, 2, 6.0, 6.0);
        let mut builder = GridBuilder::new(config, 1);
        let cells = builder.build(1, &census, &[], &ctm, 2, 2).unwrap();
        let total: f64 = cells.iter().map(|c| c.population_total()).sum();
        assert!((total - 40_000.0).abs() / 40_000.0 < 1e-6);
    }

    #[test]
    fn p2_mortality_is_area_weighted_average() {
        let config = small_config(vec![2], vec![2]);
        let mortality = vec![MortalityPolygon {
            polygon: Polygon::from_rect(Rect::new(-6.0, -6.0, 6.0, 6.0)),
            rate: 0.002,
        }];
        let ctm = CtmData::synthetic_flat(1, 2, 2, 6.0, 6.0);
        let mut builder = GridBuilder::new(config, 1);
        let cells = builder.build(1, &[], &mortality, &ctm, 2, 2).unwrap();
        for cell in &cells {
            assert!((cell.mortality_rate - 0.002).abs() < 1e-9);
        }
    }

    #[test]
    fn p3_neighbor_lists_are_symmetric() {
        let config = small_config(vec![3], vec![3]);
        let ctm = CtmData::synthetic_flat(1, 3, 3, 4.0, 4.0);
        let mut builder = GridBuilder::new(config, 1);
        let cells = builder.build(1, &[], &[], &ctm, 3, 3).unwrap();
        assert!(validate_neighbor_symmetry(&cells).is_ok());
    }
}
