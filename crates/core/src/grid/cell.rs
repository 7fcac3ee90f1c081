//! `Cell`: the shared C1/C2 entity (spec.md §3)

use crate::core_types::{
    Fraction, Meters, MetersPerSecond, MicrogramsPerCubicMeter, MicrogramsPerCubicMeterPerSecond,
    PerSecond, Polygon, SquareMetersPerSecond,
};
use rustc_hash::FxHashMap;

/// Meteorology aggregated onto a cell from CTMData (spec.md §3 "Meteorology
/// (per cell)"). Field names mirror `CtmData`'s.
#[derive(Debug, Clone, Default)]
pub struct CellMet {
    pub u_plus_speed: MetersPerSecond,
    pub u_minus_speed: MetersPerSecond,
    pub v_plus_speed: MetersPerSecond,
    pub v_minus_speed: MetersPerSecond,
    pub w_plus_speed: MetersPerSecond,
    pub w_minus_speed: MetersPerSecond,

    pub a_org_partitioning: Fraction,
    pub b_org_partitioning: Fraction,
    pub no_partitioning: Fraction,
    pub s_partitioning: Fraction,
    pub nh_partitioning: Fraction,

    pub so2_oxidation: PerSecond,

    pub particle_dry_dep: MetersPerSecond,
    pub so2_dry_dep: MetersPerSecond,
    pub nox_dry_dep: MetersPerSecond,
    pub nh3_dry_dep: MetersPerSecond,
    pub voc_dry_dep: MetersPerSecond,

    pub kxxyy: SquareMetersPerSecond,
    /// Kzz above and below the cell (staggered field centered by averaging
    /// in C1, spec.md §4.2 "Kzz is staggered, centered by averaging to
    /// cell").
    pub kzz_below: SquareMetersPerSecond,
    pub kzz_above: SquareMetersPerSecond,
    pub m2u: PerSecond,
    pub m2d: PerSecond,

    pub particle_wet_dep: PerSecond,
    pub so2_wet_dep: PerSecond,
    pub other_gas_wet_dep: PerSecond,

    pub wind_speed: MetersPerSecond,
    pub wind_speed_inverse: f64,
    pub wind_speed_minus_third: f64,
    pub wind_speed_minus_one_point_four: f64,

    pub temperature: f64,
    pub s1: f64,
    pub sclass: f64,
    pub total_pm25: MicrogramsPerCubicMeter,
}

/// Neighbor sets in all six directions plus ground-level cells (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct Neighbors {
    pub west: Vec<usize>,
    pub east: Vec<usize>,
    pub south: Vec<usize>,
    pub north: Vec<usize>,
    pub above: Vec<usize>,
    pub below: Vec<usize>,
    pub ground_level: Vec<usize>,
}

/// One element of the variable-resolution grid (spec.md §3 Cell).
#[derive(Debug, Clone)]
pub struct Cell {
    /// Row number, assigned at creation and stable for the cell's lifetime
    /// (spec.md §3 Identity).
    pub row: usize,
    pub polygon: Polygon,
    pub k: usize,
    pub dx: Meters,
    pub dy: Meters,
    pub dz: Meters,
    pub layer_height: Meters,

    /// Concentration, one entry per mechanism species (μg/m³).
    pub cf: Vec<MicrogramsPerCubicMeter>,
    /// Emissions flux, one entry per mechanism species (μg/m³/s).
    pub emis_flux: Vec<MicrogramsPerCubicMeterPerSecond>,

    pub population: FxHashMap<String, f64>,
    pub mortality_rate: f64,

    pub met: CellMet,
    pub neighbors: Neighbors,
}

impl Cell {
    #[must_use]
    pub fn new(row: usize, polygon: Polygon, k: usize, dz: Meters, n_species: usize) -> Self {
        let bbox = polygon.bounding_rect();
        Cell {
            row,
            polygon,
            k,
            dx: Meters::new(bbox.width()),
            dy: Meters::new(bbox.height()),
            dz,
            layer_height: Meters::new(0.0),
            cf: vec![MicrogramsPerCubicMeter::new(0.0); n_species],
            emis_flux: vec![MicrogramsPerCubicMeterPerSecond::new(0.0); n_species],
            population: FxHashMap::default(),
            mortality_rate: 0.0,
            met: CellMet::default(),
            neighbors: Neighbors::default(),
        }
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.polygon.area()
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        self.area() * self.dz.value()
    }

    #[must_use]
    pub fn is_ground_level(&self) -> bool {
        self.k == 0
    }

    #[must_use]
    pub fn population_total(&self) -> f64 {
        self.population.values().sum()
    }

    /// Check that NaN/Inf never entered `cf`; returns the first offending
    /// species index if so (spec.md §4.2 `ErrNumericDivergence`).
    #[must_use]
    pub fn first_divergent_species(&self) -> Option<usize> {
        self.cf.iter().position(|c| !c.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Rect;

    #[test]
    fn volume_is_area_times_dz() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 10.0, 20.0));
        let cell = Cell::new(0, poly, 0, Meters::new(5.0), 2);
        assert!((cell.volume() - 10.0 * 20.0 * 5.0).abs() < 1e-9);
    }

    #[test]
    fn fresh_cell_has_no_divergence() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let cell = Cell::new(0, poly, 0, Meters::new(1.0), 3);
        assert_eq!(cell.first_divergent_species(), None);
    }
}
