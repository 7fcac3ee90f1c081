//! `CTMData`: named bundle of 3-D fields on the regular CTM grid (spec.md §6)
//!
//! Consumed as input by C1 (grid aggregation) and, once aggregated onto
//! cells, by C2's numeric manipulators. Schema and units are fixed by
//! spec.md §6; this type is a plain in-memory representation of that
//! schema, populated either by a synthetic test fixture or by a NetCDF
//! reader built on the `netcdf` crate.

use crate::core_types::Rect;
use crate::error::{InMapError, Result};

/// A single `[z, y, x]` field on the CTM's regular grid.
#[derive(Debug, Clone)]
pub struct Field3 {
    pub nz: usize,
    pub ny: usize,
    pub nx: usize,
    pub values: Vec<f64>,
}

impl Field3 {
    #[must_use]
    pub fn zeros(nz: usize, ny: usize, nx: usize) -> Self {
        Field3 {
            nz,
            ny,
            nx,
            values: vec![0.0; nz * ny * nx],
        }
    }

    #[must_use]
    pub fn filled(nz: usize, ny: usize, nx: usize, value: f64) -> Self {
        Field3 {
            nz,
            ny,
            nx,
            values: vec![value; nz * ny * nx],
        }
    }

    #[inline]
    #[must_use]
    pub fn index(&self, iz: usize, iy: usize, ix: usize) -> usize {
        (iz * self.ny + iy) * self.nx + ix
    }

    #[must_use]
    pub fn get(&self, iz: usize, iy: usize, ix: usize) -> f64 {
        self.values[self.index(iz, iy, ix)]
    }

    pub fn set(&mut self, iz: usize, iy: usize, ix: usize, v: f64) {
        let idx = self.index(iz, iy, ix);
        self.values[idx] = v;
    }
}

/// The full CTMData variable set named in spec.md §6. Field names mirror
/// the NetCDF variable names exactly so a reader/writer can round-trip
/// without translation.
#[derive(Debug, Clone)]
pub struct CtmData {
    pub x0: f64,
    pub y0: f64,
    pub dx: f64,
    pub dy: f64,

    pub u_plus_speed: Field3,
    pub u_minus_speed: Field3,
    pub v_plus_speed: Field3,
    pub v_minus_speed: Field3,
    pub w_plus_speed: Field3,
    pub w_minus_speed: Field3,

    pub a_org_partitioning: Field3,
    pub b_org_partitioning: Field3,
    pub no_partitioning: Field3,
    pub s_partitioning: Field3,
    pub nh_partitioning: Field3,

    pub so2_oxidation: Field3,

    pub particle_dry_dep: Field3,
    pub so2_dry_dep: Field3,
    pub nox_dry_dep: Field3,
    pub nh3_dry_dep: Field3,
    pub voc_dry_dep: Field3,

    pub kxxyy: Field3,
    /// Staggered in z: `nz + 1` layers.
    pub kzz: Field3,
    pub m2u: Field3,
    pub m2d: Field3,

    /// Staggered in z: `nz + 1` layers.
    pub layer_heights: Field3,
    pub dz: Field3,

    pub particle_wet_dep: Field3,
    pub so2_wet_dep: Field3,
    pub other_gas_wet_dep: Field3,

    pub wind_speed: Field3,
    pub wind_speed_inverse: Field3,
    pub wind_speed_minus_third: Field3,
    pub wind_speed_minus_one_point_four: Field3,

    pub temperature: Field3,
    pub s1: Field3,
    pub sclass: Field3,
    pub total_pm25: Field3,
}

impl CtmData {
    /// Bounding rectangle of the entire CTM grid in its native projection.
    #[must_use]
    pub fn extent(&self, nx: usize, ny: usize) -> Rect {
        Rect::new(self.x0, self.y0, self.x0 + self.dx * nx as f64, self.y0 + self.dy * ny as f64)
    }

    /// Bounding rectangle of a single CTM cell `(ix, iy)`.
    #[must_use]
    pub fn cell_rect(&self, ix: usize, iy: usize) -> Rect {
        let x0 = self.x0 + self.dx * ix as f64;
        let y0 = self.y0 + self.dy * iy as f64;
        Rect::new(x0, y0, x0 + self.dx, y0 + self.dy)
    }

    /// A flat, horizontally-uniform CTM field for tests: every `(y, x)`
    /// cell carries the same value at every layer.
    #[must_use]
    pub fn synthetic_flat(nz: usize, ny: usize, nx: usize, dx: f64, dy: f64) -> Self {
        let f = |v: f64| Field3::filled(nz, ny, nx, v);
        let f_stag = |v: f64| Field3::filled(nz + 1, ny, nx, v);
        CtmData {
            x0: 0.0,
            y0: 0.0,
            dx,
            dy,
            u_plus_speed: f(1.0),
            u_minus_speed: f(1.0),
            v_plus_speed: f(1.0),
            v_minus_speed: f(1.0),
            w_plus_speed: f(0.01),
            w_minus_speed: f(0.01),
            a_org_partitioning: f(0.3),
            b_org_partitioning: f(0.3),
            no_partitioning: f(0.2),
            s_partitioning: f(0.4),
            nh_partitioning: f(0.5),
            so2_oxidation: f(1e-5),
            particle_dry_dep: f(0.001),
            so2_dry_dep: f(0.005),
            nox_dry_dep: f(0.003),
            nh3_dry_dep: f(0.004),
            voc_dry_dep: f(0.002),
            kxxyy: f(50.0),
            kzz: f_stag(1.0),
            m2u: f(0.001),
            m2d: f(0.001),
            layer_heights: f_stag(100.0),
            dz: f(100.0),
            particle_wet_dep: f(0.0),
            so2_wet_dep: f(0.0),
            other_gas_wet_dep: f(0.0),
            wind_speed: f(1.4142135623730951),
            wind_speed_inverse: f(1.0 / 1.4142135623730951),
            wind_speed_minus_third: f(1.0),
            wind_speed_minus_one_point_four: f(1.0),
            temperature: f(288.15),
            s1: f(0.0),
            sclass: f(0.0),
            total_pm25: f(0.0),
        }
    }

    /// Validate that every field shares the expected non-staggered grid
    /// shape, except the two fields staggered in `z` (`Kzz`,
    /// `LayerHeights`, per spec.md §6).
    pub fn validate_shapes(&self, nz: usize, ny: usize, nx: usize) -> Result<()> {
        let check = |name: &str, f: &Field3, expect_nz: usize| -> Result<()> {
            if f.nz != expect_nz || f.ny != ny || f.nx != nx {
                return Err(InMapError::ConfigInvalid(format!(
                    "CTMData field {name} has shape [{}, {}, {}], expected [{}, {}, {}]",
                    f.nz, f.ny, f.nx, expect_nz, ny, nx
                )));
            }
            Ok(())
        };
        check("UPlusSpeed", &self.u_plus_speed, nz)?;
        check("Temperature", &self.temperature, nz)?;
        check("Kzz", &self.kzz, nz + 1)?;
        check("LayerHeights", &self.layer_heights, nz + 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_flat_has_consistent_shapes() {
        let ctm = CtmData::synthetic_flat(3, 4, 5, 1000.0, 1000.0);
        assert!(ctm.validate_shapes(3, 4, 5).is_ok());
    }

    #[test]
    fn cell_rect_tiles_without_gaps() {
        let ctm = CtmData::synthetic_flat(1, 2, 2, 10.0, 10.0);
        let a = ctm.cell_rect(0, 0);
        let b = ctm.cell_rect(1, 0);
        assert!((a.x1 - b.x0).abs() < 1e-9);
    }
}
