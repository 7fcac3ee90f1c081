//! Area-weighted regrid from a worker's output grid onto the SR grid
//! (spec.md §4.3 "Save phase": "regrid each job's output onto the SR
//! grid before writing").
//!
//! Shares the same arithmetic-mean-over-overlap idea as
//! `grid::builder`'s CTM aggregation, but works on a plain rectangular
//! `Grid2` rather than the variable-resolution cell list, since the SR
//! grid and a worker's output grid are both regular.

use crate::core_types::Rect;
use serde::{Deserialize, Serialize};

/// The shape and placement of a regular 2-D grid, without the data —
/// what a job's output or the SR matrix's receptor grid is described by
/// in configuration (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub x0: f64,
    pub y0: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
}

impl GridSpec {
    #[must_use]
    pub fn into_grid(self, values: Vec<f64>) -> Grid2 {
        Grid2 {
            x0: self.x0,
            y0: self.y0,
            dx: self.dx,
            dy: self.dy,
            nx: self.nx,
            ny: self.ny,
            values,
        }
    }

    #[must_use]
    pub fn zeros(self) -> Grid2 {
        self.into_grid(vec![0.0; self.nx * self.ny])
    }
}

/// A regular 2-D scalar field with an explicit origin and cell size.
#[derive(Debug, Clone)]
pub struct Grid2 {
    pub x0: f64,
    pub y0: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
    pub values: Vec<f64>,
}

impl Grid2 {
    #[must_use]
    pub fn zeros(x0: f64, y0: f64, dx: f64, dy: f64, nx: usize, ny: usize) -> Self {
        Grid2 {
            x0,
            y0,
            dx,
            dy,
            nx,
            ny,
            values: vec![0.0; nx * ny],
        }
    }

    #[must_use]
    pub fn cell_rect(&self, ix: usize, iy: usize) -> Rect {
        let x0 = self.x0 + self.dx * ix as f64;
        let y0 = self.y0 + self.dy * iy as f64;
        Rect::new(x0, y0, x0 + self.dx, y0 + self.dy)
    }

    #[must_use]
    pub fn get(&self, ix: usize, iy: usize) -> f64 {
        self.values[iy * self.nx + ix]
    }

    pub fn set(&mut self, ix: usize, iy: usize, v: f64) {
        let idx = iy * self.nx + ix;
        self.values[idx] = v;
    }
}

/// Area-weighted regrid of `source` onto a grid with `target`'s origin,
/// cell size, and dimensions: each target cell's value is the area-weighted
/// average of every overlapping source cell.
#[must_use]
pub fn regrid_area_weighted(source: &Grid2, target: &Grid2) -> Grid2 {
    let mut out = Grid2::zeros(target.x0, target.y0, target.dx, target.dy, target.nx, target.ny);
    for ty in 0..target.ny {
        for tx in 0..target.nx {
            let target_rect = target.cell_rect(tx, ty);
            let mut weighted = 0.0;
            let mut total_area = 0.0;

            let sx_lo = ((target_rect.x0 - source.x0) / source.dx).floor().max(0.0) as usize;
            let sx_hi = (((target_rect.x1 - source.x0) / source.dx).ceil().max(0.0) as usize).min(source.nx);
            let sy_lo = ((target_rect.y0 - source.y0) / source.dy).floor().max(0.0) as usize;
            let sy_hi = (((target_rect.y1 - source.y0) / source.dy).ceil().max(0.0) as usize).min(source.ny);

            for sy in sy_lo..sy_hi {
                for sx in sx_lo..sx_hi {
                    let source_rect = source.cell_rect(sx, sy);
                    let overlap = overlap_area(&target_rect, &source_rect);
                    if overlap <= 0.0 {
                        continue;
                    }
                    weighted += source.get(sx, sy) * overlap;
                    total_area += overlap;
                }
            }

            if total_area > 0.0 {
                out.set(tx, ty, weighted / total_area);
            }
        }
    }
    out
}

fn overlap_area(a: &Rect, b: &Rect) -> f64 {
    let x0 = a.x0.max(b.x0);
    let y0 = a.y0.max(b.y0);
    let x1 = a.x1.min(b.x1);
    let y1 = a.y1.min(b.y1);
    if x1 > x0 && y1 > y0 {
        (x1 - x0) * (y1 - y0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regrid_onto_identical_grid_is_a_no_op() {
        let mut source = Grid2::zeros(0.0, 0.0, 1.0, 1.0, 2, 2);
        source.set(0, 0, 1.0);
        source.set(1, 0, 2.0);
        source.set(0, 1, 3.0);
        source.set(1, 1, 4.0);
        let target = Grid2::zeros(0.0, 0.0, 1.0, 1.0, 2, 2);
        let out = regrid_area_weighted(&source, &target);
        assert_eq!(out.values, source.values);
    }

    #[test]
    fn regrid_onto_coarser_grid_averages_fine_cells() {
        let mut source = Grid2::zeros(0.0, 0.0, 1.0, 1.0, 2, 2);
        source.set(0, 0, 1.0);
        source.set(1, 0, 2.0);
        source.set(0, 1, 3.0);
        source.set(1, 1, 4.0);
        let target = Grid2::zeros(0.0, 0.0, 2.0, 2.0, 1, 1);
        let out = regrid_area_weighted(&source, &target);
        assert!((out.get(0, 0) - 2.5).abs() < 1e-9);
    }
}
