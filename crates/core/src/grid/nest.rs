//! Nest model: outer grid + refinement factors (spec.md §4.1 "Nest model")

use crate::core_types::Rect;

/// Horizontal nest configuration: an outer rectangle subdivided `n0 x m0`
/// at the coarsest level, each cell further subdivisible `nl x ml` at
/// level `l+1` up to `Xnests.len()` levels.
#[derive(Debug, Clone)]
pub struct NestConfig {
    pub x0: f64,
    pub y0: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
    pub xnests: Vec<usize>,
    pub ynests: Vec<usize>,
    /// Number of vertical layers that get their own horizontal grid; above
    /// this, the coarsest nest is reused for every layer (spec.md §4.1).
    pub hi_res_layers: usize,
}

impl NestConfig {
    #[must_use]
    pub fn outer_extent(&self) -> Rect {
        Rect::new(
            self.x0,
            self.y0,
            self.x0 + self.dx * self.nx as f64,
            self.y0 + self.dy * self.ny as f64,
        )
    }

    #[must_use]
    pub fn max_level(&self) -> usize {
        self.xnests.len().min(self.ynests.len())
    }

    /// Whether layer `k` gets its own horizontal grid or reuses the
    /// coarsest nest (spec.md §4.1).
    #[must_use]
    pub fn layer_uses_hi_res(&self, k: usize) -> bool {
        k < self.hi_res_layers
    }
}

/// A nest-index tuple `(i0, j0, i1, j1, ...)` identifying one candidate cell
/// at a given refinement depth. Lexicographic ordering over this tuple
/// gives the deterministic row-number sort spec.md §4.1 requires.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NestIndex(pub Vec<(u32, u32)>);

impl NestIndex {
    #[must_use]
    pub fn root(i: u32, j: u32) -> Self {
        NestIndex(vec![(i, j)])
    }

    #[must_use]
    pub fn child(&self, i: u32, j: u32) -> Self {
        let mut v = self.0.clone();
        v.push((i, j));
        NestIndex(v)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    /// World-space rectangle for this nest index within `config` at layer
    /// `k`'s horizontal grid.
    #[must_use]
    pub fn rect(&self, config: &NestConfig) -> Rect {
        let (i0, j0) = self.0[0];
        let mut rect = Rect::new(
            config.x0 + i0 as f64 * config.dx,
            config.y0 + j0 as f64 * config.dy,
            config.x0 + (i0 + 1) as f64 * config.dx,
            config.y0 + (j0 + 1) as f64 * config.dy,
        );
        for level in 1..self.0.len() {
            let (i, j) = self.0[level];
            let nlevel = config.xnests[level - 1];
            let mlevel = config.ynests[level - 1];
            let cw = rect.width() / nlevel as f64;
            let ch = rect.height() / mlevel as f64;
            let x0 = rect.x0 + i as f64 * cw;
            let y0 = rect.y0 + j as f64 * ch;
            rect = Rect::new(x0, y0, x0 + cw, y0 + ch);
        }
        rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NestConfig {
        NestConfig {
            x0: 0.0,
            y0: 0.0,
            dx: 12.0,
            dy: 12.0,
            nx: 1,
            ny: 1,
            xnests: vec![1, 3, 4],
            ynests: vec![1, 3, 4],
            hi_res_layers: 2,
        }
    }

    #[test]
    fn root_rect_matches_outer_cell() {
        let idx = NestIndex::root(0, 0);
        let rect = idx.rect(&config());
        assert!((rect.width() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn child_rect_is_proportionally_smaller() {
        let idx = NestIndex::root(0, 0).child(1, 1);
        let rect = idx.rect(&config());
        assert!((rect.width() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn lexicographic_order_is_deterministic() {
        let a = NestIndex::root(0, 0).child(0, 1);
        let b = NestIndex::root(0, 0).child(1, 0);
        assert!(a < b);
    }
}
