//! Geometry primitives used by the variable-resolution grid
//!
//! Axis-aligned rectangles and outer-ring-only polygons, built on `geo` so
//! area/intersection math reuses well-tested predicates rather than
//! hand-rolled polygon clipping (spec.md §3).

use geo::{Area, BooleanOps, BoundingRect};
use rstar::{RTreeObject, AABB};

/// Axis-aligned rectangle with double-precision edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect { x0, y0, x1, y1 }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Expand (or shrink, for negative `offset`) every edge by `offset`.
    #[must_use]
    pub fn inflated(&self, offset: f64) -> Rect {
        Rect::new(
            self.x0 - offset,
            self.y0 - offset,
            self.x1 + offset,
            self.y1 + offset,
        )
    }

    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }

    #[must_use]
    pub fn to_geo_polygon(self) -> geo::Polygon<f64> {
        geo::Rect::new((self.x0, self.y0), (self.x1, self.y1)).to_polygon()
    }

    /// A thin rectangle probing the given side of this rect, offset outward
    /// by `bbox_offset` (spec.md §4.1: "a thin rectangle offset by
    /// `BboxOffset`").
    #[must_use]
    pub fn probe(&self, side: Side, bbox_offset: f64) -> Rect {
        match side {
            Side::West => Rect::new(self.x0 - bbox_offset, self.y0, self.x0, self.y1),
            Side::East => Rect::new(self.x1, self.y0, self.x1 + bbox_offset, self.y1),
            Side::South => Rect::new(self.x0, self.y0 - bbox_offset, self.x1, self.y0),
            Side::North => Rect::new(self.x0, self.y1, self.x1, self.y1 + bbox_offset),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    West,
    East,
    South,
    North,
}

/// Outer-ring-only polygon (spec.md §3: "polygons are the outer ring only").
#[derive(Debug, Clone)]
pub struct Polygon(pub geo::Polygon<f64>);

impl Polygon {
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        Polygon(rect.to_geo_polygon())
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.0.unsigned_area()
    }

    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        let r = self
            .0
            .bounding_rect()
            .expect("polygon with coordinates has a bounding rect");
        Rect::new(r.min().x, r.min().y, r.max().x, r.max().y)
    }

    /// Area of the intersection of `self` and `other`. Used for area-
    /// weighted aggregation of census/mortality/CTM data onto grid cells.
    #[must_use]
    pub fn intersection_area(&self, other: &Polygon) -> f64 {
        let mp = self.0.intersection(&other.0);
        mp.unsigned_area()
    }
}

/// A spatial-index entry: a cell's row number plus its bounding rectangle,
/// indexed in an R-tree for O(log N) expected bbox-intersect queries
/// (spec.md §3 "spatial index").
#[derive(Debug, Clone, Copy)]
pub struct IndexedRect {
    pub row: usize,
    pub rect: Rect,
}

impl RTreeObject for IndexedRect {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.rect.x0, self.rect.y0], [self.rect.x1, self.rect.y1])
    }
}
