//! Core types and utilities shared by the grid, domain, and SR driver.

pub mod geometry;
pub mod units;

pub use geometry::{IndexedRect, Polygon, Rect, Side};
pub use units::{
    Fraction, MetersPerSecond, MicrogramsPerCubicMeter, MicrogramsPerCubicMeterPerSecond,
    MicrogramsPerSecond, PerSecond, Seconds, SquareMetersPerSecond,
};
pub use units::Meters;
