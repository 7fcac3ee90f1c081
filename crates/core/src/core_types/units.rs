//! Semantic unit types for type-safe physical quantity handling
//!
//! Newtype wrappers over `f64` so that, for example, a concentration
//! (μg/m³) can never be silently added to a flux (μg/m³/s). All of InMAP's
//! numerics are double precision (spec: "double-precision edges", "all
//! quantities are μg/m³").
//!
//! Each type implements `Ord` via `f64::total_cmp` so NaN sorts consistently
//! instead of panicking comparisons, `Add`/`Sub`/`Mul<f64>`/`Div<f64>` where
//! physically meaningful, and `Serialize`/`Deserialize` for config and grid
//! persistence.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

macro_rules! unit_type {
    ($name:ident, $unit:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub f64);

        impl $name {
            #[inline]
            #[must_use]
            pub fn new(value: f64) -> Self {
                $name(value)
            }

            #[inline]
            #[must_use]
            pub fn value(self) -> f64 {
                self.0
            }

            #[inline]
            #[must_use]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            #[inline]
            #[must_use]
            pub fn abs(self) -> Self {
                $name(self.0.abs())
            }

            #[inline]
            #[must_use]
            pub fn max(self, other: Self) -> Self {
                if self.0 >= other.0 {
                    self
                } else {
                    other
                }
            }

            #[inline]
            #[must_use]
            pub fn min(self, other: Self) -> Self {
                if self.0 <= other.0 {
                    self
                } else {
                    other
                }
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.0, $unit)
            }
        }

        impl From<f64> for $name {
            fn from(v: f64) -> Self {
                $name(v)
            }
        }

        impl From<$name> for f64 {
            fn from(v: $name) -> f64 {
                v.0
            }
        }

        impl Add for $name {
            type Output = $name;
            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: $name) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $name {
            type Output = $name;
            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: $name) {
                self.0 -= rhs.0;
            }
        }

        impl Mul<f64> for $name {
            type Output = $name;
            fn mul(self, rhs: f64) -> $name {
                $name(self.0 * rhs)
            }
        }

        impl Div<f64> for $name {
            type Output = $name;
            fn div(self, rhs: f64) -> $name {
                $name(self.0 / rhs)
            }
        }
    };
}

unit_type!(Meters, "m");
unit_type!(Seconds, "s");
unit_type!(MetersPerSecond, "m/s");
unit_type!(SquareMetersPerSecond, "m\u{b2}/s");
unit_type!(PerSecond, "s\u{207b}\u{b9}");
/// Concentration, μg/m³. All species/pollutant concentrations (`Cf`) use
/// this unit per spec.md §4.2.
unit_type!(MicrogramsPerCubicMeter, "\u{b5}g/m\u{b3}");
/// Emissions flux, μg/m³/s (spec.md §4.2: "emissions are μg/m³/s").
unit_type!(MicrogramsPerCubicMeterPerSecond, "\u{b5}g/m\u{b3}/s");
/// Mass emission rate, μg/s (spec.md §3 Emissions record).
unit_type!(MicrogramsPerSecond, "\u{b5}g/s");
/// Dimensionless fraction in [0, 1] (humidity, partitioning fractions, …).
unit_type!(Fraction, "");

impl Fraction {
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        Fraction(value.clamp(0.0, 1.0))
    }
}

impl Div for MicrogramsPerCubicMeter {
    type Output = f64;
    fn div(self, rhs: MicrogramsPerCubicMeter) -> f64 {
        self.0 / rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_ordering_handles_nan() {
        let a = MicrogramsPerCubicMeter::new(1.0);
        let b = MicrogramsPerCubicMeter::new(f64::NAN);
        // Must not panic; NaN sorts to one consistent side.
        let _ = a.cmp(&b);
    }

    #[test]
    fn arithmetic_round_trips() {
        let flux = MicrogramsPerCubicMeterPerSecond::new(2.0);
        let dt = 3.0;
        let delta = flux * dt;
        assert!((delta.value() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn fraction_clamps() {
        assert_eq!(Fraction::clamped(1.5).value(), 1.0);
        assert_eq!(Fraction::clamped(-0.5).value(), 0.0);
    }
}
