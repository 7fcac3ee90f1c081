//! Pluggable chemistry mechanism (spec.md §2 "Mechanism", §4.2, §9)
//!
//! A `Mechanism` is an external collaborator injected into the grid and the
//! domain: it names species, maps species to deposition-index tables, and
//! supplies the chemistry-step kernel. Concrete chemistry coefficients are
//! out of scope (spec.md §1 Non-goals); `SimpleChem` below is the reference
//! mechanism named in spec.md §4.2 and is complete enough to drive the
//! partitioning/oxidation behavior the spec describes, but any other
//! `Mechanism` implementation can be injected in its place.

use crate::core_types::{MicrogramsPerCubicMeter, PerSecond, Seconds};

/// A single named, described, unit-carrying output variable (spec.md §2
/// Mechanism capability set: "the list of output variables with
/// descriptions and units").
#[derive(Debug, Clone)]
pub struct OutputVariable {
    pub name: &'static str,
    pub description: &'static str,
    pub units: &'static str,
}

/// Per-cell meteorology/partitioning inputs a chemistry kernel needs. A
/// subset of the CTMData fields aggregated onto the cell (spec.md §6).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChemistryInputs {
    pub so2_oxidation: PerSecond,
    pub a_org_partitioning: f64,
    pub b_org_partitioning: f64,
    pub no_partitioning: f64,
    pub s_partitioning: f64,
    pub nh_partitioning: f64,
}

/// Capability set an injected chemistry mechanism must provide (spec.md §2,
/// §9 "Mechanism as an interface abstraction").
pub trait Mechanism: Send + Sync {
    /// Species names, in the fixed index order used by `Cell::cf`.
    fn species(&self) -> &[&'static str];

    /// Map a species name to its index in `Cell::cf`/`Cell::emis_flux`.
    fn index(&self, name: &str) -> Option<usize> {
        self.species().iter().position(|&s| s == name)
    }

    /// Number of species (`Len()` in spec.md §4.1 Mechanism capability set).
    fn len(&self) -> usize {
        self.species().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices into `Cell::cf` that participate in dry deposition, paired
    /// with the CTMData dry-deposition-velocity field that applies to each.
    fn dry_dep_indices(&self) -> &[(usize, DryDepSpecies)];

    /// Indices into `Cell::cf` that participate in wet deposition, paired
    /// with the CTMData wet-deposition-rate field that applies to each.
    fn wet_dep_indices(&self) -> &[(usize, WetDepSpecies)];

    /// Advance chemistry for one cell's state over `dt`, given the cell's
    /// aggregated CTMData-derived inputs. Mutates `cf` in place.
    fn step(&self, cf: &mut [MicrogramsPerCubicMeter], dt: Seconds, inputs: &ChemistryInputs);

    /// Output variables this mechanism exposes (spec.md §2).
    fn output_variables(&self) -> &[OutputVariable];
}

/// Which CTMData dry-deposition-velocity field applies to a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryDepSpecies {
    Particle,
    So2,
    Nox,
    Nh3,
    Voc,
}

/// Which CTMData wet-deposition-rate field applies to a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WetDepSpecies {
    Particle,
    So2,
    OtherGas,
}

/// Reference mechanism named in spec.md §4.2: partitioning (gas/particle for
/// organic, NOx/NO3, SOx/SO4, NH3/NH4) plus SO₂ → SO₄ oxidation.
///
/// Species order: `aVOC, bVOC, gNO, pNO, gS, pS, gNH, pNH`. The gas-phase
/// members of each organic/NOx/SOx/NH3 pair remain particle-precursor gases;
/// the `p*` members are the particle-phase mass. SO₂ oxidation transfers
/// mass from `gS` into `pS` at rate `SO2oxidation` (spec.md §4.2).
pub struct SimpleChem {
    species: Vec<&'static str>,
    dry_dep: Vec<(usize, DryDepSpecies)>,
    wet_dep: Vec<(usize, WetDepSpecies)>,
    outputs: Vec<OutputVariable>,
}

const SIMPLECHEM_SPECIES: [&str; 8] = [
    "aVOC", "bVOC", "gNO", "pNO", "gS", "pS", "gNH", "pNH",
];

impl SimpleChem {
    #[must_use]
    pub fn new() -> Self {
        let species = SIMPLECHEM_SPECIES.to_vec();
        let dry_dep = vec![
            (1, DryDepSpecies::Nox), // pNO -> particle dep uses particle vd per spec; see note below
            (3, DryDepSpecies::Nox),
            (5, DryDepSpecies::So2),
            (7, DryDepSpecies::Nh3),
        ];
        let wet_dep = vec![
            (1, WetDepSpecies::Particle),
            (3, WetDepSpecies::Particle),
            (5, WetDepSpecies::Particle),
            (7, WetDepSpecies::Particle),
        ];
        let outputs = vec![
            OutputVariable {
                name: "PrimaryPM25",
                description: "Primary PM2.5 concentration",
                units: "\u{b5}g m-3",
            },
            OutputVariable {
                name: "pNH4",
                description: "Particulate ammonium concentration",
                units: "\u{b5}g m-3",
            },
            OutputVariable {
                name: "pNO3",
                description: "Particulate nitrate concentration",
                units: "\u{b5}g m-3",
            },
            OutputVariable {
                name: "pSO4",
                description: "Particulate sulfate concentration",
                units: "\u{b5}g m-3",
            },
            OutputVariable {
                name: "SOA",
                description: "Secondary organic aerosol concentration",
                units: "\u{b5}g m-3",
            },
        ];
        SimpleChem {
            species,
            dry_dep,
            wet_dep,
            outputs,
        }
    }
}

impl Default for SimpleChem {
    fn default() -> Self {
        Self::new()
    }
}

impl Mechanism for SimpleChem {
    fn species(&self) -> &[&'static str] {
        &self.species
    }

    fn dry_dep_indices(&self) -> &[(usize, DryDepSpecies)] {
        &self.dry_dep
    }

    fn wet_dep_indices(&self) -> &[(usize, WetDepSpecies)] {
        &self.wet_dep
    }

    fn step(&self, cf: &mut [MicrogramsPerCubicMeter], dt: Seconds, inputs: &ChemistryInputs) {
        // Re-partition each gas/particle family toward its CTM-supplied
        // equilibrium fraction (spec.md §4.2: "partitioning ... using the
        // CTM partitioning fractions").
        repartition(cf, 0, 1, inputs.a_org_partitioning);
        repartition(cf, 2, 3, inputs.no_partitioning);
        repartition(cf, 4, 5, inputs.s_partitioning);
        repartition(cf, 6, 7, inputs.nh_partitioning);

        // SO2 -> SO4 oxidation at SO2oxidation (s^-1), applied to the gas
        // slot of the S family, moving mass into the particle slot.
        let gs = cf[4];
        let oxidized = gs * (inputs.so2_oxidation.value() * dt.value());
        let oxidized = oxidized.min(gs);
        cf[4] = cf[4] - oxidized;
        cf[5] = cf[5] + oxidized;
    }

    fn output_variables(&self) -> &[OutputVariable] {
        &self.outputs
    }
}

/// Move total family mass toward a gas/particle split matching `fraction`
/// (the particle share), conserving `gas + particle`.
fn repartition(
    cf: &mut [MicrogramsPerCubicMeter],
    gas_idx: usize,
    particle_idx: usize,
    particle_fraction: f64,
) {
    let total = cf[gas_idx] + cf[particle_idx];
    let fraction = particle_fraction.clamp(0.0, 1.0);
    cf[particle_idx] = total * fraction;
    cf[gas_idx] = total * (1.0 - fraction);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_lookup_matches_declared_order() {
        let m = SimpleChem::new();
        assert_eq!(m.index("gS"), Some(4));
        assert_eq!(m.index("pS"), Some(5));
        assert_eq!(m.len(), 8);
    }

    #[test]
    fn repartition_conserves_mass() {
        let mut cf = vec![MicrogramsPerCubicMeter::new(0.0); 8];
        cf[0] = MicrogramsPerCubicMeter::new(10.0);
        cf[1] = MicrogramsPerCubicMeter::new(2.0);
        let total_before = cf[0].value() + cf[1].value();
        repartition(&mut cf, 0, 1, 0.3);
        let total_after = cf[0].value() + cf[1].value();
        assert!((total_before - total_after).abs() < 1e-9);
        assert!((cf[1].value() - 0.3 * total_before).abs() < 1e-9);
    }

    #[test]
    fn so2_oxidation_moves_mass_without_creating_any() {
        let m = SimpleChem::new();
        let mut cf = vec![MicrogramsPerCubicMeter::new(0.0); 8];
        cf[4] = MicrogramsPerCubicMeter::new(5.0);
        let inputs = ChemistryInputs {
            so2_oxidation: PerSecond::new(0.1),
            ..Default::default()
        };
        let total_before: f64 = cf.iter().map(|c| c.value()).sum();
        m.step(&mut cf, Seconds::new(10.0), &inputs);
        let total_after: f64 = cf.iter().map(|c| c.value()).sum();
        assert!((total_before - total_after).abs() < 1e-9);
        assert!(cf[5].value() > 0.0);
    }
}
