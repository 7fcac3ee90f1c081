//! Emissions records and cell allocation (spec.md §3 "Emissions record")

use crate::core_types::{MicrogramsPerSecond, Polygon};
use crate::grid::cell::Cell;
use rustc_hash::FxHashMap;

/// A single emissions source: 2-D geometry, stack parameters, and a
/// mass-rate per pollutant (spec.md §3).
#[derive(Debug, Clone)]
pub struct EmissionsRecord {
    pub geometry: Polygon,
    pub height: f64,
    pub diameter: f64,
    pub exit_temperature: f64,
    pub exit_velocity: f64,
    /// Pollutant name -> mass rate (μg/s).
    pub rates: FxHashMap<String, MicrogramsPerSecond>,
}

impl EmissionsRecord {
    #[must_use]
    pub fn point(x: f64, y: f64, height: f64) -> Self {
        use crate::core_types::Rect;
        // A point source is modeled as a vanishingly small square so the
        // same area-weighted allocation machinery used for polygon sources
        // applies uniformly (it always lands entirely in one host cell).
        let eps = 1e-6;
        EmissionsRecord {
            geometry: Polygon::from_rect(Rect::new(x - eps, y - eps, x + eps, y + eps)),
            height,
            diameter: 0.0,
            exit_temperature: 0.0,
            exit_velocity: 0.0,
            rates: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_rate(mut self, pollutant: &str, rate: MicrogramsPerSecond) -> Self {
        self.rates.insert(pollutant.to_string(), rate);
        self
    }
}

/// A collection of emissions records, immutable once attached to a
/// `Domain` (spec.md §5 "Emissions collections are immutable once
/// attached.").
#[derive(Debug, Clone, Default)]
pub struct Emissions {
    records: Vec<EmissionsRecord>,
}

impl Emissions {
    #[must_use]
    pub fn new(records: Vec<EmissionsRecord>) -> Self {
        Emissions { records }
    }

    #[must_use]
    pub fn records(&self) -> &[EmissionsRecord] {
        &self.records
    }

    /// Allocate every record's mass rate onto `cells`' `emis_flux`, area-
    /// weighted by geometric intersection with each cell polygon, divided
    /// by cell volume to produce a μg/m³/s flux (spec.md §3 "Allocation to
    /// cells is area- or length-weighted by geometric intersection",
    /// §4.2 "all quantities are μg/m³").
    ///
    /// Only ground-level (`k == 0`) cells receive allocation for emission
    /// heights at or below the first layer height; stack plume rise above
    /// the ground layer is the SR reader's concern (spec.md §4.3
    /// `ErrAboveTop`), not this general allocator's.
    pub fn allocate(&self, cells: &mut [Cell], species_index: impl Fn(&str) -> Option<usize>) {
        for record in &self.records {
            let record_bbox = record.geometry.bounding_rect();
            for cell in cells.iter_mut().filter(|c| c.is_ground_level()) {
                let cell_bbox = cell.polygon.bounding_rect();
                if !cell_bbox.intersects(&record_bbox) {
                    continue;
                }
                let overlap = record.geometry.intersection_area(&cell.polygon);
                if overlap <= 0.0 {
                    continue;
                }
                let source_area = record.geometry.area().max(1e-12);
                let fraction = (overlap / source_area).min(1.0);
                let volume = cell.volume().max(1e-12);
                for (pollutant, rate) in &record.rates {
                    if let Some(idx) = species_index(pollutant) {
                        let flux = (*rate * fraction).value() / volume;
                        cell.emis_flux[idx] =
                            cell.emis_flux[idx] + crate::core_types::MicrogramsPerCubicMeterPerSecond::new(flux);
                    }
                }
            }
        }
    }
}

/// Init-phase manipulator that runs `Emissions::allocate` once against the
/// mechanism's species list, turning the immutable `Domain::emissions`
/// geometry into each cell's standing `emis_flux` before the Run loop's
/// `AddEmissionsFlux` starts applying it every step (spec.md §3, §4.2).
pub struct AllocateEmissions;

impl crate::domain::manipulator::DomainManipulator for AllocateEmissions {
    fn name(&self) -> &'static str {
        "AllocateEmissions"
    }

    fn run(&self, domain: &mut crate::domain::domain::Domain) -> crate::error::Result<()> {
        let species: Vec<&'static str> = domain.mechanism.species().to_vec();
        domain
            .emissions
            .allocate(&mut domain.cells, |name| species.iter().position(|s| *s == name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, Rect};
    use crate::grid::cell::Cell;

    #[test]
    fn point_source_allocates_entirely_to_host_cell() {
        let poly = Polygon::from_rect(Rect::new(-10.0, -10.0, 10.0, 10.0));
        let mut cell = Cell::new(0, poly, 0, Meters::new(2.0), 1);
        let record = EmissionsRecord::point(0.0, 0.0, 0.0)
            .with_rate("PM25", MicrogramsPerSecond::new(1.0));
        let emissions = Emissions::new(vec![record]);
        emissions.allocate(std::slice::from_mut(&mut cell), |name| {
            if name == "PM25" {
                Some(0)
            } else {
                None
            }
        });
        assert!(cell.emis_flux[0].value() > 0.0);
    }

    #[test]
    fn allocate_emissions_manipulator_populates_flux_from_mechanism_species() {
        use crate::domain::domain::Domain;
        use crate::domain::manipulator::DomainManipulator;
        use crate::mechanism::SimpleChem;
        use std::sync::Arc;

        let poly = Polygon::from_rect(Rect::new(-10.0, -10.0, 10.0, 10.0));
        let cell = Cell::new(0, poly, 0, Meters::new(2.0), 8);
        let record = EmissionsRecord::point(0.0, 0.0, 0.0).with_rate("aVOC", MicrogramsPerSecond::new(1.0));
        let emissions = Emissions::new(vec![record]);
        let mut domain = Domain::new(vec![cell], Arc::new(SimpleChem::new()), emissions);

        AllocateEmissions.run(&mut domain).unwrap();

        assert!(domain.cells[0].emis_flux[0].value() > 0.0);
    }
}
