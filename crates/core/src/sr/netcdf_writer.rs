//! SR matrix NetCDF writer (spec.md §4.3, §6 "SR matrix NetCDF schema").
//!
//! Dimensions `layer`/`source`/`receptor` per spec.md §6; one `[layer,
//! source, receptor]` `f32` array per named pollutant
//! (`PrimaryPM25, pNH4, pNO3, pSO4, SOA`), plus the `layers` dimension and
//! int32 `layers` variable recording which layer index each `layer`
//! position corresponds to. `netcdf::FileMut` isn't internally
//! synchronized, so every write goes through a `Mutex` (the Save phase's
//! writer workers share one `SrMatrixWriter`). `finalize` is an explicit
//! step so a half-written file is never mistaken for a complete one — it
//! writes the count of `(layer, source)` rows actually filled in as a
//! scalar attribute before the file closes, the same role a classic
//! NetCDF file's `numrecs` header field plays for its unlimited dimension.
//!
//! The `allcells`-dimensioned InMAP-variable/cell-edge (`N,S,E,W`) side
//! tables spec.md §6 also lists are display/GUI concerns (this crate has
//! no GUI, spec.md §1 Non-goals) and are not written here; the per-
//! pollutant `[layer,source,receptor]` arrays below ARE the SR matrix and
//! are implemented to the fixed schema.

use crate::error::{InMapError, Result};
use std::sync::Mutex;

/// The five SR output pollutants spec.md §6 names, in the fixed order
/// `PrimaryPM25, pNH4, pNO3, pSO4, SOA`.
pub const SR_POLLUTANTS: [&str; 5] = ["PrimaryPM25", "pNH4", "pNO3", "pSO4", "SOA"];

const POLLUTANT_UNITS: &str =
    "\u{b5}g m-3 concentration at receptor location per \u{b5}g s-1 emissions at source location";

pub struct SrMatrixWriter {
    file: Mutex<netcdf::FileMut>,
    n_source: usize,
    n_receptor: usize,
    n_layers: usize,
    rows_written: Mutex<usize>,
}

impl SrMatrixWriter {
    /// Create a new SR matrix file with spec.md §6's fixed schema:
    /// dimensions `layer` (`layer_indices.len()`), `source` (`n_source`,
    /// the shared `Ncells` every selected layer must have, spec.md §4.3
    /// "layout invariant"), `receptor` (`n_receptor`), `layers` (same
    /// length as `layer`); the `layers` int32 variable records which
    /// original layer index each `layer` position is, and one `f32`
    /// `[layer, source, receptor]` variable per `SR_POLLUTANTS` entry.
    pub fn create(path: &str, layer_indices: &[i32], n_source: usize, n_receptor: usize) -> Result<Self> {
        let n_layers = layer_indices.len();
        let mut file = netcdf::create(path).map_err(InMapError::NetCdf)?;
        file.add_dimension("layer", n_layers).map_err(InMapError::NetCdf)?;
        file.add_dimension("source", n_source).map_err(InMapError::NetCdf)?;
        file.add_dimension("receptor", n_receptor).map_err(InMapError::NetCdf)?;
        file.add_dimension("layers", n_layers).map_err(InMapError::NetCdf)?;

        let mut layers_var = file.add_variable::<i32>("layers", &["layers"]).map_err(InMapError::NetCdf)?;
        layers_var
            .put_values(layer_indices, netcdf::Extents::from(0..n_layers))
            .map_err(InMapError::NetCdf)?;
        layers_var
            .add_attribute(
                "description",
                "Layer indices for which the SR calculation was performed",
            )
            .map_err(InMapError::NetCdf)?;

        for &pollutant in &SR_POLLUTANTS {
            let mut var = file
                .add_variable::<f32>(pollutant, &["layer", "source", "receptor"])
                .map_err(InMapError::NetCdf)?;
            var.add_attribute("units", POLLUTANT_UNITS).map_err(InMapError::NetCdf)?;
        }

        Ok(SrMatrixWriter {
            file: Mutex::new(file),
            n_source,
            n_receptor,
            n_layers,
            rows_written: Mutex::new(0),
        })
    }

    /// Open an existing SR matrix file for resumable appends (spec.md
    /// §4.3 "File creation": "if it does exist, the driver opens and
    /// appends to it"). `rows_written` starts at zero since re-running a
    /// job at an already-written `(layer, source)` slot simply overwrites
    /// that slot with the same value (P7 idempotent resume).
    pub fn open(path: &str, n_source: usize, n_receptor: usize, n_layers: usize) -> Result<Self> {
        let file = netcdf::append(path).map_err(InMapError::NetCdf)?;
        Ok(SrMatrixWriter {
            file: Mutex::new(file),
            n_source,
            n_receptor,
            n_layers,
            rows_written: Mutex::new(0),
        })
    }

    /// Write `pollutant`'s per-receptor concentration row for source cell
    /// `source_row` at position `layer_idx` in the `layer` dimension
    /// (spec.md §4.3 Save step 3: "Write into the NetCDF file at indices
    /// `[layerIdx, row, 0..Ncells)` under a per-pollutant variable").
    pub fn write_species(&self, layer_idx: usize, source_row: usize, pollutant: &str, conc: &[f64]) -> Result<()> {
        if conc.len() != self.n_receptor {
            return Err(InMapError::ConfigInvalid(format!(
                "SR row for `{pollutant}` has {} receptor values, expected {}",
                conc.len(),
                self.n_receptor
            )));
        }
        if layer_idx >= self.n_layers || source_row >= self.n_source {
            return Err(InMapError::LayerShapeMismatch {
                layer: layer_idx,
                found: source_row,
                expected: self.n_source,
            });
        }

        let conc_f32: Vec<f32> = conc.iter().map(|&v| v as f32).collect();
        let mut file = self.file.lock().expect("SR matrix writer lock poisoned");
        file.variable_mut(pollutant)
            .ok_or_else(|| InMapError::MissingVariable(pollutant.to_string()))?
            .put_values(
                &conc_f32,
                netcdf::Extents::from((layer_idx..layer_idx + 1, source_row..source_row + 1, 0..self.n_receptor)),
            )
            .map_err(InMapError::NetCdf)?;

        *self.rows_written.lock().expect("SR matrix row-count lock poisoned") += 1;
        Ok(())
    }

    /// Commit the count of `(layer, source)` slots written this run as a
    /// global attribute and flush. After this, the file is complete;
    /// callers should not call `write_species` again (nothing enforces
    /// that at the type level, matching `netcdf::FileMut`'s own
    /// interior-mutable style). spec.md §7: "a successful Save MUST call
    /// the finalize step."
    pub fn finalize(&self) -> Result<()> {
        let mut file = self.file.lock().expect("SR matrix writer lock poisoned");
        let rows = *self.rows_written.lock().expect("SR matrix row-count lock poisoned");
        file.add_attribute("rows_written", rows as i64).map_err(InMapError::NetCdf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sr_pollutants_match_spec_order() {
        assert_eq!(SR_POLLUTANTS, ["PrimaryPM25", "pNH4", "pNO3", "pSO4", "SOA"]);
    }
}
