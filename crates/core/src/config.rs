//! TOML configuration keys consumed by the CLI collaborator (spec.md §6).
//!
//! The CLI's own TOML loader is an external collaborator (spec.md §6), but
//! it needs a typed value to deserialize into, so these structs mirror
//! spec.md's `VarGrid.*`/top-level/`SR.*` keys with `serde::Deserialize`,
//! the same way `fire-sim-core`'s `SimulationGrid`/`GridCell` derive
//! `Serialize, Deserialize` for their own config/state round-trip.

use crate::error::{InMapError, Result};
use serde::Deserialize;

/// `VarGrid.*` (spec.md §6).
#[derive(Debug, Clone, Deserialize)]
pub struct VarGridConfig {
    pub grid_proj: String,
    pub x0: f64,
    pub y0: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
    pub xnests: Vec<usize>,
    pub ynests: Vec<usize>,
    pub hi_res_layers: usize,
    pub pop_cutoff: f64,
    pub pop_density_cutoff: f64,
    pub pop_conc_threshold: f64,
    pub pop_grid_column: String,
    pub census_file: String,
    pub census_pop_columns: Vec<String>,
    pub mortality_rate_file: String,
    pub mortality_rate_column: String,
    pub bbox_offset: f64,
}

/// Emission unit the CLI's emissions reader converts from (spec.md §6
/// `EmissionUnits ∈ {tons/year, kg/year}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmissionUnits {
    #[serde(rename = "tons/year")]
    TonsPerYear,
    #[serde(rename = "kg/year")]
    KgPerYear,
}

/// `SR.*` (spec.md §6).
#[derive(Debug, Clone, Deserialize)]
pub struct SrSectionConfig {
    pub log_dir: String,
    pub output_file: String,
}

/// Top-level run configuration: every key spec.md §6 lists outside the
/// `VarGrid`/`SR`/`Preproc` sub-tables, plus those sub-tables.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub var_grid: VarGridConfig,
    pub in_map_data: String,
    pub variable_grid_data: String,
    pub emissions_shapefiles: Vec<String>,
    pub emission_units: EmissionUnits,
    pub output_file: String,
    pub output_all_layers: bool,
    pub output_variables: Vec<String>,
    /// `None`/absent = detect-convergence-only; `Some(n)` = always run `n`
    /// additional steps past Start, capping the loop even if the
    /// convergence check hasn't signaled done (spec.md §4.2 Open Question,
    /// resolved in DESIGN.md).
    pub num_iterations: Option<usize>,
    pub http_address: Option<String>,
    #[serde(rename = "SR")]
    pub sr: Option<SrSectionConfig>,
    /// `Preproc.*`: the preprocessor is an external collaborator (spec.md
    /// §6); its keys pass through unvalidated.
    #[serde(rename = "Preproc", default)]
    pub preproc: toml::Table,
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| InMapError::ConfigInvalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_run_config() {
        let toml_src = r#"
            in_map_data = "data/inmap.ncf"
            variable_grid_data = "data/grid.gob"
            emissions_shapefiles = ["emis/point.shp"]
            emission_units = "kg/year"
            output_file = "out.shp"
            output_all_layers = false
            output_variables = ["PrimaryPM25"]
            num_iterations = 50

            [var_grid]
            grid_proj = "+proj=lcc"
            x0 = -2736000.0
            y0 = -2088000.0
            dx = 36000.0
            dy = 36000.0
            nx = 148
            ny = 112
            xnests = [36000, 12000, 4000]
            ynests = [36000, 12000, 4000]
            hi_res_layers = 1
            pop_cutoff = 40000.0
            pop_density_cutoff = 0.0055
            pop_conc_threshold = 7.0e-4
            pop_grid_column = "TotalPop"
            census_file = "census.shp"
            census_pop_columns = ["TotalPop", "WhiteNoLat"]
            mortality_rate_file = "mortality.shp"
            mortality_rate_column = "AllCause"
            bbox_offset = 1.0
        "#;
        let cfg = RunConfig::from_toml_str(toml_src).unwrap();
        assert_eq!(cfg.var_grid.nx, 148);
        assert_eq!(cfg.num_iterations, Some(50));
        assert_eq!(cfg.emission_units, EmissionUnits::KgPerYear);
        assert!(cfg.sr.is_none());
    }

    #[test]
    fn absent_num_iterations_means_detect_convergence_only() {
        let toml_src = r#"
            in_map_data = "data/inmap.ncf"
            variable_grid_data = "data/grid.gob"
            emissions_shapefiles = []
            emission_units = "tons/year"
            output_file = "out.shp"
            output_all_layers = true
            output_variables = []

            [var_grid]
            grid_proj = "+proj=lcc"
            x0 = 0.0
            y0 = 0.0
            dx = 1.0
            dy = 1.0
            nx = 1
            ny = 1
            xnests = []
            ynests = []
            hi_res_layers = 1
            pop_cutoff = 1.0
            pop_density_cutoff = 1.0
            pop_conc_threshold = 1.0
            pop_grid_column = "Pop"
            census_file = "c.shp"
            census_pop_columns = []
            mortality_rate_file = "m.shp"
            mortality_rate_column = "All"
            bbox_offset = 1.0
        "#;
        let cfg = RunConfig::from_toml_str(toml_src).unwrap();
        assert_eq!(cfg.num_iterations, None);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(RunConfig::from_toml_str("not valid toml = [").is_err());
    }
}
