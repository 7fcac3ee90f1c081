//! The source-receptor matrix driver (spec.md "C3 Source-Receptor Matrix
//! Driver"): unit-emission job submission with retry, output regridding,
//! and the SR matrix NetCDF writer.

pub mod driver;
pub mod emissions_input;
pub mod job_runner;
pub mod netcdf_writer;
pub mod reader;
pub mod regrid;
pub mod retry;

pub use driver::{SrConfig, SrDriver, SourceCell};
pub use emissions_input::{
    read_emission_point, remove_shapefile, temp_shapefile_path, write_unit_emission_shapefile,
    UNIT_EMISSION_POLLUTANTS,
};
pub use job_runner::{Job, JobHandle, JobOutput, JobRunner, LocalJobRunner};
pub use netcdf_writer::{SrMatrixWriter, SR_POLLUTANTS};
pub use reader::{SrLookup, SrReader, DEFAULT_CACHE_SIZE};
pub use regrid::{regrid_area_weighted, Grid2, GridSpec};
pub use retry::Backoff;
