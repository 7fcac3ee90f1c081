//! One-feature unit-emission shapefile round trip (spec.md §4.3 Start step
//! 1: "Writes a one-feature emissions input (shapefile, schema §6) to a
//! temp path"; §6 "Emissions shapefile" schema).
//!
//! Every SR source job gets a single point feature at the source cell's
//! centroid carrying a unit mass rate (1 ug/s) in each of the five
//! pollutant fields spec.md §6 names, plus the stack `Height` the worker's
//! plume-rise calculation needs (`LayerHeight + Dz/2`, spec.md §4.3).

use crate::error::{InMapError, Result};
use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Reader, Shape, Writer};
use std::path::{Path, PathBuf};

/// Pollutant attribute fields spec.md §6 fixes for an emissions shapefile,
/// each carrying the unit emission rate (1 ug/s) for an SR source job.
pub const UNIT_EMISSION_POLLUTANTS: [&str; 5] = ["VOC", "NOx", "NH3", "SOx", "PM2_5"];

/// Temp path for job `job_id`'s one-feature emissions shapefile (spec.md
/// §4.3 Start step 1: "to a temp path").
#[must_use]
pub fn temp_shapefile_path(job_id: &str) -> PathBuf {
    std::env::temp_dir().join(format!("inmap-sr-{job_id}.shp"))
}

/// Write a one-feature point shapefile at `path`: unit emission (1 ug/s)
/// in every pollutant field of spec.md §6, `Height = stack_height` (spec.md
/// §4.3: "stack height = `LayerHeight + Dz/2`").
pub fn write_unit_emission_shapefile(path: &Path, x: f64, y: f64, stack_height: f64) -> Result<()> {
    let mut table_builder = TableWriterBuilder::new();
    for &field in &UNIT_EMISSION_POLLUTANTS {
        table_builder = table_builder
            .add_numeric_field(field.try_into().map_err(shapefile_field_err)?, 19, 11);
    }
    table_builder = table_builder.add_numeric_field("Height".try_into().map_err(shapefile_field_err)?, 19, 11);

    let mut writer = Writer::from_path(path, table_builder).map_err(|e| InMapError::Shapefile(e.to_string()))?;

    let mut record = Record::default();
    for &field in &UNIT_EMISSION_POLLUTANTS {
        record.insert(field.to_string(), FieldValue::Numeric(Some(1.0)));
    }
    record.insert("Height".to_string(), FieldValue::Numeric(Some(stack_height)));

    writer
        .write_shape_and_record(&Point::new(x, y), &record)
        .map_err(|e| InMapError::Shapefile(e.to_string()))?;
    Ok(())
}

/// Read back a one-feature emissions shapefile: the feature's point and
/// its `Height` attribute. Used by workers to decode the Start phase's
/// temp-file input, and by this crate's own round-trip test.
pub fn read_emission_point(path: &Path) -> Result<(f64, f64, f64)> {
    let mut reader = Reader::from_path(path).map_err(|e| InMapError::Shapefile(e.to_string()))?;
    let (shape, record) = reader
        .iter_shapes_and_records()
        .next()
        .ok_or_else(|| InMapError::Shapefile("emissions shapefile has no features".to_string()))?
        .map_err(|e| InMapError::Shapefile(e.to_string()))?;

    let point = match shape {
        Shape::Point(p) => p,
        _ => return Err(InMapError::Shapefile("expected a Point shape".to_string())),
    };
    let height = match record.get("Height") {
        Some(FieldValue::Numeric(Some(h))) => *h,
        _ => return Err(InMapError::Shapefile("missing `Height` field".to_string())),
    };
    Ok((point.x, point.y, height))
}

fn shapefile_field_err<E: std::fmt::Display>(e: E) -> InMapError {
    InMapError::Shapefile(e.to_string())
}

/// Delete the `.shp`/`.shx`/`.dbf` sidecar files written for `path`'s
/// shapefile (spec.md §5 "Cancellation ... removes the temp directory").
pub fn remove_shapefile(path: &Path) {
    for ext in ["shp", "shx", "dbf"] {
        let _ = std::fs::remove_file(path.with_extension(ext));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips_centroid_and_stack_height() {
        let path = temp_shapefile_path("test-emissions-input-roundtrip");
        write_unit_emission_shapefile(&path, 1234.5, -678.0, 55.0).unwrap();

        let (x, y, height) = read_emission_point(&path).unwrap();
        assert!((x - 1234.5).abs() < 1e-6);
        assert!((y - (-678.0)).abs() < 1e-6);
        assert!((height - 55.0).abs() < 1e-6);

        remove_shapefile(&path);
    }
}
