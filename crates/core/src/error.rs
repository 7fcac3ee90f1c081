//! Error taxonomy (spec.md §7)
//!
//! `fire-sim-core` hand-rolls `Display`-only error enums per module
//! (`PersistenceError`). The InMAP error surface is larger and several
//! variants carry a retry/soft-error policy the caller must act on, so we
//! use `thiserror` (as `freddiehaddad-oxidized` and `Doctor0Evil-EcoSocialBee`
//! do) to derive `Display`/`Error` from one enum instead of repeating that
//! boilerplate per module.

use thiserror::Error;

/// One error kind per §7 "Error kinds (not type names)".
#[derive(Debug, Error)]
pub enum InMapError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("grid invariant violated after mutation: {0}")]
    GridInconsistent(String),

    #[error("emissions shapefile projection does not match grid projection")]
    ShapefileProjectionMismatch,

    #[error("numeric divergence in cell {cell}, species {species}: value = {value}")]
    NumericDivergence {
        cell: usize,
        species: usize,
        value: f64,
    },

    #[error("layer shape mismatch: layer {layer} has {found} cells, expected {expected}")]
    LayerShapeMismatch {
        layer: usize,
        found: usize,
        expected: usize,
    },

    /// Transient; C3 retries this with exponential backoff (§7 policy).
    #[error("worker unavailable for job {job}: {reason}")]
    WorkerUnavailable { job: String, reason: String },

    /// Soft error: SR reader returns a usable result alongside this (§7).
    #[error("emission plume above top SR layer, allocated to top layer")]
    AboveTop,

    #[error("worker output missing variable `{0}`")]
    MissingVariable(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("shapefile error: {0}")]
    Shapefile(String),
}

pub type Result<T> = std::result::Result<T, InMapError>;

impl InMapError {
    /// Whether §7's retry policy applies: only `WorkerUnavailable` is
    /// transient, everything else is surfaced unchanged.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, InMapError::WorkerUnavailable { .. })
    }

    /// Whether this is a soft error a caller may ignore, alongside a usable
    /// result (§7: `ErrAboveTop`).
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, InMapError::AboveTop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_worker_unavailable_is_transient() {
        let e = InMapError::WorkerUnavailable {
            job: "x".into(),
            reason: "timeout".into(),
        };
        assert!(e.is_transient());
        let e = InMapError::Cancelled;
        assert!(!e.is_transient());
    }

    #[test]
    fn above_top_is_soft() {
        assert!(InMapError::AboveTop.is_soft());
        assert!(!InMapError::ShapefileProjectionMismatch.is_soft());
    }
}
