//! `JobRunner`: submit/poll/delete a unit-emission simulation job (spec.md
//! §4.3 "Start phase").
//!
//! The real deployment target runs jobs on a worker cluster; `LocalJobRunner`
//! is the in-process implementation used by tests and by single-machine
//! runs, executing each job synchronously inside `submit` and caching its
//! result for later `output`/`delete` calls.

use crate::error::Result;
use crate::sr::regrid::GridSpec;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// One unit-emission job: emit unit mass rate (1 ug/s) in each of NH3, NOx,
/// SOx, VOC, PM25 at `cell_row`'s layer `layer`'s centroid, run to steady
/// state, and record the resulting concentration of every output pollutant
/// at every receptor cell (spec.md §4.3 "Worker contract").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Job {
    pub id: String,
    pub cell_row: usize,
    pub layer: usize,
    /// Temp-file path of the one-feature unit-emission shapefile written
    /// for this job (spec.md §4.3 Start step 1).
    pub emissions_shapefile_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle(pub String);

#[derive(Debug, Clone)]
pub struct JobOutput {
    pub job_id: String,
    /// The grid `values` are laid out on; may differ from the SR matrix's
    /// receptor grid, in which case the Save phase regrids it.
    pub grid: GridSpec,
    /// Pollutant name (one of `netcdf_writer::SR_POLLUTANTS`) -> per-cell
    /// concentration array on `grid` (spec.md §4.3 "output ... is a map
    /// from pollutant name to a per-receptor-cell concentration array").
    pub values: FxHashMap<String, Vec<f64>>,
}

pub trait JobRunner: Send + Sync {
    fn submit(&self, job: Job) -> Result<JobHandle>;
    /// `Ok(None)` means still running; callers poll again.
    fn output(&self, handle: &JobHandle) -> Result<Option<JobOutput>>;
    /// Idempotent: deleting an already-deleted or unknown job is `Ok(())`.
    fn delete(&self, handle: &JobHandle) -> Result<()>;
}

/// In-process `JobRunner`: `run` executes a job synchronously and returns
/// its per-pollutant, per-cell result.
pub struct LocalJobRunner<F>
where
    F: Fn(&Job) -> Result<(GridSpec, FxHashMap<String, Vec<f64>>)> + Send + Sync,
{
    run: F,
    results: Mutex<FxHashMap<String, JobOutput>>,
}

impl<F> LocalJobRunner<F>
where
    F: Fn(&Job) -> Result<(GridSpec, FxHashMap<String, Vec<f64>>)> + Send + Sync,
{
    #[must_use]
    pub fn new(run: F) -> Self {
        LocalJobRunner {
            run,
            results: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<F> JobRunner for LocalJobRunner<F>
where
    F: Fn(&Job) -> Result<(GridSpec, FxHashMap<String, Vec<f64>>)> + Send + Sync,
{
    fn submit(&self, job: Job) -> Result<JobHandle> {
        let id = job.id.clone();
        // Idempotent resubmit: a job already recorded under this id is
        // treated as already-submitted, not re-run (spec.md §4.3).
        if self.results.lock().expect("job result lock poisoned").contains_key(&id) {
            return Ok(JobHandle(id));
        }
        let (grid, values) = (self.run)(&job)?;
        self.results
            .lock()
            .expect("job result lock poisoned")
            .insert(id.clone(), JobOutput { job_id: id.clone(), grid, values });
        Ok(JobHandle(id))
    }

    fn output(&self, handle: &JobHandle) -> Result<Option<JobOutput>> {
        Ok(self.results.lock().expect("job result lock poisoned").get(&handle.0).cloned())
    }

    fn delete(&self, handle: &JobHandle) -> Result<()> {
        self.results.lock().expect("job result lock poisoned").remove(&handle.0);
        Ok(())
    }
}
