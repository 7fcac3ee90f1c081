//! The main simulation loop (spec.md §4.2 "Run to steady state"):
//! `Init` once, `Run` until converged or capped, `Cleanup` once.

use crate::domain::domain::Domain;
use crate::error::Result;
use tracing::{info, instrument};

/// Bound on total `Run` steps even when no `SteadyStateConvergenceCheck`
/// manipulator is installed, so a misconfigured `Domain` can't loop
/// forever.
const HARD_STEP_CAP: usize = 100_000;

#[instrument(skip_all)]
pub fn run_to_steady_state(domain: &mut Domain) -> Result<()> {
    domain.run_init()?;

    while !domain.converged && domain.step < HARD_STEP_CAP {
        domain.run_step()?;
    }

    if domain.step >= HARD_STEP_CAP && !domain.converged {
        info!(step = domain.step, "hit hard step cap without converging");
    }

    domain.run_cleanup()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Meters, Polygon, Rect};
    use crate::domain::{ConvergenceConfig, SteadyStateConvergenceCheck};
    use crate::grid::{Cell, Emissions};
    use crate::mechanism::SimpleChem;
    use std::sync::Arc;

    #[test]
    fn loop_stops_once_convergence_check_signals_done() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let cell = Cell::new(0, poly, 0, Meters::new(1.0), 8);
        let mut domain = Domain::new(vec![cell], Arc::new(SimpleChem::new()), Emissions::default());
        let (check, _rx) = SteadyStateConvergenceCheck::new(ConvergenceConfig {
            window: 2,
            epsilon: 1.0, // trivially satisfied immediately
            num_iterations_cap: None,
        });
        domain.run.push(Box::new(check));
        run_to_steady_state(&mut domain).unwrap();
        assert!(domain.converged);
        assert!(domain.step < HARD_STEP_CAP);
    }

    #[test]
    fn loop_respects_iteration_cap_even_without_convergence() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let cell = Cell::new(0, poly, 0, Meters::new(1.0), 8);
        let mut domain = Domain::new(vec![cell], Arc::new(SimpleChem::new()), Emissions::default());
        let (check, _rx) = SteadyStateConvergenceCheck::new(ConvergenceConfig {
            window: 5,
            epsilon: 1e-12,
            num_iterations_cap: Some(4),
        });
        domain.run.push(Box::new(check));
        run_to_steady_state(&mut domain).unwrap();
        assert!(domain.converged);
        assert_eq!(domain.step, 4);
    }
}
