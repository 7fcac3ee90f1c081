//! `SteadyStateConvergenceCheck`: two-window mean-concentration convergence
//! test, publishing status on a bounded, never-blocking channel (spec.md
//! §4.2 "Convergence").
//!
//! The channel is grounded in `freddiehaddad-oxidized`'s bounded
//! `crossbeam-channel` use for status fan-out: a slow or absent consumer
//! must never stall the simulation loop, so a full channel drops its oldest
//! queued status in favor of the newest rather than blocking `try_send`.

use crate::domain::domain::Domain;
use crate::domain::manipulator::DomainManipulator;
use crate::error::Result;
use crossbeam_channel::{Receiver, Sender};
use std::collections::VecDeque;
use std::sync::Mutex;

const STATUS_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy)]
pub enum ConvergenceStatus {
    Progress {
        step: usize,
        window_mean: f64,
        relative_change: f64,
    },
    Converged {
        step: usize,
    },
    IterationCapReached {
        step: usize,
    },
}

/// Resolves spec.md §9's open question on `NumIterations`: `None` means
/// "detect convergence only, no cap"; `Some(n)` is always an *additional*
/// cap checked every step regardless of whether convergence has already
/// been detected (see SPEC_FULL.md §4.2).
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceConfig {
    /// Number of steps averaged per comparison window.
    pub window: usize,
    /// Relative change below which the two windows are "the same".
    pub epsilon: f64,
    pub num_iterations_cap: Option<usize>,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        ConvergenceConfig {
            window: 10,
            epsilon: 1e-4,
            num_iterations_cap: None,
        }
    }
}

pub struct SteadyStateConvergenceCheck {
    config: ConvergenceConfig,
    history: Mutex<VecDeque<f64>>,
    tx: Sender<ConvergenceStatus>,
    drain: Receiver<ConvergenceStatus>,
}

impl SteadyStateConvergenceCheck {
    /// Build the manipulator plus the `Receiver` callers should poll for
    /// status updates.
    #[must_use]
    pub fn new(config: ConvergenceConfig) -> (Self, Receiver<ConvergenceStatus>) {
        let (tx, rx) = crossbeam_channel::bounded(STATUS_CHANNEL_CAPACITY);
        let drain = rx.clone();
        (
            SteadyStateConvergenceCheck {
                config,
                history: Mutex::new(VecDeque::new()),
                tx,
                drain,
            },
            rx,
        )
    }

    fn publish(&self, status: ConvergenceStatus) {
        if self.tx.try_send(status).is_err() {
            let _ = self.drain.try_recv();
            let _ = self.tx.try_send(status);
        }
    }
}

fn mean_total_concentration(domain: &Domain) -> f64 {
    if domain.cells.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    let mut n = 0usize;
    for cell in &domain.cells {
        for c in &cell.cf {
            total += c.value();
            n += 1;
        }
    }
    if n == 0 {
        0.0
    } else {
        total / n as f64
    }
}

impl DomainManipulator for SteadyStateConvergenceCheck {
    fn name(&self) -> &'static str {
        "SteadyStateConvergenceCheck"
    }

    fn run(&self, domain: &mut Domain) -> Result<()> {
        let mean = mean_total_concentration(domain);
        let window = self.config.window.max(1);

        let mut history = self.history.lock().expect("convergence history lock poisoned");
        history.push_back(mean);
        while history.len() > 2 * window {
            history.pop_front();
        }

        if history.len() >= 2 * window {
            let n = history.len();
            let recent: f64 = history.iter().skip(n - window).sum::<f64>() / window as f64;
            let previous: f64 = history.iter().skip(n - 2 * window).take(window).sum::<f64>() / window as f64;
            let relative_change = if previous.abs() > 1e-12 {
                ((recent - previous) / previous).abs()
            } else {
                0.0
            };
            self.publish(ConvergenceStatus::Progress {
                step: domain.step,
                window_mean: recent,
                relative_change,
            });
            if relative_change < self.config.epsilon {
                domain.converged = true;
                self.publish(ConvergenceStatus::Converged { step: domain.step });
            }
        }
        drop(history);

        if let Some(cap) = self.config.num_iterations_cap {
            if domain.step + 1 >= cap {
                domain.converged = true;
                self.publish(ConvergenceStatus::IterationCapReached { step: domain.step });
            }
        }
        Ok(())
    }
}
