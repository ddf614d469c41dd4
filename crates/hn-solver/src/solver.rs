//! Picard fixed-point iteration over the linearised network equations.

use tracing::{debug, warn};

use crate::error::{SolverError, SolverResult};
use crate::linear_system::LinearSystem;
use crate::network::Network;

/// Solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Iteration cap per solve
    pub max_iterations: usize,
    /// Relative change tolerance
    pub rel_tolerance: f64,
    /// Absolute change tolerance
    pub abs_tolerance: f64,
    /// Generate rows on the rayon pool
    pub parallel_assembly: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            rel_tolerance: 1e-6,
            abs_tolerance: 1e-6,
            parallel_assembly: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Converged,
    /// Iteration cap reached or the system became singular.
    Exhausted,
}

/// Result of one inner solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub iterations: usize,
    pub max_relative_change: f64,
    pub max_absolute_change: f64,
    /// The last iteration hit a singular matrix.
    pub singular: bool,
}

impl SolveOutcome {
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }
}

/// Owns the linear system for one network layout.
///
/// Non-convergence is not an error: [`Solver::solve`] returns an outcome
/// with [`SolveStatus::Exhausted`] and logs a warning. Errors are reserved
/// for malformed systems.
#[derive(Debug, Clone)]
pub struct Solver {
    config: SolverConfig,
    system: LinearSystem,
}

impl Solver {
    /// Validates the network, assigns indices and sizes the system.
    pub fn new(network: &mut Network, config: SolverConfig) -> SolverResult<Self> {
        network.validate()?;
        let unknowns = network.assign_indices();
        if unknowns == 0 {
            return Err(SolverError::Setup {
                what: "network has no unknowns".into(),
            });
        }
        debug!(unknowns, "solver initialised");
        Ok(Self {
            config,
            system: LinearSystem::new(unknowns),
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn system(&self) -> &LinearSystem {
        &self.system
    }

    /// Iterates from zeroed caches until the solution stops changing.
    pub fn solve(&mut self, network: &mut Network) -> SolverResult<SolveOutcome> {
        match network.total_unknowns() {
            Some(n) if n == self.system.unknowns() => {}
            _ => {
                return Err(SolverError::Setup {
                    what: "network layout changed since the solver was created".into(),
                });
            }
        }
        network.reset_prev_solutions();
        self.system.reset_solution();

        let mut iterations = 0;
        loop {
            iterations += 1;
            let rows = network.collect_equations(self.config.parallel_assembly)?;
            self.system.load(&rows)?;
            match self.system.solve() {
                Ok(()) => {}
                Err(SolverError::Singular) => {
                    warn!(iteration = iterations, "singular system, stopping iteration");
                    return Ok(SolveOutcome {
                        status: SolveStatus::Exhausted,
                        iterations,
                        max_relative_change: f64::INFINITY,
                        max_absolute_change: f64::INFINITY,
                        singular: true,
                    });
                }
                Err(e) => return Err(e),
            }
            network.distribute(self.system.solution().as_slice())?;

            let (rel, abs) = self.system.max_changes();
            debug!(iteration = iterations, rel, abs, "picard iteration");

            if self.system.is_converged(self.config.rel_tolerance, self.config.abs_tolerance) {
                return Ok(SolveOutcome {
                    status: SolveStatus::Converged,
                    iterations,
                    max_relative_change: rel,
                    max_absolute_change: abs,
                    singular: false,
                });
            }
            if iterations >= self.config.max_iterations {
                warn!(
                    iterations,
                    rel, abs, "solver did not converge within the iteration cap"
                );
                return Ok(SolveOutcome {
                    status: SolveStatus::Exhausted,
                    iterations,
                    max_relative_change: rel,
                    max_absolute_change: abs,
                    singular: false,
                });
            }
        }
    }
}
