//! Outer per-timestep loop coupling the controller to the solver.

use chrono::{DateTime, Utc};
use hn_controls::{Controller, SetpointMap};
use hn_solver::{Network, SolveOutcome, Solver, SolverConfig};
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::progress::{ProgressReporter, SimProgress};
use crate::results::ResultTable;

/// Requested heat below which delivery is not checked [W].
const MIN_CHECKED_HEAT: f64 = 1e-6;

/// Outcome of one delivery pass.
#[derive(Debug, Clone, Copy, Default)]
struct DeliveryCheck {
    corrected: usize,
    missed: usize,
}

/// Convergence summary for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub step: usize,
    pub time: DateTime<Utc>,
    /// Inner solve converged and every delivery matched its setpoint.
    pub converged: bool,
    /// Inner iterations summed over all outer passes
    pub inner_iterations: usize,
    pub outer_iterations: usize,
}

/// Outputs of a completed run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub table: ResultTable,
    pub steps: Vec<StepReport>,
}

impl SimulationResult {
    pub fn all_converged(&self) -> bool {
        self.steps.iter().all(|s| s.converged)
    }
}

/// A network, its controller and the time grid to run them on.
pub struct Simulation<C: Controller> {
    config: SimulationConfig,
    solver_config: SolverConfig,
    network: Network,
    controller: C,
}

impl<C: Controller> Simulation<C> {
    pub fn new(config: SimulationConfig, network: Network, controller: C) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            solver_config: SolverConfig::default(),
            network,
            controller,
        })
    }

    pub fn with_solver_config(mut self, solver_config: SolverConfig) -> Self {
        self.solver_config = solver_config;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn run(&mut self) -> SimResult<SimulationResult> {
        self.run_with(|_| {}, None)
    }

    /// Runs every timestep, reporting progress and honouring `cancel`
    /// between timesteps.
    pub fn run_with(
        &mut self,
        mut progress: impl FnMut(&SimProgress),
        cancel: Option<&CancellationToken>,
    ) -> SimResult<SimulationResult> {
        let steps = self.config.number_of_time_steps();
        info!(id = %self.config.id, steps, "simulation started");

        let mut solver = Solver::new(&mut self.network, self.solver_config.clone())?;
        let mut table = ResultTable::new();
        for element in self.network.elements() {
            table.set_element_name(element.id(), element.name());
        }
        let mut reports = Vec::with_capacity(steps);
        let mut reporter = ProgressReporter::new(steps, self.config.progress_messages);

        for step in 0..steps {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                info!(step, "simulation cancelled");
                return Err(SimError::Cancelled { step });
            }
            let time = self.config.time_at(step);
            let setpoints = self.controller.update_setpoints(time)?;
            self.apply_setpoints(step, &setpoints)?;

            let report = self.solve_timestep(&mut solver, step, time)?;
            for element in self.network.elements_mut() {
                element.commit_timestep(self.config.timestep_s);
            }
            for element in self.network.elements() {
                self.controller.observe(element);
            }
            let fluid = self.network.fluid_handle();
            table.record(
                time,
                self.network
                    .elements()
                    .flat_map(|e| e.outputs(&fluid).into_iter().map(move |o| (e.id(), o))),
            );
            reports.push(report);

            if let Some(p) = reporter.advance(step + 1) {
                progress(&p);
            }
        }

        let unconverged = reports.iter().filter(|r| !r.converged).count();
        info!(steps, unconverged, "simulation finished");
        Ok(SimulationResult {
            table,
            steps: reports,
        })
    }

    fn apply_setpoints(&mut self, step: usize, setpoints: &SetpointMap) -> SimResult<()> {
        let fluid = self.network.fluid_handle();
        for (id, values) in setpoints {
            let element = self
                .network
                .element_mut(*id)
                .ok_or(SimError::UnknownElement { step, element: *id })?;
            element
                .set_setpoints(values, &fluid)
                .map_err(|e| SimError::from_component(step, e))?;
        }
        Ok(())
    }

    /// Solves, then re-solves with rescaled flows while any element misses
    /// its requested heat by more than the delivery tolerance.
    fn solve_timestep(
        &mut self,
        solver: &mut Solver,
        step: usize,
        time: DateTime<Utc>,
    ) -> SimResult<StepReport> {
        let mut inner_iterations = 0;
        let mut outer = 0;
        let mut delivered = false;
        let mut outcome: SolveOutcome;
        loop {
            outer += 1;
            outcome = solver.solve(&mut self.network)?;
            inner_iterations += outcome.iterations;
            if !outcome.converged() {
                break;
            }
            let DeliveryCheck { corrected, missed } = self.correct_deliveries();
            if corrected == 0 {
                delivered = missed == 0;
                if !delivered {
                    warn!(step, missed, "requested heat cannot be delivered");
                }
                break;
            }
            debug!(step, outer, corrected, "delivery mismatch, re-solving");
            if outer >= self.config.max_outer_iterations {
                warn!(step, outer, "delivery did not converge within the outer cap");
                break;
            }
        }
        if !outcome.converged() {
            warn!(step, iterations = outcome.iterations, "timestep did not converge");
        }
        Ok(StepReport {
            step,
            time,
            converged: outcome.converged() && delivered,
            inner_iterations,
            outer_iterations: outer,
        })
    }

    /// Rescales prescribed flows of elements whose delivered heat misses the
    /// request. Elements delivering nothing, or heat of the wrong sign, cannot
    /// be rescaled and are counted as missed.
    fn correct_deliveries(&mut self) -> DeliveryCheck {
        let tolerance = self.config.delivery_tolerance;
        let mut check = DeliveryCheck::default();
        for element in self.network.elements_mut() {
            let Some(requested) = element.requested_heat() else {
                continue;
            };
            let delivered = element.heat_supplied();
            if requested.abs() < MIN_CHECKED_HEAT {
                continue;
            }
            if delivered.abs() < MIN_CHECKED_HEAT || requested.signum() != delivered.signum() {
                check.missed += 1;
                continue;
            }
            let mismatch = (delivered - requested).abs() / requested.abs();
            if mismatch > tolerance {
                element.rescale_mass_flow(requested / delivered);
                check.corrected += 1;
            }
        }
        check
    }
}
