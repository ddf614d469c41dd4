//! Junction equations.

use hn_core::NodeId;
use hn_fluids::FluidTable;

use crate::equation::{EquationRow, QUANTITIES_PER_PORT, Unknown};

/// Initial junction temperature used while a junction carries no flow [K].
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 293.15;

/// Throughput below which a junction's energy is pinned to its initial value.
pub const MIN_THROUGHPUT: f64 = 1e-9;

/// A connected element port as seen from its junction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePort {
    pub mass_flow_index: usize,
    pub energy_index: usize,
    /// Previous iterate of the port mass flow, positive leaving the junction.
    pub prev_mass_flow: f64,
}

/// Junction state: `[m_ext, P, u]` in one block of unknowns.
///
/// `m_ext` is an external injection kept at zero; it closes the block so
/// every junction contributes exactly three rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    pub initial_temperature: f64,
    matrix_index: usize,
    prev_sol: [f64; QUANTITIES_PER_PORT],
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            matrix_index: 0,
            prev_sol: [0.0; QUANTITIES_PER_PORT],
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn number_of_unknowns(&self) -> usize {
        QUANTITIES_PER_PORT
    }

    pub fn matrix_index(&self) -> usize {
        self.matrix_index
    }

    pub fn set_matrix_index(&mut self, matrix_index: usize) {
        self.matrix_index = matrix_index;
    }

    pub fn prev_sol(&self) -> &[f64] {
        &self.prev_sol
    }

    pub fn set_prev_sol(&mut self, values: [f64; QUANTITIES_PER_PORT]) {
        self.prev_sol = values;
    }

    pub fn reset_prev_sol(&mut self) {
        self.prev_sol = [0.0; QUANTITIES_PER_PORT];
    }

    pub fn pressure(&self) -> f64 {
        self.prev_sol[Unknown::Pressure.offset()]
    }

    pub fn internal_energy(&self) -> f64 {
        self.prev_sol[Unknown::InternalEnergy.offset()]
    }

    pub fn temperature(&self, fluid: &FluidTable) -> f64 {
        fluid.temperature(self.internal_energy())
    }

    fn index(&self, unknown: Unknown) -> usize {
        self.matrix_index + unknown.offset()
    }

    /// Injection, mass balance and energy mixing rows.
    ///
    /// The mixing row `Σ m_k·u_k = 0` uses flows from the previous iterate.
    /// Without throughput it degenerates, so the junction energy is pinned to
    /// the value at `initial_temperature` instead.
    pub fn equations(&self, ports: &[NodePort], fluid: &FluidTable) -> Vec<EquationRow> {
        let injection = EquationRow::new([(self.index(Unknown::MassFlow), 1.0)], 0.0);

        let continuity = EquationRow::new(
            ports
                .iter()
                .map(|p| (p.mass_flow_index, 1.0))
                .chain(std::iter::once((self.index(Unknown::MassFlow), -1.0))),
            0.0,
        );

        let throughput = 0.5 * ports.iter().map(|p| p.prev_mass_flow.abs()).sum::<f64>();
        let energy = if throughput < MIN_THROUGHPUT {
            EquationRow::new(
                [(self.index(Unknown::InternalEnergy), 1.0)],
                fluid.internal_energy(self.initial_temperature),
            )
        } else {
            EquationRow::new(
                ports.iter().map(|p| (p.energy_index, p.prev_mass_flow)),
                0.0,
            )
        };

        vec![injection, continuity, energy]
    }
}
