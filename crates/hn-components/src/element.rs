//! Network element: one variant plus its place in the unknown vector.

use hn_core::ElementId;
use hn_fluids::FluidTable;
use hn_graph::PortLayout;

use crate::boundary::Boundary;
use crate::equation::{EquationRow, PortView, QUANTITIES_PER_PORT, Unknown};
use crate::error::{ComponentError, ComponentResult};
use crate::heat_boundary::{Demand, Production};
use crate::heat_transfer::HeatTransfer;
use crate::output::{OutputValue, Quantity};
use crate::pipe::Pipe;
use crate::setpoint::{SetpointKey, Setpoints};
use crate::storage::Storage;

/// Supported element variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Boundary(Boundary),
    Pipe(Pipe),
    Production(Production),
    Demand(Demand),
    HeatTransfer(HeatTransfer),
    Storage(Storage),
}

impl ElementKind {
    pub fn port_count(&self) -> usize {
        match self {
            ElementKind::Boundary(_) => 1,
            ElementKind::Pipe(_)
            | ElementKind::Production(_)
            | ElementKind::Demand(_)
            | ElementKind::Storage(_) => 2,
            ElementKind::HeatTransfer(_) => 4,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Boundary(_) => "boundary",
            ElementKind::Pipe(_) => "pipe",
            ElementKind::Production(_) => "production",
            ElementKind::Demand(_) => "demand",
            ElementKind::HeatTransfer(_) => "heat_transfer",
            ElementKind::Storage(_) => "storage",
        }
    }

    /// Ports that belong to the same hydraulic circuit.
    pub fn port_layout(&self) -> PortLayout {
        match self {
            ElementKind::HeatTransfer(_) => PortLayout::split(&[2, 2]),
            other => PortLayout::single(other.port_count()),
        }
    }
}

/// A network element with its solver bookkeeping.
///
/// `prev_sol` holds `[m, P, u]` per port from the latest iterate and drives
/// the linearisation of the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    name: String,
    kind: ElementKind,
    matrix_index: usize,
    prev_sol: Vec<f64>,
}

impl Element {
    pub fn new(id: ElementId, name: impl Into<String>, kind: ElementKind) -> Self {
        let unknowns = kind.port_count() * QUANTITIES_PER_PORT;
        Self {
            id,
            name: name.into(),
            kind,
            matrix_index: 0,
            prev_sol: vec![0.0; unknowns],
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ElementKind {
        &mut self.kind
    }

    pub fn port_count(&self) -> usize {
        self.kind.port_count()
    }

    pub fn number_of_unknowns(&self) -> usize {
        self.port_count() * QUANTITIES_PER_PORT
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

    pub fn set_prev_sol(&mut self, values: &[f64]) -> ComponentResult<()> {
        if values.len() != self.prev_sol.len() {
            return Err(ComponentError::SolutionLength {
                expected: self.prev_sol.len(),
                actual: values.len(),
            });
        }
        self.prev_sol.copy_from_slice(values);
        Ok(())
    }

    pub fn reset_prev_sol(&mut self) {
        self.prev_sol.fill(0.0);
    }

    /// Whether this port fixes the pressure of its hydraulic circuit.
    pub fn sets_pressure(&self, port: usize) -> bool {
        match &self.kind {
            ElementKind::Boundary(b) => !b.prescribe_mass_flow,
            ElementKind::Production(p) => !p.prescribe_mass_flow && port == 1,
            ElementKind::HeatTransfer(h) => !h.prescribe_mass_flow_secondary && port == 3,
            _ => false,
        }
    }

    fn check_port(&self, port: usize) -> ComponentResult<()> {
        if port >= self.port_count() {
            return Err(ComponentError::PortOutOfRange {
                element: self.name.clone(),
                port,
                count: self.port_count(),
            });
        }
        Ok(())
    }

    fn value(&self, port: usize, unknown: Unknown) -> ComponentResult<f64> {
        self.check_port(port)?;
        Ok(self.prev_sol[port * QUANTITIES_PER_PORT + unknown.offset()])
    }

    pub fn mass_flow(&self, port: usize) -> ComponentResult<f64> {
        self.value(port, Unknown::MassFlow)
    }

    pub fn pressure(&self, port: usize) -> ComponentResult<f64> {
        self.value(port, Unknown::Pressure)
    }

    pub fn internal_energy(&self, port: usize) -> ComponentResult<f64> {
        self.value(port, Unknown::InternalEnergy)
    }

    pub fn temperature(&self, port: usize, fluid: &FluidTable) -> ComponentResult<f64> {
        Ok(fluid.temperature(self.internal_energy(port)?))
    }

    /// Rows for the current iterate. `nodes[i]` is the `matrix_index` of the
    /// junction at port `i`.
    pub fn equations(
        &self,
        nodes: &[usize],
        fluid: &FluidTable,
    ) -> ComponentResult<Vec<EquationRow>> {
        if nodes.len() != self.port_count() {
            return Err(ComponentError::PortOutOfRange {
                element: self.name.clone(),
                port: nodes.len(),
                count: self.port_count(),
            });
        }
        let ports = PortView::new(self.matrix_index, &self.prev_sol, nodes);
        Ok(match &self.kind {
            ElementKind::Boundary(b) => b.equations(&ports, fluid),
            ElementKind::Pipe(p) => p.equations(&ports, fluid),
            ElementKind::Production(p) => p.equations(&ports, fluid),
            ElementKind::Demand(d) => d.equations(&ports, fluid),
            ElementKind::HeatTransfer(h) => h.equations(&ports, fluid),
            ElementKind::Storage(s) => s.equations(&ports, fluid),
        })
    }

    pub fn required_setpoints(&self) -> Vec<SetpointKey> {
        match &self.kind {
            ElementKind::Boundary(b) => b.required_setpoints(),
            ElementKind::Pipe(_) => Vec::new(),
            ElementKind::Production(p) => p.required_setpoints(),
            ElementKind::Demand(d) => d.required_setpoints(),
            ElementKind::HeatTransfer(h) => h.required_setpoints(),
            ElementKind::Storage(s) => s.required_setpoints(),
        }
    }

    /// Applies controller setpoints, deriving flow setpoints where needed.
    ///
    /// Fails with the full list of missing keys before touching any state.
    pub fn set_setpoints(
        &mut self,
        setpoints: &Setpoints,
        fluid: &FluidTable,
    ) -> ComponentResult<()> {
        let missing = setpoints.missing(&self.required_setpoints());
        if !missing.is_empty() {
            return Err(ComponentError::MissingSetpoint {
                element: self.id,
                name: self.name.clone(),
                keys: missing,
            });
        }
        match &mut self.kind {
            ElementKind::Boundary(b) => b.apply_setpoints(setpoints),
            ElementKind::Pipe(_) => Ok(()),
            ElementKind::Production(p) => p.apply_setpoints(setpoints, fluid),
            ElementKind::Demand(d) => d.apply_setpoints(setpoints, fluid),
            ElementKind::HeatTransfer(h) => h.apply_setpoints(setpoints, fluid),
            ElementKind::Storage(s) => s.apply_setpoints(setpoints, fluid),
        }
    }

    /// Heat exchanged in the element's nominal direction [W].
    ///
    /// Producers report heat added to the network, consumers and charging
    /// storage heat taken from it, heat transfer the secondary heat and pipes
    /// the negative of their loss.
    pub fn heat_supplied(&self) -> f64 {
        let m = |p: usize| self.prev_sol[p * QUANTITIES_PER_PORT];
        let u = |p: usize| self.prev_sol[p * QUANTITIES_PER_PORT + 2];
        match &self.kind {
            ElementKind::Boundary(_) => 0.0,
            ElementKind::Pipe(_) => -(m(0) * u(0) + m(1) * u(1)),
            ElementKind::Production(_) => m(0) * (u(1) - u(0)),
            ElementKind::Demand(_) | ElementKind::Storage(_) => m(0) * (u(0) - u(1)),
            ElementKind::HeatTransfer(_) => m(2) * (u(3) - u(2)),
        }
    }

    /// Heat the element was asked to deliver, if its flow is prescribed from it.
    pub fn requested_heat(&self) -> Option<f64> {
        match &self.kind {
            ElementKind::Production(p) => p.requested_heat(),
            ElementKind::Demand(d) => Some(d.heat_demand),
            ElementKind::HeatTransfer(h) => h.requested_heat(),
            ElementKind::Storage(s) => s.requested_heat(),
            ElementKind::Boundary(_) | ElementKind::Pipe(_) => None,
        }
    }

    /// Scales the prescribed mass flow, used to correct delivered heat.
    pub fn rescale_mass_flow(&mut self, factor: f64) {
        match &mut self.kind {
            ElementKind::Production(p) if p.prescribe_mass_flow => p.mass_flow *= factor,
            ElementKind::Demand(d) => d.mass_flow *= factor,
            ElementKind::HeatTransfer(h) if h.prescribe_mass_flow_secondary => {
                h.mass_flow_secondary *= factor
            }
            ElementKind::Storage(s) => s.mass_flow *= factor,
            _ => {}
        }
    }

    /// End-of-timestep bookkeeping.
    pub fn commit_timestep(&mut self, dt: f64) {
        let power = self.heat_supplied();
        if let ElementKind::Storage(s) = &mut self.kind {
            s.accumulate(power, dt);
        }
    }

    /// Values recorded for this element after a timestep.
    pub fn outputs(&self, fluid: &FluidTable) -> Vec<OutputValue> {
        let mut out = Vec::with_capacity(self.port_count() * 3 + 2);
        for port in 0..self.port_count() {
            let base = port * QUANTITIES_PER_PORT;
            out.push(OutputValue::port(port, Quantity::MassFlow, self.prev_sol[base]));
            out.push(OutputValue::port(port, Quantity::Pressure, self.prev_sol[base + 1]));
            out.push(OutputValue::port(
                port,
                Quantity::Temperature,
                fluid.temperature(self.prev_sol[base + 2]),
            ));
        }
        let p = |port: usize| self.prev_sol[port * QUANTITIES_PER_PORT + 1];
        match &self.kind {
            ElementKind::Boundary(_) => {}
            ElementKind::Pipe(_) => {
                out.push(OutputValue::element(Quantity::PressureLoss, p(0) - p(1)));
                out.push(OutputValue::element(Quantity::HeatLoss, -self.heat_supplied()));
            }
            ElementKind::Production(_) | ElementKind::Demand(_) => {
                out.push(OutputValue::element(Quantity::HeatSupplied, self.heat_supplied()));
            }
            ElementKind::HeatTransfer(h) => {
                let q = self.heat_supplied();
                out.push(OutputValue::element(Quantity::HeatSupplied, q));
                out.push(OutputValue::element(
                    Quantity::ElectricityConsumption,
                    h.kind.electricity(q),
                ));
            }
            ElementKind::Storage(s) => {
                out.push(OutputValue::element(Quantity::HeatSupplied, self.heat_supplied()));
                out.push(OutputValue::element(Quantity::StoredEnergy, s.stored_energy));
            }
        }
        out
    }
}
