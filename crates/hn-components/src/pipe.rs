//! Pipe with Darcy-Weisbach friction and optional heat loss.

use std::f64::consts::PI;

use hn_core::units::constants::G0_MPS2;
use hn_core::units::Length;
use hn_fluids::FluidTable;

use crate::direction::FlowDirection;
use crate::equation::{EquationRow, PortView, Unknown};
use crate::error::{ComponentError, ComponentResult};

/// Flow magnitude used in the linearised friction term when the previous
/// iterate is (near) stagnant (kg/s).
pub const MIN_LINEARIZATION_FLOW: f64 = 1e-3;

const LAMINAR_FLOOR_REYNOLDS: f64 = 100.0;
const TURBULENT_REYNOLDS: f64 = 2000.0;
const COLEBROOK_TOLERANCE: f64 = 1e-4;
const COLEBROOK_MAX_ITER: usize = 100;
const COLEBROOK_START: f64 = 0.02;

/// Two-port pipe. Port 0 is the nominal inlet, port 1 the outlet.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub length: Length,
    /// Inner diameter
    pub diameter: Length,
    /// Absolute wall roughness
    pub roughness: Length,
    /// Heat transfer coefficient to the surroundings [W/(m²·K)].
    pub alpha_value: f64,
    /// Temperature of the surroundings [K].
    pub external_temperature: f64,
    /// Additional heat extracted from the fluid [W].
    pub q_heat_external: f64,
}

impl Pipe {
    pub fn new(length: Length, diameter: Length, roughness: Length) -> ComponentResult<Self> {
        let invalid = |what: &str| ComponentError::InvalidParameter {
            element: "pipe".into(),
            what: what.into(),
        };
        if !(diameter.value.is_finite() && diameter.value > 0.0) {
            return Err(invalid("diameter must be positive"));
        }
        if !(length.value.is_finite() && length.value >= 0.0) {
            return Err(invalid("length must be non-negative"));
        }
        if !(roughness.value.is_finite() && roughness.value >= 0.0) {
            return Err(invalid("roughness must be non-negative"));
        }
        Ok(Self {
            length,
            diameter,
            roughness,
            alpha_value: 0.0,
            external_temperature: 283.15,
            q_heat_external: 0.0,
        })
    }

    pub fn with_heat_loss(mut self, alpha_value: f64, external_temperature: f64) -> Self {
        self.alpha_value = alpha_value;
        self.external_temperature = external_temperature;
        self
    }

    pub fn with_external_heat(mut self, q_heat_external: f64) -> Self {
        self.q_heat_external = q_heat_external;
        self
    }

    pub fn area(&self) -> f64 {
        PI * self.diameter.value.powi(2) / 4.0
    }

    pub fn reynolds(&self, mass_flow: f64, viscosity: f64) -> f64 {
        mass_flow.abs() * self.diameter.value / (self.area() * viscosity)
    }

    /// `K = λ·L / (2·D·A²·g)`, so that `Δp = g·K·m·|m| / ρ`.
    pub fn loss_coefficient(&self, friction_factor: f64) -> f64 {
        friction_factor * self.length.value
            / (2.0 * self.diameter.value * self.area().powi(2) * G0_MPS2)
    }

    /// Pressure drop inlet to outlet for a given flow [Pa].
    pub fn pressure_drop(&self, mass_flow: f64, density: f64, viscosity: f64) -> f64 {
        let lambda = friction_factor(
            self.reynolds(mass_flow, viscosity),
            self.roughness.value,
            self.diameter.value,
        );
        G0_MPS2 * self.loss_coefficient(lambda) * mass_flow * mass_flow.abs() / density
    }

    /// Heat lost between inlet and outlet [W] for the given inlet state.
    ///
    /// The ambient share is limited so the outlet cannot cool below the
    /// surroundings.
    pub fn heat_loss(&self, fluid: &FluidTable, inlet_energy: f64, mass_flow: f64) -> f64 {
        let t_in = fluid.temperature(inlet_energy);
        let mut ambient = self.alpha_value
            * PI
            * self.diameter.value
            * self.length.value
            * (t_in - self.external_temperature);
        if ambient > 0.0 {
            let u_ext = fluid.internal_energy(self.external_temperature);
            let limit = mass_flow.abs() * (inlet_energy - u_ext);
            ambient = ambient.min(limit.max(0.0));
        }
        self.q_heat_external + ambient
    }

    pub(crate) fn equations(&self, ports: &PortView<'_>, fluid: &FluidTable) -> Vec<EquationRow> {
        let direction = ports.direction(0);
        let upstream = if direction.is_reverse() { 1 } else { 0 };
        let t_up = fluid.temperature(ports.prev(upstream, Unknown::InternalEnergy));
        let density = fluid.density(t_up);
        let viscosity = fluid.viscosity(t_up);

        let m_k = ports.prev(0, Unknown::MassFlow);
        let lambda = friction_factor(
            self.reynolds(m_k, viscosity),
            self.roughness.value,
            self.diameter.value,
        );
        // K is head per volumetric flow²; g/ρ turns it into Pa per (kg/s)².
        let c = G0_MPS2 * self.loss_coefficient(lambda) / density;
        let slope = m_k.abs().max(MIN_LINEARIZATION_FLOW);

        let mut rows = Vec::with_capacity(6);
        rows.push(ports.pressure_to_node(0));
        rows.push(ports.pressure_to_node(1));
        rows.push(ports.continuity(0, 1));
        // P1 − P0 + c(|m_k| + s)·m = c|m_k|m_k; tangent of −c|m|m once |m_k| ≥ s.
        rows.push(EquationRow::new(
            [
                (ports.index(1, Unknown::Pressure), 1.0),
                (ports.index(0, Unknown::Pressure), -1.0),
                (ports.index(0, Unknown::MassFlow), c * (m_k.abs() + slope)),
            ],
            c * m_k.abs() * m_k,
        ));

        match direction {
            FlowDirection::Zero => {
                rows.push(ports.energy_from_node(0));
                rows.push(ports.energy_from_node(1));
            }
            FlowDirection::Forward => {
                rows.push(ports.energy_from_node(0));
                rows.push(self.outflow_row(ports, fluid, 0, 1));
            }
            FlowDirection::Reverse => {
                rows.push(ports.energy_from_node(1));
                rows.push(self.outflow_row(ports, fluid, 1, 0));
            }
        }
        rows
    }

    /// `|m|·(u_out − u_in) = −Q_loss` with flow and loss from the previous iterate.
    fn outflow_row(
        &self,
        ports: &PortView<'_>,
        fluid: &FluidTable,
        inlet: usize,
        outlet: usize,
    ) -> EquationRow {
        let m_in = ports.prev(inlet, Unknown::MassFlow).abs();
        let q_loss = self.heat_loss(fluid, ports.prev(inlet, Unknown::InternalEnergy), m_in);
        EquationRow::new(
            [
                (ports.index(outlet, Unknown::InternalEnergy), m_in),
                (ports.index(inlet, Unknown::InternalEnergy), -m_in),
            ],
            -q_loss,
        )
    }
}

/// Darcy friction factor.
///
/// Below Re = 100 the laminar value is frozen at 0.64, up to Re = 2000 it is
/// `64/Re`, above that the Colebrook-White equation is iterated.
pub fn friction_factor(reynolds: f64, roughness: f64, diameter: f64) -> f64 {
    if reynolds < LAMINAR_FLOOR_REYNOLDS {
        64.0 / LAMINAR_FLOOR_REYNOLDS
    } else if reynolds < TURBULENT_REYNOLDS {
        64.0 / reynolds
    } else {
        colebrook_white(reynolds, roughness / diameter)
    }
}

fn colebrook_white(reynolds: f64, relative_roughness: f64) -> f64 {
    let mut lambda = COLEBROOK_START;
    for _ in 0..COLEBROOK_MAX_ITER {
        let rhs = -2.0
            * (relative_roughness / 3.7 + 2.51 / (reynolds * lambda.sqrt())).log10();
        let next = 1.0 / (rhs * rhs);
        if (next - lambda).abs() < COLEBROOK_TOLERANCE {
            return next;
        }
        lambda = next;
    }
    lambda
}
