//! Four-port heat transfer between two hydraulically separate circuits.
//!
//! Ports: 0 primary inlet, 1 primary outlet, 2 secondary inlet, 3 secondary
//! outlet. The primary side gives up heat, the secondary side receives it.

use hn_fluids::FluidTable;
use serde::{Deserialize, Serialize};

use crate::direction::FlowDirection;
use crate::equation::{EquationRow, PortView, Unknown};
use crate::error::{ComponentError, ComponentResult};
use crate::heat_boundary::mass_flow_for_power;
use crate::setpoint::{SetpointKey, Setpoints};

/// Lagged energy spreads below this are not trusted [J/kg].
const MIN_ENERGY_SPREAD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeatTransferKind {
    /// Electrically driven; the primary side supplies `Q·(1 − 1/COP)`.
    HeatPump { cop: f64 },
    /// Passive; the primary side supplies `Q/efficiency`.
    HeatExchanger { efficiency: f64 },
}

impl HeatTransferKind {
    /// Primary heat per unit of secondary heat.
    pub fn duty_factor(self) -> f64 {
        match self {
            HeatTransferKind::HeatPump { cop } => 1.0 - 1.0 / cop,
            HeatTransferKind::HeatExchanger { efficiency } => 1.0 / efficiency,
        }
    }

    /// Electric power for a given secondary heat flow.
    pub fn electricity(self, secondary_heat: f64) -> f64 {
        match self {
            HeatTransferKind::HeatPump { cop } => secondary_heat.abs() / cop,
            HeatTransferKind::HeatExchanger { .. } => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatTransfer {
    pub kind: HeatTransferKind,
    /// Prescribe the secondary flow from `heat_demand`; otherwise hold
    /// `pressure_secondary` at the secondary outlet.
    pub prescribe_mass_flow_secondary: bool,
    /// Pa
    pub pressure_secondary: f64,
    /// Requested secondary heat [W].
    pub heat_demand: f64,
    pub temperature_in_primary: f64,
    pub temperature_out_primary: f64,
    pub temperature_in_secondary: f64,
    pub temperature_out_secondary: f64,
    /// Current secondary mass flow setpoint [kg/s].
    pub mass_flow_secondary: f64,
}

impl HeatTransfer {
    pub fn new(kind: HeatTransferKind) -> ComponentResult<Self> {
        let factor_ok = match kind {
            HeatTransferKind::HeatPump { cop } => cop.is_finite() && cop > 1.0,
            HeatTransferKind::HeatExchanger { efficiency } => {
                efficiency.is_finite() && efficiency > 0.0
            }
        };
        if !factor_ok {
            return Err(ComponentError::InvalidParameter {
                element: "heat transfer".into(),
                what: "COP must exceed 1 and efficiency must be positive".into(),
            });
        }
        Ok(Self {
            kind,
            prescribe_mass_flow_secondary: true,
            pressure_secondary: 0.0,
            heat_demand: 0.0,
            temperature_in_primary: 353.15,
            temperature_out_primary: 313.15,
            temperature_in_secondary: 313.15,
            temperature_out_secondary: 343.15,
            mass_flow_secondary: 0.0,
        })
    }

    /// Secondary side holds `pressure` at its outlet instead of a flow.
    pub fn with_secondary_pressure(mut self, pressure: f64) -> Self {
        self.prescribe_mass_flow_secondary = false;
        self.pressure_secondary = pressure;
        self
    }

    pub(crate) fn required_setpoints(&self) -> Vec<SetpointKey> {
        vec![
            SetpointKey::HeatDemand,
            SetpointKey::TemperatureInPrimary,
            SetpointKey::TemperatureOutPrimary,
            SetpointKey::TemperatureInSecondary,
            SetpointKey::TemperatureOutSecondary,
        ]
    }

    pub(crate) fn apply_setpoints(
        &mut self,
        setpoints: &Setpoints,
        fluid: &FluidTable,
    ) -> ComponentResult<()> {
        let fields = [
            (SetpointKey::HeatDemand, &mut self.heat_demand),
            (SetpointKey::TemperatureInPrimary, &mut self.temperature_in_primary),
            (SetpointKey::TemperatureOutPrimary, &mut self.temperature_out_primary),
            (SetpointKey::TemperatureInSecondary, &mut self.temperature_in_secondary),
            (SetpointKey::TemperatureOutSecondary, &mut self.temperature_out_secondary),
            (SetpointKey::Pressure, &mut self.pressure_secondary),
        ];
        for (key, field) in fields {
            if let Some(v) = setpoints.get(key) {
                *field = v;
            }
        }
        if (self.temperature_in_primary - self.temperature_out_primary).abs() < 1e-6 {
            return Err(ComponentError::NonPhysical {
                what: "primary temperature spread must be non-zero",
            });
        }
        self.mass_flow_secondary = mass_flow_for_power(
            fluid,
            self.heat_demand,
            self.temperature_out_secondary,
            self.temperature_in_secondary,
        )?;
        Ok(())
    }

    pub(crate) fn equations(&self, ports: &PortView<'_>, fluid: &FluidTable) -> Vec<EquationRow> {
        let (p_in, p_out, sign_primary) = upwind_pair(ports.direction(0), 0);
        let (s_in, s_out, sign_secondary) = upwind_pair(ports.direction(2), 2);

        let du_primary = lagged_spread(
            ports.prev(p_in, Unknown::InternalEnergy) - ports.prev(p_out, Unknown::InternalEnergy),
            fluid.internal_energy(self.temperature_in_primary)
                - fluid.internal_energy(self.temperature_out_primary),
        );
        let du_secondary = lagged_spread(
            ports.prev(s_out, Unknown::InternalEnergy) - ports.prev(s_in, Unknown::InternalEnergy),
            fluid.internal_energy(self.temperature_out_secondary)
                - fluid.internal_energy(self.temperature_in_secondary),
        );

        let secondary_closure = if self.prescribe_mass_flow_secondary {
            ports.fixed(2, Unknown::MassFlow, self.mass_flow_secondary)
        } else {
            ports.fixed(3, Unknown::Pressure, self.pressure_secondary)
        };

        vec![
            ports.pressure_to_node(0),
            ports.pressure_to_node(1),
            ports.pressure_to_node(2),
            ports.pressure_to_node(3),
            ports.continuity(0, 1),
            ports.continuity(2, 3),
            secondary_closure,
            ports.energy_from_node(p_in),
            ports.fixed(
                p_out,
                Unknown::InternalEnergy,
                fluid.internal_energy(self.temperature_out_primary),
            ),
            ports.energy_from_node(s_in),
            ports.fixed(
                s_out,
                Unknown::InternalEnergy,
                fluid.internal_energy(self.temperature_out_secondary),
            ),
            // Q_primary = duty_factor · Q_secondary, energy spreads lagged.
            EquationRow::new(
                [
                    (ports.index(0, Unknown::MassFlow), sign_primary * du_primary),
                    (
                        ports.index(2, Unknown::MassFlow),
                        -self.kind.duty_factor() * sign_secondary * du_secondary,
                    ),
                ],
                0.0,
            ),
        ]
    }

    pub(crate) fn requested_heat(&self) -> Option<f64> {
        self.prescribe_mass_flow_secondary.then_some(self.heat_demand)
    }
}

/// Inflow port, outflow port and flow sign of the side whose nominal inlet is
/// `inlet`.
fn upwind_pair(direction: FlowDirection, inlet: usize) -> (usize, usize, f64) {
    match direction {
        FlowDirection::Reverse => (inlet + 1, inlet, -1.0),
        FlowDirection::Forward | FlowDirection::Zero => (inlet, inlet + 1, 1.0),
    }
}

/// Energy spread from the previous iterate, or the setpoint spread while the
/// iterate is still stagnant or points the wrong way.
fn lagged_spread(lagged: f64, setpoint: f64) -> f64 {
    if lagged.abs() < MIN_ENERGY_SPREAD || lagged.signum() != setpoint.signum() {
        setpoint
    } else {
        lagged
    }
}
