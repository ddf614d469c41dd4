//! Two-port heat producers and consumers.
//!
//! Both run between a supply and a return junction. Fluid entering the inlet
//! takes the junction's energy; fluid leaving the outlet carries the
//! prescribed outlet temperature. The hydraulic side is closed either by a
//! prescribed mass flow at the inlet or by a prescribed outlet pressure.

use hn_fluids::FluidTable;

use crate::equation::{EquationRow, PortView, Unknown};
use crate::error::{ComponentError, ComponentResult};
use crate::setpoint::{SetpointKey, Setpoints};

const MIN_TEMPERATURE_SPREAD: f64 = 1e-6;

/// How the hydraulic degree of freedom of a two-port element is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FlowPrescription {
    /// `m_port = value`
    MassFlow { port: usize, value: f64 },
    /// `P_port = value`
    Pressure { port: usize, value: f64 },
}

/// Six rows shared by every two-port heat element.
///
/// `outlet_energy` of `None` makes the outlet follow its junction as well,
/// used by idle storage.
pub(crate) fn two_port_rows(
    ports: &PortView<'_>,
    inlet: usize,
    outlet: usize,
    prescription: FlowPrescription,
    outlet_energy: Option<f64>,
) -> Vec<EquationRow> {
    let closure = match prescription {
        FlowPrescription::MassFlow { port, value } => ports.fixed(port, Unknown::MassFlow, value),
        FlowPrescription::Pressure { port, value } => ports.fixed(port, Unknown::Pressure, value),
    };
    let outlet_row = match outlet_energy {
        Some(u) => ports.fixed(outlet, Unknown::InternalEnergy, u),
        None => ports.energy_from_node(outlet),
    };
    vec![
        ports.pressure_to_node(0),
        ports.pressure_to_node(1),
        ports.continuity(0, 1),
        closure,
        ports.energy_from_node(inlet),
        outlet_row,
    ]
}

/// Mass flow carrying `power` across a temperature spread, with `cp` taken
/// at the mean temperature.
pub fn mass_flow_for_power(
    fluid: &FluidTable,
    power: f64,
    temperature_a: f64,
    temperature_b: f64,
) -> ComponentResult<f64> {
    let spread = (temperature_a - temperature_b).abs();
    if !(spread > MIN_TEMPERATURE_SPREAD) {
        return Err(ComponentError::NonPhysical {
            what: "temperature spread must be non-zero",
        });
    }
    let cp = fluid.heat_capacity(0.5 * (temperature_a + temperature_b));
    Ok(power.abs() / (cp * spread))
}

/// Heat producer. Port 0 is the inlet (return side), port 1 the outlet
/// (supply side).
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    /// Prescribe mass flow from `heat_demand`; otherwise hold `pressure_supply`.
    pub prescribe_mass_flow: bool,
    /// Outlet pressure when not flow-prescribed [Pa].
    pub pressure_supply: f64,
    /// Requested heat output [W].
    pub heat_demand: f64,
    /// Return temperature entering the producer [K].
    pub temperature_in: f64,
    /// Supply temperature leaving the producer [K].
    pub temperature_out: f64,
    /// Current mass flow setpoint [kg/s].
    pub mass_flow: f64,
}

impl Production {
    /// Producer that holds the supply pressure and lets the network decide the flow.
    pub fn pressure_controlled(pressure_supply: f64, temperature_out: f64) -> Self {
        Self {
            prescribe_mass_flow: false,
            pressure_supply,
            heat_demand: 0.0,
            temperature_in: temperature_out,
            temperature_out,
            mass_flow: 0.0,
        }
    }

    /// Producer whose flow follows a heat setpoint.
    pub fn flow_controlled() -> Self {
        Self {
            prescribe_mass_flow: true,
            pressure_supply: 0.0,
            heat_demand: 0.0,
            temperature_in: 313.15,
            temperature_out: 353.15,
            mass_flow: 0.0,
        }
    }

    pub(crate) fn required_setpoints(&self) -> Vec<SetpointKey> {
        if self.prescribe_mass_flow {
            vec![
                SetpointKey::HeatDemand,
                SetpointKey::TemperatureIn,
                SetpointKey::TemperatureOut,
            ]
        } else {
            vec![SetpointKey::TemperatureOut]
        }
    }

    pub(crate) fn apply_setpoints(
        &mut self,
        setpoints: &Setpoints,
        fluid: &FluidTable,
    ) -> ComponentResult<()> {
        if let Some(q) = setpoints.get(SetpointKey::HeatDemand) {
            self.heat_demand = q;
        }
        if let Some(t) = setpoints.get(SetpointKey::TemperatureIn) {
            self.temperature_in = t;
        }
        if let Some(t) = setpoints.get(SetpointKey::TemperatureOut) {
            self.temperature_out = t;
        }
        if let Some(p) = setpoints.get(SetpointKey::Pressure) {
            self.pressure_supply = p;
        }
        if self.prescribe_mass_flow {
            self.mass_flow = mass_flow_for_power(
                fluid,
                self.heat_demand,
                self.temperature_out,
                self.temperature_in,
            )?;
        }
        Ok(())
    }

    pub(crate) fn equations(&self, ports: &PortView<'_>, fluid: &FluidTable) -> Vec<EquationRow> {
        let prescription = if self.prescribe_mass_flow {
            FlowPrescription::MassFlow {
                port: 0,
                value: self.mass_flow,
            }
        } else {
            FlowPrescription::Pressure {
                port: 1,
                value: self.pressure_supply,
            }
        };
        two_port_rows(
            ports,
            0,
            1,
            prescription,
            Some(fluid.internal_energy(self.temperature_out)),
        )
    }

    pub(crate) fn requested_heat(&self) -> Option<f64> {
        self.prescribe_mass_flow.then_some(self.heat_demand)
    }
}

/// Heat consumer. Port 0 is the inlet (supply side), port 1 the outlet
/// (return side).
#[derive(Debug, Clone, PartialEq)]
pub struct Demand {
    /// Requested heat [W].
    pub heat_demand: f64,
    /// Supply temperature the consumer is designed for [K].
    pub temperature_in: f64,
    /// Return temperature [K].
    pub temperature_out: f64,
    /// Current mass flow setpoint [kg/s].
    pub mass_flow: f64,
}

impl Demand {
    pub fn new(temperature_in: f64, temperature_out: f64) -> Self {
        Self {
            heat_demand: 0.0,
            temperature_in,
            temperature_out,
            mass_flow: 0.0,
        }
    }

    pub(crate) fn required_setpoints(&self) -> Vec<SetpointKey> {
        vec![
            SetpointKey::HeatDemand,
            SetpointKey::TemperatureIn,
            SetpointKey::TemperatureOut,
        ]
    }

    pub(crate) fn apply_setpoints(
        &mut self,
        setpoints: &Setpoints,
        fluid: &FluidTable,
    ) -> ComponentResult<()> {
        if let Some(q) = setpoints.get(SetpointKey::HeatDemand) {
            self.heat_demand = q;
        }
        if let Some(t) = setpoints.get(SetpointKey::TemperatureIn) {
            self.temperature_in = t;
        }
        if let Some(t) = setpoints.get(SetpointKey::TemperatureOut) {
            self.temperature_out = t;
        }
        self.mass_flow =
            mass_flow_for_power(fluid, self.heat_demand, self.temperature_in, self.temperature_out)?;
        Ok(())
    }

    pub(crate) fn equations(&self, ports: &PortView<'_>, fluid: &FluidTable) -> Vec<EquationRow> {
        two_port_rows(
            ports,
            0,
            1,
            FlowPrescription::MassFlow {
                port: 0,
                value: self.mass_flow,
            },
            Some(fluid.internal_energy(self.temperature_out)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_flow_from_power() {
        let fluid = FluidTable::water();
        let m = mass_flow_for_power(&fluid, 1e6, 353.15, 313.15).unwrap();
        let cp = fluid.heat_capacity(333.15);
        assert!((m - 1e6 / (cp * 40.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_spread_is_rejected() {
        let fluid = FluidTable::water();
        assert!(mass_flow_for_power(&fluid, 1e6, 353.15, 353.15).is_err());
    }

    #[test]
    fn pressure_controlled_producer_needs_only_supply_temperature() {
        let p = Production::pressure_controlled(3e5, 353.15);
        assert_eq!(p.required_setpoints(), vec![SetpointKey::TemperatureOut]);
        assert_eq!(p.requested_heat(), None);
    }

    #[test]
    fn demand_rows_close_flow_at_inlet() {
        let fluid = FluidTable::water();
        let mut d = Demand::new(353.15, 313.15);
        let sp = Setpoints::new()
            .with(SetpointKey::HeatDemand, 5e5)
            .with(SetpointKey::TemperatureIn, 353.15)
            .with(SetpointKey::TemperatureOut, 313.15);
        d.apply_setpoints(&sp, &fluid).unwrap();
        let prev = [0.0; 6];
        let nodes = [6, 9];
        let rows = d.equations(&PortView::new(0, &prev, &nodes), &fluid);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[3].indices(), &[0]);
        assert!((rows[3].rhs() - d.mass_flow).abs() < 1e-12);
        assert_eq!(rows[5].indices(), &[5]);
    }
}
