//! Single-port boundary: fixed pressure or fixed flow, fixed temperature.

use hn_core::units::{MassRate, Pressure, Temperature};
use hn_fluids::FluidTable;

use crate::direction::FlowDirection;
use crate::equation::{EquationRow, PortView, Unknown};
use crate::error::ComponentResult;
use crate::setpoint::{SetpointKey, Setpoints};

#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    /// Prescribe `mass_flow` instead of `pressure`.
    pub prescribe_mass_flow: bool,
    /// Pa
    pub pressure: f64,
    /// Flow delivered into the network [kg/s]; negative values draw fluid out.
    pub mass_flow: f64,
    /// Temperature of fluid supplied by the boundary [K].
    pub temperature: f64,
}

impl Boundary {
    pub fn pressure(pressure: Pressure, temperature: Temperature) -> Self {
        Self {
            prescribe_mass_flow: false,
            pressure: pressure.value,
            mass_flow: 0.0,
            temperature: temperature.value,
        }
    }

    pub fn mass_flow(mass_flow: MassRate, temperature: Temperature) -> Self {
        Self {
            prescribe_mass_flow: true,
            pressure: 0.0,
            mass_flow: mass_flow.value,
            temperature: temperature.value,
        }
    }

    pub(crate) fn required_setpoints(&self) -> Vec<SetpointKey> {
        if self.prescribe_mass_flow {
            vec![SetpointKey::Temperature, SetpointKey::MassFlow]
        } else {
            vec![SetpointKey::Temperature, SetpointKey::Pressure]
        }
    }

    pub(crate) fn apply_setpoints(&mut self, setpoints: &Setpoints) -> ComponentResult<()> {
        if let Some(t) = setpoints.get(SetpointKey::Temperature) {
            self.temperature = t;
        }
        if let Some(p) = setpoints.get(SetpointKey::Pressure) {
            self.pressure = p;
        }
        if let Some(m) = setpoints.get(SetpointKey::MassFlow) {
            self.mass_flow = m;
        }
        Ok(())
    }

    pub(crate) fn equations(&self, ports: &PortView<'_>, fluid: &FluidTable) -> Vec<EquationRow> {
        let prescription = if self.prescribe_mass_flow {
            ports.fixed(0, Unknown::MassFlow, -self.mass_flow)
        } else {
            ports.fixed(0, Unknown::Pressure, self.pressure)
        };
        // Only outflow carries T_set; inflow keeps the junction's energy, or the
        // boundary would overwrite the temperature arriving from upstream.
        let thermal = match ports.direction(0) {
            FlowDirection::Forward => ports.energy_from_node(0),
            FlowDirection::Reverse | FlowDirection::Zero => ports.fixed(
                0,
                Unknown::InternalEnergy,
                fluid.internal_energy(self.temperature),
            ),
        };
        vec![ports.pressure_to_node(0), prescription, thermal]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_core::units::{k, kgps, pa};

    #[test]
    fn supplying_boundary_fixes_energy() {
        let fluid = FluidTable::water();
        let b = Boundary::mass_flow(kgps(3.0), k(350.0));
        let prev = [-3.0, 1e5, 0.0];
        let nodes = [3];
        let rows = b.equations(&PortView::new(0, &prev, &nodes), &fluid);
        assert_eq!(rows[1].indices(), &[0]);
        assert_eq!(rows[1].rhs(), -3.0);
        assert_eq!(rows[2].indices(), &[2]);
        assert!((rows[2].rhs() - fluid.internal_energy(350.0)).abs() < 1e-9);
    }

    #[test]
    fn absorbing_boundary_takes_node_energy() {
        let fluid = FluidTable::water();
        let b = Boundary::pressure(pa(1e5), k(300.0));
        let prev = [0.7, 1e5, 0.0];
        let nodes = [3];
        let rows = b.equations(&PortView::new(0, &prev, &nodes), &fluid);
        assert_eq!(rows[1].indices(), &[1]);
        assert_eq!(rows[2].indices(), &[2, 5]);
    }

    #[test]
    fn stagnant_boundary_fixes_energy() {
        let fluid = FluidTable::water();
        let b = Boundary::pressure(pa(1e5), k(320.0));
        let prev = [0.0, 1e5, 0.0];
        let nodes = [3];
        let rows = b.equations(&PortView::new(0, &prev, &nodes), &fluid);
        assert_eq!(rows[2].indices(), &[2]);
        assert!((rows[2].rhs() - fluid.internal_energy(320.0)).abs() < 1e-9);
    }
}
