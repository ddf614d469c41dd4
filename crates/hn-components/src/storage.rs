//! Two-port thermal storage.
//!
//! Charging behaves like a consumer (fluid enters hot, leaves cold), discharging
//! like a producer (enters cold, leaves hot). Port 0 is the hot side.

use hn_fluids::FluidTable;
use serde::{Deserialize, Serialize};

use crate::equation::{EquationRow, PortView};
use crate::error::ComponentResult;
use crate::heat_boundary::{FlowPrescription, mass_flow_for_power, two_port_rows};
use crate::setpoint::{SetpointKey, Setpoints};

const IDLE_POWER: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMode {
    Charging,
    Discharging,
    Idle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    /// Signed power, positive while charging [W].
    pub heat_power: f64,
    /// Hot side temperature [K].
    pub temperature_in: f64,
    /// Cold side temperature [K].
    pub temperature_out: f64,
    /// Flow magnitude for the current mode [kg/s].
    pub mass_flow: f64,
    pub mode: StorageMode,
    /// J
    pub stored_energy: f64,
    /// J; zero means unbounded.
    pub max_energy: f64,
}

impl Storage {
    pub fn new(temperature_in: f64, temperature_out: f64, max_energy: f64) -> Self {
        Self {
            heat_power: 0.0,
            temperature_in,
            temperature_out,
            mass_flow: 0.0,
            mode: StorageMode::Idle,
            stored_energy: 0.0,
            max_energy,
        }
    }

    pub fn with_stored_energy(mut self, stored_energy: f64) -> Self {
        self.stored_energy = stored_energy;
        self
    }

    /// Fill level in `[0, 1]`, or `None` when the capacity is unbounded.
    pub fn fill_level(&self) -> Option<f64> {
        (self.max_energy > 0.0).then(|| (self.stored_energy / self.max_energy).clamp(0.0, 1.0))
    }

    pub(crate) fn required_setpoints(&self) -> Vec<SetpointKey> {
        vec![
            SetpointKey::HeatPower,
            SetpointKey::TemperatureIn,
            SetpointKey::TemperatureOut,
        ]
    }

    pub(crate) fn apply_setpoints(
        &mut self,
        setpoints: &Setpoints,
        fluid: &FluidTable,
    ) -> ComponentResult<()> {
        if let Some(q) = setpoints.get(SetpointKey::HeatPower) {
            self.heat_power = q;
        }
        if let Some(t) = setpoints.get(SetpointKey::TemperatureIn) {
            self.temperature_in = t;
        }
        if let Some(t) = setpoints.get(SetpointKey::TemperatureOut) {
            self.temperature_out = t;
        }
        self.mode = if self.heat_power > IDLE_POWER {
            StorageMode::Charging
        } else if self.heat_power < -IDLE_POWER {
            StorageMode::Discharging
        } else {
            StorageMode::Idle
        };
        self.mass_flow = match self.mode {
            StorageMode::Idle => 0.0,
            _ => mass_flow_for_power(
                fluid,
                self.heat_power,
                self.temperature_in,
                self.temperature_out,
            )?,
        };
        Ok(())
    }

    pub(crate) fn equations(&self, ports: &PortView<'_>, fluid: &FluidTable) -> Vec<EquationRow> {
        match self.mode {
            StorageMode::Charging => two_port_rows(
                ports,
                0,
                1,
                FlowPrescription::MassFlow {
                    port: 0,
                    value: self.mass_flow,
                },
                Some(fluid.internal_energy(self.temperature_out)),
            ),
            StorageMode::Discharging => two_port_rows(
                ports,
                1,
                0,
                FlowPrescription::MassFlow {
                    port: 1,
                    value: self.mass_flow,
                },
                Some(fluid.internal_energy(self.temperature_in)),
            ),
            StorageMode::Idle => two_port_rows(
                ports,
                0,
                1,
                FlowPrescription::MassFlow {
                    port: 0,
                    value: 0.0,
                },
                None,
            ),
        }
    }

    pub(crate) fn requested_heat(&self) -> Option<f64> {
        (self.mode != StorageMode::Idle).then_some(self.heat_power)
    }

    /// Integrates `power` over `dt` into the stored energy.
    pub(crate) fn accumulate(&mut self, power: f64, dt: f64) {
        self.stored_energy += power * dt;
        if self.stored_energy < 0.0 {
            self.stored_energy = 0.0;
        }
        if self.max_energy > 0.0 && self.stored_energy > self.max_energy {
            self.stored_energy = self.max_energy;
        }
    }
}
