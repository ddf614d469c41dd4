//! Recorded per-timestep quantities.

use serde::{Deserialize, Serialize};

/// Quantity recorded for a connection point or for a whole element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// kg/s, positive when entering the element
    MassFlow,
    /// Pa
    Pressure,
    /// K
    Temperature,
    /// Pa, inlet minus outlet
    PressureLoss,
    /// W lost to the surroundings
    HeatLoss,
    /// W exchanged in the element's nominal direction
    HeatSupplied,
    /// W
    ElectricityConsumption,
    /// J
    StoredEnergy,
}

impl Quantity {
    pub fn as_str(self) -> &'static str {
        match self {
            Quantity::MassFlow => "mass_flow",
            Quantity::Pressure => "pressure",
            Quantity::Temperature => "temperature",
            Quantity::PressureLoss => "pressure_loss",
            Quantity::HeatLoss => "heat_loss",
            Quantity::HeatSupplied => "heat_supplied",
            Quantity::ElectricityConsumption => "electricity_consumption",
            Quantity::StoredEnergy => "stored_energy",
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded value. `port` is `None` for element-level quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputValue {
    pub port: Option<usize>,
    pub quantity: Quantity,
    pub value: f64,
}

impl OutputValue {
    pub fn port(port: usize, quantity: Quantity, value: f64) -> Self {
        Self {
            port: Some(port),
            quantity,
            value,
        }
    }

    pub fn element(quantity: Quantity, value: f64) -> Self {
        Self {
            port: None,
            quantity,
            value,
        }
    }
}
