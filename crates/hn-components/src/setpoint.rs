//! Controller setpoints consumed by elements between timesteps.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Names of the values a controller may hand to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetpointKey {
    /// Requested thermal power [W].
    HeatDemand,
    /// Temperature of the fluid entering the element [K].
    TemperatureIn,
    /// Temperature of the fluid leaving the element [K].
    TemperatureOut,
    /// Signed storage power [W], positive while charging.
    HeatPower,
    /// Prescribed boundary temperature [K].
    Temperature,
    /// Prescribed pressure [Pa].
    Pressure,
    /// Prescribed mass flow [kg/s].
    MassFlow,
    TemperatureInPrimary,
    TemperatureOutPrimary,
    TemperatureInSecondary,
    TemperatureOutSecondary,
}

impl SetpointKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SetpointKey::HeatDemand => "heat_demand",
            SetpointKey::TemperatureIn => "temperature_in",
            SetpointKey::TemperatureOut => "temperature_out",
            SetpointKey::HeatPower => "heat_power",
            SetpointKey::Temperature => "temperature",
            SetpointKey::Pressure => "pressure",
            SetpointKey::MassFlow => "mass_flow",
            SetpointKey::TemperatureInPrimary => "temperature_in_primary",
            SetpointKey::TemperatureOutPrimary => "temperature_out_primary",
            SetpointKey::TemperatureInSecondary => "temperature_in_secondary",
            SetpointKey::TemperatureOutSecondary => "temperature_out_secondary",
        }
    }
}

impl fmt::Display for SetpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Setpoint values for one element and one timestep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Setpoints(BTreeMap<SetpointKey, f64>);

impl Setpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: SetpointKey, value: f64) -> Self {
        self.0.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: SetpointKey, value: f64) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: SetpointKey) -> Option<f64> {
        self.0.get(&key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SetpointKey, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Keys from `required` that are absent, in the order given.
    pub fn missing(&self, required: &[SetpointKey]) -> Vec<SetpointKey> {
        required
            .iter()
            .copied()
            .filter(|k| !self.0.contains_key(k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reports_absent_keys() {
        let sp = Setpoints::new().with(SetpointKey::HeatDemand, 1e6);
        let missing = sp.missing(&[
            SetpointKey::HeatDemand,
            SetpointKey::TemperatureIn,
            SetpointKey::TemperatureOut,
        ]);
        assert_eq!(
            missing,
            vec![SetpointKey::TemperatureIn, SetpointKey::TemperatureOut]
        );
    }

    #[test]
    fn keys_display_in_snake_case() {
        assert_eq!(
            SetpointKey::TemperatureOutSecondary.to_string(),
            "temperature_out_secondary"
        );
    }
}
