//! Per-timestep value series.

use serde::{Deserialize, Serialize};

/// One value per simulation timestep, already resampled to the step grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile {
    values: Vec<f64>,
}

impl Profile {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// A profile holding `value` for `steps` timesteps.
    pub fn constant(value: f64, steps: usize) -> Self {
        Self {
            values: vec![value; steps],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, step: usize) -> Option<f64> {
        self.values.get(step).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sum over all steps times `dt`, i.e. energy for a power profile.
    pub fn integral(&self, dt: f64) -> f64 {
        self.values.iter().sum::<f64>() * dt
    }
}

impl From<Vec<f64>> for Profile {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}
