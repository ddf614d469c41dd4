//! Simulation time grid and outer-loop settings.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

fn default_max_outer_iterations() -> usize {
    20
}

fn default_delivery_tolerance() -> f64 {
    1e-3
}

fn default_progress_messages() -> usize {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub id: String,
    pub name: String,
    /// Fixed timestep (seconds)
    pub timestep_s: f64,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    /// Cap on re-solves per timestep when delivery misses its setpoint
    #[serde(default = "default_max_outer_iterations")]
    pub max_outer_iterations: usize,
    /// Relative delivery mismatch that triggers a re-solve
    #[serde(default = "default_delivery_tolerance")]
    pub delivery_tolerance: f64,
    /// Upper bound on progress callbacks per run
    #[serde(default = "default_progress_messages")]
    pub progress_messages: usize,
}

impl SimulationConfig {
    pub fn new(
        id: impl Into<String>,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        timestep_s: f64,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            timestep_s,
            start,
            stop,
            max_outer_iterations: default_max_outer_iterations(),
            delivery_tolerance: default_delivery_tolerance(),
            progress_messages: default_progress_messages(),
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.timestep_s.is_finite() && self.timestep_s > 0.0) {
            return Err(SimError::InvalidConfig {
                what: "timestep must be positive",
            });
        }
        if self.stop < self.start {
            return Err(SimError::InvalidConfig {
                what: "stop must not precede start",
            });
        }
        if self.max_outer_iterations == 0 {
            return Err(SimError::InvalidConfig {
                what: "max_outer_iterations must be at least 1",
            });
        }
        if !(self.delivery_tolerance.is_finite() && self.delivery_tolerance > 0.0) {
            return Err(SimError::InvalidConfig {
                what: "delivery tolerance must be positive",
            });
        }
        Ok(())
    }

    /// `floor((stop − start) / timestep)`
    pub fn number_of_time_steps(&self) -> usize {
        let span = (self.stop - self.start).num_milliseconds() as f64 / 1000.0;
        (span / self.timestep_s).floor().max(0.0) as usize
    }

    pub fn time_at(&self, step: usize) -> DateTime<Utc> {
        let offset_ms = (step as f64 * self.timestep_s * 1000.0).round() as i64;
        self.start + TimeDelta::milliseconds(offset_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(hours: i64, timestep_s: f64) -> SimulationConfig {
        let start = DateTime::<Utc>::UNIX_EPOCH;
        SimulationConfig::new("test", start, start + TimeDelta::hours(hours), timestep_s)
    }

    #[test]
    fn step_count_floors() {
        assert_eq!(config(24, 3600.0).number_of_time_steps(), 24);
        assert_eq!(config(1, 7000.0).number_of_time_steps(), 0);
        assert_eq!(config(2, 4000.0).number_of_time_steps(), 1);
    }

    #[test]
    fn time_grid() {
        let c = config(24, 900.0);
        assert_eq!(c.time_at(4), c.start + TimeDelta::hours(1));
    }

    #[test]
    fn rejects_bad_timestep() {
        assert!(config(1, 0.0).validate().is_err());
        assert!(config(1, 60.0).validate().is_ok());
    }

    proptest! {
        #[test]
        fn grid_stays_inside_horizon(hours in 1i64..500, timestep_s in 60.0..86_400.0f64) {
            let c = config(hours, timestep_s);
            let n = c.number_of_time_steps();
            if n > 0 {
                prop_assert!(c.time_at(n - 1) < c.stop);
            }
            prop_assert!(c.time_at(n + 1) >= c.stop);
        }
    }
}
