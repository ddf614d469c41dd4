//! Heat balance bookkeeping for one timestep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the controller split demand between producers and storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub step: usize,
    pub time: DateTime<Utc>,
    /// Total heat requested by consumers and heat transfer primaries [W].
    pub demand: f64,
    /// Heat allocated to producers [W].
    pub produced: f64,
    /// Net storage power, positive while charging [W].
    pub storage: f64,
    /// Demand that neither producers nor storage could cover [W].
    pub shortfall: f64,
}

impl Balance {
    /// `produced − storage + shortfall − demand`; zero for a consistent split.
    pub fn residual(&self) -> f64 {
        self.produced - self.storage + self.shortfall - self.demand
    }
}
