//! Flow direction derived from the previous iterate.

use serde::{Deserialize, Serialize};

/// Mass flow magnitude below which a port counts as stagnant (kg/s).
pub const ZERO_FLOW_THRESHOLD: f64 = 1e-9;

/// Direction of flow through a connection point, seen from the element.
///
/// `Forward` means fluid leaves the junction and enters the element at this
/// port; `Reverse` means the element discharges into the junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    Forward,
    Reverse,
    Zero,
}

impl FlowDirection {
    pub fn from_mass_flow(mass_flow: f64) -> Self {
        if mass_flow > ZERO_FLOW_THRESHOLD {
            FlowDirection::Forward
        } else if mass_flow < -ZERO_FLOW_THRESHOLD {
            FlowDirection::Reverse
        } else {
            FlowDirection::Zero
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            FlowDirection::Forward => 1.0,
            FlowDirection::Reverse => -1.0,
            FlowDirection::Zero => 0.0,
        }
    }

    pub fn is_reverse(self) -> bool {
        self == FlowDirection::Reverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_threshold() {
        assert_eq!(FlowDirection::from_mass_flow(1.0), FlowDirection::Forward);
        assert_eq!(FlowDirection::from_mass_flow(-0.5), FlowDirection::Reverse);
        assert_eq!(FlowDirection::from_mass_flow(1e-12), FlowDirection::Zero);
        assert_eq!(FlowDirection::from_mass_flow(-0.0), FlowDirection::Zero);
    }

    #[test]
    fn sign_matches_direction() {
        assert_eq!(FlowDirection::Reverse.sign(), -1.0);
        assert_eq!(FlowDirection::Zero.sign(), 0.0);
    }
}
