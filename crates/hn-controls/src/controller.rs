//! Controller interface consumed by the simulation loop.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hn_components::{Element, Setpoints};
use hn_core::ElementId;

use crate::error::ControlResult;

/// Setpoints for every element the controller drives in one timestep.
pub type SetpointMap = BTreeMap<ElementId, Setpoints>;

/// Produces element setpoints once per timestep.
///
/// Elements absent from the returned map keep their current setpoints.
pub trait Controller: Send {
    fn update_setpoints(&mut self, time: DateTime<Utc>) -> ControlResult<SetpointMap>;

    /// Receives every element's committed state after a timestep is solved.
    fn observe(&mut self, _element: &Element) {}
}

/// Hands out the same setpoints every timestep.
#[derive(Debug, Clone, Default)]
pub struct StaticController {
    setpoints: SetpointMap,
}

impl StaticController {
    pub fn new(setpoints: SetpointMap) -> Self {
        Self { setpoints }
    }

    pub fn with(mut self, element: ElementId, setpoints: Setpoints) -> Self {
        self.setpoints.insert(element, setpoints);
        self
    }
}

impl Controller for StaticController {
    fn update_setpoints(&mut self, _time: DateTime<Utc>) -> ControlResult<SetpointMap> {
        Ok(self.setpoints.clone())
    }
}
