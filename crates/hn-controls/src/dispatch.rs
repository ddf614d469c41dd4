//! Reference controller: profile-driven demand, priority dispatch, storage.

use chrono::{DateTime, Utc};
use hn_components::{Element, ElementKind, SetpointKey, Setpoints};
use hn_core::ElementId;
use tracing::warn;

use crate::balance::Balance;
use crate::controller::{Controller, SetpointMap};
use crate::error::{ControlError, ControlResult};
use crate::profile::Profile;

/// A consumer following a heat profile [W].
#[derive(Debug, Clone, PartialEq)]
pub struct DemandControl {
    pub element: ElementId,
    pub profile: Profile,
    /// Supply temperature at the consumer inlet [K].
    pub temperature_in: f64,
    /// Return temperature [K].
    pub temperature_out: f64,
}

/// A dispatchable producer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerControl {
    pub element: ElementId,
    /// Lower values are dispatched first.
    pub priority: u32,
    /// W
    pub max_power: f64,
    /// Return temperature entering the producer [K].
    pub temperature_in: f64,
    /// Supply temperature [K].
    pub temperature_out: f64,
}

/// A storage that covers shortfall and absorbs spare capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageControl {
    pub element: ElementId,
    /// Charge and discharge limit [W].
    pub max_power: f64,
    /// J; zero means unbounded.
    pub capacity: f64,
    /// Stored energy [J]; projected during dispatch, then replaced by the
    /// element's committed value.
    pub stored_energy: f64,
    /// Hot side temperature [K].
    pub temperature_in: f64,
    /// Cold side temperature [K].
    pub temperature_out: f64,
}

/// A heat transfer device whose secondary side follows a profile [W].
#[derive(Debug, Clone, PartialEq)]
pub struct TransferControl {
    pub element: ElementId,
    pub profile: Profile,
    /// Primary heat per unit of secondary heat.
    pub primary_factor: f64,
    pub temperature_in_primary: f64,
    pub temperature_out_primary: f64,
    pub temperature_in_secondary: f64,
    pub temperature_out_secondary: f64,
}

/// Balances profiled demand against producers in priority order.
///
/// Per step: demand is summed, producers are filled in priority order up to
/// `max_power`, storage discharges to cover what is left, and any spare
/// producer capacity charges storage. Uncovered demand is reported in the
/// step's [`Balance`].
#[derive(Debug, Clone)]
pub struct ProfileController {
    start: DateTime<Utc>,
    timestep_s: f64,
    demands: Vec<DemandControl>,
    producers: Vec<ProducerControl>,
    storages: Vec<StorageControl>,
    transfers: Vec<TransferControl>,
    balances: Vec<Balance>,
}

impl ProfileController {
    pub fn new(start: DateTime<Utc>, timestep_s: f64) -> ControlResult<Self> {
        if !(timestep_s.is_finite() && timestep_s > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "timestep must be positive",
            });
        }
        Ok(Self {
            start,
            timestep_s,
            demands: Vec::new(),
            producers: Vec::new(),
            storages: Vec::new(),
            transfers: Vec::new(),
            balances: Vec::new(),
        })
    }

    pub fn add_demand(&mut self, demand: DemandControl) {
        self.demands.push(demand);
    }

    /// Producers are kept sorted by priority; equal priorities keep
    /// insertion order.
    pub fn add_producer(&mut self, producer: ProducerControl) {
        let at = self
            .producers
            .partition_point(|p| p.priority <= producer.priority);
        self.producers.insert(at, producer);
    }

    pub fn add_storage(&mut self, storage: StorageControl) {
        self.storages.push(storage);
    }

    pub fn add_transfer(&mut self, transfer: TransferControl) {
        self.transfers.push(transfer);
    }

    /// Replaces the profile of a managed demand or heat transfer element.
    pub fn set_profile(&mut self, element: ElementId, profile: Profile) -> ControlResult<()> {
        if let Some(d) = self.demands.iter_mut().find(|d| d.element == element) {
            d.profile = profile;
            return Ok(());
        }
        if let Some(t) = self.transfers.iter_mut().find(|t| t.element == element) {
            t.profile = profile;
            return Ok(());
        }
        Err(ControlError::UnknownElement { element })
    }

    pub fn stored_energy(&self, element: ElementId) -> ControlResult<f64> {
        self.storages
            .iter()
            .find(|s| s.element == element)
            .map(|s| s.stored_energy)
            .ok_or(ControlError::UnknownElement { element })
    }

    /// Balances recorded so far, one per call to `update_setpoints`.
    pub fn balances(&self) -> &[Balance] {
        &self.balances
    }

    /// Checks that every profile covers `steps` timesteps.
    pub fn validate_horizon(&self, steps: usize) -> ControlResult<()> {
        let profiles = self
            .demands
            .iter()
            .map(|d| (d.element, &d.profile))
            .chain(self.transfers.iter().map(|t| (t.element, &t.profile)));
        for (element, profile) in profiles {
            if profile.len() < steps {
                return Err(ControlError::ProfileLength {
                    element,
                    len: profile.len(),
                    step: steps.saturating_sub(1),
                });
            }
        }
        Ok(())
    }

    fn step_of(&self, time: DateTime<Utc>) -> ControlResult<usize> {
        let elapsed = (time - self.start).num_milliseconds() as f64 / 1000.0;
        if elapsed < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "time before simulation start",
            });
        }
        Ok((elapsed / self.timestep_s).round() as usize)
    }

    fn profile_value(element: ElementId, profile: &Profile, step: usize) -> ControlResult<f64> {
        profile.get(step).ok_or(ControlError::ProfileLength {
            element,
            len: profile.len(),
            step,
        })
    }
}

impl Controller for ProfileController {
    fn update_setpoints(&mut self, time: DateTime<Utc>) -> ControlResult<SetpointMap> {
        let step = self.step_of(time)?;
        let dt = self.timestep_s;
        let mut out = SetpointMap::new();

        let mut demand = 0.0;
        for d in &self.demands {
            let q = Self::profile_value(d.element, &d.profile, step)?.max(0.0);
            demand += q;
            out.insert(
                d.element,
                Setpoints::new()
                    .with(SetpointKey::HeatDemand, q)
                    .with(SetpointKey::TemperatureIn, d.temperature_in)
                    .with(SetpointKey::TemperatureOut, d.temperature_out),
            );
        }
        for t in &self.transfers {
            let q = Self::profile_value(t.element, &t.profile, step)?.max(0.0);
            demand += q * t.primary_factor;
            out.insert(
                t.element,
                Setpoints::new()
                    .with(SetpointKey::HeatDemand, q)
                    .with(SetpointKey::TemperatureInPrimary, t.temperature_in_primary)
                    .with(SetpointKey::TemperatureOutPrimary, t.temperature_out_primary)
                    .with(SetpointKey::TemperatureInSecondary, t.temperature_in_secondary)
                    .with(SetpointKey::TemperatureOutSecondary, t.temperature_out_secondary),
            );
        }

        // Producers in priority order.
        let mut remaining = demand;
        let mut allocation: Vec<f64> = self
            .producers
            .iter()
            .map(|p| {
                let a = remaining.min(p.max_power).max(0.0);
                remaining -= a;
                a
            })
            .collect();

        // Storage covers what producers cannot.
        let mut storage_power = vec![0.0; self.storages.len()];
        for (s, power) in self.storages.iter().zip(storage_power.iter_mut()) {
            if remaining <= 0.0 {
                break;
            }
            let available = s.max_power.min(s.stored_energy / dt);
            let d = remaining.min(available).max(0.0);
            *power = -d;
            remaining -= d;
        }

        // Spare producer capacity charges storage.
        if remaining <= 0.0 {
            for (s, power) in self.storages.iter().zip(storage_power.iter_mut()) {
                let room = if s.capacity > 0.0 {
                    ((s.capacity - s.stored_energy) / dt).max(0.0)
                } else {
                    f64::INFINITY
                };
                let mut charge = s.max_power.min(room);
                for (p, a) in self.producers.iter().zip(allocation.iter_mut()) {
                    if charge <= 0.0 {
                        break;
                    }
                    let extra = (p.max_power - *a).min(charge).max(0.0);
                    *a += extra;
                    *power += extra;
                    charge -= extra;
                }
            }
        }

        for (p, a) in self.producers.iter().zip(&allocation) {
            out.insert(
                p.element,
                Setpoints::new()
                    .with(SetpointKey::HeatDemand, *a)
                    .with(SetpointKey::TemperatureIn, p.temperature_in)
                    .with(SetpointKey::TemperatureOut, p.temperature_out),
            );
        }
        for (s, power) in self.storages.iter_mut().zip(&storage_power) {
            s.stored_energy = (s.stored_energy + power * dt).max(0.0);
            if s.capacity > 0.0 {
                s.stored_energy = s.stored_energy.min(s.capacity);
            }
            out.insert(
                s.element,
                Setpoints::new()
                    .with(SetpointKey::HeatPower, *power)
                    .with(SetpointKey::TemperatureIn, s.temperature_in)
                    .with(SetpointKey::TemperatureOut, s.temperature_out),
            );
        }

        let shortfall = remaining.max(0.0);
        if shortfall > 0.0 {
            warn!(step, shortfall, "demand exceeds production and storage");
        }
        self.balances.push(Balance {
            step,
            time,
            demand,
            produced: allocation.iter().sum(),
            storage: storage_power.iter().sum(),
            shortfall,
        });
        Ok(out)
    }

    fn observe(&mut self, element: &Element) {
        let ElementKind::Storage(storage) = element.kind() else {
            return;
        };
        if let Some(s) = self.storages.iter_mut().find(|s| s.element == element.id()) {
            s.stored_energy = storage.stored_energy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use hn_components::Storage;
    use hn_core::Id;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn producer(index: u32, priority: u32, max_power: f64) -> ProducerControl {
        ProducerControl {
            element: Id::from_index(index),
            priority,
            max_power,
            temperature_in: 313.15,
            temperature_out: 353.15,
        }
    }

    fn controller(demand: Vec<f64>) -> ProfileController {
        let mut c = ProfileController::new(t0(), 3600.0).unwrap();
        c.add_demand(DemandControl {
            element: Id::from_index(0),
            profile: Profile::new(demand),
            temperature_in: 353.15,
            temperature_out: 313.15,
        });
        c
    }

    #[test]
    fn producers_fill_in_priority_order() {
        let mut c = controller(vec![5e5]);
        c.add_producer(producer(2, 2, 1e6));
        c.add_producer(producer(1, 1, 3e5));
        let sp = c.update_setpoints(t0()).unwrap();
        assert_eq!(sp[&Id::from_index(1)].get(SetpointKey::HeatDemand), Some(3e5));
        assert_eq!(sp[&Id::from_index(2)].get(SetpointKey::HeatDemand), Some(2e5));
        assert_eq!(c.balances()[0].shortfall, 0.0);
    }

    #[test]
    fn storage_covers_shortfall_then_reports_rest() {
        let mut c = controller(vec![5e5]);
        c.add_producer(producer(1, 1, 2e5));
        c.add_storage(StorageControl {
            element: Id::from_index(3),
            max_power: 1e5,
            capacity: 0.0,
            stored_energy: 1e12,
            temperature_in: 353.15,
            temperature_out: 313.15,
        });
        let sp = c.update_setpoints(t0()).unwrap();
        assert_eq!(sp[&Id::from_index(3)].get(SetpointKey::HeatPower), Some(-1e5));
        let b = c.balances()[0];
        assert!((b.shortfall - 2e5).abs() < 1e-9);
        assert!(b.residual().abs() < 1e-9);
    }

    #[test]
    fn spare_capacity_charges_storage_until_full() {
        let mut c = controller(vec![1e5, 1e5]);
        c.add_producer(producer(1, 1, 5e5));
        c.add_storage(StorageControl {
            element: Id::from_index(3),
            max_power: 1e6,
            capacity: 3600.0 * 3e5,
            stored_energy: 3600.0 * 2e5,
            temperature_in: 353.15,
            temperature_out: 313.15,
        });
        let sp = c.update_setpoints(t0()).unwrap();
        assert_eq!(sp[&Id::from_index(3)].get(SetpointKey::HeatPower), Some(1e5));
        assert_eq!(sp[&Id::from_index(1)].get(SetpointKey::HeatDemand), Some(2e5));

        let sp = c
            .update_setpoints(t0() + TimeDelta::seconds(3600))
            .unwrap();
        assert_eq!(sp[&Id::from_index(3)].get(SetpointKey::HeatPower), Some(0.0));
        assert_eq!(c.stored_energy(Id::from_index(3)).unwrap(), 3600.0 * 3e5);
    }

    #[test]
    fn profile_past_end_is_an_error() {
        let mut c = controller(vec![1e5]);
        let err = c
            .update_setpoints(t0() + TimeDelta::seconds(7200))
            .unwrap_err();
        assert_eq!(
            err,
            ControlError::ProfileLength {
                element: Id::from_index(0),
                len: 1,
                step: 2
            }
        );
        assert!(c.validate_horizon(3).is_err());
        assert!(c.validate_horizon(1).is_ok());
    }

    #[test]
    fn unknown_profile_target() {
        let mut c = controller(vec![1e5]);
        assert_eq!(
            c.set_profile(Id::from_index(9), Profile::default()),
            Err(ControlError::UnknownElement {
                element: Id::from_index(9)
            })
        );
    }

    #[test]
    fn committed_storage_state_replaces_projection() {
        let mut c = controller(vec![5e5]);
        c.add_producer(producer(1, 1, 2e5));
        c.add_storage(StorageControl {
            element: Id::from_index(3),
            max_power: 3e5,
            capacity: 0.0,
            stored_energy: 2e9,
            temperature_in: 353.15,
            temperature_out: 313.15,
        });
        c.update_setpoints(t0()).unwrap();
        assert_eq!(c.stored_energy(Id::from_index(3)).unwrap(), 2e9 - 3e5 * 3600.0);

        let tank = Element::new(
            Id::from_index(3),
            "tank",
            ElementKind::Storage(Storage::new(353.15, 313.15, 0.0).with_stored_energy(2.5e8)),
        );
        c.observe(&tank);
        assert_eq!(c.stored_energy(Id::from_index(3)).unwrap(), 2.5e8);

        let other = Element::new(
            Id::from_index(4),
            "other",
            ElementKind::Storage(Storage::new(353.15, 313.15, 0.0).with_stored_energy(1.0)),
        );
        c.observe(&other);
        assert_eq!(c.stored_energy(Id::from_index(3)).unwrap(), 2.5e8);
    }
}
