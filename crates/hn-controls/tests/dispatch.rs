use chrono::{DateTime, TimeDelta, Utc};
use hn_components::SetpointKey;
use hn_controls::{
    Controller, DemandControl, ProducerControl, Profile, ProfileController, StorageControl,
    TransferControl,
};
use hn_core::Id;
use proptest::prelude::*;

const DT: f64 = 900.0;

fn start() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn at(step: i64) -> DateTime<Utc> {
    start() + TimeDelta::seconds(step * DT as i64)
}

fn demand(index: u32, profile: Profile) -> DemandControl {
    DemandControl {
        element: Id::from_index(index),
        profile,
        temperature_in: 353.15,
        temperature_out: 313.15,
    }
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

#[test]
fn unlimited_producer_delivers_profile_energy() {
    let profile = Profile::constant(2.5e5, 8);
    let mut c = ProfileController::new(start(), DT).unwrap();
    c.add_demand(demand(0, profile.clone()));
    c.add_producer(producer(1, 0, f64::INFINITY));
    c.validate_horizon(profile.len()).unwrap();

    for step in 0..profile.len() {
        c.update_setpoints(at(step as i64)).unwrap();
    }
    let produced: f64 = c.balances().iter().map(|b| b.produced * DT).sum();
    assert!((produced - profile.integral(DT)).abs() < 1e-6);
    assert!(c.balances().iter().all(|b| b.shortfall == 0.0));
}

#[test]
fn transfer_primary_counts_towards_demand() {
    let mut c = ProfileController::new(start(), DT).unwrap();
    c.add_transfer(TransferControl {
        element: Id::from_index(0),
        profile: Profile::new(vec![4e5]),
        primary_factor: 0.75,
        temperature_in_primary: 353.15,
        temperature_out_primary: 323.15,
        temperature_in_secondary: 303.15,
        temperature_out_secondary: 318.15,
    });
    c.add_producer(producer(1, 0, 1e6));
    let sp = c.update_setpoints(start()).unwrap();

    assert_eq!(sp[&Id::from_index(0)].get(SetpointKey::HeatDemand), Some(4e5));
    assert_eq!(sp[&Id::from_index(1)].get(SetpointKey::HeatDemand), Some(3e5));
    assert_eq!(c.balances()[0].demand, 3e5);
}

#[test]
fn negative_profile_values_are_clipped() {
    let mut c = ProfileController::new(start(), DT).unwrap();
    c.add_demand(demand(0, Profile::new(vec![-1e5])));
    c.add_producer(producer(1, 0, 1e6));
    let sp = c.update_setpoints(start()).unwrap();
    assert_eq!(sp[&Id::from_index(0)].get(SetpointKey::HeatDemand), Some(0.0));
    assert_eq!(c.balances()[0].demand, 0.0);
}

#[test]
fn empty_storage_cannot_discharge() {
    let mut c = ProfileController::new(start(), DT).unwrap();
    c.add_demand(demand(0, Profile::new(vec![1e5])));
    c.add_storage(StorageControl {
        element: Id::from_index(2),
        max_power: 1e6,
        capacity: 1e9,
        stored_energy: 0.0,
        temperature_in: 353.15,
        temperature_out: 313.15,
    });
    let sp = c.update_setpoints(start()).unwrap();
    assert_eq!(sp[&Id::from_index(2)].get(SetpointKey::HeatPower), Some(0.0));
    assert_eq!(c.balances()[0].shortfall, 1e5);
}

#[test]
fn rejects_non_positive_timestep() {
    assert!(ProfileController::new(start(), 0.0).is_err());
    assert!(ProfileController::new(start(), f64::NAN).is_err());
}

proptest! {
    #[test]
    fn split_is_consistent_and_within_limits(
        load in 0.0..2e6f64,
        first in 0.0..1e6f64,
        second in 0.0..1e6f64,
        storage_max in 0.0..5e5f64,
        stored in 0.0..2e9f64,
    ) {
        let mut c = ProfileController::new(start(), DT).unwrap();
        c.add_demand(demand(0, Profile::new(vec![load])));
        c.add_producer(producer(1, 1, first));
        c.add_producer(producer(2, 2, second));
        c.add_storage(StorageControl {
            element: Id::from_index(3),
            max_power: storage_max,
            capacity: 2e9,
            stored_energy: stored,
            temperature_in: 353.15,
            temperature_out: 313.15,
        });
        let sp = c.update_setpoints(start()).unwrap();
        let b = c.balances()[0];

        prop_assert!(b.residual().abs() <= 1e-6 * (1.0 + load));
        prop_assert!(b.shortfall >= 0.0);
        prop_assert!(b.storage.abs() <= storage_max + 1e-9);

        let p1 = sp[&Id::from_index(1)].get(SetpointKey::HeatDemand).unwrap();
        let p2 = sp[&Id::from_index(2)].get(SetpointKey::HeatDemand).unwrap();
        prop_assert!(p1 <= first + 1e-9);
        prop_assert!(p2 <= second + 1e-9);

        let after = c.stored_energy(Id::from_index(3)).unwrap();
        prop_assert!((0.0..=2e9).contains(&after));
    }
}
