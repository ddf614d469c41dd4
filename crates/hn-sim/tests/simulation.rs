use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use hn_components::{
    Demand, ElementKind, Pipe, Production, Quantity, SetpointKey, Setpoints, Storage,
};
use hn_controls::{
    DemandControl, ProducerControl, Profile, ProfileController, StaticController,
    StorageControl,
};
use hn_core::ElementId;
use hn_core::units::m;
use hn_fluids::FluidTable;
use hn_graph::PortRef;
use hn_sim::{CancellationToken, SimError, Simulation, SimulationConfig};
use hn_solver::Network;

struct District {
    net: Network,
    plant: ElementId,
    house: ElementId,
    supply_node: (ElementId, usize),
    return_node: (ElementId, usize),
}

fn pipe(length: f64) -> ElementKind {
    ElementKind::Pipe(Pipe::new(m(length), m(0.15), m(1e-4)).unwrap())
}

fn district() -> District {
    district_supplying(353.15)
}

fn district_supplying(supply_temperature: f64) -> District {
    let mut net = Network::new(Arc::new(FluidTable::water()));
    let plant = net
        .add_element(
            "plant",
            ElementKind::Production(Production::pressure_controlled(3e5, supply_temperature)),
        )
        .unwrap();
    let s = net.add_element("supply", pipe(400.0)).unwrap();
    let house = net
        .add_element("house", ElementKind::Demand(Demand::new(353.15, 313.15)))
        .unwrap();
    let r = net.add_element("return", pipe(400.0)).unwrap();
    net.connect(PortRef::new(plant, 1), PortRef::new(s, 0)).unwrap();
    net.connect(PortRef::new(s, 1), PortRef::new(house, 0)).unwrap();
    net.connect(PortRef::new(house, 1), PortRef::new(r, 0)).unwrap();
    net.connect(PortRef::new(r, 1), PortRef::new(plant, 0)).unwrap();
    District {
        net,
        plant,
        house,
        supply_node: (house, 0),
        return_node: (house, 1),
    }
}

fn start() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn config(steps: i64) -> SimulationConfig {
    SimulationConfig::new("district", start(), start() + TimeDelta::hours(steps), 3600.0)
}

fn house_setpoints(heat: f64) -> Setpoints {
    Setpoints::new()
        .with(SetpointKey::HeatDemand, heat)
        .with(SetpointKey::TemperatureIn, 353.15)
        .with(SetpointKey::TemperatureOut, 313.15)
}

#[test]
fn delivered_heat_matches_request() {
    let d = district();
    let controller = StaticController::default().with(d.house, house_setpoints(1e6));
    let mut sim = Simulation::new(config(3), d.net, controller).unwrap();
    let result = sim.run().unwrap();

    assert_eq!(result.table.len(), 3);
    assert_eq!(result.steps.len(), 3);
    assert!(result.all_converged());
    let heat = result
        .table
        .series(d.house, None, Quantity::HeatSupplied)
        .unwrap();
    for q in heat {
        assert!((q - 1e6).abs() / 1e6 < 1e-3, "delivered {q}");
    }
    let plant_heat = result
        .table
        .series(d.plant, None, Quantity::HeatSupplied)
        .unwrap();
    assert!((plant_heat[0] - heat[0]).abs() / 1e6 < 1e-6);
    assert_eq!(result.table.element_name(d.house), Some("house"));
}

#[test]
fn supply_colder_than_return_is_not_delivered() {
    let d = district_supplying(308.15);
    let controller = StaticController::default().with(d.house, house_setpoints(5e5));
    let mut sim = Simulation::new(config(1), d.net, controller).unwrap();
    let result = sim.run().unwrap();

    let report = result.steps[0];
    assert!(!report.converged);
    assert_eq!(report.outer_iterations, 1);
    let heat = result
        .table
        .series(d.house, None, Quantity::HeatSupplied)
        .unwrap();
    assert!(heat[0] < 0.0, "delivered {}", heat[0]);
}

#[test]
fn profile_controller_drives_demand() {
    let d = district();
    let profile = vec![5e5, 1e6, 2e5];
    let mut controller = ProfileController::new(start(), 3600.0).unwrap();
    controller.add_demand(DemandControl {
        element: d.house,
        profile: Profile::new(profile.clone()),
        temperature_in: 353.15,
        temperature_out: 313.15,
    });
    controller.add_producer(ProducerControl {
        element: d.plant,
        priority: 1,
        max_power: 2e6,
        temperature_in: 313.15,
        temperature_out: 353.15,
    });

    let mut sim = Simulation::new(config(3), d.net, controller).unwrap();
    let result = sim.run().unwrap();
    let heat = result
        .table
        .series(d.house, None, Quantity::HeatSupplied)
        .unwrap();
    for (q, expected) in heat.iter().zip(&profile) {
        assert!((q - expected).abs() / expected < 1e-3);
    }
    assert_eq!(sim.controller().balances().len(), 3);
    assert!(sim.controller().balances().iter().all(|b| b.shortfall == 0.0));
}

#[test]
fn storage_discharges_then_charges() {
    let mut d = district();
    let storage = d
        .net
        .add_element(
            "tank",
            ElementKind::Storage(Storage::new(353.15, 313.15, 2e9).with_stored_energy(1e9)),
        )
        .unwrap();
    d.net
        .connect(PortRef::new(d.supply_node.0, d.supply_node.1), PortRef::new(storage, 0))
        .unwrap();
    d.net
        .connect(PortRef::new(d.return_node.0, d.return_node.1), PortRef::new(storage, 1))
        .unwrap();

    let mut controller = ProfileController::new(start(), 3600.0).unwrap();
    controller.add_demand(DemandControl {
        element: d.house,
        profile: Profile::new(vec![6e5, 1e5]),
        temperature_in: 353.15,
        temperature_out: 313.15,
    });
    controller.add_producer(ProducerControl {
        element: d.plant,
        priority: 1,
        max_power: 4e5,
        temperature_in: 313.15,
        temperature_out: 353.15,
    });
    controller.add_storage(StorageControl {
        element: storage,
        max_power: 3e5,
        capacity: 2e9,
        stored_energy: 1e9,
        temperature_in: 353.15,
        temperature_out: 313.15,
    });

    let mut sim = Simulation::new(config(2), d.net, controller).unwrap();
    let result = sim.run().unwrap();
    assert!(result.all_converged());

    let power = result
        .table
        .series(storage, None, Quantity::HeatSupplied)
        .unwrap();
    assert!((power[0] + 2e5).abs() / 2e5 < 1e-3);
    assert!((power[1] - 3e5).abs() / 3e5 < 1e-3);

    let stored = result
        .table
        .series(storage, None, Quantity::StoredEnergy)
        .unwrap();
    assert!((stored[0] - (1e9 - 2e5 * 3600.0)).abs() / 1e9 < 1e-3);
    assert!((stored[1] - (1e9 + 1e5 * 3600.0)).abs() / 1e9 < 1e-3);

    let plant = result
        .table
        .series(d.plant, None, Quantity::HeatSupplied)
        .unwrap();
    assert!((plant[0] - 4e5).abs() / 4e5 < 2e-3);
    assert!((plant[1] - 4e5).abs() / 4e5 < 2e-3);

    let ElementKind::Storage(tank) = sim.network().element(storage).unwrap().kind() else {
        unreachable!()
    };
    assert_eq!(
        sim.controller().stored_energy(storage).unwrap(),
        tank.stored_energy
    );
}

#[test]
fn missing_setpoint_is_fatal() {
    let d = district();
    let controller = StaticController::default().with(
        d.house,
        Setpoints::new().with(SetpointKey::HeatDemand, 1e5),
    );
    let mut sim = Simulation::new(config(2), d.net, controller).unwrap();
    match sim.run().unwrap_err() {
        SimError::MissingSetpoint {
            step,
            element,
            keys,
            ..
        } => {
            assert_eq!(step, 0);
            assert_eq!(element, d.house);
            assert_eq!(
                keys,
                vec![SetpointKey::TemperatureIn, SetpointKey::TemperatureOut]
            );
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn unknown_element_in_setpoints() {
    let d = district();
    let stranger = hn_core::Id::from_index(99);
    let controller = StaticController::default().with(stranger, house_setpoints(1e5));
    let mut sim = Simulation::new(config(1), d.net, controller).unwrap();
    assert_eq!(
        sim.run().unwrap_err(),
        SimError::UnknownElement {
            step: 0,
            element: stranger
        }
    );
}

#[test]
fn cancellation_between_timesteps() {
    let d = district();
    let controller = StaticController::default().with(d.house, house_setpoints(3e5));
    let mut cfg = config(10);
    cfg.progress_messages = 10;
    let mut sim = Simulation::new(cfg, d.net, controller).unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    let err = sim
        .run_with(
            |p| {
                if p.step == 2 {
                    trigger.cancel();
                }
            },
            Some(&token),
        )
        .unwrap_err();
    assert_eq!(err, SimError::Cancelled { step: 2 });
}

#[test]
fn progress_is_rate_limited() {
    let d = district();
    let controller = StaticController::default().with(d.house, house_setpoints(3e5));
    let mut cfg = config(12);
    cfg.progress_messages = 4;
    let mut sim = Simulation::new(cfg, d.net, controller).unwrap();

    let mut fractions = Vec::new();
    sim.run_with(|p| fractions.push(p.fraction_complete), None)
        .unwrap();
    assert_eq!(fractions, vec![0.25, 0.5, 0.75, 1.0]);
}

#[test]
fn invalid_config_is_rejected() {
    let d = district();
    let mut cfg = config(1);
    cfg.timestep_s = -1.0;
    assert!(matches!(
        Simulation::new(cfg, d.net, StaticController::default()),
        Err(SimError::InvalidConfig { .. })
    ));
}
