//! Integration tests for topology validation.

use hn_core::{ElementId, Id};
use hn_graph::{GraphError, PortLayout, PortRef, Topology};

/// producer -> supply pipe -> demand -> return pipe -> producer
fn loop_topology() -> (Topology, [ElementId; 4]) {
    let ids = [0, 1, 2, 3].map(Id::from_index);
    let [producer, supply, demand, ret] = ids;
    let mut topology = Topology::new();
    for id in ids {
        topology.register_element(id, PortLayout::single(2)).unwrap();
    }
    topology
        .connect(PortRef::new(producer, 1), PortRef::new(supply, 0))
        .unwrap();
    topology
        .connect(PortRef::new(supply, 1), PortRef::new(demand, 0))
        .unwrap();
    topology
        .connect(PortRef::new(demand, 1), PortRef::new(ret, 0))
        .unwrap();
    topology
        .connect(PortRef::new(ret, 1), PortRef::new(producer, 0))
        .unwrap();
    (topology, ids)
}

#[test]
fn closed_loop_validates() {
    let (topology, _) = loop_topology();
    topology.validate().unwrap();
    assert_eq!(topology.junction_count(), 4);
    assert_eq!(topology.circuits().len(), 1);
}

#[test]
fn junction_ids_follow_insertion_order() {
    let (topology, _) = loop_topology();
    let ids: Vec<u32> = topology.junctions().map(|j| j.id.index()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn open_end_is_reported() {
    let (mut topology, [_, _, demand, _]) = loop_topology();
    topology.disconnect_node(PortRef::new(demand, 1)).unwrap();
    let err = topology.validate().unwrap_err();
    assert!(matches!(err, GraphError::UnconnectedPort { .. }));
}

#[test]
fn two_islands_are_disconnected() {
    let (mut topology, _) = loop_topology();
    let a = Id::from_index(10);
    let b = Id::from_index(11);
    topology.register_element(a, PortLayout::single(2)).unwrap();
    topology.register_element(b, PortLayout::single(2)).unwrap();
    topology
        .connect(PortRef::new(a, 0), PortRef::new(b, 0))
        .unwrap();
    topology
        .connect(PortRef::new(a, 1), PortRef::new(b, 1))
        .unwrap();

    let err = topology.validate().unwrap_err();
    assert_eq!(err, GraphError::Disconnected { components: 2 });
}

#[test]
fn heat_exchanger_splits_circuits() {
    let exchanger = Id::from_index(0);
    let primary = Id::from_index(1);
    let secondary = Id::from_index(2);

    let mut topology = Topology::new();
    topology
        .register_element(exchanger, PortLayout::split(&[2, 2]))
        .unwrap();
    topology
        .register_element(primary, PortLayout::single(2))
        .unwrap();
    topology
        .register_element(secondary, PortLayout::single(2))
        .unwrap();
    for (side, pipe) in [(0, primary), (2, secondary)] {
        topology
            .connect(PortRef::new(exchanger, side + 1), PortRef::new(pipe, 0))
            .unwrap();
        topology
            .connect(PortRef::new(pipe, 1), PortRef::new(exchanger, side))
            .unwrap();
    }

    topology.validate().unwrap();
    let circuits = topology.circuits();
    assert_eq!(circuits.len(), 2);

    // only the primary side has a reference
    let err = topology
        .validate_pressure_references(|p| p.element == primary)
        .unwrap_err();
    assert!(matches!(err, GraphError::NoPressureReference { circuit: 1, .. }));

    topology
        .validate_pressure_references(|p| p.element == primary || p.element == secondary)
        .unwrap();
}
