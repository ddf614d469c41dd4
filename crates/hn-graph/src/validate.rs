//! Topology validation and circuit discovery.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use petgraph::unionfind::UnionFind;

use crate::error::{GraphError, GraphResult};
use crate::topology::{PortRef, Topology};

/// Every port is connected and every junction joins at least two ports.
pub(crate) fn validate_structure(topology: &Topology) -> GraphResult<()> {
    for (&element, entry) in &topology.elements {
        for (port, node) in entry.nodes.iter().enumerate() {
            let port = PortRef::new(element, port);
            match node {
                None => return Err(GraphError::UnconnectedPort { port }),
                Some(node) => {
                    let listed = topology
                        .junctions
                        .get(node)
                        .is_some_and(|j| j.ports.contains(&port));
                    if !listed {
                        return Err(GraphError::UnknownNode { node: *node });
                    }
                }
            }
        }
    }

    for junction in topology.junctions.values() {
        if junction.ports.len() < 2 {
            return Err(GraphError::DanglingNode {
                node: junction.id,
                ports: junction.ports.len(),
            });
        }
    }

    Ok(())
}

/// Breadth-first search over the element/junction incidence graph.
pub(crate) fn validate_connected(topology: &Topology) -> GraphResult<()> {
    let mut seen_elements = BTreeSet::new();
    let mut components = 0;

    for &start in topology.elements.keys() {
        if !seen_elements.insert(start) {
            continue;
        }
        components += 1;

        let mut queue = VecDeque::from([start]);
        while let Some(element) = queue.pop_front() {
            let Some(entry) = topology.elements.get(&element) else {
                continue;
            };
            for node in entry.nodes.iter().flatten() {
                let Some(junction) = topology.junctions.get(node) else {
                    continue;
                };
                for port in &junction.ports {
                    if seen_elements.insert(port.element) {
                        queue.push_back(port.element);
                    }
                }
            }
        }
    }

    if components > 1 {
        return Err(GraphError::Disconnected { components });
    }
    Ok(())
}

/// Group ports that exchange mass, either through a junction or inside an
/// element's port group.
pub(crate) fn hydraulic_circuits(topology: &Topology) -> Vec<Vec<PortRef>> {
    let ports: Vec<PortRef> = topology
        .elements
        .iter()
        .flat_map(|(&element, entry)| (0..entry.nodes.len()).map(move |p| PortRef::new(element, p)))
        .collect();
    let index: BTreeMap<PortRef, usize> = ports.iter().enumerate().map(|(i, p)| (*p, i)).collect();

    let mut sets = UnionFind::<usize>::new(ports.len());

    for (&element, entry) in &topology.elements {
        for group in entry.layout.groups() {
            for pair in group.windows(2) {
                let a = index[&PortRef::new(element, pair[0])];
                let b = index[&PortRef::new(element, pair[1])];
                sets.union(a, b);
            }
        }
    }

    for junction in topology.junctions.values() {
        for pair in junction.ports.windows(2) {
            if let (Some(&a), Some(&b)) = (index.get(&pair[0]), index.get(&pair[1])) {
                sets.union(a, b);
            }
        }
    }

    let mut order: Vec<usize> = Vec::new();
    let mut circuits: BTreeMap<usize, Vec<PortRef>> = BTreeMap::new();
    for (i, port) in ports.iter().enumerate() {
        let root = sets.find_mut(i);
        circuits
            .entry(root)
            .or_insert_with(|| {
                order.push(root);
                Vec::new()
            })
            .push(*port);
    }

    order
        .into_iter()
        .filter_map(|root| circuits.remove(&root))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::PortLayout;
    use hn_core::Id;

    #[test]
    fn validate_empty_topology() {
        assert!(Topology::new().validate().is_ok());
    }

    #[test]
    fn unconnected_port_is_reported() {
        let mut topology = Topology::new();
        topology
            .register_element(Id::from_index(0), PortLayout::single(1))
            .unwrap();
        let err = topology.validate().unwrap_err();
        assert!(matches!(err, GraphError::UnconnectedPort { .. }));
    }

    #[test]
    fn split_layout_separates_circuits() {
        let (hx, a, b) = (Id::from_index(0), Id::from_index(1), Id::from_index(2));
        let mut topology = Topology::new();
        topology.register_element(hx, PortLayout::split(&[2, 2])).unwrap();
        topology.register_element(a, PortLayout::single(2)).unwrap();
        topology.register_element(b, PortLayout::single(2)).unwrap();
        topology.connect(PortRef::new(hx, 1), PortRef::new(a, 0)).unwrap();
        topology.connect(PortRef::new(a, 1), PortRef::new(hx, 0)).unwrap();
        topology.connect(PortRef::new(hx, 3), PortRef::new(b, 0)).unwrap();
        topology.connect(PortRef::new(b, 1), PortRef::new(hx, 2)).unwrap();

        let circuits = hydraulic_circuits(&topology);
        assert_eq!(circuits.len(), 2);
        assert_eq!(circuits[0].len(), 4);
        assert_eq!(circuits[0][0], PortRef::new(hx, 0));
        assert!(circuits[1].contains(&PortRef::new(b, 1)));
    }
}
