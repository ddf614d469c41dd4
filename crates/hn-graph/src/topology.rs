//! Junctions, connection points and connectivity queries.

use std::collections::BTreeMap;
use std::fmt;

use hn_core::{ElementId, IdAllocator, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::validate;

/// One connection point of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub element: ElementId,
    pub port: usize,
}

impl PortRef {
    pub fn new(element: ElementId, port: usize) -> Self {
        Self { element, port }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.element, self.port)
    }
}

/// Port count of an element, grouped by hydraulic circuit.
///
/// Ports in one group exchange mass inside the element. A heat exchanger has
/// two groups (primary and secondary) that only exchange heat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortLayout {
    groups: Vec<Vec<usize>>,
}

impl PortLayout {
    /// All ports in one hydraulic circuit.
    pub fn single(ports: usize) -> Self {
        Self {
            groups: vec![(0..ports).collect()],
        }
    }

    /// Consecutive port groups of the given sizes.
    pub fn split(sizes: &[usize]) -> Self {
        let mut start = 0;
        let groups = sizes
            .iter()
            .map(|&size| {
                let group = (start..start + size).collect();
                start += size;
                group
            })
            .collect();
        Self { groups }
    }

    pub fn port_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }
}

/// A junction joining two or more connection points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    pub id: NodeId,
    /// Connected ports, in connection order.
    pub ports: Vec<PortRef>,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementEntry {
    pub(crate) layout: PortLayout,
    pub(crate) nodes: Vec<Option<NodeId>>,
}

/// Connectivity between element connection points.
///
/// Elements register their port layout; junctions are created on demand by
/// [`Topology::connect`]. Iteration over elements and junctions follows id
/// order, which is insertion order.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub(crate) junctions: BTreeMap<NodeId, Junction>,
    pub(crate) elements: BTreeMap<ElementId, ElementEntry>,
    node_ids: IdAllocator,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an element's connection points known to the topology.
    pub fn register_element(&mut self, element: ElementId, layout: PortLayout) -> GraphResult<()> {
        if self.elements.contains_key(&element) {
            return Err(GraphError::DuplicateElement { element });
        }
        let nodes = vec![None; layout.port_count()];
        self.elements.insert(element, ElementEntry { layout, nodes });
        Ok(())
    }

    /// Disconnect every port of `element` and forget it.
    pub fn remove_element(&mut self, element: ElementId) -> GraphResult<()> {
        let count = self.port_count(element)?;
        for port in 0..count {
            self.disconnect_node(PortRef::new(element, port))?;
        }
        self.elements.remove(&element);
        Ok(())
    }

    pub fn port_count(&self, element: ElementId) -> GraphResult<usize> {
        self.elements
            .get(&element)
            .map(|e| e.nodes.len())
            .ok_or(GraphError::UnknownElement { element })
    }

    pub fn layout(&self, element: ElementId) -> GraphResult<&PortLayout> {
        self.elements
            .get(&element)
            .map(|e| &e.layout)
            .ok_or(GraphError::UnknownElement { element })
    }

    /// Create an empty junction.
    pub fn add_junction(&mut self) -> NodeId {
        let id = self.node_ids.next_id();
        self.junctions.insert(
            id,
            Junction {
                id,
                ports: Vec::new(),
            },
        );
        id
    }

    /// Attach `port` to `node`, detaching it from any previous junction.
    pub fn attach(&mut self, port: PortRef, node: NodeId) -> GraphResult<()> {
        if !self.junctions.contains_key(&node) {
            return Err(GraphError::UnknownNode { node });
        }
        if self.connected_node(port)? == Some(node) {
            return Ok(());
        }
        self.disconnect_node(port)?;
        *self.slot_mut(port)? = Some(node);
        if let Some(junction) = self.junctions.get_mut(&node) {
            junction.ports.push(port);
        }
        Ok(())
    }

    /// Join two connection points through a junction.
    ///
    /// Reuses the junction of whichever port is already connected; when both
    /// are connected to different junctions, the second junction is merged
    /// into the first.
    pub fn connect(&mut self, a: PortRef, b: PortRef) -> GraphResult<NodeId> {
        match (self.connected_node(a)?, self.connected_node(b)?) {
            (None, None) => {
                let node = self.add_junction();
                self.attach(a, node)?;
                self.attach(b, node)?;
                Ok(node)
            }
            (Some(node), None) => {
                self.attach(b, node)?;
                Ok(node)
            }
            (None, Some(node)) => {
                self.attach(a, node)?;
                Ok(node)
            }
            (Some(keep), Some(merge)) if keep == merge => Ok(keep),
            (Some(keep), Some(merge)) => {
                let moved = self
                    .junctions
                    .remove(&merge)
                    .map(|j| j.ports)
                    .unwrap_or_default();
                for port in moved {
                    *self.slot_mut(port)? = Some(keep);
                    if let Some(junction) = self.junctions.get_mut(&keep) {
                        junction.ports.push(port);
                    }
                }
                Ok(keep)
            }
        }
    }

    /// Detach `port` from its junction. A junction left without ports is
    /// removed. Returns the junction the port was attached to.
    pub fn disconnect_node(&mut self, port: PortRef) -> GraphResult<Option<NodeId>> {
        let Some(node) = self.slot_mut(port)?.take() else {
            return Ok(None);
        };
        let now_empty = match self.junctions.get_mut(&node) {
            Some(junction) => {
                junction.ports.retain(|p| *p != port);
                junction.ports.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.junctions.remove(&node);
        }
        Ok(Some(node))
    }

    /// The junction `port` resolves to.
    pub fn node_of(&self, port: PortRef) -> GraphResult<NodeId> {
        self.connected_node(port)?
            .ok_or(GraphError::UnconnectedPort { port })
    }

    /// The junction `port` resolves to, if any.
    pub fn connected_node(&self, port: PortRef) -> GraphResult<Option<NodeId>> {
        let entry = self
            .elements
            .get(&port.element)
            .ok_or(GraphError::UnknownElement {
                element: port.element,
            })?;
        entry
            .nodes
            .get(port.port)
            .copied()
            .ok_or(GraphError::PortOutOfRange {
                port,
                count: entry.nodes.len(),
            })
    }

    pub fn junction(&self, node: NodeId) -> Option<&Junction> {
        self.junctions.get(&node)
    }

    /// Junctions in id order.
    pub fn junctions(&self) -> impl Iterator<Item = &Junction> {
        self.junctions.values()
    }

    pub fn junction_count(&self) -> usize {
        self.junctions.len()
    }

    /// Registered elements in id order.
    pub fn element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.keys().copied()
    }

    /// Junctions of each port of `element`, in port order.
    pub fn element_nodes(&self, element: ElementId) -> GraphResult<&[Option<NodeId>]> {
        self.elements
            .get(&element)
            .map(|e| e.nodes.as_slice())
            .ok_or(GraphError::UnknownElement { element })
    }

    /// Check that every port is connected, every junction joins at least two
    /// ports and the network is one connected piece.
    pub fn validate(&self) -> GraphResult<()> {
        validate::validate_structure(self)?;
        validate::validate_connected(self)
    }

    /// Ports grouped by hydraulic circuit, in order of first appearance.
    pub fn circuits(&self) -> Vec<Vec<PortRef>> {
        validate::hydraulic_circuits(self)
    }

    /// Every hydraulic circuit must contain at least one port for which
    /// `is_reference` holds.
    pub fn validate_pressure_references(
        &self,
        is_reference: impl Fn(PortRef) -> bool,
    ) -> GraphResult<()> {
        for (circuit, ports) in self.circuits().into_iter().enumerate() {
            if !ports.iter().any(|p| is_reference(*p)) {
                return Err(GraphError::NoPressureReference {
                    circuit,
                    first_port: ports[0],
                });
            }
        }
        Ok(())
    }

    fn slot_mut(&mut self, port: PortRef) -> GraphResult<&mut Option<NodeId>> {
        let entry = self
            .elements
            .get_mut(&port.element)
            .ok_or(GraphError::UnknownElement {
                element: port.element,
            })?;
        let count = entry.nodes.len();
        entry
            .nodes
            .get_mut(port.port)
            .ok_or(GraphError::PortOutOfRange { port, count })
    }
}
