//! Network: element arena, junction state and topology in one place.

use std::collections::BTreeMap;
use std::sync::Arc;

use hn_components::{Element, ElementKind, EquationRow, Node, NodePort, QUANTITIES_PER_PORT};
use hn_core::{ElementId, IdAllocator, NodeId};
use hn_fluids::FluidTable;
use hn_graph::{GraphError, PortRef, Topology};
use rayon::prelude::*;

use crate::error::{SolverError, SolverResult};

/// A district heating network ready to be solved.
///
/// Elements are stored in insertion order and junctions in creation order;
/// [`Network::assign_indices`] lays out the unknown vector in that order,
/// elements first.
#[derive(Debug, Clone)]
pub struct Network {
    fluid: Arc<FluidTable>,
    topology: Topology,
    elements: BTreeMap<ElementId, Element>,
    nodes: BTreeMap<NodeId, Node>,
    ids: IdAllocator,
    total_unknowns: Option<usize>,
}

impl Network {
    pub fn new(fluid: Arc<FluidTable>) -> Self {
        Self {
            fluid,
            topology: Topology::new(),
            elements: BTreeMap::new(),
            nodes: BTreeMap::new(),
            ids: IdAllocator::new(),
            total_unknowns: None,
        }
    }

    pub fn fluid(&self) -> &FluidTable {
        &self.fluid
    }

    pub fn fluid_handle(&self) -> Arc<FluidTable> {
        Arc::clone(&self.fluid)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn add_element(&mut self, name: impl Into<String>, kind: ElementKind) -> SolverResult<ElementId> {
        let id = self.ids.next_id();
        self.topology.register_element(id, kind.port_layout())?;
        self.elements.insert(id, Element::new(id, name, kind));
        self.total_unknowns = None;
        Ok(id)
    }

    /// Removes an element, detaching all of its ports first.
    pub fn remove_element(&mut self, id: ElementId) -> SolverResult<Element> {
        self.topology.remove_element(id)?;
        let element = self
            .elements
            .remove(&id)
            .ok_or(GraphError::UnknownElement { element: id })?;
        self.sync_nodes();
        self.total_unknowns = None;
        Ok(element)
    }

    /// Joins two ports, merging their junctions if both already have one.
    pub fn connect(&mut self, a: PortRef, b: PortRef) -> SolverResult<NodeId> {
        let node = self.topology.connect(a, b)?;
        self.sync_nodes();
        self.total_unknowns = None;
        Ok(node)
    }

    /// Detaches a port from its junction and returns that junction, if any.
    /// Junctions left without ports are dropped.
    pub fn disconnect(&mut self, port: PortRef) -> SolverResult<Option<NodeId>> {
        let removed = self.topology.disconnect_node(port)?;
        self.sync_nodes();
        self.total_unknowns = None;
        Ok(removed)
    }

    fn sync_nodes(&mut self) {
        let topology = &self.topology;
        self.nodes.retain(|id, _| topology.junction(*id).is_some());
        for junction in topology.junctions() {
            self.nodes
                .entry(junction.id)
                .or_insert_with(|| Node::new(junction.id));
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn element_by_name(&self, name: &str) -> Option<&Element> {
        self.elements.values().find(|e| e.name() == name)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.values_mut()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_of(&self, port: PortRef) -> SolverResult<NodeId> {
        Ok(self.topology.node_of(port)?)
    }

    /// Structural checks plus one pressure reference per hydraulic circuit.
    pub fn validate(&self) -> SolverResult<()> {
        self.topology.validate()?;
        self.topology.validate_pressure_references(|port| {
            self.elements
                .get(&port.element)
                .is_some_and(|e| e.sets_pressure(port.port))
        })?;
        Ok(())
    }

    /// Lays out the unknown vector and returns its length.
    pub fn assign_indices(&mut self) -> usize {
        let mut offset = 0;
        for element in self.elements.values_mut() {
            element.set_matrix_index(offset);
            offset += element.number_of_unknowns();
        }
        for node in self.nodes.values_mut() {
            node.set_matrix_index(offset);
            offset += node.number_of_unknowns();
        }
        self.total_unknowns = Some(offset);
        offset
    }

    /// Unknown count, if indices are assigned for the current topology.
    pub fn total_unknowns(&self) -> Option<usize> {
        self.total_unknowns
    }

    fn port_node_indices(&self, element: &Element) -> SolverResult<Vec<usize>> {
        self.topology
            .element_nodes(element.id())?
            .iter()
            .enumerate()
            .map(|(port, node)| {
                let port = PortRef::new(element.id(), port);
                let node = node.ok_or(GraphError::UnconnectedPort { port })?;
                let node = self
                    .nodes
                    .get(&node)
                    .ok_or(GraphError::UnknownNode { node })?;
                Ok(node.matrix_index())
            })
            .collect()
    }

    fn element_rows(&self, element: &Element) -> SolverResult<Vec<EquationRow>> {
        let nodes = self.port_node_indices(element)?;
        Ok(element.equations(&nodes, &self.fluid)?)
    }

    fn node_rows(&self, node: &Node) -> SolverResult<Vec<EquationRow>> {
        let junction = self
            .topology
            .junction(node.id())
            .ok_or(GraphError::UnknownNode { node: node.id() })?;
        let ports = junction
            .ports
            .iter()
            .map(|port| {
                let element = self
                    .elements
                    .get(&port.element)
                    .ok_or(GraphError::UnknownElement {
                        element: port.element,
                    })?;
                let base = element.matrix_index() + port.port * QUANTITIES_PER_PORT;
                Ok(NodePort {
                    mass_flow_index: base,
                    energy_index: base + 2,
                    prev_mass_flow: element.mass_flow(port.port)?,
                })
            })
            .collect::<SolverResult<Vec<_>>>()?;
        Ok(node.equations(&ports, &self.fluid))
    }

    /// All equation rows for the current iterate: elements first, then
    /// junctions, each in id order.
    ///
    /// With `parallel` the per-entity rows are generated on the rayon pool;
    /// the resulting order is identical.
    pub fn collect_equations(&self, parallel: bool) -> SolverResult<Vec<EquationRow>> {
        if self.total_unknowns.is_none() {
            return Err(SolverError::Setup {
                what: "indices are not assigned for the current topology".into(),
            });
        }
        let (element_blocks, node_blocks): (Vec<Vec<EquationRow>>, Vec<Vec<EquationRow>>) =
            if parallel {
                (
                    self.elements
                        .par_iter()
                        .map(|(_, e)| self.element_rows(e))
                        .collect::<SolverResult<_>>()?,
                    self.nodes
                        .par_iter()
                        .map(|(_, n)| self.node_rows(n))
                        .collect::<SolverResult<_>>()?,
                )
            } else {
                (
                    self.elements
                        .values()
                        .map(|e| self.element_rows(e))
                        .collect::<SolverResult<_>>()?,
                    self.nodes
                        .values()
                        .map(|n| self.node_rows(n))
                        .collect::<SolverResult<_>>()?,
                )
            };
        Ok(element_blocks
            .into_iter()
            .chain(node_blocks)
            .flatten()
            .collect())
    }

    /// Writes a solution vector back into every element and junction cache.
    pub fn distribute(&mut self, solution: &[f64]) -> SolverResult<()> {
        match self.total_unknowns {
            Some(n) if n == solution.len() => {}
            Some(n) => {
                return Err(SolverError::Dimension {
                    rows: solution.len(),
                    unknowns: n,
                });
            }
            None => {
                return Err(SolverError::Setup {
                    what: "indices are not assigned for the current topology".into(),
                });
            }
        }
        for element in self.elements.values_mut() {
            let start = element.matrix_index();
            let end = start + element.number_of_unknowns();
            element.set_prev_sol(&solution[start..end])?;
        }
        for node in self.nodes.values_mut() {
            let start = node.matrix_index();
            node.set_prev_sol([solution[start], solution[start + 1], solution[start + 2]]);
        }
        Ok(())
    }

    /// Zeroes every previous-solution cache.
    pub fn reset_prev_solutions(&mut self) {
        self.elements.values_mut().for_each(Element::reset_prev_sol);
        self.nodes.values_mut().for_each(Node::reset_prev_sol);
    }
}
