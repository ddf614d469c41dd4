//! Topology error types.

use hn_core::{ElementId, NodeId};

use crate::topology::PortRef;

pub type GraphResult<T> = Result<T, GraphError>;

/// Topology construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An element id is not registered with the topology.
    UnknownElement { element: ElementId },

    /// A junction id does not exist.
    UnknownNode { node: NodeId },

    /// An element was registered twice.
    DuplicateElement { element: ElementId },

    /// A connection point index beyond the element's port count.
    PortOutOfRange { port: PortRef, count: usize },

    /// A connection point resolves to no junction.
    UnconnectedPort { port: PortRef },

    /// A junction joins fewer than two connection points.
    DanglingNode { node: NodeId, ports: usize },

    /// The network falls apart into several pieces.
    Disconnected { components: usize },

    /// A hydraulic circuit has no pressure-setting connection point.
    NoPressureReference { circuit: usize, first_port: PortRef },

    /// A chain of joints that reaches no element.
    IsolatedJointSegment { what: String },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::UnknownElement { element } => {
                write!(f, "Element {} is not part of the topology", element)
            }
            GraphError::UnknownNode { node } => write!(f, "Node {} does not exist", node),
            GraphError::DuplicateElement { element } => {
                write!(f, "Element {} registered twice", element)
            }
            GraphError::PortOutOfRange { port, count } => write!(
                f,
                "Connection point {} out of range (element has {} ports)",
                port, count
            ),
            GraphError::UnconnectedPort { port } => {
                write!(f, "Connection point {} is not connected to a node", port)
            }
            GraphError::DanglingNode { node, ports } => write!(
                f,
                "Node {} joins {} connection point(s), expected at least 2",
                node, ports
            ),
            GraphError::Disconnected { components } => {
                write!(f, "Network is split into {} disconnected parts", components)
            }
            GraphError::NoPressureReference {
                circuit,
                first_port,
            } => write!(
                f,
                "Hydraulic circuit {} (containing {}) has no pressure reference",
                circuit, first_port
            ),
            GraphError::IsolatedJointSegment { what } => {
                write!(f, "Joint segment reaches no element: {}", what)
            }
        }
    }
}

impl std::error::Error for GraphError {}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_core::Id;

    #[test]
    fn display_names_the_port() {
        let err = GraphError::UnconnectedPort {
            port: PortRef::new(Id::from_index(3), 1),
        };
        assert_eq!(
            err.to_string(),
            "Connection point 3[1] is not connected to a node"
        );
    }
}
