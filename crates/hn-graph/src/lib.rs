//! hn-graph: network topology for heatnet.
//!
//! Provides:
//! - Junctions joining element connection points (`Topology`)
//! - Port resolution, `connect` and `disconnect_node`
//! - Structural validation (unconnected ports, dangling junctions,
//!   disconnected networks)
//! - Hydraulic circuit discovery for pressure-reference checks
//!
//! Elements are referenced by id only; the topology never owns them.
//!
//! # Example
//!
//! ```
//! use hn_core::Id;
//! use hn_graph::{PortLayout, PortRef, Topology};
//!
//! let source = Id::from_index(0);
//! let pipe = Id::from_index(1);
//!
//! let mut topology = Topology::new();
//! topology.register_element(source, PortLayout::single(1)).unwrap();
//! topology.register_element(pipe, PortLayout::single(2)).unwrap();
//! let node = topology
//!     .connect(PortRef::new(source, 0), PortRef::new(pipe, 0))
//!     .unwrap();
//!
//! assert_eq!(topology.junction(node).unwrap().ports.len(), 2);
//! ```

pub mod error;
pub mod topology;
pub(crate) mod validate;

pub use error::{GraphError, GraphResult};
pub use topology::{Junction, PortLayout, PortRef, Topology};
