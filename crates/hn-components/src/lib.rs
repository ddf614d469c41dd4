//! hn-components: network elements and the equations they contribute.
//!
//! Every element port carries three unknowns `[m, P, u]` (mass flow,
//! pressure, specific internal energy). Port mass flow is positive when fluid
//! leaves the junction and enters the element. Each element emits exactly as
//! many rows as it has unknowns, and so does each junction ([`Node`]), which
//! keeps the assembled system square.
//!
//! Rows are linear in the unknowns; nonlinear terms are evaluated with the
//! element's previous iterate (`prev_sol`).

pub mod boundary;
pub mod direction;
pub mod element;
pub mod equation;
pub mod error;
pub mod heat_boundary;
pub mod heat_transfer;
pub mod node;
pub mod output;
pub mod pipe;
pub mod setpoint;
pub mod storage;

pub use boundary::Boundary;
pub use direction::FlowDirection;
pub use element::{Element, ElementKind};
pub use equation::{EquationRow, PortView, QUANTITIES_PER_PORT, Unknown};
pub use error::{ComponentError, ComponentResult};
pub use heat_boundary::{Demand, Production, mass_flow_for_power};
pub use heat_transfer::{HeatTransfer, HeatTransferKind};
pub use node::{Node, NodePort};
pub use output::{OutputValue, Quantity};
pub use pipe::{Pipe, friction_factor};
pub use setpoint::{SetpointKey, Setpoints};
pub use storage::{Storage, StorageMode};
