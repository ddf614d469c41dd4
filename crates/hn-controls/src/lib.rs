//! hn-controls: setpoint generation for network simulations.
//!
//! The simulation asks a [`Controller`] for setpoints once per timestep.
//! [`ProfileController`] is the reference implementation: consumer profiles,
//! producers in priority order and storage as buffer.

pub mod balance;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod profile;

pub use balance::Balance;
pub use controller::{Controller, SetpointMap, StaticController};
pub use dispatch::{
    DemandControl, ProducerControl, ProfileController, StorageControl, TransferControl,
};
pub use error::{ControlError, ControlResult};
pub use profile::Profile;
