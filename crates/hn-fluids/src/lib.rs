//! hn-fluids: fluid property lookup for heatnet.
//!
//! Provides an immutable, temperature-indexed property table (`FluidTable`)
//! covering density, viscosity, heat capacity, thermal conductivity and
//! specific internal energy. Internal energy is monotonic in temperature, so
//! the table also answers the inverse query used to turn solver unknowns back
//! into temperatures.
//!
//! The table is constructed once and shared by reference; there is no global
//! instance.
//!
//! # Example
//!
//! ```
//! use hn_fluids::FluidTable;
//!
//! let water = FluidTable::water();
//! let u = water.internal_energy(353.15);
//! let t = water.temperature(u);
//! assert!((t - 353.15).abs() < 1e-9);
//! ```

pub mod error;
pub mod table;
mod water;

pub use error::{FluidError, FluidResult};
pub use table::{FluidRow, FluidTable};
