//! hn-core: stable foundation for heatnet.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + relative difference)
//! - ids (stable compact IDs for network objects)

pub mod ids;
pub mod numeric;
pub mod units;

pub use ids::*;
pub use numeric::*;
pub use units::*;
