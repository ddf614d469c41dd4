//! Temperature-indexed property table with linear interpolation.

use crate::error::{FluidError, FluidResult};
use crate::water;

/// One tabulated state point. All values SI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidRow {
    /// Temperature [K]
    pub temperature: f64,
    /// Density [kg/m³]
    pub density: f64,
    /// Dynamic viscosity [Pa·s]
    pub viscosity: f64,
    /// Specific heat capacity [J/(kg·K)]
    pub heat_capacity: f64,
    /// Thermal conductivity [W/(m·K)]
    pub thermal_conductivity: f64,
    /// Specific internal energy [J/kg]
    pub internal_energy: f64,
}

/// Immutable fluid property table.
///
/// Temperatures and internal energies must both be strictly increasing.
/// Property lookups clamp to the table ends; the temperature/internal-energy
/// pair extrapolates linearly from the end segments so that solver iterates
/// outside the tabulated range still map to a finite temperature.
#[derive(Debug, Clone)]
pub struct FluidTable {
    rows: Vec<FluidRow>,
}

impl FluidTable {
    /// Validate and wrap a set of rows.
    pub fn new(rows: Vec<FluidRow>) -> FluidResult<Self> {
        if rows.len() < 2 {
            return Err(FluidError::InvalidTable {
                what: format!("needs at least two rows, got {}", rows.len()),
            });
        }

        for row in &rows {
            let values = [
                row.temperature,
                row.density,
                row.viscosity,
                row.heat_capacity,
                row.thermal_conductivity,
                row.internal_energy,
            ];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(FluidError::NonFinite { what: "table row" });
            }
        }

        for pair in rows.windows(2) {
            if pair[1].temperature <= pair[0].temperature {
                return Err(FluidError::InvalidTable {
                    what: format!(
                        "temperature not strictly increasing at {} K",
                        pair[1].temperature
                    ),
                });
            }
            if pair[1].internal_energy <= pair[0].internal_energy {
                return Err(FluidError::InvalidTable {
                    what: format!(
                        "internal energy not strictly increasing at {} K",
                        pair[1].temperature
                    ),
                });
            }
        }

        Ok(Self { rows })
    }

    /// Liquid water, 273.15-423.15 K, internal energy zero at 273.15 K.
    pub fn water() -> Self {
        Self {
            rows: water::rows(),
        }
    }

    pub fn rows(&self) -> &[FluidRow] {
        &self.rows
    }

    /// Tabulated temperature range [K].
    pub fn temperature_range(&self) -> (f64, f64) {
        (self.rows[0].temperature, self.rows[self.rows.len() - 1].temperature)
    }

    pub fn density(&self, temperature: f64) -> f64 {
        self.clamped(temperature, |r| r.density)
    }

    pub fn viscosity(&self, temperature: f64) -> f64 {
        self.clamped(temperature, |r| r.viscosity)
    }

    pub fn heat_capacity(&self, temperature: f64) -> f64 {
        self.clamped(temperature, |r| r.heat_capacity)
    }

    pub fn thermal_conductivity(&self, temperature: f64) -> f64 {
        self.clamped(temperature, |r| r.thermal_conductivity)
    }

    /// Specific internal energy [J/kg] at `temperature` [K].
    pub fn internal_energy(&self, temperature: f64) -> f64 {
        let i = self.segment(temperature, |r| r.temperature);
        let (a, b) = (&self.rows[i], &self.rows[i + 1]);
        lerp(
            temperature,
            a.temperature,
            b.temperature,
            a.internal_energy,
            b.internal_energy,
        )
    }

    /// Inverse of [`FluidTable::internal_energy`].
    pub fn temperature(&self, internal_energy: f64) -> f64 {
        let i = self.segment(internal_energy, |r| r.internal_energy);
        let (a, b) = (&self.rows[i], &self.rows[i + 1]);
        lerp(
            internal_energy,
            a.internal_energy,
            b.internal_energy,
            a.temperature,
            b.temperature,
        )
    }

    /// Index of the segment `[i, i+1]` bracketing `x` in the given column.
    /// Out-of-range queries select the first or last segment.
    fn segment(&self, x: f64, key: impl Fn(&FluidRow) -> f64) -> usize {
        let upper = self.rows.partition_point(|r| key(r) <= x);
        upper.clamp(1, self.rows.len() - 1) - 1
    }

    fn clamped(&self, temperature: f64, value: impl Fn(&FluidRow) -> f64) -> f64 {
        let (t_min, t_max) = self.temperature_range();
        let t = if temperature.is_nan() {
            t_min
        } else {
            temperature.clamp(t_min, t_max)
        };
        let i = self.segment(t, |r| r.temperature);
        let (a, b) = (&self.rows[i], &self.rows[i + 1]);
        lerp(t, a.temperature, b.temperature, value(a), value(b))
    }
}

fn lerp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}
