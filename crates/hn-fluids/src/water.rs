//! Saturated liquid water properties at 5-10 K spacing (0-150 °C).

use hn_core::units::constants::ZERO_CELSIUS_K;

use crate::table::FluidRow;

// (°C, kg/m³, Pa·s, J/(kg·K), W/(m·K))
const WATER: [(f64, f64, f64, f64, f64); 26] = [
    (0.0, 999.84, 1.792e-3, 4217.6, 0.561),
    (5.0, 999.97, 1.519e-3, 4204.0, 0.571),
    (10.0, 999.70, 1.307e-3, 4192.1, 0.580),
    (15.0, 999.10, 1.138e-3, 4185.5, 0.589),
    (20.0, 998.21, 1.002e-3, 4181.8, 0.598),
    (25.0, 997.05, 0.890e-3, 4179.6, 0.607),
    (30.0, 995.65, 0.797e-3, 4178.4, 0.615),
    (35.0, 994.03, 0.719e-3, 4178.3, 0.623),
    (40.0, 992.22, 0.653e-3, 4178.5, 0.631),
    (45.0, 990.21, 0.596e-3, 4180.0, 0.637),
    (50.0, 988.04, 0.547e-3, 4180.6, 0.644),
    (55.0, 985.69, 0.504e-3, 4182.5, 0.649),
    (60.0, 983.20, 0.466e-3, 4184.3, 0.654),
    (65.0, 980.55, 0.433e-3, 4186.8, 0.659),
    (70.0, 977.76, 0.404e-3, 4189.5, 0.663),
    (75.0, 974.84, 0.378e-3, 4192.3, 0.667),
    (80.0, 971.79, 0.355e-3, 4196.4, 0.670),
    (85.0, 968.61, 0.334e-3, 4200.0, 0.673),
    (90.0, 965.31, 0.315e-3, 4205.0, 0.675),
    (95.0, 961.89, 0.298e-3, 4210.0, 0.677),
    (100.0, 958.35, 0.282e-3, 4216.0, 0.679),
    (110.0, 950.95, 0.255e-3, 4229.0, 0.682),
    (120.0, 943.11, 0.232e-3, 4245.0, 0.683),
    (130.0, 934.83, 0.213e-3, 4263.0, 0.684),
    (140.0, 926.13, 0.197e-3, 4285.0, 0.684),
    (150.0, 917.01, 0.183e-3, 4310.0, 0.682),
];

/// Water rows with internal energy integrated from 0 °C.
pub(crate) fn rows() -> Vec<FluidRow> {
    let mut rows = Vec::with_capacity(WATER.len());
    let mut energy = 0.0;
    let mut previous: Option<(f64, f64)> = None;

    for &(t_c, density, viscosity, heat_capacity, conductivity) in WATER.iter() {
        let temperature = t_c + ZERO_CELSIUS_K;
        if let Some((t_prev, cp_prev)) = previous {
            // trapezoidal rule, exact for piecewise-linear cp
            energy += 0.5 * (cp_prev + heat_capacity) * (temperature - t_prev);
        }
        previous = Some((temperature, heat_capacity));
        rows.push(FluidRow {
            temperature,
            density,
            viscosity,
            heat_capacity,
            thermal_conductivity: conductivity,
            internal_energy: energy,
        });
    }

    rows
}
