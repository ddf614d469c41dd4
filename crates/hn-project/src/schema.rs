//! Project schema definitions.

use std::collections::BTreeMap;

use hn_controls::Profile;
use hn_sim::SimulationConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDef {
    pub name: String,
    pub simulation: SimulationConfig,
    /// Named per-timestep heat profiles [W].
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default)]
    pub assets: Vec<AssetDef>,
    #[serde(default)]
    pub joints: Vec<JointDef>,
}

/// One network element.
///
/// `ports` lists connection identifiers in port order. Assets sharing an
/// identifier meet at one junction. Parameters irrelevant to `kind` are
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: String,
    pub ports: Vec<String>,

    // Pipe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter_m: Option<f64>,
    #[serde(default = "default_roughness")]
    pub roughness_m: f64,
    /// Heat transfer coefficient to the surroundings [W/(m²·K)]
    #[serde(default)]
    pub alpha: f64,
    #[serde(default = "default_external_temperature")]
    pub external_temperature_k: f64,
    #[serde(default)]
    pub heat_external_w: f64,

    // Boundary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_pa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_flow_kg_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<f64>,

    // Production, demand, storage
    #[serde(default)]
    pub prescribe_mass_flow: bool,
    #[serde(default = "default_pressure_supply")]
    pub pressure_supply_pa: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_in_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_out_k: Option<f64>,

    // Heat pump, heat exchanger
    #[serde(default = "default_cop")]
    pub cop: f64,
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_secondary_pa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_in_primary_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_out_primary_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_in_secondary_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_out_secondary_k: Option<f64>,

    // Control
    /// Name of an entry in `profiles`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default)]
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_power_w: Option<f64>,
    /// Storage capacity [J]; zero means unbounded.
    #[serde(default)]
    pub capacity_j: f64,
    #[serde(default)]
    pub stored_energy_j: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_factor: Option<f64>,
}

/// Merges connection identifiers into one junction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JointDef {
    pub id: String,
    pub ports: Vec<String>,
}

fn default_roughness() -> f64 {
    1e-3
}

fn default_external_temperature() -> f64 {
    283.15
}

fn default_pressure_supply() -> f64 {
    1e5
}

fn default_cop() -> f64 {
    4.0
}

fn default_efficiency() -> f64 {
    1.0
}

/// Asset kinds the builder knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Boundary,
    Pipe,
    Production,
    Demand,
    Storage,
    HeatPump,
    HeatExchanger,
}

impl AssetKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "boundary" => Some(AssetKind::Boundary),
            "pipe" => Some(AssetKind::Pipe),
            "production" => Some(AssetKind::Production),
            "demand" => Some(AssetKind::Demand),
            "storage" => Some(AssetKind::Storage),
            "heat_pump" => Some(AssetKind::HeatPump),
            "heat_exchanger" => Some(AssetKind::HeatExchanger),
            _ => None,
        }
    }

    pub fn port_count(self) -> usize {
        match self {
            AssetKind::Boundary => 1,
            AssetKind::HeatPump | AssetKind::HeatExchanger => 4,
            _ => 2,
        }
    }
}
