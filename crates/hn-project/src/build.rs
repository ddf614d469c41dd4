//! Turns a [`ProjectDef`] into a solvable network and its controller.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use hn_components::{
    Boundary, Demand, ElementKind, HeatTransfer, HeatTransferKind, Pipe, Production, Storage,
};
use hn_controls::{
    DemandControl, ProducerControl, Profile, ProfileController, StorageControl, TransferControl,
};
use hn_core::{ElementId, k, kgps, m, pa};
use hn_fluids::FluidTable;
use hn_graph::{GraphError, PortRef};
use hn_sim::SimulationConfig;
use hn_solver::Network;
use petgraph::unionfind::UnionFind;
use tracing::debug;

use crate::schema::{AssetDef, AssetKind, ProjectDef};
use crate::{ProjectError, ProjectResult};

const SUPPLY_TEMPERATURE: f64 = 353.15;
const RETURN_TEMPERATURE: f64 = 313.15;

/// A project ready to simulate.
#[derive(Debug)]
pub struct BuiltProject {
    pub name: String,
    pub config: SimulationConfig,
    pub network: Network,
    pub controller: ProfileController,
    /// Asset id to element id
    pub elements: BTreeMap<String, ElementId>,
}

impl BuiltProject {
    pub fn element(&self, asset_id: &str) -> Option<ElementId> {
        self.elements.get(asset_id).copied()
    }
}

/// Builds and validates the network and controller described by `project`.
pub fn build_project(project: &ProjectDef) -> ProjectResult<BuiltProject> {
    project.simulation.validate()?;
    check_unique_ids(project)?;

    let mut network = Network::new(Arc::new(FluidTable::water()));
    let mut elements = BTreeMap::new();
    let mut kinds = Vec::with_capacity(project.assets.len());
    for asset in &project.assets {
        let kind = AssetKind::parse(&asset.kind).ok_or_else(|| ProjectError::UnsupportedElement {
            id: asset.id.clone(),
            kind: asset.kind.clone(),
        })?;
        if asset.ports.len() != kind.port_count() {
            return Err(ProjectError::PortCount {
                id: asset.id.clone(),
                expected: kind.port_count(),
                actual: asset.ports.len(),
            });
        }
        let element = element_kind(asset, kind)?;
        let name = asset.name.clone().unwrap_or_else(|| asset.id.clone());
        let id = network.add_element(name, element)?;
        elements.insert(asset.id.clone(), id);
        kinds.push(kind);
    }

    connect_ports(project, &elements, &mut network)?;
    network.validate()?;

    let mut controller =
        ProfileController::new(project.simulation.start, project.simulation.timestep_s)?;
    for (asset, kind) in project.assets.iter().zip(&kinds) {
        let element = elements[&asset.id];
        add_control(project, asset, *kind, element, &network, &mut controller)?;
    }
    controller.validate_horizon(project.simulation.number_of_time_steps())?;

    debug!(
        project = %project.name,
        elements = elements.len(),
        junctions = network.nodes().count(),
        "project built"
    );
    Ok(BuiltProject {
        name: project.name.clone(),
        config: project.simulation.clone(),
        network,
        controller,
        elements,
    })
}

fn check_unique_ids(project: &ProjectDef) -> ProjectResult<()> {
    let mut seen = BTreeSet::new();
    let ids = project
        .assets
        .iter()
        .map(|a| &a.id)
        .chain(project.joints.iter().map(|j| &j.id));
    for id in ids {
        if !seen.insert(id) {
            return Err(ProjectError::DuplicateId { id: id.clone() });
        }
    }
    Ok(())
}

fn required(asset: &AssetDef, value: Option<f64>, what: &'static str) -> ProjectResult<f64> {
    value.ok_or_else(|| ProjectError::MissingParameter {
        id: asset.id.clone(),
        what,
    })
}

fn element_kind(asset: &AssetDef, kind: AssetKind) -> ProjectResult<ElementKind> {
    let element = match kind {
        AssetKind::Boundary => {
            let t = k(required(asset, asset.temperature_k, "temperature_k")?);
            match asset.mass_flow_kg_s {
                Some(flow) => ElementKind::Boundary(Boundary::mass_flow(kgps(flow), t)),
                None => {
                    let p = required(asset, asset.pressure_pa, "pressure_pa")?;
                    ElementKind::Boundary(Boundary::pressure(pa(p), t))
                }
            }
        }
        AssetKind::Pipe => {
            let length = required(asset, asset.length_m, "length_m")?;
            let diameter = required(asset, asset.diameter_m, "diameter_m")?;
            let pipe = Pipe::new(m(length), m(diameter), m(asset.roughness_m))?
                .with_heat_loss(asset.alpha, asset.external_temperature_k)
                .with_external_heat(asset.heat_external_w);
            ElementKind::Pipe(pipe)
        }
        AssetKind::Production => {
            let t_in = asset.temperature_in_k.unwrap_or(RETURN_TEMPERATURE);
            let t_out = asset.temperature_out_k.unwrap_or(SUPPLY_TEMPERATURE);
            let mut production = if asset.prescribe_mass_flow {
                Production::flow_controlled()
            } else {
                Production::pressure_controlled(asset.pressure_supply_pa, t_out)
            };
            production.temperature_in = t_in;
            production.temperature_out = t_out;
            ElementKind::Production(production)
        }
        AssetKind::Demand => ElementKind::Demand(Demand::new(
            asset.temperature_in_k.unwrap_or(SUPPLY_TEMPERATURE),
            asset.temperature_out_k.unwrap_or(RETURN_TEMPERATURE),
        )),
        AssetKind::Storage => ElementKind::Storage(
            Storage::new(
                asset.temperature_in_k.unwrap_or(SUPPLY_TEMPERATURE),
                asset.temperature_out_k.unwrap_or(RETURN_TEMPERATURE),
                asset.capacity_j,
            )
            .with_stored_energy(asset.stored_energy_j),
        ),
        AssetKind::HeatPump | AssetKind::HeatExchanger => {
            let transfer_kind = if kind == AssetKind::HeatPump {
                HeatTransferKind::HeatPump { cop: asset.cop }
            } else {
                HeatTransferKind::HeatExchanger {
                    efficiency: asset.efficiency,
                }
            };
            let mut transfer = HeatTransfer::new(transfer_kind)?;
            if let Some(p) = asset.pressure_secondary_pa {
                transfer = transfer.with_secondary_pressure(p);
            }
            let temperatures = [
                (asset.temperature_in_primary_k, &mut transfer.temperature_in_primary),
                (asset.temperature_out_primary_k, &mut transfer.temperature_out_primary),
                (asset.temperature_in_secondary_k, &mut transfer.temperature_in_secondary),
                (asset.temperature_out_secondary_k, &mut transfer.temperature_out_secondary),
            ];
            for (value, field) in temperatures {
                if let Some(t) = value {
                    *field = t;
                }
            }
            ElementKind::HeatTransfer(transfer)
        }
    };
    Ok(element)
}

/// Connection identifiers grouped through joints.
struct PortLabels {
    index: BTreeMap<String, usize>,
    sets: UnionFind<usize>,
}

impl PortLabels {
    fn new<'a>(labels: impl IntoIterator<Item = &'a String>) -> Self {
        let mut index = BTreeMap::new();
        for label in labels {
            let next = index.len();
            index.entry(label.clone()).or_insert(next);
        }
        let sets = UnionFind::new(index.len());
        Self { index, sets }
    }

    fn merge(&mut self, a: &str, b: &str) {
        if let (Some(&a), Some(&b)) = (self.index.get(a), self.index.get(b)) {
            self.sets.union(a, b);
        }
    }

    fn root(&mut self, label: &str) -> Option<usize> {
        let i = *self.index.get(label)?;
        Some(self.sets.find_mut(i))
    }
}

/// Connects every group of asset ports that share an identifier, directly or
/// through joints.
fn connect_ports(
    project: &ProjectDef,
    elements: &BTreeMap<String, ElementId>,
    network: &mut Network,
) -> ProjectResult<()> {
    let mut labels = PortLabels::new(
        project
            .assets
            .iter()
            .flat_map(|a| &a.ports)
            .chain(project.joints.iter().flat_map(|j| &j.ports)),
    );
    for joint in &project.joints {
        if let Some((first, rest)) = joint.ports.split_first() {
            for other in rest {
                labels.merge(first, other);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<PortRef>> = BTreeMap::new();
    for asset in &project.assets {
        let element = elements[&asset.id];
        for (port, label) in asset.ports.iter().enumerate() {
            if let Some(root) = labels.root(label) {
                groups
                    .entry(root)
                    .or_default()
                    .push(PortRef::new(element, port));
            }
        }
    }

    for joint in &project.joints {
        let reaches_asset = joint
            .ports
            .first()
            .and_then(|label| labels.root(label))
            .is_some_and(|root| groups.contains_key(&root));
        if !reaches_asset {
            return Err(ProjectError::Graph(GraphError::IsolatedJointSegment {
                what: joint.id.clone(),
            }));
        }
    }

    for ports in groups.values() {
        if let Some((first, rest)) = ports.split_first() {
            for port in rest {
                network.connect(*first, *port)?;
            }
        }
    }
    Ok(())
}

fn lookup_profile(project: &ProjectDef, asset: &AssetDef) -> ProjectResult<Profile> {
    let name = asset
        .profile
        .as_ref()
        .ok_or_else(|| ProjectError::MissingParameter {
            id: asset.id.clone(),
            what: "profile",
        })?;
    project
        .profiles
        .get(name)
        .cloned()
        .ok_or_else(|| ProjectError::UnknownReference {
            id: asset.id.clone(),
            reference: name.clone(),
        })
}

fn add_control(
    project: &ProjectDef,
    asset: &AssetDef,
    kind: AssetKind,
    element: ElementId,
    network: &Network,
    controller: &mut ProfileController,
) -> ProjectResult<()> {
    let Some(built) = network.element(element) else {
        return Ok(());
    };
    match (kind, built.kind()) {
        (AssetKind::Demand, ElementKind::Demand(d)) => controller.add_demand(DemandControl {
            element,
            profile: lookup_profile(project, asset)?,
            temperature_in: d.temperature_in,
            temperature_out: d.temperature_out,
        }),
        (AssetKind::Production, ElementKind::Production(p)) => {
            controller.add_producer(ProducerControl {
                element,
                priority: asset.priority,
                max_power: asset.max_power_w.unwrap_or(f64::INFINITY),
                temperature_in: p.temperature_in,
                temperature_out: p.temperature_out,
            })
        }
        (AssetKind::Storage, ElementKind::Storage(s)) => controller.add_storage(StorageControl {
            element,
            max_power: required(asset, asset.max_power_w, "max_power_w")?,
            capacity: s.max_energy,
            stored_energy: s.stored_energy,
            temperature_in: s.temperature_in,
            temperature_out: s.temperature_out,
        }),
        (AssetKind::HeatPump | AssetKind::HeatExchanger, ElementKind::HeatTransfer(h)) => {
            controller.add_transfer(TransferControl {
                element,
                profile: lookup_profile(project, asset)?,
                primary_factor: asset.primary_factor.unwrap_or(h.kind.duty_factor()),
                temperature_in_primary: h.temperature_in_primary,
                temperature_out_primary: h.temperature_out_primary,
                temperature_in_secondary: h.temperature_in_secondary,
                temperature_out_secondary: h.temperature_out_secondary,
            })
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_merge_transitively() {
        let names: Vec<String> = ["a", "b", "c", "d", "a"].map(String::from).to_vec();
        let mut labels = PortLabels::new(&names);
        labels.merge("a", "b");
        labels.merge("c", "b");
        assert_eq!(labels.root("a"), labels.root("c"));
        assert_ne!(labels.root("d"), labels.root("a"));
        assert_eq!(labels.root("missing"), None);
        assert_eq!(labels.index.len(), 4);
    }
}
