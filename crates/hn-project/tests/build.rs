use std::path::Path;

use hn_components::{ElementKind, Quantity};
use hn_graph::{GraphError, PortRef};
use hn_project::{ProjectError, build_project, from_yaml_str, load_yaml};
use hn_sim::Simulation;
use hn_solver::SolverError;

const LOOP: &str = r#"
name: loop
simulation:
  id: loop
  timestep_s: 3600
  start: 2024-01-01T00:00:00Z
  stop: 2024-01-01T03:00:00Z
  name: loop
profiles:
  house: [500000, 1000000, 200000]
assets:
  - id: plant
    kind: production
    ports: [ret, plant_out]
    pressure_supply_pa: 300000
  - id: supply
    kind: pipe
    ports: [pipe_in, house_in]
    length_m: 200
    diameter_m: 0.15
  - id: house
    kind: demand
    ports: [house_in, house_out]
    profile: house
  - id: return
    kind: pipe
    ports: [house_out, ret]
    length_m: 200
    diameter_m: 0.15
joints:
  - id: flange
    ports: [plant_out, pipe_in]
"#;

fn edit(find: &str, replace: &str) -> String {
    assert!(LOOP.contains(find));
    LOOP.replacen(find, replace, 1)
}

#[test]
fn loop_builds_and_runs() {
    let project = from_yaml_str(LOOP).unwrap();
    let built = build_project(&project).unwrap();
    assert_eq!(built.elements.len(), 4);
    assert_eq!(built.network.nodes().count(), 4);

    let plant = built.element("plant").unwrap();
    let supply = built.element("supply").unwrap();
    assert_eq!(
        built.network.node_of(PortRef::new(plant, 1)).unwrap(),
        built.network.node_of(PortRef::new(supply, 0)).unwrap()
    );
    match built.network.element(supply).unwrap().kind() {
        ElementKind::Pipe(p) => assert_eq!(p.roughness.value, 1e-3),
        other => panic!("unexpected kind {other:?}"),
    }

    let house = built.element("house").unwrap();
    let mut sim = Simulation::new(built.config, built.network, built.controller).unwrap();
    let result = sim.run().unwrap();
    assert!(result.all_converged());
    let heat = result
        .table
        .series(house, None, Quantity::HeatSupplied)
        .unwrap();
    for (q, expected) in heat.iter().zip([5e5, 1e6, 2e5]) {
        assert!((q - expected).abs() / expected < 1e-3, "delivered {q}");
    }
}

#[test]
fn demo_project_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/district.yaml");
    let project = load_yaml(&path).unwrap();
    let built = build_project(&project).unwrap();
    assert_eq!(built.elements.len(), 10);
    assert_eq!(built.config.number_of_time_steps(), 6);
}

#[test]
fn unsupported_kind() {
    let yaml = edit("kind: demand", "kind: sauna");
    let err = build_project(&from_yaml_str(&yaml).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::UnsupportedElement { ref id, ref kind } if id == "house" && kind == "sauna"
    ));
}

#[test]
fn duplicate_ids() {
    let yaml = edit("id: flange", "id: house");
    let err = build_project(&from_yaml_str(&yaml).unwrap()).unwrap_err();
    assert!(matches!(err, ProjectError::DuplicateId { ref id } if id == "house"));
}

#[test]
fn unknown_profile() {
    let yaml = edit("profile: house", "profile: office");
    let err = build_project(&from_yaml_str(&yaml).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::UnknownReference { ref reference, .. } if reference == "office"
    ));
}

#[test]
fn joint_reaching_no_asset() {
    let yaml = format!("{LOOP}  - id: stray\n    ports: [nowhere, elsewhere]\n");
    let err = build_project(&from_yaml_str(&yaml).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Graph(GraphError::IsolatedJointSegment { ref what }) if what == "stray"
    ));
}

#[test]
fn wrong_port_count() {
    let yaml = edit("ports: [house_in, house_out]", "ports: [house_in]");
    let err = build_project(&from_yaml_str(&yaml).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::PortCount {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn missing_pipe_length() {
    let yaml = edit("    length_m: 200\n", "");
    let err = build_project(&from_yaml_str(&yaml).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::MissingParameter {
            what: "length_m",
            ..
        }
    ));
}

#[test]
fn short_profile_is_rejected() {
    let yaml = edit("[500000, 1000000, 200000]", "[500000]");
    let err = build_project(&from_yaml_str(&yaml).unwrap()).unwrap_err();
    assert!(matches!(err, ProjectError::Control(_)));
}

#[test]
fn circuit_without_pressure_reference() {
    let yaml = edit("kind: production\n", "kind: production\n    prescribe_mass_flow: true\n");
    let err = build_project(&from_yaml_str(&yaml).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Solver(SolverError::Graph(GraphError::NoPressureReference { .. }))
    ));
}

#[test]
fn unconnected_port() {
    let yaml = edit("ports: [house_out, ret]", "ports: [house_out, loose]");
    let err = build_project(&from_yaml_str(&yaml).unwrap()).unwrap_err();
    assert!(matches!(err, ProjectError::Solver(SolverError::Graph(_))));
}
