//! hn-project: YAML project files describing a heat network, its
//! time grid and demand profiles.

pub mod build;
pub mod schema;

pub use build::{BuiltProject, build_project};
pub use schema::*;

use hn_components::ComponentError;
use hn_controls::ControlError;
use hn_graph::GraphError;
use hn_sim::SimError;
use hn_solver::SolverError;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Asset '{id}' has unsupported kind '{kind}'")]
    UnsupportedElement { id: String, kind: String },

    #[error("Duplicate ID: {id}")]
    DuplicateId { id: String },

    #[error("Asset '{id}' references unknown profile '{reference}'")]
    UnknownReference { id: String, reference: String },

    #[error("Asset '{id}' needs {expected} port(s), found {actual}")]
    PortCount {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Asset '{id}' is missing '{what}'")]
    MissingParameter { id: String, what: &'static str },

    #[error("Topology error: {0}")]
    Graph(#[from] GraphError),

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Network error: {0}")]
    Solver(#[from] SolverError),

    #[error("Controller error: {0}")]
    Control(#[from] ControlError),

    #[error("Simulation config error: {0}")]
    Sim(#[from] SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn from_yaml_str(content: &str) -> ProjectResult<ProjectDef> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<ProjectDef> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &std::path::Path, project: &ProjectDef) -> ProjectResult<()> {
    let content = serde_yaml::to_string(project)?;
    std::fs::write(path, content)?;
    Ok(())
}
