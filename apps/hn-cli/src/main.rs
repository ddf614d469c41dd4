use clap::{Parser, Subcommand};
use hn_components::Quantity;
use hn_project::{BuiltProject, ProjectError, build_project, load_yaml};
use hn_sim::{SimError, SimProgress, Simulation};
use hn_solver::SolverConfig;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hn-cli")]
#[command(about = "HeatNet CLI - district heating network simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax, topology and profiles
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Run the time-stepped simulation
    Run {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Write all recorded outputs to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Inner iteration cap per solve
        #[arg(long, default_value_t = 100)]
        max_iterations: usize,
        /// Collect element equations on the rayon thread pool
        #[arg(long)]
        parallel: bool,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run {
            project_path,
            output,
            max_iterations,
            parallel,
        } => cmd_run(&project_path, output.as_deref(), max_iterations, parallel),
    }
}

fn load(project_path: &Path) -> CliResult<BuiltProject> {
    let project = load_yaml(project_path)?;
    Ok(build_project(&project)?)
}

fn cmd_validate(project_path: &Path) -> CliResult<()> {
    println!("Validating project: {}", project_path.display());
    let built = load(project_path)?;
    println!("✓ Project is valid");
    println!("  Elements:  {}", built.elements.len());
    println!("  Junctions: {}", built.network.nodes().count());
    println!("  Timesteps: {}", built.config.number_of_time_steps());
    Ok(())
}

fn cmd_run(
    project_path: &Path,
    output: Option<&Path>,
    max_iterations: usize,
    parallel: bool,
) -> CliResult<()> {
    let built = load(project_path)?;
    println!("Running simulation: {}", built.name);

    let solver_config = SolverConfig {
        max_iterations,
        parallel_assembly: parallel,
        ..SolverConfig::default()
    };
    let started = Instant::now();
    let mut sim = Simulation::new(built.config, built.network, built.controller)?
        .with_solver_config(solver_config);
    let mut stdout = io::stdout();
    let mut progress_error = None;
    let result = sim.run_with(
        |p| {
            if progress_error.is_none() {
                progress_error = render_progress(&mut stdout, p).err();
            }
        },
        None,
    )?;
    if let Some(e) = progress_error {
        return Err(e.into());
    }
    clear_progress_line(&mut stdout)?;
    let elapsed = started.elapsed().as_secs_f64();

    let unconverged = result.steps.iter().filter(|s| !s.converged).count();
    let inner: usize = result.steps.iter().map(|s| s.inner_iterations).sum();
    println!("✓ Simulation completed in {:.3}s", elapsed);
    println!("  Timesteps:        {}", result.steps.len());
    println!("  Unconverged:      {}", unconverged);
    println!("  Inner iterations: {}", inner);

    let dt_h = sim.config().timestep_s / 3600.0;
    println!("\nHeat supplied (kWh):");
    for (key, values) in result.table.columns() {
        if key.quantity != Quantity::HeatSupplied {
            continue;
        }
        let energy_kwh: f64 = values.iter().filter(|v| v.is_finite()).sum::<f64>() * dt_h / 1e3;
        println!("  {:<24} {:>12.1}", result.table.column_label(key), energy_kwh);
    }

    let shortfall: f64 = sim.controller().balances().iter().map(|b| b.shortfall).sum();
    if shortfall > 0.0 {
        println!("\nUnserved dispatch: {:.1} kWh", shortfall * dt_h / 1e3);
    }

    if let Some(path) = output {
        let mut file = BufWriter::new(File::create(path)?);
        result.table.write_csv(&mut file)?;
        file.flush()?;
        println!("\nResults written to {}", path.display());
    }
    Ok(())
}

fn clear_progress_line(out: &mut impl Write) -> io::Result<()> {
    write!(out, "\r{}\r", " ".repeat(80))?;
    out.flush()
}

fn render_progress(out: &mut impl Write, progress: &SimProgress) -> io::Result<()> {
    let width = 28usize;
    let filled = ((progress.fraction_complete * width as f64).round() as usize).min(width);
    write!(
        out,
        "\r[{}{}] {}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        progress.message
    )?;
    out.flush()
}
