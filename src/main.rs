//! cellfit CLI: fit cell shapes to one z-stack, a directory of z-stacks, or
//! just render the starting cells for inspection.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use cellfit::io::{list_stack_dirs, load_sphere_cells, load_stack_dir, save_frame_outputs};
use cellfit::{fit_frames, CellRecordSet, Frame, Optimizer, RunConfig, SphereCell};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "cellfit")]
#[command(about = "Fit 3D cell shapes to microscope z-stacks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the cells to one z-stack and write the outputs.
    Fit {
        /// Directory holding one image per z-slice.
        #[arg(long)]
        stack: PathBuf,

        /// Initial cells (JSON).
        #[arg(long)]
        cells: PathBuf,

        /// Run configuration (JSON); defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output root; results go to OUT/NAME/.
        #[arg(long)]
        out: PathBuf,

        /// Output name; defaults to the stack directory name.
        #[arg(long)]
        name: Option<String>,

        /// Overrides the configured seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Overrides the configured iterations per cell.
        #[arg(long)]
        iterations_per_cell: Option<usize>,
    },
    /// Fit every stack directory under a root in parallel.
    Batch {
        #[arg(long)]
        stacks_root: PathBuf,

        #[arg(long)]
        cells: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        out: PathBuf,
    },
    /// Render the initial cells without fitting.
    Preview {
        #[arg(long)]
        stack: PathBuf,

        #[arg(long)]
        cells: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fit { stack, cells, config, out, name, seed, iterations_per_cell } => {
            let mut run = load_run_config(config.as_deref())?;
            if let Some(seed) = seed {
                run.optimizer.seed = seed;
            }
            if let Some(n) = iterations_per_cell {
                run.optimizer.iterations_per_cell = n;
            }
            let name = name.unwrap_or_else(|| dir_name(&stack));
            run_fit(&stack, &cells, &run, &out, &name)
        }
        Commands::Batch { stacks_root, cells, config, out } => {
            let run = load_run_config(config.as_deref())?;
            run_batch(&stacks_root, &cells, &run, &out)
        }
        Commands::Preview { stack, cells, config, out } => {
            let run = load_run_config(config.as_deref())?;
            run_preview(&stack, &cells, &run, &out)
        }
    }
}

fn load_run_config(path: Option<&Path>) -> CliResult<RunConfig> {
    match path {
        Some(p) => {
            tracing::info!("Loading config: {}", p.display());
            Ok(RunConfig::load_json(p)?)
        }
        None => Ok(RunConfig::default()),
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stack".to_string())
}

fn build_frame(
    stack_dir: &Path,
    cells: Vec<SphereCell>,
    run: &RunConfig,
    out: &Path,
    name: &str,
) -> CliResult<Frame<SphereCell>> {
    tracing::info!("Loading stack: {}", stack_dir.display());
    let real = load_stack_dir(stack_dir)?;
    tracing::info!("Stack shape: {}", real.shape());
    let frame = Frame::new(&real, run.simulation.clone(), cells, out, name)?
        .with_gradient_settings(run.gradient)?;
    Ok(frame)
}

fn run_fit(stack: &Path, cells_path: &Path, run: &RunConfig, out: &Path, name: &str) -> CliResult<()> {
    let cells = load_sphere_cells(cells_path)?;
    let mut frame = build_frame(stack, cells, run, out, name)?;

    let stats = Optimizer::new(run.optimizer.clone())?.run(&mut frame)?;
    let dir = save_frame_outputs(&frame)?;
    std::fs::write(dir.join("stats.json"), serde_json::to_string_pretty(&stats)?)?;

    tracing::info!(
        "Cost {:.4} -> {:.4}; results written to {}",
        stats.initial_cost.unwrap_or_default(),
        frame.cost(),
        dir.display()
    );
    Ok(())
}

fn run_batch(stacks_root: &Path, cells_path: &Path, run: &RunConfig, out: &Path) -> CliResult<()> {
    let cells = load_sphere_cells(cells_path)?;
    let stack_dirs = list_stack_dirs(stacks_root)?;
    if stack_dirs.is_empty() {
        return Err(format!("no stack directories under {}", stacks_root.display()).into());
    }

    let mut frames = stack_dirs
        .iter()
        .map(|dir| build_frame(dir, cells.clone(), run, out, &dir_name(dir)))
        .collect::<CliResult<Vec<_>>>()?;

    let report = fit_frames(&mut frames, &run.optimizer)?;

    let mut all_records = CellRecordSet::default();
    for frame in &frames {
        save_frame_outputs(frame)?;
        all_records.extend(frame.cells_as_records());
    }
    std::fs::create_dir_all(out)?;
    std::fs::write(out.join("cells.csv"), all_records.to_csv())?;
    std::fs::write(out.join("report.json"), serde_json::to_string_pretty(&report)?)?;

    tracing::info!(
        "Fitted {} stacks, total cost {:.4} -> {:.4}",
        report.frames.len(),
        report.total_initial_cost(),
        report.total_final_cost()
    );
    Ok(())
}

fn run_preview(stack: &Path, cells_path: &Path, run: &RunConfig, out: &Path) -> CliResult<()> {
    let cells = load_sphere_cells(cells_path)?;
    let frame = build_frame(stack, cells, run, out, &dir_name(stack))?;
    let dir = save_frame_outputs(&frame)?;
    tracing::info!("Initial cost {:.4}; preview written to {}", frame.cost(), dir.display());
    Ok(())
}
