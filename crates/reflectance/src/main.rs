use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reflectance_core::{archive, config::PipelineConfig, outputs, pipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Spectral reflectance preprocessing pipeline", long_about = None)]
struct Cli {
    /// TOML file overriding the default pipeline configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a measurement archive and process it into an index table
    Process(ProcessArgs),
    /// Process an already-extracted measurement tree
    ProcessDir(ProcessDirArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// ZIP archive of measurement files
    #[arg(long)]
    archive: PathBuf,

    /// Directory the archive is extracted into
    #[arg(long, default_value = "results/data")]
    workdir: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct ProcessDirArgs {
    /// Root of the extracted measurement tree
    #[arg(long)]
    root: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Destination CSV file
    #[arg(long)]
    output: PathBuf,

    /// Optional run-summary JSON file
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Process(args) => {
            archive::extract_archive(&args.archive, &args.workdir)
                .with_context(|| format!("failed to extract {}", args.archive.display()))?;
            run_and_write(&args.workdir, &config, &args.output)
        }
        Command::ProcessDir(args) => run_and_write(&args.root, &config, &args.output),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn run_and_write(root: &Path, config: &PipelineConfig, output: &OutputArgs) -> Result<()> {
    let run = pipeline::run(root, config).context("pipeline failed")?;

    outputs::write_table(&run.table, &output.output)
        .with_context(|| format!("failed to write {}", output.output.display()))?;
    if let Some(summary_path) = &output.summary {
        outputs::write_summary(&run.summary, summary_path)
            .with_context(|| format!("failed to write {}", summary_path.display()))?;
    }

    info!("result delivered to {}", output.output.display());
    Ok(())
}
