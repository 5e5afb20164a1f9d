//! shopclust CLI
//!
//! Cluster browsing sessions and report on the groups.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use shopclust::{
    data::{read_csv_path, write_csv, Schema},
    pipeline::{join_assignments, Pipeline, PipelineOutput},
    Config, Report, Table,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "shopclust")]
#[command(version)]
#[command(about = "Gower + complete-linkage clustering of e-commerce sessions", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Sessions CSV with a header row
    csv: PathBuf,

    /// JSON config file (defaults apply to missing fields)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Group counts to cut the tree into, e.g. 3,4
    #[arg(long, value_delimiter = ',')]
    cuts: Option<Vec<usize>>,

    /// Infer column types instead of requiring the shoppers schema
    #[arg(long)]
    infer_schema: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full text report
    Report {
        #[command(flatten)]
        run: RunArgs,

        /// Also write report.txt, clustered.csv and linkage.json here
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Write the raw table with one group column per cut
    Cluster {
        #[command(flatten)]
        run: RunArgs,

        /// Output CSV
        #[arg(long, short)]
        output: PathBuf,

        /// Also write the linkage tree as JSON
        #[arg(long)]
        linkage: Option<PathBuf>,
    },

    /// Print the expected input schema
    Schema,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report.
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Report { run, output_dir } => cmd_report(&run, output_dir.as_deref()),
        Commands::Cluster {
            run,
            output,
            linkage,
        } => cmd_cluster(&run, &output, linkage.as_deref()),
        Commands::Schema => cmd_schema(),
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(run: &RunArgs) -> Result<Config> {
    let mut config = match &run.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            Config::load(path).with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(cuts) = &run.cuts {
        config = config.with_cuts(cuts.clone());
    }
    config.check().context("invalid configuration")?;
    Ok(config)
}

fn execute(run: &RunArgs) -> Result<(Config, Table, PipelineOutput)> {
    let config = load_config(run)?;
    let schema = if run.infer_schema {
        Schema::infer()
    } else {
        Schema::shoppers()
    };
    let table = read_csv_path(&run.csv, &schema)
        .with_context(|| format!("failed to read {}", run.csv.display()))?;
    let output = Pipeline::from_config(&config)
        .run(&table, None)
        .context("clustering failed")?;
    Ok((config, table, output))
}

fn cmd_report(run: &RunArgs, output_dir: Option<&Path>) -> Result<()> {
    let (config, table, output) = execute(run)?;
    let text = Report::new(&config, &table, &output).render()?;
    print!("{text}");

    if let Some(dir) = output_dir {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        fs::write(dir.join("report.txt"), &text).context("failed to write report.txt")?;
        write_joined(&table, &output, &dir.join("clustered.csv"))?;
        write_linkage(&output, &dir.join("linkage.json"))?;
        info!(dir = %dir.display(), "wrote report artifacts");
    }
    Ok(())
}

fn cmd_cluster(run: &RunArgs, output_path: &Path, linkage: Option<&Path>) -> Result<()> {
    let (_, table, output) = execute(run)?;
    write_joined(&table, &output, output_path)?;
    if let Some(path) = linkage {
        write_linkage(&output, path)?;
    }
    Ok(())
}

fn cmd_schema() -> Result<()> {
    for field in Schema::shoppers().fields() {
        println!("{:<24} {}", field.name, field.kind);
    }
    Ok(())
}

fn write_joined(table: &Table, output: &PipelineOutput, path: &Path) -> Result<()> {
    let joined = join_assignments(table, output)?;
    let file = fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(&joined, io::BufWriter::new(file))?;
    info!(path = %path.display(), rows = joined.n_rows(), "wrote clustered table");
    Ok(())
}

fn write_linkage(output: &PipelineOutput, path: &Path) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(io::BufWriter::new(file), &output.tree)?;
    info!(path = %path.display(), merges = output.tree.n_merges(), "wrote linkage tree");
    Ok(())
}
