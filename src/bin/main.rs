//! lookgen CLI - Generate LookML from dbt project metadata
//!
//! Usage:
//!   lookgen gen [--dbt-dir <dir>] [--output-dir <dir>] [--models a,b] [--schemas x,y]
//!
//! Examples:
//!   lookgen gen -d ./warehouse -o ./lookml
//!   lookgen gen -m orders,customers --keep-going

use clap::{Parser, Subcommand};
use lookgen::config::{NodeErrorPolicy, Settings};
use lookgen::generate::{self, RunOptions};
use lookgen::layout::OutputLayout;
use lookgen::project::DbtProject;
use lookgen::typemap::TypeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "lookgen")]
#[command(about = "Generate LookML views and explores from dbt project metadata")]
#[command(version)]
struct Cli {
    /// Log verbosity (error, warn, info, debug)
    #[arg(long, global = true, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate LookML files from a dbt project
    Gen {
        /// dbt project directory (must contain dbt_project.yml and
        /// compiled target artifacts)
        #[arg(short = 'd', long, default_value = "./")]
        dbt_dir: PathBuf,

        /// Destination for generated LookML files; using your current
        /// LookML repo is encouraged
        #[arg(short, long, default_value = "./lookml")]
        output_dir: PathBuf,

        /// Only build these models, comma separated
        #[arg(short, long)]
        models: Option<String>,

        /// Only build models in these schemas, comma separated
        #[arg(short, long)]
        schemas: Option<String>,

        /// Connection name written to the model file (overrides the
        /// settings file)
        #[arg(long)]
        connection: Option<String>,

        /// Report failed nodes and keep generating instead of aborting
        #[arg(long)]
        keep_going: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.verbosity);

    match cli.command {
        Commands::Gen {
            dbt_dir,
            output_dir,
            models,
            schemas,
            connection,
            keep_going,
        } => cmd_gen(dbt_dir, output_dir, models, schemas, connection, keep_going),
    }
}

fn cmd_gen(
    dbt_dir: PathBuf,
    output_dir: PathBuf,
    models: Option<String>,
    schemas: Option<String>,
    connection: Option<String>,
    keep_going: bool,
) -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error loading settings: {err}");
            return ExitCode::FAILURE;
        }
    };

    let project = match DbtProject::load(&dbt_dir) {
        Ok(project) => project,
        Err(err) => {
            eprintln!("Error loading dbt project from {}: {err}", dbt_dir.display());
            return ExitCode::FAILURE;
        }
    };

    let replacement = match settings.resolved_type_mappings() {
        Ok(path) => path,
        Err(err) => {
            eprintln!("Error resolving type mappings path: {err}");
            return ExitCode::FAILURE;
        }
    };
    let owned;
    let types: &TypeMap = match replacement {
        Some(path) => match TypeMap::from_file(&path) {
            Ok(map) => {
                owned = map;
                &owned
            }
            Err(err) => {
                eprintln!("Error loading type mappings: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => TypeMap::builtin(),
    };

    let layout = OutputLayout::new(&output_dir, settings.view_layout);

    let options = RunOptions {
        models: split_targets(models),
        schemas: split_targets(schemas),
        connection: connection.unwrap_or(settings.connection),
        on_node_error: if keep_going {
            NodeErrorPolicy::Skip
        } else {
            settings.on_node_error
        },
    };

    println!(
        "Using dbt-dir {} and outputting to {}",
        dbt_dir.display(),
        output_dir.display()
    );

    match generate::run(&project, types, &layout, &options) {
        Ok(summary) => {
            println!(
                "Wrote {} view(s) and {} explore(s)",
                summary.views_written, summary.explores_written
            );
            if summary.failed_nodes.is_empty() {
                ExitCode::SUCCESS
            } else {
                for (node, err) in &summary.failed_nodes {
                    eprintln!("Failed {node}: {err}");
                }
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Split a comma-separated filter into lowercased, trimmed entries.
fn split_targets(arg: Option<String>) -> Option<Vec<String>> {
    arg.map(|raw| {
        raw.split(',')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty())
            .collect()
    })
}

fn setup_logging(verbosity: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}
