//! VQLS Command-Line Interface
//!
//! Solves A|x⟩ ∝ |b⟩ variationally on the local statevector simulator.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::Overrides;
use commands::{inspect, run, version};

/// VQLS - variational quantum linear solver
#[derive(Parser)]
#[command(name = "vqls")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize the ansatz parameters for a problem
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Print a JSON report instead of progress output
        #[arg(long)]
        json: bool,
    },

    /// Show the operator, its square and the initial cost
    Inspect {
        /// Problem configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Operator file, one `<coefficient> <pauli>` term per line
        #[arg(short, long)]
        operator_file: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run { overrides, json } => run::execute(&overrides, json).await,
        Commands::Inspect {
            config,
            operator_file,
        } => {
            let overrides = Overrides {
                config,
                operator_file,
                ..Overrides::default()
            };
            inspect::execute(&overrides).await
        }
        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
