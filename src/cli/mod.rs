//! Command-line interface: argument parsing, command dispatch, and
//! terminal output.

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

// Re-export commonly used items
pub use output::progress::{create_spinner, ProgressBarExt};

#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(about = "Gantry - Python web app deployer for a single host", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a Python web application to this host
    Deploy(commands::deploy::DeployArgs),

    /// Check that the host tools a deploy needs are installed
    Check(commands::check::CheckArgs),

    /// Render deployment artifacts to stdout without touching the host
    Render(commands::render::RenderArgs),
}

impl Cli {
    /// Whether the invoked command asked for verbose output.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Deploy(args) => args.verbose,
            Commands::Check(_) | Commands::Render(_) => false,
        }
    }
}

/// Print a terminal error in the requested format and exit non-zero.
pub fn handle_error(error: anyhow::Error, json_mode: bool) {
    if json_mode {
        let payload = serde_json::json!({
            "success": false,
            "error": error.to_string(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("Error: {error:#}");
    }
    std::process::exit(1);
}
