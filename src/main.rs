//! Gantry CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gantry::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; --verbose raises the default floor to debug.
    let default_filter = if cli.verbose() { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Deploy(args) => gantry::cli::commands::deploy::execute(args, cli.json).await,
        Commands::Check(args) => gantry::cli::commands::check::execute(args, cli.json).await,
        Commands::Render(args) => gantry::cli::commands::render::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        gantry::cli::handle_error(err, cli.json);
    }
}
