#![warn(clippy::all)]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

mod commands;

/// Analyzes and rewrites container image references inside Helm charts.
#[derive(Parser)]
#[command(name = "irr", about, version)]
struct App {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reports every detected image pattern without generating an overlay.
    Inspect(commands::inspect::InspectArgs),
    /// Generates the override values file that redirects detected images.
    Override(commands::override_cmd::OverrideArgs),
    /// Renders the chart with a generated overlay through `helm template`.
    Validate(commands::validate_cmd::ValidateArgs),
}

fn main() -> ExitCode {
    let app = App::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(app.verbose.tracing_level_filter().into()))
        .init();

    let result = match app.command {
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Override(args) => commands::override_cmd::run(args),
        Commands::Validate(args) => commands::validate_cmd::run(args),
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(err.exit_code().clamp(0, 255) as u8)
        }
    }
}
