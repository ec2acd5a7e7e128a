//! maglev CLI: analysis report, CSV export, plots and animation of the
//! linearized magnetic-levitation ball.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod export;
mod plot;
mod render;

use config::RunConfig;

#[derive(Parser)]
#[command(name = "maglev")]
#[command(version, about = "Linearized maglev ball: equilibrium, stability and step response")]
struct Cli {
    /// Run configuration (YAML). Reference constants when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Step-response horizon in seconds.
    #[arg(long, global = true)]
    horizon: Option<f64>,

    /// Number of step-response samples.
    #[arg(long, global = true)]
    samples: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the model, its eigenvalues and stability.
    Report,

    /// Write the step response to CSV.
    Export {
        #[arg(short, long, default_value = "step_response.csv")]
        output: PathBuf,
    },

    /// Plot the step response to PNG.
    Plot {
        #[arg(short, long, default_value = "step_response.png")]
        output: PathBuf,
    },

    /// Render the rig animation to GIF.
    Animate {
        #[arg(short, long, default_value = "maglev.gif")]
        output: PathBuf,

        /// Seconds between frames of the demo motion.
        #[arg(long)]
        frame_interval: Option<f64>,

        /// Animate the linear step response instead of the demo motion.
        #[arg(long)]
        from_response: bool,
    },
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let config = config.with_overrides(cli.horizon, cli.samples)?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command.unwrap_or(Commands::Report) {
        Commands::Report => commands::report(&config),
        Commands::Export { output } => commands::export_csv(&config, &output),
        Commands::Plot { output } => commands::plot(&config, &output),
        Commands::Animate { output, frame_interval, from_response } => {
            commands::animate(&config, &output, frame_interval, from_response)
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
