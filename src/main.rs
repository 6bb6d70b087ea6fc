//! `cloudhand` command-line entrypoint: lifecycle operations on the configured instance.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cloudhand::{ComputeConfig, InstanceController};

#[derive(Parser)]
#[command(
    name = "cloudhand",
    version,
    about = "Manage the configured Compute Engine instance"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every instance in the configured project and zone
    List,
    /// Create the configured instance from the latest image of the image family
    Create,
    /// Show the configured instance
    Get {
        /// Instance id, echoed in the output
        id: String,
    },
    /// Start the configured instance and wait for the operation to finish
    Start { id: String },
    /// Stop the configured instance
    Stop { id: String },
    /// Hard-reset the configured instance
    Reset { id: String },
    /// Delete the configured instance
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match ComputeConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    tracing::debug!(
        project = %config.project,
        zone = %config.zone,
        instance = %config.instance_name,
        "Loaded compute configuration"
    );

    let controller = InstanceController::from_config(config)?;

    match cli.command {
        Commands::List => {
            controller.list_all().await?;
        }
        Commands::Create => {
            controller.create().await?;
        }
        Commands::Get { id } => {
            controller.get(&id).await?;
        }
        Commands::Start { id } => {
            let outcome = controller.start(&id).await;
            tracing::debug!(?outcome, "Start finished");
        }
        Commands::Stop { id } => {
            controller.stop(&id).await?;
        }
        Commands::Reset { id } => {
            controller.reset(&id).await?;
        }
        Commands::Delete { id } => {
            controller.delete(&id).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
