use agri_stakeholder_map::{config, pipeline};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the stakeholder map page
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Load and clean the inputs, report what would be rendered, write nothing
    Check {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agri_stakeholder_map=info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            tracing::info!("Generating map with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;
            let report = pipeline::run(&app_config).await?;
            report.log_summary();
        }
        Commands::Check { config } => {
            tracing::info!("Checking inputs with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;
            let report = pipeline::check(&app_config)?;
            report.log_summary();
        }
    }

    Ok(())
}
