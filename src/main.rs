pub mod boundary;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod jitter;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod types;

use clap::{Parser, Subcommand};
use pipeline::PipelineConfig;
use std::path::PathBuf;
use types::RunStats;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Anonymize the source coordinates and render the heatmap
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the generated heatmap and run stats
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            println!("Generating heatmap with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let boundary = data::load_boundary(&app_config.input.boundary_file)?;
            let points = data::load_points(&app_config.input)?;
            let total_count = points.len();

            let pipeline_config = PipelineConfig {
                radius_meters: app_config.anonymize.radius_meters,
                margin_meters: app_config.anonymize.margin_meters,
                max_attempts: app_config.anonymize.max_attempts,
                seed: app_config.anonymize.seed,
            };

            let result = pipeline::anonymize(&points, &boundary, &pipeline_config)?;

            let stats = RunStats {
                total_count,
                kept_count: result.kept_count,
                discarded_count: result.discarded_count,
                exhausted_count: result.exhausted_count,
                radius_meters: pipeline_config.radius_meters,
                margin_meters: pipeline_config.margin_meters,
            };
            render::write_stats(&app_config, &stats)?;

            if result.points.is_empty() {
                println!("No points survived anonymization; skipping heatmap render.");
            } else {
                let path = render::write_heatmap(&app_config, &result.points)?;
                println!("Heatmap with {} points saved to {:?}.", result.points.len(), path);
            }

            println!("Generation complete!");
        }
        Commands::Serve { config } => {
            println!("Serving heatmap with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;
            server::start_server(app_config).await?;
        }
    }

    Ok(())
}
