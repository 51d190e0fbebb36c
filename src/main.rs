//! County Atlas
//!
//! CLI commands:
//! - gui: Launch the interactive choropleth viewer
//! - list: List attributes and dataset sizes
//! - breaks: Print the natural-breaks classification for one attribute
//! - check: Report join misses between tabular and spatial keys

mod classify;
mod config;
mod coordinator;
mod geometry;
mod gui;
mod join;
mod load;
mod logging;
mod projection;
mod scene;
mod state;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::classify::{ckmeans, ColorScale};
use crate::config::{Config, DataPaths, ProjectionConfig, Rgb};

#[derive(Parser)]
#[command(name = "county_atlas")]
#[command(about = "Interactive choropleth maps of county-level statistics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to atlas.yaml config
    #[arg(short, long, default_value = "atlas.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the native viewer
    Gui,

    /// List attributes and dataset sizes
    List,

    /// Print the natural-breaks classification for an attribute
    Breaks {
        /// Attribute name (must be in the configured attribute set)
        attribute: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Report tabular/spatial join misses in both directions
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging("logs");
    tracing::info!("County Atlas starting up");

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        tracing::info!("Loading config from {:?}", cli.config);
        Config::load(&cli.config)?
    } else {
        tracing::warn!("Config file not found: {:?}, using defaults", cli.config);
        default_config()
    };
    tracing::info!(
        "Config loaded: {} attributes, {} palette colors, {} classes",
        config.attributes.len(),
        config.palette.len(),
        config.classes
    );

    match cli.command {
        Commands::Gui => {
            let data = load::load_all(&config).await?;
            let coordinator = coordinator::Coordinator::new(data, &config);
            gui::run_viewer(coordinator)?;
        }

        Commands::List => {
            let data = load::load_all(&config).await?;
            println!("Attributes ({}):", config.attributes.len());
            for attribute in &config.attributes {
                println!("  - {}", attribute);
            }
            println!();
            println!("Tabular records: {}", data.records.len());
            println!("Regions:         {}", data.regions.len());
            println!("Boundary layers: {}", data.boundary.len());
        }

        Commands::Breaks { attribute, json } => {
            if !config.attributes.contains(&attribute) {
                anyhow::bail!("'{}' is not in the configured attribute set", attribute);
            }
            let data = load::load_all(&config).await?;
            let scale = ColorScale::build(
                &data.records,
                &attribute,
                &config.palette,
                config.no_data,
                config.classes,
            );
            let values: Vec<f64> = data.records.iter().map(|r| r.value(&attribute)).collect();
            let clusters = ckmeans(&values, config.classes);

            if json {
                let out = serde_json::json!({
                    "attribute": attribute,
                    "classes": clusters.len(),
                    "breaks": scale.breaks(),
                    "clusters": clusters.iter().map(|c| serde_json::json!({
                        "min": c.first(),
                        "max": c.last(),
                        "count": c.len(),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{} ({} classes)", attribute, clusters.len());
                for (i, cluster) in clusters.iter().enumerate() {
                    println!(
                        "  class {}: {} values in [{} .. {}]",
                        i,
                        cluster.len(),
                        cluster[0],
                        cluster[cluster.len() - 1]
                    );
                }
                println!("  breakpoints: {:?}", scale.breaks());
            }
        }

        Commands::Check => {
            let data = load::load_all(&config).await?;
            let report = join::join_report(&data.regions, &data.records);
            if report.unmatched_records.is_empty() && report.unmatched_regions.is_empty() {
                println!("All keys match.");
            } else {
                for label in &report.unmatched_records {
                    println!("record without region: {}", label);
                }
                for label in &report.unmatched_regions {
                    println!("region without record: {}", label);
                }
            }
        }
    }

    Ok(())
}

/// Default config when no file exists: the Colorado unemployment dataset.
pub fn default_config() -> Config {
    Config {
        data: DataPaths {
            tabular: PathBuf::from("data/unemployment_2016.csv"),
            regions: PathBuf::from("data/colorado_counties.geojson"),
            boundary: PathBuf::from("data/us_states.geojson"),
        },
        attributes: vec![
            "Civilian Labor Force".to_string(),
            "Employment".to_string(),
            "Unemployment".to_string(),
            "Unemployment Rate(percent)".to_string(),
            "College Graduate(percent)".to_string(),
        ],
        palette: vec![
            Rgb(0x91, 0xC4, 0xD9),
            Rgb(0x4B, 0x8C, 0xA6),
            Rgb(0x24, 0x5C, 0x73),
            Rgb(0x0A, 0x31, 0x40),
            Rgb(0x02, 0x18, 0x26),
        ],
        no_data: Rgb(0xCC, 0xCC, 0xCC),
        classes: 5,
        projection: ProjectionConfig {
            center: [-105.6, 38.8],
            parallels: [-34.0, 35.0],
        },
    }
}
