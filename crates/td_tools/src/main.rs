//! Tower Defense - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use td_core::map::{GameMap, MapConfig};
use td_core::waves::WaveGenerator;
use td_tools::loader::{load_catalogue, load_map, load_policy, save_map};
use td_tools::render::{format_previews, preview_waves, render_map};
use td_tools::validate::validate_configs;
use td_tools::ToolResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "td-tools")]
#[command(about = "Development tools for the tower defense core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate wave and enemy type configuration
    Validate {
        /// Wave policy JSON file
        #[arg(long, default_value = "assets/data/waves.json")]
        waves: PathBuf,
        /// Enemy catalogue JSON file
        #[arg(long, default_value = "assets/data/enemies.json")]
        types: PathBuf,
    },
    /// Generate a map and print it
    GenMap {
        /// Width in cells
        #[arg(long, default_value_t = 20)]
        width: u32,
        /// Height in cells
        #[arg(long, default_value_t = 20)]
        height: u32,
        /// Generation seed
        #[arg(long, default_value_t = 12345)]
        seed: u64,
        /// Save the map as RON
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a saved map
    ShowMap {
        /// RON map file
        path: PathBuf,
    },
    /// Compose the first waves and print their contents
    PreviewWaves {
        /// Wave policy JSON file
        #[arg(long, default_value = "assets/data/waves.json")]
        waves: PathBuf,
        /// Enemy catalogue JSON file
        #[arg(long, default_value = "assets/data/enemies.json")]
        types: PathBuf,
        /// Number of waves
        #[arg(long, default_value_t = 10)]
        count: u32,
        /// Composition seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn run(command: Commands) -> ToolResult<()> {
    match command {
        Commands::Validate { waves, types } => {
            tracing::info!("Validating {} and {}", waves.display(), types.display());
            let summary = validate_configs(&waves, &types)?;
            tracing::info!(
                enemy_types = summary.enemy_types,
                first_wave_budget = summary.first_wave_budget,
                first_wave_cadence = summary.first_wave_cadence,
                "Validation passed"
            );
        }
        Commands::GenMap {
            width,
            height,
            seed,
            out,
        } => {
            let config = MapConfig::default().with_size(width, height).with_seed(seed);
            let map = GameMap::from_config(&config)?;
            print!("{}", render_map(&map));
            if let Some(path) = out {
                save_map(&map, &path)?;
            }
        }
        Commands::ShowMap { path } => {
            let map = load_map(&path)?;
            print!("{}", render_map(&map));
        }
        Commands::PreviewWaves {
            waves,
            types,
            count,
            seed,
        } => {
            let catalogue = load_catalogue(&types)?;
            let policy = load_policy(&waves, &catalogue)?;
            let previews = preview_waves(&WaveGenerator::new(policy, catalogue), count, seed)?;
            print!("{}", format_previews(&previews));
        }
    }
    Ok(())
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
