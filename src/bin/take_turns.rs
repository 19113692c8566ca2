//! take-turns: rotation command-line runner
//!
//! Loads configuration and persisted state, declares the configured
//! rotations, runs one command, and flushes before exiting.
//!
//! `<rotation>` is the rotation id (`story`) or its entity id (`sensor.story`).
//!
//! ## Configuration
//! - TAKE_TURNS_CONFIG: Path to a YAML configuration file (optional)
//! - TAKE_TURNS__STORAGE__PATH: Durable document location
//! - TAKE_TURNS_LOG: Log filter (default: info)

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use take_turns::commands::{resolve_rotation_id, CommandRouter, NextTurnCall, SetPersonCall};
use take_turns::config::Config;
use take_turns::presentation::{NoopObserver, SensorView};
use take_turns::sources::DeclarativeSource;
use take_turns::storage::init_storage;
use take_turns::utils::bootstrap::init_tracing;
use take_turns::RotationRegistry;

#[derive(Debug, Parser)]
#[command(name = "take-turns")]
#[command(about = "Track whose turn it is across rotations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file, layered over config.yaml
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Show every rotation
    List,

    /// Pass the turn to the next person
    Next {
        /// Rotation id or entity id
        rotation: String,
    },

    /// Give the turn to a specific person
    Set {
        /// Rotation id or entity id
        rotation: String,
        /// Member name
        person: String,
    },

    /// Delete a stored pointer whose rotation is no longer configured
    Forget {
        /// Rotation id or entity id
        rotation: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load(cli.config.as_deref())?;
    let store = init_storage(&config.storage).await?;

    let registry = Arc::new(RotationRegistry::new(store, Arc::new(NoopObserver)));
    registry.load_or_init().await?;

    let report = DeclarativeSource::new(config.rotations)
        .apply(&registry)
        .await;
    if !report.is_clean() {
        warn!(failed = report.failed.len(), "Some rotations were not declared");
    }

    let router = CommandRouter::new(Arc::clone(&registry));
    let views: Vec<SensorView> = match cli.command {
        Command::List => registry.list().await.iter().map(SensorView::from).collect(),
        Command::Next { rotation } => {
            let call = NextTurnCall {
                entity_id: Some(rotation),
            };
            vec![SensorView::from(&router.next_turn(call).await?)]
        }
        Command::Set { rotation, person } => {
            let call = SetPersonCall {
                entity_id: Some(rotation),
                person: Some(person),
            };
            vec![SensorView::from(&router.set_person(call).await?)]
        }
        Command::Forget { rotation } => {
            registry.remove(resolve_rotation_id(&rotation)).await?;
            registry.list().await.iter().map(SensorView::from).collect()
        }
    };

    println!("{}", serde_json::to_string_pretty(&views)?);

    registry.dispose().await?;
    info!("take-turns finished");

    Ok(())
}
