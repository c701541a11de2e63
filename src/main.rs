//! mediacontrols - tracks MPRIS players and reports the active one.

use std::{error::Error, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use futures::StreamExt;
use mediacontrols::{
    config::{Config, LogLevel},
    config_store::ConfigStore,
    services::mpris::{MprisService, PlaybackStatus, TracingDisplay},
    tracing_config,
};
use tracing::{Level, info, span, warn};

#[derive(Parser)]
#[command(name = "mediacontrols")]
#[command(about = "Track MPRIS media players and follow the active one")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon until interrupted
    Run {
        /// Log to stdout only
        #[arg(long)]
        no_log_file: bool,
    },
    /// Print the players currently on the bus and the active one
    Players,
    /// Print the JSON schema of the config file
    Schema,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { no_log_file } => run(cli.config, no_log_file).await,
        Commands::Players => list_players(cli.config).await,
        Commands::Schema => {
            let schema = schemars::schema_for!(Config);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn load_store(path: Option<PathBuf>) -> Result<ConfigStore, Box<dyn Error>> {
    let store = match path {
        Some(path) => ConfigStore::load_from(&path)?,
        None => ConfigStore::load()?,
    };
    Ok(store)
}

async fn run(config_path: Option<PathBuf>, no_log_file: bool) -> Result<(), Box<dyn Error>> {
    let store = load_store(config_path)?;
    let config = store.get_current();

    let _guard = if no_log_file {
        tracing_config::init(config.general.log_level)?;
        None
    } else {
        Some(tracing_config::init_with_file(config.general.log_level)?)
    };
    let _span = span!(Level::INFO, "mediacontrols").entered();
    info!("Starting media controls");

    let service = Arc::new(MprisService::start(&config, Arc::new(TracingDisplay)).await?);

    let watcher = match store.start_file_watching() {
        Ok(task) => Some(task),
        Err(e) => {
            warn!("Config hot reload disabled: {e}");
            None
        }
    };

    let mut media_changes = Box::pin(store.subscribe_to_path("media.*"));
    let config_task = {
        let service = Arc::clone(&service);
        let store = store.clone();
        tokio::spawn(async move {
            while media_changes.next().await.is_some() {
                service.update_config(&store.get_current().media).await;
            }
        })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    config_task.abort();
    if let Some(watcher) = watcher {
        watcher.abort();
    }
    service.shutdown();

    Ok(())
}

async fn list_players(config_path: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let mut config = load_store(config_path)?.get_current();
    config.lyrics.enabled = false;
    config.media.hide_media_notification = false;

    tracing_config::init(LogLevel::Warn)?;

    let service = MprisService::start(&config, Arc::new(TracingDisplay)).await?;
    let active = service.active_player().map(|player| player.id().clone());

    let players = service.players();
    if players.is_empty() {
        println!("No players");
    }

    for player in players {
        let marker = if active.as_ref() == Some(player.id()) {
            "*"
        } else {
            " "
        };
        let metadata = player.metadata().unwrap_or_default();
        let status = match player.playback_status() {
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
        };

        println!(
            "{marker} {:<24} {:<8} {} - {}",
            player.display_name(),
            status,
            metadata.artist_line().unwrap_or_default(),
            metadata.title.unwrap_or_default(),
        );
    }

    service.shutdown();
    Ok(())
}
