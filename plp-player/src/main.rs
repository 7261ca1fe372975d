//! plp-player - Main entry point
//!
//! Interactive console over a playlist controller driving a simulated audio
//! resource. Notifications are printed to stdout as one JSON object per
//! line; logs go to stderr.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use plp_common::config::ConfigResolver;
use plp_common::{EventBus, PlayerEvent, Track};
use plp_player::audio::{spawn_ticker, SimulatedResource};
use plp_player::console::{self, ConsoleCommand};
use plp_player::{PlayerHandle, PlayerService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Command-line arguments for plp-player
#[derive(Parser, Debug)]
#[command(name = "plp-player")]
#[command(about = "Playlist playback controller with an interactive console")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "PLP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (overrides the config file)
    #[arg(short, long, env = "PLP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Track locations to load at startup
    tracks: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone());
    let config = resolver.load().context("Failed to load configuration")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting plp-player v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match resolver.resolve_path() {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: compiled defaults"),
    }

    let events = EventBus::new(config.events.capacity);
    let resource = SimulatedResource::from_config(&config.simulation);

    let clock_token = CancellationToken::new();
    let ticker = spawn_ticker(
        resource.clone(),
        Duration::from_millis(config.simulation.tick_interval_ms),
        clock_token.clone(),
    );

    let (player, service_task) = PlayerService::spawn(resource, events);
    let printer = tokio::spawn(print_events(player.subscribe()));

    if !args.tracks.is_empty() {
        let tracks: Vec<Track> = args
            .tracks
            .iter()
            .map(|location| Track::from_location(location.as_str()))
            .collect();
        info!("Loading {} tracks from the command line", tracks.len());
        player.load(tracks)?;
    }

    println!("{}", console::HELP);
    run_console(&player).await?;

    info!("Shutting down");
    player.shutdown()?;
    service_task.await.context("Player service task failed")?;

    clock_token.cancel();
    ticker.await.context("Simulated clock task failed")?;
    printer.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Read console lines until quit, end of input or a shutdown signal
async fn run_console(player: &PlayerHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read console input")? else {
                    info!("Console input closed");
                    break;
                };
                if !handle_line(player, &line).await? {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Apply one console line; returns false on quit
async fn handle_line(player: &PlayerHandle, line: &str) -> Result<bool> {
    let command = match console::parse_line(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(true),
        Err(e) => {
            eprintln!("{} (type 'help' for commands)", e);
            return Ok(true);
        }
    };

    match command {
        ConsoleCommand::Player(command) => player.send(command)?,
        ConsoleCommand::Next => player.next()?,
        ConsoleCommand::Previous => player.previous()?,
        ConsoleCommand::List => {
            player.flush().await?;
            let snapshot = player.snapshot();
            for (index, track) in snapshot.tracks.iter().enumerate() {
                let marker = if index == snapshot.selected_index { '>' } else { ' ' };
                println!("{} {:>3}  {}  ({})", marker, index, track.name, track.location);
            }
        }
        ConsoleCommand::Status => {
            player.flush().await?;
            println!("{}", serde_json::to_string(&player.snapshot())?);
        }
        ConsoleCommand::Help => println!("{}", console::HELP),
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}

/// Print every notification as a JSON line
async fn print_events(mut rx: broadcast::Receiver<PlayerEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => println!("{}", json),
                Err(e) => error!("Failed to serialize {} event: {}", event.event_type(), e),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event printer lagged, {} notifications skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
