use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod host;
mod services;
mod utils;

use config::Config;
use host::Host;
use services::{
    create_store, BoundsStore, EmulatedBadge, EmulatedContextMenu, EmulatedWindows,
    SelectedPreset, TriggerSurface, WindowToggleEngine,
};

#[derive(Parser, Debug)]
#[command(name = "viewport-toggle")]
#[command(about = "Toggles browser windows between device presets and their previous size")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "viewport-toggle.toml")]
    config: String,

    /// Log level, overrides the configuration file
    #[arg(long)]
    log_level: Option<String>,

    /// Read host commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Starting viewport-toggle v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config);

    let store = create_store(&config.storage)?;
    info!("Storage backend: {}", config.storage.backend);

    let windows = Arc::new(EmulatedWindows::with_windows(
        config.emulation.windows.iter().map(|w| w.to_snapshot()),
    ));
    for state in &config.emulation.disallowed_states {
        windows.disallow_state(*state);
    }
    let badge = Arc::new(EmulatedBadge::new());
    let menus = Arc::new(EmulatedContextMenu::new());

    let engine = Arc::new(WindowToggleEngine::new(
        BoundsStore::new(store.clone()),
        SelectedPreset::new(store),
        windows.clone(),
        badge.clone(),
        config.badge.clone(),
    ));
    let surface = Arc::new(TriggerSurface::new(engine.clone(), menus));

    let (events_tx, events_rx) = mpsc::channel(64);
    let surface_handle = tokio::spawn(surface.run(events_rx));

    let host = Host::new(windows, badge, engine, events_tx);
    // The platform fires onStartup for every session.
    host.emit(events::TriggerEvent::Startup).await?;

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.script {
        Some(path) => {
            info!("Reading host commands from {:?}", path);
            let script = std::fs::read(path)?;
            Box::new(BufReader::new(std::io::Cursor::new(script)))
        }
        None => {
            info!("Reading host commands from stdin");
            Box::new(BufReader::new(tokio::io::stdin()))
        }
    };

    tokio::select! {
        result = host.run(reader) => {
            match result {
                Ok(()) => info!("Command stream finished"),
                Err(e) => error!("Command stream failed: {}", e),
            }
        }
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received shutdown signal (Ctrl+C)"),
                Err(err) => error!("Failed to wait for shutdown signal: {}", err),
            }
        }
    }

    info!("Shutting down...");

    // Closing the channel lets the trigger surface drain in-flight events.
    drop(host);

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, surface_handle).await {
        Ok(Ok(())) => info!("All pending events handled"),
        Ok(Err(e)) => error!("Trigger surface task failed: {}", e),
        Err(_) => warn!("Timed out waiting for pending events"),
    }

    info!("viewport-toggle stopped");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "full" {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
