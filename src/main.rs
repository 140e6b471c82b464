// SPDX-License-Identifier: GPL-3.0-only

//! kimpanel service
//!
//! Runs the panel on the session bus with headless presentation: everything
//! the panel would show is logged. Send SIGHUP to reload the configuration.

use clap::Parser;
use futures::channel::mpsc;
use futures::StreamExt;
use kimpanel::app_settings::EVENT_CHANNEL_CAPACITY;
use kimpanel::config::PanelConfig;
use kimpanel::dbus::{DbusNameWatcher, DbusServer, DbusSink};
use kimpanel::presentation::headless;
use kimpanel::Kimpanel;
use std::path::{Path, PathBuf};
use tokio::signal::unix::{signal, SignalKind};

#[derive(Debug, Parser)]
#[command(name = "kimpanel", version, about = "Input method panel for the kimpanel protocol")]
struct Cli {
    /// Configuration file [default: $XDG_CONFIG_HOME/kimpanel/config.json]
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Behave as if an on-screen keyboard is showing, collecting all
    /// candidates as flat suggestions.
    #[arg(long)]
    keyboard: bool,
}

fn load_config(path: Option<&Path>) -> PanelConfig {
    let Some(path) = path else {
        tracing::warn!("No config directory, using defaults");
        return PanelConfig::default();
    };

    match PanelConfig::load(path) {
        Ok(config) => {
            tracing::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            tracing::warn!("{}; using defaults", e);
            PanelConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "kimpanel=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().or_else(PanelConfig::default_path);
    let config = load_config(config_path.as_deref());

    let (events_tx, mut events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let server = DbusServer::start(events_tx.clone()).await?;
    let connection = server.connection().clone();

    let mut panel = Kimpanel::new(
        config,
        headless::presentation(cli.keyboard),
        Box::new(DbusSink::spawn(connection.clone())),
        Box::new(DbusNameWatcher::new(connection, events_tx)),
    );
    tracing::info!("Panel running (keyboard mode: {})", cli.keyboard);

    let mut hangup = signal(SignalKind::hangup())?;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => panel.handle_event(event),
                None => break,
            },
            Some(()) = hangup.recv() => {
                tracing::info!("Reloading configuration");
                panel.apply_config(load_config(config_path.as_deref()));
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for shutdown: {}", e);
                }
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    panel.destroy();
    drop(server);
    Ok(())
}
