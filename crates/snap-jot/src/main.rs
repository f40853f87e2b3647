//! Snap-Jot: record the default microphone as an ordered list of chunks.

mod app;
mod app_command;
mod cli;
mod config;
mod console_handler;
mod console_navigator;
mod error;
mod recording_store;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    cli::Cli,
    console_handler::ConsoleHandler,
    console_navigator::ConsoleNavigator,
    error::{AppError, Result as AppResult},
    recording_store::MemoryRecordingStore,
};

use crate::config::Config;

use std::time::Duration;

use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::error;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SNAP_JOT_LOG";
const DEFAULT_LOG_FILTER: &str = "snap_jot=info,snap_jot_core=info";

/// Application entry point.
fn main() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };
    config.apply_overrides(&cli);

    if let Err(e) = config.session_config() {
        error!("Invalid configuration: {:?}", e);
        std::process::exit(1);
    }

    if cli.save_config {
        let saved = match &cli.config {
            Some(path) => config.save_to(path),
            None => config.save(),
        };
        if let Err(e) = saved {
            error!("Failed to save config: {:?}", e);
            std::process::exit(1);
        }
    }

    // cpal streams are not Send on every platform, so the recorder stays on
    // a single-threaded runtime.
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let result = rt.block_on(async {
        let store = MemoryRecordingStore::new();
        let app = App {
            config,
            navigator: ConsoleNavigator::new(store.clone()),
            store,
            recorder: None,
            command_rx,
            shutdown_tx,
        };
        let console = ConsoleHandler::new(command_tx);

        let (console_result, app_result) = tokio::join!(console.run(shutdown_rx), app.run());
        if let Err(e) = console_result {
            error!(error = ?e, "Console handler error");
        }
        app_result
    });

    // The stdin reader may still be parked in a blocking read.
    rt.shutdown_timeout(Duration::from_millis(100));

    if let Err(e) = result {
        error!(error = ?e, "App error");
        std::process::exit(1);
    }
}
