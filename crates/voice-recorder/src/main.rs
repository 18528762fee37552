//! Voice Recorder: record, play back and manage voice memos from the terminal.

mod app;
mod app_command;
mod config;
mod error;
mod terminal_adapter;
#[cfg(test)]
mod tests;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    terminal_adapter::TerminalAdapter,
};

use crate::config::Config;

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, mpsc};
use tracing::error;
use tracing_subscriber::EnvFilter;
use voice_recorder_core::{CpalAudioDevice, RecordingStore, SessionController, SessionOptions};

const DEFAULT_LOG_FILTER: &str = "voice_recorder=info,voice_recorder_core=info";

/// Application entry point.
fn main() {
    // Logs go to stderr so prompts and listings on stdout stay readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    let result = rt.block_on(run(config));

    // The stdin forwarder may still be parked in read_line.
    rt.shutdown_timeout(Duration::from_secs(1));

    if let Err(e) = result {
        error!(error = ?e, "App error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> AppResult<()> {
    let (line_tx, line_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let lines = Arc::new(Mutex::new(line_rx));

    let adapter = Arc::new(TerminalAdapter::new(
        Arc::clone(&lines),
        event_tx,
        config.behaviour.confirm_destructive,
    ));

    let store = RecordingStore::new(
        config.storage.recordings_dir.clone(),
        config.storage.staging_dir.clone(),
    );

    let controller = SessionController::new(
        store,
        Arc::new(CpalAudioDevice::new()),
        adapter,
        SessionOptions {
            chunk_frames: config.audio.chunk_frames,
        },
    )?;

    let app = App {
        controller: Arc::new(Mutex::new(controller)),
        lines,
        line_tx,
        events: event_rx,
    };

    app.run().await
}
