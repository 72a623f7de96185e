// eldash - Terminal dashboard for the energy data logger
//
// Talks to the logger's HTTP service and keeps a local view of it in sync.
//
// Architecture:
// - Session controller: polls status on a fixed interval, notifies observers
// - Readings supervisor: a faster poll loop that runs only while logging
// - Schedule validator: turns form input into a schedule request
// - Explorer: a stack of request-driven views over logged files
// - TUI (ratatui) or headless watcher on top

mod api;
mod cli;
mod config;
mod dashboard;
mod error;
mod explore;
mod logging;
mod poll_loop;
mod readings;
mod schedule;
mod session;
mod tui;

use anyhow::Result;
use api::HttpApi;
use clap::Parser;
use cli::Cli;
use config::Config;
use logging::LogBuffer;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // config --show/--reset/--path need nothing else
    if cli::handle_config_command(&cli) {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = Config::from_env();

    // The TUI only runs for the bare command; subcommands log to stderr
    let use_tui = config.enable_tui && cli.command.is_none();

    let log_buffer = LogBuffer::new();
    let _file_guard = logging::init_tracing(&config.logging, use_tui, &log_buffer);

    let api = Arc::new(HttpApi::new(&config.base_url, config.request_timeout())?);
    tracing::debug!("Using logger service at {}", api.base_url());

    match cli.command {
        None if use_tui => {
            tracing::info!("Starting TUI");
            tui::run_tui(api, config, log_buffer).await
        }
        None => {
            tracing::info!("TUI disabled, running in headless mode");
            cli::watch(api, &config).await
        }
        Some(command) => cli::run_command(command, api, &config).await,
    }
}
