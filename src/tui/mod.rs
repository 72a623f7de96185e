// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, redraw ticks, background results)
// - Rendering the UI

pub mod app;
pub mod components;
pub mod modal;
pub mod ui;

use crate::api::{HttpApi, RemoteApi};
use crate::config::Config;
use crate::logging::LogBuffer;
use anyhow::{Context, Result};
use app::{App, AppEvent};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the TUI
///
/// Sets up the terminal, starts status polling, runs the event loop, and
/// restores the terminal when done (also when the loop fails).
pub async fn run_tui(api: Arc<HttpApi>, config: Config, log_buffer: LogBuffer) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let (mut app, mut event_rx) = App::new(api, &config, log_buffer);
    app.start();

    let result = run_event_loop(&mut terminal, &mut app, &mut event_rx).await;
    app.shutdown();

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Waits on four sources and handles whichever is ready first:
/// 1. Keyboard input
/// 2. Redraw ticks (toast expiry)
/// 3. Session/readings updates and control results
/// 4. Explorer request completions
async fn run_event_loop<A: RemoteApi>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<A>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            input = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            } => {
                if let Some(Event::Key(key_event)) = input {
                    app.handle_key(key_event);
                }
            }

            _ = tick_interval.tick() => app.tick(),

            Some(event) = event_rx.recv() => app.handle_event(event),

            Some(completion) = app.navigator.next_completion() => {
                app.on_completion(completion);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
