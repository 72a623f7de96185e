// CLI module - command-line argument parsing and handlers
//
// Without a subcommand eldash opens the dashboard (or the headless watcher
// when the TUI is disabled). Subcommands run one request and exit:
// - status / start / stop: session control
// - schedule: arm a default, once or recurring schedule
// - files / analyze: browse and summarise logged data
// - config: show, locate or reset the config file

use crate::api::{AnalysisRange, FileSource, HttpApi, RemoteApi};
use crate::config::{Config, VERSION};
use crate::dashboard::Dashboard;
use crate::explore::newest_first;
use crate::readings::{ReadingsView, NO_DATA};
use crate::schedule::{submit_schedule, ScheduleSelection};
use crate::session::{SessionController, SessionState, Status};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Energy logger dashboard
#[derive(Parser)]
#[command(name = "eldash")]
#[command(version = VERSION)]
#[command(about = "Terminal dashboard for the energy data logger", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print session changes and live readings until Ctrl+C
    Watch,

    /// Show the current session status
    Status,

    /// Start logging now with the default trigger
    Start,

    /// Stop logging and clear all schedules
    Stop,

    /// Arm a logging schedule
    Schedule {
        #[arg(value_enum)]
        kind: ScheduleKind,

        /// Start time (e.g. 2099-01-01T08:00, or 08:00 for recurring)
        #[arg(long)]
        start: Option<String>,

        /// End time
        #[arg(long)]
        end: Option<String>,

        /// Repeat every N days (recurring only, 0 = every day)
        #[arg(long)]
        every: Option<String>,
    },

    /// List data files (or service logs), newest first
    Files {
        #[arg(long)]
        logs: bool,
    },

    /// Print statistics for one data file
    Analyze {
        file: String,

        /// Only consider readings from this time on
        #[arg(long)]
        start: Option<String>,

        /// Only consider readings up to this time
        #[arg(long)]
        end: Option<String>,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScheduleKind {
    Default,
    Once,
    Recurring,
}

impl ScheduleKind {
    fn selection(
        self,
        start: Option<String>,
        end: Option<String>,
        every: Option<String>,
    ) -> ScheduleSelection {
        let (mode, schedule_type) = match self {
            Self::Default => ("default", None),
            Self::Once => ("scheduled", Some("once")),
            Self::Recurring => ("scheduled", Some("recurring")),
        };
        ScheduleSelection {
            mode: mode.to_string(),
            schedule_type: schedule_type.map(str::to_string),
            start_time: start.unwrap_or_default(),
            end_time: end.unwrap_or_default(),
            day_interval: every.unwrap_or_default(),
        }
    }
}

/// Handle `config` before anything else is set up. Returns true if handled.
pub fn handle_config_command(cli: &Cli) -> bool {
    let Some(Commands::Config { show, reset, path }) = &cli.command else {
        return false;
    };

    if *path {
        handle_config_path();
    } else if *show {
        handle_config_show();
    } else if *reset {
        handle_config_reset();
    } else {
        println!("Usage: eldash config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
    true
}

/// Run a one-shot or headless command against the service
pub async fn run_command(command: Commands, api: Arc<HttpApi>, config: &Config) -> Result<()> {
    let controller = SessionController::new(api.clone(), config.polling.status_interval());

    match command {
        Commands::Watch => watch(api, config).await,
        Commands::Status => {
            let state = controller.poll().await;
            if state.status == Status::Unknown {
                bail!("Could not reach the logger at {}", config.base_url);
            }
            print_state(&state);
            Ok(())
        }
        Commands::Start => {
            let state = controller.start_default().await?;
            println!("Logging started");
            print_state(&state);
            Ok(())
        }
        Commands::Stop => {
            let state = controller.stop_and_clear().await?;
            println!("Logging stopped, schedules cleared");
            print_state(&state);
            Ok(())
        }
        Commands::Schedule {
            kind,
            start,
            end,
            every,
        } => {
            let selection = kind.selection(start, end, every);
            let outcome = submit_schedule(&controller, &selection).await?;
            println!("Schedule accepted ({:?})", outcome.request.mode);
            print_state(&outcome.state);
            Ok(())
        }
        Commands::Files { logs } => {
            let source = if logs {
                FileSource::Logs
            } else {
                FileSource::Data
            };
            let names = api.list_files(source).await?;
            if names.is_empty() {
                println!("No files found");
            }
            for file in newest_first(&names) {
                println!("{:<40} {}", file.name, file.created_label());
            }
            Ok(())
        }
        Commands::Analyze { file, start, end } => {
            let range = AnalysisRange {
                start_time: start.filter(|s| !s.trim().is_empty()),
                end_time: end.filter(|s| !s.trim().is_empty()),
            };
            let analysis = api.analyze(&file, &range).await?;
            println!("{}", analysis.analysis_text);
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

/// Headless mode: print session changes and readings until Ctrl+C
pub async fn watch(api: Arc<HttpApi>, config: &Config) -> Result<()> {
    let dashboard = Dashboard::new(api, &config.polling);

    let last = Mutex::new(None::<SessionState>);
    dashboard.on_session(move |state| {
        let mut last = last.lock().expect("watch state lock poisoned");
        if last.as_ref() != Some(state) {
            print_state(state);
            *last = Some(state.clone());
        }
    });
    dashboard.on_readings(|view| match view {
        ReadingsView::NoData => println!("{}", NO_DATA),
        ReadingsView::Table(rows) => {
            for row in rows {
                println!("  {:<32} {:>14}", row.name, row.value);
            }
            println!();
        }
    });

    println!("Watching {} (Ctrl+C to stop)", config.base_url);
    dashboard.start();
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    dashboard.stop();
    Ok(())
}

fn print_state(state: &SessionState) {
    println!("Status:       {}", state.status.label());
    println!("Mode:         {}", state.mode);
    if let Some(ts) = state.last_updated {
        println!("Last update:  {}", ts.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(file) = &state.active_file {
        println!("Active file:  {}", file);
    }
    if let Some(next) = &state.next_event {
        println!(
            "Next event:   {:?} at {}",
            next.kind,
            next.at.format("%Y-%m-%d %H:%M")
        );
    }
    if state.is_unconfigured() {
        println!("(no schedule configured)");
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err()
            || !input.trim().eq_ignore_ascii_case("y")
        {
            println!("Aborted.");
            return;
        }
    }

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = std::fs::write(&path, Config::default().to_toml()) {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}
