mod app;
mod config;
mod observer;
mod simulation;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{Context, Result};
use app::{AntFarmApp, parse_control};
use clap::Parser;
use config::{AppConfig, SimulationConfig};
use observer::ObserverKind;
use simulation::Control;
use tracing::{debug, info};

/// Command-line arguments for AntFarm.
#[derive(Parser)]
#[command(name = "AntFarm", version, about = "Multi-colony ant foraging simulation")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the tick limit.
    #[arg(short, long)]
    ticks: Option<u32>,

    /// Seed the random stream for a reproducible run.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Wall-clock delay between ticks, in milliseconds.
    #[arg(long)]
    tick_delay_ms: Option<u64>,

    /// How each tick is reported.
    #[arg(short, long, value_enum, default_value_t = ObserverKind::Summary)]
    observer: ObserverKind,

    /// Read pause/resume/quit commands from stdin.
    #[arg(short, long)]
    interactive: bool,

    /// Log per-agent simulation events.
    #[arg(long)]
    events: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Loads the simulation configuration from a TOML file or uses defaults.
fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
            let config: SimulationConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
            info!(path = %path.display(), "Loaded config");
            debug!(?config);
            Ok(config)
        }
        None => {
            info!("No config file provided, using defaults");
            Ok(SimulationConfig::default())
        }
    }
}

/// Forwards stdin commands as controls. Without `interactive` the sender is dropped at once.
fn spawn_controls(interactive: bool) -> Receiver<Control> {
    let (tx, rx) = mpsc::channel();
    if interactive {
        info!("Interactive mode: 'p' toggles pause, 'q' quits");
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match parse_control(&line) {
                    Some(control) => {
                        if tx.send(control).is_err() {
                            break;
                        }
                    }
                    None => debug!(input = %line, "Ignoring unknown command"),
                }
            }
        });
    }
    rx
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let simulation = load_config(cli.config.as_deref())?;
    let app_config =
        AppConfig::from_cli_and_config(cli, simulation).context("Invalid configuration")?;
    let controls = spawn_controls(app_config.interactive);

    let mut app = AntFarmApp::new(app_config)?;
    app.run(&controls)
}
