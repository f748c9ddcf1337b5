use crate::config::AppConfig;
use crate::observer::{Observer, build_observer};
use crate::simulation::{Control, Simulation, TracingSink};
use anyhow::{Context, Result};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Headless driver: steps the simulation and hands every tick to an observer.
pub struct AntFarmApp {
    simulation: Simulation, // Core logic: world, colonies and agents.
    observer: Box<dyn Observer>,
    tick_delay: Duration, // Optional wall-clock pause between ticks.
}

impl AntFarmApp {
    /// Creates a new `AntFarmApp` instance.
    pub fn new(app_config: AppConfig) -> Result<Self> {
        let mut simulation =
            Simulation::new(&app_config.simulation).context("Failed to set up the simulation")?;
        if app_config.events {
            simulation = simulation.with_sink(Box::new(TracingSink));
        }

        info!(
            agents = simulation.total_agent_count(),
            max_ticks = simulation.config.max_ticks,
            "Simulation ready"
        );

        let tick_delay = Duration::from_millis(app_config.simulation.tick_delay_ms);
        Ok(Self::with_observer(
            simulation,
            build_observer(app_config.observer),
            tick_delay,
        ))
    }

    pub fn with_observer(
        simulation: Simulation,
        observer: Box<dyn Observer>,
        tick_delay: Duration,
    ) -> Self {
        Self {
            simulation,
            observer,
            tick_delay,
        }
    }

    /// Runs the main loop until quit, tick limit, or a closed control channel while paused.
    pub fn run(&mut self, controls: &Receiver<Control>) -> Result<()> {
        self.observer.observe(&self.simulation.snapshot())?;

        loop {
            // Controls only land between ticks
            loop {
                match controls.try_recv() {
                    Ok(control) => self.apply(control)?,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }

            if self.simulation.is_finished() {
                break;
            }

            if self.simulation.is_paused() {
                match controls.recv() {
                    Ok(control) => {
                        self.apply(control)?;
                        continue;
                    }
                    Err(_) => {
                        warn!("Control channel closed while paused, stopping");
                        break;
                    }
                }
            }

            if self.simulation.step().is_some() {
                self.observer.observe(&self.simulation.snapshot())?;
            }

            if !self.tick_delay.is_zero() {
                thread::sleep(self.tick_delay);
            }
        }

        let snapshot = self.simulation.snapshot();
        self.observer.finish(&snapshot)?;
        self.report_standings();
        Ok(())
    }

    fn apply(&mut self, control: Control) -> Result<()> {
        info!(?control, tick = self.simulation.tick, "Control received");
        let was_paused = self.simulation.is_paused();
        self.simulation.apply(control);
        if was_paused != self.simulation.is_paused() {
            self.observer.observe(&self.simulation.snapshot())?;
        }
        Ok(())
    }

    fn report_standings(&self) {
        for colony in &self.simulation.colonies {
            info!(
                colony = colony.colony_id,
                collected = colony.resources_collected,
                score = colony.score,
                agents = colony.population(),
                "Final standings"
            );
        }
        info!(ticks = self.simulation.tick, "Simulation finished");
    }
}

/// Maps a line typed on stdin to a control signal.
pub fn parse_control(line: &str) -> Option<Control> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "p" | "space" => Some(Control::TogglePause),
        "pause" => Some(Control::Pause),
        "resume" | "r" => Some(Control::Resume),
        "q" | "quit" | "exit" => Some(Control::Quit),
        _ => None,
    }
}
