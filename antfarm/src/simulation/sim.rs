use rand::SeedableRng;
use rand::rngs::StdRng;
use shared::{AgentView, ColonyId, ColonyView, EntityKind, RunState, Snapshot};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, SimulationConfig};

use super::colony::{Colony, ColonyTick};
use super::events::{EventSink, SimEvent};
use super::grid::{GridWorld, PopulateReport, WorldError};

/// Signals accepted from the outside world, applied at tick boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    TogglePause,
    Quit,
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Everything that happened during one tick.
#[derive(Debug, Clone)]
pub struct TickSummary {
    pub tick: u32,
    pub colonies: Vec<ColonyTick>,
    pub environment: Option<PopulateReport>,
}

impl TickSummary {
    pub fn collected(&self) -> u32 {
        self.colonies.iter().map(|c| c.collected).sum()
    }
}

pub struct Simulation {
    pub tick: u32,
    pub world: GridWorld,
    pub colonies: Vec<Colony>,
    pub run_state: RunState,
    pub quit: bool,
    pub config: SimulationConfig,
    rng: StdRng,
    sink: Option<Box<dyn EventSink>>,
}

impl Simulation {
    pub fn new(config: &SimulationConfig) -> Result<Self, SetupError> {
        config.validate()?;

        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut world = GridWorld::new(config.grid_size, config.nest_positions())?
            .with_rewards(config.rewards)
            .with_pheromones(
                config.pheromone_decay,
                config.pheromone_increment,
                config.pheromone_cap,
            )
            .with_spawn_retry_budget(config.spawn_retry_budget)
            .with_periodic_update_probability(config.periodic_update_probability);

        let report = world.populate(config.initial_resources, config.initial_obstacles, &mut rng);
        if !report.is_complete() {
            warn!(
                resources_missing = report.resources_missing,
                obstacles_missing = report.obstacles_missing,
                "Grid too crowded for the initial population"
            );
        }

        let mut colonies = Vec::with_capacity(config.colony_count);
        for colony_id in 0..config.colony_count as ColonyId {
            colonies.push(Colony::new(
                colony_id,
                &world,
                config.agents_per_colony,
                config.learning,
                &mut rng,
            )?);
        }

        info!(
            grid_size = config.grid_size,
            colonies = colonies.len(),
            agents_per_colony = config.agents_per_colony,
            resources = world.resources().len(),
            obstacles = world.obstacles().len(),
            "Simulation ready"
        );

        Ok(Self {
            tick: 0,
            world,
            colonies,
            run_state: RunState::Running,
            quit: false,
            config: config.clone(),
            rng,
            sink: None,
        })
    }

    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn is_paused(&self) -> bool {
        self.run_state == RunState::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.quit || self.tick >= self.config.max_ticks
    }

    pub fn apply(&mut self, control: Control) {
        match control {
            Control::Pause => self.set_run_state(RunState::Paused),
            Control::Resume => self.set_run_state(RunState::Running),
            Control::TogglePause => {
                let next = match self.run_state {
                    RunState::Running => RunState::Paused,
                    RunState::Paused => RunState::Running,
                };
                self.set_run_state(next);
            }
            Control::Quit => self.quit = true,
        }
    }

    fn set_run_state(&mut self, state: RunState) {
        if self.run_state == state {
            return;
        }
        self.run_state = state;
        let tick = self.tick;
        self.emit(|| SimEvent::StateChanged { tick, state });
    }

    /// Advances one tick. Returns `None` while paused or once the run is over.
    pub fn step(&mut self) -> Option<TickSummary> {
        if self.is_finished() || self.is_paused() {
            return None;
        }

        self.world.pheromones_mut().decay();

        let mut colonies = Vec::with_capacity(self.colonies.len());
        for colony in self.colonies.iter_mut() {
            colonies.push(colony.update(&mut self.world, &mut self.rng));
        }

        let environment = self.world.periodic_update(&mut self.rng);
        self.tick += 1;

        let summary = TickSummary {
            tick: self.tick,
            colonies,
            environment,
        };
        self.emit_tick_events(&summary);
        Some(summary)
    }

    /// Steps until paused, quit or out of ticks. Returns the number of ticks run.
    #[cfg(test)]
    pub fn run_to_end(&mut self) -> u32 {
        let start = self.tick;
        while self.step().is_some() {}
        self.tick - start
    }

    fn emit<F: FnOnce() -> SimEvent>(&mut self, event: F) {
        if let Some(sink) = self.sink.as_mut() {
            sink.emit(&event());
        }
    }

    fn emit_tick_events(&mut self, summary: &TickSummary) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let tick = summary.tick;

        for colony in &summary.colonies {
            for (_, t) in &colony.transitions {
                sink.emit(&SimEvent::AgentMoved {
                    tick,
                    colony_id: colony.colony_id,
                    from: t.from,
                    action: t.action,
                    to: t.to,
                    reward: t.reward,
                });
                if t.reward > 0 {
                    sink.emit(&SimEvent::ResourceCollected {
                        tick,
                        colony_id: colony.colony_id,
                        at: t.to,
                        reward: t.reward,
                    });
                }
            }
        }

        if let Some(report) = summary.environment {
            sink.emit(&SimEvent::EnvironmentGrew {
                tick,
                resources: report.resources_placed,
                obstacles: report.obstacles_placed,
            });
            if report.resources_missing > 0 {
                sink.emit(&SimEvent::SpawnShortfall {
                    tick,
                    kind: EntityKind::Resource,
                    missing: report.resources_missing,
                });
            }
            if report.obstacles_missing > 0 {
                sink.emit(&SimEvent::SpawnShortfall {
                    tick,
                    kind: EntityKind::Obstacle,
                    missing: report.obstacles_missing,
                });
            }
        }

        sink.emit(&SimEvent::TickCompleted {
            tick,
            collected: summary.collected(),
        });
    }

    /// Read-only view for observers.
    pub fn snapshot(&self) -> Snapshot {
        let agents = self
            .colonies
            .iter()
            .flat_map(|colony| {
                colony.agents.values().map(|agent| AgentView {
                    colony_id: agent.colony_id,
                    position: agent.position(),
                    epsilon: agent.epsilon(),
                })
            })
            .collect();

        let colonies = self
            .colonies
            .iter()
            .map(|colony| {
                let nests = self.world.nests(colony.colony_id).to_vec();
                let resources_near_nest = self.world.count_entities_within_radius(
                    nests[0],
                    EntityKind::Resource,
                    self.config.nest_sense_radius,
                );
                ColonyView {
                    colony_id: colony.colony_id,
                    resources_collected: colony.resources_collected,
                    score: colony.score,
                    visited_cells: self.world.visited_cells(colony.colony_id).len(),
                    resources_near_nest,
                    nests,
                }
            })
            .collect();

        Snapshot {
            tick: self.tick,
            run_state: self.run_state,
            size: self.world.size(),
            cells: self.world.cells().to_vec(),
            pheromones: self.world.pheromones().data.clone(),
            agents,
            colonies,
        }
    }

    /// Returns the total number of agents across all colonies
    pub fn total_agent_count(&self) -> usize {
        self.colonies.iter().map(|colony| colony.population()).sum()
    }
}
