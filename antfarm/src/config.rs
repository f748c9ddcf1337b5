use serde::{Deserialize, Serialize};
use shared::Position;
use thiserror::Error;

use crate::observer::ObserverKind;
use crate::simulation::{
    DEFAULT_AGENTS_PER_COLONY, DEFAULT_GRID_SIZE, DEFAULT_INITIAL_OBSTACLES,
    DEFAULT_INITIAL_RESOURCES, DEFAULT_MAX_TICKS, LearningParams, MAX_PHEROMONE_AMOUNT,
    NEST_SENSE_RADIUS, PERIODIC_UPDATE_PROBABILITY, PHEROMONE_DECAY, PHEROMONE_INCREMENT,
    RewardTable, SPAWN_RETRY_BUDGET,
};

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("colony_count is {colony_count} but {nests} nest groups were given")]
    ColonyCountMismatch { colony_count: usize, nests: usize },
    #[error("{field} must be non-zero")]
    Zero { field: &'static str },
    #[error("{field} must lie in [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },
    #[error("{field} must lie in (0, 1], got {value}")]
    DecayFactor { field: &'static str, value: f64 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("epsilon_min ({min}) exceeds epsilon_start ({start})")]
    EpsilonRange { min: f64, start: f64 },
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid_size: usize,
    pub colony_count: usize,
    /// Nest cells per colony, as `[row, col]` pairs.
    pub nests: Vec<Vec<(usize, usize)>>,
    pub agents_per_colony: u32,
    pub initial_resources: usize,
    pub initial_obstacles: usize,
    pub pheromone_decay: f64,
    pub pheromone_increment: f64,
    pub pheromone_cap: f64,
    pub rewards: RewardTable,
    pub learning: LearningParams,
    pub periodic_update_probability: f64,
    pub max_ticks: u32,
    pub spawn_retry_budget: u32,
    pub nest_sense_radius: f64,
    pub rng_seed: Option<u64>,
    pub tick_delay_ms: u64,
}

/// Configuration for the entire application including CLI parameters
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub observer: ObserverKind,
    pub interactive: bool,
    pub events: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            colony_count: 2,
            nests: vec![vec![(5, 5)], vec![(15, 15)]],
            agents_per_colony: DEFAULT_AGENTS_PER_COLONY,
            initial_resources: DEFAULT_INITIAL_RESOURCES,
            initial_obstacles: DEFAULT_INITIAL_OBSTACLES,
            pheromone_decay: PHEROMONE_DECAY,
            pheromone_increment: PHEROMONE_INCREMENT,
            pheromone_cap: MAX_PHEROMONE_AMOUNT,
            rewards: RewardTable::default(),
            learning: LearningParams::default(),
            periodic_update_probability: PERIODIC_UPDATE_PROBABILITY,
            max_ticks: DEFAULT_MAX_TICKS,
            spawn_retry_budget: SPAWN_RETRY_BUDGET,
            nest_sense_radius: NEST_SENSE_RADIUS,
            rng_seed: None,
            tick_delay_ms: 0,
        }
    }
}

impl SimulationConfig {
    pub fn nest_positions(&self) -> Vec<Vec<Position>> {
        self.nests
            .iter()
            .map(|group| group.iter().copied().map(Position::from).collect())
            .collect()
    }

    /// Checks value ranges. Nest placement is checked when the world is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.colony_count != self.nests.len() {
            return Err(ConfigError::ColonyCountMismatch {
                colony_count: self.colony_count,
                nests: self.nests.len(),
            });
        }
        if self.grid_size == 0 {
            return Err(ConfigError::Zero { field: "grid_size" });
        }
        if self.colony_count == 0 {
            return Err(ConfigError::Zero {
                field: "colony_count",
            });
        }
        if self.spawn_retry_budget == 0 {
            return Err(ConfigError::Zero {
                field: "spawn_retry_budget",
            });
        }

        check_probability("periodic_update_probability", self.periodic_update_probability)?;
        check_probability("learning.alpha", self.learning.alpha)?;
        check_probability("learning.gamma", self.learning.gamma)?;
        check_probability("learning.epsilon_start", self.learning.epsilon_start)?;
        check_probability("learning.epsilon_min", self.learning.epsilon_min)?;
        if self.learning.epsilon_min > self.learning.epsilon_start {
            return Err(ConfigError::EpsilonRange {
                min: self.learning.epsilon_min,
                start: self.learning.epsilon_start,
            });
        }

        check_decay("pheromone_decay", self.pheromone_decay)?;
        check_decay("learning.epsilon_decay", self.learning.epsilon_decay)?;

        check_positive("pheromone_increment", self.pheromone_increment)?;
        check_positive("pheromone_cap", self.pheromone_cap)?;
        check_positive("nest_sense_radius", self.nest_sense_radius)?;
        Ok(())
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { field, value })
    }
}

fn check_decay(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::DecayFactor { field, value })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

impl AppConfig {
    pub fn from_cli_and_config(
        cli: crate::Cli,
        mut simulation: SimulationConfig,
    ) -> Result<Self, ConfigError> {
        if let Some(ticks) = cli.ticks {
            simulation.max_ticks = ticks;
        }
        if let Some(seed) = cli.seed {
            simulation.rng_seed = Some(seed);
        }
        if let Some(delay) = cli.tick_delay_ms {
            simulation.tick_delay_ms = delay;
        }

        simulation.validate()?;

        Ok(Self {
            simulation,
            observer: cli.observer,
            interactive: cli.interactive,
            events: cli.events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(
            config.nest_positions(),
            vec![vec![Position::new(5, 5)], vec![Position::new(15, 15)]]
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            grid_size = 8
            colony_count = 1
            nests = [[[1, 1], [6, 6]]]
            max_ticks = 30

            [learning]
            epsilon_start = 0.5
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.grid_size, 8);
        assert_eq!(
            config.nest_positions(),
            vec![vec![Position::new(1, 1), Position::new(6, 6)]]
        );
        assert_eq!(config.max_ticks, 30);
        assert_eq!(config.learning.epsilon_start, 0.5);
        assert_eq!(config.learning.alpha, 0.1, "Unset learning fields keep defaults");
        assert_eq!(config.rewards, RewardTable::default());
        assert_eq!(config.pheromone_decay, 0.95);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_mismatched_colony_count() {
        let config = SimulationConfig {
            colony_count: 3,
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ColonyCountMismatch {
                colony_count: 3,
                nests: 2
            })
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let config = SimulationConfig {
            periodic_update_probability: 1.5,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Probability {
                field: "periodic_update_probability",
                ..
            })
        ));

        let config = SimulationConfig {
            pheromone_decay: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DecayFactor { .. })));

        let config = SimulationConfig {
            pheromone_cap: -1.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NotPositive { .. })));

        let mut config = SimulationConfig::default();
        config.learning.epsilon_start = 0.001;
        assert!(matches!(config.validate(), Err(ConfigError::EpsilonRange { .. })));
    }
}
