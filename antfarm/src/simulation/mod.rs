mod agent;
mod colony;
mod events;
mod grid;
mod pheromone;
mod sim;

// Re-export key types for easier imports
pub use agent::LearningParams;
pub use events::TracingSink;
pub use grid::{GridWorld, RewardTable, WorldError};
pub use pheromone::PheromoneField;
pub use sim::{Control, Simulation};

// Grid defaults
pub const DEFAULT_GRID_SIZE: usize = 20;
pub const DEFAULT_AGENTS_PER_COLONY: u32 = 10;
pub const DEFAULT_INITIAL_RESOURCES: usize = 10;
pub const DEFAULT_INITIAL_OBSTACLES: usize = 5;
pub const DEFAULT_MAX_TICKS: u32 = 100;

// Pheromone constants
pub const PHEROMONE_DECAY: f64 = 0.95;
pub const PHEROMONE_INCREMENT: f64 = 10.0;
pub const MAX_PHEROMONE_AMOUNT: f64 = 100.0;
pub const PHEROMONE_FLOOR: f64 = 0.01; // Below this an intensity snaps to zero

// Reward constants
pub const FOOD_REWARD: i32 = 10;
pub const WATER_REWARD: i32 = 5;
pub const OBSTACLE_REWARD: i32 = -5;
pub const OWN_NEST_REWARD: i32 = 5;

// Learning constants
pub const LEARNING_RATE: f64 = 0.1;
pub const DISCOUNT: f64 = 0.9;
pub const EPSILON_START: f64 = 1.0;
pub const EPSILON_MIN: f64 = 0.01;
pub const EPSILON_DECAY: f64 = 0.995;

// Environment dynamics
pub const PERIODIC_UPDATE_PROBABILITY: f64 = 0.1;
pub const SPAWN_RETRY_BUDGET: u32 = 64; // Samples per entity before a spawn is skipped
pub const NEST_SENSE_RADIUS: f64 = 5.0;
