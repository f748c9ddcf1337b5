use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::util::{distance, step};
use shared::{Action, Cell, ColonyId, EntityKind, Position, ResourceKind};
use std::collections::HashSet;
use thiserror::Error;

use super::{
    FOOD_REWARD, MAX_PHEROMONE_AMOUNT, OBSTACLE_REWARD, OWN_NEST_REWARD,
    PERIODIC_UPDATE_PROBABILITY, PHEROMONE_DECAY, PHEROMONE_INCREMENT, PheromoneField,
    SPAWN_RETRY_BUDGET, WATER_REWARD,
};

/// Errors raised while setting up the world.
#[derive(Debug, Error, PartialEq)]
pub enum WorldError {
    #[error("grid size must be non-zero")]
    EmptyGrid,
    #[error("at least one colony is required")]
    NoColonies,
    #[error("colony {0} has no nest")]
    EmptyNestList(ColonyId),
    #[error("nest ({row}, {col}) of colony {colony_id} lies outside the {size}x{size} grid")]
    NestOutOfBounds {
        colony_id: ColonyId,
        row: usize,
        col: usize,
        size: usize,
    },
    #[error("nest ({row}, {col}) is claimed by both colony {first} and colony {second}")]
    OverlappingNests {
        row: usize,
        col: usize,
        first: ColonyId,
        second: ColonyId,
    },
    #[error("colony {colony_id} does not exist (colony count is {colony_count})")]
    UnknownColony {
        colony_id: ColonyId,
        colony_count: usize,
    },
}

/// Fixed reward values handed out by [`GridWorld::reward`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    pub food: i32,
    pub water: i32,
    pub obstacle: i32,
    pub own_nest: i32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            food: FOOD_REWARD,
            water: WATER_REWARD,
            obstacle: OBSTACLE_REWARD,
            own_nest: OWN_NEST_REWARD,
        }
    }
}

/// Outcome of a populate call. A non-zero `*_missing` means the retry budget ran out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub resources_placed: usize,
    pub obstacles_placed: usize,
    pub resources_missing: usize,
    pub obstacles_missing: usize,
}

impl PopulateReport {
    pub fn is_complete(&self) -> bool {
        self.resources_missing == 0 && self.obstacles_missing == 0
    }
}

pub struct GridWorld {
    size: usize,
    tiles: Vec<Vec<Cell>>,
    nests: Vec<Vec<Position>>,
    memories: Vec<HashSet<Position>>,
    resources: Vec<Position>,
    obstacles: Vec<Position>,
    pheromones: PheromoneField,
    rewards: RewardTable,
    spawn_retry_budget: u32,
    periodic_update_probability: f64,
}

impl GridWorld {
    /// Builds an empty `size`×`size` grid and places every colony's nests.
    /// `nests[i]` lists the nest cells of colony `i`.
    pub fn new(size: usize, nests: Vec<Vec<Position>>) -> Result<Self, WorldError> {
        if size == 0 {
            return Err(WorldError::EmptyGrid);
        }
        if nests.is_empty() {
            return Err(WorldError::NoColonies);
        }

        let mut tiles = vec![vec![Cell::Empty; size]; size];
        for (colony_id, group) in nests.iter().enumerate() {
            let colony_id = colony_id as ColonyId;
            if group.is_empty() {
                return Err(WorldError::EmptyNestList(colony_id));
            }
            for nest in group {
                if nest.row >= size || nest.col >= size {
                    return Err(WorldError::NestOutOfBounds {
                        colony_id,
                        row: nest.row,
                        col: nest.col,
                        size,
                    });
                }
                match tiles[nest.row][nest.col] {
                    Cell::Nest(first) if first != colony_id => {
                        return Err(WorldError::OverlappingNests {
                            row: nest.row,
                            col: nest.col,
                            first,
                            second: colony_id,
                        });
                    }
                    _ => tiles[nest.row][nest.col] = Cell::Nest(colony_id),
                }
            }
        }

        Ok(Self {
            size,
            tiles,
            memories: vec![HashSet::new(); nests.len()],
            nests,
            resources: Vec::new(),
            obstacles: Vec::new(),
            pheromones: PheromoneField::new(
                size,
                PHEROMONE_DECAY,
                PHEROMONE_INCREMENT,
                MAX_PHEROMONE_AMOUNT,
            ),
            rewards: RewardTable::default(),
            spawn_retry_budget: SPAWN_RETRY_BUDGET,
            periodic_update_probability: PERIODIC_UPDATE_PROBABILITY,
        })
    }

    pub fn with_rewards(mut self, rewards: RewardTable) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_pheromones(mut self, decay_rate: f64, increment: f64, cap: f64) -> Self {
        self.pheromones = PheromoneField::new(self.size, decay_rate, increment, cap);
        self
    }

    pub fn with_spawn_retry_budget(mut self, budget: u32) -> Self {
        self.spawn_retry_budget = budget;
        self
    }

    pub fn with_periodic_update_probability(mut self, probability: f64) -> Self {
        self.periodic_update_probability = probability;
        self
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn colony_count(&self) -> usize {
        self.nests.len()
    }

    #[inline(always)]
    pub fn cell_at(&self, pos: Position) -> Option<Cell> {
        self.tiles.get(pos.row).and_then(|row| row.get(pos.col)).copied()
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.tiles
    }

    pub fn nests(&self, colony_id: ColonyId) -> &[Position] {
        &self.nests[colony_id as usize]
    }

    pub fn visited_cells(&self, colony_id: ColonyId) -> &HashSet<Position> {
        &self.memories[colony_id as usize]
    }

    pub fn resources(&self) -> &[Position] {
        &self.resources
    }

    pub fn obstacles(&self) -> &[Position] {
        &self.obstacles
    }

    pub fn pheromones(&self) -> &PheromoneField {
        &self.pheromones
    }

    pub fn pheromones_mut(&mut self) -> &mut PheromoneField {
        &mut self.pheromones
    }

    pub fn check_colony(&self, colony_id: ColonyId) -> Result<(), WorldError> {
        if (colony_id as usize) < self.colony_count() {
            Ok(())
        } else {
            Err(WorldError::UnknownColony {
                colony_id,
                colony_count: self.colony_count(),
            })
        }
    }

    /// Spawns resources and obstacles until each tracked list holds the requested count.
    /// Lists already at or above their count are left alone.
    pub fn populate<R: Rng + ?Sized>(
        &mut self,
        num_resources: usize,
        num_obstacles: usize,
        rng: &mut R,
    ) -> PopulateReport {
        let (resources_placed, resources_missing) =
            self.spawn_entities(EntityKind::Resource, num_resources, rng);
        let (obstacles_placed, obstacles_missing) =
            self.spawn_entities(EntityKind::Obstacle, num_obstacles, rng);

        PopulateReport {
            resources_placed,
            obstacles_placed,
            resources_missing,
            obstacles_missing,
        }
    }

    /// With a small probability adds one resource and one obstacle to what is currently tracked.
    pub fn periodic_update<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PopulateReport> {
        if rng.random::<f64>() >= self.periodic_update_probability {
            return None;
        }
        let resources = self.resources.len() + 1;
        let obstacles = self.obstacles.len() + 1;
        Some(self.populate(resources, obstacles, rng))
    }

    fn spawn_entities<R: Rng + ?Sized>(
        &mut self,
        kind: EntityKind,
        target: usize,
        rng: &mut R,
    ) -> (usize, usize) {
        let mut placed = 0;
        while self.tracked(kind).len() < target {
            // Give up on this kind once an entity exhausts its budget; the grid is (nearly) full.
            let Some(pos) = self.sample_empty_cell(rng) else {
                break;
            };
            match kind {
                EntityKind::Resource => {
                    let resource = if rng.random_bool(0.5) {
                        ResourceKind::Food
                    } else {
                        ResourceKind::Water
                    };
                    self.tiles[pos.row][pos.col] = Cell::Resource(resource);
                    self.resources.push(pos);
                }
                EntityKind::Obstacle => {
                    self.tiles[pos.row][pos.col] = Cell::Obstacle;
                    self.obstacles.push(pos);
                }
            }
            placed += 1;
        }

        (placed, target.saturating_sub(self.tracked(kind).len()))
    }

    fn sample_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        for _ in 0..self.spawn_retry_budget {
            let pos = Position::new(
                rng.random_range(0..self.size),
                rng.random_range(0..self.size),
            );
            if self.tiles[pos.row][pos.col] == Cell::Empty {
                return Some(pos);
            }
        }
        None
    }

    fn tracked(&self, kind: EntityKind) -> &[Position] {
        match kind {
            EntityKind::Resource => &self.resources,
            EntityKind::Obstacle => &self.obstacles,
        }
    }

    /// Places a resource on an empty cell. Returns false if the cell is out of bounds or occupied.
    pub fn place_resource(&mut self, pos: Position, kind: ResourceKind) -> bool {
        if self.cell_at(pos) != Some(Cell::Empty) {
            return false;
        }
        self.tiles[pos.row][pos.col] = Cell::Resource(kind);
        self.resources.push(pos);
        true
    }

    /// Places an obstacle on an empty cell. Returns false if the cell is out of bounds or occupied.
    pub fn place_obstacle(&mut self, pos: Position) -> bool {
        if self.cell_at(pos) != Some(Cell::Empty) {
            return false;
        }
        self.tiles[pos.row][pos.col] = Cell::Obstacle;
        self.obstacles.push(pos);
        true
    }

    /// Resolves a move and returns where the agent ends up with the reward earned there.
    /// Blocked moves (edge or obstacle) leave the agent in place.
    pub fn move_agent(
        &mut self,
        position: Position,
        colony_id: ColonyId,
        action: Action,
    ) -> (Position, i32) {
        let resolved = step(position, action, self.size)
            .filter(|target| self.tiles[target.row][target.col] != Cell::Obstacle)
            .unwrap_or(position);

        self.pheromones.deposit(resolved);
        self.memories[colony_id as usize].insert(resolved);
        let reward = self.reward(resolved, colony_id);
        (resolved, reward)
    }

    /// Reward for standing on `position`. Collecting a resource empties its cell.
    pub fn reward(&mut self, position: Position, colony_id: ColonyId) -> i32 {
        match self.tiles[position.row][position.col] {
            Cell::Resource(kind) => {
                self.tiles[position.row][position.col] = Cell::Empty;
                self.resources.retain(|&p| p != position);
                match kind {
                    ResourceKind::Food => self.rewards.food,
                    ResourceKind::Water => self.rewards.water,
                }
            }
            Cell::Obstacle => self.rewards.obstacle,
            Cell::Nest(owner) if owner == colony_id => self.rewards.own_nest,
            Cell::Nest(_) | Cell::Empty => 0,
        }
    }

    /// Nearest tracked entity of `kind`; ties go to the one tracked first.
    pub fn closest_entity(&self, position: Position, kind: EntityKind) -> Option<Position> {
        self.tracked(kind)
            .iter()
            .copied()
            .min_by(|a, b| distance(position, *a).total_cmp(&distance(position, *b)))
    }

    pub fn count_entities_within_radius(
        &self,
        position: Position,
        kind: EntityKind,
        radius: f64,
    ) -> usize {
        self.tracked(kind)
            .iter()
            .filter(|&&entity| distance(position, entity) <= radius)
            .count()
    }
}
