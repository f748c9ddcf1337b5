use super::{DISCOUNT, EPSILON_DECAY, EPSILON_MIN, EPSILON_START, LEARNING_RATE};
use super::{GridWorld, WorldError};

use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::{Action, ColonyId, EntityKind, Position};
use slotmap::new_key_type;
use std::collections::HashMap;

new_key_type! {
    /// Key for agent slotmap.
    pub struct AgentKey;
}

/// Fixed learning hyperparameters shared by every agent of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningParams {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: LEARNING_RATE,
            gamma: DISCOUNT,
            epsilon_start: EPSILON_START,
            epsilon_min: EPSILON_MIN,
            epsilon_decay: EPSILON_DECAY,
        }
    }
}

/// One resolved step of an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Position,
    pub action: Action,
    pub reward: i32,
    pub to: Position,
}

/// State of an ant: where it stands and what it has learned.
pub struct Agent {
    pub colony_id: ColonyId,
    position: Position,
    q_table: HashMap<(Position, Action), f64>,
    epsilon: f64,
    params: LearningParams,
}

impl Agent {
    /// Create a new agent standing on one of its colony's nests.
    pub fn new<R: Rng + ?Sized>(
        world: &GridWorld,
        colony_id: ColonyId,
        params: LearningParams,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        world.check_colony(colony_id)?;
        let nests = world.nests(colony_id);
        let position = nests[rng.random_range(0..nests.len())];

        Ok(Self {
            colony_id,
            position,
            q_table: HashMap::new(),
            epsilon: params.epsilon_start,
            params,
        })
    }

    #[inline(always)]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline(always)]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Every move is offered; the world decides whether it goes through.
    pub fn available_actions(&self) -> [Action; 4] {
        Action::ALL
    }

    /// Epsilon-greedy: explore at random, otherwise head for the nearest resource.
    pub fn choose_action<R: Rng + ?Sized>(&self, world: &GridWorld, rng: &mut R) -> Action {
        let actions = self.available_actions();
        if rng.random::<f64>() < self.epsilon {
            return actions[rng.random_range(0..actions.len())];
        }

        match world.closest_entity(self.position, EntityKind::Resource) {
            Some(target) => greedy_step(self.position, target),
            None => actions[rng.random_range(0..actions.len())],
        }
    }

    /// Choose, move and learn from the outcome in one step.
    pub fn act<R: Rng + ?Sized>(&mut self, world: &mut GridWorld, rng: &mut R) -> Transition {
        let from = self.position;
        let action = self.choose_action(world, rng);
        let (to, reward) = world.move_agent(from, self.colony_id, action);

        self.position = to;
        self.learn(from, action, reward as f64, to);

        Transition {
            from,
            action,
            reward,
            to,
        }
    }

    /// One-step Q-learning update.
    pub fn learn(&mut self, state: Position, action: Action, reward: f64, next_state: Position) {
        let old_q = self.q_value(state, action);
        let future_q = Action::ALL
            .iter()
            .map(|&a| self.q_value(next_state, a))
            .fold(f64::NEG_INFINITY, f64::max);
        let updated = old_q + self.params.alpha * (reward + self.params.gamma * future_q - old_q);
        self.q_table.insert((state, action), updated);
    }

    pub fn decay_exploration(&mut self) {
        self.epsilon = (self.epsilon * self.params.epsilon_decay).max(self.params.epsilon_min);
    }

    /// Learned value, 0 for pairs never updated.
    pub fn q_value(&self, state: Position, action: Action) -> f64 {
        self.q_table.get(&(state, action)).copied().unwrap_or(0.0)
    }
}

/// Single step along the axis with the larger offset; the row axis wins ties.
fn greedy_step(from: Position, target: Position) -> Action {
    let d_row = target.row as isize - from.row as isize;
    let d_col = target.col as isize - from.col as isize;
    if d_row.abs() >= d_col.abs() {
        if d_row > 0 { Action::Down } else { Action::Up }
    } else if d_col > 0 {
        Action::Right
    } else {
        Action::Left
    }
}
