use serde::{Deserialize, Serialize};

/// Colony identifier, dense in `[0, colony_count)`.
pub type ColonyId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Unit offset in (row, col).
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Food,
    Water,
}

/// Content of a single grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Obstacle,
    Nest(ColonyId),
    Resource(ResourceKind),
}

/// Tracked entity families that can be queried by distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Resource,
    Obstacle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentView {
    pub colony_id: ColonyId,
    pub position: Position,
    pub epsilon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonyView {
    pub colony_id: ColonyId,
    pub nests: Vec<Position>,
    pub resources_collected: u32,
    pub score: i64,
    pub visited_cells: usize,
    pub resources_near_nest: usize,
}

/// Read-only view of the simulation handed to observers once per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u32,
    pub run_state: RunState,
    pub size: usize,
    pub cells: Vec<Vec<Cell>>,
    pub pheromones: Vec<Vec<f64>>,
    pub agents: Vec<AgentView>,
    pub colonies: Vec<ColonyView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cell_is_empty() {
        assert_eq!(Cell::default(), Cell::Empty);
        let row: Vec<Cell> = vec![Cell::default(); 3];
        assert!(row.iter().all(|&c| c == Cell::Empty));
    }
}
