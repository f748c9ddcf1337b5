use crate::api::{Action, Position};

/// Euclidean distance between two cells.
#[inline(always)]
pub fn distance(a: Position, b: Position) -> f64 {
    let dr = a.row as f64 - b.row as f64;
    let dc = a.col as f64 - b.col as f64;
    (dr * dr + dc * dc).sqrt()
}

/// Applies the action's unit offset. Returns `None` when the target leaves a `size`×`size` grid.
#[inline(always)]
pub fn step(pos: Position, action: Action, size: usize) -> Option<Position> {
    let (dr, dc) = action.offset();
    let row = pos.row.checked_add_signed(dr)?;
    let col = pos.col.checked_add_signed(dc)?;
    if row < size && col < size {
        Some(Position { row, col })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_axis_aligned() {
        let d = distance(Position::new(0, 0), Position::new(0, 3));
        assert!((d - 3.0).abs() < 1e-9, "Distance inaccurate along a row: {}", d);
    }

    #[test]
    fn test_distance_diagonal() {
        let d = distance(Position::new(1, 1), Position::new(4, 5));
        assert!((d - 5.0).abs() < 1e-9, "Distance inaccurate for 3-4-5 triangle: {}", d);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Position::new(2, 7);
        let b = Position::new(9, 3);
        assert_eq!(distance(a, b), distance(b, a), "Distance should be symmetric");
    }

    #[test]
    fn test_step_inside_grid() {
        let pos = Position::new(2, 2);
        assert_eq!(step(pos, Action::Up, 5), Some(Position::new(1, 2)));
        assert_eq!(step(pos, Action::Down, 5), Some(Position::new(3, 2)));
        assert_eq!(step(pos, Action::Left, 5), Some(Position::new(2, 1)));
        assert_eq!(step(pos, Action::Right, 5), Some(Position::new(2, 3)));
    }

    #[test]
    fn test_step_off_the_edges() {
        assert_eq!(step(Position::new(0, 0), Action::Up, 5), None, "Row underflow");
        assert_eq!(step(Position::new(0, 0), Action::Left, 5), None, "Col underflow");
        assert_eq!(step(Position::new(4, 4), Action::Down, 5), None, "Row overflow");
        assert_eq!(step(Position::new(4, 4), Action::Right, 5), None, "Col overflow");
    }
}
