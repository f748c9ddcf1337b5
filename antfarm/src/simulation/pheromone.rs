use shared::Position;

use super::PHEROMONE_FLOOR;

/// Scalar trail intensity per cell, decayed once per tick.
#[derive(Clone, Debug)]
pub struct PheromoneField {
    pub data: Vec<Vec<f64>>,
    pub decay_rate: f64,
    pub increment: f64,
    pub cap: f64,
}

impl PheromoneField {
    pub fn new(size: usize, decay_rate: f64, increment: f64, cap: f64) -> Self {
        Self {
            data: vec![vec![0.0; size]; size],
            decay_rate,
            increment,
            cap,
        }
    }

    #[cfg(test)]
    pub fn intensity_at(&self, pos: Position) -> f64 {
        self.data[pos.row][pos.col]
    }

    /// Adds one increment at `pos`, saturating at the cap.
    #[inline(always)]
    pub fn deposit(&mut self, pos: Position) {
        let cell = &mut self.data[pos.row][pos.col];
        *cell = (*cell + self.increment).min(self.cap);
    }

    pub fn decay(&mut self) {
        for row in self.data.iter_mut() {
            for value in row.iter_mut() {
                if *value > 0.0 {
                    *value *= self.decay_rate;
                }
                if *value < PHEROMONE_FLOOR {
                    *value = 0.0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_saturates_at_cap() {
        let mut field = PheromoneField::new(3, 0.95, 10.0, 100.0);
        let pos = Position::new(1, 1);
        for _ in 0..25 {
            field.deposit(pos);
        }
        assert_eq!(field.intensity_at(pos), 100.0, "Deposits should stop at the cap");
    }

    #[test]
    fn test_decay_is_geometric() {
        let mut field = PheromoneField::new(3, 0.95, 10.0, 100.0);
        let pos = Position::new(0, 2);
        field.deposit(pos);
        field.decay();
        assert!(
            (field.intensity_at(pos) - 9.5).abs() < 1e-9,
            "One decay should scale by 0.95, got {}",
            field.intensity_at(pos)
        );
    }

    #[test]
    fn test_decay_snaps_faint_trails_to_zero() {
        let mut field = PheromoneField::new(2, 0.5, 10.0, 100.0);
        let pos = Position::new(0, 0);
        field.deposit(pos);
        for _ in 0..20 {
            field.decay();
        }
        assert_eq!(field.intensity_at(pos), 0.0);
    }

    #[test]
    fn test_intensity_stays_in_range() {
        let mut field = PheromoneField::new(4, 0.95, 10.0, 100.0);
        for i in 0..500 {
            field.decay();
            field.deposit(Position::new(i % 4, (i / 4) % 4));
            field.deposit(Position::new(0, 0));
        }
        for row in &field.data {
            for &value in row {
                assert!((0.0..=100.0).contains(&value), "Intensity out of range: {}", value);
            }
        }
    }
}
