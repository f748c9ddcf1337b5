use anyhow::{Context, Result};
use clap::ValueEnum;
use shared::{Cell, ResourceKind, RunState, Snapshot};
use std::io::Write;
use tracing::info;

/// Receives one read-only snapshot per tick.
pub trait Observer {
    fn observe(&mut self, snapshot: &Snapshot) -> Result<()>;

    /// Called once when the run ends.
    fn finish(&mut self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }
}

/// Stock observers selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ObserverKind {
    /// Log colony standings every tick.
    Summary,
    /// Draw the grid as text on stdout.
    Ascii,
    /// One JSON snapshot per line on stdout.
    Json,
    /// Observe nothing.
    None,
}

pub fn build_observer(kind: ObserverKind) -> Box<dyn Observer> {
    match kind {
        ObserverKind::Summary => Box::new(SummaryObserver),
        ObserverKind::Ascii => Box::new(AsciiRenderer::new(std::io::stdout())),
        ObserverKind::Json => Box::new(JsonLinesObserver::new(std::io::stdout())),
        ObserverKind::None => Box::new(NullObserver),
    }
}

pub struct NullObserver;

impl Observer for NullObserver {
    fn observe(&mut self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }
}

/// Logs the stats panel through `tracing`.
pub struct SummaryObserver;

impl Observer for SummaryObserver {
    fn observe(&mut self, snapshot: &Snapshot) -> Result<()> {
        for colony in &snapshot.colonies {
            info!(
                tick = snapshot.tick,
                colony = colony.colony_id,
                collected = colony.resources_collected,
                score = colony.score,
                visited = colony.visited_cells,
                "colony standings"
            );
        }
        Ok(())
    }

    fn finish(&mut self, snapshot: &Snapshot) -> Result<()> {
        if let Some(best) = snapshot.colonies.iter().max_by_key(|c| c.score) {
            info!(
                tick = snapshot.tick,
                colony = best.colony_id,
                score = best.score,
                "leading colony"
            );
        }
        Ok(())
    }
}

/// Streams snapshots as JSON lines.
pub struct JsonLinesObserver<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Observer for JsonLinesObserver<W> {
    fn observe(&mut self, snapshot: &Snapshot) -> Result<()> {
        serde_json::to_writer(&mut self.out, snapshot).context("Failed to encode snapshot")?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Text renderer for terminals.
pub struct AsciiRenderer<W: Write> {
    out: W,
}

impl<W: Write> AsciiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Observer for AsciiRenderer<W> {
    fn observe(&mut self, snapshot: &Snapshot) -> Result<()> {
        let frame = render_frame(snapshot);
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

fn cell_glyph(cell: Cell, pheromone: f64) -> char {
    match cell {
        Cell::Obstacle => '#',
        Cell::Resource(ResourceKind::Food) => 'F',
        Cell::Resource(ResourceKind::Water) => 'W',
        Cell::Nest(colony_id) => char::from_digit(colony_id % 10, 10).unwrap_or('N'),
        Cell::Empty if pheromone > 0.0 => '.',
        Cell::Empty => ' ',
    }
}

fn ant_glyph(colony_id: u32) -> char {
    (b'a' + (colony_id % 26) as u8) as char
}

/// Draws the grid (terrain, then pheromone trails, then ants on top) followed by the stats lines.
pub fn render_frame(snapshot: &Snapshot) -> String {
    let mut rows: Vec<Vec<char>> = snapshot
        .cells
        .iter()
        .zip(&snapshot.pheromones)
        .map(|(cells, trail)| {
            cells
                .iter()
                .zip(trail)
                .map(|(&cell, &intensity)| cell_glyph(cell, intensity))
                .collect()
        })
        .collect();

    for agent in &snapshot.agents {
        if let Some(glyph) = rows
            .get_mut(agent.position.row)
            .and_then(|row| row.get_mut(agent.position.col))
        {
            *glyph = ant_glyph(agent.colony_id);
        }
    }

    let border = format!("+{}+\n", "-".repeat(snapshot.size));
    let mut frame = format!("tick {}\n", snapshot.tick);
    frame.push_str(&border);
    for row in rows {
        frame.push('|');
        frame.extend(row);
        frame.push_str("|\n");
    }
    frame.push_str(&border);

    for colony in &snapshot.colonies {
        frame.push_str(&format!(
            "Colony {}: Resources Collected: {}, Score: {}\n",
            colony.colony_id, colony.resources_collected, colony.score
        ));
    }
    if snapshot.run_state == RunState::Paused {
        frame.push_str("Simulation Paused. Send 'p' to resume.\n");
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AgentView, ColonyView, Position};

    fn tiny_snapshot(run_state: RunState) -> Snapshot {
        let mut cells = vec![vec![Cell::Empty; 3]; 3];
        cells[0][0] = Cell::Nest(0);
        cells[1][1] = Cell::Obstacle;
        cells[2][0] = Cell::Resource(ResourceKind::Food);
        cells[2][2] = Cell::Resource(ResourceKind::Water);
        let mut pheromones = vec![vec![0.0; 3]; 3];
        pheromones[0][1] = 10.0;
        pheromones[0][2] = 4.0;

        Snapshot {
            tick: 7,
            run_state,
            size: 3,
            cells,
            pheromones,
            agents: vec![AgentView {
                colony_id: 1,
                position: Position::new(0, 2),
                epsilon: 0.5,
            }],
            colonies: vec![ColonyView {
                colony_id: 0,
                nests: vec![Position::new(0, 0)],
                resources_collected: 2,
                score: 15,
                visited_cells: 4,
                resources_near_nest: 2,
            }],
        }
    }

    #[test]
    fn test_render_frame_layers() {
        let frame = render_frame(&tiny_snapshot(RunState::Running));
        let lines: Vec<&str> = frame.lines().collect();
        assert_eq!(lines[0], "tick 7");
        assert_eq!(lines[1], "+---+");
        assert_eq!(lines[2], "|0.b|", "Nest, trail, then the ant drawn over its trail");
        assert_eq!(lines[3], "| # |");
        assert_eq!(lines[4], "|F W|");
        assert_eq!(lines[6], "Colony 0: Resources Collected: 2, Score: 15");
        assert!(!frame.contains("Paused"));
    }

    #[test]
    fn test_render_frame_paused_banner() {
        let frame = render_frame(&tiny_snapshot(RunState::Paused));
        assert!(frame.ends_with("Simulation Paused. Send 'p' to resume.\n"));
    }

    #[test]
    fn test_json_lines_observer_writes_one_line_per_snapshot() {
        let mut observer = JsonLinesObserver::new(Vec::new());
        observer.observe(&tiny_snapshot(RunState::Running)).expect("encode");
        observer.observe(&tiny_snapshot(RunState::Paused)).expect("encode");

        let text = String::from_utf8(observer.out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let decoded: Snapshot = serde_json::from_str(lines[1]).expect("valid json");
        assert_eq!(decoded.tick, 7);
        assert_eq!(decoded.run_state, RunState::Paused);
        assert_eq!(decoded.cells[1][1], Cell::Obstacle);
    }
}
