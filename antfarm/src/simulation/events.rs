//! Optional observability hook for the simulation core.
//!
//! The simulation only builds events when a sink is installed, so the hot loop
//! pays nothing when observability is off.

use shared::{Action, ColonyId, EntityKind, Position, RunState};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    AgentMoved {
        tick: u32,
        colony_id: ColonyId,
        from: Position,
        action: Action,
        to: Position,
        reward: i32,
    },
    ResourceCollected {
        tick: u32,
        colony_id: ColonyId,
        at: Position,
        reward: i32,
    },
    SpawnShortfall {
        tick: u32,
        kind: EntityKind,
        missing: usize,
    },
    EnvironmentGrew {
        tick: u32,
        resources: usize,
        obstacles: usize,
    },
    StateChanged {
        tick: u32,
        state: RunState,
    },
    TickCompleted {
        tick: u32,
        collected: u32,
    },
}

pub trait EventSink {
    fn emit(&mut self, event: &SimEvent);
}

/// Forwards simulation events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &SimEvent) {
        match *event {
            SimEvent::AgentMoved {
                tick,
                colony_id,
                from,
                action,
                to,
                reward,
            } => trace!(tick, colony_id, ?from, ?action, ?to, reward, "agent moved"),
            SimEvent::ResourceCollected {
                tick,
                colony_id,
                at,
                reward,
            } => debug!(tick, colony_id, ?at, reward, "resource collected"),
            SimEvent::SpawnShortfall {
                tick,
                kind,
                missing,
            } => warn!(tick, ?kind, missing, "no empty cell found, spawn skipped"),
            SimEvent::EnvironmentGrew {
                tick,
                resources,
                obstacles,
            } => debug!(tick, resources, obstacles, "environment grew"),
            SimEvent::StateChanged { tick, state } => debug!(tick, ?state, "run state changed"),
            SimEvent::TickCompleted { tick, collected } => trace!(tick, collected, "tick completed"),
        }
    }
}

