//! Committed, renderable game state

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use super::{GameId, GameInstance, GameStatus, Simulation};

/// One entity as a renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<&Entity> for EntityView {
    fn from(e: &Entity) -> Self {
        Self {
            kind: e.kind,
            x: e.x,
            y: e.y,
            width: e.width,
            height: e.height,
        }
    }
}

/// State committed at the end of a step for the render side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Simulation step counter for the current instance
    pub tick: u64,
    pub game: GameId,
    pub status: GameStatus,
    pub score: u64,
    /// Restart epoch of the instance that produced this snapshot
    pub epoch: u32,
    pub controller_connected: bool,
    pub entities: Vec<EntityView>,
}

impl GameSnapshot {
    /// Snapshot of an empty lobby
    pub fn lobby(controller_connected: bool) -> Self {
        Self {
            tick: 0,
            game: GameId::Lobby,
            status: GameStatus::Idle,
            score: 0,
            epoch: 0,
            controller_connected,
            entities: Vec::new(),
        }
    }
}

/// Decides when to publish snapshots and builds them
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for status changes)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Build a snapshot from the active instance (or the lobby)
    pub fn build(
        &self,
        tick: u64,
        epoch: u32,
        controller_connected: bool,
        instance: Option<&GameInstance>,
    ) -> GameSnapshot {
        match instance {
            Some(sim) => GameSnapshot {
                tick,
                game: sim.game(),
                status: sim.status(),
                score: sim.score(),
                epoch,
                controller_connected,
                entities: sim.entities(),
            },
            None => GameSnapshot::lobby(controller_connected),
        }
    }
}
