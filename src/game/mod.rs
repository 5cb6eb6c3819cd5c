//! Game simulation modules
//!
//! Every variant shares the same lifecycle and fixed-step contract; they
//! differ only in entity kinds, constants, and collision rules.

pub mod breaker;
pub mod difficulty;
pub mod entity;
pub mod lifecycle;
pub mod racing;
pub mod shooter;
pub mod snapshot;

pub use breaker::{BreakerConfig, BreakerSim};
pub use racing::{RacingConfig, RacingSim};
pub use shooter::{ShooterConfig, ShooterSim};
pub use snapshot::{EntityView, GameSnapshot, SnapshotBuilder};

use serde::{Deserialize, Serialize};

use crate::input::ControlSignal;

/// Game identifier as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameId {
    /// Pseudo-game: game selection screen, no simulation
    #[serde(rename = "LOBBY")]
    Lobby,
    /// Rocket shooter
    #[serde(rename = "game1")]
    Shooter,
    /// Brick breaker
    #[serde(rename = "game2")]
    Breaker,
    /// Curvy-road racing
    #[serde(rename = "game3")]
    Racing,
}

impl GameId {
    pub const PLAYABLE: [GameId; 3] = [GameId::Shooter, GameId::Breaker, GameId::Racing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "LOBBY",
            Self::Shooter => "game1",
            Self::Breaker => "game2",
            Self::Racing => "game3",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LOBBY" => Some(Self::Lobby),
            "game1" => Some(Self::Shooter),
            "game2" => Some(Self::Breaker),
            "game3" => Some(Self::Racing),
            _ => None,
        }
    }

    /// Display name shown in the lobby
    pub fn title(&self) -> &'static str {
        match self {
            Self::Lobby => "Lobby",
            Self::Shooter => "Rocket Shooter",
            Self::Breaker => "Space Brick",
            Self::Racing => "Neon Racing",
        }
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session/game status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// In the lobby, nothing to simulate
    Idle,
    /// Fresh instance waiting for a start/launch action
    Ready,
    /// Physics advancing
    Playing,
    /// Frozen, state kept
    Paused,
    /// Run ended by a collision or a miss
    GameOver,
    /// All targets cleared (brick breaker only)
    Victory,
}

impl GameStatus {
    /// Whether an in-place transition from `self` to `next` is legal.
    ///
    /// Returning to `Ready` from a terminal state is done by replacing the
    /// instance, which is why the session performs it rather than a variant.
    pub fn can_transition_to(self, next: GameStatus) -> bool {
        use GameStatus::*;
        matches!(
            (self, next),
            (Ready, Playing)
                | (Playing, Paused)
                | (Paused, Playing)
                | (Playing, GameOver)
                | (Playing, Victory)
                | (GameOver, Ready)
                | (Victory, Ready)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::GameOver | GameStatus::Victory)
    }
}

/// Discrete controller command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    FireStart,
    FireEnd,
    Shoot,
    StartGame,
    Launch,
    NitroStart,
    NitroEnd,
    RestartGame,
    Pause,
    Resume,
}

impl Action {
    /// Parse an action string; unknown actions yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fire-start" => Some(Self::FireStart),
            "fire-end" => Some(Self::FireEnd),
            "shoot" => Some(Self::Shoot),
            "start-game" => Some(Self::StartGame),
            "launch" => Some(Self::Launch),
            "nitro-start" => Some(Self::NitroStart),
            "nitro-end" => Some(Self::NitroEnd),
            "restart-game" => Some(Self::RestartGame),
            "pause" => Some(Self::Pause),
            "resume" => Some(Self::Resume),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FireStart => "fire-start",
            Self::FireEnd => "fire-end",
            Self::Shoot => "shoot",
            Self::StartGame => "start-game",
            Self::Launch => "launch",
            Self::NitroStart => "nitro-start",
            Self::NitroEnd => "nitro-end",
            Self::RestartGame => "restart-game",
            Self::Pause => "pause",
            Self::Resume => "resume",
        }
    }
}

/// Uniform contract every game variant satisfies
pub trait Simulation {
    /// Which game this instance runs
    fn game(&self) -> GameId;

    fn status(&self) -> GameStatus;

    fn score(&self) -> u64;

    /// Apply a discrete action; actions that make no sense right now are no-ops
    fn handle_action(&mut self, action: Action);

    /// Advance one fixed step of `dt` seconds using the latest control signal
    fn step(&mut self, control: ControlSignal, dt: f64);

    /// Renderable view of the live entities
    fn entities(&self) -> Vec<EntityView>;
}

/// Active simulation for a room, dispatched by game id
#[derive(Debug, Clone)]
pub enum GameInstance {
    Shooter(ShooterSim),
    Breaker(BreakerSim),
    Racing(RacingSim),
}

impl GameInstance {
    /// Build a fresh instance for `game`; the lobby has none
    pub fn create(game: GameId, seed: u64) -> Option<Self> {
        match game {
            GameId::Lobby => None,
            GameId::Shooter => Some(Self::Shooter(ShooterSim::new(ShooterConfig::default(), seed))),
            GameId::Breaker => Some(Self::Breaker(BreakerSim::new(BreakerConfig::default(), seed))),
            GameId::Racing => Some(Self::Racing(RacingSim::new(RacingConfig::default(), seed))),
        }
    }

    fn inner(&self) -> &dyn Simulation {
        match self {
            Self::Shooter(sim) => sim as &dyn Simulation,
            Self::Breaker(sim) => sim,
            Self::Racing(sim) => sim,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Simulation {
        match self {
            Self::Shooter(sim) => sim as &mut dyn Simulation,
            Self::Breaker(sim) => sim,
            Self::Racing(sim) => sim,
        }
    }
}

impl Simulation for GameInstance {
    fn game(&self) -> GameId {
        self.inner().game()
    }

    fn status(&self) -> GameStatus {
        self.inner().status()
    }

    fn score(&self) -> u64 {
        self.inner().score()
    }

    fn handle_action(&mut self, action: Action) {
        self.inner_mut().handle_action(action)
    }

    fn step(&mut self, control: ControlSignal, dt: f64) {
        self.inner_mut().step(control, dt)
    }

    fn entities(&self) -> Vec<EntityView> {
        self.inner().entities()
    }
}
