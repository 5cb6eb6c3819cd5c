//! Host-side session: which game runs, its status, and the restart epoch

use std::time::Duration;

use tracing::{debug, info};

use crate::game::{Action, GameId, GameInstance, GameSnapshot, GameStatus, Simulation, SnapshotBuilder};
use crate::input::ControlSignal;
use crate::util::time::FixedStep;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Owns the active simulation for one room.
///
/// Relayed events come in through [`handle_event`](Session::handle_event),
/// wall-clock time through [`advance`](Session::advance). Both return the
/// messages the host should send back to the relay.
#[derive(Debug, Clone)]
pub struct Session {
    room_id: String,
    seed: u64,
    game: GameId,
    instance: Option<GameInstance>,
    epoch: u32,
    tick: u64,
    control: ControlSignal,
    /// Controllers currently attached to the room
    controllers: u32,
    /// Last status announced to controllers
    reported: GameStatus,
    clock: FixedStep,
}

impl Session {
    pub fn new(room_id: impl Into<String>, seed: u64) -> Self {
        Self {
            room_id: room_id.into(),
            seed,
            game: GameId::Lobby,
            instance: None,
            epoch: 0,
            tick: 0,
            control: ControlSignal::NEUTRAL,
            controllers: 0,
            reported: GameStatus::Idle,
            clock: FixedStep::default(),
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn game(&self) -> GameId {
        self.game
    }

    pub fn status(&self) -> GameStatus {
        self.instance
            .as_ref()
            .map(|sim| sim.status())
            .unwrap_or(GameStatus::Idle)
    }

    pub fn score(&self) -> u64 {
        self.instance.as_ref().map(|sim| sim.score()).unwrap_or(0)
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn control(&self) -> ControlSignal {
        self.control
    }

    pub fn controller_connected(&self) -> bool {
        self.controllers > 0
    }

    /// Apply one relayed event
    pub fn handle_event(&mut self, event: ServerMsg) -> Vec<ClientMsg> {
        match event {
            ServerMsg::RoomJoined { room_id, role } => {
                info!(room_id = %room_id, role = ?role, "Session attached");
                self.room_id = room_id;
                Vec::new()
            }
            ServerMsg::UpdateGameState(sample) => {
                self.control.apply(&sample);
                Vec::new()
            }
            ServerMsg::ControllerAction(raw) => match Action::parse(&raw) {
                Some(Action::RestartGame) => {
                    self.restart();
                    self.sync_if_changed()
                }
                Some(action) => {
                    if let Some(sim) = self.instance.as_mut() {
                        sim.handle_action(action);
                    }
                    self.sync_if_changed()
                }
                None => {
                    debug!(action = %raw, "Ignoring unknown action");
                    Vec::new()
                }
            },
            ServerMsg::GameChanged(game) => {
                self.select(game);
                self.sync_if_changed()
            }
            ServerMsg::ResetGamePosition => {
                self.control = ControlSignal::NEUTRAL;
                Vec::new()
            }
            ServerMsg::ControllerConnected => {
                self.controllers += 1;
                self.reported = self.status();
                vec![self.sync_msg()]
            }
            ServerMsg::ControllerDisconnected => {
                self.controllers = self.controllers.saturating_sub(1);
                if self.controllers == 0 {
                    if let Some(sim) = self.instance.as_mut() {
                        sim.handle_action(Action::Pause);
                    }
                }
                self.sync_if_changed()
            }
            ServerMsg::SyncGameStatus(_) => Vec::new(),
        }
    }

    /// Run the fixed steps that `elapsed` wall-clock time is worth
    pub fn advance(&mut self, elapsed: Duration) -> Vec<ClientMsg> {
        let steps = self.clock.advance(elapsed);
        let dt = self.clock.dt();

        if let Some(sim) = self.instance.as_mut() {
            for _ in 0..steps {
                sim.step(self.control, dt);
                self.tick += 1;
            }
        }

        self.sync_if_changed()
    }

    /// Committed state for the render side
    pub fn snapshot(&self, builder: &SnapshotBuilder) -> GameSnapshot {
        builder.build(
            self.tick,
            self.epoch,
            self.controller_connected(),
            self.instance.as_ref(),
        )
    }

    /// Switch games. The lobby has no instance; a game starts fresh at epoch 0.
    fn select(&mut self, game: GameId) {
        self.game = game;
        self.epoch = 0;
        self.replace_instance();
        info!(room_id = %self.room_id, game = %game, "Game selected");
    }

    /// Throw the current instance away and start the same game again
    fn restart(&mut self) {
        if self.game == GameId::Lobby {
            return;
        }
        self.epoch += 1;
        self.replace_instance();
        info!(room_id = %self.room_id, game = %self.game, epoch = self.epoch, "Game restarted");
    }

    fn replace_instance(&mut self) {
        let seed = self.seed.wrapping_add(self.epoch as u64);
        self.instance = GameInstance::create(self.game, seed);
        self.tick = 0;
        self.clock.reset();
    }

    fn sync_msg(&self) -> ClientMsg {
        ClientMsg::SyncGameStatus {
            room_id: self.room_id.clone(),
            status: self.status(),
        }
    }

    fn sync_if_changed(&mut self) -> Vec<ClientMsg> {
        let status = self.status();
        if status == self.reported {
            return Vec::new();
        }
        debug!(room_id = %self.room_id, from = ?self.reported, to = ?status, "Status changed");
        self.reported = status;
        vec![self.sync_msg()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::GyroSample;

    fn session_with(game: GameId) -> Session {
        let mut session = Session::new("r1", 99);
        session.handle_event(ServerMsg::GameChanged(game));
        session
    }

    fn action(session: &mut Session, name: &str) -> Vec<ClientMsg> {
        session.handle_event(ServerMsg::ControllerAction(name.into()))
    }

    fn synced(status: GameStatus) -> Vec<ClientMsg> {
        vec![ClientMsg::SyncGameStatus {
            room_id: "r1".into(),
            status,
        }]
    }

    #[test]
    fn test_select_game_resets_to_ready() {
        let mut session = Session::new("r1", 1);
        assert_eq!(session.status(), GameStatus::Idle);

        let out = session.handle_event(ServerMsg::GameChanged(GameId::Shooter));
        assert_eq!(out, synced(GameStatus::Ready));
        assert_eq!(session.score(), 0);
        assert_eq!(session.epoch(), 0);

        let out = session.handle_event(ServerMsg::GameChanged(GameId::Lobby));
        assert_eq!(out, synced(GameStatus::Idle));
        assert_eq!(session.game(), GameId::Lobby);
    }

    #[test]
    fn test_restart_bumps_epoch_with_fresh_instance() {
        let mut session = session_with(GameId::Racing);
        action(&mut session, "start-game");
        session.advance(Duration::from_secs(2));
        session.advance(Duration::from_secs(2));
        assert!(session.tick() > 0);

        let out = action(&mut session, "restart-game");
        assert_eq!(out, synced(GameStatus::Ready));
        assert_eq!(session.epoch(), 1);
        assert_eq!(session.tick(), 0);
        assert_eq!(session.score(), 0);

        // A new selection starts the epoch count over
        session.handle_event(ServerMsg::GameChanged(GameId::Breaker));
        assert_eq!(session.epoch(), 0);
    }

    #[test]
    fn test_restart_in_lobby_is_ignored() {
        let mut session = Session::new("r1", 1);
        assert!(action(&mut session, "restart-game").is_empty());
        assert_eq!(session.epoch(), 0);
    }

    #[test]
    fn test_start_and_unknown_actions() {
        let mut session = session_with(GameId::Breaker);
        assert!(action(&mut session, "self-destruct").is_empty());
        assert_eq!(action(&mut session, "launch"), synced(GameStatus::Playing));
        // Already playing: nothing new to report
        assert!(action(&mut session, "launch").is_empty());
    }

    #[test]
    fn test_controller_drop_forces_pause() {
        let mut session = session_with(GameId::Shooter);
        session.handle_event(ServerMsg::ControllerConnected);
        action(&mut session, "start-game");

        let out = session.handle_event(ServerMsg::ControllerDisconnected);
        assert_eq!(out, synced(GameStatus::Paused));
        assert!(!session.controller_connected());

        let out = session.handle_event(ServerMsg::ControllerConnected);
        assert_eq!(out, synced(GameStatus::Paused));
        assert_eq!(action(&mut session, "resume"), synced(GameStatus::Playing));
    }

    #[test]
    fn test_remaining_controller_keeps_game_running() {
        let mut session = session_with(GameId::Shooter);
        session.handle_event(ServerMsg::ControllerConnected);
        session.handle_event(ServerMsg::ControllerConnected);
        action(&mut session, "start-game");

        assert!(session.handle_event(ServerMsg::ControllerDisconnected).is_empty());
        assert!(session.controller_connected());
        assert_eq!(session.status(), GameStatus::Playing);
        assert!(session.snapshot(&SnapshotBuilder::new(1)).controller_connected);

        let out = session.handle_event(ServerMsg::ControllerDisconnected);
        assert_eq!(out, synced(GameStatus::Paused));
        assert!(!session.controller_connected());

        // A stray notice never underflows
        session.handle_event(ServerMsg::ControllerDisconnected);
        session.handle_event(ServerMsg::ControllerConnected);
        assert!(session.controller_connected());
    }

    #[test]
    fn test_tilt_buffer_and_reset() {
        let mut session = session_with(GameId::Shooter);
        session.handle_event(ServerMsg::UpdateGameState(GyroSample::new(None, Some(-5.0), Some(12.0))));
        assert_eq!(session.control(), ControlSignal { x: 12.0, y: -5.0 });

        session.handle_event(ServerMsg::UpdateGameState(GyroSample::new(None, None, Some(3.0))));
        assert_eq!(session.control(), ControlSignal { x: 3.0, y: -5.0 });

        session.handle_event(ServerMsg::ResetGamePosition);
        assert_eq!(session.control(), ControlSignal::NEUTRAL);
    }

    #[test]
    fn test_advance_is_fixed_step() {
        let mut session = session_with(GameId::Racing);
        action(&mut session, "start-game");

        for _ in 0..30 {
            session.advance(Duration::from_millis(5));
        }
        // 150ms is 9 whole steps of 16.666ms
        assert_eq!(session.tick(), 9);

        // One huge frame only replays 250ms
        session.advance(Duration::from_secs(5));
        assert_eq!(session.tick(), 24);
    }

    #[test]
    fn test_low_frame_rate_keeps_physics_at_60hz() {
        let mut session = session_with(GameId::Racing);
        action(&mut session, "start-game");

        for _ in 0..10 {
            session.advance(Duration::from_millis(100));
        }
        assert_eq!(session.tick(), 60);
    }

    #[test]
    fn test_paused_session_does_not_tick_physics() {
        let mut session = session_with(GameId::Breaker);
        action(&mut session, "launch");
        action(&mut session, "pause");

        let builder = SnapshotBuilder::new(1);
        let before = session.snapshot(&builder).entities;
        session.advance(Duration::from_millis(100));
        assert_eq!(session.snapshot(&builder).entities, before);
    }

    #[test]
    fn test_crash_reports_game_over() {
        let mut session = session_with(GameId::Racing);
        action(&mut session, "start-game");
        session.handle_event(ServerMsg::UpdateGameState(GyroSample::new(None, None, Some(36.0))));

        let mut reports = Vec::new();
        for _ in 0..100 {
            reports.extend(session.advance(Duration::from_millis(50)));
        }
        assert_eq!(reports, synced(GameStatus::GameOver));
    }
}
