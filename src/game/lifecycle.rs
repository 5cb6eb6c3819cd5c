//! Status state machine shared by every variant

use super::GameStatus;

/// Status plus the simulated time spent playing
#[derive(Debug, Clone)]
pub struct Lifecycle {
    status: GameStatus,
    play_time: f64,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            status: GameStatus::Ready,
            play_time: 0.0,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    /// Seconds of simulated play (pauses excluded)
    pub fn play_time(&self) -> f64 {
        self.play_time
    }

    /// Apply a transition if the table allows it
    pub fn transition(&mut self, next: GameStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    pub fn start(&mut self) -> bool {
        self.status == GameStatus::Ready && self.transition(GameStatus::Playing)
    }

    pub fn pause(&mut self) -> bool {
        self.status == GameStatus::Playing && self.transition(GameStatus::Paused)
    }

    pub fn resume(&mut self) -> bool {
        self.status == GameStatus::Paused && self.transition(GameStatus::Playing)
    }

    pub fn end(&mut self, outcome: GameStatus) -> bool {
        outcome.is_terminal() && self.transition(outcome)
    }

    /// Count one step of play time
    pub fn tick(&mut self, dt: f64) {
        if self.is_playing() {
            self.play_time += dt;
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
