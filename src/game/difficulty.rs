//! Difficulty step function

/// Difficulty curve: one level per `level_duration` seconds of play.
///
/// Levels raise obstacle speed and shorten the spawn interval, which is
/// clamped at `min_spawn_interval`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyCurve {
    pub level_duration: f64,
    pub base_speed: f64,
    pub speed_step: f64,
    pub base_spawn_interval: f64,
    pub spawn_step: f64,
    pub min_spawn_interval: f64,
}

impl DifficultyCurve {
    pub fn level(&self, play_time: f64) -> u32 {
        if self.level_duration <= 0.0 || !play_time.is_finite() || play_time <= 0.0 {
            return 0;
        }
        (play_time / self.level_duration).floor().min(u32::MAX as f64) as u32
    }

    pub fn obstacle_speed(&self, level: u32) -> f64 {
        self.base_speed + level as f64 * self.speed_step.max(0.0)
    }

    pub fn spawn_interval(&self, level: u32) -> f64 {
        (self.base_spawn_interval - level as f64 * self.spawn_step.max(0.0))
            .max(self.min_spawn_interval)
    }
}
