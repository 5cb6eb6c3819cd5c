//! Time utilities for the fixed-step simulation

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60; // 60 fixed steps per second

/// Frame time beyond this is dropped instead of replayed
pub const MAX_FRAME_LAG: Duration = Duration::from_millis(250);

/// Fixed-timestep accumulator.
///
/// Frame time goes in, a whole number of simulation steps comes out. The
/// remainder is carried to the next frame so motion never depends on how
/// often the caller happens to render.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    dt: f64,
    accumulator: Duration,
    max_lag: Duration,
}

impl FixedStep {
    /// `max_lag` bounds how much time a single frame can feed in
    pub fn new(step: Duration, max_lag: Duration) -> Self {
        Self {
            step,
            dt: step.as_secs_f64(),
            accumulator: Duration::ZERO,
            max_lag: max_lag.max(step),
        }
    }

    /// Accumulator running at `ticks_per_second`
    pub fn with_rate(ticks_per_second: u32) -> Self {
        let tps = ticks_per_second.max(1);
        let step = Duration::from_nanos(1_000_000_000 / tps as u64);

        Self {
            dt: 1.0 / tps as f64,
            ..Self::new(step, MAX_FRAME_LAG)
        }
    }

    /// Step length in seconds
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Feed elapsed frame time and return how many steps to run now
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        // Spiral of death guard
        self.accumulator += elapsed.min(self.max_lag);

        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }

        steps
    }

    /// Drop any partial step (used when a new instance starts)
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::with_rate(SIMULATION_TPS)
    }
}
