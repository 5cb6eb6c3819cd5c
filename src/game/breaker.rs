//! Brick breaker: 1-D paddle, bouncing ball, a wall of bricks.
//!
//! Origin is the arena's top-left corner. Entity positions are centres.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::input::ControlSignal;

use super::entity::{purge, Entity, EntityKind, IdGen};
use super::lifecycle::Lifecycle;
use super::{Action, EntityView, GameId, GameStatus, Simulation};

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub width: f64,
    pub height: f64,
    pub paddle_width: f64,
    pub paddle_height: f64,
    /// Top edge of the paddle
    pub paddle_top: f64,
    pub paddle_speed: f64,
    pub tilt_range: f64,
    pub ball_size: f64,
    pub ball_speed: f64,
    /// Horizontal launch component relative to `ball_speed`
    pub launch_spread: f64,
    /// Horizontal velocity per pixel of off-centre paddle contact
    pub deflection: f64,
    pub brick_rows: usize,
    pub brick_cols: usize,
    pub brick_height: f64,
    pub brick_gap: f64,
    pub brick_top_offset: f64,
    pub score_per_brick: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            paddle_width: 120.0,
            paddle_height: 20.0,
            paddle_top: 550.0,
            paddle_speed: 1080.0,
            tilt_range: 30.0,
            ball_size: 16.0,
            ball_speed: 60.0,
            launch_spread: 0.8,
            deflection: 9.0,
            brick_rows: 5,
            brick_cols: 8,
            brick_height: 30.0,
            brick_gap: 10.0,
            brick_top_offset: 50.0,
            score_per_brick: 50,
        }
    }
}

impl BreakerConfig {
    pub fn brick_width(&self) -> f64 {
        let cols = self.brick_cols.max(1) as f64;
        (self.width - (cols + 1.0) * self.brick_gap) / cols
    }

    fn paddle_y(&self) -> f64 {
        self.paddle_top + self.paddle_height / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct BreakerSim {
    config: BreakerConfig,
    lifecycle: Lifecycle,
    rng: ChaCha8Rng,
    paddle: Entity,
    ball: Entity,
    /// Row-major, as laid out
    bricks: Vec<Entity>,
    score: u64,
}

impl BreakerSim {
    pub fn new(config: BreakerConfig, seed: u64) -> Self {
        let mut ids = IdGen::default();

        let paddle = Entity::new(
            ids.next_id(),
            EntityKind::Paddle,
            config.width / 2.0,
            config.paddle_y(),
            config.paddle_width,
            config.paddle_height,
        );
        let ball = Entity::new(
            ids.next_id(),
            EntityKind::Ball,
            config.width / 2.0,
            config.paddle_top - 20.0,
            config.ball_size,
            config.ball_size,
        );

        let brick_width = config.brick_width();
        let mut bricks = Vec::with_capacity(config.brick_rows * config.brick_cols);
        for row in 0..config.brick_rows {
            for col in 0..config.brick_cols {
                let left = config.brick_gap + col as f64 * (brick_width + config.brick_gap);
                let top = config.brick_gap
                    + row as f64 * (config.brick_height + config.brick_gap)
                    + config.brick_top_offset;
                bricks.push(Entity::new(
                    ids.next_id(),
                    EntityKind::Brick,
                    left + brick_width / 2.0,
                    top + config.brick_height / 2.0,
                    brick_width,
                    config.brick_height,
                ));
            }
        }

        Self {
            config,
            lifecycle: Lifecycle::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            paddle,
            ball,
            bricks,
            score: 0,
        }
    }

    pub fn bricks_left(&self) -> usize {
        self.bricks.iter().filter(|b| b.active).count()
    }

    pub fn ball_velocity(&self) -> (f64, f64) {
        (self.ball.vx, self.ball.vy)
    }

    fn launch(&mut self) {
        if !self.lifecycle.start() {
            return;
        }
        let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let speed = self.config.ball_speed;
        self.ball.vx = sign * speed * self.config.launch_spread;
        self.ball.vy = -speed;
    }

    fn bounce_off_walls(&mut self) {
        let width = self.config.width;
        let ball = &mut self.ball;

        if ball.x <= 0.0 || ball.x >= width {
            ball.vx = -ball.vx;
            ball.x = ball.x.clamp(0.0, width);
        }
        if ball.y <= 0.0 {
            ball.vy = ball.vy.abs();
        }
    }

    fn bounce_off_paddle(&mut self) {
        if self.ball.vy > 0.0 && self.ball.overlaps(&self.paddle) {
            self.ball.vy = -self.ball.vy;
            self.ball.vx = (self.ball.x - self.paddle.x) * self.config.deflection;
        }
    }

    fn hit_brick(&mut self) {
        let ball = &self.ball;
        if let Some(brick) = self.bricks.iter_mut().find(|b| b.active && b.overlaps(ball)) {
            if brick.deactivate() {
                self.score += self.config.score_per_brick;
            }
            self.ball.vy = -self.ball.vy;
        }
    }
}

impl Simulation for BreakerSim {
    fn game(&self) -> GameId {
        GameId::Breaker
    }

    fn status(&self) -> GameStatus {
        self.lifecycle.status()
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Launch | Action::StartGame | Action::FireStart => self.launch(),
            Action::Pause => {
                self.lifecycle.pause();
            }
            Action::Resume => {
                self.lifecycle.resume();
            }
            _ => {}
        }
    }

    fn step(&mut self, control: ControlSignal, dt: f64) {
        if !self.lifecycle.is_playing() {
            return;
        }
        self.lifecycle.tick(dt);

        let cfg = &self.config;
        let half = cfg.paddle_width / 2.0;
        let shift = control.x / cfg.tilt_range * cfg.paddle_speed * dt;
        self.paddle.x = (self.paddle.x + shift).clamp(half, cfg.width - half);

        self.ball.advance(dt);
        self.bounce_off_walls();
        let fell = self.ball.y > self.config.height;

        self.bounce_off_paddle();
        self.hit_brick();

        if self.bricks.iter().all(|b| !b.active) {
            self.lifecycle.end(GameStatus::Victory);
        } else if fell {
            self.lifecycle.end(GameStatus::GameOver);
        }

        purge(&mut self.bricks);
    }

    fn entities(&self) -> Vec<EntityView> {
        [&self.paddle, &self.ball]
            .into_iter()
            .chain(&self.bricks)
            .map(EntityView::from)
            .collect()
    }
}
