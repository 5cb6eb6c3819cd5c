//! Rocket shooter: free 2-D movement, hold-to-fire, falling meteors and
//! fire-rate power-ups.
//!
//! Arena is centred on the origin, y grows downward.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::input::ControlSignal;

use super::difficulty::DifficultyCurve;
use super::entity::{purge, Entity, EntityKind, IdGen};
use super::lifecycle::Lifecycle;
use super::{Action, EntityView, GameId, GameStatus, Simulation};

/// Shooter tunables (speeds per second, times in seconds)
#[derive(Debug, Clone)]
pub struct ShooterConfig {
    pub width: f64,
    pub height: f64,
    pub player_size: f64,
    /// Player speed at `tilt_range` degrees of tilt
    pub player_speed: f64,
    pub tilt_range: f64,
    pub bullet_width: f64,
    pub bullet_height: f64,
    pub bullet_speed: f64,
    /// Bullets appear this far above the player centre
    pub muzzle_offset: f64,
    pub initial_fire_interval: f64,
    pub min_fire_interval: f64,
    /// Fire interval multiplier per power-up
    pub fire_boost: f64,
    pub meteor_size: f64,
    pub difficulty: DifficultyCurve,
    pub powerup_size: f64,
    pub powerup_speed: f64,
    pub powerup_chance: f64,
    /// Spawned objects start this far above the top edge
    pub spawn_margin: f64,
    pub score_per_hit: u64,
    pub score_per_powerup: u64,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            player_size: 50.0,
            player_speed: 900.0,
            tilt_range: 30.0,
            bullet_width: 8.0,
            bullet_height: 20.0,
            bullet_speed: 1080.0,
            muzzle_offset: 30.0,
            initial_fire_interval: 0.8,
            min_fire_interval: 0.15,
            fire_boost: 0.9,
            meteor_size: 40.0,
            difficulty: DifficultyCurve {
                level_duration: 10.0,
                base_speed: 60.0,
                speed_step: 30.0,
                base_spawn_interval: 0.3,
                spawn_step: 0.03,
                min_spawn_interval: 0.2,
            },
            powerup_size: 30.0,
            powerup_speed: 240.0,
            powerup_chance: 0.15,
            spawn_margin: 50.0,
            score_per_hit: 100,
            score_per_powerup: 500,
        }
    }
}

/// Shooter simulation state
#[derive(Debug, Clone)]
pub struct ShooterSim {
    config: ShooterConfig,
    lifecycle: Lifecycle,
    rng: ChaCha8Rng,
    ids: IdGen,
    player: Entity,
    bullets: Vec<Entity>,
    meteors: Vec<Entity>,
    powerups: Vec<Entity>,
    fire_interval: f64,
    since_last_shot: f64,
    firing: bool,
    spawn_timer: f64,
    score: u64,
}

impl ShooterSim {
    pub fn new(config: ShooterConfig, seed: u64) -> Self {
        let mut ids = IdGen::default();
        let player = Entity::new(
            ids.next_id(),
            EntityKind::Player,
            0.0,
            0.0,
            config.player_size,
            config.player_size,
        );
        let fire_interval = config.initial_fire_interval;

        Self {
            config,
            lifecycle: Lifecycle::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            ids,
            player,
            bullets: Vec::new(),
            meteors: Vec::new(),
            powerups: Vec::new(),
            fire_interval,
            since_last_shot: f64::INFINITY,
            firing: false,
            spawn_timer: 0.0,
            score: 0,
        }
    }

    pub fn config(&self) -> &ShooterConfig {
        &self.config
    }

    /// Current delay between shots
    pub fn fire_interval(&self) -> f64 {
        self.fire_interval
    }

    pub fn player_position(&self) -> (f64, f64) {
        (self.player.x, self.player.y)
    }

    fn move_player(&mut self, control: ControlSignal, dt: f64) {
        let cfg = &self.config;
        let scale = cfg.player_speed / cfg.tilt_range * dt;
        let limit_x = cfg.width / 2.0 - cfg.player_size / 2.0;
        let limit_y = cfg.height / 2.0 - cfg.player_size / 2.0;

        self.player.x = (self.player.x + control.x * scale).clamp(-limit_x, limit_x);
        self.player.y = (self.player.y + control.y * scale).clamp(-limit_y, limit_y);
    }

    fn fire(&mut self, dt: f64) {
        self.since_last_shot += dt;
        if !self.firing || self.since_last_shot < self.fire_interval {
            return;
        }

        let cfg = &self.config;
        let bullet = Entity::new(
            self.ids.next_id(),
            EntityKind::Bullet,
            self.player.x,
            self.player.y - cfg.muzzle_offset,
            cfg.bullet_width,
            cfg.bullet_height,
        )
        .with_velocity(0.0, -cfg.bullet_speed);

        self.bullets.push(bullet);
        self.since_last_shot = 0.0;
    }

    fn spawn(&mut self, spawn_interval: f64, meteor_speed: f64, dt: f64) {
        self.spawn_timer += dt;
        if self.spawn_timer <= spawn_interval {
            return;
        }
        self.spawn_timer = 0.0;

        let cfg = &self.config;
        let x = self.rng.gen_range(-cfg.width / 2.0..cfg.width / 2.0);
        let y = -cfg.height / 2.0 - cfg.spawn_margin;

        if self.rng.gen_bool(cfg.powerup_chance.clamp(0.0, 1.0)) {
            let powerup = Entity::new(
                self.ids.next_id(),
                EntityKind::PowerUp,
                x,
                y,
                cfg.powerup_size,
                cfg.powerup_size,
            )
            .with_velocity(0.0, cfg.powerup_speed);
            self.powerups.push(powerup);
        } else {
            let meteor = Entity::new(
                self.ids.next_id(),
                EntityKind::Meteor,
                x,
                y,
                cfg.meteor_size,
                cfg.meteor_size,
            )
            .with_velocity(0.0, meteor_speed);
            self.meteors.push(meteor);
        }
    }

    /// Returns true when the player was hit
    fn resolve_collisions(&mut self) -> bool {
        // Bullets vs meteors: a bullet stops at the first meteor it hits
        for bullet in self.bullets.iter_mut().filter(|b| b.active) {
            for meteor in self.meteors.iter_mut().filter(|m| m.active) {
                if bullet.overlaps(meteor) {
                    bullet.deactivate();
                    if meteor.deactivate() {
                        self.score += self.config.score_per_hit;
                    }
                    break;
                }
            }
        }

        let crashed = self
            .meteors
            .iter()
            .any(|m| m.active && self.player.overlaps(m));

        for powerup in self.powerups.iter_mut().filter(|p| p.active) {
            if self.player.overlaps(powerup) && powerup.deactivate() {
                self.score += self.config.score_per_powerup;
                self.fire_interval =
                    (self.fire_interval * self.config.fire_boost).max(self.config.min_fire_interval);
            }
        }

        crashed
    }
}

impl Simulation for ShooterSim {
    fn game(&self) -> GameId {
        GameId::Shooter
    }

    fn status(&self) -> GameStatus {
        self.lifecycle.status()
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::StartGame => {
                if self.lifecycle.start() {
                    self.fire_interval = self.config.initial_fire_interval;
                    self.since_last_shot = f64::INFINITY;
                }
            }
            Action::FireStart | Action::Shoot => self.firing = true,
            Action::FireEnd => self.firing = false,
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
        let curve = self.config.difficulty;
        let level = curve.level(self.lifecycle.play_time());
        let meteor_speed = curve.obstacle_speed(level);
        let spawn_interval = curve.spawn_interval(level);

        self.move_player(control, dt);
        self.fire(dt);

        let top = -self.config.height / 2.0;
        for bullet in &mut self.bullets {
            bullet.advance(dt);
            if bullet.y < top {
                bullet.deactivate();
            }
        }

        self.spawn(spawn_interval, meteor_speed, dt);

        let bottom = self.config.height / 2.0;
        for falling in self.meteors.iter_mut().chain(self.powerups.iter_mut()) {
            falling.advance(dt);
            if falling.y > bottom {
                falling.deactivate();
            }
        }

        if self.resolve_collisions() {
            self.lifecycle.end(GameStatus::GameOver);
        }

        purge(&mut self.bullets);
        purge(&mut self.meteors);
        purge(&mut self.powerups);
    }

    fn entities(&self) -> Vec<EntityView> {
        std::iter::once(&self.player)
            .chain(&self.bullets)
            .chain(&self.meteors)
            .chain(&self.powerups)
            .map(EntityView::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn playing() -> ShooterSim {
        let mut sim = ShooterSim::new(ShooterConfig::default(), 42);
        sim.handle_action(Action::StartGame);
        assert_eq!(sim.status(), GameStatus::Playing);
        sim
    }

    fn meteor_at(sim: &mut ShooterSim, x: f64, y: f64) {
        let size = sim.config.meteor_size;
        let id = sim.ids.next_id();
        sim.meteors.push(Entity::new(id, EntityKind::Meteor, x, y, size, size).with_velocity(0.0, 60.0));
    }

    #[test]
    fn test_ready_does_not_simulate() {
        let mut sim = ShooterSim::new(ShooterConfig::default(), 1);
        sim.step(ControlSignal { x: 30.0, y: 0.0 }, DT);
        assert_eq!(sim.player_position(), (0.0, 0.0));
    }

    #[test]
    fn test_player_clamped_to_arena() {
        let mut sim = playing();
        for _ in 0..600 {
            sim.step(ControlSignal { x: 90.0, y: -90.0 }, DT);
            if sim.status() != GameStatus::Playing {
                break;
            }
        }
        let (x, y) = sim.player_position();
        assert!(x <= 375.0 && y >= -275.0);
    }

    #[test]
    fn test_meteor_on_player_ends_game_despite_other_hits() {
        let mut sim = playing();
        meteor_at(&mut sim, 0.0, 0.0);

        // A bullet/meteor pair elsewhere resolves in the same step
        meteor_at(&mut sim, 200.0, -200.0);
        let id = sim.ids.next_id();
        sim.bullets.push(Entity::new(id, EntityKind::Bullet, 200.0, -195.0, 8.0, 20.0));

        sim.step(ControlSignal::NEUTRAL, DT);

        assert_eq!(sim.status(), GameStatus::GameOver);
        assert_eq!(sim.score(), 100);
    }

    #[test]
    fn test_meteor_shot_on_contact_spares_player() {
        let mut sim = playing();
        meteor_at(&mut sim, 0.0, 0.0);
        let id = sim.ids.next_id();
        sim.bullets.push(Entity::new(id, EntityKind::Bullet, 0.0, 0.0, 8.0, 20.0));

        sim.step(ControlSignal::NEUTRAL, DT);

        assert_eq!(sim.status(), GameStatus::Playing);
        assert_eq!(sim.score(), 100);
    }

    #[test]
    fn test_bullet_scores_once_per_meteor() {
        let mut sim = playing();
        meteor_at(&mut sim, 100.0, -100.0);
        for offset in [0.0, 4.0] {
            let id = sim.ids.next_id();
            sim.bullets.push(Entity::new(id, EntityKind::Bullet, 100.0 + offset, -100.0, 8.0, 20.0));
        }

        sim.step(ControlSignal::NEUTRAL, DT);

        assert_eq!(sim.score(), 100);
        assert_eq!(sim.status(), GameStatus::Playing);
        // The second bullet survives; the meteor and the first bullet are purged
        assert!(sim.meteors.iter().all(|m| m.x != 100.0));
        assert_eq!(sim.bullets.len(), 1);
    }

    #[test]
    fn test_hold_fire_respects_interval() {
        let mut sim = playing();
        sim.handle_action(Action::FireStart);

        sim.step(ControlSignal::NEUTRAL, DT);
        assert_eq!(sim.bullets.len(), 1);
        assert_eq!(sim.since_last_shot, 0.0);

        // 0.8s interval: 47 more steps are not enough for a second shot
        for _ in 0..47 {
            sim.step(ControlSignal::NEUTRAL, DT);
        }
        assert!(sim.since_last_shot > 0.7);

        for _ in 0..2 {
            sim.step(ControlSignal::NEUTRAL, DT);
        }
        assert!(sim.since_last_shot < 0.1);

        sim.handle_action(Action::FireEnd);
        for _ in 0..120 {
            sim.step(ControlSignal::NEUTRAL, DT);
        }
        assert!(sim.bullets.is_empty());
        assert!(sim.since_last_shot > 1.9);
    }

    #[test]
    fn test_powerup_speeds_up_fire_with_floor() {
        let mut sim = playing();
        for _ in 0..40 {
            let id = sim.ids.next_id();
            sim.powerups.push(Entity::new(id, EntityKind::PowerUp, 0.0, 0.0, 30.0, 30.0));
            sim.step(ControlSignal::NEUTRAL, DT);
            if sim.status() != GameStatus::Playing {
                break;
            }
        }

        assert_eq!(sim.fire_interval(), sim.config.min_fire_interval);
        assert!(sim.score() >= 500);
    }

    #[test]
    fn test_inactive_entities_never_survive_a_step() {
        let mut sim = playing();
        sim.handle_action(Action::FireStart);
        for _ in 0..900 {
            sim.step(ControlSignal { x: 5.0, y: 0.0 }, DT);
            assert!(sim.bullets.iter().all(|e| e.active));
            assert!(sim.meteors.iter().all(|e| e.active));
            assert!(sim.powerups.iter().all(|e| e.active));
            if sim.status() != GameStatus::Playing {
                break;
            }
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut sim = ShooterSim::new(ShooterConfig::default(), seed);
            sim.handle_action(Action::StartGame);
            for _ in 0..300 {
                sim.step(ControlSignal { x: 3.0, y: 1.0 }, DT);
            }
            sim.entities()
        };
        assert_eq!(run(9), run(9));
    }
}
