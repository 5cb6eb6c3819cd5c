//! Simulated objects and the AABB test every variant collides with

use serde::{Deserialize, Serialize};

/// Entity sub-kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Bullet,
    Meteor,
    PowerUp,
    Paddle,
    Ball,
    Brick,
    Car,
    Roadblock,
}

/// A simulated box. `x`/`y` are the centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub vx: f64,
    pub vy: f64,
    /// Soft-delete flag; cleared entities stay until the end-of-step purge
    pub active: bool,
}

impl Entity {
    pub fn new(id: u32, kind: EntityKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            width,
            height,
            vx: 0.0,
            vy: 0.0,
            active: true,
        }
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    /// Integrate velocity over `dt`
    pub fn advance(&mut self, dt: f64) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
    }

    /// Mark inactive; returns false if it already was
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    /// Axis-aligned overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Entity) -> bool {
        aabb_overlap(
            self.x,
            self.y,
            self.width,
            self.height,
            other.x,
            other.y,
            other.width,
            other.height,
        )
    }
}

/// Centre-based AABB overlap test
#[allow(clippy::too_many_arguments)]
pub fn aabb_overlap(
    x1: f64,
    y1: f64,
    w1: f64,
    h1: f64,
    x2: f64,
    y2: f64,
    w2: f64,
    h2: f64,
) -> bool {
    (x1 - x2).abs() < (w1 + w2) / 2.0 && (y1 - y2).abs() < (h1 + h2) / 2.0
}

/// Remove inactive entities. Only called at the end of a step.
pub fn purge(entities: &mut Vec<Entity>) -> usize {
    let before = entities.len();
    entities.retain(|e| e.active);
    before - entities.len()
}

/// Monotonic id source for entities within one instance
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u32,
}

impl IdGen {
    pub fn next_id(&mut self) -> u32 {
        self.next = self.next.wrapping_add(1);
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_strict() {
        let a = Entity::new(1, EntityKind::Meteor, 0.0, 0.0, 10.0, 10.0);
        let touching = Entity::new(2, EntityKind::Bullet, 10.0, 0.0, 10.0, 10.0);
        let inside = Entity::new(3, EntityKind::Bullet, 9.9, 9.9, 10.0, 10.0);

        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
        assert!(inside.overlaps(&a));
    }

    #[test]
    fn test_deactivate_only_once() {
        let mut e = Entity::new(1, EntityKind::Brick, 0.0, 0.0, 1.0, 1.0);
        assert!(e.deactivate());
        assert!(!e.deactivate());
    }

    #[test]
    fn test_purge_removes_only_inactive() {
        let mut entities: Vec<Entity> = (0..5)
            .map(|i| Entity::new(i, EntityKind::Meteor, i as f64, 0.0, 1.0, 1.0))
            .collect();
        entities[1].active = false;
        entities[3].active = false;

        assert_eq!(purge(&mut entities), 2);
        assert!(entities.iter().all(|e| e.active));
        assert_eq!(entities.iter().map(|e| e.id).collect::<Vec<_>>(), vec![0, 2, 4]);
    }
}
