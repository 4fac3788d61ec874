//! Top-down player body: movement intent in, resolved motion out.
//!
//! The controller owns the moving box, its z-level and velocity; each fixed
//! step it turns input intent into a displacement, lets the motion resolver
//! slide it against the grid, and handles staircase transitions between
//! z-levels.

use crate::motion::{Aabb, MotionResolver};
use crate::tilemap::{Tile, TileGrid};
use glam::Vec2;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerInput {
    /// Movement intent per axis in [-1, 1]; y is positive toward the bottom
    /// of the map.
    pub move_x: f32,
    pub move_y: f32,
    pub interact_pressed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerConfig {
    /// World units per second.
    pub speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self { speed: 140.0 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerController {
    pub aabb: Aabb,
    pub z: usize,
    pub velocity: Vec2,
    pub blocked_x: bool,
    pub blocked_y: bool,
    pub config: PlayerConfig,
}

impl PlayerController {
    pub fn new(aabb: Aabb, z: usize) -> Self {
        Self {
            aabb,
            z,
            velocity: Vec2::ZERO,
            blocked_x: false,
            blocked_y: false,
            config: PlayerConfig::default(),
        }
    }

    pub fn step(&mut self, input: PlayerInput, dt: f32, grid: &TileGrid) {
        let mut intent = Vec2::new(
            input.move_x.clamp(-1.0, 1.0),
            input.move_y.clamp(-1.0, 1.0),
        );
        // Diagonal intent must not be faster than cardinal.
        if intent.length_squared() > 1.0 {
            intent = intent.normalize();
        }
        self.velocity = intent * self.config.speed;

        let resolver = MotionResolver::new(grid, self.z);
        let slide = resolver.move_and_slide(self.aabb, self.velocity * dt);
        self.aabb = slide.aabb;
        self.blocked_x = slide.blocked_x;
        self.blocked_y = slide.blocked_y;
        if slide.blocked_x {
            self.velocity.x = 0.0;
        }
        if slide.blocked_y {
            self.velocity.y = 0.0;
        }

        if input.interact_pressed {
            self.try_staircase(grid);
        }
    }

    fn try_staircase(&mut self, grid: &TileGrid) {
        match grid.tile_at_world(self.aabb.center, self.z) {
            Tile::StaircaseUp => {
                if self.z + 1 < grid.depth() {
                    self.z += 1;
                    log::info!("Player climbed to level {}", self.z);
                } else {
                    log::debug!("Staircase up leads nowhere from level {}", self.z);
                }
            }
            Tile::StaircaseDown => {
                if self.z > 0 {
                    self.z -= 1;
                    log::info!("Player descended to level {}", self.z);
                } else {
                    log::debug!("Staircase down leads nowhere from level {}", self.z);
                }
            }
            _ => {}
        }
    }
}
