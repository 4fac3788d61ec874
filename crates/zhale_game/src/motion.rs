//! Swept-motion resolution against the tile grid.
//!
//! The resolver answers one question per simulation step: how far along its
//! displacement can an axis-aligned box travel before hitting a solid tile?
//! The sweep enumerates the tiles the box could touch, runs a
//! Minkowski-expanded slab test against each solid one, and keeps the
//! earliest time of impact. Callers then apply `delta * t` and slide the
//! remainder along the wall.
//!
//! Sweep-only semantics: a box that already overlaps a solid tile at the
//! start of the step is not pushed out — entry times below zero are skipped.
//! The grid's out-of-bounds-reads-as-wall rule makes the edge of the world
//! impassable without any special casing here.

use crate::geometry::segment_intersection;
use crate::tilemap::TileGrid;
use glam::Vec2;

/// Contact back-off in world units. Applied motion stops just short of the
/// struck face so the next step's sweep starts strictly outside the tile.
const SKIN: f32 = 1e-3;

#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }
}

/// Face of the solid tile that was struck. Top is the face with the smaller
/// world y (y-down convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// True for Left/Right — a face that blocks motion along x.
    pub fn blocks_x(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionResult {
    /// Fraction of the displacement that is free of contact; 1.0 means the
    /// whole displacement can be applied.
    pub t: f32,
    /// Box center at the moment of impact, when there is one.
    pub contact: Option<Vec2>,
    pub side: Option<Side>,
}

impl CollisionResult {
    fn unobstructed() -> Self {
        Self {
            t: 1.0,
            contact: None,
            side: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SlideResult {
    pub aabb: Aabb,
    pub blocked_x: bool,
    pub blocked_y: bool,
}

/// Pure queries over a borrowed grid and the z-level the body occupies.
pub struct MotionResolver<'a> {
    grid: &'a TileGrid,
    z: usize,
}

impl<'a> MotionResolver<'a> {
    pub fn new(grid: &'a TileGrid, z: usize) -> Self {
        Self { grid, z }
    }

    /// Integer cells covered by the union of the start and end boxes,
    /// normalized to min/max corners first so negative displacement is
    /// symmetric, emitted row-major (y ascending, then x ascending).
    pub fn swept_tiles(&self, aabb: Aabb, delta: Vec2) -> Vec<(i32, i32)> {
        let lo = aabb.min().min(aabb.min() + delta);
        let hi = aabb.max().max(aabb.max() + delta);

        let x0 = self.grid.world_to_cell_x(lo.x);
        let x1 = self.grid.world_to_cell_x(hi.x);
        let y0 = self.grid.world_to_cell_y(lo.y);
        let y1 = self.grid.world_to_cell_y(hi.y);

        let mut cells = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)).max(0) as usize);
        for y in y0..=y1 {
            for x in x0..=x1 {
                cells.push((x, y));
            }
        }
        cells
    }

    /// Earliest time of impact along `delta` against any solid swept tile.
    pub fn resolve(&self, aabb: Aabb, delta: Vec2) -> CollisionResult {
        if delta == Vec2::ZERO {
            return CollisionResult::unobstructed();
        }

        let mut best: Option<(f32, Side, (i32, i32))> = None;
        for (tx, ty) in self.swept_tiles(aabb, delta) {
            if !self.grid.is_solid(tx, ty, self.z) {
                continue;
            }
            if let Some((entry, side)) = self.slab_entry(aabb, delta, tx, ty) {
                if best.is_none_or(|(t, _, _)| entry < t) {
                    best = Some((entry, side, (tx, ty)));
                }
            }
        }

        let Some((t, side, cell)) = best else {
            return CollisionResult::unobstructed();
        };
        let contact = self
            .contact_point(aabb, delta, side, cell)
            .or(Some(aabb.center + delta * t));
        CollisionResult {
            t,
            contact,
            side: Some(side),
        }
    }

    /// Apply the resolved motion: advance to the impact point (backed off by
    /// `SKIN`), then resolve the remaining displacement once more with the
    /// blocked axis zeroed — slide along the wall instead of stopping dead.
    pub fn move_and_slide(&self, aabb: Aabb, delta: Vec2) -> SlideResult {
        let first = self.resolve(aabb, delta);
        let mut out = aabb;
        out.center += delta * applied_t(first.t, delta);

        let mut blocked_x = false;
        let mut blocked_y = false;
        if let Some(side) = first.side {
            let remaining = if side.blocks_x() {
                blocked_x = true;
                Vec2::new(0.0, delta.y * (1.0 - first.t))
            } else {
                blocked_y = true;
                Vec2::new(delta.x * (1.0 - first.t), 0.0)
            };

            if remaining != Vec2::ZERO {
                let second = self.resolve(out, remaining);
                out.center += remaining * applied_t(second.t, remaining);
                if let Some(side) = second.side {
                    if side.blocks_x() {
                        blocked_x = true;
                    } else {
                        blocked_y = true;
                    }
                }
            }
        }

        SlideResult {
            aabb: out,
            blocked_x,
            blocked_y,
        }
    }

    /// Slab test of the center ray against the tile box expanded by the
    /// moving box's half-extents.
    fn slab_entry(&self, aabb: Aabb, delta: Vec2, tx: i32, ty: i32) -> Option<(f32, Side)> {
        let min = Vec2::new(
            self.grid.cell_left_world(tx) - aabb.half.x,
            self.grid.cell_top_world(ty) - aabb.half.y,
        );
        let max = Vec2::new(
            self.grid.cell_right_world(tx) + aabb.half.x,
            self.grid.cell_bottom_world(ty) + aabb.half.y,
        );

        let (entry_x, exit_x) = axis_slab(aabb.center.x, delta.x, min.x, max.x)?;
        let (entry_y, exit_y) = axis_slab(aabb.center.y, delta.y, min.y, max.y)?;
        let entry = entry_x.max(entry_y);
        let exit = exit_x.min(exit_y);

        if entry >= exit || entry < 0.0 || entry >= 1.0 {
            return None;
        }

        // The later axis entry is the face actually struck; ties at exact
        // corners fall to the vertical face.
        let side = if entry_x >= entry_y {
            if delta.x > 0.0 {
                Side::Left
            } else {
                Side::Right
            }
        } else if delta.y > 0.0 {
            Side::Top
        } else {
            Side::Bottom
        };
        Some((entry, side))
    }

    /// Contact point from the center path against the expanded struck face.
    fn contact_point(&self, aabb: Aabb, delta: Vec2, side: Side, cell: (i32, i32)) -> Option<Vec2> {
        let (tx, ty) = cell;
        let min = Vec2::new(
            self.grid.cell_left_world(tx) - aabb.half.x,
            self.grid.cell_top_world(ty) - aabb.half.y,
        );
        let max = Vec2::new(
            self.grid.cell_right_world(tx) + aabb.half.x,
            self.grid.cell_bottom_world(ty) + aabb.half.y,
        );

        let (face_a, face_b) = match side {
            Side::Left => (min, Vec2::new(min.x, max.y)),
            Side::Right => (Vec2::new(max.x, min.y), max),
            Side::Top => (min, Vec2::new(max.x, min.y)),
            Side::Bottom => (Vec2::new(min.x, max.y), max),
        };
        segment_intersection(aabb.center, aabb.center + delta, face_a, face_b)
    }
}

fn axis_slab(center: f32, delta: f32, min: f32, max: f32) -> Option<(f32, f32)> {
    if delta == 0.0 {
        // Flush contact along a face does not collide; it is what sliding
        // along a wall looks like.
        if center <= min || center >= max {
            return None;
        }
        return Some((f32::NEG_INFINITY, f32::INFINITY));
    }
    let t1 = (min - center) / delta;
    let t2 = (max - center) / delta;
    Some((t1.min(t2), t1.max(t2)))
}

fn applied_t(t: f32, delta: Vec2) -> f32 {
    if t >= 1.0 {
        return 1.0;
    }
    let len = delta.length();
    if len <= f32::EPSILON {
        return 0.0;
    }
    (t - SKIN / len).max(0.0)
}
