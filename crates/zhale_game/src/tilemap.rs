//! The 3-layer tile grid: gameplay truth for the level.
//!
//! A grid is an ordered stack of equally-sized 2D layers (z-levels), each a
//! row-major array of tile kinds, plus the world-space geometry parameters
//! (tile size, origin) the level format does not embed. Both grid and world
//! space are **y-down**: row 0 is the top of the map.
//!
//! All queries are total. Coordinates outside the grid — including a bad
//! z-level — resolve to `Wall`, so the motion resolver always gets a
//! well-defined "impassable" answer instead of an error path.

use glam::Vec2;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Void,
    Wall,
    Floor,
    StaircaseUp,
    StaircaseDown,
}

#[derive(Debug, Clone)]
pub struct TileLayer {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileLayer {
    pub fn new(width: u32, height: u32, tiles: Vec<Tile>) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!(
                "Layer validation failed: dimensions must be non-zero, got {width}x{height}"
            ));
        }
        let expected = (width as usize) * (height as usize);
        if tiles.len() != expected {
            return Err(format!(
                "Layer validation failed: {width}x{height} layer needs {expected} tiles, got {}",
                tiles.len()
            ));
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn tile(&self, x: u32, y: u32) -> Tile {
        self.tiles[(y as usize) * (self.width as usize) + (x as usize)]
    }
}

#[derive(Debug, Clone)]
pub struct TileGrid {
    layers: Vec<TileLayer>,
    tile_size: f32,
    origin: Vec2,
}

impl TileGrid {
    /// Build a grid from pre-decoded layers. Every layer must share the same
    /// dimensions; the resulting grid is immutable and never empty.
    pub fn from_layers(layers: Vec<TileLayer>, tile_size: f32, origin: Vec2) -> Result<Self, String> {
        if layers.is_empty() {
            return Err("Grid validation failed: no layers".to_string());
        }
        if !(tile_size > 0.0) {
            return Err(format!(
                "Grid validation failed: tile_size must be > 0, got {tile_size}"
            ));
        }
        let (w, h) = (layers[0].width, layers[0].height);
        for (z, layer) in layers.iter().enumerate() {
            if layer.width != w || layer.height != h {
                return Err(format!(
                    "Grid validation failed: layer {z} is {}x{}, expected {w}x{h}",
                    layer.width, layer.height
                ));
            }
        }
        Ok(Self {
            layers,
            tile_size,
            origin,
        })
    }

    pub fn width(&self) -> u32 {
        self.layers[0].width
    }

    pub fn height(&self) -> u32 {
        self.layers[0].height
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Tile at integer grid coordinates. Out-of-range coordinates (any axis,
    /// including z) read as `Wall` so the edge of the world is impassable.
    pub fn get(&self, x: i32, y: i32, z: usize) -> Tile {
        let Some(layer) = self.layers.get(z) else {
            return Tile::Wall;
        };
        if x < 0 || y < 0 || x as u32 >= layer.width || y as u32 >= layer.height {
            return Tile::Wall;
        }
        layer.tile(x as u32, y as u32)
    }

    pub fn is_solid(&self, x: i32, y: i32, z: usize) -> bool {
        self.get(x, y, z) == Tile::Wall
    }

    /// Tile under a world-space point.
    pub fn tile_at_world(&self, point: Vec2, z: usize) -> Tile {
        self.get(self.world_to_cell_x(point.x), self.world_to_cell_y(point.y), z)
    }

    pub fn world_to_cell_x(&self, world_x: f32) -> i32 {
        ((world_x - self.origin.x) / self.tile_size).floor() as i32
    }

    pub fn world_to_cell_y(&self, world_y: f32) -> i32 {
        ((world_y - self.origin.y) / self.tile_size).floor() as i32
    }

    pub fn cell_left_world(&self, x: i32) -> f32 {
        self.origin.x + (x as f32) * self.tile_size
    }

    pub fn cell_right_world(&self, x: i32) -> f32 {
        self.origin.x + ((x + 1) as f32) * self.tile_size
    }

    /// y-down: the top face has the smaller world y.
    pub fn cell_top_world(&self, y: i32) -> f32 {
        self.origin.y + (y as f32) * self.tile_size
    }

    pub fn cell_bottom_world(&self, y: i32) -> f32 {
        self.origin.y + ((y + 1) as f32) * self.tile_size
    }
}
