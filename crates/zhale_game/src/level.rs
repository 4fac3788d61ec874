//! Level loading: one PNG per z-level, pixel colors mapped to tiles.
//!
//! Layer files share a base path and carry a 1-based numeric suffix:
//! `maps/crypt1.png`, `maps/crypt2.png`, … Loading walks suffixes upward
//! until the first missing file. The format embeds nothing but pixels;
//! tile size and world origin are runtime parameters.
//!
//! There is no partial-layer recovery: any decode failure or dimension
//! mismatch fails the whole load and the caller decides what to do
//! (the engine shell falls back to a built-in level).

use crate::palette::Palette;
use crate::tilemap::{Tile, TileGrid, TileLayer};
use glam::Vec2;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub fn layer_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!("{index}.png"));
    PathBuf::from(name)
}

pub fn load_grid_from_path(
    base: &Path,
    palette: &Palette,
    tile_size: f32,
    origin: Vec2,
) -> Result<TileGrid, String> {
    let mut layers = Vec::new();
    let mut index = 1;
    loop {
        let path = layer_path(base, index);
        if !path.exists() {
            break;
        }
        layers.push(decode_layer(&path, palette)?);
        index += 1;
    }

    if layers.is_empty() {
        return Err(format!(
            "Failed to find level layer {}",
            layer_path(base, 1).display()
        ));
    }
    log::info!(
        "Level '{}': {} layer(s), {}x{}",
        base.display(),
        layers.len(),
        layers[0].width(),
        layers[0].height()
    );
    TileGrid::from_layers(layers, tile_size, origin)
}

fn decode_layer(path: &Path, palette: &Palette) -> Result<TileLayer, String> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to decode level layer {}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = image.dimensions();

    let mut tiles = Vec::with_capacity((width as usize) * (height as usize));
    for pixel in image.pixels() {
        tiles.push(palette.resolve(pixel.0));
    }
    TileLayer::new(width, height, tiles)
        .map_err(|e| format!("Level layer {}: {e}", path.display()))
}

/// Build a grid from ASCII art, one string slice per row, one outer slice per
/// z-level. Used for the built-in fallback level and as a test fixture
/// builder. `#` wall, `.` floor, `<` staircase up, `>` staircase down,
/// space void.
pub fn grid_from_ascii(
    layers: &[&[&str]],
    tile_size: f32,
    origin: Vec2,
) -> Result<TileGrid, String> {
    let mut decoded = Vec::with_capacity(layers.len());
    for (z, rows) in layers.iter().enumerate() {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0) as u32;
        let mut tiles = Vec::with_capacity((width as usize) * (height as usize));
        for row in rows.iter() {
            if row.chars().count() as u32 != width {
                return Err(format!(
                    "ASCII layer {z}: ragged row '{row}', expected width {width}"
                ));
            }
            for ch in row.chars() {
                tiles.push(match ch {
                    '#' => Tile::Wall,
                    '.' => Tile::Floor,
                    '<' => Tile::StaircaseUp,
                    '>' => Tile::StaircaseDown,
                    ' ' => Tile::Void,
                    other => return Err(format!("ASCII layer {z}: unknown tile char '{other}'")),
                });
            }
        }
        decoded.push(TileLayer::new(width, height, tiles).map_err(|e| format!("ASCII layer {z}: {e}"))?);
    }
    TileGrid::from_layers(decoded, tile_size, origin)
}

const FALLBACK_LAYERS: &[&[&str]] = &[
    &[
        "############",
        "#..........#",
        "#..##......#",
        "#..##...>..#",
        "#..........#",
        "#....#.....#",
        "#....#.....#",
        "#..........#",
        "############",
    ],
    &[
        "############",
        "#......#...#",
        "#......#...#",
        "#.......<..#",
        "#..........#",
        "#...###....#",
        "#..........#",
        "#..........#",
        "############",
    ],
];

/// Built-in two-level map used when no level files are found on disk.
pub fn fallback_grid(tile_size: f32) -> TileGrid {
    grid_from_ascii(FALLBACK_LAYERS, tile_size, Vec2::ZERO)
        .expect("built-in fallback level is well-formed")
}

/// Polls the mtimes of every layer file under a base path and latches once
/// per observed change, so the engine can hot-reload edited level art at a
/// frame boundary.
pub struct LevelWatcher {
    base: PathBuf,
    last_seen: Vec<Option<SystemTime>>,
}

impl LevelWatcher {
    pub fn new(base: PathBuf) -> Self {
        let last_seen = observed_mtimes(&base);
        Self { base, last_seen }
    }

    pub fn should_reload(&mut self) -> bool {
        let current = observed_mtimes(&self.base);
        let mut changed = current.len() != self.last_seen.len();
        if !changed {
            for (old, new) in self.last_seen.iter().zip(&current) {
                // Any observed difference counts, including an mtime that
                // moved backwards (file replaced with an older copy).
                changed = match (old, new) {
                    (Some(old), Some(new)) => new != old,
                    (None, Some(_)) => true,
                    _ => false,
                };
                if changed {
                    break;
                }
            }
        }
        if changed {
            self.last_seen = current;
        }
        changed
    }
}

fn observed_mtimes(base: &Path) -> Vec<Option<SystemTime>> {
    let mut times = Vec::new();
    let mut index = 1;
    loop {
        let path = layer_path(base, index);
        if !path.exists() {
            break;
        }
        times.push(modified_time(&path));
        index += 1;
    }
    times
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::time::UNIX_EPOCH;

    fn temp_base(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "zhale_level_test_{}_{}_{}",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_layer_png(base: &Path, index: usize, pixels: &[&[[u8; 3]]]) {
        let height = pixels.len() as u32;
        let width = pixels[0].len() as u32;
        let mut image = RgbImage::new(width, height);
        for (y, row) in pixels.iter().enumerate() {
            for (x, rgb) in row.iter().enumerate() {
                image.put_pixel(x as u32, y as u32, Rgb(*rgb));
            }
        }
        image
            .save(layer_path(base, index))
            .expect("write temp level layer");
    }

    fn remove_layers(base: &Path) {
        let mut index = 1;
        while layer_path(base, index).exists() {
            let _ = fs::remove_file(layer_path(base, index));
            index += 1;
        }
    }

    const WHITE: [u8; 3] = [255, 255, 255];
    const BLACK: [u8; 3] = [0, 0, 0];
    const MAGENTA: [u8; 3] = [255, 0, 255];
    const TEAL: [u8; 3] = [0, 255, 255];

    #[test]
    fn palette_colors_round_trip_through_png() {
        let base = temp_base("round_trip");
        // All four known colors plus an unmapped fifth.
        write_layer_png(
            &base,
            1,
            &[&[WHITE, BLACK], &[MAGENTA, TEAL], &[[17, 99, 203], WHITE]],
        );

        let grid = load_grid_from_path(&base, &Palette::default(), 16.0, Vec2::ZERO)
            .expect("level should load");
        assert_eq!(grid.get(0, 0, 0), Tile::Floor);
        assert_eq!(grid.get(1, 0, 0), Tile::Wall);
        assert_eq!(grid.get(0, 1, 0), Tile::StaircaseDown);
        assert_eq!(grid.get(1, 1, 0), Tile::StaircaseUp);
        assert_eq!(grid.get(0, 2, 0), Tile::Void);
        assert_eq!(grid.get(1, 2, 0), Tile::Floor);

        remove_layers(&base);
    }

    #[test]
    fn numeric_suffixes_stack_into_z_levels() {
        let base = temp_base("stack");
        write_layer_png(&base, 1, &[&[WHITE, WHITE]]);
        write_layer_png(&base, 2, &[&[BLACK, WHITE]]);

        let grid = load_grid_from_path(&base, &Palette::default(), 16.0, Vec2::ZERO)
            .expect("level should load");
        assert_eq!(grid.depth(), 2);
        assert_eq!(grid.get(0, 0, 0), Tile::Floor);
        assert_eq!(grid.get(0, 0, 1), Tile::Wall);

        remove_layers(&base);
    }

    #[test]
    fn missing_first_layer_fails_the_load() {
        let base = temp_base("missing");
        let err = load_grid_from_path(&base, &Palette::default(), 16.0, Vec2::ZERO)
            .expect_err("missing level should fail");
        assert!(err.contains("Failed to find level layer"));
    }

    #[test]
    fn mismatched_layer_dimensions_fail_the_load() {
        let base = temp_base("mismatch");
        write_layer_png(&base, 1, &[&[WHITE, WHITE]]);
        write_layer_png(&base, 2, &[&[WHITE]]);

        let err = load_grid_from_path(&base, &Palette::default(), 16.0, Vec2::ZERO)
            .expect_err("mismatched layers should fail");
        assert!(err.contains("expected 2x1"));

        remove_layers(&base);
    }

    #[test]
    fn custom_palette_overrides_default_mapping() {
        let base = temp_base("custom_palette");
        write_layer_png(&base, 1, &[&[[10, 20, 30], WHITE]]);
        let palette = Palette::new(vec![([10, 20, 30], Tile::Wall)]).expect("palette");

        let grid =
            load_grid_from_path(&base, &palette, 16.0, Vec2::ZERO).expect("level should load");
        assert_eq!(grid.get(0, 0, 0), Tile::Wall);
        // White is not in the custom palette, so it falls through to Void.
        assert_eq!(grid.get(1, 0, 0), Tile::Void);

        remove_layers(&base);
    }

    #[test]
    fn ascii_grid_builds_expected_tiles() {
        let grid = grid_from_ascii(
            &[&["#.#", ".<>", "# ."]],
            32.0,
            Vec2::ZERO,
        )
        .expect("ascii grid");
        assert_eq!(grid.get(0, 0, 0), Tile::Wall);
        assert_eq!(grid.get(1, 0, 0), Tile::Floor);
        assert_eq!(grid.get(1, 1, 0), Tile::StaircaseUp);
        assert_eq!(grid.get(2, 1, 0), Tile::StaircaseDown);
        assert_eq!(grid.get(1, 2, 0), Tile::Void);
    }

    #[test]
    fn ascii_grid_rejects_unknown_chars_and_ragged_rows() {
        assert!(grid_from_ascii(&[&["#?"]], 32.0, Vec2::ZERO)
            .expect_err("unknown char")
            .contains("unknown tile char"));
        assert!(grid_from_ascii(&[&["##", "#"]], 32.0, Vec2::ZERO)
            .expect_err("ragged row")
            .contains("ragged row"));
    }

    #[test]
    fn fallback_grid_is_well_formed() {
        let grid = fallback_grid(32.0);
        assert_eq!(grid.depth(), 2);
        assert!(grid.width() > 0 && grid.height() > 0);
        // Staircases on the two levels share a column so they connect.
        assert_eq!(grid.get(8, 3, 0), Tile::StaircaseDown);
        assert_eq!(grid.get(8, 3, 1), Tile::StaircaseUp);
    }

    #[test]
    fn watcher_detects_newly_created_layer() {
        let base = temp_base("watcher");
        let mut watcher = LevelWatcher::new(base.clone());
        assert!(!watcher.should_reload(), "no files yet, nothing to reload");

        write_layer_png(&base, 1, &[&[WHITE]]);
        assert!(watcher.should_reload(), "new layer file should latch once");
        assert!(!watcher.should_reload(), "second poll without changes");

        remove_layers(&base);
        assert!(watcher.should_reload(), "removed layer counts as a change");
    }

    #[test]
    fn watcher_latches_when_mtime_moves_backwards() {
        let base = temp_base("backdate");
        write_layer_png(&base, 1, &[&[WHITE]]);
        let mut watcher = LevelWatcher::new(base.clone());
        assert!(!watcher.should_reload(), "fresh watcher starts settled");

        let file = fs::OpenOptions::new()
            .write(true)
            .open(layer_path(&base, 1))
            .expect("open layer file");
        file.set_modified(SystemTime::now() - std::time::Duration::from_secs(3600))
            .expect("backdate layer mtime");

        assert!(
            watcher.should_reload(),
            "replacing a layer with an older copy should latch"
        );
        assert!(!watcher.should_reload(), "second poll without changes");

        remove_layers(&base);
    }
}
