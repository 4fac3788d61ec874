//! Color-to-tile palette for image-based levels.
//!
//! The palette is an explicit value passed into the loader rather than a
//! compiled-in table, so tests and tools can substitute synthetic palettes.
//! Unmapped colors resolve to `Void` — level art can carry annotations
//! (spawn markers, notes) without breaking the load.

use crate::tilemap::Tile;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<([u8; 3], Tile)>,
}

impl Palette {
    pub fn new(entries: Vec<([u8; 3], Tile)>) -> Result<Self, String> {
        for (i, (color, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(c, _)| c == color) {
                return Err(format!(
                    "Palette validation failed: duplicate color #{:02x}{:02x}{:02x}",
                    color[0], color[1], color[2]
                ));
            }
        }
        Ok(Self { entries })
    }

    pub fn resolve(&self, rgb: [u8; 3]) -> Tile {
        self.entries
            .iter()
            .find(|(color, _)| *color == rgb)
            .map(|(_, tile)| *tile)
            .unwrap_or(Tile::Void)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: vec![
                ([255, 255, 255], Tile::Floor),
                ([0, 0, 0], Tile::Wall),
                ([255, 0, 255], Tile::StaircaseDown),
                ([0, 255, 255], Tile::StaircaseUp),
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct PaletteFile {
    version: String,
    entries: Vec<PaletteFileEntry>,
}

#[derive(Debug, Deserialize)]
struct PaletteFileEntry {
    color: String,
    tile: Tile,
}

pub fn load_palette_from_path(path: &Path) -> Result<Palette, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let file: PaletteFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse palette JSON {}: {e}", path.display()))?;
    log::debug!(
        "Palette {} ({}): {} entries",
        path.display(),
        file.version,
        file.entries.len()
    );

    let mut entries = Vec::with_capacity(file.entries.len());
    for entry in &file.entries {
        entries.push((parse_hex_color(&entry.color)?, entry.tile));
    }
    Palette::new(entries)
}

fn parse_hex_color(text: &str) -> Result<[u8; 3], String> {
    let hex = text.strip_prefix('#').unwrap_or(text);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "Palette validation failed: '{text}' is not a #rrggbb color"
        ));
    }
    let mut rgb = [0u8; 3];
    for (i, byte) in rgb.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|e| format!("Palette validation failed: '{text}': {e}"))?;
    }
    Ok(rgb)
}
