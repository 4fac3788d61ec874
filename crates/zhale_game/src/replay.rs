//! Recorded-input replay fixtures: a JSON list of intent frames with repeat
//! counts, expanded into per-step `PlayerInput` values. Test-only — used to
//! prove the simulation is deterministic without a live window.

use crate::controller::PlayerInput;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub move_y: f32,
    #[serde(default)]
    pub interact_pressed: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<PlayerInput> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(PlayerInput {
                    move_x: frame.move_x.clamp(-1.0, 1.0),
                    move_y: frame.move_y.clamp(-1.0, 1.0),
                    interact_pressed: frame.interact_pressed,
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::PlayerController;
    use crate::level::grid_from_ascii;
    use crate::motion::Aabb;
    use glam::Vec2;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "zhale_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "move_x": 1.0, "repeat": 3 },
                { "move_y": -1.0, "interact_pressed": true }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].move_x, 1.0);
        assert!(expanded[3].interact_pressed);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_empty_frame_list() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");

        let err = load_replay_from_path(&path).expect_err("empty frames should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "move_x": 1.0, "repeat": 90 },
                { "move_x": 1.0, "move_y": 1.0, "repeat": 60 },
                { "move_x": -1.0, "repeat": 30 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let inputs = replay.expanded_inputs();
        let grid = grid_from_ascii(
            &[&["########", "#......#", "#..##..#", "#......#", "########"]],
            32.0,
            Vec2::ZERO,
        )
        .expect("grid");
        let start = Aabb::new(Vec2::new(48.0, 48.0), Vec2::splat(11.0));

        let mut run_a = PlayerController::new(start, 0);
        let mut run_b = PlayerController::new(start, 0);
        for input in &inputs {
            run_a.step(*input, replay.fixed_dt, &grid);
        }
        for input in &inputs {
            run_b.step(*input, replay.fixed_dt, &grid);
        }

        assert!((run_a.aabb.center - run_b.aabb.center).length() < 1e-5);
        assert_eq!(run_a.z, run_b.z);
        assert_eq!(run_a.blocked_x, run_b.blocked_x);

        let _ = fs::remove_file(path);
    }
}
