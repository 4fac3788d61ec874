//! Keyboard state tracking keyed by a closed key enum.
//!
//! Each key carries three independent flags:
//! - **down** — level-triggered, true every frame the key is physically held.
//! - **pressed / released** — edge-triggered, true only during the frame the
//!   transition happened. Cleared by `end_frame()`, which the main loop calls
//!   only after at least one fixed simulation step has consumed them, so a
//!   press landing on a zero-step frame is not silently lost.
//!
//! Keys are a closed enum rather than raw platform key codes, so the
//! simulation never depends on any backend's key-code magnitudes.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    W,
    A,
    S,
    D,
    E,
    R,
    Escape,
}

#[derive(Debug, Clone, Copy, Default)]
struct KeyFlags {
    down: bool,
    pressed: bool,
    released: bool,
}

#[derive(Debug, Default)]
pub struct InputState {
    keys: HashMap<Key, KeyFlags>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        let flags = self.keys.entry(key).or_default();
        // OS key repeat delivers duplicate down events for a held key.
        if !flags.down {
            flags.down = true;
            flags.pressed = true;
        }
    }

    pub fn key_up(&mut self, key: Key) {
        let flags = self.keys.entry(key).or_default();
        if flags.down {
            flags.down = false;
            flags.released = true;
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.keys.get(&key).is_some_and(|f| f.down)
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys.get(&key).is_some_and(|f| f.pressed)
    }

    pub fn is_released(&self, key: Key) -> bool {
        self.keys.get(&key).is_some_and(|f| f.released)
    }

    /// Clear edge-triggered flags at the frame boundary. Held state persists.
    pub fn end_frame(&mut self) {
        for flags in self.keys.values_mut() {
            flags.pressed = false;
            flags.released = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_down_sets_down_and_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::D);
        assert!(input.is_down(Key::D));
        assert!(input.is_pressed(Key::D));
        assert!(!input.is_released(Key::D));
    }

    #[test]
    fn key_up_clears_down_sets_released() {
        let mut input = InputState::new();
        input.key_down(Key::D);
        input.key_up(Key::D);
        assert!(!input.is_down(Key::D));
        assert!(input.is_released(Key::D));
    }

    #[test]
    fn repeated_key_down_does_not_retrigger_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::E);
        input.end_frame();
        input.key_down(Key::E);
        assert!(input.is_down(Key::E));
        assert!(!input.is_pressed(Key::E));
    }

    #[test]
    fn key_up_without_down_is_a_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::A);
        assert!(!input.is_down(Key::A));
        assert!(!input.is_released(Key::A));
    }

    #[test]
    fn end_frame_clears_edges_keeps_down() {
        let mut input = InputState::new();
        input.key_down(Key::W);
        input.key_down(Key::A);
        input.key_up(Key::A);
        input.end_frame();
        assert!(input.is_down(Key::W));
        assert!(!input.is_pressed(Key::W));
        assert!(!input.is_released(Key::A));
    }

    #[test]
    fn keys_are_tracked_independently() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.key_down(Key::Right);
        input.key_up(Key::Left);
        assert!(!input.is_down(Key::Left));
        assert!(input.is_released(Key::Left));
        assert!(input.is_down(Key::Right));
        assert!(!input.is_released(Key::Right));
    }

    #[test]
    fn default_state_reports_nothing() {
        let input = InputState::new();
        assert!(!input.is_down(Key::Escape));
        assert!(!input.is_pressed(Key::Escape));
        assert!(!input.is_released(Key::Escape));
    }
}
