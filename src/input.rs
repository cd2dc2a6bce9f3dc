use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode as WinitKey;

use crate::state::CameraInput;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
}

impl KeyCode {
    pub const W: Self = Self::Character('W');
    pub const A: Self = Self::Character('A');
    pub const S: Self = Self::Character('S');
    pub const D: Self = Self::Character('D');

    /// Parses names like `"W"`, `"a"`, `"Escape"` or `"LShift"`.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphanumeric() => {
                Some(Self::Character(ch.to_ascii_uppercase()))
            }
            _ => None,
        }
    }

    pub fn from_winit(code: WinitKey) -> Option<Self> {
        let key = match code {
            WinitKey::KeyW => Self::W,
            WinitKey::KeyA => Self::A,
            WinitKey::KeyS => Self::S,
            WinitKey::KeyD => Self::D,
            WinitKey::Escape => Self::Named(NamedKey::Escape),
            WinitKey::ShiftLeft => Self::Named(NamedKey::LeftShift),
            WinitKey::ShiftRight => Self::Named(NamedKey::RightShift),
            _ => return None,
        };
        Some(key)
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Escape" | "Esc" => Escape,
        "LeftShift" | "LShift" | "Shift" => LeftShift,
        "RightShift" | "RShift" => RightShift,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Escape,
    LeftShift,
    RightShift,
}

/// Keyboard and cursor state polled once per frame.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    cursor_delta: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// Adds raw cursor motion; several events may arrive per frame.
    pub fn add_cursor_delta(&mut self, dx: f64, dy: f64) {
        self.cursor_delta.0 += dx;
        self.cursor_delta.1 += dy;
    }

    pub fn cursor_delta(&self) -> (f64, f64) {
        self.cursor_delta
    }

    /// Returns and clears the motion gathered since the last call.
    pub fn take_cursor_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.cursor_delta)
    }

    /// Drops held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys.clear();
        self.cursor_delta = (0.0, 0.0);
    }

    pub fn should_exit(&self) -> bool {
        self.is_key_down(KeyCode::Named(NamedKey::Escape))
    }

    /// Samples the camera controls, consuming the pending cursor motion.
    pub fn camera_input(&mut self) -> CameraInput {
        CameraInput {
            forward: self.is_key_down(KeyCode::W),
            back: self.is_key_down(KeyCode::S),
            left: self.is_key_down(KeyCode::A),
            right: self.is_key_down(KeyCode::D),
            fast: self.is_key_down(KeyCode::Named(NamedKey::LeftShift))
                || self.is_key_down(KeyCode::Named(NamedKey::RightShift)),
            cursor_delta: self.take_cursor_delta(),
        }
    }
}
