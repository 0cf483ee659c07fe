//! Key sampling

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keys that can be bound to a movement direction or a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    R,
    Up,
    Down,
    Left,
    Right,
    Ctrl,
    Shift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub forward: Key,
    pub back: Key,
    pub left: Key,
    pub right: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: Key::W,
            back: Key::S,
            left: Key::A,
            right: Key::D,
        }
    }
}

/// Held state of the four movement directions for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionalKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionalKeys {
    pub const NONE: Self = Self {
        forward: false,
        back: false,
        left: false,
        right: false,
    };

    pub fn forward() -> Self {
        Self { forward: true, ..Self::NONE }
    }

    pub fn back() -> Self {
        Self { back: true, ..Self::NONE }
    }

    pub fn left() -> Self {
        Self { left: true, ..Self::NONE }
    }

    pub fn right() -> Self {
        Self { right: true, ..Self::NONE }
    }

    pub fn and(self, other: Self) -> Self {
        Self {
            forward: self.forward || other.forward,
            back: self.back || other.back,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }

    /// `(right - left, forward - back)` before any scaling.
    pub fn axis(&self) -> Vec2 {
        let axis = |positive: bool, negative: bool| (positive as i8 - negative as i8) as f32;
        Vec2::new(axis(self.right, self.left), axis(self.forward, self.back))
    }
}

/// Anything that can report directional key state once per tick.
pub trait KeySource {
    fn directional_keys(&self, bindings: &KeyBindings) -> DirectionalKeys;

    /// Raw state of a single key. Sources that only know directions report
    /// every key as up.
    fn is_key_down(&self, _key: Key) -> bool {
        false
    }
}

impl KeySource for DirectionalKeys {
    fn directional_keys(&self, _bindings: &KeyBindings) -> DirectionalKeys {
        *self
    }
}

/// Pressed-key set fed by a platform layer and resolved through bindings.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pressed: HashSet<Key>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.pressed.remove(&key);
    }

    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.press(key);
        } else {
            self.release(key);
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn release_all(&mut self) {
        self.pressed.clear();
    }
}

impl KeySource for KeyboardState {
    fn directional_keys(&self, bindings: &KeyBindings) -> DirectionalKeys {
        DirectionalKeys {
            forward: self.is_pressed(bindings.forward),
            back: self.is_pressed(bindings.back),
            left: self.is_pressed(bindings.left),
            right: self.is_pressed(bindings.right),
        }
    }

    fn is_key_down(&self, key: Key) -> bool {
        self.is_pressed(key)
    }
}
