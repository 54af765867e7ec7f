//! Shared keyboard input surface
//!
//! All players share one keyboard. Each player has a binding of four keys;
//! key events update that player's live direction record, which the
//! simulation reads once per tick without mutating.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PLAYERS;

/// Directions currently held by one player
///
/// Opposite directions may be held together; they cancel per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl PlayerInput {
    /// Raw per-axis direction in {-1, 0, 1}
    pub fn axes(&self) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.up {
            dy -= 1.0;
        }
        if self.down {
            dy += 1.0;
        }
        if self.left {
            dx -= 1.0;
        }
        if self.right {
            dx += 1.0;
        }
        (dx, dy)
    }
}

/// Browser key names (lowercased `KeyboardEvent.key`) for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
}

impl KeyBinding {
    pub fn new(up: &str, down: &str, left: &str, right: &str) -> Self {
        Self {
            up: up.to_string(),
            down: down.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// Default bindings: WASD, arrows, IJKL, TFGH
    pub fn defaults() -> Vec<KeyBinding> {
        vec![
            KeyBinding::new("w", "s", "a", "d"),
            KeyBinding::new("arrowup", "arrowdown", "arrowleft", "arrowright"),
            KeyBinding::new("i", "k", "j", "l"),
            KeyBinding::new("t", "g", "f", "h"),
        ]
    }

    /// Apply a key event; returns true if the key belongs to this binding
    pub fn apply(&self, input: &mut PlayerInput, key: &str, pressed: bool) -> bool {
        let mut matched = false;
        if key == self.up {
            input.up = pressed;
            matched = true;
        }
        if key == self.down {
            input.down = pressed;
            matched = true;
        }
        if key == self.left {
            input.left = pressed;
            matched = true;
        }
        if key == self.right {
            input.right = pressed;
            matched = true;
        }
        matched
    }
}

/// Live input records for every player slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSurface {
    players: [PlayerInput; MAX_PLAYERS],
}

impl InputSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input for a player; out-of-range slots read as idle
    pub fn player(&self, index: usize) -> PlayerInput {
        self.players.get(index).copied().unwrap_or_default()
    }

    pub fn set(&mut self, index: usize, input: PlayerInput) {
        if let Some(slot) = self.players.get_mut(index) {
            *slot = input;
        }
    }

    /// Route a key event through the first `player_count` bindings
    pub fn handle_key(
        &mut self,
        bindings: &[KeyBinding],
        player_count: usize,
        key: &str,
        pressed: bool,
    ) {
        let key = key.to_lowercase();
        for (binding, slot) in bindings
            .iter()
            .zip(self.players.iter_mut())
            .take(player_count)
        {
            binding.apply(slot, &key, pressed);
        }
    }

    /// Release every key (e.g. on focus loss)
    pub fn clear(&mut self) {
        self.players = [PlayerInput::default(); MAX_PLAYERS];
    }
}
