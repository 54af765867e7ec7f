//! Game settings and preferences
//!
//! Gameplay pacing, key bindings and audio preferences. Preferences are
//! persisted in LocalStorage; match progress never is.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::input::KeyBinding;
use crate::sim::Tuning;
use crate::sim::geom::Field;

/// How many points first place is worth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlacementScale {
    /// First place earns one point per player in the match
    #[default]
    PlayerCount,
    /// First place earns a fixed number of points
    Fixed(u32),
}

impl PlacementScale {
    pub fn max_points(&self, player_count: usize) -> u32 {
        match *self {
            PlacementScale::PlayerCount => player_count as u32,
            PlacementScale::Fixed(points) => points,
        }
    }

    /// Points for a placement (0 = first). Never negative.
    pub fn points_for(&self, placement: usize, player_count: usize) -> u32 {
        self.max_points(player_count)
            .saturating_sub(placement as u32)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Field & movement ===
    pub field_width: f32,
    pub field_height: f32,
    pub player_size: f32,
    /// Reach used for finish-zone arrival
    pub player_radius: f32,
    pub player_speed: f32,
    pub diagonal_factor: f32,
    pub obstacle_step: f32,
    pub effect_duration_ms: f64,

    // === Match flow ===
    pub countdown_start: u32,
    pub countdown_interval_ms: f64,
    pub placement_scale: PlacementScale,
    /// Where level documents live; `{n}` is replaced by the level number
    pub level_url_template: String,

    // === Controls ===
    pub key_bindings: Vec<KeyBinding>,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            player_size: PLAYER_SIZE,
            player_radius: PLAYER_RADIUS,
            player_speed: PLAYER_SPEED,
            diagonal_factor: DIAGONAL_FACTOR,
            obstacle_step: OBSTACLE_STEP,
            effect_duration_ms: EFFECT_DURATION_MS,

            countdown_start: COUNTDOWN_START,
            countdown_interval_ms: COUNTDOWN_INTERVAL_MS,
            placement_scale: PlacementScale::PlayerCount,
            level_url_template: "maps/map_{n}.json".to_string(),

            key_bindings: KeyBinding::defaults(),

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        }
    }
}

impl Settings {
    /// Movement parameters for the simulation
    pub fn tuning(&self) -> Tuning {
        Tuning {
            field: Field::new(self.field_width, self.field_height),
            player_size: self.player_size,
            player_radius: self.player_radius,
            player_speed: self.player_speed,
            diagonal_factor: self.diagonal_factor,
            obstacle_step: self.obstacle_step,
            effect_duration_ms: self.effect_duration_ms,
            ..Tuning::default()
        }
    }

    /// URL of a level document
    pub fn level_url(&self, level: u32) -> String {
        self.level_url_template.replace("{n}", &level.to_string())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Effective music volume (respects mute)
    pub fn effective_music_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Effective sound effect volume (respects mute)
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "maze_rush_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
