//! Maze Rush - a local multiplayer maze race
//!
//! Core modules:
//! - `sim`: Simulation (levels, moving obstacles, collisions, match flow)
//! - `input`: Keyboard bindings feeding the shared input surface
//! - `settings`: Data-driven game configuration and preferences
//! - `ui`: Result-screen button hit testing
//! - `audio`: Browser audio collaborator (wasm only)

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod input;
pub mod settings;
pub mod sim;
pub mod ui;

pub use input::{InputSurface, KeyBinding, PlayerInput};
pub use settings::{PlacementScale, Settings};

/// Game configuration constants
pub mod consts {
    /// Playing field dimensions
    pub const FIELD_WIDTH: f32 = 1050.0;
    pub const FIELD_HEIGHT: f32 = 1000.0;

    /// Most players a single keyboard can host
    pub const MAX_PLAYERS: usize = 4;

    /// Player square edge length
    pub const PLAYER_SIZE: f32 = 30.0;
    /// Radius used when testing finish-zone arrival
    pub const PLAYER_RADIUS: f32 = 20.0;
    /// Axis-aligned speed (units per tick)
    pub const PLAYER_SPEED: f32 = 2.0;
    /// Diagonal speed factor relative to PLAYER_SPEED (not a unit-vector normalization)
    pub const DIAGONAL_FACTOR: f32 = 1.5;

    /// Dynamic obstacle travel per tick, also the push magnitude
    pub const OBSTACLE_STEP: f32 = 1.5;

    /// Pickup square edge length when the level gives only a corner
    pub const PICKUP_SIZE: f32 = 20.0;
    /// Boost/debuff duration (ms)
    pub const EFFECT_DURATION_MS: f64 = 3000.0;
    pub const BOOST_FACTOR: f32 = 2.0;
    pub const DEBUFF_FACTOR: f32 = 0.5;

    /// Countdown shown before each level
    pub const COUNTDOWN_START: u32 = 5;
    pub const COUNTDOWN_INTERVAL_MS: f64 = 1000.0;

    /// Result screen slot layout (relative to field center)
    pub const RESULT_SLOT_OFFSET_X: f32 = 40.0;
    pub const RESULT_SLOT_SPACING: f32 = 80.0;
    pub const RESULT_SLOT_LIFT: f32 = 15.0;
}
