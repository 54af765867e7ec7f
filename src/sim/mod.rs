//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One fixed step per frame; wall-clock time only gates timers
//! - Stable iteration order (by seat index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod geom;
pub mod level;
pub mod motion;
pub mod obstacle;
pub mod state;
pub mod tick;

pub use collision::{CollisionOutcome, is_pinned, resolve};
pub use geom::{Circle, Field, Rect};
pub use level::{Level, LevelLoadError, LevelProvider, MapDirectory, Pickup, PickupKind};
pub use motion::{MotionOutcome, Player, PlayerColor, StatusEffects, Tuning, step_player};
pub use obstacle::{Axis, Direction, DynamicObstacle, Sign};
pub use state::{AudioCue, FinishOrder, Frame, GameEvent, Match, MatchError, MatchPhase, Standing};
pub use tick::{TickInput, tick};
