//! Match state and core simulation types
//!
//! A [`Match`] owns the players, the level being played and the finish
//! order. It is mutated only by the single tick loop in `tick.rs` and by
//! the edge-triggered proceed/restart signals.

use glam::Vec2;
use serde::Serialize;

use super::level::{Level, PickupKind};
use super::motion::{Player, PlayerColor, Tuning};
use crate::consts::*;
use crate::settings::{PlacementScale, Settings};

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MatchPhase {
    /// Waiting for the current level's document
    Loading {
        /// A load request has been handed out
        requested: bool,
    },
    /// Pre-level countdown
    Countdown {
        /// Number currently on screen
        value: u32,
        /// When the next number is due (ms); scheduled on the first tick
        next_at_ms: Option<f64>,
    },
    /// Active gameplay
    Active,
    /// Everyone finished; waiting for the proceed signal
    LevelComplete,
    /// Ran out of levels (or a level failed to load)
    GameOver,
}

/// Cues for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioCue {
    LevelStart,
    CountdownTick,
    LevelFinished,
    GameOver,
    LoopStart,
    StopAll,
}

/// A player's cumulative score, for the scoreboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub player: usize,
    pub color: PlayerColor,
    pub score: u32,
}

/// Notifications for the shell (audio, scoreboard, overlays)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    Audio(AudioCue),
    LevelLoaded { level: u32 },
    LevelLoadFailed { level: u32 },
    CountdownShown { value: u32 },
    PickupCollected { player: usize, kind: PickupKind },
    PlayerRespawned { player: usize },
    PlayerFinished { player: usize, placement: usize },
    LevelCompleted { level: u32 },
    StandingsUpdated(Vec<Standing>),
}

/// Players that reached a finish zone, in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishOrder {
    order: Vec<usize>,
    capacity: usize,
}

impl FinishOrder {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, player: usize) -> bool {
        self.order.contains(&player)
    }

    /// Record an arrival; returns its placement, or None if the player is
    /// already recorded or the order is full
    pub fn insert(&mut self, player: usize) -> Option<usize> {
        if self.contains(player) || self.is_full() {
            return None;
        }
        self.order.push(player);
        Some(self.order.len() - 1)
    }

    pub fn placement(&self, player: usize) -> Option<usize> {
        self.order.iter().position(|&p| p == player)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.order.len() >= self.capacity
    }

    /// Player indices, first finisher first
    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }
}

/// Invalid match setup
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("a match needs 1 to {max} players, got {requested}")]
    InvalidPlayerCount { requested: usize, max: usize },
}

/// What the renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct Frame<'a> {
    pub phase: MatchPhase,
    pub level_number: u32,
    pub level: Option<&'a Level>,
    pub players: &'a [Player],
    pub finish_order: &'a [usize],
    pub player_size: f32,
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct Match {
    pub tuning: Tuning,
    pub placement_scale: PlacementScale,
    pub countdown_start: u32,
    pub countdown_interval_ms: f64,
    /// Fixed for the match's lifetime
    pub player_count: usize,
    /// Number of the level being loaded or played (1-based)
    pub level_number: u32,
    pub phase: MatchPhase,
    pub level: Option<Level>,
    pub players: Vec<Player>,
    pub finish: FinishOrder,
    /// Simulation tick counter
    pub time_ticks: u64,
    events: Vec<GameEvent>,
}

impl Match {
    /// Create a match and request its first level
    pub fn new(player_count: usize, settings: &Settings) -> Result<Self, MatchError> {
        if player_count == 0 || player_count > MAX_PLAYERS {
            return Err(MatchError::InvalidPlayerCount {
                requested: player_count,
                max: MAX_PLAYERS,
            });
        }

        let mut state = Self {
            tuning: settings.tuning(),
            placement_scale: settings.placement_scale,
            countdown_start: settings.countdown_start,
            countdown_interval_ms: settings.countdown_interval_ms,
            player_count,
            level_number: 0,
            phase: MatchPhase::Loading { requested: false },
            level: None,
            players: (0..player_count)
                .map(|i| Player::new(i, Vec2::ZERO))
                .collect(),
            finish: FinishOrder::new(player_count),
            time_ticks: 0,
            events: Vec::new(),
        };
        state.enter_loading();

        Ok(state)
    }

    /// True while players are being simulated
    pub fn ongoing(&self) -> bool {
        self.phase == MatchPhase::Active
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn events_mut(&mut self) -> &mut Vec<GameEvent> {
        &mut self.events
    }

    /// Take all notifications emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Cumulative scores in seat order
    pub fn standings(&self) -> Vec<Standing> {
        self.players
            .iter()
            .map(|p| Standing {
                player: p.index,
                color: p.color,
                score: p.score,
            })
            .collect()
    }

    /// Result-screen resting spot for a placement
    pub fn result_slot(&self, placement: usize) -> Vec2 {
        let field = self.tuning.field;
        Vec2::new(
            field.width / 2.0 + RESULT_SLOT_OFFSET_X + placement as f32 * RESULT_SLOT_SPACING,
            field.height / 2.0 - RESULT_SLOT_LIFT,
        )
    }

    /// Move finished players onto the result screen
    pub(crate) fn seat_finishers_on_results(&mut self) {
        for placement in 0..self.finish.len() {
            let player = self.finish.as_slice()[placement];
            let slot = self.result_slot(placement);
            if let Some(p) = self.players.get_mut(player) {
                p.pos = slot;
            }
        }
    }

    /// Advance the level counter and wait for its document
    pub(crate) fn enter_loading(&mut self) {
        self.level_number += 1;
        self.level = None;
        self.finish = FinishOrder::new(self.player_count);
        self.phase = MatchPhase::Loading { requested: false };
        log::info!("Loading level {}", self.level_number);
    }

    /// Snapshot for the rendering collaborator
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            phase: self.phase,
            level_number: self.level_number,
            level: self.level.as_ref(),
            players: &self.players,
            finish_order: self.finish.as_slice(),
            player_size: self.tuning.player_size,
        }
    }
}
