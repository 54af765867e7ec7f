//! Per-player movement for one tick
//!
//! Input becomes a displacement, which is resolved one axis at a time
//! (X, then Y from the possibly updated X) so players slide along walls.
//! Moving obstacles can carry a player; being carried into a squeeze
//! respawns them. Reaching a finish zone parks the player on the podium.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{is_pinned, resolve};
use super::geom::{Field, Rect};
use super::level::{Level, PickupKind};
use super::state::{FinishOrder, GameEvent};
use crate::consts::*;
use crate::input::PlayerInput;

/// Movement and timing parameters shared by every player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub field: Field,
    pub player_size: f32,
    pub player_radius: f32,
    pub player_speed: f32,
    pub diagonal_factor: f32,
    pub obstacle_step: f32,
    pub effect_duration_ms: f64,
    pub boost_factor: f32,
    pub debuff_factor: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field: Field::new(FIELD_WIDTH, FIELD_HEIGHT),
            player_size: PLAYER_SIZE,
            player_radius: PLAYER_RADIUS,
            player_speed: PLAYER_SPEED,
            diagonal_factor: DIAGONAL_FACTOR,
            obstacle_step: OBSTACLE_STEP,
            effect_duration_ms: EFFECT_DURATION_MS,
            boost_factor: BOOST_FACTOR,
            debuff_factor: DEBUFF_FACTOR,
        }
    }
}

/// Player identity colors, by seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    Red,
    Purple,
    Blue,
    Yellow,
}

impl PlayerColor {
    pub const ALL: [PlayerColor; MAX_PLAYERS] = [
        PlayerColor::Red,
        PlayerColor::Purple,
        PlayerColor::Blue,
        PlayerColor::Yellow,
    ];

    pub fn for_seat(index: usize) -> Self {
        Self::ALL[index % MAX_PLAYERS]
    }

    /// CSS color name
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerColor::Red => "red",
            PlayerColor::Purple => "purple",
            PlayerColor::Blue => "blue",
            PlayerColor::Yellow => "yellow",
        }
    }
}

/// Timed boost/debuff state. Expiry times are in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub boost_until: Option<f64>,
    pub debuff_until: Option<f64>,
}

impl StatusEffects {
    /// Start (or restart) an effect window at `now_ms`
    pub fn activate(&mut self, kind: PickupKind, now_ms: f64, duration_ms: f64) {
        let until = Some(now_ms + duration_ms);
        match kind {
            PickupKind::Boost => self.boost_until = until,
            PickupKind::Debuff => self.debuff_until = until,
        }
    }

    /// Speed multiplier at `now_ms`, clearing any expired effect
    pub fn speed_factor(&mut self, now_ms: f64, tuning: &Tuning) -> f32 {
        let mut factor = 1.0;
        match self.boost_until {
            Some(until) if now_ms < until => factor *= tuning.boost_factor,
            Some(_) => self.boost_until = None,
            None => {}
        }
        match self.debuff_until {
            Some(until) if now_ms < until => factor *= tuning.debuff_factor,
            Some(_) => self.debuff_until = None,
            None => {}
        }
        factor
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A player seat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub index: usize,
    pub color: PlayerColor,
    /// Top-left corner of the player's square
    pub pos: Vec2,
    /// Cumulative score across levels
    pub score: u32,
    pub effects: StatusEffects,
}

impl Player {
    pub fn new(index: usize, pos: Vec2) -> Self {
        Self {
            index,
            color: PlayerColor::for_seat(index),
            pos,
            score: 0,
            effects: StatusEffects::default(),
        }
    }
}

/// What happened to one player this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// Already finished; not simulated
    Frozen,
    Moved,
    /// Squeezed by a moving obstacle and sent back to the start
    Respawned,
    /// Reached a finish zone with this placement (0 = first)
    Finished { placement: usize },
}

#[derive(Debug, Clone, Copy)]
enum MoveAxis {
    X,
    Y,
}

/// Advance player `index` by one tick
///
/// Other players are read from `players` as they stand right now, so
/// lower seats have already moved when higher seats are processed.
#[allow(clippy::too_many_arguments)]
pub fn step_player(
    index: usize,
    players: &mut [Player],
    input: PlayerInput,
    level: &mut Level,
    finish: &mut FinishOrder,
    tuning: &Tuning,
    now_ms: f64,
    events: &mut Vec<GameEvent>,
) -> MotionOutcome {
    let factor = players[index].effects.speed_factor(now_ms, tuning);

    if finish.contains(index) {
        return MotionOutcome::Frozen;
    }

    let (dx, dy) = input.axes();
    let speed = if dx != 0.0 && dy != 0.0 {
        tuning.player_speed * tuning.diagonal_factor
    } else {
        tuning.player_speed
    } * factor;
    let delta = Vec2::new(dx * speed, dy * speed);

    for axis in [MoveAxis::X, MoveAxis::Y] {
        let pos = players[index].pos;
        let candidate = match axis {
            MoveAxis::X => Vec2::new(pos.x + delta.x, pos.y),
            MoveAxis::Y => Vec2::new(pos.x, pos.y + delta.y),
        };
        let outcome = resolve(
            Rect::square(candidate, tuning.player_size),
            index,
            level,
            players,
            tuning.player_size,
            tuning.obstacle_step,
        );

        let player = &mut players[index];
        if !outcome.blocked {
            player.pos = candidate;
        }

        if let Some(push) = outcome.push {
            player.pos += push;
            if is_pinned(player.pos, tuning.player_size, level, &tuning.field) {
                if let Some(start) = level.start_for(index) {
                    player.pos = start;
                }
                log::debug!("Player {} pinned, respawned at {:?}", index + 1, player.pos);
                events.push(GameEvent::PlayerRespawned { player: index });
                return MotionOutcome::Respawned;
            }
        }

        if let Some(kind) = outcome.pickup {
            player
                .effects
                .activate(kind, now_ms, tuning.effect_duration_ms);
            log::debug!("Player {} collected {:?}", index + 1, kind);
            events.push(GameEvent::PickupCollected {
                player: index,
                kind,
            });
        }
    }

    let player = &mut players[index];
    player.pos = tuning.field.clamp(player.pos, tuning.player_size);

    let arrived = level
        .finish_zones
        .iter()
        .any(|zone| zone.reaches(player.pos, tuning.player_radius));
    if arrived {
        if let Some(placement) = finish.insert(index) {
            if let Some(&slot) = level.podium.get(placement) {
                player.pos = slot;
            }
            log::debug!("Player {} finished in place {}", index + 1, placement + 1);
            events.push(GameEvent::PlayerFinished {
                player: index,
                placement,
            });
            return MotionOutcome::Finished { placement };
        }
    }

    MotionOutcome::Moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geom::Circle;
    use crate::sim::level::Pickup;
    use crate::sim::obstacle::{Direction, DynamicObstacle};
    use proptest::prelude::*;

    fn open_level(starts: &[(f32, f32)]) -> Level {
        Level {
            number: 1,
            obstacles: Vec::new(),
            dynamic: Vec::new(),
            finish_zones: Vec::new(),
            podium: vec![
                Vec2::new(900.0, 40.0),
                Vec2::new(940.0, 40.0),
                Vec2::new(980.0, 40.0),
                Vec2::new(1010.0, 40.0),
            ],
            pickups: Vec::new(),
            start_positions: starts.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
        }
    }

    fn seat(level: &Level) -> Vec<Player> {
        level
            .start_positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| Player::new(i, pos))
            .collect()
    }

    const RIGHT: PlayerInput = PlayerInput {
        up: false,
        down: false,
        left: false,
        right: true,
    };

    fn step(
        players: &mut [Player],
        input: PlayerInput,
        level: &mut Level,
        finish: &mut FinishOrder,
        now_ms: f64,
    ) -> MotionOutcome {
        let mut events = Vec::new();
        step_player(0, players, input, level, finish, &Tuning::default(), now_ms, &mut events)
    }

    #[test]
    fn test_blocked_at_wall_left_edge() {
        let mut level = open_level(&[(40.0, 100.0)]);
        level.obstacles.push(Rect::new(100.0, 100.0, 50.0, 50.0));
        let mut players = seat(&level);
        let mut finish = FinishOrder::new(1);

        for _ in 0..30 {
            step(&mut players, RIGHT, &mut level, &mut finish, 0.0);
        }
        assert_eq!(players[0].pos, Vec2::new(100.0 - PLAYER_SIZE, 100.0));
    }

    #[test]
    fn test_slides_along_wall_on_diagonal() {
        let mut level = open_level(&[(70.0, 100.0)]);
        level.obstacles.push(Rect::new(100.0, 100.0, 50.0, 50.0));
        let mut players = seat(&level);
        let mut finish = FinishOrder::new(1);

        let down_right = PlayerInput {
            down: true,
            right: true,
            ..Default::default()
        };
        step(&mut players, down_right, &mut level, &mut finish, 0.0);
        // X blocked, Y moves at the diagonal speed
        assert_eq!(players[0].pos, Vec2::new(70.0, 103.0));
    }

    #[test]
    fn test_boost_and_debuff_scale_speed() {
        let mut level = open_level(&[(400.0, 400.0)]);
        let mut players = seat(&level);
        let mut finish = FinishOrder::new(1);

        players[0].effects.activate(PickupKind::Boost, 0.0, EFFECT_DURATION_MS);
        step(&mut players, RIGHT, &mut level, &mut finish, 100.0);
        assert_eq!(players[0].pos.x, 404.0);

        players[0].effects.activate(PickupKind::Debuff, 0.0, EFFECT_DURATION_MS);
        step(&mut players, RIGHT, &mut level, &mut finish, 200.0);
        assert_eq!(players[0].pos.x, 406.0);

        // Both expired: back to base speed and cleared
        step(&mut players, RIGHT, &mut level, &mut finish, 3000.0);
        assert_eq!(players[0].pos.x, 408.0);
        assert_eq!(players[0].effects, StatusEffects::default());
    }

    #[test]
    fn test_pickup_activates_effect_window() {
        let mut level = open_level(&[(400.0, 400.0)]);
        level.pickups.push(Pickup {
            kind: PickupKind::Boost,
            bounds: Rect::new(430.0, 400.0, 20.0, 20.0),
        });
        let mut players = seat(&level);
        let mut finish = FinishOrder::new(1);

        step(&mut players, RIGHT, &mut level, &mut finish, 1000.0);
        assert_eq!(players[0].pos.x, 402.0);
        assert_eq!(players[0].effects.boost_until, Some(4000.0));
        assert!(level.pickups.is_empty());
    }

    #[test]
    fn test_pinned_push_respawns_and_skips_rest_of_tick() {
        let mut level = open_level(&[(500.0, 500.0)]);
        // Obstacle sliding left, square sits just right of its left edge
        level.dynamic.push(DynamicObstacle::new(
            Rect::new(0.0, 200.0, 60.0, 60.0),
            Vec2::new(300.0, 200.0),
            Direction::LEFT,
        ));
        let mut players = seat(&level);
        players[0].pos = Vec2::new(0.0, 210.0);
        let mut finish = FinishOrder::new(1);

        let mut events = Vec::new();
        let outcome = step_player(
            0,
            &mut players,
            PlayerInput::default(),
            &mut level,
            &mut finish,
            &Tuning::default(),
            0.0,
            &mut events,
        );
        assert_eq!(outcome, MotionOutcome::Respawned);
        assert_eq!(players[0].pos, Vec2::new(500.0, 500.0));
        assert_eq!(events, vec![GameEvent::PlayerRespawned { player: 0 }]);
    }

    #[test]
    fn test_finish_zone_parks_player_on_podium() {
        let mut level = open_level(&[(470.0, 500.0)]);
        level.finish_zones.push(Circle::new(500.0, 500.0, 20.0));
        let mut players = seat(&level);
        let mut finish = FinishOrder::new(1);

        let outcome = step(&mut players, RIGHT, &mut level, &mut finish, 0.0);
        assert_eq!(outcome, MotionOutcome::Finished { placement: 0 });
        assert_eq!(players[0].pos, level.podium[0]);
        assert_eq!(finish.placement(0), Some(0));

        // Finished players are frozen
        let outcome = step(&mut players, RIGHT, &mut level, &mut finish, 16.0);
        assert_eq!(outcome, MotionOutcome::Frozen);
        assert_eq!(players[0].pos, level.podium[0]);
    }

    proptest! {
        #[test]
        fn prop_position_stays_on_field(
            x in -50.0f32..1100.0,
            y in -50.0f32..1050.0,
            up in any::<bool>(),
            down in any::<bool>(),
            left in any::<bool>(),
            right in any::<bool>(),
            boosted in any::<bool>(),
        ) {
            let mut level = open_level(&[(10.0, 10.0)]);
            let mut players = seat(&level);
            players[0].pos = Vec2::new(x, y);
            if boosted {
                players[0].effects.activate(PickupKind::Boost, 0.0, EFFECT_DURATION_MS);
            }
            let mut finish = FinishOrder::new(1);
            let input = PlayerInput { up, down, left, right };

            step(&mut players, input, &mut level, &mut finish, 0.0);
            let pos = players[0].pos;
            prop_assert!(pos.x >= 0.0 && pos.x <= FIELD_WIDTH - PLAYER_SIZE);
            prop_assert!(pos.y >= 0.0 && pos.y <= FIELD_HEIGHT - PLAYER_SIZE);
        }

        #[test]
        fn prop_finished_player_never_moves(
            up in any::<bool>(),
            down in any::<bool>(),
            left in any::<bool>(),
            right in any::<bool>(),
        ) {
            let mut level = open_level(&[(300.0, 300.0)]);
            let mut players = seat(&level);
            let mut finish = FinishOrder::new(1);
            finish.insert(0);

            let input = PlayerInput { up, down, left, right };
            let outcome = step(&mut players, input, &mut level, &mut finish, 0.0);
            prop_assert_eq!(outcome, MotionOutcome::Frozen);
            prop_assert_eq!(players[0].pos, Vec2::new(300.0, 300.0));
        }
    }
}
