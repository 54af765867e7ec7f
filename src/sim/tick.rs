//! Per-frame simulation tick and match flow
//!
//! Drives `Loading -> Countdown -> Active -> LevelComplete -> Loading | GameOver`.
//! Everything is advanced from one loop: the shell calls [`tick`] once per
//! animation frame and feeds level documents and proceed/restart signals
//! back in between ticks.

use super::level::{Level, LevelLoadError, LevelProvider};
use super::motion::step_player;
use super::obstacle::advance_all;
use super::state::{AudioCue, FinishOrder, GameEvent, Match, MatchPhase};
use crate::input::InputSurface;

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Wall-clock time of this frame (ms)
    pub now_ms: f64,
    /// Snapshot of every player's held directions
    pub players: InputSurface,
}

/// Advance the match by one frame
pub fn tick(state: &mut Match, input: &TickInput) {
    match state.phase {
        MatchPhase::Loading { .. } | MatchPhase::LevelComplete | MatchPhase::GameOver => {}

        MatchPhase::Countdown { value, next_at_ms } => {
            let Some(due) = next_at_ms else {
                state.phase = MatchPhase::Countdown {
                    value,
                    next_at_ms: Some(input.now_ms + state.countdown_interval_ms),
                };
                return;
            };
            if input.now_ms < due {
                return;
            }

            let value = value.saturating_sub(1);
            state.push_event(GameEvent::CountdownShown { value });
            if value == 0 {
                state.push_event(GameEvent::Audio(AudioCue::LevelStart));
                state.push_event(GameEvent::Audio(AudioCue::LoopStart));
                state.phase = MatchPhase::Active;
                log::info!("Level {} started", state.level_number);
            } else {
                state.push_event(GameEvent::Audio(AudioCue::CountdownTick));
                state.phase = MatchPhase::Countdown {
                    value,
                    next_at_ms: Some(due + state.countdown_interval_ms),
                };
            }
        }

        MatchPhase::Active => {
            state.time_ticks += 1;
            step_active(state, input);
            if state.finish.is_full() {
                complete_level(state);
            }
        }
    }
}

/// Players in seat order, then the moving obstacles
fn step_active(state: &mut Match, input: &TickInput) {
    let Match {
        tuning,
        player_count,
        level,
        players,
        finish,
        ..
    } = state;
    let Some(level) = level.as_mut() else {
        return;
    };

    let mut events = Vec::new();
    for index in 0..*player_count {
        step_player(
            index,
            players,
            input.players.player(index),
            level,
            finish,
            tuning,
            input.now_ms,
            &mut events,
        );
    }
    advance_all(&mut level.dynamic, tuning.obstacle_step);

    state.events_mut().extend(events);
}

fn complete_level(state: &mut Match) {
    state.push_event(GameEvent::Audio(AudioCue::StopAll));
    state.push_event(GameEvent::Audio(AudioCue::LevelFinished));

    for placement in 0..state.finish.len() {
        let player = state.finish.as_slice()[placement];
        let points = state
            .placement_scale
            .points_for(placement, state.player_count);
        if let Some(p) = state.players.get_mut(player) {
            p.score += points;
        }
    }
    state.seat_finishers_on_results();

    state.phase = MatchPhase::LevelComplete;
    log::info!(
        "Level {} complete, order {:?}",
        state.level_number,
        state.finish.as_slice()
    );
    state.push_event(GameEvent::LevelCompleted {
        level: state.level_number,
    });
    let standings = state.standings();
    state.push_event(GameEvent::StandingsUpdated(standings));
}

fn enter_game_over(state: &mut Match) {
    state.push_event(GameEvent::Audio(AudioCue::GameOver));
    state.seat_finishers_on_results();
    state.phase = MatchPhase::GameOver;
    log::info!("Game over after level {}", state.level_number.saturating_sub(1));
}

impl Match {
    /// Hand out the pending level load, at most once per `Loading` entry
    pub fn take_load_request(&mut self) -> Option<u32> {
        match self.phase {
            MatchPhase::Loading { requested: false } => {
                self.phase = MatchPhase::Loading { requested: true };
                Some(self.level_number)
            }
            _ => None,
        }
    }

    /// Deliver the document (or failure) for a requested level
    ///
    /// Anything that does not answer the outstanding request is ignored.
    pub fn finish_loading(&mut self, level: u32, document: Result<String, LevelLoadError>) {
        if self.phase != (MatchPhase::Loading { requested: true }) || level != self.level_number {
            log::warn!("Ignoring unrequested document for level {}", level);
            return;
        }

        let parsed = document.and_then(|json| Level::parse(level, &json, self.player_count));
        match parsed {
            Ok(loaded) => self.begin_level(loaded),
            Err(e) => {
                log::warn!("Level {} failed to load: {}", level, e);
                self.push_event(GameEvent::LevelLoadFailed { level });
                enter_game_over(self);
            }
        }
    }

    /// Synchronously serve a pending load from `provider`
    ///
    /// Returns true if a load was performed.
    pub fn load_from(&mut self, provider: &mut impl LevelProvider) -> bool {
        let Some(level) = self.take_load_request() else {
            return false;
        };
        let document = provider.fetch(level);
        self.finish_loading(level, document);
        true
    }

    fn begin_level(&mut self, level: Level) {
        for player in &mut self.players {
            if let Some(start) = level.start_for(player.index) {
                player.pos = start;
            }
            player.effects.clear();
        }
        self.finish = FinishOrder::new(self.player_count);

        log::info!(
            "Level {} loaded: {} walls, {} moving obstacles, {} pickups",
            level.number,
            level.obstacles.len(),
            level.dynamic.len(),
            level.pickups.len()
        );
        self.push_event(GameEvent::LevelLoaded {
            level: level.number,
        });
        self.level = Some(level);

        let value = self.countdown_start;
        self.phase = MatchPhase::Countdown {
            value,
            next_at_ms: None,
        };
        self.push_event(GameEvent::CountdownShown { value });
        self.push_event(GameEvent::Audio(AudioCue::CountdownTick));
    }

    /// Proceed signal from the level-complete screen
    ///
    /// Returns false (and does nothing) in any other phase.
    pub fn proceed(&mut self) -> bool {
        if self.phase != MatchPhase::LevelComplete {
            log::debug!("Proceed ignored in {:?}", self.phase);
            return false;
        }
        self.enter_loading();
        true
    }

    /// Debug: abandon whatever is running and load `level` next
    pub fn skip_to_level(&mut self, level: u32) {
        log::info!("Skipping to level {}", level);
        self.level_number = level.saturating_sub(1);
        self.enter_loading();
    }

    /// Restart signal from the game-over screen
    ///
    /// Zeroes all scores and starts again from level 1. Returns false (and
    /// does nothing) in any other phase.
    pub fn restart(&mut self) -> bool {
        if self.phase != MatchPhase::GameOver {
            log::debug!("Restart ignored in {:?}", self.phase);
            return false;
        }
        self.push_event(GameEvent::Audio(AudioCue::StopAll));
        for player in &mut self.players {
            player.score = 0;
        }
        let standings = self.standings();
        self.push_event(GameEvent::StandingsUpdated(standings));

        self.level_number = 0;
        self.enter_loading();
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use glam::Vec2;

    use super::*;
    use crate::input::PlayerInput;
    use crate::settings::{PlacementScale, Settings};
    use crate::sim::level::PickupKind;
    use crate::sim::motion::StatusEffects;
    use crate::sim::obstacle::Direction;

    const FRAME_MS: f64 = 16.0;

    /// Two players start next to a finish zone; player 1 is one step closer.
    const RACE: &str = r#"{
        "obstacles": [[100, 100, 50, 50]],
        "finish_line": [[500, 500, 20]],
        "finish_positions": [[900, 40], [940, 40], [980, 40], [1010, 40]],
        "start_positions": [[450, 500], [500, 452], [10, 110], [10, 160]],
        "dyn_obstacles": [[[0, 300, 40, 40], [200, 300], "h"]],
        "booster": [[300, 300]]
    }"#;

    /// Same race, with a boost directly in player 0's path.
    const BOOSTED: &str = r#"{
        "obstacles": [[100, 100, 50, 50]],
        "finish_line": [[500, 500, 20]],
        "finish_positions": [[900, 40], [940, 40], [980, 40], [1010, 40]],
        "start_positions": [[450, 500], [500, 452], [10, 110], [10, 160]],
        "booster": [[470, 500]]
    }"#;

    /// One boost between seats 0 and 1, both already reaching for it.
    const CONTESTED: &str = r#"{
        "obstacles": [],
        "finish_line": [[900, 100, 20]],
        "finish_positions": [[900, 40], [940, 40], [980, 40], [1010, 40]],
        "start_positions": [[401, 600], [451, 600], [10, 110], [10, 160]],
        "booster": [[432, 600]]
    }"#;

    fn maps(count: u32) -> HashMap<u32, String> {
        documents(RACE, count)
    }

    fn documents(json: &str, count: u32) -> HashMap<u32, String> {
        (1..=count).map(|n| (n, json.to_string())).collect()
    }

    fn hold(players: &[(usize, PlayerInput)]) -> InputSurface {
        let mut surface = InputSurface::new();
        for &(i, input) in players {
            surface.set(i, input);
        }
        surface
    }

    const RIGHT: PlayerInput = PlayerInput {
        up: false,
        down: false,
        left: false,
        right: true,
    };
    const LEFT: PlayerInput = PlayerInput {
        up: false,
        down: false,
        left: true,
        right: false,
    };
    const DOWN: PlayerInput = PlayerInput {
        up: false,
        down: true,
        left: false,
        right: false,
    };

    /// Run countdown ticks until the match goes active
    fn run_countdown(state: &mut Match, now: &mut f64) {
        for _ in 0..1000 {
            if state.ongoing() {
                return;
            }
            tick(state, &TickInput {
                now_ms: *now,
                ..Default::default()
            });
            *now += FRAME_MS;
        }
        panic!("countdown never finished");
    }

    fn audio(events: &[GameEvent]) -> Vec<AudioCue> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Audio(cue) => Some(*cue),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_countdown_runs_five_seconds() {
        let mut state = Match::new(2, &Settings::default()).unwrap();
        let mut maps = maps(1);
        assert!(state.load_from(&mut maps));

        assert_eq!(
            state.phase,
            MatchPhase::Countdown {
                value: 5,
                next_at_ms: None
            }
        );

        tick(&mut state, &TickInput { now_ms: 0.0, ..Default::default() });
        for second in 1..5 {
            tick(&mut state, &TickInput {
                now_ms: second as f64 * 1000.0,
                ..Default::default()
            });
            assert!(!state.ongoing());
        }
        tick(&mut state, &TickInput { now_ms: 4999.0, ..Default::default() });
        assert!(!state.ongoing());
        tick(&mut state, &TickInput { now_ms: 5000.0, ..Default::default() });
        assert!(state.ongoing());

        let events = state.drain_events();
        let shown: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::CountdownShown { value } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![5, 4, 3, 2, 1, 0]);
        assert_eq!(
            audio(&events),
            vec![
                AudioCue::CountdownTick,
                AudioCue::CountdownTick,
                AudioCue::CountdownTick,
                AudioCue::CountdownTick,
                AudioCue::CountdownTick,
                AudioCue::LevelStart,
                AudioCue::LoopStart,
            ]
        );
    }

    #[test]
    fn test_countdown_does_not_simulate() {
        let mut state = Match::new(2, &Settings::default()).unwrap();
        state.load_from(&mut maps(1));

        let input = TickInput {
            now_ms: 0.0,
            players: hold(&[(0, RIGHT)]),
        };
        tick(&mut state, &input);
        assert_eq!(state.players[0].pos, Vec2::new(450.0, 500.0));
        assert_eq!(state.level.as_ref().unwrap().dynamic[0].bounds().x, 0.0);
    }

    #[test]
    fn test_level_completes_and_awards_points() {
        let mut state = Match::new(2, &Settings::default()).unwrap();
        state.load_from(&mut maps(2));
        let mut now = 0.0;
        run_countdown(&mut state, &mut now);
        state.drain_events();

        // Player 1 moves down into the zone first; player 0 needs a few steps
        let input = TickInput {
            now_ms: now,
            players: hold(&[(0, RIGHT), (1, DOWN)]),
        };
        for _ in 0..10 {
            tick(&mut state, &input);
            if state.phase == MatchPhase::LevelComplete {
                break;
            }
        }
        assert_eq!(state.phase, MatchPhase::LevelComplete);
        assert_eq!(state.finish.as_slice(), &[1, 0]);
        assert_eq!(state.players[1].score, 2);
        assert_eq!(state.players[0].score, 1);
        assert_eq!(state.players[1].pos, state.result_slot(0));
        assert_eq!(state.players[0].pos, state.result_slot(1));

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PlayerFinished {
            player: 1,
            placement: 0
        }));
        assert!(events.contains(&GameEvent::LevelCompleted { level: 1 }));
        assert!(events.contains(&GameEvent::StandingsUpdated(state.standings())));
        let cues = audio(&events);
        assert_eq!(cues, vec![AudioCue::StopAll, AudioCue::LevelFinished]);

        // Frozen until proceed
        tick(&mut state, &input);
        assert_eq!(state.players[1].pos, state.result_slot(0));
        assert!(state.proceed());
        assert_eq!(state.level_number, 2);
        assert!(!state.proceed());
    }

    #[test]
    fn test_fixed_placement_scale() {
        let settings = Settings {
            placement_scale: PlacementScale::Fixed(4),
            ..Settings::default()
        };
        let mut state = Match::new(2, &settings).unwrap();
        state.load_from(&mut maps(1));
        let mut now = 0.0;
        run_countdown(&mut state, &mut now);

        let input = TickInput {
            now_ms: now,
            players: hold(&[(0, RIGHT), (1, DOWN)]),
        };
        for _ in 0..10 {
            tick(&mut state, &input);
        }
        assert_eq!(state.players[1].score, 4);
        assert_eq!(state.players[0].score, 3);
    }

    #[test]
    fn test_running_out_of_levels_ends_match() {
        let mut state = Match::new(2, &Settings::default()).unwrap();
        let mut maps = maps(1);
        state.load_from(&mut maps);
        let mut now = 0.0;
        run_countdown(&mut state, &mut now);
        let input = TickInput {
            now_ms: now,
            players: hold(&[(0, RIGHT), (1, DOWN)]),
        };
        for _ in 0..10 {
            tick(&mut state, &input);
        }
        assert!(state.proceed());
        state.drain_events();

        assert!(state.load_from(&mut maps));
        assert_eq!(state.phase, MatchPhase::GameOver);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::LevelLoadFailed { level: 2 }));
        assert_eq!(audio(&events), vec![AudioCue::GameOver]);

        // Scores survive until restart
        assert_eq!(state.players[1].score, 2);
        assert!(state.restart());
        assert_eq!(state.level_number, 1);
        assert!(state.players.iter().all(|p| p.score == 0));
        assert_eq!(state.phase, MatchPhase::Loading { requested: false });
        assert!(!state.restart());
    }

    #[test]
    fn test_malformed_level_ends_match() {
        let mut state = Match::new(1, &Settings::default()).unwrap();
        let mut maps: HashMap<u32, String> = HashMap::new();
        maps.insert(1, "{\"obstacles\": 3}".to_string());
        state.load_from(&mut maps);
        assert_eq!(state.phase, MatchPhase::GameOver);
    }

    #[test]
    fn test_load_request_handed_out_once() {
        let mut state = Match::new(1, &Settings::default()).unwrap();
        assert_eq!(state.take_load_request(), Some(1));
        assert_eq!(state.take_load_request(), None);

        // A stale document for another level is ignored
        state.finish_loading(3, Ok(RACE.to_string()));
        assert_eq!(state.phase, MatchPhase::Loading { requested: true });

        state.finish_loading(1, Ok(RACE.to_string()));
        assert!(matches!(state.phase, MatchPhase::Countdown { .. }));
        assert!(!state.load_from(&mut maps(1)));
    }

    #[test]
    fn test_signals_ignored_while_active() {
        let mut state = Match::new(2, &Settings::default()).unwrap();
        state.load_from(&mut maps(1));
        let mut now = 0.0;
        run_countdown(&mut state, &mut now);

        assert!(!state.proceed());
        assert!(!state.restart());
        assert!(state.ongoing());
    }

    #[test]
    fn test_reloading_level_resets_state() {
        let mut maps = maps(2);
        let mut state = Match::new(2, &Settings::default()).unwrap();
        state.load_from(&mut maps);
        let first_starts: Vec<Vec2> = state.players.iter().map(|p| p.pos).collect();
        let first_pickups = state.level.as_ref().unwrap().pickups.clone();

        let mut now = 0.0;
        run_countdown(&mut state, &mut now);
        let input = TickInput {
            now_ms: now,
            players: hold(&[(0, RIGHT), (1, DOWN)]),
        };
        for _ in 0..10 {
            tick(&mut state, &input);
        }
        assert!(state.proceed());
        state.load_from(&mut maps);

        let second_starts: Vec<Vec2> = state.players.iter().map(|p| p.pos).collect();
        assert_eq!(first_starts, second_starts);
        assert!(state.finish.is_empty());
        assert_eq!(state.level.as_ref().unwrap().pickups, first_pickups);
        assert_eq!(state.level.as_ref().unwrap().dynamic[0].bounds().x, 0.0);
        assert_eq!(state.players[1].score, 2);
    }

    #[test]
    fn test_obstacle_flips_after_134_active_ticks() {
        let mut state = Match::new(1, &Settings::default()).unwrap();
        state.load_from(&mut maps(1));
        let mut now = 0.0;
        run_countdown(&mut state, &mut now);

        let idle = TickInput {
            now_ms: now,
            ..Default::default()
        };
        for _ in 0..133 {
            tick(&mut state, &idle);
        }
        let obstacle = &state.level.as_ref().unwrap().dynamic[0];
        assert_eq!(obstacle.direction, Direction::RIGHT);

        tick(&mut state, &idle);
        assert_eq!(state.time_ticks, 134);
        let obstacle = &state.level.as_ref().unwrap().dynamic[0];
        assert_eq!(obstacle.direction, Direction::LEFT);
        assert!(obstacle.bounds().x >= 200.0);
    }

    #[test]
    fn test_skip_to_level_requests_that_level() {
        let mut state = Match::new(1, &Settings::default()).unwrap();
        state.load_from(&mut maps(3));
        state.skip_to_level(3);
        assert_eq!(state.take_load_request(), Some(3));
        assert!(state.level.is_none());
    }

    #[test]
    fn test_failed_load_after_completion_seats_nobody() {
        let mut state = Match::new(2, &Settings::default()).unwrap();
        let mut maps = maps(1);
        state.load_from(&mut maps);
        let mut now = 0.0;
        run_countdown(&mut state, &mut now);
        let input = TickInput {
            now_ms: now,
            players: hold(&[(0, RIGHT), (1, DOWN)]),
        };
        for _ in 0..10 {
            tick(&mut state, &input);
        }
        assert_eq!(state.finish.as_slice(), &[1, 0]);

        assert!(state.proceed());
        assert!(state.frame().finish_order.is_empty());

        state.load_from(&mut maps);
        assert_eq!(state.phase, MatchPhase::GameOver);
        assert!(state.finish.is_empty());
        assert!(state.frame().finish_order.is_empty());
    }

    #[test]
    fn test_reload_restores_consumed_pickups_and_clears_effects() {
        let mut maps = documents(BOOSTED, 2);
        let mut state = Match::new(2, &Settings::default()).unwrap();
        state.load_from(&mut maps);
        assert_eq!(state.level.as_ref().unwrap().pickups.len(), 1);

        let mut now = 0.0;
        run_countdown(&mut state, &mut now);
        let input = TickInput {
            now_ms: now,
            players: hold(&[(0, RIGHT), (1, DOWN)]),
        };
        tick(&mut state, &input);
        assert!(state.level.as_ref().unwrap().pickups.is_empty());
        assert_eq!(state.players[0].effects.boost_until, Some(now + 3000.0));

        for _ in 0..10 {
            tick(&mut state, &input);
        }
        assert_eq!(state.phase, MatchPhase::LevelComplete);
        // The boost got player 0 home first
        assert_eq!(state.finish.as_slice(), &[0, 1]);

        assert!(state.proceed());
        state.load_from(&mut maps);
        let level = state.level.as_ref().unwrap();
        assert_eq!(level.pickups.len(), 1);
        assert_eq!(level.pickups[0].kind, PickupKind::Boost);
        assert!(state.players.iter().all(|p| p.effects == StatusEffects::default()));
        assert_eq!(state.players[0].pos, Vec2::new(450.0, 500.0));
        assert!(state.finish.is_empty());
    }

    #[test]
    fn test_lower_seat_claims_contested_pickup() {
        let mut state = Match::new(2, &Settings::default()).unwrap();
        state.load_from(&mut documents(CONTESTED, 1));
        let mut now = 0.0;
        run_countdown(&mut state, &mut now);
        state.drain_events();

        tick(&mut state, &TickInput {
            now_ms: now,
            players: hold(&[(0, RIGHT), (1, LEFT)]),
        });

        assert!(state.level.as_ref().unwrap().pickups.is_empty());
        assert!(state.players[0].effects.boost_until.is_some());
        assert_eq!(state.players[1].effects.boost_until, None);

        let collected: Vec<GameEvent> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PickupCollected { .. }))
            .collect();
        assert_eq!(
            collected,
            vec![GameEvent::PickupCollected {
                player: 0,
                kind: PickupKind::Boost
            }]
        );
    }
}
