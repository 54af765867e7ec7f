//! Maze Rush entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use serde::Serialize;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, Response};

    use maze_rush::sim::{
        Frame, GameEvent, LevelLoadError, Match, MatchPhase, TickInput, tick,
    };
    use maze_rush::ui::{self, ResultButton};
    use maze_rush::{InputSurface, Settings, audio::AudioManager};

    // Page-side hooks; the page draws and owns the score chart
    #[wasm_bindgen(inline_js = "
        export function selected_player_count() {
            const params = new URLSearchParams(window.location.search);
            const n = parseInt(params.get('players') || '2', 10);
            return Number.isFinite(n) ? n : 2;
        }

        export function render_frame(json) {
            const hooks = window.mazeRush;
            if (hooks && hooks.renderFrame) {
                hooks.renderFrame(JSON.parse(json));
            }
        }

        export function update_score_chart(json) {
            const hooks = window.mazeRush;
            if (hooks && hooks.updateScoreChart) {
                hooks.updateScoreChart(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        fn selected_player_count() -> u32;
        fn render_frame(json: &str);
        fn update_score_chart(json: &str);
    }

    /// Everything the page needs to draw one frame
    #[derive(Serialize)]
    struct RenderPacket<'a> {
        #[serde(flatten)]
        frame: Frame<'a>,
        button: Option<ResultButton>,
        field_width: f32,
        field_height: f32,
    }

    /// Game instance holding all state
    struct Game {
        state: Match,
        settings: Settings,
        input: InputSurface,
        audio: AudioManager,
        last_phase: MatchPhase,
    }

    impl Game {
        fn new(state: Match, settings: Settings) -> Self {
            let audio = AudioManager::new(&settings);
            let last_phase = state.phase;
            Self {
                state,
                settings,
                input: InputSurface::new(),
                audio,
                last_phase,
            }
        }

        /// Run one simulation tick
        fn update(&mut self, time: f64) {
            let input = TickInput {
                now_ms: time,
                players: self.input,
            };
            tick(&mut self.state, &input);

            if self.state.phase != self.last_phase {
                log::debug!("Phase {:?} -> {:?}", self.last_phase, self.state.phase);
                self.last_phase = self.state.phase;
            }
        }

        /// Forward simulation events to audio and the scoreboard
        fn dispatch_events(&mut self) {
            for event in self.state.drain_events() {
                match event {
                    GameEvent::Audio(cue) => self.audio.play(cue),
                    GameEvent::StandingsUpdated(standings) => {
                        match serde_json::to_string(&standings) {
                            Ok(json) => update_score_chart(&json),
                            Err(e) => log::warn!("Failed to encode standings: {}", e),
                        }
                    }
                    other => log::debug!("{:?}", other),
                }
            }
        }

        /// Render the current frame
        fn render(&self) {
            let packet = RenderPacket {
                frame: self.state.frame(),
                button: ResultButton::for_match(&self.state),
                field_width: self.state.tuning.field.width,
                field_height: self.state.tuning.field.height,
            };
            match serde_json::to_string(&packet) {
                Ok(json) => render_frame(&json),
                Err(e) => log::warn!("Failed to encode frame: {}", e),
            }
        }

        fn toggle_mute(&mut self) {
            self.settings.muted = !self.settings.muted;
            self.audio.apply_settings(&self.settings);
            self.settings.save();
            log::info!("Muted: {}", self.settings.muted);
        }
    }

    /// Fetch a level document over HTTP
    async fn fetch_document(url: &str, level: u32) -> Result<String, LevelLoadError> {
        let transport = |e: JsValue| LevelLoadError::Transport {
            level,
            details: format!("{:?}", e),
        };

        let window = web_sys::window().ok_or_else(|| LevelLoadError::Transport {
            level,
            details: "no window".to_string(),
        })?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(transport)?
            .dyn_into()
            .map_err(transport)?;

        if response.status() == 404 {
            return Err(LevelLoadError::NotFound { level });
        }
        if !response.ok() {
            return Err(LevelLoadError::Transport {
                level,
                details: format!("HTTP {}", response.status()),
            });
        }

        let text = JsFuture::from(response.text().map_err(transport)?)
            .await
            .map_err(transport)?;
        text.as_string().ok_or_else(|| LevelLoadError::Transport {
            level,
            details: "response body is not text".to_string(),
        })
    }

    fn start_pending_load(game: &Rc<RefCell<Game>>) {
        let (level, url) = {
            let mut g = game.borrow_mut();
            let Some(level) = g.state.take_load_request() else {
                return;
            };
            let url = g.settings.level_url(level);
            (level, url)
        };

        log::info!("Fetching {}", url);
        let game = game.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let document = fetch_document(&url, level).await;
            game.borrow_mut().state.finish_loading(level, document);
        });
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Maze Rush starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("gameCanvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #gameCanvas element");
            return;
        };

        let settings = Settings::load();
        canvas.set_width(settings.field_width as u32);
        canvas.set_height(settings.field_height as u32);

        let player_count = selected_player_count() as usize;
        let state = match Match::new(player_count, &settings) {
            Ok(state) => state,
            Err(e) => {
                log::error!("{}", e);
                return;
            }
        };
        log::info!("Match created for {} players", player_count);

        let game = Rc::new(RefCell::new(Game::new(state, settings)));

        setup_input_handlers(&canvas, game.clone());

        request_animation_frame(game);

        log::info!("Maze Rush running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        for (kind, pressed) in [("keydown", true), ("keyup", false)] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                if key.starts_with("Arrow") {
                    event.prevent_default();
                }

                let mut g = game.borrow_mut();
                if pressed && key.eq_ignore_ascii_case("m") {
                    g.toggle_mute();
                    return;
                }
                let Game {
                    state,
                    settings,
                    input,
                    ..
                } = &mut *g;
                input.handle_key(&settings.key_bindings, state.player_count, &key, pressed);
            });
            let _ = window.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Release everything on focus loss so nobody keeps running
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().input.clear();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                // Client pixels to canvas units
                let scale_x = canvas_clone.width() as f32 / canvas_clone.client_width().max(1) as f32;
                let scale_y =
                    canvas_clone.height() as f32 / canvas_clone.client_height().max(1) as f32;
                let point = Vec2::new(
                    event.offset_x() as f32 * scale_x,
                    event.offset_y() as f32 * scale_y,
                );

                let mut g = game.borrow_mut();
                if ui::handle_click(&mut g.state, point) {
                    log::info!("Result button pressed");
                }
            });
            let _ = canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        start_pending_load(&game);
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.dispatch_events();
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless runner: plays `map_1.json`, `map_2.json`, ... from a directory
/// through the match state machine with idle players, reporting what each
/// level does in a fixed number of active ticks.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use maze_rush::Settings;
    use maze_rush::sim::{GameEvent, MapDirectory, Match, MatchPhase, TickInput, tick};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| "maps".to_string());
    let player_count: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(2);
    let ticks: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(600);

    log::info!("Maze Rush (native) running levels in {}", dir);
    let settings = Settings::load();
    let mut state = match Match::new(player_count, &settings) {
        Ok(state) => state,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };
    let mut maps = MapDirectory::new(&dir);
    let mut now = 0.0;
    let mut failures = 0;

    for number in 1.. {
        if !maps.path_for(number).exists() {
            break;
        }
        state.skip_to_level(number);
        state.load_from(&mut maps);
        if state.phase == MatchPhase::GameOver {
            failures += 1;
            continue;
        }

        let mut active = 0;
        let mut respawns = 0;
        let mut pickups = 0;
        while active < ticks {
            tick(&mut state, &TickInput {
                now_ms: now,
                ..Default::default()
            });
            now += FRAME_MS;
            for event in state.drain_events() {
                match event {
                    GameEvent::PlayerRespawned { .. } => respawns += 1,
                    GameEvent::PickupCollected { .. } => pickups += 1,
                    _ => {}
                }
            }
            match state.phase {
                MatchPhase::Active => active += 1,
                MatchPhase::LevelComplete | MatchPhase::GameOver => break,
                _ => {}
            }
        }

        if let Some(level) = &state.level {
            println!(
                "level {:>2}: {} walls, {} moving obstacles, {} finish zones, {} pickups left",
                number,
                level.obstacles.len(),
                level.dynamic.len(),
                level.finish_zones.len(),
                level.pickups.len()
            );
            for (i, obstacle) in level.dynamic.iter().enumerate() {
                let bounds = obstacle.bounds();
                println!(
                    "  obstacle {}: at ({:.1}, {:.1}) heading {:?}",
                    i, bounds.x, bounds.y, obstacle.direction
                );
            }
        }
        println!(
            "  {} ticks ({} active in match): {} respawns, {} pickups collected",
            active, state.time_ticks, respawns, pickups
        );
    }

    if failures > 0 {
        log::error!("{} level(s) failed to load", failures);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
