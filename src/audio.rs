//! Audio playback using HTML media elements
//!
//! One preloaded `<audio>` element per cue. Music tracks loop until the
//! next stop-all cue.

use web_sys::HtmlAudioElement;

use crate::settings::Settings;
use crate::sim::AudioCue;

/// A sound file and how it is played
struct Track {
    element: Option<HtmlAudioElement>,
    /// Relative loudness of this file
    gain: f32,
    music: bool,
}

impl Track {
    fn new(src: &str, gain: f32, music: bool) -> Self {
        let element = HtmlAudioElement::new_with_src(src).ok();
        match &element {
            Some(el) => el.set_loop(music),
            None => log::warn!("Failed to create audio element for {}", src),
        }
        Self {
            element,
            gain,
            music,
        }
    }

    fn start(&self, volume: f32) {
        let Some(el) = &self.element else { return };
        el.set_volume((volume * self.gain).clamp(0.0, 1.0) as f64);
        el.set_current_time(0.0);
        if let Err(e) = el.play() {
            log::debug!("Audio playback rejected: {:?}", e);
        }
    }

    fn stop(&self) {
        if let Some(el) = &self.element {
            let _ = el.pause();
            el.set_current_time(0.0);
        }
    }
}

/// Audio manager for the game
pub struct AudioManager {
    game_start: Track,
    countdown: Track,
    level_finished: Track,
    game_over: Track,
    game_loop: Track,
    sfx_volume: f32,
    music_volume: f32,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        let mut audio = Self {
            game_start: Track::new("sounds/game_start.mp3", 1.0, false),
            countdown: Track::new("sounds/countdown.mp3", 0.3, false),
            level_finished: Track::new("sounds/level_finished.mp3", 1.0, false),
            game_over: Track::new("sounds/game_over.mp3", 1.0, true),
            game_loop: Track::new("sounds/game_loop.mp3", 1.0, true),
            sfx_volume: 0.0,
            music_volume: 0.0,
        };
        audio.apply_settings(settings);
        audio
    }

    /// Pick up volume and mute changes
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sfx_volume = settings.effective_sfx_volume();
        self.music_volume = settings.effective_music_volume();
        if settings.muted {
            self.stop_all();
        }
    }

    fn tracks(&self) -> [&Track; 5] {
        [
            &self.game_start,
            &self.countdown,
            &self.level_finished,
            &self.game_over,
            &self.game_loop,
        ]
    }

    pub fn stop_all(&self) {
        for track in self.tracks() {
            track.stop();
        }
    }

    /// Play a cue from the simulation
    pub fn play(&self, cue: AudioCue) {
        let track = match cue {
            AudioCue::StopAll => {
                self.stop_all();
                return;
            }
            AudioCue::LevelStart => &self.game_start,
            AudioCue::CountdownTick => &self.countdown,
            AudioCue::LevelFinished => &self.level_finished,
            AudioCue::GameOver => &self.game_over,
            AudioCue::LoopStart => &self.game_loop,
        };

        let volume = if track.music {
            self.music_volume
        } else {
            self.sfx_volume
        };
        if volume <= 0.0 {
            return;
        }
        track.start(volume);
    }
}
