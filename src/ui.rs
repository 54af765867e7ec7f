//! Result-screen overlay layout
//!
//! The only interactive element is the button shown on the level-complete
//! and game-over screens. Drawing happens in the page; this module owns
//! where the button is and what a click on it means.

use glam::Vec2;
use serde::Serialize;

use crate::sim::geom::{Field, Rect};
use crate::sim::{Match, MatchPhase};

pub const BUTTON_WIDTH: f32 = 150.0;
pub const BUTTON_HEIGHT: f32 = 50.0;

/// What the result button does when clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ButtonAction {
    NextLevel,
    PlayAgain,
}

impl ButtonAction {
    /// Button for the current phase, if one is shown
    pub fn for_phase(phase: MatchPhase) -> Option<Self> {
        match phase {
            MatchPhase::LevelComplete => Some(ButtonAction::NextLevel),
            MatchPhase::GameOver => Some(ButtonAction::PlayAgain),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ButtonAction::NextLevel => "Next Level",
            ButtonAction::PlayAgain => "Play Again",
        }
    }
}

/// Result button, centered left of the result slots
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultButton {
    pub bounds: Rect,
    pub action: ButtonAction,
}

impl ResultButton {
    /// Button region on a field of the given size
    pub fn region(field: &Field) -> Rect {
        Rect::new(
            (field.width - BUTTON_WIDTH) / 2.0 - BUTTON_WIDTH,
            (field.height - BUTTON_WIDTH) / 2.0 + 85.0,
            BUTTON_WIDTH,
            BUTTON_HEIGHT,
        )
    }

    /// The button visible for `state`, if any
    pub fn for_match(state: &Match) -> Option<Self> {
        ButtonAction::for_phase(state.phase).map(|action| Self {
            bounds: Self::region(&state.tuning.field),
            action,
        })
    }

    /// Inclusive hit test in canvas coordinates
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.bounds.x
            && point.x <= self.bounds.right()
            && point.y >= self.bounds.y
            && point.y <= self.bounds.bottom()
    }
}

/// Route a canvas click to the match; returns true if it triggered the button
pub fn handle_click(state: &mut Match, point: Vec2) -> bool {
    let Some(button) = ResultButton::for_match(state) else {
        return false;
    };
    if !button.contains(point) {
        return false;
    }
    match button.action {
        ButtonAction::NextLevel => state.proceed(),
        ButtonAction::PlayAgain => state.restart(),
    }
}
