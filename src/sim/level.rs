//! Level documents and the runtime level they load into
//!
//! A level document is the JSON served at `maps/map_{n}.json`. It is
//! validated once at load time; the resulting [`Level`] owns all geometry
//! for the duration of one level and is replaced wholesale on transition.

use std::collections::HashMap;
use std::path::PathBuf;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::{Circle, Rect};
use super::obstacle::{Direction, DynamicObstacle};
use crate::consts::PICKUP_SIZE;

/// Why a level could not be loaded. Every variant ends the match.
#[derive(Debug, thiserror::Error)]
pub enum LevelLoadError {
    /// No document exists for this level number
    #[error("level {level} is not available")]
    NotFound { level: u32 },

    /// The document is not valid level JSON
    #[error("level {level} is malformed: {source}")]
    Malformed {
        level: u32,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but cannot host this match
    #[error("level {level} is incomplete: {reason}")]
    Incomplete { level: u32, reason: String },

    /// The provider failed before a document was available
    #[error("level {level} could not be fetched: {details}")]
    Transport { level: u32, details: String },
}

impl LevelLoadError {
    pub fn level(&self) -> u32 {
        match self {
            LevelLoadError::NotFound { level }
            | LevelLoadError::Malformed { level, .. }
            | LevelLoadError::Incomplete { level, .. }
            | LevelLoadError::Transport { level, .. } => *level,
        }
    }
}

/// Source of raw level documents, indexed from 1
pub trait LevelProvider {
    fn fetch(&mut self, level: u32) -> Result<String, LevelLoadError>;
}

impl LevelProvider for HashMap<u32, String> {
    fn fetch(&mut self, level: u32) -> Result<String, LevelLoadError> {
        self.get(&level)
            .cloned()
            .ok_or(LevelLoadError::NotFound { level })
    }
}

/// Reads `map_{n}.json` files from a directory
#[derive(Debug, Clone)]
pub struct MapDirectory {
    pub root: PathBuf,
}

impl MapDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, level: u32) -> PathBuf {
        self.root.join(format!("map_{level}.json"))
    }
}

impl LevelProvider for MapDirectory {
    fn fetch(&mut self, level: u32) -> Result<String, LevelLoadError> {
        let path = self.path_for(level);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LevelLoadError::NotFound { level })
            }
            Err(e) => Err(LevelLoadError::Transport {
                level,
                details: format!("{}: {e}", path.display()),
            }),
        }
    }
}

/// A point given either as `[x, y]` or as the corner of `[x, y, w, h]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Corner {
    Point([f32; 2]),
    Rect([f32; 4]),
}

impl Corner {
    pub fn origin(&self) -> Vec2 {
        match *self {
            Corner::Point([x, y]) | Corner::Rect([x, y, _, _]) => Vec2::new(x, y),
        }
    }
}

/// Direction tags as written in level files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionTag {
    #[serde(rename = "h")]
    Horizontal,
    #[serde(rename = "h-reverse")]
    HorizontalReverse,
    #[serde(rename = "v")]
    Vertical,
    #[serde(rename = "v-reverse")]
    VerticalReverse,
}

impl From<DirectionTag> for Direction {
    fn from(tag: DirectionTag) -> Self {
        match tag {
            DirectionTag::Horizontal => Direction::RIGHT,
            DirectionTag::HorizontalReverse => Direction::LEFT,
            DirectionTag::Vertical => Direction::DOWN,
            DirectionTag::VerticalReverse => Direction::UP,
        }
    }
}

/// `[[x, y, w, h], [x, y], "h"]`: start box, far corner, initial heading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicObstacleEntry(pub [f32; 4], pub Corner, pub DirectionTag);

/// Wire format of a level document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDocument {
    pub obstacles: Vec<[f32; 4]>,
    pub finish_line: Vec<[f32; 3]>,
    pub finish_positions: Vec<Corner>,
    pub start_positions: Vec<Corner>,
    #[serde(default)]
    pub dyn_obstacles: Vec<DynamicObstacleEntry>,
    #[serde(default)]
    pub booster: Vec<Corner>,
    #[serde(default)]
    pub debuff: Vec<Corner>,
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Boost,
    Debuff,
}

/// A consumable pickup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    pub bounds: Rect,
}

impl Pickup {
    fn from_corner(kind: PickupKind, corner: &Corner) -> Self {
        let bounds = match *corner {
            Corner::Point([x, y]) => Rect::new(x, y, PICKUP_SIZE, PICKUP_SIZE),
            Corner::Rect([x, y, w, h]) => Rect::new(x, y, w, h),
        };
        Self { kind, bounds }
    }
}

/// Geometry and live simulation state of the level being played
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Level number (1-based)
    pub number: u32,
    /// Static walls
    pub obstacles: Vec<Rect>,
    /// Oscillating obstacles
    pub dynamic: Vec<DynamicObstacle>,
    /// Finish zones
    pub finish_zones: Vec<Circle>,
    /// Resting spots for finished players, by placement
    pub podium: Vec<Vec2>,
    /// Uncollected pickups
    pub pickups: Vec<Pickup>,
    /// Spawn points, by player index
    pub start_positions: Vec<Vec2>,
}

impl Level {
    /// Parse and validate a document for a match of `player_count` players
    pub fn parse(number: u32, json: &str, player_count: usize) -> Result<Self, LevelLoadError> {
        let doc: LevelDocument = serde_json::from_str(json)
            .map_err(|source| LevelLoadError::Malformed { level: number, source })?;
        Self::from_document(number, &doc, player_count)
    }

    pub fn from_document(
        number: u32,
        doc: &LevelDocument,
        player_count: usize,
    ) -> Result<Self, LevelLoadError> {
        let incomplete = |reason: String| LevelLoadError::Incomplete {
            level: number,
            reason,
        };

        if doc.start_positions.len() < player_count {
            return Err(incomplete(format!(
                "{} start positions for {player_count} players",
                doc.start_positions.len()
            )));
        }
        if doc.finish_positions.len() < player_count {
            return Err(incomplete(format!(
                "{} finish positions for {player_count} players",
                doc.finish_positions.len()
            )));
        }
        if doc.finish_line.is_empty() {
            return Err(incomplete("no finish zone".to_string()));
        }

        let pickups = doc
            .booster
            .iter()
            .map(|c| Pickup::from_corner(PickupKind::Boost, c))
            .chain(
                doc.debuff
                    .iter()
                    .map(|c| Pickup::from_corner(PickupKind::Debuff, c)),
            )
            .collect();

        Ok(Self {
            number,
            obstacles: doc
                .obstacles
                .iter()
                .map(|&[x, y, w, h]| Rect::new(x, y, w, h))
                .collect(),
            dynamic: doc
                .dyn_obstacles
                .iter()
                .map(|DynamicObstacleEntry(start, end, tag)| {
                    let [x, y, w, h] = *start;
                    DynamicObstacle::new(Rect::new(x, y, w, h), end.origin(), (*tag).into())
                })
                .collect(),
            finish_zones: doc
                .finish_line
                .iter()
                .map(|&[x, y, r]| Circle::new(x, y, r))
                .collect(),
            podium: doc.finish_positions.iter().map(Corner::origin).collect(),
            pickups,
            start_positions: doc
                .start_positions
                .iter()
                .take(player_count)
                .map(Corner::origin)
                .collect(),
        })
    }

    /// Start position for a player, if the level defines one
    pub fn start_for(&self, index: usize) -> Option<Vec2> {
        self.start_positions.get(index).copied()
    }

    /// Live boxes of every dynamic obstacle, in definition order
    pub fn dynamic_bounds(&self) -> impl Iterator<Item = Rect> + '_ {
        self.dynamic.iter().map(DynamicObstacle::bounds)
    }

    #[cfg(test)]
    pub fn remaining(&self, kind: PickupKind) -> usize {
        self.pickups.iter().filter(|p| p.kind == kind).count()
    }
}
