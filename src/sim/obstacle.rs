//! Dynamic obstacles: rectangles oscillating along one axis
//!
//! Each obstacle moves a fixed step per tick toward its current heading and
//! turns around once the moved edge reaches or passes either end of its
//! travel range. The flip happens after the move without clamping, so the
//! reported box can overshoot the nominal range by up to one step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;

/// Axis of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Heading along the axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    /// Toward +x / +y
    Forward,
    /// Toward -x / -y
    Reverse,
}

impl Sign {
    #[inline]
    pub fn factor(self) -> f32 {
        match self {
            Sign::Forward => 1.0,
            Sign::Reverse => -1.0,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Sign::Forward => Sign::Reverse,
            Sign::Reverse => Sign::Forward,
        }
    }
}

/// Movement direction of a dynamic obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
    pub axis: Axis,
    pub sign: Sign,
}

impl Direction {
    pub const RIGHT: Self = Self::new(Axis::Horizontal, Sign::Forward);
    pub const LEFT: Self = Self::new(Axis::Horizontal, Sign::Reverse);
    pub const DOWN: Self = Self::new(Axis::Vertical, Sign::Forward);
    pub const UP: Self = Self::new(Axis::Vertical, Sign::Reverse);

    pub const fn new(axis: Axis, sign: Sign) -> Self {
        Self { axis, sign }
    }

    /// Same axis, opposite heading
    pub fn flipped(self) -> Self {
        Self::new(self.axis, self.sign.flipped())
    }

    /// Displacement of one step in this direction
    pub fn velocity(self, step: f32) -> Vec2 {
        let v = self.sign.factor() * step;
        match self.axis {
            Axis::Horizontal => Vec2::new(v, 0.0),
            Axis::Vertical => Vec2::new(0.0, v),
        }
    }
}

/// An oscillating obstacle: its definition paired with its live box
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicObstacle {
    /// Box at level start (also one end of travel)
    pub start: Rect,
    /// Corner marking the other end of travel
    pub end: Vec2,
    /// Current heading
    pub direction: Direction,
    /// Current bounding box
    current: Rect,
}

impl DynamicObstacle {
    pub fn new(start: Rect, end: Vec2, direction: Direction) -> Self {
        Self {
            start,
            end,
            direction,
            current: start,
        }
    }

    /// Current bounding box. Does not advance the simulation.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.current
    }

    /// Travel range (min, max) of the leading coordinate on the active axis
    pub fn travel_range(&self) -> (f32, f32) {
        let (a, b) = match self.direction.axis {
            Axis::Horizontal => (self.start.x, self.end.x),
            Axis::Vertical => (self.start.y, self.end.y),
        };
        (a.min(b), a.max(b))
    }

    /// Move one step and flip heading if an end of travel was reached
    pub fn advance(&mut self, step: f32) {
        let delta = self.direction.sign.factor() * step;
        let coord = match self.direction.axis {
            Axis::Horizontal => {
                self.current.x += delta;
                self.current.x
            }
            Axis::Vertical => {
                self.current.y += delta;
                self.current.y
            }
        };

        let (lo, hi) = self.travel_range();
        if coord <= lo || coord >= hi {
            self.direction = self.direction.flipped();
        }
    }
}

/// Advance every obstacle in level order
pub fn advance_all(obstacles: &mut [DynamicObstacle], step: f32) {
    for obstacle in obstacles {
        obstacle.advance(step);
    }
}
