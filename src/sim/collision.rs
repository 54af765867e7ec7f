//! Collision detection for player squares
//!
//! A probe box is tested against each category of level object in a fixed
//! priority order: static walls, dynamic obstacles, other players, boosts,
//! debuffs. The first blocking match wins. Pickups are only reached when
//! nothing blocked the probe, and a pickup never blocks movement.

use glam::Vec2;

use super::geom::{Field, Rect};
use super::level::{Level, PickupKind};
use super::motion::Player;
use super::obstacle::{Axis, DynamicObstacle, Sign};

/// Result of probing one candidate position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionOutcome {
    /// Movement to the probe position must be discarded
    pub blocked: bool,
    /// Displacement imposed by a moving obstacle this tick. Zero when the
    /// obstacle blocks head-on; any contact still triggers the pin check.
    pub push: Option<Vec2>,
    /// Pickup consumed by the probe
    pub pickup: Option<PickupKind>,
}

impl CollisionOutcome {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn wall() -> Self {
        Self {
            blocked: true,
            ..Self::default()
        }
    }

    fn carried(push: Vec2) -> Self {
        Self {
            blocked: true,
            push: Some(push),
            pickup: None,
        }
    }

    fn collected(kind: PickupKind) -> Self {
        Self {
            blocked: false,
            push: None,
            pickup: Some(kind),
        }
    }
}

/// Contact between a probe and an overlapping moving obstacle
///
/// A probe on the leading side of the obstacle (ahead of its trailing edge
/// in the direction of travel) is carried along at `step`. A probe the
/// obstacle is closing in on is blocked without a push. When the obstacle
/// is retreating and the probe straddles its far edge, neither applies and
/// the contact is ignored.
fn obstacle_contact(probe: &Rect, obstacle: &DynamicObstacle, step: f32) -> Option<Vec2> {
    let bounds = obstacle.bounds();
    let (p_lo, p_len, o_lo, o_len) = match obstacle.direction.axis {
        Axis::Horizontal => (probe.x, probe.w, bounds.x, bounds.w),
        Axis::Vertical => (probe.y, probe.h, bounds.y, bounds.h),
    };

    let (push, prevent_crossing) = match obstacle.direction.sign {
        Sign::Forward => (p_lo > o_lo, p_lo <= o_lo && p_lo + p_len > o_lo),
        Sign::Reverse => (
            p_lo + p_len < o_lo + o_len,
            p_lo >= o_lo && p_lo < o_lo + o_len,
        ),
    };

    if push {
        Some(obstacle.direction.velocity(step))
    } else if prevent_crossing {
        Some(Vec2::ZERO)
    } else {
        None
    }
}

/// Probe `probe` for player `mover`, consuming at most one pickup
///
/// `players` supplies the live squares of everyone else; the mover's own
/// entry is skipped.
pub fn resolve(
    probe: Rect,
    mover: usize,
    level: &mut Level,
    players: &[Player],
    player_size: f32,
    step: f32,
) -> CollisionOutcome {
    if level.obstacles.iter().any(|wall| probe.overlaps(wall)) {
        return CollisionOutcome::wall();
    }

    for obstacle in &level.dynamic {
        if !probe.overlaps(&obstacle.bounds()) {
            continue;
        }
        if let Some(push) = obstacle_contact(&probe, obstacle, step) {
            return CollisionOutcome::carried(push);
        }
    }

    let hits_player = players
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != mover)
        .any(|(_, other)| probe.overlaps(&Rect::square(other.pos, player_size)));
    if hits_player {
        return CollisionOutcome::wall();
    }

    for kind in [PickupKind::Boost, PickupKind::Debuff] {
        let found = level
            .pickups
            .iter()
            .position(|p| p.kind == kind && probe.overlaps(&p.bounds));
        if let Some(idx) = found {
            level.pickups.remove(idx);
            return CollisionOutcome::collected(kind);
        }
    }

    CollisionOutcome::clear()
}

#[derive(Debug, Default)]
struct Contacts {
    top: bool,
    bottom: bool,
    left: bool,
    right: bool,
}

impl Contacts {
    fn record(&mut self, square: &Rect, other: &Rect) {
        if !square.overlaps(other) {
            return;
        }
        if square.bottom() > other.y && square.y < other.y {
            self.bottom = true;
        }
        if square.y < other.bottom() && square.bottom() > other.bottom() {
            self.top = true;
        }
        if square.right() > other.x && square.x < other.x {
            self.right = true;
        }
        if square.x < other.right() && square.right() > other.right() {
            self.left = true;
        }
    }

    fn pinned(&self) -> bool {
        (self.top && self.bottom) || (self.left && self.right)
    }
}

/// True if a square at `pos` is squeezed from two opposite sides
///
/// Sides are contributed by static walls, dynamic obstacles and the field
/// edges (a square touching an edge counts as blocked on that side).
pub fn is_pinned(pos: Vec2, size: f32, level: &Level, field: &Field) -> bool {
    let square = Rect::square(pos, size);
    let mut contacts = Contacts::default();

    for wall in &level.obstacles {
        contacts.record(&square, wall);
    }
    for bounds in level.dynamic_bounds() {
        contacts.record(&square, &bounds);
    }

    if pos.x <= 0.0 {
        contacts.left = true;
    }
    if pos.x >= field.width - size {
        contacts.right = true;
    }
    if pos.y <= 0.0 {
        contacts.top = true;
    }
    if pos.y >= field.height - size {
        contacts.bottom = true;
    }

    contacts.pinned()
}
