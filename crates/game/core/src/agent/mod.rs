//! Frame-stepped agent controllers.
//!
//! Both agent kinds share the same movement primitives: steer toward
//! a waypoint at a bounded step, detect and snap to tile centers, and
//! collide through axis-aligned boxes.

pub mod pursuer;
pub mod vehicle;

pub use pursuer::{Pursuer, PursuerState, PursuerStateKind, WaitTimer};
pub use vehicle::Vehicle;

use crate::grid::Vec2;

/// World-space extent of an agent, centered on its position.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Footprint {
    pub width: f32,
    pub height: f32,
}

impl Footprint {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub fn from_center(center: Vec2, footprint: Footprint) -> Self {
        Self {
            x: center.x - footprint.width / 2.0,
            y: center.y - footprint.height / 2.0,
            width: footprint.width,
            height: footprint.height,
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Outcome of one bounded steering step.
pub(crate) enum Steer {
    /// Already within `eps` of the target; position untouched.
    Arrived,
    /// Moved toward the target, clamped to not overshoot.
    Moved,
}

/// Moves `position` toward `target` by at most `max_step`.
pub(crate) fn steer_toward(position: &mut Vec2, target: Vec2, max_step: f32, eps: f32) -> Steer {
    let dx = target.x - position.x;
    let dy = target.y - position.y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist < eps {
        return Steer::Arrived;
    }
    let step = max_step.min(dist);
    position.x += dx / dist * step;
    position.y += dy / dist * step;
    Steer::Moved
}
