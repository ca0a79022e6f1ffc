//! Room bounds the bodies live in

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{BODY_RADIUS, ROOM_HEIGHT, ROOM_SIDE};

/// Axis-aligned room: floor at y = 0, centred on the origin in x/z
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Side length in x and z
    pub side: f32,
    /// Distance from floor to ceiling
    pub height: f32,
    /// Radius of the bodies the room holds (bounds are for body centres)
    pub radius: f32,
}

impl Default for Room {
    fn default() -> Self {
        Self {
            side: ROOM_SIDE,
            height: ROOM_HEIGHT,
            radius: BODY_RADIUS,
        }
    }
}

impl Room {
    pub fn new(side: f32, height: f32, radius: f32) -> Self {
        Self {
            side,
            height,
            radius,
        }
    }

    /// Half extent minus body radius: centres stay in [-range, range] on x/z
    pub fn range(&self) -> f32 {
        self.side / 2.0 - self.radius
    }

    /// Lowest allowed centre height
    pub fn floor(&self) -> f32 {
        self.radius
    }

    /// Height above which a body gets reflected back down
    pub fn ceiling(&self) -> f32 {
        self.height
    }

    /// Centre of the room volume (used for drawing the outline)
    pub fn center(&self) -> Vec3 {
        Vec3::new(0.0, self.height / 2.0, 0.0)
    }

    /// True when a body centre satisfies the floor and wall bounds
    pub fn contains(&self, p: Vec3) -> bool {
        let range = self.range();
        p.x >= -range && p.x <= range && p.z >= -range && p.z <= range && p.y >= self.floor()
    }

    /// Clamp a body centre into the floor and wall bounds.
    /// The ceiling is not a hard limit.
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        let range = self.range();
        Vec3::new(
            p.x.clamp(-range, range),
            p.y.max(self.floor()),
            p.z.clamp(-range, range),
        )
    }
}
