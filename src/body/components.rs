//! Body records and the render-side marker component

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// One simulated sphere (unit mass)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
}

impl Body {
    pub fn new(position: Vec3, velocity: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
        }
    }

    /// Body at rest at `position`
    pub fn at_rest(position: Vec3, radius: f32) -> Self {
        Self::new(position, Vec3::ZERO, radius)
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.velocity.length_squared()
    }
}

/// Serializable copy of a body for logs, metrics and scenario checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub index: usize,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
}

impl BodySnapshot {
    pub fn from_body(index: usize, body: &Body) -> Self {
        Self {
            index,
            position: body.position.to_array(),
            velocity: body.velocity.to_array(),
        }
    }
}

/// Links a rendered sphere entity to its slot in the simulator arena
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyIndex(pub usize);

/// One body thrown from a controller this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Injection {
    /// Controller slot (0 = right hand, 1 = left hand)
    pub controller: usize,
    /// Arena index of the body that was reassigned
    pub body: usize,
    pub velocity: Vec3,
}

/// What happened during one simulator frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub injections: Vec<Injection>,
    /// Floor and ceiling reflections
    pub floor_impacts: u32,
    /// Wall reflections (x or z)
    pub wall_impacts: u32,
    /// Overlapping pairs resolved
    pub contacts: u32,
}

impl StepReport {
    pub fn is_quiet(&self) -> bool {
        self.injections.is_empty()
            && self.floor_impacts == 0
            && self.wall_impacts == 0
            && self.contacts == 0
    }
}
