//! Body Simulator - owns the body arena and advances it one frame at a time

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::body::components::*;
use crate::body::physics::*;
use crate::constants::*;
use crate::input::{ControllerInputs, Pose};
use crate::room::Room;
use crate::tuning::SimTuning;

/// Exclusive owner of every body.
///
/// The render side reads `bodies()` each frame; nothing outside the
/// simulator holds a mutable reference into the arena.
#[derive(Resource)]
pub struct BodySimulator {
    bodies: Vec<Body>,
    room: Room,
    tuning: SimTuning,
    /// Next body to hand to a selecting controller (wraps at body count)
    cursor: usize,
    rng: StdRng,
    frame: u64,
}

impl BodySimulator {
    /// Create `tuning.body_count` bodies scattered through the lower room.
    /// `seed = None` seeds from OS entropy.
    pub fn new(tuning: SimTuning, seed: Option<u64>) -> Self {
        let mut rng = make_rng(seed);
        let radius = tuning.body_radius;
        let room = tuning.room();
        let half_width = BODY_SPAWN_HALF_WIDTH.min(room.range());
        let top = BODY_SPAWN_HEIGHT.min(room.ceiling());

        let bodies = (0..tuning.body_count)
            .map(|_| {
                let position = Vec3::new(
                    sample_span(&mut rng, -half_width, half_width),
                    sample_span(&mut rng, radius, top),
                    sample_span(&mut rng, -half_width, half_width),
                );
                let velocity = Vec3::new(
                    rng.gen_range(-BODY_SPAWN_SPEED..BODY_SPAWN_SPEED),
                    rng.gen_range(-BODY_SPAWN_SPEED..BODY_SPAWN_SPEED),
                    rng.gen_range(-BODY_SPAWN_SPEED..BODY_SPAWN_SPEED),
                );
                Body::new(position, velocity, radius)
            })
            .collect();

        Self {
            bodies,
            room,
            tuning,
            cursor: 0,
            rng,
            frame: 0,
        }
    }

    /// Create a simulator around an explicit set of bodies.
    /// The tuning's body count is replaced by `bodies.len()`.
    pub fn with_bodies(bodies: Vec<Body>, mut tuning: SimTuning, seed: Option<u64>) -> Self {
        tuning.body_count = bodies.len();
        Self {
            room: tuning.room(),
            bodies,
            tuning,
            cursor: 0,
            rng: make_rng(seed),
            frame: 0,
        }
    }

    /// Advance one frame.
    ///
    /// Order: controller injections, position update, room bounds,
    /// pairwise contacts, containment, gravity. A frame with no elapsed
    /// time is skipped entirely.
    pub fn step(&mut self, dt: f32, controllers: &ControllerInputs) -> StepReport {
        let mut report = StepReport::default();
        if dt <= 0.0 {
            return report;
        }

        for (controller, state) in controllers.0.iter().enumerate() {
            if state.is_selecting
                && let Some(injection) = self.inject(controller, &state.pose)
            {
                report.injections.push(injection);
            }
        }

        integrate_positions(&mut self.bodies, dt);

        for body in self.bodies.iter_mut() {
            let hits = reflect_from_room(body, &self.room, &self.tuning);
            if hits.floor {
                report.floor_impacts += 1;
            }
            report.wall_impacts += hits.walls;
        }

        report.contacts = resolve_collisions(&mut self.bodies);

        // Contact pushes must not carry a body through the floor or walls
        for body in self.bodies.iter_mut() {
            body.position = self.room.clamp(body.position);
        }

        apply_gravity(&mut self.bodies, self.tuning.gravity, dt);

        self.frame += 1;
        report
    }

    /// Move the next body in the round-robin to `pose` and throw it.
    /// Returns None only when the arena is empty.
    pub fn inject(&mut self, controller: usize, pose: &Pose) -> Option<Injection> {
        if self.bodies.is_empty() {
            return None;
        }

        let index = self.cursor;
        let velocity = throw_velocity(pose, &self.tuning, &mut self.rng);
        let body = &mut self.bodies[index];
        body.position = pose.position;
        body.velocity = velocity;

        self.cursor = (self.cursor + 1) % self.bodies.len();

        Some(Injection {
            controller,
            body: index,
            velocity,
        })
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, index: usize) -> Option<&Body> {
        self.bodies.get(index)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Index the next injection will claim
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Frames advanced so far (skipped zero-length frames excluded)
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn tuning(&self) -> &SimTuning {
        &self.tuning
    }

    /// Replace the live tuning values; arena shape stays as created
    pub fn set_tuning(&mut self, tuning: &SimTuning) {
        self.tuning.merge_live(tuning);
    }

    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, b)| BodySnapshot::from_body(i, b))
            .collect()
    }

    /// Total kinetic energy (unit masses)
    pub fn kinetic_energy(&self) -> f32 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }

    /// Deepest remaining pair overlap
    pub fn max_penetration(&self) -> f32 {
        max_penetration(&self.bodies)
    }

    /// Bodies currently violating the floor or wall bounds
    pub fn out_of_bounds(&self) -> usize {
        self.bodies
            .iter()
            .filter(|b| !self.room.contains(b.position))
            .count()
    }
}

/// Uniform in [lo, hi), or `lo` when the span is empty
fn sample_span(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.gen_range(lo..hi) } else { lo }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
