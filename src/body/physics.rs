//! Per-frame body physics: integration, room bounds, pairwise contacts

use bevy::prelude::*;
use rand::Rng;

use crate::body::components::Body;
use crate::constants::COINCIDENT_EPSILON;
use crate::input::Pose;
use crate::room::Room;
use crate::tuning::SimTuning;

/// Which room surfaces a body touched this frame
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryHits {
    pub floor: bool,
    pub walls: u32,
}

/// Advance positions by velocity
pub fn integrate_positions(bodies: &mut [Body], dt: f32) {
    for body in bodies.iter_mut() {
        body.position += body.velocity * dt;
    }
}

/// Apply gravity to velocities.
/// Runs after the position update so this frame moved on pre-gravity velocity.
pub fn apply_gravity(bodies: &mut [Body], gravity: f32, dt: f32) {
    for body in bodies.iter_mut() {
        body.velocity.y -= gravity * dt;
    }
}

/// Keep a body inside the room.
/// Walls reflect without loss; the floor damps horizontal speed and
/// reflects vertical speed with restitution.
pub fn reflect_from_room(body: &mut Body, room: &Room, tuning: &SimTuning) -> BoundaryHits {
    let mut hits = BoundaryHits::default();
    let range = room.range();

    if body.position.x < -range || body.position.x > range {
        body.position.x = body.position.x.clamp(-range, range);
        body.velocity.x = -body.velocity.x;
        hits.walls += 1;
    }

    let below_floor = body.position.y < room.floor();
    // Ceiling reflects rising bodies only
    let above_ceiling = body.position.y > room.ceiling() && body.velocity.y > 0.0;
    if below_floor || above_ceiling {
        body.position.y = body.position.y.max(room.floor());
        body.velocity.x *= tuning.floor_friction;
        body.velocity.y = -body.velocity.y * tuning.floor_restitution;
        body.velocity.z *= tuning.floor_friction;
        hits.floor = true;
    }

    if body.position.z < -range || body.position.z > range {
        body.position.z = body.position.z.clamp(-range, range);
        body.velocity.z = -body.velocity.z;
        hits.walls += 1;
    }

    hits
}

/// Separate one overlapping pair and exchange the normal velocity component.
/// Equal masses, so the exchange conserves the pair's total momentum.
/// Returns true when the pair was in contact.
pub fn resolve_pair(a: &mut Body, b: &mut Body) -> bool {
    let min_distance = a.radius + b.radius;
    let delta = a.position - b.position;
    let distance = delta.length();

    if distance >= min_distance {
        return false;
    }

    // Coincident centres have no direction; split them vertically
    let normal = if distance > COINCIDENT_EPSILON {
        delta / distance
    } else {
        Vec3::Y
    };

    let push = normal * ((min_distance - distance) * 0.5);
    a.position += push;
    b.position -= push;

    let exchange = normal * (a.velocity - b.velocity).dot(normal);
    a.velocity -= exchange;
    b.velocity += exchange;

    true
}

/// Single ordered sweep over every pair i < j.
/// Earlier pairs move bodies before later pairs see them; no iteration.
pub fn resolve_collisions(bodies: &mut [Body]) -> u32 {
    let mut contacts = 0;
    for i in 0..bodies.len() {
        let (head, tail) = bodies.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if resolve_pair(a, b) {
                contacts += 1;
            }
        }
    }
    contacts
}

/// Deepest overlap between any two bodies (0 when none overlap)
pub fn max_penetration(bodies: &[Body]) -> f32 {
    let mut deepest: f32 = 0.0;
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            let overlap = a.radius + b.radius - a.position.distance(b.position);
            deepest = deepest.max(overlap);
        }
    }
    deepest
}

/// Random throw velocity in the controller's frame.
/// Local x/y spread around zero, local z strongly negative (away from the hand).
pub fn throw_velocity(pose: &Pose, tuning: &SimTuning, rng: &mut impl Rng) -> Vec3 {
    let local = Vec3::new(
        (rng.gen_range(0.0..1.0) - 0.5) * tuning.throw_spread,
        (rng.gen_range(0.0..1.0) - 0.5) * tuning.throw_spread,
        rng.gen_range(0.0..1.0) - tuning.throw_push,
    );
    pose.orientation * local
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BODY_RADIUS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn body(x: f32, y: f32, z: f32) -> Body {
        Body::at_rest(Vec3::new(x, y, z), BODY_RADIUS)
    }

    #[test]
    fn test_wall_reflection_is_elastic() {
        let room = Room::default();
        let tuning = SimTuning::default();
        let mut b = body(3.5, 1.0, 0.0);
        b.velocity = Vec3::new(2.0, 0.0, -1.0);

        let hits = reflect_from_room(&mut b, &room, &tuning);

        assert_eq!(hits.walls, 1);
        assert!(!hits.floor);
        assert!((b.position.x - room.range()).abs() < 1e-6);
        assert_eq!(b.velocity, Vec3::new(-2.0, 0.0, -1.0));
    }

    #[test]
    fn test_floor_bounce_loses_energy() {
        let room = Room::default();
        let tuning = SimTuning::default();
        let mut b = body(0.0, 0.01, 0.0);
        b.velocity = Vec3::new(1.0, -4.0, 2.0);

        let hits = reflect_from_room(&mut b, &room, &tuning);

        assert!(hits.floor);
        assert_eq!(b.position.y, BODY_RADIUS);
        assert!((b.velocity.y - 3.2).abs() < 1e-5);
        assert!((b.velocity.x - 0.98).abs() < 1e-6);
        assert!((b.velocity.z - 1.96).abs() < 1e-6);
        assert!(b.velocity.y.abs() <= 4.0 * 0.8 + 1e-5);
    }

    #[test]
    fn test_ceiling_reflects_only_rising_bodies() {
        let room = Room::default();
        let tuning = SimTuning::default();

        let mut rising = body(0.0, 6.2, 0.0);
        rising.velocity.y = 5.0;
        assert!(reflect_from_room(&mut rising, &room, &tuning).floor);
        assert!(rising.velocity.y < 0.0);
        // Not pulled down to the ceiling
        assert_eq!(rising.position.y, 6.2);

        let mut falling = body(0.0, 6.2, 0.0);
        falling.velocity.y = -1.0;
        assert!(!reflect_from_room(&mut falling, &room, &tuning).floor);
        assert_eq!(falling.velocity.y, -1.0);
    }

    #[test]
    fn test_overlapping_pair_separates() {
        let mut a = body(0.0, 1.0, 0.0);
        let mut b = body(0.1, 1.0, 0.0);
        let before = a.position.distance(b.position);

        assert!(resolve_pair(&mut a, &mut b));

        let after = a.position.distance(b.position);
        assert!(after > before);
        assert!((after - 2.0 * BODY_RADIUS).abs() < 1e-5);
        // Resting bodies stay at rest
        assert_eq!(a.velocity, Vec3::ZERO);
        assert_eq!(b.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_pair_exchange_conserves_momentum() {
        let mut a = Body::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.5, 0.0), BODY_RADIUS);
        let mut b = Body::new(Vec3::new(0.12, 1.02, 0.0), Vec3::new(-2.0, 0.0, 0.3), BODY_RADIUS);
        let total_before = a.velocity + b.velocity;

        assert!(resolve_pair(&mut a, &mut b));

        let total_after = a.velocity + b.velocity;
        assert!((total_after - total_before).length() < 1e-5);
    }

    #[test]
    fn test_head_on_collision_swaps_velocities() {
        let mut a = Body::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), BODY_RADIUS);
        let mut b = Body::new(Vec3::new(0.15, 1.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), BODY_RADIUS);

        resolve_pair(&mut a, &mut b);

        assert!((a.velocity - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((b.velocity - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_coincident_bodies_split_vertically() {
        let mut a = body(0.0, 1.0, 0.0);
        let mut b = body(0.0, 1.0, 0.0);

        assert!(resolve_pair(&mut a, &mut b));

        assert!(a.position.is_finite() && b.position.is_finite());
        assert!(a.position.y > b.position.y);
        assert!((a.position.distance(b.position) - 2.0 * BODY_RADIUS).abs() < 1e-5);
    }

    #[test]
    fn test_separated_pair_untouched() {
        let mut a = body(0.0, 1.0, 0.0);
        let mut b = body(1.0, 1.0, 0.0);
        assert!(!resolve_pair(&mut a, &mut b));
        assert_eq!(a.position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_resolve_collisions_counts_contacts() {
        let mut bodies = vec![body(0.0, 1.0, 0.0), body(0.1, 1.0, 0.0), body(2.0, 1.0, 0.0)];
        assert_eq!(resolve_collisions(&mut bodies), 1);
        assert!(max_penetration(&bodies) < 1e-5);
    }

    #[test]
    fn test_throw_velocity_points_forward() {
        let tuning = SimTuning::default();
        let mut rng = StdRng::seed_from_u64(7);
        let pose = Pose::default();

        for _ in 0..50 {
            let v = throw_velocity(&pose, &tuning, &mut rng);
            assert!(v.x.abs() <= 1.5 && v.y.abs() <= 1.5);
            assert!(v.z < -8.0 && v.z >= -9.0);
        }
    }
}
