use std::collections::HashMap;

use crate::bodies::RigidBody;
use crate::collision::contact_manifold::ContactManifold;
use crate::core::SimulationConfig;
use crate::math::Vector2;

/// Per-point solver state derived from a manifold point
#[derive(Debug, Clone, Copy)]
struct ConstraintPoint {
    /// Offset from body A's center to the contact point
    r_a: Vector2,

    /// Offset from body B's center to the contact point
    r_b: Vector2,

    /// Remaining penetration depth, reduced as position corrections apply
    penetration: f32,

    /// Inverse effective mass along the normal
    normal_mass: f32,

    /// Inverse effective mass along the tangent
    tangent_mass: f32,

    /// Separation speed target from restitution, fixed pre-solve
    restitution_bias: f32,

    /// Feature id for warm-start matching across ticks
    feature: u32,

    /// Accumulated impulse along the normal; never negative
    normal_impulse: f32,

    /// Accumulated impulse along the tangent; bounded by the friction cone
    tangent_impulse: f32,
}

/// Per-manifold solver state
#[derive(Debug, Clone)]
struct ContactConstraint {
    body_a: usize,
    body_b: usize,
    pair_key: u64,
    normal: Vector2,
    tangent: Vector2,
    friction: f32,
    points: Vec<ConstraintPoint>,
}

/// Sequential impulse contact solver with warm starting.
///
/// Velocity constraints accumulate a normal impulse clamped to stay
/// non-negative (contacts push, never pull) and a tangent impulse
/// clamped to the Coulomb friction cone. Accumulated impulses are
/// carried across ticks in a cache keyed by (pair, feature) and applied
/// up front the next tick, which lets the iterative solver converge in
/// far fewer iterations on resting contacts.
pub struct SequentialImpulseSolver {
    /// Baumgarte position correction factor
    bias_factor: f32,

    /// Penetration tolerated without correction
    penetration_slop: f32,

    /// Largest position correction applied in one iteration
    max_correction: f32,

    /// Approach speeds below this produce no bounce
    restitution_threshold: f32,

    constraints: Vec<ContactConstraint>,

    /// Accumulated impulses from the previous tick, keyed by
    /// (pair key, feature id)
    cache: HashMap<(u64, u32), (f32, f32)>,
}

impl SequentialImpulseSolver {
    /// Creates a new solver using the tuning values from the config
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            bias_factor: config.baumgarte_factor,
            penetration_slop: config.penetration_slop,
            max_correction: config.max_position_correction,
            restitution_threshold: config.restitution_velocity_threshold,
            constraints: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Builds velocity constraints from this tick's manifolds and warm
    /// starts them with the impulses cached from the previous tick.
    pub fn initialize(&mut self, manifolds: &[ContactManifold], bodies: &mut [RigidBody]) {
        self.constraints.clear();

        for manifold in manifolds {
            let index_a = manifold.pair.body_a as usize;
            let index_b = manifold.pair.body_b as usize;

            if index_a >= bodies.len() || index_b >= bodies.len() {
                continue;
            }

            let normal = manifold.normal;
            let tangent = normal.perp();
            let pair_key = manifold.pair.key();

            let (inv_mass_a, inv_inertia_a, pos_a, vel_a, omega_a) = {
                let body = &bodies[index_a];
                (
                    body.inverse_mass(),
                    body.inverse_inertia(),
                    body.position(),
                    body.linear_velocity(),
                    body.angular_velocity(),
                )
            };
            let (inv_mass_b, inv_inertia_b, pos_b, vel_b, omega_b) = {
                let body = &bodies[index_b];
                (
                    body.inverse_mass(),
                    body.inverse_inertia(),
                    body.position(),
                    body.linear_velocity(),
                    body.angular_velocity(),
                )
            };

            let mut constraint = ContactConstraint {
                body_a: index_a,
                body_b: index_b,
                pair_key,
                normal,
                tangent,
                friction: manifold.friction,
                points: Vec::with_capacity(manifold.points.len()),
            };

            for point in &manifold.points {
                let r_a = point.position - pos_a;
                let r_b = point.position - pos_b;

                let rn_a = r_a.cross(&normal);
                let rn_b = r_b.cross(&normal);
                let k_normal = inv_mass_a
                    + inv_mass_b
                    + rn_a * rn_a * inv_inertia_a
                    + rn_b * rn_b * inv_inertia_b;

                let rt_a = r_a.cross(&tangent);
                let rt_b = r_b.cross(&tangent);
                let k_tangent = inv_mass_a
                    + inv_mass_b
                    + rt_a * rt_a * inv_inertia_a
                    + rt_b * rt_b * inv_inertia_b;

                // Pre-solve approach speed decides the bounce target
                let rel_vel = vel_b + Vector2::cross_scalar(omega_b, &r_b)
                    - vel_a
                    - Vector2::cross_scalar(omega_a, &r_a);
                let vn = rel_vel.dot(&normal);

                let restitution_bias = if vn < -self.restitution_threshold {
                    -manifold.restitution * vn
                } else {
                    0.0
                };

                let (normal_impulse, tangent_impulse) = self
                    .cache
                    .get(&(pair_key, point.feature))
                    .copied()
                    .unwrap_or((0.0, 0.0));

                constraint.points.push(ConstraintPoint {
                    r_a,
                    r_b,
                    penetration: point.penetration,
                    normal_mass: if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 },
                    tangent_mass: if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 },
                    restitution_bias,
                    feature: point.feature,
                    normal_impulse,
                    tangent_impulse,
                });
            }

            self.constraints.push(constraint);
        }

        // Warm start: reapply last tick's accumulated impulses
        for constraint in &self.constraints {
            let (body_a, body_b) = pair_mut(bodies, constraint.body_a, constraint.body_b);

            for point in &constraint.points {
                let impulse = constraint.normal * point.normal_impulse
                    + constraint.tangent * point.tangent_impulse;

                apply_impulse_pair(body_a, body_b, &impulse, &point.r_a, &point.r_b);
            }
        }
    }

    /// Runs one velocity iteration over all contacts
    pub fn solve_velocity(&mut self, bodies: &mut [RigidBody]) {
        for constraint in &mut self.constraints {
            let (body_a, body_b) = pair_mut(bodies, constraint.body_a, constraint.body_b);
            let normal = constraint.normal;
            let tangent = constraint.tangent;

            for point in &mut constraint.points {
                // Normal impulse, accumulated and clamped non-negative
                let rel_vel = relative_velocity(body_a, body_b, &point.r_a, &point.r_b);
                let vn = rel_vel.dot(&normal);

                let lambda = -point.normal_mass * (vn - point.restitution_bias);

                let new_impulse = (point.normal_impulse + lambda).max(0.0);
                let delta = new_impulse - point.normal_impulse;
                point.normal_impulse = new_impulse;

                apply_impulse_pair(body_a, body_b, &(normal * delta), &point.r_a, &point.r_b);

                // Tangent impulse, clamped to the friction cone
                let rel_vel = relative_velocity(body_a, body_b, &point.r_a, &point.r_b);
                let vt = rel_vel.dot(&tangent);

                let lambda = -point.tangent_mass * vt;
                let max_friction = constraint.friction * point.normal_impulse;

                let new_impulse =
                    (point.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                let delta = new_impulse - point.tangent_impulse;
                point.tangent_impulse = new_impulse;

                apply_impulse_pair(body_a, body_b, &(tangent * delta), &point.r_a, &point.r_b);
            }
        }
    }

    /// Runs one position iteration over all contacts, pushing bodies
    /// apart along the contact normal by a fraction of the remaining
    /// penetration
    pub fn solve_position(&mut self, bodies: &mut [RigidBody]) {
        for constraint in &mut self.constraints {
            let (body_a, body_b) = pair_mut(bodies, constraint.body_a, constraint.body_b);
            let normal = constraint.normal;

            for point in &mut constraint.points {
                let error = point.penetration - self.penetration_slop;
                if error <= 0.0 {
                    continue;
                }

                let correction = (self.bias_factor * error).min(self.max_correction);

                let rn_a = point.r_a.cross(&normal);
                let rn_b = point.r_b.cross(&normal);
                let k = body_a.inverse_mass()
                    + body_b.inverse_mass()
                    + rn_a * rn_a * body_a.inverse_inertia()
                    + rn_b * rn_b * body_b.inverse_inertia();

                if k <= 0.0 {
                    continue;
                }

                let impulse = normal * (correction / k);

                body_a.set_position(body_a.position() - impulse * body_a.inverse_mass());
                body_b.set_position(body_b.position() + impulse * body_b.inverse_mass());

                point.penetration -= correction;
            }
        }
    }

    /// Persists this tick's accumulated impulses for the next tick's
    /// warm start
    pub fn store_impulses(&mut self) {
        self.cache.clear();

        for constraint in &self.constraints {
            for point in &constraint.points {
                self.cache.insert(
                    (constraint.pair_key, point.feature),
                    (point.normal_impulse, point.tangent_impulse),
                );
            }
        }
    }

    /// Returns the accumulated (normal, tangent) impulses of every
    /// contact point, for inspection
    pub fn accumulated_impulses(&self) -> Vec<(f32, f32, f32)> {
        self.constraints
            .iter()
            .flat_map(|constraint| {
                constraint
                    .points
                    .iter()
                    .map(|point| (point.normal_impulse, point.tangent_impulse, constraint.friction))
            })
            .collect()
    }
}

/// Splits two distinct body slots out of the store as mutable references
fn pair_mut(bodies: &mut [RigidBody], a: usize, b: usize) -> (&mut RigidBody, &mut RigidBody) {
    debug_assert_ne!(a, b);

    if a < b {
        let (head, tail) = bodies.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = bodies.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

#[inline]
fn relative_velocity(
    body_a: &RigidBody,
    body_b: &RigidBody,
    r_a: &Vector2,
    r_b: &Vector2,
) -> Vector2 {
    body_b.linear_velocity() + Vector2::cross_scalar(body_b.angular_velocity(), r_b)
        - body_a.linear_velocity()
        - Vector2::cross_scalar(body_a.angular_velocity(), r_a)
}

#[inline]
fn apply_impulse_pair(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    impulse: &Vector2,
    r_a: &Vector2,
    r_b: &Vector2,
) {
    let vel_a = body_a.linear_velocity() - *impulse * body_a.inverse_mass();
    let omega_a = body_a.angular_velocity() - r_a.cross(impulse) * body_a.inverse_inertia();
    body_a.set_linear_velocity(vel_a);
    body_a.set_angular_velocity(omega_a);

    let vel_b = body_b.linear_velocity() + *impulse * body_b.inverse_mass();
    let omega_b = body_b.angular_velocity() + r_b.cross(impulse) * body_b.inverse_inertia();
    body_b.set_linear_velocity(vel_b);
    body_b.set_angular_velocity(omega_b);
}
