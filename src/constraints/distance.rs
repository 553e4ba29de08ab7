use crate::bodies::RigidBody;
use crate::constraints::{anchor_offset, apply_linear_impulse, velocity_at};
use crate::math::{Vector2, LINEAR_SLOP_DISTANCE};

/// Maximum position error corrected in a single position iteration
const MAX_CORRECTION: f32 = 0.2;

/// A distance joint keeps two anchor points a fixed length apart.
///
/// With `frequency` zero the constraint is rigid and the position pass
/// removes residual stretch. With a positive frequency the joint acts
/// as a damped spring: softness enters the velocity constraint through
/// the gamma term and the position pass is skipped entirely.
#[derive(Debug, Clone)]
pub struct DistanceJoint {
    /// Target distance between the world anchors
    pub length: f32,

    /// Spring frequency in Hz; zero means rigid
    pub frequency: f32,

    /// Spring damping ratio
    pub damping_ratio: f32,

    /// Softness parameter, recomputed each tick
    gamma: f32,

    /// Position feedback coefficient, recomputed each tick
    bias_coeff: f32,

    /// Accumulated constraint impulse, preserved across ticks
    impulse: f32,
}

impl DistanceJoint {
    /// Creates a rigid distance joint with the given rest length
    pub fn new(length: f32) -> Self {
        Self {
            length: length.max(0.0),
            frequency: 0.0,
            damping_ratio: 0.0,
            gamma: 0.0,
            bias_coeff: 0.0,
            impulse: 0.0,
        }
    }

    /// Returns the accumulated impulse
    pub fn impulse(&self) -> f32 {
        self.impulse
    }

    /// Computes the softness parameters for this tick and warm starts
    /// with the impulse accumulated last tick
    pub(crate) fn init_velocity(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        anchors: (Vector2, Vector2),
        dt: f32,
    ) {
        if self.frequency > 0.0 {
            let omega = 2.0 * std::f32::consts::PI * self.frequency;
            let d = 2.0 * self.damping_ratio * omega;
            let k = omega * omega;

            self.gamma = dt * (d + dt * k);
            if self.gamma > 0.0 {
                self.gamma = 1.0 / self.gamma;
            }
            self.bias_coeff = k * self.gamma;
        } else {
            self.gamma = 0.0;
            self.bias_coeff = 0.0;
        }

        // Warm start along the current constraint axis
        let r_a = anchor_offset(body_a, anchors.0);
        let r_b = anchor_offset(body_b, anchors.1);

        let delta = (body_b.position() + r_b) - (body_a.position() + r_a);
        let length = delta.length();

        if length < LINEAR_SLOP_DISTANCE {
            return;
        }

        let normal = delta / length;
        apply_linear_impulse(body_a, body_b, normal * self.impulse, r_a, r_b);
    }

    pub(crate) fn solve_velocity(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        anchors: (Vector2, Vector2),
    ) {
        let r_a = anchor_offset(body_a, anchors.0);
        let r_b = anchor_offset(body_b, anchors.1);

        let delta = (body_b.position() + r_b) - (body_a.position() + r_a);
        let length = delta.length();

        if length < LINEAR_SLOP_DISTANCE {
            return;
        }

        let normal = delta / length;

        let rel_vel = velocity_at(body_b, r_b) - velocity_at(body_a, r_a);
        let vn = rel_vel.dot(&normal);

        let ra_cross_n = r_a.cross(&normal);
        let rb_cross_n = r_b.cross(&normal);
        let k = body_a.inverse_mass()
            + body_b.inverse_mass()
            + ra_cross_n * ra_cross_n * body_a.inverse_inertia()
            + rb_cross_n * rb_cross_n * body_b.inverse_inertia()
            + self.gamma;

        let effective_mass = if k > 0.0 { 1.0 / k } else { 0.0 };

        let error = length - self.length;
        let bias = self.bias_coeff * error;

        let lambda = -effective_mass * (vn + bias + self.gamma * self.impulse);
        self.impulse += lambda;

        apply_linear_impulse(body_a, body_b, normal * lambda, r_a, r_b);
    }

    pub(crate) fn solve_position(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        anchors: (Vector2, Vector2),
    ) {
        // Soft constraints leave position error to the spring
        if self.frequency > 0.0 {
            return;
        }

        let r_a = anchor_offset(body_a, anchors.0);
        let r_b = anchor_offset(body_b, anchors.1);

        let delta = (body_b.position() + r_b) - (body_a.position() + r_a);
        let length = delta.length();

        if length < LINEAR_SLOP_DISTANCE {
            return;
        }

        let error = (length - self.length).clamp(-MAX_CORRECTION, MAX_CORRECTION);
        let normal = delta / length;

        let ra_cross_n = r_a.cross(&normal);
        let rb_cross_n = r_b.cross(&normal);
        let k = body_a.inverse_mass()
            + body_b.inverse_mass()
            + ra_cross_n * ra_cross_n * body_a.inverse_inertia()
            + rb_cross_n * rb_cross_n * body_b.inverse_inertia();

        let impulse = if k > 0.0 { -error / k } else { 0.0 };
        let correction = normal * impulse;

        let pos_a = body_a.position() - correction * body_a.inverse_mass();
        body_a.set_position(pos_a);

        let pos_b = body_b.position() + correction * body_b.inverse_mass();
        body_b.set_position(pos_b);
    }
}
