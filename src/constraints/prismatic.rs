use crate::bodies::RigidBody;
use crate::constraints::{anchor_offset, apply_linear_impulse, velocity_at};
use crate::math::Vector2;

/// Maximum position error corrected in a single position iteration
const MAX_CORRECTION: f32 = 0.2;

/// Bias factor feeding limit violation back into the velocity solver
const LIMIT_BIAS: f32 = 0.2;

/// A prismatic joint constrains relative motion to a line along a local
/// axis of body A: no movement perpendicular to the axis and no
/// relative rotation. An optional motor drives translation along the
/// axis and optional limits bound it.
#[derive(Debug, Clone)]
pub struct PrismaticJoint {
    /// Slide axis in body A's local frame, unit length
    pub local_axis: Vector2,

    /// Whether the translation limits are active
    pub enable_limit: bool,

    /// Lower translation limit along the axis
    pub lower_translation: f32,

    /// Upper translation limit along the axis
    pub upper_translation: f32,

    /// Whether the motor is active
    pub enable_motor: bool,

    /// Target translation speed along the axis
    pub motor_speed: f32,

    /// Maximum force the motor may apply
    pub max_motor_force: f32,

    /// Accumulated motor impulse, preserved across ticks
    motor_impulse: f32,
}

impl PrismaticJoint {
    /// Creates a prismatic joint sliding along the given local axis
    pub fn new(local_axis: Vector2) -> Self {
        Self {
            local_axis,
            enable_limit: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_force: 0.0,
            motor_impulse: 0.0,
        }
    }

    /// Current translation of B's anchor along the world axis
    pub fn translation(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        anchors: (Vector2, Vector2),
    ) -> f32 {
        let r_a = anchor_offset(body_a, anchors.0);
        let r_b = anchor_offset(body_b, anchors.1);
        let axis = self.local_axis.rotate(body_a.rotation());

        let delta = (body_b.position() + r_b) - (body_a.position() + r_a);
        delta.dot(&axis)
    }

    pub(crate) fn init_velocity(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        anchors: (Vector2, Vector2),
    ) {
        // Warm start the motor along the current world axis
        if self.enable_motor {
            let r_a = anchor_offset(body_a, anchors.0);
            let r_b = anchor_offset(body_b, anchors.1);
            let axis = self.local_axis.rotate(body_a.rotation());

            apply_linear_impulse(body_a, body_b, axis * self.motor_impulse, r_a, r_b);
        } else {
            self.motor_impulse = 0.0;
        }
    }

    pub(crate) fn solve_velocity(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        anchors: (Vector2, Vector2),
        dt: f32,
    ) {
        let r_a = anchor_offset(body_a, anchors.0);
        let r_b = anchor_offset(body_b, anchors.1);

        let axis = self.local_axis.rotate(body_a.rotation());
        let perp = axis.perp();

        let rel_vel = velocity_at(body_b, r_b) - velocity_at(body_a, r_a);

        // No movement perpendicular to the axis
        let v_perp = rel_vel.dot(&perp);
        let ra_cross_perp = r_a.cross(&perp);
        let rb_cross_perp = r_b.cross(&perp);

        let k_perp = body_a.inverse_mass()
            + body_b.inverse_mass()
            + ra_cross_perp * ra_cross_perp * body_a.inverse_inertia()
            + rb_cross_perp * rb_cross_perp * body_b.inverse_inertia();

        if k_perp > 0.0 {
            let lambda = -v_perp / k_perp;
            apply_linear_impulse(body_a, body_b, perp * lambda, r_a, r_b);
        }

        // No relative rotation
        let angular_vel = body_b.angular_velocity() - body_a.angular_velocity();
        let k_angular = body_a.inverse_inertia() + body_b.inverse_inertia();

        if k_angular > 0.0 {
            let lambda = -angular_vel / k_angular;

            let omega_a = body_a.angular_velocity() - lambda * body_a.inverse_inertia();
            body_a.set_angular_velocity(omega_a);

            let omega_b = body_b.angular_velocity() + lambda * body_b.inverse_inertia();
            body_b.set_angular_velocity(omega_b);
        }

        let ra_cross_axis = r_a.cross(&axis);
        let rb_cross_axis = r_b.cross(&axis);
        let k_axis = body_a.inverse_mass()
            + body_b.inverse_mass()
            + ra_cross_axis * ra_cross_axis * body_a.inverse_inertia()
            + rb_cross_axis * rb_cross_axis * body_b.inverse_inertia();

        // Motor pushes along the axis, bounded by the force budget
        // converted to an impulse over dt
        if self.enable_motor && k_axis > 0.0 {
            let v_axis = velocity_at(body_b, r_b).dot(&axis) - velocity_at(body_a, r_a).dot(&axis);
            let lambda = (self.motor_speed - v_axis) / k_axis;

            let max_impulse = self.max_motor_force * dt;
            let old_impulse = self.motor_impulse;
            self.motor_impulse = (old_impulse + lambda).clamp(-max_impulse, max_impulse);
            let delta = self.motor_impulse - old_impulse;

            apply_linear_impulse(body_a, body_b, axis * delta, r_a, r_b);
        }

        // Limits engage when the translation leaves [lower, upper]
        if self.enable_limit && k_axis > 0.0 {
            let delta = (body_b.position() + r_b) - (body_a.position() + r_a);
            let translation = delta.dot(&axis);

            let violation = if translation < self.lower_translation {
                translation - self.lower_translation
            } else if translation > self.upper_translation {
                translation - self.upper_translation
            } else {
                0.0
            };

            if violation != 0.0 {
                let v_axis =
                    velocity_at(body_b, r_b).dot(&axis) - velocity_at(body_a, r_a).dot(&axis);
                let lambda = (-v_axis - LIMIT_BIAS * violation / dt) / k_axis;

                apply_linear_impulse(body_a, body_b, axis * lambda, r_a, r_b);
            }
        }
    }

    pub(crate) fn solve_position(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        anchors: (Vector2, Vector2),
    ) {
        let r_a = anchor_offset(body_a, anchors.0);
        let r_b = anchor_offset(body_b, anchors.1);

        let axis = self.local_axis.rotate(body_a.rotation());
        let perp = axis.perp();

        // Perpendicular drift between the anchors
        let delta = (body_b.position() + r_b) - (body_a.position() + r_a);
        let error = delta.dot(&perp).clamp(-MAX_CORRECTION, MAX_CORRECTION);

        let ra_cross_perp = r_a.cross(&perp);
        let rb_cross_perp = r_b.cross(&perp);
        let k_perp = body_a.inverse_mass()
            + body_b.inverse_mass()
            + ra_cross_perp * ra_cross_perp * body_a.inverse_inertia()
            + rb_cross_perp * rb_cross_perp * body_b.inverse_inertia();

        if k_perp <= 0.0 {
            return;
        }

        let impulse = perp * (-error / k_perp);

        let pos_a = body_a.position() - impulse * body_a.inverse_mass();
        body_a.set_position(pos_a);

        let pos_b = body_b.position() + impulse * body_b.inverse_mass();
        body_b.set_position(pos_b);
    }
}
