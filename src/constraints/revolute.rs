use crate::bodies::RigidBody;
use crate::constraints::{
    anchor_offset, apply_angular_impulse, apply_linear_impulse, solve_point_to_point, velocity_at,
};
use crate::math::{wrap_angle, Vector2};

/// Maximum position error corrected in a single position iteration
const MAX_CORRECTION: f32 = 0.2;

/// Bias factor feeding limit violation back into the velocity solver
const LIMIT_BIAS: f32 = 0.2;

/// A revolute joint pins two anchor points together while allowing the
/// bodies to rotate relative to one another, optionally bounded by
/// angle limits and driven by a motor.
#[derive(Debug, Clone)]
pub struct RevoluteJoint {
    /// Rest offset between the two bodies' rotations
    pub reference_angle: f32,

    /// Whether the angle limits are active
    pub enable_limit: bool,

    /// Lower relative angle limit in radians
    pub lower_angle: f32,

    /// Upper relative angle limit in radians
    pub upper_angle: f32,

    /// Whether the motor is active
    pub enable_motor: bool,

    /// Target relative angular velocity in rad/s
    pub motor_speed: f32,

    /// Maximum torque the motor may apply
    pub max_motor_torque: f32,

    /// Effective mass of the purely angular constraints
    axial_mass: f32,

    /// Accumulated motor impulse, preserved across ticks
    motor_impulse: f32,
}

impl RevoluteJoint {
    /// Creates a revolute joint with no limits and no motor
    pub fn new() -> Self {
        Self {
            reference_angle: 0.0,
            enable_limit: false,
            lower_angle: 0.0,
            upper_angle: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            axial_mass: 0.0,
            motor_impulse: 0.0,
        }
    }

    /// Relative angle of B with respect to A, wrapped to (-PI, PI]
    pub fn relative_angle(&self, body_a: &RigidBody, body_b: &RigidBody) -> f32 {
        wrap_angle(body_b.rotation() - body_a.rotation() - self.reference_angle)
    }

    pub(crate) fn init_velocity(&mut self, body_a: &mut RigidBody, body_b: &mut RigidBody) {
        let k = body_a.inverse_inertia() + body_b.inverse_inertia();
        self.axial_mass = if k > 0.0 { 1.0 / k } else { 0.0 };

        // Warm start the motor with last tick's impulse
        if self.enable_motor {
            apply_angular_impulse(body_a, body_b, self.motor_impulse);
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

        // Point-to-point constraint keeping the anchors together
        let rel_vel = velocity_at(body_b, r_b) - velocity_at(body_a, r_a);

        if let Some(lambda) = solve_point_to_point(body_a, body_b, r_a, r_b, rel_vel) {
            apply_linear_impulse(body_a, body_b, lambda, r_a, r_b);
        }

        // Motor drives the relative angular velocity towards its target,
        // bounded by the torque budget converted to an impulse over dt
        if self.enable_motor {
            let angular_vel = body_b.angular_velocity() - body_a.angular_velocity();
            let lambda = (self.motor_speed - angular_vel) * self.axial_mass;

            let max_impulse = self.max_motor_torque * dt;
            let old_impulse = self.motor_impulse;
            self.motor_impulse = (old_impulse + lambda).clamp(-max_impulse, max_impulse);
            let delta = self.motor_impulse - old_impulse;

            apply_angular_impulse(body_a, body_b, delta);
        }

        // Limits engage when the relative angle leaves [lower, upper]
        if self.enable_limit {
            let angle = self.relative_angle(body_a, body_b);

            let violation = if angle < self.lower_angle {
                angle - self.lower_angle
            } else if angle > self.upper_angle {
                angle - self.upper_angle
            } else {
                0.0
            };

            if violation != 0.0 {
                let angular_vel = body_b.angular_velocity() - body_a.angular_velocity();
                let lambda = -angular_vel * self.axial_mass - LIMIT_BIAS * violation / dt;

                apply_angular_impulse(body_a, body_b, lambda);
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

        let mut error = (body_b.position() + r_b) - (body_a.position() + r_a);

        let length = error.length();
        if length > MAX_CORRECTION {
            error *= MAX_CORRECTION / length;
        }

        if let Some(impulse) = solve_point_to_point(body_a, body_b, r_a, r_b, error) {
            let pos_a = body_a.position() - impulse * body_a.inverse_mass();
            body_a.set_position(pos_a);

            let pos_b = body_b.position() + impulse * body_b.inverse_mass();
            body_b.set_position(pos_b);
        }
    }
}

impl Default for RevoluteJoint {
    fn default() -> Self {
        Self::new()
    }
}
