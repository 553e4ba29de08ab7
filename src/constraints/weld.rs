use crate::bodies::RigidBody;
use crate::constraints::{
    anchor_offset, apply_angular_impulse, apply_linear_impulse, solve_point_to_point, velocity_at,
};
use crate::math::{wrap_angle, Vector2};

/// Maximum linear position error corrected per position iteration
const MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Maximum angular position error corrected per position iteration
const MAX_ANGULAR_CORRECTION: f32 = 0.2;

/// A weld joint rigidly attaches two bodies: the anchors stay pinned
/// together and the relative rotation stays fixed.
#[derive(Debug, Clone)]
pub struct WeldJoint {
    /// Joint stiffness; zero means fully rigid
    pub stiffness: f32,

    /// Joint damping
    pub damping: f32,

    /// Accumulated linear impulse, preserved across ticks
    linear_impulse: Vector2,

    /// Accumulated angular impulse, preserved across ticks
    angular_impulse: f32,
}

impl WeldJoint {
    /// Creates a rigid weld joint
    pub fn new() -> Self {
        Self {
            stiffness: 0.0,
            damping: 0.0,
            linear_impulse: Vector2::zero(),
            angular_impulse: 0.0,
        }
    }

    pub(crate) fn init_velocity(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        anchors: (Vector2, Vector2),
    ) {
        // Warm start with last tick's accumulated impulses
        let r_a = anchor_offset(body_a, anchors.0);
        let r_b = anchor_offset(body_b, anchors.1);

        apply_linear_impulse(body_a, body_b, self.linear_impulse, r_a, r_b);
        apply_angular_impulse(body_a, body_b, self.angular_impulse);
    }

    pub(crate) fn solve_velocity(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        anchors: (Vector2, Vector2),
    ) {
        let r_a = anchor_offset(body_a, anchors.0);
        let r_b = anchor_offset(body_b, anchors.1);

        // Pin the anchors together
        let rel_vel = velocity_at(body_b, r_b) - velocity_at(body_a, r_a);

        if let Some(lambda) = solve_point_to_point(body_a, body_b, r_a, r_b, rel_vel) {
            self.linear_impulse += lambda;
            apply_linear_impulse(body_a, body_b, lambda, r_a, r_b);
        }

        // Hold the relative rotation fixed
        let angular_vel = body_b.angular_velocity() - body_a.angular_velocity();
        let k_angular = body_a.inverse_inertia() + body_b.inverse_inertia();

        if k_angular > 0.0 {
            let lambda = -angular_vel / k_angular;
            self.angular_impulse += lambda;

            apply_angular_impulse(body_a, body_b, lambda);
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

        // Linear drift between the anchors
        let mut error = (body_b.position() + r_b) - (body_a.position() + r_a);

        let length = error.length();
        if length > MAX_LINEAR_CORRECTION {
            error *= MAX_LINEAR_CORRECTION / length;
        }

        if let Some(impulse) = solve_point_to_point(body_a, body_b, r_a, r_b, error) {
            let pos_a = body_a.position() - impulse * body_a.inverse_mass();
            body_a.set_position(pos_a);

            let pos_b = body_b.position() + impulse * body_b.inverse_mass();
            body_b.set_position(pos_b);
        }

        // Angular drift, wrapped before comparison
        let angle_error = wrap_angle(body_b.rotation() - body_a.rotation())
            .clamp(-MAX_ANGULAR_CORRECTION, MAX_ANGULAR_CORRECTION);

        let k_angular = body_a.inverse_inertia() + body_b.inverse_inertia();
        if k_angular > 0.0 {
            let impulse = -angle_error / k_angular;

            let rot_a = body_a.rotation() - impulse * body_a.inverse_inertia();
            body_a.set_rotation(rot_a);

            let rot_b = body_b.rotation() + impulse * body_b.inverse_inertia();
            body_b.set_rotation(rot_b);
        }
    }
}

impl Default for WeldJoint {
    fn default() -> Self {
        Self::new()
    }
}
