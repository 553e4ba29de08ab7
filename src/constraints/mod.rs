mod distance;
mod revolute;
mod prismatic;
mod weld;

pub use self::distance::DistanceJoint;
pub use self::revolute::RevoluteJoint;
pub use self::prismatic::PrismaticJoint;
pub use self::weld::WeldJoint;

use crate::bodies::RigidBody;
use crate::core::BodyId;
use crate::math::Vector2;

/// The kind-specific payload of a joint
#[derive(Debug, Clone)]
pub enum JointKind {
    /// Keeps two anchor points at a fixed (or sprung) distance
    Distance(DistanceJoint),

    /// Pins two anchor points together, allowing relative rotation
    Revolute(RevoluteJoint),

    /// Constrains relative motion to a line along a local axis
    Prismatic(PrismaticJoint),

    /// Rigidly attaches two bodies, linearly and angularly
    Weld(WeldJoint),
}

/// A constraint between two bodies.
///
/// Joints follow a uniform lifecycle each tick: `init_velocity`
/// precomputes softness parameters and warm starts from the impulses
/// accumulated last tick, `solve_velocity` applies corrective impulses
/// once per velocity iteration, and `solve_position` applies a clamped
/// position correction once per position iteration.
#[derive(Debug, Clone)]
pub struct Joint {
    body_a: BodyId,
    body_b: BodyId,
    local_anchor_a: Vector2,
    local_anchor_b: Vector2,
    kind: JointKind,
}

/// Definition used to create a joint.
///
/// Built with one of the kind constructors, then refined with the
/// builder methods. Builder methods that do not apply to the def's kind
/// have no effect.
#[derive(Debug, Clone)]
pub struct JointDef {
    /// The first body
    pub body_a: BodyId,

    /// The second body
    pub body_b: BodyId,

    /// Anchor point in body A's local frame
    pub anchor_a: Vector2,

    /// Anchor point in body B's local frame
    pub anchor_b: Vector2,

    /// Kind-specific parameters
    pub kind: JointKind,
}

impl JointDef {
    /// A distance joint keeping the anchors `length` apart. Rigid by
    /// default; use [`JointDef::with_frequency`] for a spring.
    pub fn distance(
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vector2,
        anchor_b: Vector2,
        length: f32,
    ) -> Self {
        Self {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            kind: JointKind::Distance(DistanceJoint::new(length)),
        }
    }

    /// A revolute joint pinning the anchors together
    pub fn revolute(
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vector2,
        anchor_b: Vector2,
    ) -> Self {
        Self {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            kind: JointKind::Revolute(RevoluteJoint::new()),
        }
    }

    /// A prismatic joint sliding along `axis`, given in body A's local
    /// frame. The axis is normalized.
    pub fn prismatic(
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vector2,
        anchor_b: Vector2,
        axis: Vector2,
    ) -> Self {
        Self {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            kind: JointKind::Prismatic(PrismaticJoint::new(axis.normalize())),
        }
    }

    /// A weld joint rigidly attaching the two bodies
    pub fn weld(
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vector2,
        anchor_b: Vector2,
    ) -> Self {
        Self {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            kind: JointKind::Weld(WeldJoint::new()),
        }
    }

    /// Makes a distance joint soft, parameterized by frequency in Hz
    /// and a damping ratio
    pub fn with_frequency(mut self, frequency: f32, damping_ratio: f32) -> Self {
        if let JointKind::Distance(ref mut joint) = self.kind {
            joint.frequency = frequency;
            joint.damping_ratio = damping_ratio;
        }
        self
    }

    /// Sets a revolute joint's reference angle (the rest offset between
    /// the two bodies' rotations)
    pub fn with_reference_angle(mut self, angle: f32) -> Self {
        if let JointKind::Revolute(ref mut joint) = self.kind {
            joint.reference_angle = angle;
        }
        self
    }

    /// Enables angle limits on a revolute joint
    pub fn with_angle_limit(mut self, lower: f32, upper: f32) -> Self {
        if let JointKind::Revolute(ref mut joint) = self.kind {
            joint.enable_limit = true;
            joint.lower_angle = lower;
            joint.upper_angle = upper;
        }
        self
    }

    /// Enables translation limits on a prismatic joint
    pub fn with_translation_limit(mut self, lower: f32, upper: f32) -> Self {
        if let JointKind::Prismatic(ref mut joint) = self.kind {
            joint.enable_limit = true;
            joint.lower_translation = lower;
            joint.upper_translation = upper;
        }
        self
    }

    /// Enables a motor. On a revolute joint `max_effort` is a torque;
    /// on a prismatic joint it is a force.
    pub fn with_motor(mut self, speed: f32, max_effort: f32) -> Self {
        match self.kind {
            JointKind::Revolute(ref mut joint) => {
                joint.enable_motor = true;
                joint.motor_speed = speed;
                joint.max_motor_torque = max_effort;
            }
            JointKind::Prismatic(ref mut joint) => {
                joint.enable_motor = true;
                joint.motor_speed = speed;
                joint.max_motor_force = max_effort;
            }
            _ => {}
        }
        self
    }

    /// Sets a weld joint's stiffness and damping
    pub fn with_softness(mut self, stiffness: f32, damping: f32) -> Self {
        if let JointKind::Weld(ref mut joint) = self.kind {
            joint.stiffness = stiffness;
            joint.damping = damping;
        }
        self
    }
}

impl Joint {
    /// Creates a joint from a definition. The world validates body ids
    /// before calling this.
    pub(crate) fn from_def(def: &JointDef) -> Self {
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            local_anchor_a: def.anchor_a,
            local_anchor_b: def.anchor_b,
            kind: def.kind.clone(),
        }
    }

    /// Returns the first body's id
    pub fn body_a(&self) -> BodyId {
        self.body_a
    }

    /// Returns the second body's id
    pub fn body_b(&self) -> BodyId {
        self.body_b
    }

    /// Checks if the joint involves a specific body
    pub fn involves_body(&self, body: BodyId) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// Returns the kind-specific payload
    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    /// Fetches both bodies, or `None` when either id is out of range.
    /// Joints whose body has since been destroyed are silently skipped.
    fn bodies<'a>(
        &self,
        bodies: &'a mut [RigidBody],
    ) -> Option<(&'a mut RigidBody, &'a mut RigidBody)> {
        let a = self.body_a as usize;
        let b = self.body_b as usize;

        if a >= bodies.len() || b >= bodies.len() || a == b {
            return None;
        }

        Some(split_pair_mut(bodies, a, b))
    }

    /// Precomputes solver terms and warm starts from the accumulated
    /// impulses
    pub(crate) fn init_velocity(&mut self, bodies: &mut [RigidBody], dt: f32) {
        let anchors = (self.local_anchor_a, self.local_anchor_b);
        let (body_a, body_b) = match self.bodies(bodies) {
            Some(pair) => pair,
            None => return,
        };

        match self.kind {
            JointKind::Distance(ref mut joint) => joint.init_velocity(body_a, body_b, anchors, dt),
            JointKind::Revolute(ref mut joint) => joint.init_velocity(body_a, body_b),
            JointKind::Prismatic(ref mut joint) => joint.init_velocity(body_a, body_b, anchors),
            JointKind::Weld(ref mut joint) => joint.init_velocity(body_a, body_b, anchors),
        }
    }

    /// Applies corrective impulses for one velocity iteration
    pub(crate) fn solve_velocity(&mut self, bodies: &mut [RigidBody], dt: f32) {
        let anchors = (self.local_anchor_a, self.local_anchor_b);
        let (body_a, body_b) = match self.bodies(bodies) {
            Some(pair) => pair,
            None => return,
        };

        match self.kind {
            JointKind::Distance(ref mut joint) => joint.solve_velocity(body_a, body_b, anchors),
            JointKind::Revolute(ref mut joint) => joint.solve_velocity(body_a, body_b, anchors, dt),
            JointKind::Prismatic(ref mut joint) => {
                joint.solve_velocity(body_a, body_b, anchors, dt)
            }
            JointKind::Weld(ref mut joint) => joint.solve_velocity(body_a, body_b, anchors),
        }
    }

    /// Applies a clamped position correction for one position iteration
    pub(crate) fn solve_position(&mut self, bodies: &mut [RigidBody]) {
        let anchors = (self.local_anchor_a, self.local_anchor_b);
        let (body_a, body_b) = match self.bodies(bodies) {
            Some(pair) => pair,
            None => return,
        };

        match self.kind {
            JointKind::Distance(ref mut joint) => joint.solve_position(body_a, body_b, anchors),
            JointKind::Revolute(ref mut joint) => joint.solve_position(body_a, body_b, anchors),
            JointKind::Prismatic(ref mut joint) => joint.solve_position(body_a, body_b, anchors),
            JointKind::Weld(ref mut joint) => joint.solve_position(body_a, body_b, anchors),
        }
    }
}

/// Splits two distinct slots out of the body store as mutable references
pub(crate) fn split_pair_mut(
    bodies: &mut [RigidBody],
    a: usize,
    b: usize,
) -> (&mut RigidBody, &mut RigidBody) {
    debug_assert_ne!(a, b);

    if a < b {
        let (head, tail) = bodies.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = bodies.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

/// World-space offset of a local anchor from the body center
#[inline]
pub(crate) fn anchor_offset(body: &RigidBody, local_anchor: Vector2) -> Vector2 {
    local_anchor.rotate(body.rotation())
}

/// Velocity of the body at an offset from its center
#[inline]
pub(crate) fn velocity_at(body: &RigidBody, r: Vector2) -> Vector2 {
    body.linear_velocity() + Vector2::cross_scalar(body.angular_velocity(), &r)
}

/// Applies an equal and opposite linear impulse at the given offsets:
/// minus to body A, plus to body B
pub(crate) fn apply_linear_impulse(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    impulse: Vector2,
    r_a: Vector2,
    r_b: Vector2,
) {
    let vel_a = body_a.linear_velocity() - impulse * body_a.inverse_mass();
    let omega_a = body_a.angular_velocity() - r_a.cross(&impulse) * body_a.inverse_inertia();
    body_a.set_linear_velocity(vel_a);
    body_a.set_angular_velocity(omega_a);

    let vel_b = body_b.linear_velocity() + impulse * body_b.inverse_mass();
    let omega_b = body_b.angular_velocity() + r_b.cross(&impulse) * body_b.inverse_inertia();
    body_b.set_linear_velocity(vel_b);
    body_b.set_angular_velocity(omega_b);
}

/// Applies an equal and opposite angular impulse: minus to A, plus to B
pub(crate) fn apply_angular_impulse(body_a: &mut RigidBody, body_b: &mut RigidBody, impulse: f32) {
    let omega_a = body_a.angular_velocity() - impulse * body_a.inverse_inertia();
    body_a.set_angular_velocity(omega_a);

    let omega_b = body_b.angular_velocity() + impulse * body_b.inverse_inertia();
    body_b.set_angular_velocity(omega_b);
}

/// Solves the 2x2 effective-mass system K·x = -rhs shared by the
/// revolute and weld point-to-point constraints. Returns `None` when
/// the system is singular.
pub(crate) fn solve_point_to_point(
    body_a: &RigidBody,
    body_b: &RigidBody,
    r_a: Vector2,
    r_b: Vector2,
    rhs: Vector2,
) -> Option<Vector2> {
    let inv_mass = body_a.inverse_mass() + body_b.inverse_mass();
    let inv_inertia_a = body_a.inverse_inertia();
    let inv_inertia_b = body_b.inverse_inertia();

    let k11 = inv_mass + r_a.y * r_a.y * inv_inertia_a + r_b.y * r_b.y * inv_inertia_b;
    let k22 = inv_mass + r_a.x * r_a.x * inv_inertia_a + r_b.x * r_b.x * inv_inertia_b;
    let k12 = -r_a.y * r_a.x * inv_inertia_a - r_b.y * r_b.x * inv_inertia_b;

    let det = k11 * k22 - k12 * k12;
    if det <= 0.0 {
        return None;
    }

    let inv_det = 1.0 / det;
    Some(Vector2::new(
        -inv_det * (k22 * rhs.x - k12 * rhs.y),
        -inv_det * (k11 * rhs.y - k12 * rhs.x),
    ))
}
