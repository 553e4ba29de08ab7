mod rigid_body;
mod material;
mod body_type;

pub use self::rigid_body::RigidBody;
pub use self::material::Material;
pub use self::body_type::RigidBodyType;

use crate::math::Vector2;

/// Types of forces that can be applied to a body
#[derive(Debug, Clone, Copy)]
pub enum ForceType {
    /// Force applied at the center of mass
    Force(Vector2),

    /// Force applied at a specific point (can cause torque)
    ForceAtPoint {
        /// The force to apply
        force: Vector2,

        /// The point to apply the force at, in world space
        point: Vector2,
    },

    /// Torque that causes angular acceleration
    Torque(f32),

    /// Impulse applied at the center of mass (instantaneous change in velocity)
    Impulse(Vector2),

    /// Impulse applied at a specific point (can cause angular velocity change)
    ImpulseAtPoint {
        /// The impulse to apply
        impulse: Vector2,

        /// The point to apply the impulse at, in world space
        point: Vector2,
    },

    /// Angular impulse (instantaneous change in angular velocity)
    AngularImpulse(f32),
}

/// Flags for controlling body behavior
pub mod body_flags {
    use bitflags::bitflags;

    bitflags! {
        /// Flags for controlling the behavior of rigid bodies
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct BodyFlags: u32 {
            /// Body participates in simulation
            const ENABLED = 0x01;

            /// Body is affected by gravity
            const AFFECTED_BY_GRAVITY = 0x02;
        }
    }
}
