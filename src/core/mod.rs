pub mod world;
pub mod config;

pub use self::world::PhysicsWorld;
pub use self::config::{BroadPhaseKind, SimulationConfig};

/// A body's id: its slot index in the world's packed body store.
/// Assigned monotonically at creation; destroying a body moves the last
/// body into the freed slot.
pub type BodyId = u32;

/// A joint's id: its slot index in the world's joint store
pub type JointId = u32;
