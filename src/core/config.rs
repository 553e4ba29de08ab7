use crate::math::{Aabb, Vector2};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Which broadphase structure the world uses
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum BroadPhaseKind {
    /// Dynamic AABB tree; preferred for mixed body sizes and unbounded
    /// domains
    Tree,

    /// Uniform spatial hash grid; cheaper per frame when bodies are
    /// uniformly sized and the domain is bounded
    Grid {
        /// The world rectangle covered by the grid
        bounds: Aabb,

        /// The edge length of a square cell
        cell_size: f32,
    },
}

/// Configuration parameters for the physics simulation
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// The gravity applied to dynamic bodies
    pub gravity: Vector2,

    /// The number of iterations for solving velocity constraints
    pub velocity_iterations: u32,

    /// The number of iterations for solving position constraints
    pub position_iterations: u32,

    /// Skin added to body AABBs before they enter the broadphase, so a
    /// proxy need not be reinserted on every small move
    pub aabb_skin: f32,

    /// Penetration tolerated before position correction kicks in
    pub penetration_slop: f32,

    /// The bias factor for position correction (Baumgarte stabilization)
    pub baumgarte_factor: f32,

    /// Largest position correction applied in one iteration
    pub max_position_correction: f32,

    /// Approach speeds below this threshold produce no bounce
    pub restitution_velocity_threshold: f32,

    /// Global damping factor for linear velocity, applied per step
    pub linear_damping: f32,

    /// Global damping factor for angular velocity, applied per step
    pub angular_damping: f32,

    /// Which broadphase structure to use
    pub broadphase: BroadPhaseKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vector2::new(0.0, -981.0),
            velocity_iterations: 8,
            position_iterations: 3,
            aabb_skin: 2.0,
            penetration_slop: 0.005,
            baumgarte_factor: 0.2,
            max_position_correction: 0.2,
            restitution_velocity_threshold: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            broadphase: BroadPhaseKind::Tree,
        }
    }
}
