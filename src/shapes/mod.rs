use crate::math::{Aabb, Vector2};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A collision shape attached to a rigid body.
///
/// Shapes are a small tagged payload rather than trait objects so the
/// narrowphase can dispatch on the (shape, shape) pair with a plain match.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Shape {
    /// A circle centered on the body origin
    Circle {
        /// The circle's radius
        radius: f32,
    },

    /// An oriented rectangle centered on the body origin
    Box {
        /// Half the rectangle's width
        half_width: f32,

        /// Half the rectangle's height
        half_height: f32,
    },
}

impl Shape {
    /// Creates a circle shape
    #[inline]
    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    /// Creates a box shape from half extents
    #[inline]
    pub fn rect(half_width: f32, half_height: f32) -> Self {
        Shape::Box { half_width, half_height }
    }

    /// Returns the area covered by the shape
    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Box { half_width, half_height } => 4.0 * half_width * half_height,
        }
    }

    /// Returns the moment of inertia about the shape's center for the
    /// given mass
    pub fn inertia(&self, mass: f32) -> f32 {
        match *self {
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Box { half_width, half_height } => {
                let w = 2.0 * half_width;
                let h = 2.0 * half_height;
                mass * (w * w + h * h) / 12.0
            }
        }
    }

    /// Computes the tight world-space AABB of the shape at the given
    /// position and rotation
    pub fn compute_aabb(&self, position: Vector2, rotation: f32) -> Aabb {
        match *self {
            Shape::Circle { radius } => {
                let extents = Vector2::new(radius, radius);
                Aabb::new(position - extents, position + extents)
            }
            Shape::Box { half_width, half_height } => {
                let corners = [
                    Vector2::new(-half_width, -half_height),
                    Vector2::new(half_width, -half_height),
                    Vector2::new(half_width, half_height),
                    Vector2::new(-half_width, half_height),
                ];

                let first = position + corners[0].rotate(rotation);
                let mut aabb = Aabb::new(first, first);

                for corner in &corners[1..] {
                    let world = position + corner.rotate(rotation);
                    aabb.min.x = aabb.min.x.min(world.x);
                    aabb.min.y = aabb.min.y.min(world.y);
                    aabb.max.x = aabb.max.x.max(world.x);
                    aabb.max.y = aabb.max.y.max(world.y);
                }

                aabb
            }
        }
    }
}
