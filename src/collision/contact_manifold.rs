use crate::collision::collision_pair::BodyPair;
use crate::math::Vector2;

/// Maximum number of contact points in a 2D manifold
pub const MAX_CONTACT_POINTS: usize = 2;

/// A single contact point between two bodies
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    /// The position of the contact point in world space
    pub position: Vector2,

    /// The penetration depth at this point
    pub penetration: f32,

    /// Feature id identifying which shape features produced this point;
    /// used to match points across ticks for warm starting
    pub feature: u32,

    /// Accumulated impulse along the contact normal
    pub normal_impulse: f32,

    /// Accumulated impulse along the contact tangent
    pub tangent_impulse: f32,
}

impl ContactPoint {
    /// Creates a new contact point with zero accumulated impulses
    pub fn new(position: Vector2, penetration: f32, feature: u32) -> Self {
        Self {
            position,
            penetration,
            feature,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        }
    }
}

/// A collection of contact points between two colliding bodies
#[derive(Debug, Clone)]
pub struct ContactManifold {
    /// The collision pair this manifold belongs to
    pub pair: BodyPair,

    /// The contact normal, unit length, pointing from body A towards body B
    pub normal: Vector2,

    /// The contact points, at most two in 2D
    pub points: Vec<ContactPoint>,

    /// The restitution coefficient for this collision
    pub restitution: f32,

    /// The friction coefficient for this collision
    pub friction: f32,
}

impl ContactManifold {
    /// Creates a new empty contact manifold for the given collision pair
    pub fn new(pair: BodyPair, normal: Vector2) -> Self {
        Self {
            pair,
            normal,
            points: Vec::with_capacity(MAX_CONTACT_POINTS),
            restitution: 0.0,
            friction: 0.0,
        }
    }

    /// Adds a contact point to the manifold, keeping the deepest points
    /// once the manifold is full
    pub fn add_point(&mut self, point: ContactPoint) {
        if self.points.len() < MAX_CONTACT_POINTS {
            self.points.push(point);
            return;
        }

        // Replace the shallowest existing point if the new one is deeper
        let mut min_idx = 0;
        let mut min_penetration = self.points[0].penetration;

        for (i, p) in self.points.iter().enumerate().skip(1) {
            if p.penetration < min_penetration {
                min_idx = i;
                min_penetration = p.penetration;
            }
        }

        if point.penetration > min_penetration {
            self.points[min_idx] = point;
        }
    }

    /// Returns whether the manifold has no contact points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sets the mixed material properties for this collision
    pub fn set_material_properties(&mut self, restitution: f32, friction: f32) {
        self.restitution = restitution;
        self.friction = friction;
    }
}
