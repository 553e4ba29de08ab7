use crate::bodies::{body_flags::BodyFlags, ForceType, Material, RigidBodyType};
use crate::math::{Aabb, Vector2};
use crate::shapes::Shape;

/// A rigid body for 2D physics simulation
#[derive(Debug, Clone)]
pub struct RigidBody {
    /// The body's position in world space
    position: Vector2,

    /// The body's rotation in radians. Not normalized; wrapped to
    /// (-PI, PI] only where absolute angles are compared.
    rotation: f32,

    /// The body's linear velocity
    linear_velocity: Vector2,

    /// The body's angular velocity in radians per second
    angular_velocity: f32,

    /// The body's material properties
    material: Material,

    /// The body's collision shape
    shape: Shape,

    /// The body's type (dynamic, kinematic, or static)
    body_type: RigidBodyType,

    /// The body's mass
    mass: f32,

    /// Inverse of the body's mass (zero for static and kinematic bodies)
    inv_mass: f32,

    /// The body's moment of inertia about its center
    inertia: f32,

    /// Inverse of the body's moment of inertia
    inv_inertia: f32,

    /// The body's flags
    flags: BodyFlags,

    /// Forces and impulses to be applied in the next integration step
    forces: Vec<ForceType>,
}

impl RigidBody {
    /// Creates a new rigid body with the given shape, position and rotation
    pub fn new(shape: Shape, position: Vector2, rotation: f32, body_type: RigidBodyType) -> Self {
        let mut body = Self {
            position,
            rotation,
            linear_velocity: Vector2::zero(),
            angular_velocity: 0.0,
            material: Material::default(),
            shape,
            body_type,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            flags: BodyFlags::ENABLED | BodyFlags::AFFECTED_BY_GRAVITY,
            forces: Vec::new(),
        };

        body.update_mass_properties();
        body
    }

    /// Creates a new dynamic rigid body with the given shape and position
    pub fn new_dynamic(shape: Shape, position: Vector2) -> Self {
        Self::new(shape, position, 0.0, RigidBodyType::Dynamic)
    }

    /// Creates a new static rigid body with the given shape and position
    pub fn new_static(shape: Shape, position: Vector2) -> Self {
        Self::new(shape, position, 0.0, RigidBodyType::Static)
    }

    /// Returns the body's position
    pub fn position(&self) -> Vector2 {
        self.position
    }

    /// Sets the body's position
    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
    }

    /// Returns the body's rotation in radians
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Sets the body's rotation in radians
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    /// Returns the body's linear velocity
    pub fn linear_velocity(&self) -> Vector2 {
        self.linear_velocity
    }

    /// Sets the body's linear velocity
    pub fn set_linear_velocity(&mut self, velocity: Vector2) {
        if self.body_type != RigidBodyType::Static {
            self.linear_velocity = velocity;
        }
    }

    /// Returns the body's angular velocity
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Sets the body's angular velocity
    pub fn set_angular_velocity(&mut self, velocity: f32) {
        if self.body_type != RigidBodyType::Static {
            self.angular_velocity = velocity;
        }
    }

    /// Returns the body's material
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Sets the body's material
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
        self.update_mass_properties();
    }

    /// Returns the body's shape
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Sets the body's shape
    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
        self.update_mass_properties();
    }

    /// Returns the body's mass
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Overrides the body's mass, recomputing both inverse mass and
    /// inverse inertia. Ignored for non-dynamic bodies.
    pub fn set_mass(&mut self, mass: f32) {
        if self.body_type != RigidBodyType::Dynamic || mass <= 0.0 {
            return;
        }

        self.mass = mass;
        self.inv_mass = 1.0 / mass;
        self.inertia = self.shape.inertia(mass);
        self.inv_inertia = if self.inertia > 0.0 { 1.0 / self.inertia } else { 0.0 };
    }

    /// Returns the body's inverse mass
    pub fn inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Returns the body's inverse moment of inertia
    pub fn inverse_inertia(&self) -> f32 {
        self.inv_inertia
    }

    /// Returns the body type
    pub fn body_type(&self) -> RigidBodyType {
        self.body_type
    }

    /// Returns whether the body is affected by gravity
    pub fn is_affected_by_gravity(&self) -> bool {
        self.flags.contains(BodyFlags::AFFECTED_BY_GRAVITY)
    }

    /// Sets whether the body is affected by gravity
    pub fn set_affected_by_gravity(&mut self, affected: bool) {
        self.flags.set(BodyFlags::AFFECTED_BY_GRAVITY, affected);
    }

    /// Returns whether the body participates in simulation
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(BodyFlags::ENABLED)
    }

    /// Sets whether the body participates in simulation
    pub fn set_enabled(&mut self, enabled: bool) {
        self.flags.set(BodyFlags::ENABLED, enabled);
    }

    /// Computes the tight world-space AABB of the body's shape
    pub fn compute_aabb(&self) -> Aabb {
        self.shape.compute_aabb(self.position, self.rotation)
    }

    /// Updates the body's mass properties from its shape and material
    pub fn update_mass_properties(&mut self) {
        if self.body_type == RigidBodyType::Dynamic {
            self.mass = self.shape.area() * self.material.density;

            if self.mass > 0.0 {
                self.inv_mass = 1.0 / self.mass;
            } else {
                self.inv_mass = 0.0;
            }

            self.inertia = self.shape.inertia(self.mass);
            self.inv_inertia = if self.inertia > 0.0 { 1.0 / self.inertia } else { 0.0 };
        } else {
            // Static and kinematic bodies have infinite mass
            self.mass = 0.0;
            self.inv_mass = 0.0;
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
        }
    }

    /// Applies a force at the center of mass
    pub fn apply_force(&mut self, force: Vector2) {
        if self.body_type == RigidBodyType::Dynamic {
            self.forces.push(ForceType::Force(force));
        }
    }

    /// Applies a force at a specific world point
    pub fn apply_force_at_point(&mut self, force: Vector2, point: Vector2) {
        if self.body_type == RigidBodyType::Dynamic {
            self.forces.push(ForceType::ForceAtPoint { force, point });
        }
    }

    /// Applies a torque to the body
    pub fn apply_torque(&mut self, torque: f32) {
        if self.body_type == RigidBodyType::Dynamic {
            self.forces.push(ForceType::Torque(torque));
        }
    }

    /// Applies an impulse at the center of mass
    pub fn apply_impulse(&mut self, impulse: Vector2) {
        if self.body_type == RigidBodyType::Dynamic {
            self.forces.push(ForceType::Impulse(impulse));
        }
    }

    /// Applies an impulse at a specific world point
    pub fn apply_impulse_at_point(&mut self, impulse: Vector2, point: Vector2) {
        if self.body_type == RigidBodyType::Dynamic {
            self.forces.push(ForceType::ImpulseAtPoint { impulse, point });
        }
    }

    /// Applies an angular impulse to the body
    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        if self.body_type == RigidBodyType::Dynamic {
            self.forces.push(ForceType::AngularImpulse(impulse));
        }
    }

    /// Applies damping to the body's velocities
    pub fn apply_damping(&mut self, linear_damping: f32, angular_damping: f32) {
        if self.body_type != RigidBodyType::Dynamic {
            return;
        }

        let linear_factor = 1.0 - linear_damping.clamp(0.0, 1.0);
        self.linear_velocity *= linear_factor;

        let angular_factor = 1.0 - angular_damping.clamp(0.0, 1.0);
        self.angular_velocity *= angular_factor;
    }

    /// Integrates gravity and accumulated forces into velocities.
    /// Only dynamic bodies respond.
    pub fn integrate_forces(&mut self, gravity: Vector2, dt: f32) {
        if self.body_type != RigidBodyType::Dynamic {
            self.forces.clear();
            return;
        }

        if self.is_affected_by_gravity() {
            self.linear_velocity += gravity * dt;
        }

        for force in &self.forces {
            match *force {
                ForceType::Force(force) => {
                    self.linear_velocity += force * (self.inv_mass * dt);
                }
                ForceType::ForceAtPoint { force, point } => {
                    self.linear_velocity += force * (self.inv_mass * dt);

                    let r = point - self.position;
                    let torque = r.cross(&force);
                    self.angular_velocity += torque * self.inv_inertia * dt;
                }
                ForceType::Torque(torque) => {
                    self.angular_velocity += torque * self.inv_inertia * dt;
                }
                ForceType::Impulse(impulse) => {
                    self.linear_velocity += impulse * self.inv_mass;
                }
                ForceType::ImpulseAtPoint { impulse, point } => {
                    self.linear_velocity += impulse * self.inv_mass;

                    let r = point - self.position;
                    self.angular_velocity += r.cross(&impulse) * self.inv_inertia;
                }
                ForceType::AngularImpulse(impulse) => {
                    self.angular_velocity += impulse * self.inv_inertia;
                }
            }
        }

        self.forces.clear();
    }

    /// Integrates velocities into position and rotation.
    /// Static bodies never move; kinematic bodies follow their velocity.
    pub fn integrate_velocity(&mut self, dt: f32) {
        if self.body_type == RigidBodyType::Static {
            return;
        }

        self.position += self.linear_velocity * dt;
        self.rotation += self.angular_velocity * dt;
    }
}
