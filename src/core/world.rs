use crate::bodies::{RigidBody, RigidBodyType};
use crate::collision::{
    detect_collisions, BodyPair, BroadPhase, CollisionGroup, CollisionMask, GridBroadPhase,
    GroupMaskFilter, SequentialImpulseSolver, TreeBroadPhase,
};
use crate::constraints::{Joint, JointDef};
use crate::core::{BodyId, BroadPhaseKind, JointId, SimulationConfig};
use crate::error::PhysicsError;
use crate::math::{Aabb, Vector2};
use crate::shapes::Shape;
use crate::Result;

/// The main physics world that owns all bodies, joints, the broadphase
/// and the contact cache, and advances the simulation one tick at a
/// time.
///
/// The world is purely in-memory, single-threaded and not re-entrant:
/// one caller drives [`PhysicsWorld::step`], and a step either runs to
/// completion or is not invoked at all.
///
/// Bodies live in a packed array. Ids are slot indices handed out
/// monotonically; destroying a body swaps the last body into its slot,
/// so the destroyed id comes to name the swapped body.
pub struct PhysicsWorld {
    /// All rigid bodies, packed
    bodies: Vec<RigidBody>,

    /// Maximum number of bodies the world accepts
    capacity: usize,

    /// All joints, packed
    joints: Vec<Joint>,

    /// Configuration for the simulation
    config: SimulationConfig,

    /// The broadphase structure producing candidate pairs
    broadphase: Box<dyn BroadPhase>,

    /// Group/mask collision filtering
    filter: GroupMaskFilter,

    /// The sequential impulse contact solver and its warm-start cache
    contact_solver: SequentialImpulseSolver,

    /// Scratch: (body id, tight AABB) list handed to the broadphase
    aabb_scratch: Vec<(BodyId, Aabb)>,

    /// Scratch: candidate pairs from the broadphase
    pairs: Vec<BodyPair>,

    /// The total elapsed simulation time
    time: f32,
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings and the given
    /// body capacity
    pub fn new(capacity: usize) -> Self {
        Self::with_config(capacity, SimulationConfig::default())
    }

    /// Creates a new physics world with the given configuration
    pub fn with_config(capacity: usize, config: SimulationConfig) -> Self {
        let broadphase: Box<dyn BroadPhase> = match config.broadphase {
            BroadPhaseKind::Tree => Box::new(TreeBroadPhase::new(2 * capacity, config.aabb_skin)),
            BroadPhaseKind::Grid { bounds, cell_size } => {
                Box::new(GridBroadPhase::new(bounds, cell_size))
            }
        };

        Self {
            bodies: Vec::with_capacity(capacity),
            capacity,
            joints: Vec::new(),
            contact_solver: SequentialImpulseSolver::new(&config),
            config,
            broadphase,
            filter: GroupMaskFilter::new(),
            aabb_scratch: Vec::new(),
            pairs: Vec::new(),
            time: 0.0,
        }
    }

    /// Returns the current simulation time
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Sets the gravity for the simulation
    pub fn set_gravity(&mut self, gravity: Vector2) {
        self.config.gravity = gravity;
    }

    /// Gets the current gravity
    pub fn gravity(&self) -> Vector2 {
        self.config.gravity
    }

    /// Returns a reference to the simulation configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Creates a body and returns its id
    pub fn create_body(
        &mut self,
        body_type: RigidBodyType,
        shape: Shape,
        position: Vector2,
        rotation: f32,
    ) -> Result<BodyId> {
        if self.bodies.len() >= self.capacity {
            return Err(PhysicsError::CapacityExhausted(format!(
                "world is full ({} bodies)",
                self.capacity
            )));
        }

        let id = self.bodies.len() as BodyId;
        self.bodies.push(RigidBody::new(shape, position, rotation, body_type));

        // Keep the filter table aligned with the body store
        self.filter.set_group(id, CollisionGroup::DEFAULT);
        self.filter.set_mask(id, CollisionMask::ALL);

        Ok(id)
    }

    /// Adds an already-built body to the world
    pub fn add_body(&mut self, body: RigidBody) -> Result<BodyId> {
        if self.bodies.len() >= self.capacity {
            return Err(PhysicsError::CapacityExhausted(format!(
                "world is full ({} bodies)",
                self.capacity
            )));
        }

        let id = self.bodies.len() as BodyId;
        self.bodies.push(body);
        self.filter.set_group(id, CollisionGroup::DEFAULT);
        self.filter.set_mask(id, CollisionMask::ALL);

        Ok(id)
    }

    /// Destroys a body by swapping the last body into its slot.
    ///
    /// The last body takes over the destroyed id. Joints referencing a
    /// destroyed id are skipped during solving once the id goes out of
    /// range.
    pub fn destroy_body(&mut self, id: BodyId) -> Result<RigidBody> {
        let index = id as usize;
        if index >= self.bodies.len() {
            return Err(PhysicsError::ResourceNotFound(format!(
                "body {} not found",
                id
            )));
        }

        self.filter.swap_remove(id);
        Ok(self.bodies.swap_remove(index))
    }

    /// Gets a reference to a body by its id
    pub fn body(&self, id: BodyId) -> Result<&RigidBody> {
        self.bodies
            .get(id as usize)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("body {} not found", id)))
    }

    /// Gets a mutable reference to a body by its id
    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut RigidBody> {
        self.bodies
            .get_mut(id as usize)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("body {} not found", id)))
    }

    /// Returns the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Applies a force at a body's center of mass
    pub fn apply_force(&mut self, id: BodyId, force: Vector2) -> Result<()> {
        self.body_mut(id)?.apply_force(force);
        Ok(())
    }

    /// Applies an impulse to a body, at its center of mass or at a
    /// world point
    pub fn apply_impulse(
        &mut self,
        id: BodyId,
        impulse: Vector2,
        at_world_point: Option<Vector2>,
    ) -> Result<()> {
        let body = self.body_mut(id)?;

        match at_world_point {
            Some(point) => body.apply_impulse_at_point(impulse, point),
            None => body.apply_impulse(impulse),
        }

        Ok(())
    }

    /// Sets a body's linear and angular velocity
    pub fn set_velocity(&mut self, id: BodyId, linear: Vector2, angular: f32) -> Result<()> {
        let body = self.body_mut(id)?;
        body.set_linear_velocity(linear);
        body.set_angular_velocity(angular);
        Ok(())
    }

    /// Teleports a body to a new position and rotation
    pub fn set_transform(&mut self, id: BodyId, position: Vector2, rotation: f32) -> Result<()> {
        let body = self.body_mut(id)?;
        body.set_position(position);
        body.set_rotation(rotation);
        Ok(())
    }

    /// Sets a body's collision group
    pub fn set_collision_group(&mut self, id: BodyId, group: CollisionGroup) -> Result<()> {
        self.body(id)?;
        self.filter.set_group(id, group);
        Ok(())
    }

    /// Sets which collision groups a body collides with
    pub fn set_collision_mask(&mut self, id: BodyId, mask: CollisionMask) -> Result<()> {
        self.body(id)?;
        self.filter.set_mask(id, mask);
        Ok(())
    }

    /// Creates a joint from a definition and returns its id.
    ///
    /// A definition naming an out-of-range body is rejected and has no
    /// effect.
    pub fn create_joint(&mut self, def: &JointDef) -> Result<JointId> {
        if def.body_a as usize >= self.bodies.len() || def.body_b as usize >= self.bodies.len() {
            return Err(PhysicsError::ResourceNotFound(format!(
                "joint references missing body {} or {}",
                def.body_a, def.body_b
            )));
        }

        if def.body_a == def.body_b {
            return Err(PhysicsError::InvalidParameter(
                "joint must connect two distinct bodies".into(),
            ));
        }

        let id = self.joints.len() as JointId;
        self.joints.push(Joint::from_def(def));
        Ok(id)
    }

    /// Destroys a joint by swapping the last joint into its slot
    pub fn destroy_joint(&mut self, id: JointId) -> Result<Joint> {
        let index = id as usize;
        if index >= self.joints.len() {
            return Err(PhysicsError::ResourceNotFound(format!(
                "joint {} not found",
                id
            )));
        }

        Ok(self.joints.swap_remove(index))
    }

    /// Gets a reference to a joint by its id
    pub fn joint(&self, id: JointId) -> Result<&Joint> {
        self.joints
            .get(id as usize)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("joint {} not found", id)))
    }

    /// Returns the number of joints in the world
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Returns the accumulated (normal, tangent, friction) triples of
    /// every contact point from the last step
    pub fn contact_impulses(&self) -> Vec<(f32, f32, f32)> {
        self.contact_solver.accumulated_impulses()
    }

    /// Advances the simulation by exactly one tick.
    ///
    /// A zero or negative `dt` is a no-op: positions, rotations and
    /// velocities are left untouched.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        // 1. Integrate forces into velocities
        for body in &mut self.bodies {
            if !body.is_enabled() {
                continue;
            }

            body.apply_damping(self.config.linear_damping, self.config.angular_damping);
            body.integrate_forces(self.config.gravity, dt);
        }

        // 2. Refresh broadphase proxies from the tight AABBs
        self.aabb_scratch.clear();
        for (index, body) in self.bodies.iter().enumerate() {
            self.aabb_scratch.push((index as BodyId, body.compute_aabb()));
        }
        self.broadphase.update(&self.aabb_scratch);

        // 3. Candidate pairs, in deterministic broadphase order
        self.pairs.clear();
        self.broadphase.collect_pairs(&mut self.pairs);

        // 4. Narrowphase filters candidates into contact manifolds
        let manifolds = detect_collisions(&self.pairs, &self.bodies, &self.filter);

        // 5. Initialize velocity constraints and warm start
        self.contact_solver.initialize(&manifolds, &mut self.bodies);
        for joint in &mut self.joints {
            joint.init_velocity(&mut self.bodies, dt);
        }

        // 6. Velocity iterations: joints first, then contacts
        for _ in 0..self.config.velocity_iterations {
            for joint in &mut self.joints {
                joint.solve_velocity(&mut self.bodies, dt);
            }
            self.contact_solver.solve_velocity(&mut self.bodies);
        }

        // 7. Integrate velocities into positions
        for body in &mut self.bodies {
            if body.is_enabled() {
                body.integrate_velocity(dt);
            }
        }

        // 8. Position iterations: joints first, then contacts
        for _ in 0..self.config.position_iterations {
            for joint in &mut self.joints {
                joint.solve_position(&mut self.bodies);
            }
            self.contact_solver.solve_position(&mut self.bodies);
        }

        // 9. Persist accumulated impulses for next tick's warm start
        self.contact_solver.store_impulses();

        self.time += dt;
    }

    /// Clears the world of all bodies, joints and cached contacts
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.joints.clear();
        self.filter = GroupMaskFilter::new();
        self.contact_solver = SequentialImpulseSolver::new(&self.config);
        self.time = 0.0;
    }
}
