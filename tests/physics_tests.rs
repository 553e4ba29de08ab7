use impulse2d::collision::CollisionGroup;
use impulse2d::math::Vector2;
use impulse2d::{JointDef, PhysicsWorld, RigidBodyType, Shape};

use approx::assert_relative_eq;

const DT: f32 = 1.0 / 60.0;

fn zero_gravity_world(capacity: usize) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(capacity);
    world.set_gravity(Vector2::zero());
    world
}

#[test]
fn test_free_fall() {
    let mut world = PhysicsWorld::new(4);
    world.set_gravity(Vector2::new(0.0, -981.0));

    let ball = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::zero(), 0.0)
        .unwrap();
    world.body_mut(ball).unwrap().set_mass(1.0);

    // One step: v = g dt, y = v dt (semi-implicit integration)
    world.step(DT);
    {
        let body = world.body(ball).unwrap();
        assert_relative_eq!(body.linear_velocity().y, -981.0 * DT, epsilon = 1.0e-3);
        assert_relative_eq!(body.position().y, -981.0 * DT * DT, epsilon = 1.0e-4);
    }

    // One second of fall, tracked against the discrete expectation
    let mut expected_velocity = -981.0 * DT;
    let mut expected_position = expected_velocity * DT;

    for _ in 1..60 {
        world.step(DT);

        expected_velocity -= 981.0 * DT;
        expected_position += expected_velocity * DT;
    }

    let body = world.body(ball).unwrap();
    assert_relative_eq!(body.linear_velocity().y, expected_velocity, epsilon = 0.1);
    assert_relative_eq!(body.position().y, expected_position, epsilon = 0.5);

    // Coarse physical expectation: v ~ -981 after one second, y near
    // the analytic -g t^2 / 2
    assert_relative_eq!(body.linear_velocity().y, -981.0, epsilon = 1.0);
    assert!((body.position().y - (-490.5)).abs() < 0.02 * 490.5);
}

#[test]
fn test_ball_settles_on_ground() {
    let mut world = PhysicsWorld::new(4);
    world.set_gravity(Vector2::new(0.0, -981.0));

    world
        .create_body(
            RigidBodyType::Static,
            Shape::rect(500.0, 10.0),
            Vector2::new(0.0, -100.0),
            0.0,
        )
        .unwrap();

    let ball = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::zero(), 0.0)
        .unwrap();

    for _ in 0..120 {
        world.step(DT);
    }

    // Ground top is at -90, so the ball rests around -85
    let body = world.body(ball).unwrap();
    assert!(
        body.position().y > -90.0 && body.position().y < -80.0,
        "ball at y = {}",
        body.position().y
    );
    assert!(body.linear_velocity().y.abs() < 10.0);
}

#[test]
fn test_static_bodies_are_never_mutated() {
    let mut world = PhysicsWorld::new(8);
    world.set_gravity(Vector2::new(0.0, -981.0));

    let floor = world
        .create_body(
            RigidBodyType::Static,
            Shape::rect(200.0, 5.0),
            Vector2::new(0.0, -20.0),
            0.1,
        )
        .unwrap();

    // Bodies stacked so the floor is under constant load
    for i in 0..4 {
        world
            .create_body(
                RigidBodyType::Dynamic,
                Shape::circle(3.0),
                Vector2::new(2.0 * i as f32, -5.0 + 7.0 * i as f32),
                0.0,
            )
            .unwrap();
    }

    let (pos, rot, vel, omega) = {
        let body = world.body(floor).unwrap();
        (body.position(), body.rotation(), body.linear_velocity(), body.angular_velocity())
    };

    for _ in 0..120 {
        world.step(DT);

        let body = world.body(floor).unwrap();
        assert_eq!(body.position().x.to_bits(), pos.x.to_bits());
        assert_eq!(body.position().y.to_bits(), pos.y.to_bits());
        assert_eq!(body.rotation().to_bits(), rot.to_bits());
        assert_eq!(body.linear_velocity().x.to_bits(), vel.x.to_bits());
        assert_eq!(body.linear_velocity().y.to_bits(), vel.y.to_bits());
        assert_eq!(body.angular_velocity().to_bits(), omega.to_bits());
    }
}

#[test]
fn test_zero_dt_step_is_a_no_op() {
    let mut world = PhysicsWorld::new(4);
    world.set_gravity(Vector2::new(0.0, -981.0));

    // Two overlapping bodies with velocities, so every pipeline stage
    // would have work to do if it ran
    let a = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::zero(), 0.3)
        .unwrap();
    let b = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::new(4.0, 0.0), 0.0)
        .unwrap();
    world.set_velocity(a, Vector2::new(3.0, -1.0), 0.5).unwrap();

    let snapshot: Vec<(u32, u32, u32)> = [a, b]
        .iter()
        .map(|&id| {
            let body = world.body(id).unwrap();
            (
                body.position().x.to_bits(),
                body.position().y.to_bits(),
                body.rotation().to_bits(),
            )
        })
        .collect();

    world.step(0.0);

    for (i, &id) in [a, b].iter().enumerate() {
        let body = world.body(id).unwrap();
        assert_eq!(body.position().x.to_bits(), snapshot[i].0);
        assert_eq!(body.position().y.to_bits(), snapshot[i].1);
        assert_eq!(body.rotation().to_bits(), snapshot[i].2);
    }
}

#[test]
fn test_restitution_bounce() {
    let mut world = PhysicsWorld::new(4);
    world.set_gravity(Vector2::new(0.0, -981.0));

    let ground = world
        .create_body(
            RigidBodyType::Static,
            Shape::rect(500.0, 10.0),
            Vector2::new(0.0, -100.0),
            0.0,
        )
        .unwrap();

    let ball = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::zero(), 0.0)
        .unwrap();

    // Restitution mixes as the minimum of the two bodies, so both get
    // the bouncy material
    for id in [ground, ball] {
        let mut material = *world.body(id).unwrap().material();
        material.restitution = 0.8;
        world.body_mut(id).unwrap().set_material(material);
    }

    let mut min_height = f32::MAX;
    let mut max_height_after_bounce = f32::MIN;
    let mut has_bounced = false;

    for _ in 0..240 {
        world.step(DT);

        let y = world.body(ball).unwrap().position().y;
        min_height = min_height.min(y);

        if !has_bounced && y < -80.0 {
            has_bounced = true;
        }
        if has_bounced {
            max_height_after_bounce = max_height_after_bounce.max(y);
        }
    }

    assert!(has_bounced);
    // It came back up after hitting the ground, but not to the start
    assert!(max_height_after_bounce > min_height + 10.0);
    assert!(max_height_after_bounce < 0.0);
}

#[test]
fn test_contact_impulse_invariants() {
    let mut world = PhysicsWorld::new(4);
    world.set_gravity(Vector2::new(0.0, -981.0));

    world
        .create_body(
            RigidBodyType::Static,
            Shape::rect(100.0, 5.0),
            Vector2::new(0.0, -20.0),
            0.0,
        )
        .unwrap();
    let ball = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(3.0), Vector2::zero(), 0.0)
        .unwrap();
    // Sideways push keeps friction active while the contact persists
    world.set_velocity(ball, Vector2::new(40.0, 0.0), 0.0).unwrap();

    for _ in 0..120 {
        world.step(DT);

        // Accumulated normal impulses never pull, and friction stays
        // inside the Coulomb cone
        for (normal, tangent, friction) in world.contact_impulses() {
            assert!(normal >= 0.0, "normal impulse {} < 0", normal);
            assert!(
                tangent.abs() <= friction * normal + 1.0e-4,
                "tangent {} outside cone {} * {}",
                tangent,
                friction,
                normal
            );
        }
    }
}

#[test]
fn test_distance_joint_rope() {
    let mut world = zero_gravity_world(4);

    let a = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::zero(), 0.0)
        .unwrap();
    let b = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::new(10.0, 0.0), 0.0)
        .unwrap();
    world.body_mut(a).unwrap().set_mass(1.0);
    world.body_mut(b).unwrap().set_mass(1.0);

    world
        .create_joint(&JointDef::distance(a, b, Vector2::zero(), Vector2::zero(), 10.0))
        .unwrap();

    world.apply_impulse(b, Vector2::new(100.0, 0.0), None).unwrap();

    for _ in 0..30 {
        world.step(DT);

        let pa = world.body(a).unwrap().position();
        let pb = world.body(b).unwrap().position();
        let length = (pb - pa).length();

        assert!(
            length > 9.8 && length < 10.2,
            "rope stretched to {}",
            length
        );
    }
}

#[test]
fn test_soft_distance_joint_springs() {
    let mut world = zero_gravity_world(4);

    let a = world
        .create_body(RigidBodyType::Static, Shape::circle(0.5), Vector2::zero(), 0.0)
        .unwrap();
    let b = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::new(10.0, 0.0), 0.0)
        .unwrap();
    world.body_mut(b).unwrap().set_mass(1.0);

    world
        .create_joint(
            &JointDef::distance(a, b, Vector2::zero(), Vector2::zero(), 10.0)
                .with_frequency(2.0, 0.7),
        )
        .unwrap();

    // Stretch the spring and let it pull back
    world.set_transform(b, Vector2::new(14.0, 0.0), 0.0).unwrap();

    for _ in 0..240 {
        world.step(DT);
    }

    // The damped spring settles near its rest length
    let length = world.body(b).unwrap().position().length();
    assert!((length - 10.0).abs() < 1.0, "spring settled at {}", length);
}

#[test]
fn test_revolute_pendulum_conserves_energy() {
    let mut world = PhysicsWorld::new(4);
    world.set_gravity(Vector2::new(0.0, -10.0));

    let pivot = world
        .create_body(RigidBodyType::Static, Shape::circle(0.5), Vector2::zero(), 0.0)
        .unwrap();
    let bob = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(2.0), Vector2::new(10.0, 0.0), 0.0)
        .unwrap();
    world.body_mut(bob).unwrap().set_mass(1.0);

    world
        .create_joint(&JointDef::revolute(
            pivot,
            bob,
            Vector2::zero(),
            Vector2::new(-10.0, 0.0),
        ))
        .unwrap();

    // Kinetic (translational + rotational) plus potential, zero at the
    // starting height. The characteristic scale is m g L = 100.
    let inertia = 1.0 / world.body(bob).unwrap().inverse_inertia();
    let mut max_drift = 0.0f32;

    for _ in 0..500 {
        world.step(DT);

        let body = world.body(bob).unwrap();
        let kinetic = 0.5 * body.linear_velocity().length_squared()
            + 0.5 * inertia * body.angular_velocity() * body.angular_velocity();
        let potential = 10.0 * body.position().y;

        max_drift = max_drift.max((kinetic + potential).abs());
    }

    assert!(
        max_drift < 5.0,
        "energy drifted by {} (5% of m g L = 5.0)",
        max_drift
    );
}

#[test]
fn test_revolute_limits_bound_the_angle() {
    let mut world = PhysicsWorld::new(4);
    world.set_gravity(Vector2::new(0.0, -100.0));

    let pivot = world
        .create_body(RigidBodyType::Static, Shape::circle(0.5), Vector2::zero(), 0.0)
        .unwrap();
    let arm = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::new(5.0, 0.0), 0.0)
        .unwrap();

    world
        .create_joint(
            &JointDef::revolute(pivot, arm, Vector2::zero(), Vector2::new(-5.0, 0.0))
                .with_angle_limit(-0.5, 0.5),
        )
        .unwrap();

    for _ in 0..300 {
        world.step(DT);
    }

    // Gravity tries to swing the arm to -PI/2; the limit holds it near
    // the lower bound
    let angle = {
        let a = world.body(pivot).unwrap().rotation();
        let b = world.body(arm).unwrap().rotation();
        b - a
    };
    assert!(angle > -0.7, "arm swung past the limit to {}", angle);
}

#[test]
fn test_revolute_motor_spins_the_wheel() {
    let mut world = zero_gravity_world(4);

    let axle = world
        .create_body(RigidBodyType::Static, Shape::circle(0.5), Vector2::zero(), 0.0)
        .unwrap();
    let wheel = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(4.0), Vector2::zero(), 0.0)
        .unwrap();

    world
        .create_joint(
            &JointDef::revolute(axle, wheel, Vector2::zero(), Vector2::zero())
                .with_motor(5.0, 1000.0),
        )
        .unwrap();

    for _ in 0..120 {
        world.step(DT);
    }

    let omega = world.body(wheel).unwrap().angular_velocity();
    assert_relative_eq!(omega, 5.0, epsilon = 0.5);
}

#[test]
fn test_prismatic_joint_constrains_to_axis() {
    let mut world = zero_gravity_world(4);

    let base = world
        .create_body(RigidBodyType::Static, Shape::rect(1.0, 1.0), Vector2::zero(), 0.0)
        .unwrap();
    let slider = world
        .create_body(RigidBodyType::Dynamic, Shape::rect(1.0, 1.0), Vector2::new(5.0, 0.0), 0.0)
        .unwrap();

    world
        .create_joint(&JointDef::prismatic(
            base,
            slider,
            Vector2::zero(),
            Vector2::zero(),
            Vector2::unit_x(),
        ))
        .unwrap();

    // Push off-axis: the joint must absorb the perpendicular part
    world.apply_impulse(slider, Vector2::new(30.0, 50.0), None).unwrap();

    for _ in 0..120 {
        world.step(DT);
    }

    let body = world.body(slider).unwrap();
    assert!(body.position().y.abs() < 0.1, "drifted to y = {}", body.position().y);
    assert!(body.rotation().abs() < 0.05, "rotated to {}", body.rotation());
    // Along-axis motion stays free
    assert!(body.position().x > 5.0);
}

#[test]
fn test_prismatic_motor_and_limits() {
    let mut world = zero_gravity_world(4);

    let base = world
        .create_body(RigidBodyType::Static, Shape::rect(1.0, 1.0), Vector2::zero(), 0.0)
        .unwrap();
    let slider = world
        .create_body(RigidBodyType::Dynamic, Shape::rect(1.0, 1.0), Vector2::new(3.0, 0.0), 0.0)
        .unwrap();

    world
        .create_joint(
            &JointDef::prismatic(
                base,
                slider,
                Vector2::zero(),
                Vector2::zero(),
                Vector2::unit_x(),
            )
            .with_motor(10.0, 10000.0)
            .with_translation_limit(0.0, 8.0),
        )
        .unwrap();

    for _ in 0..300 {
        world.step(DT);
    }

    // The motor drives towards +x until the upper translation limit
    let x = world.body(slider).unwrap().position().x;
    assert!(x > 6.0 && x < 9.0, "slider at x = {}", x);
}

#[test]
fn test_weld_joint_holds_bodies_rigid() {
    let mut world = zero_gravity_world(4);

    let a = world
        .create_body(RigidBodyType::Dynamic, Shape::rect(2.0, 1.0), Vector2::zero(), 0.0)
        .unwrap();
    let b = world
        .create_body(RigidBodyType::Dynamic, Shape::rect(2.0, 1.0), Vector2::new(4.0, 0.0), 0.0)
        .unwrap();

    world
        .create_joint(&JointDef::weld(
            a,
            b,
            Vector2::new(2.0, 0.0),
            Vector2::new(-2.0, 0.0),
        ))
        .unwrap();

    // Kick one body; the pair should move as a rigid unit
    world.apply_impulse(a, Vector2::new(0.0, 50.0), Some(Vector2::new(-2.0, 0.0))).unwrap();

    for _ in 0..120 {
        world.step(DT);
    }

    let body_a = world.body(a).unwrap();
    let body_b = world.body(b).unwrap();

    let relative_angle = (body_b.rotation() - body_a.rotation()).abs();
    assert!(relative_angle < 0.05, "weld twisted by {}", relative_angle);

    let anchor_a = body_a.position() + Vector2::new(2.0, 0.0).rotate(body_a.rotation());
    let anchor_b = body_b.position() + Vector2::new(-2.0, 0.0).rotate(body_b.rotation());
    let gap = (anchor_b - anchor_a).length();
    assert!(gap < 0.1, "weld anchors separated by {}", gap);
}

#[test]
fn test_collision_filter_masks_out_pairs() {
    let mut world = zero_gravity_world(4);

    let a = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::zero(), 0.0)
        .unwrap();
    let b = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::new(4.0, 0.0), 0.0)
        .unwrap();

    world.set_collision_group(a, CollisionGroup::PLAYER).unwrap();
    world.set_collision_group(b, CollisionGroup::DEBRIS).unwrap();
    // Neither mask admits the other's group
    world.set_collision_mask(a, CollisionGroup::WORLD).unwrap();
    world.set_collision_mask(b, CollisionGroup::WORLD).unwrap();

    for _ in 0..30 {
        world.step(DT);
    }

    // Deeply overlapping, yet untouched: no contact was ever resolved
    assert_eq!(world.body(a).unwrap().linear_velocity().length(), 0.0);
    assert_eq!(world.body(b).unwrap().linear_velocity().length(), 0.0);
    assert_eq!(world.body(a).unwrap().position(), Vector2::zero());
}

#[test]
fn test_box_stack_comes_to_rest() {
    let mut world = PhysicsWorld::new(8);
    world.set_gravity(Vector2::new(0.0, -981.0));

    world
        .create_body(
            RigidBodyType::Static,
            Shape::rect(200.0, 10.0),
            Vector2::new(0.0, -10.0),
            0.0,
        )
        .unwrap();

    let mut boxes = Vec::new();
    for i in 0..3 {
        boxes.push(
            world
                .create_body(
                    RigidBodyType::Dynamic,
                    Shape::rect(5.0, 5.0),
                    Vector2::new(0.0, 6.0 + 11.0 * i as f32),
                    0.0,
                )
                .unwrap(),
        );
    }

    for _ in 0..600 {
        world.step(DT);
    }

    // Stacked boxes stay stacked: each sits roughly one box above the
    // one below, and nothing is still moving fast
    for (i, &id) in boxes.iter().enumerate() {
        let body = world.body(id).unwrap();
        let expected_y = 5.0 + 10.0 * i as f32;

        assert!(
            (body.position().y - expected_y).abs() < 3.0,
            "box {} rests at y = {}, expected near {}",
            i,
            body.position().y,
            expected_y
        );
        assert!(body.linear_velocity().length() < 15.0);
    }
}

#[test]
fn test_capacity_exhausted() {
    let mut world = zero_gravity_world(2);

    world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::zero(), 0.0)
        .unwrap();
    world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::new(5.0, 0.0), 0.0)
        .unwrap();

    let result = world.create_body(
        RigidBodyType::Dynamic,
        Shape::circle(1.0),
        Vector2::new(10.0, 0.0),
        0.0,
    );
    assert!(result.is_err());
    assert_eq!(world.body_count(), 2);
}

#[test]
fn test_joint_with_missing_body_is_rejected() {
    let mut world = zero_gravity_world(4);

    let a = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::zero(), 0.0)
        .unwrap();

    let result =
        world.create_joint(&JointDef::distance(a, 99, Vector2::zero(), Vector2::zero(), 5.0));
    assert!(result.is_err());
    assert_eq!(world.joint_count(), 0);
}

#[test]
fn test_joint_with_destroyed_body_is_skipped() {
    let mut world = zero_gravity_world(4);

    let a = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::zero(), 0.0)
        .unwrap();
    let b = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::new(5.0, 0.0), 0.0)
        .unwrap();

    world
        .create_joint(&JointDef::distance(a, b, Vector2::zero(), Vector2::zero(), 5.0))
        .unwrap();

    // Destroying the highest id leaves the joint referencing an
    // out-of-range body; stepping must simply skip it
    world.destroy_body(b).unwrap();

    for _ in 0..10 {
        world.step(DT);
    }

    assert_eq!(world.body_count(), 1);
    assert_eq!(world.joint_count(), 1);
}

#[test]
fn test_destroy_body_swaps_last_into_slot() {
    let mut world = zero_gravity_world(4);

    let a = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::zero(), 0.0)
        .unwrap();
    let _b = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), Vector2::new(5.0, 0.0), 0.0)
        .unwrap();
    let c_pos = Vector2::new(10.0, 0.0);
    let _c = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(1.0), c_pos, 0.0)
        .unwrap();

    world.destroy_body(a).unwrap();

    // The last body now answers to the destroyed id
    assert_eq!(world.body_count(), 2);
    assert_eq!(world.body(a).unwrap().position(), c_pos);
}

#[test]
fn test_disabled_body_does_not_move_or_collide() {
    let mut world = PhysicsWorld::new(4);
    world.set_gravity(Vector2::new(0.0, -981.0));

    let frozen = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::zero(), 0.0)
        .unwrap();
    world.body_mut(frozen).unwrap().set_enabled(false);

    let falling = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::new(0.0, 20.0), 0.0)
        .unwrap();

    for _ in 0..30 {
        world.step(DT);
    }

    // The disabled body never moved, and the falling one passed
    // straight through it
    assert_eq!(world.body(frozen).unwrap().position(), Vector2::zero());
    assert!(world.body(falling).unwrap().position().y < -10.0);
}

#[test]
fn test_grid_broadphase_world() {
    use impulse2d::math::Aabb;
    use impulse2d::{BroadPhaseKind, SimulationConfig};

    let config = SimulationConfig {
        gravity: Vector2::new(0.0, -981.0),
        broadphase: BroadPhaseKind::Grid {
            bounds: Aabb::new(Vector2::new(-200.0, -200.0), Vector2::new(200.0, 200.0)),
            cell_size: 20.0,
        },
        ..SimulationConfig::default()
    };
    let mut world = PhysicsWorld::with_config(8, config);

    world
        .create_body(
            RigidBodyType::Static,
            Shape::rect(150.0, 10.0),
            Vector2::new(0.0, -100.0),
            0.0,
        )
        .unwrap();
    let ball = world
        .create_body(RigidBodyType::Dynamic, Shape::circle(5.0), Vector2::zero(), 0.0)
        .unwrap();

    for _ in 0..120 {
        world.step(DT);
    }

    // Same outcome as the tree: the ball lands on the ground
    let y = world.body(ball).unwrap().position().y;
    assert!(y > -90.0 && y < -80.0, "ball at y = {}", y);
}
