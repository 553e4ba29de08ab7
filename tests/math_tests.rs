use impulse2d::math::{wrap_angle, Aabb, Vector2};
use impulse2d::shapes::Shape;
use std::f32::consts::PI;
use approx::assert_relative_eq;

#[test]
fn test_vector2_operations() {
    let v1 = Vector2::new(1.0, 2.0);
    let v2 = Vector2::new(4.0, 5.0);

    // Addition
    let sum = v1 + v2;
    assert_eq!(sum.x, 5.0);
    assert_eq!(sum.y, 7.0);

    // Subtraction
    let diff = v2 - v1;
    assert_eq!(diff.x, 3.0);
    assert_eq!(diff.y, 3.0);

    // Scalar multiplication
    let scaled = v1 * 2.0;
    assert_eq!(scaled.x, 2.0);
    assert_eq!(scaled.y, 4.0);

    // Dot product
    assert_eq!(v1.dot(&v2), 1.0 * 4.0 + 2.0 * 5.0);

    // 2D cross product
    assert_eq!(v1.cross(&v2), 1.0 * 5.0 - 2.0 * 4.0);

    // Length
    assert_relative_eq!(v1.length(), (1.0f32 + 4.0).sqrt());

    // Normalization
    let n = Vector2::new(3.0, 4.0).normalize();
    assert_relative_eq!(n.length(), 1.0, epsilon = 1.0e-6);
    assert_relative_eq!(n.x, 0.6, epsilon = 1.0e-6);
    assert_relative_eq!(n.y, 0.8, epsilon = 1.0e-6);
}

#[test]
fn test_vector2_perp_is_counter_clockwise() {
    let v = Vector2::unit_x();
    let p = v.perp();

    assert_relative_eq!(p.x, 0.0);
    assert_relative_eq!(p.y, 1.0);
    assert_relative_eq!(v.dot(&p), 0.0);
}

#[test]
fn test_vector2_rotation() {
    let v = Vector2::unit_x();

    let r = v.rotate(PI / 2.0);
    assert_relative_eq!(r.x, 0.0, epsilon = 1.0e-6);
    assert_relative_eq!(r.y, 1.0, epsilon = 1.0e-6);

    let r = v.rotate(PI);
    assert_relative_eq!(r.x, -1.0, epsilon = 1.0e-6);
    assert_relative_eq!(r.y, 0.0, epsilon = 1.0e-6);
}

#[test]
fn test_cross_scalar() {
    // w x v for w = 1 rotates v by 90 degrees counter-clockwise
    let v = Vector2::new(3.0, 1.0);
    let r = Vector2::cross_scalar(1.0, &v);

    assert_relative_eq!(r.x, -1.0);
    assert_relative_eq!(r.y, 3.0);
}

#[test]
fn test_wrap_angle() {
    assert_relative_eq!(wrap_angle(0.0), 0.0);
    assert_relative_eq!(wrap_angle(PI), PI);
    assert_relative_eq!(wrap_angle(-PI), PI, epsilon = 1.0e-5);
    assert_relative_eq!(wrap_angle(3.0 * PI), PI, epsilon = 1.0e-5);
    assert_relative_eq!(wrap_angle(2.0 * PI), 0.0, epsilon = 1.0e-5);
    assert_relative_eq!(wrap_angle(-PI / 2.0), -PI / 2.0);
}

#[test]
fn test_aabb_overlap_is_closed_inclusive() {
    let a = Aabb::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));
    let b = Aabb::new(Vector2::new(1.0, 0.0), Vector2::new(2.0, 1.0));
    let c = Aabb::new(Vector2::new(1.1, 0.0), Vector2::new(2.0, 1.0));

    // Touching edges count as overlapping
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
    assert!(!a.overlaps(&c));
}

#[test]
fn test_aabb_fatten_and_union() {
    let a = Aabb::new(Vector2::new(0.0, 0.0), Vector2::new(2.0, 2.0));

    let fat = a.fatten(1.0);
    assert_eq!(fat.min, Vector2::new(-1.0, -1.0));
    assert_eq!(fat.max, Vector2::new(3.0, 3.0));
    assert!(fat.contains(&a));

    let b = Aabb::new(Vector2::new(3.0, -1.0), Vector2::new(4.0, 1.0));
    let u = a.union(&b);
    assert_eq!(u.min, Vector2::new(0.0, -1.0));
    assert_eq!(u.max, Vector2::new(4.0, 2.0));

    assert_relative_eq!(a.area(), 4.0);
    assert_relative_eq!(u.area(), 4.0 * 3.0);
}

#[test]
fn test_circle_aabb() {
    let shape = Shape::circle(5.0);
    let aabb = shape.compute_aabb(Vector2::new(10.0, -2.0), 1.3);

    // Rotation does not matter for circles
    assert_eq!(aabb.min, Vector2::new(5.0, -7.0));
    assert_eq!(aabb.max, Vector2::new(15.0, 3.0));
}

#[test]
fn test_rotated_box_aabb() {
    let shape = Shape::rect(1.0, 1.0);

    let axis_aligned = shape.compute_aabb(Vector2::zero(), 0.0);
    assert_relative_eq!(axis_aligned.min.x, -1.0, epsilon = 1.0e-6);
    assert_relative_eq!(axis_aligned.max.y, 1.0, epsilon = 1.0e-6);

    // A unit half-extent square rotated 45 degrees spans sqrt(2)
    let rotated = shape.compute_aabb(Vector2::zero(), PI / 4.0);
    let expected = 2.0f32.sqrt();
    assert_relative_eq!(rotated.max.x, expected, epsilon = 1.0e-5);
    assert_relative_eq!(rotated.max.y, expected, epsilon = 1.0e-5);
    assert_relative_eq!(rotated.min.x, -expected, epsilon = 1.0e-5);
}

#[test]
fn test_shape_mass_properties() {
    let circle = Shape::circle(2.0);
    assert_relative_eq!(circle.area(), PI * 4.0);
    // Solid disc: I = m r^2 / 2
    assert_relative_eq!(circle.inertia(3.0), 0.5 * 3.0 * 4.0);

    let rect = Shape::rect(1.0, 2.0);
    assert_relative_eq!(rect.area(), 8.0);
    // Rectangle: I = m (w^2 + h^2) / 12
    assert_relative_eq!(rect.inertia(6.0), 6.0 * (4.0 + 16.0) / 12.0);
}
