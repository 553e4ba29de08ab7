use crate::bodies::{RigidBody, RigidBodyType};
use crate::collision::collision_filter::GroupMaskFilter;
use crate::collision::collision_pair::BodyPair;
use crate::collision::contact_manifold::{ContactManifold, ContactPoint};
use crate::math::{Vector2, LINEAR_SLOP_DISTANCE};
use crate::shapes::Shape;

/// Computes contact manifolds for the surviving candidate pairs.
///
/// Pairs are processed in the order the broadphase emitted them. A pair
/// is rejected when either body is disabled, both are static, the
/// collision filter excludes it, or the tight AABBs no longer overlap
/// (the broadphase works on fattened boxes and may over-report).
pub fn detect_collisions(
    pairs: &[BodyPair],
    bodies: &[RigidBody],
    filter: &GroupMaskFilter,
) -> Vec<ContactManifold> {
    let mut manifolds = Vec::new();

    for pair in pairs {
        let body_a = match bodies.get(pair.body_a as usize) {
            Some(body) => body,
            None => continue,
        };
        let body_b = match bodies.get(pair.body_b as usize) {
            Some(body) => body,
            None => continue,
        };

        if !body_a.is_enabled() || !body_b.is_enabled() {
            continue;
        }

        if body_a.body_type() == RigidBodyType::Static
            && body_b.body_type() == RigidBodyType::Static
        {
            continue;
        }

        if !filter.should_collide(pair.body_a, pair.body_b) {
            continue;
        }

        if !body_a.compute_aabb().overlaps(&body_b.compute_aabb()) {
            continue;
        }

        if let Some(mut manifold) = collide(*pair, body_a, body_b) {
            manifold.set_material_properties(
                body_a.material().restitution.min(body_b.material().restitution),
                body_a.material().friction.min(body_b.material().friction),
            );
            manifolds.push(manifold);
        }
    }

    manifolds
}

/// Dispatches on the shape pair and computes a manifold, or rejects.
/// The manifold normal always points from body A (the lower id) to B.
pub fn collide(pair: BodyPair, body_a: &RigidBody, body_b: &RigidBody) -> Option<ContactManifold> {
    match (body_a.shape(), body_b.shape()) {
        (Shape::Circle { radius: radius_a }, Shape::Circle { radius: radius_b }) => {
            circle_circle(pair, body_a.position(), radius_a, body_b.position(), radius_b)
        }
        (Shape::Circle { radius }, Shape::Box { .. }) => {
            circle_box(pair, body_a.position(), radius, body_b, false)
        }
        (Shape::Box { .. }, Shape::Circle { radius }) => {
            circle_box(pair, body_b.position(), radius, body_a, true)
        }
        (Shape::Box { .. }, Shape::Box { .. }) => {
            box_box(pair, Obb::from_body(body_a), Obb::from_body(body_b))
        }
    }
}

fn circle_circle(
    pair: BodyPair,
    pos_a: Vector2,
    radius_a: f32,
    pos_b: Vector2,
    radius_b: f32,
) -> Option<ContactManifold> {
    let delta = pos_b - pos_a;
    let distance = delta.length();

    if distance > radius_a + radius_b {
        return None;
    }

    // Concentric centers leave no usable normal
    if distance < LINEAR_SLOP_DISTANCE {
        return None;
    }

    let normal = delta / distance;
    let penetration = radius_a + radius_b - distance;
    let position = pos_a + normal * (radius_a - 0.5 * penetration);

    let mut manifold = ContactManifold::new(pair, normal);
    manifold.add_point(ContactPoint::new(position, penetration, 0));
    Some(manifold)
}

/// Circle against oriented box. `flipped` is true when the box is body
/// A of the pair, in which case the A-to-B normal runs box-to-circle.
fn circle_box(
    pair: BodyPair,
    circle_pos: Vector2,
    radius: f32,
    box_body: &RigidBody,
    flipped: bool,
) -> Option<ContactManifold> {
    let (half_width, half_height) = match box_body.shape() {
        Shape::Box { half_width, half_height } => (half_width, half_height),
        _ => return None,
    };

    let rotation = box_body.rotation();
    let local = (circle_pos - box_body.position()).rotate(-rotation);

    let clamped = Vector2::new(
        local.x.clamp(-half_width, half_width),
        local.y.clamp(-half_height, half_height),
    );

    let (local_normal, penetration, local_contact) = if (local - clamped).length_squared()
        < LINEAR_SLOP_DISTANCE * LINEAR_SLOP_DISTANCE
    {
        // Center inside the box (or on its surface): push out through
        // the nearest face
        let dist_pos_x = half_width - local.x;
        let dist_neg_x = local.x + half_width;
        let dist_pos_y = half_height - local.y;
        let dist_neg_y = local.y + half_height;

        let min_dist = dist_pos_x.min(dist_neg_x).min(dist_pos_y).min(dist_neg_y);

        let normal = if min_dist == dist_pos_x {
            Vector2::unit_x()
        } else if min_dist == dist_neg_x {
            -Vector2::unit_x()
        } else if min_dist == dist_pos_y {
            Vector2::unit_y()
        } else {
            -Vector2::unit_y()
        };

        let contact = local - normal * min_dist;
        (normal, radius + min_dist, contact)
    } else {
        let delta = local - clamped;
        let distance = delta.length();

        if distance > radius {
            return None;
        }

        (delta / distance, radius - distance, clamped)
    };

    // `local_normal` points from the box surface towards the circle
    let world_normal = local_normal.rotate(rotation);
    let position = box_body.position() + local_contact.rotate(rotation);

    let normal = if flipped { world_normal } else { -world_normal };

    let mut manifold = ContactManifold::new(pair, normal);
    manifold.add_point(ContactPoint::new(position, penetration, 0));
    Some(manifold)
}

/// An oriented box unpacked into world space for the SAT test
struct Obb {
    center: Vector2,
    axes: [Vector2; 2],
    extents: [f32; 2],
}

impl Obb {
    fn from_body(body: &RigidBody) -> Self {
        let (half_width, half_height) = match body.shape() {
            Shape::Box { half_width, half_height } => (half_width, half_height),
            _ => (0.0, 0.0),
        };

        let rotation = body.rotation();
        Self {
            center: body.position(),
            axes: [Vector2::unit_x().rotate(rotation), Vector2::unit_y().rotate(rotation)],
            extents: [half_width, half_height],
        }
    }

    /// Projection radius of the box onto a unit axis
    fn projection(&self, axis: &Vector2) -> f32 {
        self.extents[0] * self.axes[0].dot(axis).abs()
            + self.extents[1] * self.axes[1].dot(axis).abs()
    }
}

/// A clip vertex carrying a feature index through the clipping passes
#[derive(Clone, Copy)]
struct ClipVertex {
    point: Vector2,
    id: u32,
}

/// Clips a two-point segment against the half-plane
/// dot(normal, p) <= offset, interpolating a replacement vertex when an
/// endpoint is cut away. Returns `None` when fewer than two points
/// survive.
fn clip_segment(
    vertices: [ClipVertex; 2],
    normal: Vector2,
    offset: f32,
    new_id: u32,
) -> Option<[ClipVertex; 2]> {
    let distance_0 = normal.dot(&vertices[0].point) - offset;
    let distance_1 = normal.dot(&vertices[1].point) - offset;

    let mut out = [vertices[0]; 2];
    let mut count = 0;

    if distance_0 <= 0.0 {
        out[count] = vertices[0];
        count += 1;
    }
    if distance_1 <= 0.0 {
        out[count] = vertices[1];
        count += 1;
    }

    if distance_0 * distance_1 < 0.0 {
        let t = distance_0 / (distance_0 - distance_1);
        out[count] = ClipVertex {
            point: vertices[0].point + (vertices[1].point - vertices[0].point) * t,
            id: new_id,
        };
        count += 1;
    }

    if count == 2 {
        Some(out)
    } else {
        None
    }
}

/// Box against box: separating axis test over the four face normals,
/// then Sutherland-Hodgman clipping of the incident face against the
/// reference face's side planes. Produces up to two contact points.
fn box_box(pair: BodyPair, a: Obb, b: Obb) -> Option<ContactManifold> {
    let delta = b.center - a.center;

    let axes = [a.axes[0], a.axes[1], b.axes[0], b.axes[1]];

    let mut best_overlap = f32::MAX;
    let mut best_axis = 0;

    for (i, axis) in axes.iter().enumerate() {
        let ra = a.projection(axis);
        let rb = b.projection(axis);
        let distance = delta.dot(axis);

        let overlap = ra + rb - distance.abs();
        if overlap < 0.0 {
            return None;
        }

        if overlap < best_overlap {
            best_overlap = overlap;
            best_axis = i;
        }
    }

    // Orient the separating axis so the normal points from A to B
    let axis_sign = if delta.dot(&axes[best_axis]) >= 0.0 { 1.0 } else { -1.0 };
    let normal = axes[best_axis] * axis_sign;

    let flipped = best_axis >= 2;
    let (reference, incident) = if flipped { (&b, &a) } else { (&a, &b) };

    // Outward normal of the reference face, pointing at the incident box
    let ref_normal = if flipped { -normal } else { normal };

    let ref_axis = best_axis % 2;
    let ref_side = reference.axes[1 - ref_axis];
    let ref_extent = reference.extents[1 - ref_axis];
    let ref_face_center =
        reference.center + ref_normal * reference.extents[ref_axis];

    // Incident face: the face of the other box most anti-parallel to
    // the reference normal
    let dot_0 = incident.axes[0].dot(&ref_normal);
    let dot_1 = incident.axes[1].dot(&ref_normal);

    let inc_axis = if dot_0.abs() > dot_1.abs() { 0 } else { 1 };
    let inc_sign = if (if inc_axis == 0 { dot_0 } else { dot_1 }) > 0.0 { -1.0 } else { 1.0 };

    let inc_face_center =
        incident.center + incident.axes[inc_axis] * (incident.extents[inc_axis] * inc_sign);
    let inc_side = incident.axes[1 - inc_axis] * incident.extents[1 - inc_axis];

    let incident_face = [
        ClipVertex { point: inc_face_center - inc_side, id: 0 },
        ClipVertex { point: inc_face_center + inc_side, id: 1 },
    ];

    // Clip against the two side planes of the reference face
    let side_offset = ref_side.dot(&ref_face_center);
    let clipped = clip_segment(incident_face, -ref_side, -(side_offset - ref_extent), 2)?;
    let clipped = clip_segment(clipped, ref_side, side_offset + ref_extent, 3)?;

    let mut manifold = ContactManifold::new(pair, normal);
    let face_offset = ref_normal.dot(&ref_face_center);

    for vertex in &clipped {
        let separation = ref_normal.dot(&vertex.point) - face_offset;

        if separation <= 0.0 {
            let feature =
                ((flipped as u32) << 8) | ((best_axis as u32) << 4) | vertex.id;
            manifold.add_point(ContactPoint::new(vertex.point, -separation, feature));
        }
    }

    if manifold.is_empty() {
        None
    } else {
        Some(manifold)
    }
}
