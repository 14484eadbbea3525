//! Impulse-based collision response.
//!
//! Every pair goes through the same steps once a contact normal (pointing from
//! body `a` to body `b`) and an overlap depth are known:
//!
//! 1. If the bodies already separate along the normal, no impulse is applied.
//! 2. Otherwise a restitution impulse `j = -(1 + e) * vn / (im_a + im_b)` is split
//!    by inverse mass, followed by Coulomb friction bounded by `mu * j`.
//! 3. Overlap beyond [`POSITION_SLOP`] is removed at [`CORRECTION_PERCENT`] by
//!    editing positions directly, weighted by inverse mass.
//!
//! `e` and `mu` are the means of the two bodies' coefficients.

use crate::body::{Aabb, Body, Contact, Shape};
use crate::vector::Vector;
use crate::{CORRECTION_PERCENT, POSITION_SLOP};

/// What the resolver did with a detected pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// An overlap-only body was involved; only notification happens.
    Trigger,
    /// An earlier pair in the same tick already pushed them apart.
    Apart,
    /// Moving apart along the normal; positions may still be corrected.
    Separating,
    /// Impulse (and friction) applied.
    Impulse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Outward normal of this side.
    fn normal(self) -> Vector {
        match self {
            Side::Left => Vector::new(-1.0, 0.0),
            Side::Right => Vector::new(1.0, 0.0),
            Side::Top => Vector::new(0.0, -1.0),
            Side::Bottom => Vector::new(0.0, 1.0),
        }
    }

    fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }

    fn mark(self, body: &mut Body) {
        match self {
            Side::Left => body.contacts.left = true,
            Side::Right => body.contacts.right = true,
            Side::Top => body.contacts.top = true,
            Side::Bottom => body.contacts.bottom = true,
        }
    }
}

/// Resolves one detected pair in place.
pub fn resolve_pair(a: &mut Body, b: &mut Body, contact: Contact) -> Resolution {
    if (a.is_overlap_only() && !b.is_static()) || (b.is_overlap_only() && !a.is_static()) {
        return Resolution::Trigger;
    }

    match contact {
        Contact::BoxBox => resolve_box_box(a, b),
        Contact::DiscDisc => resolve_disc_disc(a, b),
        Contact::BoxDisc { .. } => {
            if a.is_box() {
                resolve_box_disc(a, b)
            } else {
                resolve_box_disc(b, a)
            }
        }
    }
}

/// Separates two boxes along the axis of least penetration.
///
/// The four directed overlaps are checked in the order a-right, a-left,
/// a-bottom, a-top; the first strictly smallest one wins.
pub fn resolve_box_box(a: &mut Body, b: &mut Body) -> Resolution {
    let bounds_a = a.bounds();
    let bounds_b = b.bounds();
    if !bounds_a.overlaps(&bounds_b) {
        return Resolution::Apart;
    }

    let candidates = [
        (bounds_a.max.x - bounds_b.min.x, Side::Right),
        (bounds_b.max.x - bounds_a.min.x, Side::Left),
        (bounds_a.max.y - bounds_b.min.y, Side::Bottom),
        (bounds_b.max.y - bounds_a.min.y, Side::Top),
    ];
    let (overlap, side) = candidates
        .iter()
        .copied()
        .fold(candidates[0], |best, candidate| {
            if candidate.0.abs() < best.0.abs() {
                candidate
            } else {
                best
            }
        });

    side.mark(a);
    side.opposite().mark(b);
    apply_response(a, b, side.normal(), overlap.abs())
}

/// Pushes two discs apart along the line between their centers.
pub fn resolve_disc_disc(a: &mut Body, b: &mut Body) -> Resolution {
    let (Shape::Disc { radius: ra }, Shape::Disc { radius: rb }) = (a.shape(), b.shape()) else {
        return Resolution::Apart;
    };

    let delta = b.position - a.position;
    let distance = delta.length();
    let overlap = ra + rb - distance;
    if overlap <= 0.0 {
        return Resolution::Apart;
    }

    apply_response(a, b, delta.normalize(), overlap)
}

/// Resolves a box against a disc. The disc takes the `a` role.
pub fn resolve_box_disc(boxed: &mut Body, disc: &mut Body) -> Resolution {
    let Shape::Disc { radius } = disc.shape() else {
        return Resolution::Apart;
    };
    let bounds = boxed.bounds();
    let center = disc.position;
    let point = bounds.closest_point(center);
    let distance = point.distance(center);

    let (outward, overlap, side) = if distance == 0.0 {
        // Center buried in the box: bring it back onto the nearest face first
        let (depth, side) = deepest_face(&bounds, center);
        separate(disc, boxed, -side.normal(), depth);
        (side.normal(), radius, side)
    } else {
        if distance >= radius {
            return Resolution::Apart;
        }
        ((center - point).normalize(), radius - distance, side_of(&bounds, point))
    };

    side.mark(boxed);
    apply_response(disc, boxed, -outward, overlap)
}

/// Moves `a` against `normal` and `b` along it until `distance` is closed,
/// split by inverse mass.
fn separate(a: &mut Body, b: &mut Body, normal: Vector, distance: f64) {
    let inverse_sum = a.inverse_mass() + b.inverse_mass();
    if inverse_sum == 0.0 {
        return;
    }

    let shift = normal * (distance / inverse_sum);
    a.position = a.position - shift * a.inverse_mass();
    b.position = b.position + shift * b.inverse_mass();
}

/// Edge the contact point lies on. Left/right win over top/bottom at corners.
fn side_of(bounds: &Aabb, point: Vector) -> Side {
    if point.x == bounds.min.x {
        Side::Left
    } else if point.x == bounds.max.x {
        Side::Right
    } else if point.y == bounds.min.y {
        Side::Top
    } else {
        Side::Bottom
    }
}

/// Face nearest to a point inside the box, and the distance to it.
fn deepest_face(bounds: &Aabb, center: Vector) -> (f64, Side) {
    let faces = [
        (center.x - bounds.min.x, Side::Left),
        (bounds.max.x - center.x, Side::Right),
        (center.y - bounds.min.y, Side::Top),
        (bounds.max.y - center.y, Side::Bottom),
    ];
    faces.iter().copied().fold(faces[0], |best, face| {
        if face.0 < best.0 {
            face
        } else {
            best
        }
    })
}

fn apply_response(a: &mut Body, b: &mut Body, normal: Vector, overlap: f64) -> Resolution {
    let inverse_sum = a.inverse_mass() + b.inverse_mass();
    if inverse_sum == 0.0 {
        return Resolution::Separating;
    }

    let relative = b.velocity - a.velocity;
    let normal_speed = relative.dot(normal);

    let resolution = if normal_speed >= 0.0 {
        Resolution::Separating
    } else {
        let restitution = (a.restitution + b.restitution) / 2.0;
        let j = -(1.0 + restitution) * normal_speed / inverse_sum;
        let impulse = normal * j;
        a.velocity = a.velocity - impulse * a.inverse_mass();
        b.velocity = b.velocity + impulse * b.inverse_mass();

        apply_friction(a, b, normal, j, inverse_sum);
        Resolution::Impulse
    };

    if overlap > POSITION_SLOP {
        let correction = normal * (CORRECTION_PERCENT * overlap / inverse_sum);
        a.position = a.position - correction * a.inverse_mass();
        b.position = b.position + correction * b.inverse_mass();
    }

    resolution
}

fn apply_friction(a: &mut Body, b: &mut Body, normal: Vector, j: f64, inverse_sum: f64) {
    let relative = b.velocity - a.velocity;
    let tangent = (relative - normal * relative.dot(normal)).normalize();
    if tangent == Vector::ZERO {
        return;
    }

    let friction = (a.friction + b.friction) / 2.0;
    let limit = (j * friction).abs();
    let jt = (-relative.dot(tangent) / inverse_sum).clamp(-limit, limit);

    let impulse = tangent * jt;
    a.velocity = a.velocity - impulse * a.inverse_mass();
    b.velocity = b.velocity + impulse * b.inverse_mass();
}
