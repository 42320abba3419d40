//! Collision detection and response for circles against rectangles and circles
//!
//! Every resolver uses minimal translation: the circle is pushed out along the
//! contact normal by exactly the overlap. Velocities are left alone.

use glam::Vec2;

use super::state::{Body, Wall};

/// Result of a ray/segment test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Intersection point
    pub point: Vec2,
    /// Fraction along the ray (0 < t <= 1)
    pub t: f32,
}

/// Closest point on (or inside) the wall rectangle to `p`
///
/// Written with min/max rather than `clamp` so degenerate rectangles never panic.
#[inline]
pub fn closest_point_on_rect(p: Vec2, wall: &Wall) -> Vec2 {
    Vec2::new(
        p.x.max(wall.x).min(wall.x + wall.width),
        p.y.max(wall.y).min(wall.y + wall.height),
    )
}

/// Check if a point lies inside the wall rectangle (edges inclusive)
#[inline]
pub fn point_in_rect(p: Vec2, wall: &Wall) -> bool {
    p.x >= wall.x && p.x <= wall.x + wall.width && p.y >= wall.y && p.y <= wall.y + wall.height
}

/// Check if two rectangles overlap once `a` is grown by `padding` on every side
pub fn rects_overlap(a: &Wall, b: &Wall, padding: f32) -> bool {
    a.x - padding < b.x + b.width
        && a.x + a.width + padding > b.x
        && a.y - padding < b.y + b.height
        && a.y + a.height + padding > b.y
}

/// Check if two circles overlap
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) < reach * reach
}

/// Push a circle out of a wall rectangle
///
/// Returns true if the body was moved. A center lying exactly on the closest
/// point (inside the rectangle) has no defined normal and is left untouched.
pub fn resolve_circle_rect(body: &mut Body, wall: &Wall) -> bool {
    let closest = closest_point_on_rect(body.pos, wall);
    let delta = body.pos - closest;
    let dist_sq = delta.length_squared();

    if dist_sq < body.radius * body.radius && dist_sq > 0.0 {
        let dist = dist_sq.sqrt();
        let normal = delta / dist;
        body.pos += normal * (body.radius - dist);
        return true;
    }

    false
}

/// Push a circle out of another (static) circle
///
/// Returns true on contact so callers can apply side effects like damage.
pub fn resolve_circle_circle(body: &mut Body, center: Vec2, radius: f32) -> bool {
    let delta = body.pos - center;
    let dist_sq = delta.length_squared();
    let reach = body.radius + radius;

    if dist_sq < reach * reach && dist_sq > 0.0 {
        let dist = dist_sq.sqrt();
        let normal = delta / dist;
        body.pos += normal * (reach - dist);
        return true;
    }

    false
}

/// Check if a wall stops a projectile body
///
/// Low walls never block projectiles.
pub fn blocks_projectile(body: &Body, wall: &Wall) -> bool {
    if wall.is_low {
        return false;
    }
    let closest = closest_point_on_rect(body.pos, wall);
    body.pos.distance_squared(closest) < body.radius * body.radius
}

#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Intersect the ray `ray_start -> ray_end` with segment `seg_start -> seg_end`
///
/// Hits count only strictly ahead of the ray start (0 < t <= 1) and within
/// the segment (0 <= u <= 1). Parallel or zero-length inputs never hit.
pub fn ray_segment_intersect(
    ray_start: Vec2,
    ray_end: Vec2,
    seg_start: Vec2,
    seg_end: Vec2,
) -> Option<RayHit> {
    let r = ray_end - ray_start;
    let s = seg_end - seg_start;
    let denom = cross(r, s);
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let qp = seg_start - ray_start;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;

    if t > 0.0 && t <= 1.0 && (0.0..=1.0).contains(&u) {
        Some(RayHit {
            point: ray_start + r * t,
            t,
        })
    } else {
        None
    }
}

/// The four edges of a wall rectangle
pub fn wall_segments(wall: &Wall) -> [(Vec2, Vec2); 4] {
    let tl = Vec2::new(wall.x, wall.y);
    let tr = Vec2::new(wall.x + wall.width, wall.y);
    let br = Vec2::new(wall.x + wall.width, wall.y + wall.height);
    let bl = Vec2::new(wall.x, wall.y + wall.height);
    [(tl, tr), (tr, br), (br, bl), (bl, tl)]
}

/// Nearest hit of a ray against every vision-blocking wall
pub fn cast_ray(ray_start: Vec2, ray_end: Vec2, walls: &[Wall]) -> Option<RayHit> {
    walls
        .iter()
        .filter(|w| !w.is_low)
        .flat_map(wall_segments)
        .filter_map(|(a, b)| ray_segment_intersect(ray_start, ray_end, a, b))
        .min_by(|a, b| a.t.total_cmp(&b.t))
}
