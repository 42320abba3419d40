//! Polygon helpers for 2D primitives

use glam::Vec2;

/// Points along a circular arc from `start` to `end` (radians), inclusive
pub fn arc_points(center: Vec2, radius: f32, start: f32, end: f32, segments: u32) -> Vec<Vec2> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let theta = start + (end - start) * (i as f32 / segments as f32);
            center + Vec2::new(theta.cos(), theta.sin()) * radius
        })
        .collect()
}

/// Axis-aligned rectangle as a polygon (clockwise in screen space)
pub fn rect_polygon(min: Vec2, max: Vec2) -> Vec<Vec2> {
    vec![
        min,
        Vec2::new(max.x, min.y),
        max,
        Vec2::new(min.x, max.y),
    ]
}

/// Crossing-number test: true if `p` is inside the closed polygon
///
/// Same parity as an even-odd fill of the single polygon.
pub fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    if poly.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
