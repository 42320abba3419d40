//! Flashlight visibility mask
//!
//! The darkness layer is one path filled with the even-odd rule:
//!
//! 1. a rectangle covering the view plus a margin
//! 2. the flashlight cone, one vertex per ray, each ray cut at the nearest
//!    vision-blocking wall
//! 3. the proximity bubble around the source
//!
//! Points covered by the rectangle and exactly one of the other subpaths are
//! left transparent. The cone and the bubble must therefore never overlap:
//! the bubble only spans the angles outside the beam, and cone rays are never
//! shorter than the bubble radius so the beam side of the bubble stays lit.

use glam::Vec2;
use std::f32::consts::TAU;

use super::camera::Camera;
use super::shapes::{arc_points, point_in_polygon, rect_polygon};
use crate::consts::{BEAM_FOV, BEAM_LENGTH, MASK_MARGIN, PROXIMITY_RADIUS};
use crate::direction;
use crate::sim::{Wall, cast_ray};

/// Segments used for the outer arc of the proximity bubble
const BUBBLE_SEGMENTS: u32 = 48;

/// Where the light comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub pos: Vec2,
    /// Beam direction (radians)
    pub aim: f32,
}

/// Even-odd darkness path in world coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityMask {
    /// First subpath is always the covering rectangle
    pub subpaths: Vec<Vec<Vec2>>,
}

impl VisibilityMask {
    /// Build the mask for the camera; `None` gives total darkness
    pub fn build(camera: &Camera, light: Option<LightSource>, walls: &[Wall], rays: u32) -> Self {
        let (min, max) = camera.visible_bounds(MASK_MARGIN);
        let mut subpaths = vec![rect_polygon(min, max)];

        if let Some(light) = light {
            subpaths.push(beam_cone(light, walls, rays));
            subpaths.push(proximity_bubble(light));
        }

        Self { subpaths }
    }

    /// True when the source is missing and nothing is lit
    pub fn is_total_darkness(&self) -> bool {
        self.subpaths.len() == 1
    }

    /// Classify a world point with the same parity the fill uses
    ///
    /// Anything outside the covering rectangle is off-screen and counts as dark.
    pub fn is_dark(&self, p: Vec2) -> bool {
        let Some(cover) = self.subpaths.first() else {
            return true;
        };
        if !point_in_polygon(p, cover) {
            return true;
        }
        let crossings = self
            .subpaths
            .iter()
            .filter(|poly| point_in_polygon(p, poly))
            .count();
        crossings % 2 == 1
    }

    /// Same path in screen space
    pub fn to_screen(&self, camera: &Camera) -> Vec<Vec<Vec2>> {
        self.subpaths
            .iter()
            .map(|poly| poly.iter().map(|&p| camera.world_to_screen(p)).collect())
            .collect()
    }
}

fn beam_cone(light: LightSource, walls: &[Wall], rays: u32) -> Vec<Vec2> {
    let rays = rays.max(1);
    let start = light.aim - BEAM_FOV / 2.0;
    let step = BEAM_FOV / rays as f32;

    let mut cone = Vec::with_capacity(rays as usize + 2);
    cone.push(light.pos);
    for i in 0..=rays {
        let dir = direction(start + step * i as f32);
        let end = light.pos + dir * BEAM_LENGTH;
        let reach = cast_ray(light.pos, end, walls)
            .map_or(BEAM_LENGTH, |hit| hit.t * BEAM_LENGTH)
            .max(PROXIMITY_RADIUS);
        cone.push(light.pos + dir * reach);
    }
    cone
}

/// Bubble sector covering every angle outside the beam
fn proximity_bubble(light: LightSource) -> Vec<Vec2> {
    let from = light.aim + BEAM_FOV / 2.0;
    let to = light.aim + TAU - BEAM_FOV / 2.0;
    let mut bubble = vec![light.pos];
    bubble.extend(arc_points(light.pos, PROXIMITY_RADIUS, from, to, BUBBLE_SEGMENTS));
    bubble
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BEAM_RAYS;
    use proptest::prelude::*;

    fn camera() -> Camera {
        Camera::new(Vec2::ZERO, Vec2::new(1600.0, 1200.0))
    }

    fn facing_right() -> Option<LightSource> {
        Some(LightSource {
            pos: Vec2::ZERO,
            aim: 0.0,
        })
    }

    #[test]
    fn test_cone_and_bubble_are_visible() {
        let mask = VisibilityMask::build(&camera(), facing_right(), &[], BEAM_RAYS);
        assert_eq!(mask.subpaths.len(), 3);
        // In the beam
        assert!(!mask.is_dark(Vec2::new(300.0, 0.0)));
        // In the beam and inside the bubble radius
        assert!(!mask.is_dark(Vec2::new(40.0, 5.0)));
        // Behind, inside the bubble
        assert!(!mask.is_dark(Vec2::new(-40.0, 0.0)));
        // Behind, outside the bubble
        assert!(mask.is_dark(Vec2::new(-200.0, 0.0)));
        // Ahead but past the beam length
        assert!(mask.is_dark(Vec2::new(700.0, 0.0)));
        // Off to the side
        assert!(mask.is_dark(Vec2::new(200.0, 300.0)));
        // Off-screen
        assert!(mask.is_dark(Vec2::new(5000.0, 0.0)));
    }

    #[test]
    fn test_walls_cast_shadows_but_low_walls_do_not() {
        let high = vec![Wall::new(200.0, -100.0, 20.0, 200.0, false)];
        let mask = VisibilityMask::build(&camera(), facing_right(), &high, BEAM_RAYS);
        assert!(!mask.is_dark(Vec2::new(150.0, 0.0)));
        assert!(mask.is_dark(Vec2::new(300.0, 0.0)));

        let low = vec![Wall::new(200.0, -100.0, 20.0, 200.0, true)];
        let mask = VisibilityMask::build(&camera(), facing_right(), &low, BEAM_RAYS);
        assert!(!mask.is_dark(Vec2::new(300.0, 0.0)));
    }

    #[test]
    fn test_wall_inside_bubble_keeps_bubble_lit() {
        let walls = vec![Wall::new(30.0, -100.0, 10.0, 200.0, false)];
        let mask = VisibilityMask::build(&camera(), facing_right(), &walls, BEAM_RAYS);
        assert!(!mask.is_dark(Vec2::new(60.0, 0.0)));
        assert!(mask.is_dark(Vec2::new(200.0, 0.0)));
    }

    #[test]
    fn test_missing_source_is_total_darkness() {
        let mask = VisibilityMask::build(&camera(), None, &[], BEAM_RAYS);
        assert!(mask.is_total_darkness());
        assert!(mask.is_dark(Vec2::ZERO));
        assert!(mask.is_dark(Vec2::new(300.0, 0.0)));
    }

    #[test]
    fn test_screen_space_path() {
        let cam = Camera::new(Vec2::new(100.0, 100.0), Vec2::new(800.0, 600.0));
        let light = Some(LightSource {
            pos: cam.focus,
            aim: 0.0,
        });
        let mask = VisibilityMask::build(&cam, light, &[], 8);
        let screen = mask.to_screen(&cam);
        assert_eq!(screen[1][0], Vec2::new(400.0, 300.0));
        assert_eq!(screen[0][0], Vec2::new(-MASK_MARGIN, -MASK_MARGIN));
    }

    proptest! {
        #[test]
        fn prop_unobstructed_beam_is_visible(
            aim in -3.0f32..3.0,
            offset in -0.49f32..0.49,
            dist in 1.0f32..590.0,
        ) {
            let light = Some(LightSource { pos: Vec2::ZERO, aim });
            let mask = VisibilityMask::build(&camera(), light, &[], BEAM_RAYS);
            let p = direction(aim + offset * BEAM_FOV) * dist;
            prop_assert!(!mask.is_dark(p));
        }

        #[test]
        fn prop_outside_beam_and_bubble_is_dark(
            aim in -3.0f32..3.0,
            offset in 0.55f32..0.95,
            dist in 90.0f32..500.0,
        ) {
            let light = Some(LightSource { pos: Vec2::ZERO, aim });
            let mask = VisibilityMask::build(&camera(), light, &[], BEAM_RAYS);
            // Angles beyond the half-beam on either side
            let angle = aim + offset * std::f32::consts::PI;
            let p = direction(angle) * dist;
            prop_assert!(mask.is_dark(p));
        }
    }
}
