//! World-to-screen camera

use glam::Vec2;

/// Keeps the focused position at the center of the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub focus: Vec2,
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(focus: Vec2, viewport: Vec2) -> Self {
        Self { focus, viewport }
    }

    /// Screen translation: viewport center minus focus
    #[inline]
    pub fn offset(&self) -> Vec2 {
        self.viewport / 2.0 - self.focus
    }

    #[inline]
    pub fn world_to_screen(&self, p: Vec2) -> Vec2 {
        p + self.offset()
    }

    #[inline]
    pub fn screen_to_world(&self, p: Vec2) -> Vec2 {
        p - self.offset()
    }

    /// Visible world rectangle grown by `margin`
    pub fn visible_bounds(&self, margin: f32) -> (Vec2, Vec2) {
        let half = self.viewport / 2.0 + Vec2::splat(margin);
        (self.focus - half, self.focus + half)
    }

    /// Rough culling test for a circle
    pub fn sees_circle(&self, center: Vec2, radius: f32) -> bool {
        let (min, max) = self.visible_bounds(radius);
        center.x >= min.x && center.x <= max.x && center.y >= min.y && center.y <= max.y
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.viewport.x > 0.0 && self.viewport.y > 0.0)
    }
}
