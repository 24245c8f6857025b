//! Playfield geometry
//!
//! Screen coordinates: origin top-left, y grows downward. The box is centered in
//! the viewport; its floor is the only solid surface and spans exactly the box
//! width, so an overhanging shape tips off the side and falls out.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::Viewport;
use crate::consts::{BOX_FRACTION, DROP_LINE_FRACTION};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Box left edge
    pub left: f32,
    /// Box right edge
    pub right: f32,
    /// Box top edge; taps must land above this to drop a shape
    pub top: f32,
    /// Box floor (top surface of the ground)
    pub floor: f32,
    /// Dashed guide line drawn above the box
    pub drop_line: f32,
    /// Lower bound of the box region; shapes at or below it are out
    pub kill_line: f32,
}

impl Field {
    pub fn from_viewport(viewport: Viewport) -> Self {
        let box_w = viewport.width * BOX_FRACTION;
        let box_h = viewport.height * BOX_FRACTION;
        let left = (viewport.width - box_w) / 2.0;
        let top = (viewport.height - box_h) / 2.0;
        Self {
            left,
            right: left + box_w,
            top,
            floor: top + box_h,
            drop_line: top - viewport.height * DROP_LINE_FRACTION,
            kill_line: viewport.height,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// A tap at this position may drop a shape
    #[inline]
    pub fn is_drop_zone(&self, pos: Vec2) -> bool {
        pos.y < self.top
    }

    /// Where a shape dropped from a tap at `pos` enters the box
    pub fn spawn_point(&self, pos: Vec2) -> Vec2 {
        Vec2::new(pos.x.clamp(self.left, self.right), self.top)
    }

    /// The one "still in the box" predicate, used for the live count and the final score
    #[inline]
    pub fn holds(&self, y: f32) -> bool {
        y < self.kill_line
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::from_viewport(Viewport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let field = Field::default();
        assert!((field.left - 64.0).abs() < 1e-3);
        assert!((field.right - 736.0).abs() < 1e-3);
        assert!((field.top - 48.0).abs() < 1e-3);
        assert!((field.floor - 552.0).abs() < 1e-3);
        assert!((field.drop_line - 0.0).abs() < 1e-3);
        assert_eq!(field.kill_line, 600.0);
    }

    #[test]
    fn test_drop_zone_is_strictly_above_box() {
        let field = Field::default();
        assert!(field.is_drop_zone(Vec2::new(100.0, field.top - 0.5)));
        assert!(!field.is_drop_zone(Vec2::new(100.0, field.top)));
        assert!(!field.is_drop_zone(Vec2::new(100.0, field.floor)));
    }

    #[test]
    fn test_spawn_point_clamps_into_box() {
        let field = Field::default();
        assert_eq!(field.spawn_point(Vec2::new(0.0, 10.0)), Vec2::new(field.left, field.top));
        assert_eq!(field.spawn_point(Vec2::new(9999.0, 10.0)).x, field.right);
        assert_eq!(field.spawn_point(Vec2::new(300.0, 10.0)).x, 300.0);
    }

    #[test]
    fn test_holds_is_strict() {
        let field = Field::default();
        assert!(field.holds(field.kill_line - 0.01));
        assert!(!field.holds(field.kill_line));
        assert!(!field.holds(field.kill_line + 50.0));
    }
}
