//! Droppable shapes

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Stable shape identifier, unique within a round
pub type ShapeId = u32;

/// Shape types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Square,
    Sticky,
    Triangle,
    Circle,
    Star,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Rectangle,
        ShapeKind::Square,
        ShapeKind::Sticky,
        ShapeKind::Triangle,
        ShapeKind::Circle,
        ShapeKind::Star,
    ];

    /// Uniform pick; repeats allowed
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Asset name for the shape's sprite
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Square => "square",
            ShapeKind::Sticky => "sticky",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Star => "star",
        }
    }

    /// Collision half-extents (pixels)
    pub fn half_extents(&self) -> Vec2 {
        match self {
            ShapeKind::Rectangle => Vec2::new(40.0, 15.0),
            ShapeKind::Square => Vec2::new(22.0, 22.0),
            ShapeKind::Sticky => Vec2::new(25.0, 25.0),
            ShapeKind::Triangle => Vec2::new(25.0, 22.0),
            ShapeKind::Circle => Vec2::new(22.0, 22.0),
            ShapeKind::Star => Vec2::new(25.0, 24.0),
        }
    }

    /// Display color (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            ShapeKind::Rectangle => 0x4a90d9,
            ShapeKind::Square => 0xe94b3c,
            ShapeKind::Sticky => 0xf5d033,
            ShapeKind::Triangle => 0x50b848,
            ShapeKind::Circle => 0x9b59b6,
            ShapeKind::Star => 0xf39c12,
        }
    }
}

/// A shape dropped into the box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Center position; `pos.y` is the vertical position used for scoring
    pub pos: Vec2,
    /// Frozen shapes no longer accept position updates
    pub is_static: bool,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            is_static: false,
        }
    }
}
