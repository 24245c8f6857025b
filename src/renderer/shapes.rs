//! Outline generation for shape sprites

use glam::Vec2;
use std::f32::consts::PI;

use crate::sim::ShapeKind;

/// How a shape is traced
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Polygon(Vec<Vec2>),
    Circle { center: Vec2, radius: f32 },
}

/// Outline of a shape centered at `center` with collision half-extents `half`
pub fn outline(kind: ShapeKind, center: Vec2, half: Vec2) -> Outline {
    match kind {
        ShapeKind::Circle => Outline::Circle {
            center,
            radius: half.x.min(half.y),
        },
        ShapeKind::Triangle => Outline::Polygon(vec![
            center + Vec2::new(0.0, -half.y),
            center + Vec2::new(half.x, half.y),
            center + Vec2::new(-half.x, half.y),
        ]),
        ShapeKind::Star => Outline::Polygon(star(center, half.x.min(half.y), 5)),
        ShapeKind::Rectangle | ShapeKind::Square | ShapeKind::Sticky => {
            Outline::Polygon(vec![
                center + Vec2::new(-half.x, -half.y),
                center + Vec2::new(half.x, -half.y),
                center + Vec2::new(half.x, half.y),
                center + Vec2::new(-half.x, half.y),
            ])
        }
    }
}

/// [`outline`] turned by `angle` radians about `center`
pub fn outline_at(kind: ShapeKind, center: Vec2, half: Vec2, angle: f32) -> Outline {
    let rotation = Vec2::from_angle(angle);
    match outline(kind, Vec2::ZERO, half) {
        Outline::Circle { radius, .. } => Outline::Circle { center, radius },
        Outline::Polygon(points) => Outline::Polygon(
            points
                .into_iter()
                .map(|p| center + rotation.rotate(p))
                .collect(),
        ),
    }
}

/// Star with `points` tips, first tip pointing up
fn star(center: Vec2, radius: f32, points: usize) -> Vec<Vec2> {
    let inner = radius * 0.45;
    (0..points * 2)
        .map(|i| {
            let r = if i % 2 == 0 { radius } else { inner };
            let theta = -PI / 2.0 + i as f32 * PI / points as f32;
            center + Vec2::new(r * theta.cos(), r * theta.sin())
        })
        .collect()
}

/// CSS color string for a 0xRRGGBB value
pub fn css_color(rgb: u32) -> String {
    format!("#{:06x}", rgb & 0xff_ffff)
}
