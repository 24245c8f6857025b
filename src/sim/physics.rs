//! Physics collaborator
//!
//! The round only needs to spawn, freeze and remove bodies and to read their
//! positions back, so that is all [`PhysicsWorld`] asks for. [`StackPhysics`]
//! runs those bodies through rapier: a fixed ground slab spans the box floor and
//! nothing walls the sides, so shapes that slide past the edge fall out.

use glam::Vec2;
use rapier2d::prelude::*;
use std::f32::consts::{PI, TAU};

use super::field::Field;
use super::shape::{ShapeId, ShapeKind};
use crate::consts::GRAVITY;

/// What the round needs from a physics engine
pub trait PhysicsWorld {
    fn spawn(&mut self, id: ShapeId, kind: ShapeKind, pos: Vec2);
    /// Make a body static; it stops moving but still supports others
    fn freeze(&mut self, id: ShapeId);
    fn remove(&mut self, id: ShapeId);
    /// Advance by one fixed timestep
    fn step(&mut self, dt: f32);
    /// Current body centers, in spawn order
    fn positions(&self) -> Vec<(ShapeId, Vec2)>;
}

const GROUND_HALF_HEIGHT: f32 = 20.0;
const RESTITUTION: f32 = 0.5;
const FRICTION: f32 = 0.5;
/// Sticky shapes grip whatever they land on
const STICKY_FRICTION: f32 = 2.0;
/// Below this speed (px/s) a body counts as resting
const SETTLE_SPEED: f32 = 5.0;

/// Snapshot of one body for drawing and inspection
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub pos: Vec2,
    /// Rotation in radians
    pub angle: f32,
    pub half: Vec2,
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    id: ShapeId,
    kind: ShapeKind,
    handle: RigidBodyHandle,
    is_static: bool,
}

pub struct StackPhysics {
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Shape bodies in spawn order; the ground is not tracked
    tracked: Vec<Tracked>,
}

impl StackPhysics {
    pub fn new(field: &Field) -> Self {
        let mut rigid_bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // Ground slab whose top face is the box floor
        let ground = RigidBodyBuilder::fixed()
            .translation(vector![field.center_x(), field.floor + GROUND_HALF_HEIGHT])
            .build();
        let ground_handle = rigid_bodies.insert(ground);
        let ground_collider = ColliderBuilder::cuboid(field.width() / 2.0, GROUND_HALF_HEIGHT)
            .friction(FRICTION)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut rigid_bodies);

        Self {
            gravity: vector![0.0, GRAVITY],
            integration_params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies,
            colliders,
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            tracked: Vec::new(),
        }
    }

    pub fn bodies(&self) -> Vec<Body> {
        self.tracked.iter().filter_map(|t| self.snapshot(t)).collect()
    }

    pub fn body(&self, id: ShapeId) -> Option<Body> {
        let tracked = self.tracked.iter().find(|t| t.id == id)?;
        self.snapshot(tracked)
    }

    /// Everything at rest (or frozen)
    pub fn is_settled(&self) -> bool {
        self.tracked.iter().all(|t| {
            t.is_static
                || self
                    .rigid_bodies
                    .get(t.handle)
                    .is_none_or(|b| b.linvel().norm() < SETTLE_SPEED)
        })
    }

    fn snapshot(&self, tracked: &Tracked) -> Option<Body> {
        let body = self.rigid_bodies.get(tracked.handle)?;
        let t = body.translation();
        Some(Body {
            id: tracked.id,
            kind: tracked.kind,
            pos: Vec2::new(t.x, t.y),
            angle: body.rotation().angle(),
            half: tracked.kind.half_extents(),
            is_static: tracked.is_static,
        })
    }

    fn attach(&mut self, body: RigidBody, kind: ShapeKind) -> RigidBodyHandle {
        let handle = self.rigid_bodies.insert(body);
        self.colliders
            .insert_with_parent(collider_for(kind), handle, &mut self.rigid_bodies);
        handle
    }

    fn detach(&mut self, handle: RigidBodyHandle) -> Option<RigidBody> {
        self.rigid_bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        )
    }
}

impl PhysicsWorld for StackPhysics {
    fn spawn(&mut self, id: ShapeId, kind: ShapeKind, pos: Vec2) {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![pos.x, pos.y])
            .ccd_enabled(true)
            .build();
        let handle = self.attach(body, kind);
        self.tracked.push(Tracked {
            id,
            kind,
            handle,
            is_static: false,
        });
    }

    fn freeze(&mut self, id: ShapeId) {
        let Some(index) = self.tracked.iter().position(|t| t.id == id) else {
            return;
        };
        let tracked = self.tracked[index];
        if tracked.is_static {
            return;
        }
        // Swap the dynamic body for a fixed one in the same pose
        let Some(old) = self.detach(tracked.handle) else {
            return;
        };
        let fixed = RigidBodyBuilder::fixed().position(*old.position()).build();
        let handle = self.attach(fixed, tracked.kind);
        self.tracked[index] = Tracked {
            handle,
            is_static: true,
            ..tracked
        };
    }

    fn remove(&mut self, id: ShapeId) {
        let Some(index) = self.tracked.iter().position(|t| t.id == id) else {
            return;
        };
        let tracked = self.tracked.remove(index);
        self.detach(tracked.handle);
    }

    fn step(&mut self, dt: f32) {
        self.integration_params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    fn positions(&self) -> Vec<(ShapeId, Vec2)> {
        self.tracked
            .iter()
            .filter_map(|t| {
                let p = self.rigid_bodies.get(t.handle)?.translation();
                Some((t.id, Vec2::new(p.x, p.y)))
            })
            .collect()
    }
}

/// Collision shape matching the sprite outline
fn collider_for(kind: ShapeKind) -> Collider {
    let half = kind.half_extents();
    let builder = match kind {
        ShapeKind::Circle => ColliderBuilder::ball(half.x.min(half.y)),
        ShapeKind::Triangle => hull(
            &[
                Vec2::new(0.0, -half.y),
                Vec2::new(half.x, half.y),
                Vec2::new(-half.x, half.y),
            ],
            half,
        ),
        ShapeKind::Star => hull(&star_tips(half.x.min(half.y)), half),
        ShapeKind::Rectangle | ShapeKind::Square | ShapeKind::Sticky => {
            ColliderBuilder::cuboid(half.x, half.y)
        }
    };
    match kind {
        ShapeKind::Sticky => builder.friction(STICKY_FRICTION).restitution(0.0),
        _ => builder.friction(FRICTION).restitution(RESTITUTION),
    }
    .build()
}

fn hull(points: &[Vec2], half: Vec2) -> ColliderBuilder {
    let points: Vec<Point<Real>> = points.iter().map(|p| point![p.x, p.y]).collect();
    ColliderBuilder::convex_hull(&points).unwrap_or_else(|| ColliderBuilder::cuboid(half.x, half.y))
}

/// The five tips of an upright star; their hull is the star's collision shape
fn star_tips(radius: f32) -> Vec<Vec2> {
    (0..5)
        .map(|i| {
            let theta = -PI / 2.0 + i as f32 * TAU / 5.0;
            Vec2::new(radius * theta.cos(), radius * theta.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PHYSICS_DT;

    const TOLERANCE: f32 = 2.0;

    fn run(world: &mut StackPhysics, steps: usize) {
        for _ in 0..steps {
            world.step(PHYSICS_DT);
        }
    }

    #[test]
    fn test_body_lands_on_floor() {
        let field = Field::default();
        let mut world = StackPhysics::new(&field);
        world.spawn(1, ShapeKind::Square, Vec2::new(300.0, field.top));
        run(&mut world, 300);

        let body = world.body(1).unwrap();
        assert!((body.pos.y + body.half.y - field.floor).abs() < TOLERANCE);
        assert!(world.is_settled());
        assert!(field.holds(body.pos.y));
    }

    #[test]
    fn test_centered_body_stacks() {
        let field = Field::default();
        let mut world = StackPhysics::new(&field);
        world.spawn(1, ShapeKind::Square, Vec2::new(300.0, field.top));
        run(&mut world, 240);
        world.spawn(2, ShapeKind::Square, Vec2::new(300.0, field.top));
        run(&mut world, 240);

        let lower = world.body(1).unwrap();
        let upper = world.body(2).unwrap();
        let gap = (lower.pos.y - lower.half.y) - (upper.pos.y + upper.half.y);
        assert!(gap.abs() < TOLERANCE, "gap {gap}");
    }

    #[test]
    fn test_tall_pile_never_overlaps() {
        let field = Field::default();
        let mut world = StackPhysics::new(&field);
        // Enough squares that the pile reaches past the spawn line
        for id in 1..=14 {
            world.spawn(id, ShapeKind::Square, Vec2::new(300.0, field.top));
            run(&mut world, 240);
        }

        // Two squares of half size h can't have centers closer than 2h
        let min_gap = 2.0 * ShapeKind::Square.half_extents().x - TOLERANCE;
        let bodies = world.bodies();
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                let distance = a.pos.distance(b.pos);
                assert!(
                    distance >= min_gap,
                    "{} at {:?} overlaps {} at {:?}",
                    a.id,
                    a.pos,
                    b.id,
                    b.pos
                );
            }
        }
    }

    #[test]
    fn test_body_past_the_edge_falls_out() {
        let field = Field::default();
        let mut world = StackPhysics::new(&field);
        let half = ShapeKind::Square.half_extents().x;
        world.spawn(1, ShapeKind::Square, Vec2::new(field.right + half + 5.0, field.top));
        run(&mut world, 120);

        let body = world.body(1).unwrap();
        assert!(!field.holds(body.pos.y));
    }

    #[test]
    fn test_frozen_body_stays_put() {
        let field = Field::default();
        let mut world = StackPhysics::new(&field);
        world.spawn(1, ShapeKind::Star, Vec2::new(300.0, field.top));
        run(&mut world, 20);
        world.freeze(1);
        let frozen = world.body(1).unwrap();
        assert!(frozen.is_static);

        run(&mut world, 120);
        let later = world.body(1).unwrap();
        assert_eq!(later.pos, frozen.pos);
        assert_eq!(later.angle, frozen.angle);
    }

    #[test]
    fn test_frozen_body_still_supports() {
        let field = Field::default();
        let mut world = StackPhysics::new(&field);
        world.spawn(1, ShapeKind::Rectangle, Vec2::new(400.0, field.top));
        run(&mut world, 240);
        world.freeze(1);
        world.spawn(2, ShapeKind::Sticky, Vec2::new(400.0, field.top));
        run(&mut world, 240);

        let base = world.body(1).unwrap();
        let sticky = world.body(2).unwrap();
        assert!(sticky.pos.y < base.pos.y);
        assert!(field.holds(sticky.pos.y));
    }

    #[test]
    fn test_removing_support_drops_upper_body() {
        let field = Field::default();
        let mut world = StackPhysics::new(&field);
        world.spawn(1, ShapeKind::Square, Vec2::new(300.0, field.top));
        run(&mut world, 240);
        world.spawn(2, ShapeKind::Square, Vec2::new(300.0, field.top));
        run(&mut world, 240);

        world.remove(1);
        run(&mut world, 240);
        let body = world.body(2).unwrap();
        assert!((body.pos.y + body.half.y - field.floor).abs() < TOLERANCE);
        assert_eq!(world.positions().len(), 1);
        assert!(world.body(1).is_none());
    }

    #[test]
    fn test_positions_in_spawn_order() {
        let field = Field::default();
        let mut world = StackPhysics::new(&field);
        for (id, kind) in [(3, ShapeKind::Circle), (1, ShapeKind::Triangle), (2, ShapeKind::Star)] {
            world.spawn(id, kind, Vec2::new(200.0 + id as f32 * 100.0, field.top));
        }
        let ids: Vec<_> = world.positions().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
