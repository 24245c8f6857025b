//! Round simulation module
//!
//! All gameplay rules live here. Nothing in this module touches the page:
//! - Seeded RNG only
//! - Time advances through explicit `tick()` calls
//! - Stable iteration order (spawn order / shape ID)

pub mod field;
pub mod physics;
pub mod round;
pub mod shape;

pub use field::Field;
pub use physics::{Body, PhysicsWorld, StackPhysics};
pub use round::{RoundConfig, RoundController, RoundEvent, RoundState};
pub use shape::{Shape, ShapeId, ShapeKind};
