//! 2D canvas rendering
//!
//! Draws the box, the drop guide and every body straight from the physics world.

pub mod shapes;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
pub use shapes::{Outline, css_color, outline, outline_at};
