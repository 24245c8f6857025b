//! Canvas 2D renderer (WASM only)

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::shapes::{Outline, css_color, outline, outline_at};
use crate::hud::HudView;
use crate::sim::{Field, RoundController, StackPhysics};

const BACKGROUND: &str = "#87ceeb";
const BOX_FILL: &str = "#f0f0f0";
const DROP_LINE: &str = "#ff0000";
const BORDER: &str = "#ffffff";
const DASH: f64 = 10.0;
const GAP: f64 = 5.0;

pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasRenderer {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            ctx,
            width: canvas.width() as f64,
            height: canvas.height() as f64,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width as f64;
        self.height = height as f64;
    }

    pub fn render(
        &self,
        round: &RoundController,
        physics: &StackPhysics,
        hud: &HudView,
    ) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let field = round.field();

        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, self.width, self.height);

        self.draw_box(field);

        for body in physics.bodies() {
            ctx.set_global_alpha(if body.is_static { 0.85 } else { 1.0 });
            self.draw_outline(
                &outline_at(body.kind, body.pos, body.half, body.angle),
                &css_color(body.kind.color()),
            )?;
        }
        ctx.set_global_alpha(1.0);

        // Next shape preview above the box, right side
        let next = round.next_kind();
        let preview = Vec2::new(field.right - 20.0, (field.drop_line + field.top) / 2.0);
        ctx.set_fill_style_str(BORDER);
        ctx.set_font("16px Arial");
        ctx.fill_text("Next:", (field.right - 100.0) as f64, preview.y as f64 + 5.0)?;
        self.draw_outline(
            &outline(next, preview, next.half_extents() * 0.5),
            &css_color(next.color()),
        )?;

        self.draw_hud(field, hud)
    }

    fn draw_hud(&self, field: &Field, hud: &HudView) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let center_x = self.width / 2.0;
        let below = field.floor as f64 + 26.0;

        ctx.set_text_align("center");
        ctx.set_font("18px Arial");
        ctx.set_fill_style_str(BORDER);
        ctx.fill_text(&hud.timer, field.left as f64 + 60.0, below)?;
        ctx.fill_text(&hud.shapes, field.right as f64 - 80.0, below)?;

        if hud.show_instructions {
            ctx.set_fill_style_str("#000000");
            ctx.fill_text("Tap above the box to drop shapes!", center_x, field.top as f64 + 24.0)?;
        }

        if let Some(lock_in) = &hud.lock_in {
            ctx.set_font("24px Arial");
            ctx.set_fill_style_str(DROP_LINE);
            ctx.fill_text(lock_in, center_x, 24.0)?;
        }

        ctx.set_text_align("start");
        Ok(())
    }

    fn draw_box(&self, field: &Field) {
        let ctx = &self.ctx;
        let (left, right) = (field.left as f64, field.right as f64);
        let (top, floor) = (field.top as f64, field.floor as f64);

        ctx.set_fill_style_str(BOX_FILL);
        ctx.fill_rect(left, top, right - left, floor - top);

        // Red dashed drop guide
        ctx.set_stroke_style_str(DROP_LINE);
        ctx.set_line_width(4.0);
        ctx.begin_path();
        let y = field.drop_line as f64;
        let mut x = left;
        while x < right {
            ctx.move_to(x, y);
            ctx.line_to((x + DASH).min(right), y);
            x += DASH + GAP;
        }
        ctx.stroke();

        ctx.set_stroke_style_str(BORDER);
        ctx.stroke_rect(left, top, right - left, floor - top);
    }

    fn draw_outline(&self, shape: &Outline, color: &str) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.set_fill_style_str(color);
        ctx.begin_path();
        match shape {
            Outline::Circle { center, radius } => {
                ctx.arc(
                    center.x as f64,
                    center.y as f64,
                    *radius as f64,
                    0.0,
                    std::f64::consts::TAU,
                )?;
            }
            Outline::Polygon(points) => {
                let Some((first, rest)) = points.split_first() else {
                    return Ok(());
                };
                ctx.move_to(first.x as f64, first.y as f64);
                for p in rest {
                    ctx.line_to(p.x as f64, p.y as f64);
                }
                ctx.close_path();
            }
        }
        ctx.fill();
        Ok(())
    }
}
