//! Canvas2D surface for the browser build

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{Color, Surface};
use crate::sim::collision::Rect;

const FONT: &str = "16px monospace";

pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    /// Backing store pixels per world unit
    scale: f64,
}

impl CanvasSurface {
    /// Grab the 2D context of `canvas`. `None` if the browser refuses one.
    pub fn new(canvas: &HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        ctx.set_font(FONT);
        Some(Self { ctx, scale: 1.0 })
    }

    /// Map world units onto the canvas backing store
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    fn set_color(&self, color: Color) {
        let css = css_color(color);
        self.ctx.set_fill_style_str(&css);
    }
}

fn css_color([r, g, b, a]: Color) -> String {
    format!(
        "rgba({}, {}, {}, {:.3})",
        (r.clamp(0.0, 1.0) * 255.0).round() as u8,
        (g.clamp(0.0, 1.0) * 255.0).round() as u8,
        (b.clamp(0.0, 1.0) * 255.0).round() as u8,
        a.clamp(0.0, 1.0)
    )
}

impl Surface for CanvasSurface {
    fn clear(&mut self, color: Color) {
        let _ = self.ctx.set_transform(self.scale, 0.0, 0.0, self.scale, 0.0, 0.0);
        let canvas = self.ctx.canvas();
        let (w, h) = canvas
            .map(|c| (f64::from(c.width()), f64::from(c.height())))
            .unwrap_or((0.0, 0.0));
        self.set_color(color);
        self.ctx.fill_rect(0.0, 0.0, w / self.scale, h / self.scale);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.set_color(color);
        self.ctx.fill_rect(
            f64::from(rect.x),
            f64::from(rect.y),
            f64::from(rect.w),
            f64::from(rect.h),
        );
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        self.set_color(color);
        self.ctx.begin_path();
        if self
            .ctx
            .arc(
                f64::from(center.x),
                f64::from(center.y),
                f64::from(radius),
                0.0,
                std::f64::consts::TAU,
            )
            .is_ok()
        {
            self.ctx.fill();
        }
    }

    fn text(&mut self, pos: Vec2, text: &str, color: Color) {
        self.set_color(color);
        // Baseline sits one line below the anchor
        let _ = self
            .ctx
            .fill_text(text, f64::from(pos.x), f64::from(pos.y) + 14.0);
    }
}
