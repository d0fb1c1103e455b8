//! Rendering surface
//!
//! The game cores never draw directly. Hosts implement [`Surface`] (a Canvas2D
//! context on the web) and the `draw_*` functions in [`scene`] turn game state
//! into flat draw calls. [`CommandList`] records calls for tests and for the
//! headless binary.

pub mod scene;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

use glam::Vec2;

use crate::sim::collision::Rect;

pub use scene::{draw_climber, draw_level};

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;

/// Linear RGBA, 0..1 per channel
pub type Color = [f32; 4];

/// Unpack 0xRRGGBB with an alpha
pub fn rgb(hex: u32, alpha: f32) -> Color {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        alpha.clamp(0.0, 1.0),
    ]
}

/// Something that accepts 2D draw calls in screen space
pub trait Surface {
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn text(&mut self, pos: Vec2, text: &str, color: Color);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Rect(Rect, Color),
    Circle(Vec2, f32, Color),
    Text(Vec2, String, Color),
}

/// Surface that records every call
#[derive(Debug, Default)]
pub struct CommandList {
    pub commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text(_, s, _) => Some(s.as_str()),
            _ => None,
        })
    }
}

impl Surface for CommandList {
    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Rect(rect, color));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle(center, radius, color));
    }

    fn text(&mut self, pos: Vec2, text: &str, color: Color) {
        self.commands
            .push(DrawCommand::Text(pos, text.to_string(), color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_unpacks() {
        assert_eq!(rgb(0xff0000, 1.0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rgb(0x00ff00, 2.0)[3], 1.0);
        assert_eq!(rgb(0x0000ff, 0.5)[2], 1.0);
    }

    #[test]
    fn test_clear_resets_list() {
        let mut list = CommandList::new();
        list.fill_circle(Vec2::ZERO, 2.0, rgb(0xffffff, 1.0));
        list.clear(rgb(0, 1.0));
        assert_eq!(list.len(), 1);
        list.text(Vec2::ZERO, "hi", rgb(0xffffff, 1.0));
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["hi"]);
    }
}
