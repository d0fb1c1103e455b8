//! Collision predicates for axis-aligned boxes and circles
//!
//! Everything here is stateless geometry. The landing test is the one that
//! shapes gameplay: it only accepts a falling player whose feet sit in a thin
//! band around the platform top, which is what turns platforms into
//! one-way trampolines.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tolerance above the platform top that still counts as a landing
pub const LANDING_TOLERANCE: f32 = 5.0;

/// Axis-aligned rectangle (top-left corner + size, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of size `w`×`h` centred on `center`
    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self {
            x: center.x - w / 2.0,
            y: center.y - h / 2.0,
            w,
            h,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap on the horizontal axis only
    #[inline]
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.x < other.right() && self.right() > other.x
    }
}

/// Circle (centre + radius)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub r: f32,
}

impl Circle {
    pub fn new(center: Vec2, r: f32) -> Self {
        Self { center, r }
    }
}

/// Strict AABB overlap (touching edges do not count)
#[inline]
pub fn aabb_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Circle vs circle overlap
#[inline]
pub fn circle_overlap(a: &Circle, b: &Circle) -> bool {
    a.center.distance(b.center) < a.r + b.r
}

/// Circle vs rectangle overlap (edges and corners inclusive)
pub fn circle_rect_overlap(circle: &Circle, rect: &Rect) -> bool {
    let half_w = rect.w / 2.0;
    let half_h = rect.h / 2.0;
    let dist_x = (circle.center.x - rect.x - half_w).abs();
    let dist_y = (circle.center.y - rect.y - half_h).abs();

    if dist_x > half_w + circle.r || dist_y > half_h + circle.r {
        return false;
    }
    if dist_x <= half_w || dist_y <= half_h {
        return true;
    }

    // Corner region
    let dx = dist_x - half_w;
    let dy = dist_y - half_h;
    dx * dx + dy * dy <= circle.r * circle.r
}

/// Landing test for a player falling onto a platform
///
/// All three must hold:
/// - the player centre is above the platform centre
/// - the boxes overlap horizontally
/// - the player is not rising and its feet are within
///   `[top - LANDING_TOLERANCE, top + platform height]`
pub fn is_landing(player: &Rect, player_vy: f32, platform: &Rect) -> bool {
    let is_above = player.center().y < platform.center().y;
    let is_overlapping = player.overlaps_x(platform);
    let feet = player.bottom();
    let is_landing = player_vy >= 0.0
        && feet >= platform.y - LANDING_TOLERANCE
        && feet <= platform.bottom();

    is_above && is_overlapping && is_landing
}
