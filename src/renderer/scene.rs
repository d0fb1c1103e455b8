//! Game state to draw calls

use glam::Vec2;

use super::{Color, Surface, rgb};
use crate::defender::{AiState, Level, LevelPhase, Pose};
use crate::sim::collision::Rect;
use crate::sim::entities::{Collidable, EnemyKind, EntityRef, Platform, PlatformKind};
use crate::sim::{GamePhase, GameState};

const BACKGROUND: u32 = 0x10141f;
const TEXT: u32 = 0xf5f5f5;
const HUD_MARGIN: f32 = 8.0;
const HUD_LINE: f32 = 18.0;

fn platform_color(platform: &Platform) -> Color {
    let hex = match platform.kind {
        PlatformKind::Stationary => 0x6b8e23,
        PlatformKind::Horizontal => 0x4a90d9,
        PlatformKind::Vertical => 0x9b59b6,
        PlatformKind::Explosive => 0xe74c3c,
    };
    // Armed explosives flash faster as they run down
    let dim = platform.time_left().is_some()
        && (platform.blink_timer * platform.blink_speed()).fract() >= 0.5;
    rgb(hex, if dim { 0.35 } else { 1.0 })
}

fn offset(rect: Rect, camera_y: f32) -> Rect {
    Rect::new(rect.x, rect.y - camera_y, rect.w, rect.h)
}

/// Draw the climber world relative to its camera, then the HUD
pub fn draw_climber(state: &GameState, surface: &mut dyn Surface, show_debug: bool) {
    surface.clear(rgb(BACKGROUND, 1.0));
    let camera_y = state.safe_camera_y();

    // Player last so it stays on top
    let mut player = None;
    for entity in state.entities() {
        let bounds = offset(entity.bounds(), camera_y);
        match entity {
            EntityRef::Player(p) => player = Some((p, bounds)),
            EntityRef::Platform(p) => surface.fill_rect(bounds, platform_color(p)),
            EntityRef::Enemy(e) => {
                let hex = match e.kind {
                    EnemyKind::Touch => 0xe67e22,
                    EnemyKind::Shooter => 0xc0392b,
                };
                surface.fill_rect(bounds, rgb(hex, 1.0));
            }
            EntityRef::Bullet(b) => surface.fill_circle(
                Vec2::new(b.pos.x, b.pos.y - camera_y),
                b.r,
                rgb(0xffffff, b.alpha()),
            ),
            EntityRef::Particle(p) => surface.fill_circle(
                Vec2::new(p.pos.x, p.pos.y - camera_y),
                p.size / 2.0,
                rgb(p.color, p.alpha()),
            ),
        }
    }
    if let Some((p, bounds)) = player {
        let alpha = if p.is_blinking() { 0.3 } else { 1.0 };
        surface.fill_rect(bounds, rgb(0xf1c40f, alpha));
    }

    let text = rgb(TEXT, 1.0);
    let line = |n: f32| Vec2::new(HUD_MARGIN, HUD_MARGIN + HUD_LINE * n);
    surface.text(line(0.0), &format!("Score {}", state.score.floor()), text);
    surface.text(line(1.0), &format!("Tier {}", state.tier), text);
    surface.text(line(2.0), &format!("Best {}", state.best_score.floor()), text);

    if show_debug {
        let c = state.entity_counts();
        surface.text(
            line(3.0),
            &format!(
                "P{} E{} B{} FX{}",
                c.platforms, c.enemies, c.bullets, c.particles
            ),
            rgb(TEXT, 0.6),
        );
    }

    let center = Vec2::new(state.width / 2.0, state.safe_height() / 2.0);
    match state.phase {
        GamePhase::Menu => surface.text(center, "Press Space to climb", text),
        GamePhase::Paused => surface.text(center, "Paused", text),
        GamePhase::GameOver => surface.text(center, "Game Over", text),
        GamePhase::Playing => {}
    }
}

/// Draw the arena level and its HUD
pub fn draw_level(level: &Level, surface: &mut dyn Surface, now_ms: f64) {
    surface.clear(rgb(BACKGROUND, 1.0));

    surface.fill_rect(
        Rect::new(0.0, level.ground_y, level.width, level.height - level.ground_y),
        rgb(0x1e5631, 1.0),
    );
    for platform in &level.platforms {
        surface.fill_rect(*platform, rgb(0x2e7d32, 1.0));
    }

    for virus in level.enemies.enemies() {
        let hex = match virus.state {
            AiState::Patrol => 0x8e44ad,
            AiState::Chase => 0xd35400,
            AiState::Attack => 0xc0392b,
            AiState::Dead => continue,
        };
        let bounds = virus.bounds();
        surface.fill_rect(bounds, rgb(hex, 1.0));
        // Health bar
        let bar = Rect::new(bounds.x, bounds.y - 6.0, bounds.w * virus.health_fraction(), 3.0);
        surface.fill_rect(bar, rgb(0x2ecc71, 1.0));
    }

    for spell in &level.hero.magic.spells {
        surface.fill_circle(spell.pos, 6.0, rgb(0x00e5ff, 1.0));
    }

    let hero = &level.hero;
    let hero_alpha = if hero.is_invulnerable() && (now_ms / 100.0) as i64 % 2 == 1 {
        0.4
    } else {
        1.0
    };
    let hero_hex = match hero.pose {
        Pose::Cast => 0x00bcd4,
        Pose::Victory => 0xffd700,
        _ => 0x3f51b5,
    };
    surface.fill_rect(hero.bounds(), rgb(hero_hex, hero_alpha));

    let text = rgb(TEXT, 1.0);
    let line = |n: f32| Vec2::new(HUD_MARGIN, HUD_MARGIN + HUD_LINE * n);
    surface.text(line(0.0), &format!("HP {:.0}", hero.health), text);
    surface.text(
        line(1.0),
        &format!("Mana {:.0}%", hero.magic.mana_percent()),
        text,
    );
    surface.text(
        line(2.0),
        &format!("{:?} / {}", hero.magic.mode, hero.magic.current_power().name),
        text,
    );
    surface.text(
        line(3.0),
        &format!(
            "Defeated {}/{}  Time {:.0}s",
            level.defeated,
            level.enemies_to_win,
            level.remaining_time_ms() / 1000.0
        ),
        text,
    );

    let center = Vec2::new(level.width / 2.0, level.height / 2.0);
    match level.phase {
        LevelPhase::Paused => surface.text(center, "Paused", text),
        LevelPhase::Complete => surface.text(center, "Motherboard secured!", text),
        LevelPhase::GameOver => surface.text(center, "Game Over", text),
        LevelPhase::Playing => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;
    use crate::renderer::{CommandList, DrawCommand};
    use crate::sim::reset;

    #[test]
    fn test_climber_frame_draws_every_entity() {
        let mut state = GameState::new(400.0, 600.0, 5, Box::new(MemoryStore::new()));
        reset(&mut state);
        let mut list = CommandList::new();
        draw_climber(&state, &mut list, true);

        assert!(matches!(list.commands[0], DrawCommand::Clear(_)));
        let shapes = list
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect(..) | DrawCommand::Circle(..)))
            .count();
        assert_eq!(shapes, state.entities().count());
        assert!(list.texts().any(|t| t == "Score 100"));
        assert!(list.texts().any(|t| t.starts_with('P')));
    }

    #[test]
    fn test_menu_prompt() {
        let state = GameState::new(400.0, 600.0, 5, Box::new(MemoryStore::new()));
        let mut list = CommandList::new();
        draw_climber(&state, &mut list, false);
        assert!(list.texts().any(|t| t == "Press Space to climb"));
    }

    #[test]
    fn test_level_frame() {
        let level = Level::new(1024.0, 600.0, 2);
        let mut list = CommandList::new();
        draw_level(&level, &mut list, 0.0);

        // Ground, 5 platforms, 3 viruses with health bars, hero
        let rects = list
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect(..)))
            .count();
        assert_eq!(rects, 1 + 5 + 3 * 2 + 1);
        assert!(list.texts().any(|t| t == "Basic / Reduce"));
    }
}
