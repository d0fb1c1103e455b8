//! Property checks for the arena level

use glam::Vec2;
use proptest::prelude::*;

use climb_defender::defender::{Level, LevelInput, LevelPhase, MagicSystem};

fn level_input() -> impl Strategy<Value = LevelInput> {
    (
        any::<[bool; 5]>(),
        prop::bool::weighted(0.2),
        (0.0f32..1024.0, 0.0f32..600.0),
        prop::bool::weighted(0.05),
        prop::bool::weighted(0.05),
    )
        .prop_map(|([up, left, down, right, jump], cast, (mx, my), toggle, cycle)| LevelInput {
            up,
            left,
            down,
            right,
            jump,
            cast_pressed: cast,
            mouse: Vec2::new(mx, my),
            toggle_mode: toggle,
            cycle_power: cycle,
        })
}

proptest! {
    #[test]
    fn random_play_keeps_level_sane(
        seed in any::<u64>(),
        frames in prop::collection::vec((level_input(), 0.0f32..0.05), 1..300),
    ) {
        let mut level = Level::new(1024.0, 600.0, seed);
        let mut defeated = 0;

        for (input, dt) in frames {
            level.update(dt, &input);

            let hero = &level.hero;
            prop_assert!(hero.pos.is_finite());
            prop_assert!(hero.health >= 0.0 && hero.health <= hero.max_health);
            prop_assert!(hero.magic.mana >= 0.0 && hero.magic.mana <= hero.magic.max_mana);
            prop_assert!(level.enemies.alive_count() <= level.enemies.max_enemies);
            for virus in level.enemies.alive() {
                prop_assert!(virus.health > 0.0);
            }

            prop_assert!(level.defeated >= defeated);
            defeated = level.defeated;

            if level.phase != LevelPhase::Playing {
                break;
            }
        }
    }

    #[test]
    fn mana_stays_in_range(casts in prop::collection::vec((any::<bool>(), 0.0f32..0.5), 1..100)) {
        let mut magic = MagicSystem::new();
        let mut now = 0.0;
        for (cast, dt) in casts {
            now += f64::from(dt) * 1000.0;
            if cast {
                magic.cast_spell(Vec2::ZERO, Vec2::X, now);
            }
            magic.update(dt, 1024.0, 600.0);
            prop_assert!(magic.mana >= 0.0 && magic.mana <= magic.max_mana);
            prop_assert!((0.0..=100.0).contains(&magic.mana_percent()));
        }
    }
}
