//! Property checks for the climber simulation

use proptest::prelude::*;

use climb_defender::platform::MemoryStore;
use climb_defender::sim::{
    GamePhase, GameState, Platform, Pool, SlotId, TickInput, reset, tick, tier_for_score,
};

#[derive(Debug, Clone)]
enum PoolOp {
    Acquire,
    Release(u32),
    ReleaseAll,
}

fn pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        4 => Just(PoolOp::Acquire),
        4 => (0u32..24).prop_map(PoolOp::Release),
        1 => Just(PoolOp::ReleaseAll),
    ]
}

fn frame_input() -> impl Strategy<Value = (bool, bool, bool, f32)> {
    (any::<bool>(), any::<bool>(), prop::bool::weighted(0.02), 0.0f32..0.05)
}

proptest! {
    #[test]
    fn pool_counts_always_add_up(ops in prop::collection::vec(pool_op(), 0..200)) {
        let mut pool: Pool<Platform> = Pool::new(8);
        for op in ops {
            match op {
                PoolOp::Acquire => {
                    let (id, platform) = pool.acquire();
                    prop_assert!(platform.active);
                    prop_assert!(pool.is_in_use(id));
                }
                PoolOp::Release(i) => {
                    let was_in_use = pool.is_in_use(SlotId(i));
                    prop_assert_eq!(pool.release(SlotId(i)), was_in_use);
                    prop_assert!(pool.get(SlotId(i)).is_none());
                }
                PoolOp::ReleaseAll => pool.release_all(),
            }
            prop_assert_eq!(pool.active_count() + pool.available_count(), pool.capacity());
        }
    }

    #[test]
    fn tier_never_drops_as_score_rises(a in -100.0f32..100_000.0, b in -100.0f32..100_000.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(tier_for_score(lo) <= tier_for_score(hi));
    }

    #[test]
    fn random_play_keeps_state_sane(
        seed in any::<u64>(),
        frames in prop::collection::vec(frame_input(), 1..400),
    ) {
        let mut state = GameState::new(400.0, 600.0, seed, Box::new(MemoryStore::new()));
        reset(&mut state);
        let mut best = state.best_score;

        for (left, right, pause, dt) in frames {
            tick(&mut state, &TickInput { left, right, pause }, dt);

            prop_assert!(state.camera_y.is_finite());
            prop_assert!(state.player.pos.is_finite());
            prop_assert!(state.score >= 0.0);
            prop_assert!(state.best_score >= best);
            best = state.best_score;

            prop_assert_eq!(state.active_platforms.len(), state.platforms.active_count());
            prop_assert_eq!(state.active_enemies.len(), state.enemies.active_count());
            prop_assert_eq!(state.active_bullets.len(), state.bullets.active_count());
            prop_assert!(state.active_particles.len() <= state.particle_cap);

            if state.phase == GamePhase::GameOver {
                prop_assert!(state.best_score >= state.score);
                break;
            }
        }
    }
}
