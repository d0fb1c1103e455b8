//! Climb Defender entry point
//!
//! The browser build wires DOM events into the two game cores and drives them
//! from `requestAnimationFrame`. The native build runs both lines headless on
//! an autopilot and logs how they went.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use climb_defender::Settings;
    use climb_defender::audio::{AudioSink, WebAudio, play_game_events, play_level_events};
    use climb_defender::defender::level::DEFAULT_WIDTH;
    use climb_defender::defender::{Level, LevelPhase};
    use climb_defender::platform::{FrameClock, InputState, LocalStore};
    use climb_defender::renderer::{CanvasSurface, draw_climber, draw_level};
    use climb_defender::sim::{GamePhase, GameState, reset, tick};

    /// Which game is on screen
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Line {
        Climber,
        Defender,
    }

    /// Game instance holding all state
    struct Game {
        line: Line,
        climber: GameState,
        level: Level,
        settings: Settings,
        input: InputState,
        clock: FrameClock,
        audio: WebAudio,
        surface: CanvasSurface,
        canvas: HtmlCanvasElement,
    }

    impl Game {
        fn new(seed: u64, canvas: HtmlCanvasElement, surface: CanvasSurface) -> Self {
            let settings = Settings::load(&LocalStore);
            let seed = settings.seed.unwrap_or(seed);

            let mut climber =
                GameState::new(settings.width, settings.height, seed, Box::new(LocalStore));
            climber.particle_cap = settings.max_particles();

            let level = Level::new(DEFAULT_WIDTH, settings.height, seed.wrapping_add(1));
            let audio = WebAudio::new(settings.effective_volume());

            let mut game = Self {
                line: Line::Climber,
                climber,
                level,
                settings,
                input: InputState::new(),
                clock: FrameClock::new(),
                audio,
                surface,
                canvas,
            };
            game.fit_canvas();
            game
        }

        fn world_size(&self) -> (f32, f32) {
            match self.line {
                Line::Climber => (self.climber.width, self.climber.safe_height()),
                Line::Defender => (self.level.width, self.level.height),
            }
        }

        /// Size the backing store to the active world at device resolution
        fn fit_canvas(&mut self) {
            let (w, h) = self.world_size();
            let dpr = web_sys::window()
                .map(|w| w.device_pixel_ratio())
                .unwrap_or(1.0);
            self.canvas.set_width((f64::from(w) * dpr) as u32);
            self.canvas.set_height((f64::from(h) * dpr) as u32);
            self.surface.set_scale(dpr);
        }

        /// CSS pixels to world units
        fn to_world(&self, x: f32, y: f32) -> glam::Vec2 {
            let (w, h) = self.world_size();
            let cw = self.canvas.client_width().max(1) as f32;
            let ch = self.canvas.client_height().max(1) as f32;
            glam::Vec2::new(x * w / cw, y * h / ch)
        }

        fn switch_line(&mut self, line: Line) {
            if self.line == line {
                return;
            }
            // Leaving a line pauses it
            match self.line {
                Line::Climber if self.climber.phase == GamePhase::Playing => {
                    self.climber.set_state(GamePhase::Paused)
                }
                Line::Defender => self.level.pause(),
                _ => {}
            }
            self.line = line;
            self.input.release_all();
            self.clock.resync();
            self.fit_canvas();
            log::info!("Switched to {:?}", line);
        }

        /// Start or restart whichever line is showing
        fn start(&mut self) {
            match self.line {
                Line::Climber => {
                    if matches!(self.climber.phase, GamePhase::Menu | GamePhase::GameOver) {
                        self.climber.wall_clock_ms = js_sys::Date::now();
                        reset(&mut self.climber);
                    }
                }
                Line::Defender => {
                    if matches!(self.level.phase, LevelPhase::Complete | LevelPhase::GameOver) {
                        self.level.restart();
                    }
                }
            }
        }

        fn toggle_mute(&mut self) {
            self.settings.toggle_mute();
            self.audio.set_volume(self.settings.effective_volume());
            let mut store = LocalStore;
            self.settings.save(&mut store);
        }

        fn auto_pause(&mut self) {
            match self.line {
                Line::Climber if self.climber.phase == GamePhase::Playing => {
                    self.input.request_pause();
                    log::info!("Auto-paused");
                }
                Line::Defender if self.level.phase == LevelPhase::Playing => {
                    self.level.pause();
                    log::info!("Auto-paused");
                }
                _ => {}
            }
            self.input.release_all();
            self.clock.resync();
        }

        fn frame(&mut self, time: f64) {
            let dt = self.clock.advance(time);
            match self.line {
                Line::Climber => {
                    self.climber.wall_clock_ms = js_sys::Date::now();
                    let input = self.input.tick_input();
                    tick(&mut self.climber, &input, dt);
                    let events = self.climber.drain_events();
                    play_game_events(&mut self.audio, &events);
                    draw_climber(&self.climber, &mut self.surface, self.settings.show_debug);
                }
                Line::Defender => {
                    if self.input.take_pause() {
                        match self.level.phase {
                            LevelPhase::Playing => self.level.pause(),
                            LevelPhase::Paused => self.level.resume(),
                            _ => {}
                        }
                    }
                    let input = self.input.level_input();
                    self.level.update(dt, &input);
                    let events = self.level.drain_events();
                    play_level_events(&mut self.audio, &events);
                    draw_level(&self.level, &mut self.surface, self.clock.now_ms());
                }
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Climb Defender starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document; nothing to run in");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };
        let Some(surface) = CanvasSurface::new(&canvas) else {
            log::error!("Canvas2D unavailable");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, canvas.clone(), surface)));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Climb Defender running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                match key.as_str() {
                    "1" => g.switch_line(Line::Climber),
                    "2" => g.switch_line(Line::Defender),
                    "m" | "M" => g.toggle_mute(),
                    "Enter" => g.start(),
                    " " if g.line == Line::Climber => g.start(),
                    "r" | "R" if g.line == Line::Defender => g.start(),
                    _ => {}
                }
                if g.input.key_down(&key) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input.key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let pos = g.to_world(event.offset_x() as f32, event.offset_y() as f32);
                g.input.mouse_move(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down - also unlocks audio, which needs a user gesture
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                let pos = g.to_world(event.offset_x() as f32, event.offset_y() as f32);
                g.input.mouse_move(pos);
                g.input.mouse_button(true);
                if g.line == Line::Climber && g.climber.phase == GamePhase::Menu {
                    g.start();
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.mouse_button(false);
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().auto_pause();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().auto_pause();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Climb Defender (native) starting...");
    log::info!("Native mode runs both games headless - run with `trunk serve` to play");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);

    headless::climb(seed);
    headless::defend(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use climb_defender::audio::{NullAudio, play_game_events, play_level_events};
    use climb_defender::defender::{Level, LevelInput, LevelPhase};
    use climb_defender::platform::{FrameClock, MemoryStore};
    use climb_defender::renderer::{CommandList, draw_climber, draw_level};
    use climb_defender::sim::{EntityRef, GamePhase, GameState, TickInput, reset, tick};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const CLIMB_FRAMES: usize = 60 * 120;
    const DEFEND_FRAMES: usize = 60 * 200;

    /// Steer toward the nearest platform above the player
    fn climb_input(state: &GameState) -> TickInput {
        let player = state.player.pos;
        let target = state
            .entities()
            .filter_map(|e| match e {
                EntityRef::Platform(p) if p.active && p.pos.y < player.y => Some(p.pos),
                _ => None,
            })
            .min_by(|a, b| a.distance_squared(player).total_cmp(&b.distance_squared(player)));

        match target {
            Some(t) if t.x < player.x - 8.0 => TickInput {
                left: true,
                ..Default::default()
            },
            Some(t) if t.x > player.x + 8.0 => TickInput {
                right: true,
                ..Default::default()
            },
            _ => TickInput::default(),
        }
    }

    pub fn climb(seed: u64) {
        let mut state = GameState::new(400.0, 600.0, seed, Box::new(MemoryStore::new()));
        let mut clock = FrameClock::new();
        let mut audio = NullAudio::default();
        reset(&mut state);

        let mut time = 0.0;
        for frame in 0..CLIMB_FRAMES {
            time += FRAME_MS;
            state.wall_clock_ms = time;
            let dt = clock.advance(time);
            let input = climb_input(&state);
            tick(&mut state, &input, dt);
            play_game_events(&mut audio, &state.drain_events());

            if frame % 600 == 0 {
                log::info!(
                    "climb t={:.0}s score={:.0} tier={} camera={:.0}",
                    time / 1000.0,
                    state.score,
                    state.tier,
                    state.camera_y
                );
            }
            if state.phase == GamePhase::GameOver {
                break;
            }
        }

        let mut list = CommandList::new();
        draw_climber(&state, &mut list, true);
        log::info!(
            "Climb finished: phase={:?} score={:.0} best={:.0} sounds={} draw calls={}",
            state.phase,
            state.score,
            state.best_score,
            audio.played.len(),
            list.len()
        );
    }

    /// Walk toward the closest virus and fire at it
    fn defend_input(level: &Level, frame: usize) -> LevelInput {
        let hero = level.hero.center();
        let Some(target) = level
            .enemies
            .alive()
            .map(|v| v.pos)
            .min_by(|a, b| a.distance_squared(hero).total_cmp(&b.distance_squared(hero)))
        else {
            return LevelInput::default();
        };

        let dx = target.x - hero.x;
        LevelInput {
            left: dx < -200.0,
            right: dx > 200.0,
            jump: target.y < hero.y - 80.0 && frame % 90 == 0,
            cast_pressed: frame % 20 == 0,
            mouse: target,
            // Alternate into power mode now and then
            toggle_mode: frame % 600 == 300,
            cycle_power: frame % 1200 == 0,
            ..Default::default()
        }
    }

    pub fn defend(seed: u64) {
        let mut level = Level::new(1024.0, 600.0, seed);
        let mut clock = FrameClock::new();
        let mut audio = NullAudio::default();

        let mut time = 0.0;
        for frame in 0..DEFEND_FRAMES {
            time += FRAME_MS;
            let dt = clock.advance(time);
            let input = defend_input(&level, frame);
            level.update(dt, &input);
            play_level_events(&mut audio, &level.drain_events());

            if frame % 600 == 0 {
                log::info!(
                    "defend t={:.0}s hp={:.0} mana={:.0} defeated={}/{} alive={}",
                    level.elapsed_ms() / 1000.0,
                    level.hero.health,
                    level.hero.magic.mana,
                    level.defeated,
                    level.enemies_to_win,
                    level.enemies.alive_count()
                );
            }
            if level.phase != LevelPhase::Playing {
                break;
            }
        }

        let mut list = CommandList::new();
        draw_level(&level, &mut list, clock.now_ms());
        log::info!(
            "Defense finished: phase={:?} score={} defeated={} hero at {} sounds={} draw calls={}",
            level.phase,
            level.score,
            level.defeated,
            level.hero.pos.round(),
            audio.played.len(),
            list.len()
        );
    }
}
