//! Dusk Arena entry point
//!
//! The browser build wires DOM input, the canvas surface and the network
//! transport into a [`Session`]. The native build runs a headless solo
//! match driven by a simple bot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{KeyboardEvent, MouseEvent, UrlSearchParams};

    use dusk_arena::audio::WebAudio;
    use dusk_arena::level::{OfflineProvider, generate_config};
    use dusk_arena::net::{NetError, NullTransport, Transport};
    use dusk_arena::platform::web::{CanvasSurface, DomPresentation, WebSocketTransport};
    use dusk_arena::platform::{Command, apply_key, command_for_key};
    use dusk_arena::renderer::RenderSurface;
    use dusk_arena::sim::{InputState, MapName};
    use dusk_arena::{Session, SessionPhase, Settings};

    const DEFAULT_IDEA: &str = "a quiet park at dusk";

    /// Room request waiting for the connection to settle
    enum RoomAction {
        Host(MapName),
        Join(String),
    }

    struct App {
        session: Session,
        input: InputState,
        surface: Option<CanvasSurface>,
        pending_room: Option<RoomAction>,
    }

    impl App {
        fn try_pending_room(&mut self) {
            let Some(action) = self.pending_room.take() else {
                return;
            };
            let result = match &action {
                RoomAction::Host(map) => self.session.host_room(*map).map(|code| {
                    log::info!("Hosting room {code}");
                }),
                RoomAction::Join(code) => self.session.join_room(code),
            };
            match result {
                Ok(()) => {}
                Err(NetError::NotConnected) => self.pending_room = Some(action),
                Err(e) => log::error!("Room request failed: {e}"),
            }
        }

        fn handle_command(&mut self, command: Command) {
            match command {
                Command::CycleSpectate => {
                    self.session.cycle_spectate();
                }
                Command::Restart => {
                    let hosting = self.session.room().is_some_and(|r| r.is_host);
                    if hosting && self.session.phase() == SessionPhase::Loading {
                        let theme = self
                            .session
                            .room_theme()
                            .unwrap_or(MapName::ErindalePark.display_name())
                            .to_string();
                        if let Err(e) = self.session.start_room_game(&theme) {
                            log::error!("Failed to start room game: {e}");
                        }
                    } else {
                        self.session.restart();
                    }
                }
                Command::Leaderboard => {
                    self.session.show_leaderboard();
                }
                Command::Menu => self.session.return_to_menu(),
            }
        }

        fn frame(&mut self, time: f64) {
            self.try_pending_room();
            if let Some(surface) = self.surface.as_ref() {
                surface.fit_to_client();
            }
            let surface = self.surface.as_mut().map(|s| s as &mut dyn RenderSurface);
            self.session.frame(time, &self.input, surface);
        }
    }

    fn query_param(params: &Option<UrlSearchParams>, key: &str) -> Option<String> {
        params.as_ref()?.get(key).filter(|v| !v.is_empty())
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
        }

        log::info!("Dusk Arena starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document available");
            return;
        };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let settings = Settings::load();
        let mut audio = WebAudio::new();
        audio.set_volumes(settings.master_volume, settings.sfx_volume, settings.muted);

        let surface = CanvasSurface::from_id(&document, "canvas");
        if surface.is_none() {
            log::warn!("Canvas not found - frames will not be drawn");
        }

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(
            settings,
            Box::new(DomPresentation::new(document.clone())),
            Box::new(audio),
            seed,
        );

        let app = Rc::new(RefCell::new(App {
            session,
            input: InputState::default(),
            surface,
            pending_room: None,
        }));

        let params = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .and_then(|search| UrlSearchParams::new_with_str(&search).ok());

        setup_input_handlers(&document, app.clone());

        match query_param(&params, "server") {
            Some(url) => {
                let transport: Box<dyn Transport> = match WebSocketTransport::connect(&url) {
                    Ok(t) => Box::new(t),
                    Err(e) => {
                        log::warn!("WebSocket unavailable ({e}), playing offline");
                        Box::new(NullTransport)
                    }
                };
                let action = match query_param(&params, "room") {
                    Some(code) => RoomAction::Join(code),
                    None => RoomAction::Host(
                        query_param(&params, "map")
                            .map(|m| MapName::from_theme(&m))
                            .unwrap_or(MapName::ErindalePark),
                    ),
                };
                let mut a = app.borrow_mut();
                a.session.connect(transport, js_sys::Date::now());
                a.pending_room = Some(action);
            }
            None => {
                let idea = query_param(&params, "idea").unwrap_or_else(|| DEFAULT_IDEA.to_string());
                app.borrow_mut().session.begin_loading();
                let config = generate_config(&OfflineProvider, &idea).await;
                app.borrow_mut().session.start_solo(config);
            }
        }

        request_animation_frame(app);
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Reschedules in every phase: the session polls the network from here
    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().frame(time);
        request_animation_frame(app);
    }

    fn setup_input_handlers(document: &web_sys::Document, app: Rc<RefCell<App>>) {
        // Key down
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                let mut a = app.borrow_mut();
                if apply_key(&mut a.input, &key, true) {
                    return;
                }
                if let Some(command) = command_for_key(&key) {
                    event.prevent_default();
                    if !event.repeat() {
                        a.handle_command(command);
                    }
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                apply_key(&mut app.borrow_mut().input, &event.key(), false);
            });
            let _ = document
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let Some(canvas) = document.get_element_by_id("canvas") else {
            return;
        };

        // Mouse move: aim is kept in canvas pixels
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                app.borrow_mut().input.mouse =
                    Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().input.mouse_down = true;
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up (document-wide so a release off-canvas still counts)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().input.mouse_down = false;
            });
            let _ = document
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use dusk_arena::audio::NullAudio;
    use dusk_arena::level::LevelConfig;
    use dusk_arena::session::Presentation;
    use dusk_arena::sim::{DeathCause, InputState, World};
    use dusk_arena::{Session, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const FRAMES: u32 = 60 * 60;
    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    /// Presentation that logs the interesting transitions
    #[derive(Default)]
    struct LogPresentation {
        kills: u32,
    }

    impl Presentation for LogPresentation {
        fn set_score(&mut self, score: u64) {
            log::debug!("score {score}");
        }

        fn set_health(&mut self, hp: i32) {
            log::debug!("health {hp}");
        }

        fn set_ammo(&mut self, _ammo: u32) {}

        fn on_game_over(&mut self, cause: Option<DeathCause>) {
            log::info!(
                "Bot died ({}) after {} kills",
                cause.map_or("unknown", |c| c.as_str()),
                self.kills
            );
        }

        fn on_kill(&mut self) {
            self.kills += 1;
        }

        fn on_round_end(&mut self) {}

        fn on_player_update(&mut self, _pos: Vec2) {}
    }

    /// Aim at the nearest enemy and strafe around the spawn point
    fn bot_input(world: &World, frame: u32) -> InputState {
        let me = world.player.body.pos;
        let nearest = world
            .enemies
            .iter()
            .min_by(|a, b| {
                a.body
                    .pos
                    .distance_squared(me)
                    .total_cmp(&b.body.pos.distance_squared(me))
            })
            .map(|e| e.body.pos);

        let phase = (frame / 90) % 4;
        InputState {
            up: phase == 0,
            right: phase == 1,
            down: phase == 2,
            left: phase == 3,
            mouse: VIEWPORT * 0.5 + nearest.map_or(Vec2::X * 100.0, |p| p - me),
            mouse_down: nearest.is_some(),
            reload: false,
        }
    }

    pub fn run() {
        let settings = Settings::load();
        let theme = std::env::args()
            .nth(1)
            .unwrap_or_else(|| LevelConfig::default().theme_name);
        let config = LevelConfig {
            theme_name: theme,
            ..LevelConfig::default()
        };

        let seed = std::env::var("DUSK_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);
        let mut session = Session::new(
            settings,
            Box::new(LogPresentation::default()),
            Box::new(NullAudio),
            seed,
        );
        session.set_viewport(VIEWPORT);
        session.start_solo(config);

        let mut frames = 0;
        for frame in 0..FRAMES {
            let Some(world) = session.world() else { break };
            let input = bot_input(world, frame);
            session.frame(frame as f64 * FRAME_MS, &input, None);
            frames = frame + 1;
            if !session.phase().is_simulating() {
                break;
            }
        }

        if let Some(world) = session.world() {
            println!(
                "{} on {}: {} frames, score {}, kills {}, hp {}",
                world.player.name,
                world.map.display_name(),
                frames,
                world.score,
                world.kills,
                world.player.hp.max(0)
            );
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Dusk Arena (native) starting headless bot match...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
