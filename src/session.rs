//! Session controller
//!
//! Owns the match lifecycle and bridges the simulation to the outside world:
//! frame events go to the presentation and audio sinks, the local position
//! goes to the network peer, and network snapshots come back into the world
//! at the top of the next frame.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::audio::AudioNotifier;
use crate::leaderboard::Leaderboard;
use crate::level::LevelConfig;
use crate::net::{ConnectionMode, NetError, NetEvent, NetworkPeer, PlayerUpdate, Transport};
use crate::renderer::{RenderSurface, View, render_frame};
use crate::settings::Settings;
use crate::sim::{DeathCause, GameEvent, InputState, MapName, StepContext, World, step};

/// Room codes avoid characters that read alike (0/O, 1/I)
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ROOM_CODE_LEN: usize = 4;

/// Generate a short, human-friendly room code
pub fn generate_room_code(rng: &mut impl Rng) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// High-level session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Menu,
    /// Waiting on level config or the room host
    Loading,
    Playing,
    /// Local player down, following a remote player
    Spectating,
    GameOver,
    Leaderboard,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Menu => "Menu",
            SessionPhase::Loading => "Loading",
            SessionPhase::Playing => "Playing",
            SessionPhase::Spectating => "Spectating",
            SessionPhase::GameOver => "GameOver",
            SessionPhase::Leaderboard => "Leaderboard",
        }
    }

    /// Phases that advance the simulation
    pub fn is_simulating(&self) -> bool {
        matches!(self, SessionPhase::Playing | SessionPhase::Spectating)
    }
}

/// HUD and overlay callbacks, invoked synchronously during a frame
pub trait Presentation {
    fn set_score(&mut self, score: u64);
    fn set_health(&mut self, hp: i32);
    fn set_ammo(&mut self, ammo: u32);
    fn on_game_over(&mut self, cause: Option<DeathCause>);
    fn on_kill(&mut self);
    fn on_round_end(&mut self);
    fn on_player_update(&mut self, pos: Vec2);
}

/// Presentation that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresentation;

impl Presentation for NullPresentation {
    fn set_score(&mut self, _score: u64) {}
    fn set_health(&mut self, _hp: i32) {}
    fn set_ammo(&mut self, _ammo: u32) {}
    fn on_game_over(&mut self, _cause: Option<DeathCause>) {}
    fn on_kill(&mut self) {}
    fn on_round_end(&mut self) {}
    fn on_player_update(&mut self, _pos: Vec2) {}
}

/// Joined room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: String,
    pub is_host: bool,
}

/// Inputs needed to rebuild the current match
#[derive(Debug, Clone)]
struct MatchSetup {
    map: MapName,
    config: LevelConfig,
    multiplayer: bool,
}

/// Match lifecycle controller
pub struct Session {
    phase: SessionPhase,
    settings: Settings,
    rng: Pcg32,
    world: Option<World>,
    setup: Option<MatchSetup>,
    presentation: Box<dyn Presentation>,
    audio: Box<dyn AudioNotifier>,
    net: Option<NetworkPeer<Box<dyn Transport>>>,
    room: Option<RoomInfo>,
    /// Theme announced by the room before the match starts
    room_theme: Option<String>,
    spectating: Option<String>,
    leaderboard: Option<Leaderboard>,
    viewport: Vec2,
}

impl Session {
    pub fn new(
        settings: Settings,
        presentation: Box<dyn Presentation>,
        audio: Box<dyn AudioNotifier>,
        seed: u64,
    ) -> Self {
        Self {
            phase: SessionPhase::Menu,
            settings,
            rng: Pcg32::seed_from_u64(seed),
            world: None,
            setup: None,
            presentation,
            audio,
            net: None,
            room: None,
            room_theme: None,
            spectating: None,
            leaderboard: None,
            viewport: Vec2::new(800.0, 600.0),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.world.as_mut()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn room(&self) -> Option<&RoomInfo> {
        self.room.as_ref()
    }

    pub fn spectating(&self) -> Option<&str> {
        self.spectating.as_deref()
    }

    pub fn leaderboard(&self) -> Option<&Leaderboard> {
        self.leaderboard.as_ref()
    }

    pub fn connection_mode(&self) -> Option<ConnectionMode> {
        self.net.as_ref().and_then(|net| net.mode())
    }

    pub fn is_multiplayer(&self) -> bool {
        self.setup.as_ref().is_some_and(|s| s.multiplayer)
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Ignored unless both sides are positive
    pub fn set_viewport(&mut self, viewport: Vec2) {
        if viewport.x > 0.0 && viewport.y > 0.0 {
            self.viewport = viewport;
        }
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            log::info!("Session phase: {} -> {}", self.phase.as_str(), phase.as_str());
            self.phase = phase;
        }
    }

    /// Waiting on the config provider
    pub fn begin_loading(&mut self) {
        self.set_phase(SessionPhase::Loading);
    }

    /// Start a solo match with AI enemies
    pub fn start_solo(&mut self, config: LevelConfig) {
        let map = MapName::from_theme(&config.theme_name);
        self.start_match(MatchSetup {
            map,
            config,
            multiplayer: false,
        });
    }

    fn start_match(&mut self, setup: MatchSetup) {
        let seed = self.rng.random();
        let mut world = World::new(
            seed,
            setup.map,
            setup.config.clone(),
            &self.settings.player_name,
        );
        world.particle_cap = self.settings.max_particles();

        self.presentation.set_score(world.score);
        self.presentation.set_health(world.player.hp);
        self.presentation.set_ammo(world.player.ammo);

        log::info!(
            "Match started: {} ({})",
            setup.config.theme_name,
            if setup.multiplayer { "multiplayer" } else { "solo" }
        );

        self.world = Some(world);
        self.setup = Some(setup);
        self.spectating = None;
        self.leaderboard = None;
        self.set_phase(SessionPhase::Playing);
    }

    /// Rebuild the world for the same map and config
    pub fn restart(&mut self) -> bool {
        let Some(setup) = self.setup.clone() else {
            log::warn!("Restart requested with no match to restart");
            return false;
        };
        let remotes = self
            .world
            .as_ref()
            .map(|w| w.remote_players.clone())
            .unwrap_or_default();
        let latched = self.world.as_ref().is_some_and(|w| w.round_end_latched);
        self.start_match(setup);
        if let Some(world) = self.world.as_mut() {
            world.remote_players = remotes;
            world.round_end_latched = latched;
        }
        true
    }

    pub fn return_to_menu(&mut self) {
        self.world = None;
        self.setup = None;
        self.spectating = None;
        self.leaderboard = None;
        self.set_phase(SessionPhase::Menu);
    }

    /// Attach a network transport and begin connecting
    pub fn connect(&mut self, transport: Box<dyn Transport>, now: f64) {
        self.net = Some(NetworkPeer::new(transport, now));
    }

    /// Create a room with a fresh code
    pub fn host_room(&mut self, map: MapName) -> Result<String, NetError> {
        let code = generate_room_code(&mut self.rng);
        let net = self.net.as_mut().ok_or(NetError::NotConnected)?;
        net.create_room(&code, map)?;
        self.set_phase(SessionPhase::Loading);
        Ok(code)
    }

    pub fn join_room(&mut self, code: &str) -> Result<(), NetError> {
        let net = self.net.as_mut().ok_or(NetError::NotConnected)?;
        net.join_room(&code.trim().to_uppercase())?;
        self.set_phase(SessionPhase::Loading);
        Ok(())
    }

    /// Host-only: start the match for the whole room
    pub fn start_room_game(&mut self, theme: &str) -> Result<(), NetError> {
        let net = self.net.as_mut().ok_or(NetError::NotConnected)?;
        net.start_game(theme)
    }

    fn handle_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Connected { mode } => log::info!("Network connected ({mode:?})"),
            NetEvent::Disconnected => log::warn!("Network disconnected"),
            NetEvent::RoomJoined {
                code,
                is_host,
                theme,
            } => {
                log::info!("Joined room {code} (host: {is_host})");
                self.room = Some(RoomInfo { code, is_host });
                if theme.is_some() {
                    self.room_theme = theme;
                }
            }
            NetEvent::GameStarted { theme } => {
                let config = LevelConfig {
                    theme_name: theme,
                    ..LevelConfig::default()
                };
                self.start_match(MatchSetup {
                    map: MapName::from_theme(&config.theme_name),
                    config,
                    multiplayer: true,
                });
            }
            NetEvent::PlayerUpdate(remote) => {
                if let Some(world) = self.world.as_mut() {
                    world.upsert_remote(remote);
                }
            }
            NetEvent::PlayerLeft { id } => {
                if let Some(world) = self.world.as_mut() {
                    world.remove_remote(&id);
                }
            }
        }
    }

    /// Theme the room announced, if any
    pub fn room_theme(&self) -> Option<&str> {
        self.room_theme.as_deref()
    }

    /// Run one display frame: network, simulation, presentation, render
    ///
    /// Returns true if a frame was drawn.
    pub fn frame(
        &mut self,
        now: f64,
        input: &InputState,
        surface: Option<&mut dyn RenderSurface>,
    ) -> bool {
        if let Some(net) = self.net.as_mut() {
            net.update(now);
            for event in net.drain_events() {
                self.handle_net_event(event);
            }
        }

        if let Some(size) = surface.as_ref().map(|s| s.size()) {
            self.set_viewport(size);
        }

        if self.phase.is_simulating() {
            self.simulate(now, input);
        }

        let Some(world) = self.world.as_ref() else {
            return false;
        };
        if self.phase == SessionPhase::Menu || self.phase == SessionPhase::Loading {
            return false;
        }
        let view = View::for_world(world, self.viewport, self.spectating.as_deref())
            .with_rays(self.settings.flashlight_rays());
        render_frame(world, &view, surface)
    }

    fn simulate(&mut self, now: f64, input: &InputState) {
        if self.phase == SessionPhase::Spectating {
            self.retarget_spectate();
        }

        let multiplayer = self.is_multiplayer();
        let active_play = self.phase == SessionPhase::Playing;
        let Some(world) = self.world.as_mut() else {
            return;
        };

        let view = View::for_world(world, self.viewport, self.spectating.as_deref());
        let ctx = StepContext {
            viewport: self.viewport,
            camera_focus: view.camera.focus,
            active_play,
            multiplayer,
        };
        let result = step(world, input, now, &ctx);

        for event in result.events {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::ScoreChanged(score) => self.presentation.set_score(score),
            GameEvent::HealthChanged(hp) => self.presentation.set_health(hp),
            GameEvent::AmmoChanged(ammo) => self.presentation.set_ammo(ammo),
            GameEvent::Kill { .. } => self.presentation.on_kill(),
            GameEvent::Sound(effect) => self.audio.play(effect),
            GameEvent::PlayerMoved(pos) => {
                self.presentation.on_player_update(pos);
                self.broadcast_position(pos);
            }
            GameEvent::GameOver { cause } => {
                log::info!("Game over: {}", cause.as_str());
                self.presentation.on_game_over(Some(cause));
                // Peers must see hp 0 even inside the emission throttle window
                if let Some(pos) = self.world.as_ref().map(|w| w.player.body.pos) {
                    self.broadcast_position(pos);
                }
                self.enter_spectate_or_game_over();
            }
            GameEvent::RoundEnd => {
                self.presentation.on_round_end();
                self.show_leaderboard();
            }
        }
    }

    fn broadcast_position(&mut self, pos: Vec2) {
        if !self.is_multiplayer() {
            return;
        }
        let (Some(net), Some(world)) = (self.net.as_mut(), self.world.as_ref()) else {
            return;
        };
        net.send_player_update(PlayerUpdate {
            pos,
            color: world.player.body.color,
            name: Some(world.player.name.clone()),
            hp: Some(world.player.hp),
            kills: Some(world.kills),
        });
    }

    fn first_living_remote(&self) -> Option<String> {
        self.world
            .as_ref()?
            .living_remotes()
            .next()
            .map(|r| r.id.clone())
    }

    fn enter_spectate_or_game_over(&mut self) {
        if self.is_multiplayer()
            && let Some(id) = self.first_living_remote()
        {
            log::info!("Spectating {id}");
            self.spectating = Some(id);
            self.set_phase(SessionPhase::Spectating);
        } else {
            self.spectating = None;
            self.set_phase(SessionPhase::GameOver);
        }
    }

    /// Keep following someone alive, or give up
    fn retarget_spectate(&mut self) {
        let still_alive = self
            .spectating
            .as_ref()
            .zip(self.world.as_ref())
            .and_then(|(id, world)| world.remote_players.get(id))
            .is_some_and(|r| r.alive());
        if !still_alive {
            self.cycle_spectate();
        }
    }

    /// Advance to the next living remote player, ordered by id
    pub fn cycle_spectate(&mut self) -> Option<&str> {
        if self.phase != SessionPhase::Spectating {
            return None;
        }
        let ids: Vec<String> = self
            .world
            .as_ref()
            .map(|w| w.living_remotes().map(|r| r.id.clone()).collect())
            .unwrap_or_default();

        if ids.is_empty() {
            self.spectating = None;
            self.set_phase(SessionPhase::GameOver);
            return None;
        }

        let next = match self.spectating.as_ref() {
            Some(current) => ids
                .iter()
                .find(|id| id.as_str() > current.as_str())
                .unwrap_or(&ids[0]),
            None => &ids[0],
        };
        self.spectating = Some(next.clone());
        self.spectating.as_deref()
    }

    /// Rank everyone in the current match
    pub fn show_leaderboard(&mut self) -> Option<&Leaderboard> {
        let board = Leaderboard::from_world(self.world.as_ref()?);
        self.leaderboard = Some(board);
        self.set_phase(SessionPhase::Leaderboard);
        self.leaderboard.as_ref()
    }
}
