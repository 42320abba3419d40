//! Dusk Arena - top-down arena shooter core
//!
//! Core modules:
//! - `sim`: Simulation (geometry, map generation, entity store, frame step)
//! - `renderer`: Camera, layered draw list and the flashlight visibility mask
//! - `session`: Match state machine bridging the sim to UI, audio and network
//! - `net`: Network peer contract with mock-mode fallback
//! - `level`: Level config record and the external config provider contract
//! - `platform`: Browser canvas surface and input mapping

pub mod audio;
pub mod leaderboard;
pub mod level;
pub mod net;
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use leaderboard::Leaderboard;
pub use level::{Color, LevelConfig};
pub use session::{Session, SessionPhase};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
///
/// Speeds are in pixels per frame, timers in milliseconds of wall-clock time.
pub mod consts {
    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 15.0;
    pub const PLAYER_MAX_HP: i32 = 100;
    pub const PLAYER_MAX_AMMO: u32 = 30;
    pub const RELOAD_MS: f64 = 1500.0;

    /// Shooting
    pub const SHOOT_COOLDOWN_MS: f64 = 500.0;
    pub const BULLET_SPEED: f32 = 12.0;
    pub const BULLET_RADIUS: f32 = 4.0;
    pub const BULLET_DAMAGE: i32 = 20;
    /// Muzzle distance beyond the player's edge
    pub const MUZZLE_GAP: f32 = 5.0;
    /// Bullets die past this multiple of the viewport diagonal from the camera
    pub const BULLET_DESPAWN_FACTOR: f32 = 1.5;

    /// Enemy defaults
    pub const ENEMY_RADIUS: f32 = 12.0;
    pub const ENEMY_HP: i32 = 1;
    pub const ENEMY_SCORE: u64 = 10;
    pub const ENEMY_CONTACT_DAMAGE: i32 = 10;
    /// Spawn ring sits this far outside the half viewport diagonal
    pub const ENEMY_SPAWN_MARGIN: f32 = 50.0;

    /// Cactus contact damage
    pub const CACTUS_DAMAGE: i32 = 2;
    pub const CACTUS_COOLDOWN_MS: f64 = 1000.0;

    /// Health packs
    pub const HEALTH_PACK_RADIUS: f32 = 12.0;
    pub const HEALTH_PACK_INTERVAL_MS: f64 = 15_000.0;
    pub const HEALTH_PACK_ATTEMPTS: u32 = 10;
    pub const MAX_HEALTH_PACKS: usize = 5;

    /// Network position emission throttle
    pub const NET_EMIT_INTERVAL_MS: f64 = 50.0;
    /// Time allowed for a live connection before falling back to mock mode
    pub const NET_CONNECT_TIMEOUT_MS: f64 = 5000.0;
    /// Per-frame easing of remote players toward their latest snapshot
    pub const REMOTE_LERP: f32 = 0.25;

    /// Particles
    pub const PARTICLE_DECAY: f32 = 0.02;
    pub const HIT_PARTICLES: u32 = 5;
    pub const DEATH_PARTICLES: u32 = 10;

    /// Map layout
    pub const SPAWN_PADDING: f32 = 100.0;
    pub const SPAWN_ATTEMPTS: u32 = 50;
    pub const BOUNDARY_THICKNESS: f32 = 50.0;
    /// Half-size of the square kept clear around the origin
    pub const ORIGIN_CLEARING: f32 = 120.0;

    /// Flashlight
    pub const BEAM_LENGTH: f32 = 600.0;
    pub const BEAM_FOV: f32 = std::f32::consts::FRAC_PI_3;
    pub const BEAM_RAYS: u32 = 60;
    pub const PROXIMITY_RADIUS: f32 = 80.0;
    pub const MASK_MARGIN: f32 = 100.0;
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of a vector, measured like `atan2(y, x)`
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
