//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches the DOM,
//! the canvas or the network:
//! - Seeded RNG only (one `Pcg32` per world)
//! - Entities reference each other by id
//! - Side effects leave the step as `GameEvent`s

pub mod geometry;
pub mod map;
pub mod state;
pub mod tick;

pub use geometry::{RayHit, cast_ray, ray_segment_intersect, resolve_circle_circle, resolve_circle_rect};
pub use map::{MapName, find_safe_spawn_position};
pub use state::{
    Body, Bullet, Decoration, DecorationKind, Enemy, HealthPack, Particle, Player, RemotePlayer,
    Wall, World,
};
pub use tick::{DeathCause, FrameResult, GameEvent, InputState, StepContext, step};
