//! Match state and core simulation types
//!
//! The `World` owns every entity collection for one match. Relationships
//! between entities are ids looked up in these collections, never references.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::map::{self, MapName};
use crate::consts::*;
use crate::level::{Color, LevelConfig};

/// Shape shared by every spatial entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    /// Applied additively once per frame
    pub vel: Vec2,
    pub radius: f32,
    pub color: Color,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32, color: Color) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            color,
        }
    }

    /// Move by the current velocity
    #[inline]
    pub fn integrate(&mut self) {
        self.pos += self.vel;
    }

    #[inline]
    pub fn overlaps(&self, other: &Body) -> bool {
        super::geometry::circles_overlap(self.pos, self.radius, other.pos, other.radius)
    }
}

/// The local player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Entity id from the world allocator; owner of the player's bullets
    pub id: u32,
    pub body: Body,
    /// Always within 0..=max_hp
    pub hp: i32,
    pub max_hp: i32,
    pub speed: f32,
    pub name: String,
    pub ammo: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, pos: Vec2, speed: f32, color: Color) -> Self {
        Self {
            id: 0,
            body: Body::new(pos, PLAYER_RADIUS, color),
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            speed,
            name: name.into(),
            ammo: PLAYER_MAX_AMMO,
        }
    }

    #[inline]
    pub fn alive(&self) -> bool {
        self.hp > 0
    }

    /// Subtract damage, clamped at zero. Returns true if this killed the player.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        let was_alive = self.alive();
        self.hp = (self.hp - amount).clamp(0, self.max_hp);
        was_alive && !self.alive()
    }

    /// Health packs always restore to full
    pub fn heal_full(&mut self) {
        self.hp = self.max_hp;
    }
}

/// Read-only projection of another player, replaced on every network update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePlayer {
    pub id: String,
    pub pos: Vec2,
    #[serde(default)]
    pub vel: Vec2,
    pub color: Color,
    #[serde(default)]
    pub name: String,
    pub hp: i32,
    #[serde(default)]
    pub kills: u32,
    /// Eased position used for drawing (not part of the wire snapshot)
    #[serde(skip)]
    pub render_pos: Option<Vec2>,
}

impl RemotePlayer {
    #[inline]
    pub fn alive(&self) -> bool {
        self.hp > 0
    }

    /// Where to draw this player this frame
    pub fn display_pos(&self) -> Vec2 {
        self.render_pos.unwrap_or(self.pos)
    }

    /// Ease the drawn position toward the latest snapshot
    pub fn interpolate(&mut self, factor: f32) {
        let current = self.display_pos();
        self.render_pos = Some(current.lerp(self.pos, factor));
    }
}

/// A hostile drone that chases the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub body: Body,
    /// Positive while alive, removed at the next cleanup once <= 0
    pub hp: i32,
    pub speed: f32,
    pub score_value: u64,
}

impl Enemy {
    #[inline]
    pub fn alive(&self) -> bool {
        self.hp > 0
    }
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub body: Body,
    /// Either the original damage or exactly 0 once consumed
    pub damage: i32,
    pub owner_id: Option<u32>,
}

impl Bullet {
    #[inline]
    pub fn spent(&self) -> bool {
        self.damage == 0
    }

    #[inline]
    pub fn consume(&mut self) {
        self.damage = 0;
    }
}

/// A cosmetic particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub body: Body,
    pub life: f32,
    pub max_life: f32,
}

/// Axis-aligned wall rectangle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Low walls block movement but not bullets or vision
    pub is_low: bool,
}

impl Wall {
    pub fn new(x: f32, y: f32, width: f32, height: f32, is_low: bool) -> Self {
        Self {
            x,
            y,
            width,
            height,
            is_low,
        }
    }
}

/// Decoration variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorationKind {
    /// Solid, hurts the player on contact, ignored by bullets
    Cactus,
}

/// A static collidable prop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub pos: Vec2,
    pub kind: DecorationKind,
    pub scale: f32,
    pub rotation: f32,
    pub radius: f32,
}

impl Decoration {
    #[inline]
    pub fn is_cactus(&self) -> bool {
        self.kind == DecorationKind::Cactus
    }
}

/// A health pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthPack {
    pub id: u32,
    pub body: Body,
    pub active: bool,
}

/// Frame timers (milliseconds of wall-clock time)
#[derive(Debug, Clone)]
pub struct Timers {
    pub last_shot: f64,
    pub last_cactus_hit: f64,
    pub last_net_emit: f64,
    /// Spawner anchors start unset and latch on the first frame
    pub last_enemy_spawn: Option<f64>,
    pub last_health_pack: Option<f64>,
    pub reload_until: Option<f64>,
}

impl Default for Timers {
    fn default() -> Self {
        Self {
            last_shot: f64::NEG_INFINITY,
            last_cactus_hit: f64::NEG_INFINITY,
            last_net_emit: f64::NEG_INFINITY,
            last_enemy_spawn: None,
            last_health_pack: None,
            reload_until: None,
        }
    }
}

/// Maximum particles when no quality cap is given
pub const MAX_PARTICLES: usize = 500;

/// Every entity collection for one match
#[derive(Debug, Clone)]
pub struct World {
    /// Match seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub map: MapName,
    pub config: LevelConfig,
    pub player: Player,
    /// Keyed by network id, stable iteration order
    pub remote_players: BTreeMap<String, RemotePlayer>,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub particles: Vec<Particle>,
    pub health_packs: Vec<HealthPack>,
    /// Static for the match
    pub walls: Vec<Wall>,
    pub decorations: Vec<Decoration>,
    pub score: u64,
    pub kills: u32,
    /// Aim angle from the last step (radians)
    pub aim_angle: f32,
    pub timers: Timers,
    /// Set while the round-end condition holds (edge detection)
    pub round_end_latched: bool,
    pub particle_cap: usize,
    next_id: u32,
}

impl World {
    /// Build a fresh match: generate the map, then place the player safely
    pub fn new(seed: u64, map: MapName, config: LevelConfig, player_name: &str) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let walls = map::generate_walls(map, &mut rng);
        let decorations = map::generate_decorations(map, &walls, &mut rng);
        let spawn = map::find_safe_spawn_position(&walls, map, &mut rng);

        log::info!(
            "Match built: map={} seed={} walls={} decorations={} spawn=({:.0}, {:.0})",
            map.display_name(),
            seed,
            walls.len(),
            decorations.len(),
            spawn.x,
            spawn.y
        );

        let player = Player::new(player_name, spawn, config.player_speed, config.player_color);

        let mut world = Self {
            seed,
            rng,
            map,
            config,
            player,
            remote_players: BTreeMap::new(),
            enemies: Vec::new(),
            bullets: Vec::new(),
            particles: Vec::new(),
            health_packs: Vec::new(),
            walls,
            decorations,
            score: 0,
            kills: 0,
            aim_angle: 0.0,
            timers: Timers::default(),
            round_end_latched: false,
            particle_cap: MAX_PARTICLES,
            next_id: 1,
        };
        world.player.id = world.next_entity_id();
        world
    }

    /// Empty arena with no walls, useful for scripted scenarios
    pub fn empty(seed: u64, config: LevelConfig) -> Self {
        let player = Player::new("Player", Vec2::ZERO, config.player_speed, config.player_color);
        let mut world = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            map: MapName::ErindalePark,
            config,
            player,
            remote_players: BTreeMap::new(),
            enemies: Vec::new(),
            bullets: Vec::new(),
            particles: Vec::new(),
            health_packs: Vec::new(),
            walls: Vec::new(),
            decorations: Vec::new(),
            score: 0,
            kills: 0,
            aim_angle: 0.0,
            timers: Timers::default(),
            round_end_latched: false,
            particle_cap: MAX_PARTICLES,
            next_id: 1,
        };
        world.player.id = world.next_entity_id();
        world
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_enemy(&mut self, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.enemies.push(Enemy {
            id,
            body: Body::new(pos, ENEMY_RADIUS, self.config.enemy_color),
            hp: ENEMY_HP,
            speed: self.config.enemy_speed,
            score_value: ENEMY_SCORE,
        });
        id
    }

    pub fn spawn_bullet(&mut self, pos: Vec2, vel: Vec2, owner_id: Option<u32>) -> u32 {
        let id = self.next_entity_id();
        let mut body = Body::new(pos, BULLET_RADIUS, Color::rgb(0xff, 0xeb, 0x3b));
        body.vel = vel;
        self.bullets.push(Bullet {
            id,
            body,
            damage: BULLET_DAMAGE,
            owner_id,
        });
        id
    }

    pub fn spawn_health_pack(&mut self, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.health_packs.push(HealthPack {
            id,
            body: Body::new(pos, HEALTH_PACK_RADIUS, Color::rgb(0x66, 0xbb, 0x6a)),
            active: true,
        });
        id
    }

    /// Burst of particles flying outward from `pos`
    pub fn spawn_particles(&mut self, pos: Vec2, color: Color, count: u32) {
        for _ in 0..count {
            if self.particles.len() >= self.particle_cap {
                break;
            }
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let speed: f32 = self.rng.random_range(1.0..4.0);
            let mut body = Body::new(pos, self.rng.random_range(1.5..3.5), color);
            body.vel = crate::direction(angle) * speed;
            self.particles.push(Particle {
                body,
                life: 1.0,
                max_life: 1.0,
            });
        }
    }

    /// Store a network snapshot, keeping the eased draw position
    pub fn upsert_remote(&mut self, mut snapshot: RemotePlayer) {
        snapshot.render_pos = self
            .remote_players
            .get(&snapshot.id)
            .map(RemotePlayer::display_pos);
        self.remote_players.insert(snapshot.id.clone(), snapshot);
    }

    pub fn remove_remote(&mut self, id: &str) {
        self.remote_players.remove(id);
    }

    /// Living remote players in id order
    pub fn living_remotes(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.remote_players.values().filter(|p| p.alive())
    }
}
