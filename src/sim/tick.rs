//! Per-frame simulation step
//!
//! Advances the world by one display frame. The order of the phases below is
//! load-bearing: combat reads positions after movement, and cleanup runs last
//! so every consumed bullet and dead enemy is visible to the frame's events.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{
    blocks_projectile, closest_point_on_rect, point_in_rect, resolve_circle_circle,
    resolve_circle_rect,
};
use super::state::{Enemy, World};
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::{angle_of, direction};

/// Input for a single frame, sampled by the platform layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Cursor position in screen space
    pub mouse: Vec2,
    pub mouse_down: bool,
    pub reload: bool,
}

impl InputState {
    /// Movement direction from the held keys (unit length or zero)
    pub fn move_dir(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir.normalize_or_zero()
    }
}

/// Frame-level facts the step needs from its caller
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// Viewport size in pixels
    pub viewport: Vec2,
    /// World position the camera is centered on
    pub camera_focus: Vec2,
    /// Player input and spawners only run during active play
    pub active_play: bool,
    /// Networked session (no AI enemies)
    pub multiplayer: bool,
}

/// What ended the local player's run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Enemy,
    Cactus,
}

impl DeathCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathCause::Enemy => "Enemy",
            DeathCause::Cactus => "Cactus",
        }
    }
}

/// Side effects produced by one frame, applied by the session
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ScoreChanged(u64),
    HealthChanged(i32),
    AmmoChanged(u32),
    Kill { enemy_id: u32 },
    GameOver { cause: DeathCause },
    RoundEnd,
    /// Throttled local position broadcast
    PlayerMoved(Vec2),
    Sound(SoundEffect),
}

/// Events of one frame in emission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameResult {
    pub events: Vec<GameEvent>,
}

impl FrameResult {
    fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn game_over(&self) -> Option<DeathCause> {
        self.events.iter().find_map(|e| match e {
            GameEvent::GameOver { cause } => Some(*cause),
            _ => None,
        })
    }
}

/// Advance the world by one frame at wall-clock time `now` (ms)
pub fn step(world: &mut World, input: &InputState, now: f64, ctx: &StepContext) -> FrameResult {
    let mut out = FrameResult::default();

    // Spawner clocks start on the first frame of the match
    world.timers.last_enemy_spawn.get_or_insert(now);
    world.timers.last_health_pack.get_or_insert(now);

    for remote in world.remote_players.values_mut() {
        remote.interpolate(REMOTE_LERP);
    }

    if ctx.active_play && world.player.alive() {
        move_player(world, input, now, &mut out);
    }

    check_round_end(world, &mut out);

    world.aim_angle = angle_of(input.mouse - ctx.viewport / 2.0);
    if ctx.active_play {
        update_reload(world, input, now, &mut out);
        try_shoot(world, input, now, &mut out);
        spawn_enemies(world, now, ctx);
        spawn_health_packs(world, now);
    }

    update_bullets(world, ctx);
    update_enemies(world, &mut out);
    resolve_combat(world, &mut out);
    pickup_health(world, &mut out);
    cleanup(world);

    out
}

fn move_player(world: &mut World, input: &InputState, now: f64, out: &mut FrameResult) {
    let player = &mut world.player;
    player.body.vel = input.move_dir() * player.speed;
    player.body.integrate();

    for wall in &world.walls {
        resolve_circle_rect(&mut player.body, wall);
    }

    let mut touched_cactus = false;
    for deco in &world.decorations {
        if resolve_circle_circle(&mut player.body, deco.pos, deco.radius) && deco.is_cactus() {
            touched_cactus = true;
        }
    }

    if touched_cactus && now - world.timers.last_cactus_hit >= CACTUS_COOLDOWN_MS {
        world.timers.last_cactus_hit = now;
        let died = player.take_damage(CACTUS_DAMAGE);
        out.push(GameEvent::HealthChanged(player.hp));
        out.push(GameEvent::Sound(SoundEffect::PlayerDamage));
        if died {
            log::info!("Player killed by a cactus");
            out.push(GameEvent::GameOver {
                cause: DeathCause::Cactus,
            });
        }
    }

    if now - world.timers.last_net_emit >= NET_EMIT_INTERVAL_MS {
        world.timers.last_net_emit = now;
        out.push(GameEvent::PlayerMoved(player.body.pos));
    }
}

/// Level-triggered condition, reported once per rising edge
fn check_round_end(world: &mut World, out: &mut FrameResult) {
    if world.remote_players.is_empty() {
        world.round_end_latched = false;
        return;
    }

    let alive = world.living_remotes().count() + usize::from(world.player.alive());
    if alive <= 1 {
        if !world.round_end_latched {
            world.round_end_latched = true;
            log::info!("Round over: {alive} player(s) standing");
            out.push(GameEvent::RoundEnd);
        }
    } else {
        world.round_end_latched = false;
    }
}

fn update_reload(world: &mut World, input: &InputState, now: f64, out: &mut FrameResult) {
    let player = &mut world.player;
    if input.reload
        && player.alive()
        && player.ammo < PLAYER_MAX_AMMO
        && world.timers.reload_until.is_none()
    {
        world.timers.reload_until = Some(now + RELOAD_MS);
    }

    if let Some(done_at) = world.timers.reload_until
        && now >= done_at
    {
        world.timers.reload_until = None;
        player.ammo = PLAYER_MAX_AMMO;
        out.push(GameEvent::AmmoChanged(player.ammo));
    }
}

fn try_shoot(world: &mut World, input: &InputState, now: f64, out: &mut FrameResult) {
    let ready = world.player.alive()
        && input.mouse_down
        && now - world.timers.last_shot >= SHOOT_COOLDOWN_MS
        && world.player.ammo > 0
        && world.timers.reload_until.is_none();
    if !ready {
        return;
    }

    world.timers.last_shot = now;
    world.player.ammo -= 1;

    let aim = direction(world.aim_angle);
    let muzzle = world.player.body.pos + aim * (world.player.body.radius + MUZZLE_GAP);
    let owner = world.player.id;
    world.spawn_bullet(muzzle, aim * BULLET_SPEED, Some(owner));

    out.push(GameEvent::AmmoChanged(world.player.ammo));
    out.push(GameEvent::Sound(SoundEffect::Shoot));

    // Empty magazine reloads on its own
    if world.player.ammo == 0 {
        world.timers.reload_until = Some(now + RELOAD_MS);
    }
}

fn spawn_enemies(world: &mut World, now: f64, ctx: &StepContext) {
    if !world.player.alive() || ctx.multiplayer {
        return;
    }
    let last = world.timers.last_enemy_spawn.unwrap_or(now);
    if now - last < world.config.enemy_spawn_rate_ms {
        return;
    }

    let ring = ctx.viewport.length() / 2.0 + ENEMY_SPAWN_MARGIN;
    let angle = world.rng.random_range(0.0..std::f32::consts::TAU);
    let pos = ctx.camera_focus + direction(angle) * ring;

    // Inside a wall: try again next frame
    if world.walls.iter().any(|wall| point_in_rect(pos, wall)) {
        return;
    }

    let id = world.spawn_enemy(pos);
    world.timers.last_enemy_spawn = Some(now);
    log::trace!("Spawned enemy {id} at ({:.0}, {:.0})", pos.x, pos.y);
}

fn spawn_health_packs(world: &mut World, now: f64) {
    let last = world.timers.last_health_pack.unwrap_or(now);
    if now - last < HEALTH_PACK_INTERVAL_MS {
        return;
    }
    world.timers.last_health_pack = Some(now);

    if world.health_packs.len() >= MAX_HEALTH_PACKS {
        return;
    }

    let reach = world.map.half_extent() - SPAWN_PADDING;
    for _ in 0..HEALTH_PACK_ATTEMPTS {
        let pos = Vec2::new(
            world.rng.random_range(-reach..reach),
            world.rng.random_range(-reach..reach),
        );
        let blocked = world
            .walls
            .iter()
            .any(|wall| closest_point_on_rect(pos, wall).distance(pos) < HEALTH_PACK_RADIUS);
        if !blocked {
            world.spawn_health_pack(pos);
            return;
        }
    }
    log::debug!("No clear spot for a health pack this interval");
}

fn update_bullets(world: &mut World, ctx: &StepContext) {
    let despawn_dist = ctx.viewport.length() * BULLET_DESPAWN_FACTOR;
    let mut impacts = Vec::new();

    for bullet in world.bullets.iter_mut().filter(|b| !b.spent()) {
        bullet.body.integrate();

        // Decorations and low walls let bullets through
        if world.walls.iter().any(|wall| blocks_projectile(&bullet.body, wall)) {
            bullet.consume();
            impacts.push(bullet.body.pos);
            continue;
        }

        if bullet.body.pos.distance(ctx.camera_focus) > despawn_dist {
            bullet.consume();
        }
    }

    let spark = world.config.wall_color;
    for pos in impacts {
        world.spawn_particles(pos, spark, HIT_PARTICLES);
    }
}

fn update_enemies(world: &mut World, out: &mut FrameResult) {
    if !world.player.alive() {
        return;
    }

    let mut bursts = Vec::new();
    for enemy in world.enemies.iter_mut().filter(|e| e.alive()) {
        // Straight-line pursuit
        let to_player = world.player.body.pos - enemy.body.pos;
        enemy.body.vel = to_player.normalize_or_zero() * enemy.speed;
        enemy.body.integrate();

        for wall in &world.walls {
            resolve_circle_rect(&mut enemy.body, wall);
        }
        for deco in &world.decorations {
            resolve_circle_circle(&mut enemy.body, deco.pos, deco.radius);
        }

        if world.player.alive() && enemy.body.overlaps(&world.player.body) {
            enemy.hp = 0;
            bursts.push((enemy.body.pos, enemy.body.color));

            let died = world.player.take_damage(ENEMY_CONTACT_DAMAGE);
            out.push(GameEvent::HealthChanged(world.player.hp));
            out.push(GameEvent::Sound(SoundEffect::PlayerDamage));
            if died {
                log::info!("Player killed by enemy {}", enemy.id);
                out.push(GameEvent::GameOver {
                    cause: DeathCause::Enemy,
                });
            }
        }
    }

    for (pos, color) in bursts {
        world.spawn_particles(pos, color, DEATH_PARTICLES);
    }
}

fn resolve_combat(world: &mut World, out: &mut FrameResult) {
    let mut bursts = Vec::new();

    for bullet in world.bullets.iter_mut().filter(|b| !b.spent()) {
        let Some(enemy) = world
            .enemies
            .iter_mut()
            .find(|e| e.alive() && bullet.body.overlaps(&e.body))
        else {
            continue;
        };

        // One hit per bullet, consumed even on overkill
        enemy.hp -= bullet.damage;
        bullet.consume();

        if !enemy.alive() {
            world.score += enemy.score_value;
            world.kills += 1;
            bursts.push((enemy.body.pos, enemy.body.color));
            out.push(GameEvent::Kill { enemy_id: enemy.id });
            out.push(GameEvent::ScoreChanged(world.score));
            out.push(GameEvent::Sound(SoundEffect::EnemyDeath));
        }
    }

    for (pos, color) in bursts {
        world.spawn_particles(pos, color, DEATH_PARTICLES);
    }
}

fn pickup_health(world: &mut World, out: &mut FrameResult) {
    if !world.player.alive() {
        return;
    }

    let player_body = &world.player.body;
    let before = world.health_packs.len();
    world
        .health_packs
        .retain(|pack| !(pack.active && pack.body.overlaps(player_body)));

    if world.health_packs.len() < before {
        world.player.heal_full();
        out.push(GameEvent::HealthChanged(world.player.hp));
    }
}

fn cleanup(world: &mut World) {
    world.bullets.retain(|b| !b.spent());
    world.enemies.retain(Enemy::alive);

    for particle in &mut world.particles {
        particle.body.integrate();
        particle.life -= PARTICLE_DECAY;
    }
    world.particles.retain(|p| p.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Color, LevelConfig};
    use crate::sim::state::{Decoration, DecorationKind, RemotePlayer, Wall};
    use proptest::prelude::*;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    fn ctx() -> StepContext {
        StepContext {
            viewport: VIEWPORT,
            camera_focus: Vec2::ZERO,
            active_play: true,
            multiplayer: false,
        }
    }

    fn world() -> World {
        World::empty(1234, LevelConfig::default())
    }

    fn remote(id: &str, hp: i32) -> RemotePlayer {
        RemotePlayer {
            id: id.to_string(),
            pos: Vec2::new(500.0, 500.0),
            vel: Vec2::ZERO,
            color: Color::WHITE,
            name: id.to_string(),
            hp,
            kills: 0,
            render_pos: None,
        }
    }

    #[test]
    fn test_move_right_one_frame() {
        let mut world = world();
        let input = InputState {
            right: true,
            ..Default::default()
        };
        step(&mut world, &input, 0.0, &ctx());
        assert_eq!(world.player.body.pos, Vec2::new(4.0, 0.0));
        assert_eq!(world.player.body.vel, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_diagonal_input_is_normalized() {
        let mut world = world();
        let input = InputState {
            up: true,
            left: true,
            ..Default::default()
        };
        step(&mut world, &input, 0.0, &ctx());
        assert!((world.player.body.vel.length() - 4.0).abs() < 1e-5);
        assert!(world.player.body.pos.x < 0.0 && world.player.body.pos.y < 0.0);
    }

    #[test]
    fn test_player_blocked_by_wall() {
        let mut world = world();
        world.walls.push(Wall::new(20.0, -50.0, 40.0, 100.0, true));
        let input = InputState {
            right: true,
            ..Default::default()
        };
        for frame in 0..20 {
            step(&mut world, &input, frame as f64 * 16.0, &ctx());
        }
        assert!((world.player.body.pos.x - (20.0 - PLAYER_RADIUS)).abs() < 1e-3);
    }

    #[test]
    fn test_dead_player_does_not_move() {
        let mut world = world();
        world.player.hp = 0;
        let input = InputState {
            right: true,
            mouse_down: true,
            ..Default::default()
        };
        let result = step(&mut world, &input, 0.0, &ctx());
        assert_eq!(world.player.body.pos, Vec2::ZERO);
        assert!(world.bullets.is_empty());
        assert!(result.is_empty());
    }

    #[test]
    fn test_bullet_kills_enemy() {
        let mut world = world();
        let enemy_id = world.spawn_enemy(Vec2::new(300.0, 0.0));
        world.spawn_bullet(Vec2::new(300.0, 0.0), Vec2::ZERO, None);

        let result = step(&mut world, &InputState::default(), 0.0, &ctx());

        assert!(world.enemies.is_empty());
        assert!(world.bullets.is_empty());
        assert_eq!(world.score, ENEMY_SCORE);
        assert_eq!(world.kills, 1);
        assert!(result.events.contains(&GameEvent::Kill { enemy_id }));
        assert!(result.events.contains(&GameEvent::ScoreChanged(10)));
        assert!(result.events.contains(&GameEvent::Sound(SoundEffect::EnemyDeath)));
        assert!(!world.particles.is_empty());
    }

    #[test]
    fn test_bullet_hits_only_one_enemy() {
        let mut world = world();
        world.spawn_enemy(Vec2::new(300.0, 0.0));
        world.spawn_enemy(Vec2::new(302.0, 0.0));
        world.spawn_bullet(Vec2::new(301.0, 0.0), Vec2::ZERO, None);

        let result = step(&mut world, &InputState::default(), 0.0, &ctx());
        assert_eq!(world.enemies.len(), 1);
        assert_eq!(result.count(|e| matches!(e, GameEvent::Kill { .. })), 1);
    }

    #[test]
    fn test_enemy_contact_is_kamikaze() {
        let mut world = world();
        world.spawn_enemy(Vec2::new(20.0, 0.0));
        let result = step(&mut world, &InputState::default(), 0.0, &ctx());

        assert_eq!(world.player.hp, PLAYER_MAX_HP - ENEMY_CONTACT_DAMAGE);
        assert!(world.enemies.is_empty());
        assert_eq!(world.score, 0);
        assert!(result.events.contains(&GameEvent::HealthChanged(90)));
        assert!(result.game_over().is_none());
    }

    #[test]
    fn test_enemy_contact_game_over_fires_once() {
        let mut world = world();
        world.player.hp = 5;
        world.spawn_enemy(Vec2::new(20.0, 0.0));
        world.spawn_enemy(Vec2::new(-20.0, 0.0));

        let result = step(&mut world, &InputState::default(), 0.0, &ctx());
        assert_eq!(world.player.hp, 0);
        assert_eq!(result.game_over(), Some(DeathCause::Enemy));
        assert_eq!(result.count(|e| matches!(e, GameEvent::GameOver { .. })), 1);
        // The second enemy stops once the player is down
        assert_eq!(world.enemies.len(), 1);
    }

    #[test]
    fn test_enemy_chases_player() {
        let mut world = world();
        world.spawn_enemy(Vec2::new(200.0, 0.0));
        step(&mut world, &InputState::default(), 0.0, &ctx());
        assert_eq!(world.enemies[0].body.pos, Vec2::new(198.0, 0.0));
    }

    #[test]
    fn test_health_pack_full_heal() {
        let mut world = world();
        world.player.hp = 40;
        world.spawn_health_pack(Vec2::new(5.0, 0.0));

        let result = step(&mut world, &InputState::default(), 0.0, &ctx());
        assert_eq!(world.player.hp, 100);
        assert!(world.health_packs.is_empty());
        assert!(result.events.contains(&GameEvent::HealthChanged(100)));
    }

    #[test]
    fn test_cactus_damage_cooldown() {
        let mut world = world();
        world.decorations.push(Decoration {
            pos: Vec2::new(20.0, 0.0),
            kind: DecorationKind::Cactus,
            scale: 1.0,
            rotation: 0.0,
            radius: 14.0,
        });
        let input = InputState {
            right: true,
            ..Default::default()
        };

        step(&mut world, &input, 0.0, &ctx());
        assert_eq!(world.player.hp, PLAYER_MAX_HP - CACTUS_DAMAGE);
        // Pushed back out of the cactus
        assert!(world.player.body.pos.distance(Vec2::new(20.0, 0.0)) >= PLAYER_RADIUS + 14.0 - 1e-3);

        step(&mut world, &input, 500.0, &ctx());
        assert_eq!(world.player.hp, PLAYER_MAX_HP - CACTUS_DAMAGE);

        step(&mut world, &input, 1000.0, &ctx());
        assert_eq!(world.player.hp, PLAYER_MAX_HP - CACTUS_DAMAGE * 2);
    }

    #[test]
    fn test_cactus_can_end_the_game() {
        let mut world = world();
        world.player.hp = 2;
        world.decorations.push(Decoration {
            pos: Vec2::new(20.0, 0.0),
            kind: DecorationKind::Cactus,
            scale: 1.0,
            rotation: 0.0,
            radius: 14.0,
        });
        let input = InputState {
            right: true,
            ..Default::default()
        };
        let result = step(&mut world, &input, 0.0, &ctx());
        assert_eq!(result.game_over(), Some(DeathCause::Cactus));
    }

    #[test]
    fn test_shooting_cooldown_and_ammo() {
        let mut world = world();
        let input = InputState {
            mouse: VIEWPORT / 2.0 + Vec2::new(100.0, 0.0),
            mouse_down: true,
            ..Default::default()
        };

        let result = step(&mut world, &input, 0.0, &ctx());
        assert_eq!(world.bullets.len(), 1);
        assert_eq!(world.player.ammo, PLAYER_MAX_AMMO - 1);
        assert!(result.events.contains(&GameEvent::Sound(SoundEffect::Shoot)));
        let bullet = &world.bullets[0];
        assert!((bullet.body.vel - Vec2::new(BULLET_SPEED, 0.0)).length() < 1e-4);
        assert_eq!(bullet.damage, BULLET_DAMAGE);
        assert_eq!(bullet.owner_id, Some(world.player.id));

        step(&mut world, &input, 100.0, &ctx());
        assert_eq!(world.player.ammo, PLAYER_MAX_AMMO - 1);

        step(&mut world, &input, 600.0, &ctx());
        assert_eq!(world.player.ammo, PLAYER_MAX_AMMO - 2);
        assert_eq!(world.bullets.len(), 2);
    }

    #[test]
    fn test_no_shot_without_ammo_and_auto_reload() {
        let mut world = world();
        world.player.ammo = 1;
        let input = InputState {
            mouse_down: true,
            ..Default::default()
        };
        step(&mut world, &input, 0.0, &ctx());
        assert_eq!(world.player.ammo, 0);

        step(&mut world, &input, 600.0, &ctx());
        assert_eq!(world.player.ammo, 0);

        let result = step(&mut world, &input, RELOAD_MS, &ctx());
        assert!(result.events.contains(&GameEvent::AmmoChanged(PLAYER_MAX_AMMO)));
    }

    #[test]
    fn test_manual_reload() {
        let mut world = world();
        world.player.ammo = 3;
        let reload = InputState {
            reload: true,
            ..Default::default()
        };
        step(&mut world, &reload, 0.0, &ctx());
        assert_eq!(world.player.ammo, 3);
        step(&mut world, &InputState::default(), RELOAD_MS, &ctx());
        assert_eq!(world.player.ammo, PLAYER_MAX_AMMO);
    }

    #[test]
    fn test_bullets_pass_low_walls_but_stop_at_high_walls() {
        let mut world = world();
        world.walls.push(Wall::new(50.0, -20.0, 10.0, 40.0, true));
        world.walls.push(Wall::new(150.0, -20.0, 10.0, 40.0, false));
        world.spawn_bullet(Vec2::new(30.0, 0.0), Vec2::new(BULLET_SPEED, 0.0), None);

        let mut stopped_at = None;
        for frame in 0..20 {
            step(&mut world, &InputState::default(), frame as f64, &ctx());
            if world.bullets.is_empty() {
                stopped_at = Some(frame);
                break;
            }
            assert!(world.bullets[0].body.pos.x < 150.0);
        }
        assert!(stopped_at.is_some());
    }

    #[test]
    fn test_bullets_pass_through_decorations() {
        let mut world = world();
        world.decorations.push(Decoration {
            pos: Vec2::new(100.0, 0.0),
            kind: DecorationKind::Cactus,
            scale: 1.0,
            rotation: 0.0,
            radius: 14.0,
        });
        world.spawn_bullet(Vec2::new(90.0, 0.0), Vec2::new(BULLET_SPEED, 0.0), None);
        step(&mut world, &InputState::default(), 0.0, &ctx());
        step(&mut world, &InputState::default(), 1.0, &ctx());
        assert_eq!(world.bullets.len(), 1);
    }

    #[test]
    fn test_bullet_despawns_far_from_camera() {
        let mut world = world();
        let limit = VIEWPORT.length() * BULLET_DESPAWN_FACTOR;
        world.spawn_bullet(Vec2::new(limit - 5.0, 0.0), Vec2::new(BULLET_SPEED, 0.0), None);
        step(&mut world, &InputState::default(), 0.0, &ctx());
        assert!(world.bullets.is_empty());
    }

    #[test]
    fn test_enemy_spawner_solo_only() {
        let rate = LevelConfig::default().enemy_spawn_rate_ms;

        let mut solo = world();
        step(&mut solo, &InputState::default(), 0.0, &ctx());
        assert!(solo.enemies.is_empty());
        step(&mut solo, &InputState::default(), rate, &ctx());
        assert_eq!(solo.enemies.len(), 1);
        let ring = VIEWPORT.length() / 2.0 + ENEMY_SPAWN_MARGIN;
        // Spawned on the ring, then advanced one frame toward the player
        let dist = solo.enemies[0].body.pos.length();
        assert!((dist - ring).abs() <= solo.config.enemy_speed + 1e-3);

        let mut multi = world();
        let multi_ctx = StepContext {
            multiplayer: true,
            ..ctx()
        };
        step(&mut multi, &InputState::default(), 0.0, &multi_ctx);
        step(&mut multi, &InputState::default(), rate * 3.0, &multi_ctx);
        assert!(multi.enemies.is_empty());
    }

    #[test]
    fn test_health_pack_spawner() {
        let mut world = world();
        step(&mut world, &InputState::default(), 0.0, &ctx());
        assert!(world.health_packs.is_empty());
        step(&mut world, &InputState::default(), HEALTH_PACK_INTERVAL_MS, &ctx());
        assert_eq!(world.health_packs.len(), 1);
        assert!(world.health_packs[0].active);
    }

    #[test]
    fn test_enemy_spawn_inside_wall_retries_next_frame() {
        let rate = LevelConfig::default().enemy_spawn_rate_ms;
        let mut world = world();
        // Covers the whole spawn ring around the origin
        world.walls.push(Wall::new(-2000.0, -2000.0, 4000.0, 4000.0, false));

        step(&mut world, &InputState::default(), 0.0, &ctx());
        step(&mut world, &InputState::default(), rate, &ctx());
        assert!(world.enemies.is_empty());
        assert_eq!(world.timers.last_enemy_spawn, Some(0.0));

        world.walls.clear();
        step(&mut world, &InputState::default(), rate + 16.0, &ctx());
        assert_eq!(world.enemies.len(), 1);
        assert_eq!(world.timers.last_enemy_spawn, Some(rate + 16.0));
    }

    #[test]
    fn test_health_pack_blocked_everywhere_still_resets_timer() {
        let mut world = world();
        let reach = world.map.half_extent() + 100.0;
        world
            .walls
            .push(Wall::new(-reach, -reach, reach * 2.0, reach * 2.0, false));

        step(&mut world, &InputState::default(), 0.0, &ctx());
        step(&mut world, &InputState::default(), HEALTH_PACK_INTERVAL_MS, &ctx());
        assert!(world.health_packs.is_empty());
        assert_eq!(world.timers.last_health_pack, Some(HEALTH_PACK_INTERVAL_MS));

        // Next attempt waits a full interval from the failed one
        world.walls.clear();
        step(&mut world, &InputState::default(), HEALTH_PACK_INTERVAL_MS + 16.0, &ctx());
        assert!(world.health_packs.is_empty());
        step(&mut world, &InputState::default(), HEALTH_PACK_INTERVAL_MS * 2.0, &ctx());
        assert_eq!(world.health_packs.len(), 1);
    }

    #[test]
    fn test_health_packs_capped() {
        let mut world = world();
        for i in 0..MAX_HEALTH_PACKS {
            world.spawn_health_pack(Vec2::new(500.0, i as f32 * 100.0));
        }

        step(&mut world, &InputState::default(), 0.0, &ctx());
        step(&mut world, &InputState::default(), HEALTH_PACK_INTERVAL_MS, &ctx());
        assert_eq!(world.health_packs.len(), MAX_HEALTH_PACKS);
        assert_eq!(world.timers.last_health_pack, Some(HEALTH_PACK_INTERVAL_MS));
    }

    #[test]
    fn test_position_broadcast_is_throttled() {
        let mut world = world();
        let input = InputState {
            right: true,
            ..Default::default()
        };
        let moved = |r: &FrameResult| r.count(|e| matches!(e, GameEvent::PlayerMoved(_)));

        assert_eq!(moved(&step(&mut world, &input, 0.0, &ctx())), 1);
        assert_eq!(moved(&step(&mut world, &input, 30.0, &ctx())), 0);
        assert_eq!(moved(&step(&mut world, &input, 55.0, &ctx())), 1);
    }

    #[test]
    fn test_round_end_is_edge_triggered() {
        let mut world = world();
        world.upsert_remote(remote("a", 0));

        let first = step(&mut world, &InputState::default(), 0.0, &ctx());
        assert!(first.events.contains(&GameEvent::RoundEnd));
        let second = step(&mut world, &InputState::default(), 16.0, &ctx());
        assert!(!second.events.contains(&GameEvent::RoundEnd));

        // A living opponent re-arms the trigger
        world.upsert_remote(remote("a", 50));
        step(&mut world, &InputState::default(), 32.0, &ctx());
        world.upsert_remote(remote("a", 0));
        let third = step(&mut world, &InputState::default(), 48.0, &ctx());
        assert!(third.events.contains(&GameEvent::RoundEnd));
    }

    #[test]
    fn test_no_round_end_without_remotes() {
        let mut world = world();
        let result = step(&mut world, &InputState::default(), 0.0, &ctx());
        assert!(!result.events.contains(&GameEvent::RoundEnd));
    }

    #[test]
    fn test_particles_decay_and_expire() {
        let mut world = world();
        world.spawn_particles(Vec2::ZERO, Color::WHITE, 3);
        step(&mut world, &InputState::default(), 0.0, &ctx());
        assert!((world.particles[0].life - (1.0 - PARTICLE_DECAY)).abs() < 1e-6);
        for frame in 1..60 {
            step(&mut world, &InputState::default(), frame as f64, &ctx());
        }
        assert!(world.particles.is_empty());
    }

    fn arb_input() -> impl Strategy<Value = InputState> {
        (
            any::<[bool; 6]>(),
            (0.0f32..800.0, 0.0f32..600.0),
        )
            .prop_map(|(keys, (mx, my))| InputState {
                up: keys[0],
                down: keys[1],
                left: keys[2],
                right: keys[3],
                mouse: Vec2::new(mx, my),
                mouse_down: keys[4],
                reload: keys[5],
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_health_clamped_and_bullets_all_or_nothing(
            seed in any::<u64>(),
            inputs in prop::collection::vec(arb_input(), 1..120),
        ) {
            let mut world = World::new(
                seed,
                crate::sim::MapName::Wasteland,
                LevelConfig { enemy_spawn_rate_ms: 200.0, ..LevelConfig::default() },
                "prop",
            );
            for (frame, input) in inputs.iter().enumerate() {
                let now = frame as f64 * 50.0;
                let ctx = StepContext {
                    viewport: VIEWPORT,
                    camera_focus: world.player.body.pos,
                    active_play: true,
                    multiplayer: false,
                };
                step(&mut world, input, now, &ctx);

                prop_assert!(world.player.hp >= 0 && world.player.hp <= world.player.max_hp);
                for bullet in &world.bullets {
                    prop_assert_eq!(bullet.damage, BULLET_DAMAGE);
                }
                for enemy in &world.enemies {
                    prop_assert!(enemy.hp > 0);
                }
            }
        }
    }
}
