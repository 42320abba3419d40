//! Layered 2D compositor
//!
//! Each frame the world is flattened into a `DrawList` of screen-space
//! commands in strict layer order, then handed to a `RenderSurface`. The
//! surface only knows how to paint primitives; all scene logic lives here.

pub mod camera;
pub mod shapes;
pub mod visibility;

use glam::Vec2;

pub use camera::Camera;
pub use visibility::{LightSource, VisibilityMask};

use crate::consts::BEAM_RAYS;
use crate::level::Color;
use crate::sim::map::WASTELAND_ARENA;
use crate::sim::{MapName, World};
use crate::{angle_of, direction};

/// Draw order, back to front
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    Decorations,
    Walls,
    HealthPacks,
    Particles,
    Bullets,
    Enemies,
    RemotePlayers,
    Darkness,
    LocalPlayer,
    NameTag,
}

/// Screen-space drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear(Color),
    Rect {
        min: Vec2,
        size: Vec2,
        fill: Color,
    },
    Circle {
        center: Vec2,
        radius: f32,
        fill: Color,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Color,
    },
    Text {
        pos: Vec2,
        text: String,
        size: f32,
        color: Color,
    },
    /// Every subpath filled together with the even-odd rule
    EvenOddPath {
        subpaths: Vec<Vec<Vec2>>,
        fill: Color,
    },
}

/// Commands for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub items: Vec<(Layer, DrawCmd)>,
}

impl DrawList {
    pub fn push(&mut self, layer: Layer, cmd: DrawCmd) {
        self.items.push((layer, cmd));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCmd> {
        self.items
            .iter()
            .filter(move |(l, _)| *l == layer)
            .map(|(_, cmd)| cmd)
    }
}

/// Anything that can paint a draw list
pub trait RenderSurface {
    /// Drawable size in pixels
    fn size(&self) -> Vec2;
    fn submit(&mut self, list: &DrawList);
}

/// What the frame is looking at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub camera: Camera,
    /// Flashlight source, `None` when the viewed player is dead
    pub light: Option<LightSource>,
    pub rays: u32,
    /// Draw the local player (hidden while spectating or dead)
    pub show_local: bool,
}

impl View {
    /// Follow the local player, or the spectated remote when one is given
    pub fn for_world(world: &World, viewport: Vec2, spectating: Option<&str>) -> Self {
        if let Some(remote) = spectating.and_then(|id| world.remote_players.get(id)) {
            let pos = remote.display_pos();
            let light = remote.alive().then(|| LightSource {
                pos,
                aim: angle_of(remote.vel),
            });
            return Self {
                camera: Camera::new(pos, viewport),
                light,
                rays: BEAM_RAYS,
                show_local: false,
            };
        }

        let player = &world.player;
        let light = player.alive().then(|| LightSource {
            pos: player.body.pos,
            aim: world.aim_angle,
        });
        Self {
            camera: Camera::new(player.body.pos, viewport),
            light,
            rays: BEAM_RAYS,
            show_local: player.alive(),
        }
    }

    pub fn with_rays(mut self, rays: u32) -> Self {
        self.rays = rays;
        self
    }
}

const CACTUS_GREEN: Color = Color::rgb(0x3a, 0x7d, 0x44);
const HP_BAR_BACK: Color = Color::rgb(0x40, 0x10, 0x10);
const HP_BAR_FILL: Color = Color::rgb(0x4c, 0xaf, 0x50);

fn lighten(c: Color, amount: u8) -> Color {
    Color {
        r: c.r.saturating_add(amount),
        g: c.g.saturating_add(amount),
        b: c.b.saturating_add(amount),
        a: c.a,
    }
}

/// Flatten the world into a layered draw list
pub fn compose(world: &World, view: &View) -> DrawList {
    let cam = &view.camera;
    let mut list = DrawList::default();

    draw_background(world, cam, &mut list);

    for deco in &world.decorations {
        if !cam.sees_circle(deco.pos, deco.radius * 2.0) {
            continue;
        }
        let center = cam.world_to_screen(deco.pos);
        list.push(
            Layer::Decorations,
            DrawCmd::Circle {
                center,
                radius: deco.radius,
                fill: CACTUS_GREEN,
            },
        );
        // Two arms, rotated per cactus
        for side in [-1.0, 1.0] {
            let arm = direction(deco.rotation) * side * deco.radius * 0.9;
            list.push(
                Layer::Decorations,
                DrawCmd::Circle {
                    center: center + arm,
                    radius: deco.radius * 0.45,
                    fill: CACTUS_GREEN,
                },
            );
        }
    }

    for wall in &world.walls {
        let fill = if wall.is_low {
            lighten(world.config.wall_color, 40).with_alpha(200)
        } else {
            world.config.wall_color
        };
        list.push(
            Layer::Walls,
            DrawCmd::Rect {
                min: cam.world_to_screen(Vec2::new(wall.x, wall.y)),
                size: Vec2::new(wall.width, wall.height),
                fill,
            },
        );
    }

    for pack in world.health_packs.iter().filter(|p| p.active) {
        if !cam.sees_circle(pack.body.pos, pack.body.radius) {
            continue;
        }
        let center = cam.world_to_screen(pack.body.pos);
        let r = pack.body.radius;
        list.push(
            Layer::HealthPacks,
            DrawCmd::Circle {
                center,
                radius: r,
                fill: pack.body.color,
            },
        );
        list.push(
            Layer::HealthPacks,
            DrawCmd::Rect {
                min: center - Vec2::new(r * 0.6, r * 0.2),
                size: Vec2::new(r * 1.2, r * 0.4),
                fill: Color::WHITE,
            },
        );
        list.push(
            Layer::HealthPacks,
            DrawCmd::Rect {
                min: center - Vec2::new(r * 0.2, r * 0.6),
                size: Vec2::new(r * 0.4, r * 1.2),
                fill: Color::WHITE,
            },
        );
    }

    for particle in &world.particles {
        let alpha = (particle.life / particle.max_life).clamp(0.0, 1.0);
        list.push(
            Layer::Particles,
            DrawCmd::Circle {
                center: cam.world_to_screen(particle.body.pos),
                radius: particle.body.radius,
                fill: particle.body.color.with_alpha((alpha * 255.0) as u8),
            },
        );
    }

    for bullet in &world.bullets {
        list.push(
            Layer::Bullets,
            DrawCmd::Circle {
                center: cam.world_to_screen(bullet.body.pos),
                radius: bullet.body.radius,
                fill: bullet.body.color,
            },
        );
    }

    for enemy in &world.enemies {
        if !cam.sees_circle(enemy.body.pos, enemy.body.radius) {
            continue;
        }
        list.push(
            Layer::Enemies,
            DrawCmd::Circle {
                center: cam.world_to_screen(enemy.body.pos),
                radius: enemy.body.radius,
                fill: enemy.body.color,
            },
        );
    }

    for remote in world.remote_players.values().filter(|r| r.alive()) {
        draw_remote(remote, cam, &mut list);
    }

    let mask = VisibilityMask::build(cam, view.light, &world.walls, view.rays);
    list.push(
        Layer::Darkness,
        DrawCmd::EvenOddPath {
            subpaths: mask.to_screen(cam),
            fill: Color::BLACK,
        },
    );

    if view.show_local && world.player.alive() {
        let player = &world.player;
        let center = cam.world_to_screen(player.body.pos);
        list.push(
            Layer::LocalPlayer,
            DrawCmd::Circle {
                center,
                radius: player.body.radius,
                fill: player.body.color,
            },
        );
        list.push(
            Layer::LocalPlayer,
            DrawCmd::Line {
                from: center,
                to: center + direction(world.aim_angle) * (player.body.radius + 8.0),
                width: 4.0,
                color: Color::WHITE,
            },
        );
        list.push(
            Layer::NameTag,
            DrawCmd::Text {
                pos: center - Vec2::new(0.0, player.body.radius + 10.0),
                text: player.name.clone(),
                size: 12.0,
                color: Color::WHITE,
            },
        );
    }

    list
}

fn draw_background(world: &World, cam: &Camera, list: &mut DrawList) {
    list.push(Layer::Background, DrawCmd::Clear(Color::BLACK));

    let half = world.map.half_extent();
    list.push(
        Layer::Background,
        DrawCmd::Rect {
            min: cam.world_to_screen(Vec2::splat(-half)),
            size: Vec2::splat(half * 2.0),
            fill: world.config.background_color,
        },
    );

    match world.map {
        MapName::Wasteland => {
            // Packed-dirt arena floor
            list.push(
                Layer::Background,
                DrawCmd::Rect {
                    min: cam.world_to_screen(Vec2::splat(-WASTELAND_ARENA)),
                    size: Vec2::splat(WASTELAND_ARENA * 2.0),
                    fill: lighten(world.config.background_color, 18),
                },
            );
        }
        MapName::ErindalePark => {
            // Crossing footpaths
            let path = lighten(world.config.background_color, 12);
            list.push(
                Layer::Background,
                DrawCmd::Rect {
                    min: cam.world_to_screen(Vec2::new(-half, -30.0)),
                    size: Vec2::new(half * 2.0, 60.0),
                    fill: path,
                },
            );
            list.push(
                Layer::Background,
                DrawCmd::Rect {
                    min: cam.world_to_screen(Vec2::new(-30.0, -half)),
                    size: Vec2::new(60.0, half * 2.0),
                    fill: path,
                },
            );
        }
    }
}

fn draw_remote(remote: &crate::sim::RemotePlayer, cam: &Camera, list: &mut DrawList) {
    let pos = remote.display_pos();
    if !cam.sees_circle(pos, crate::consts::PLAYER_RADIUS + 30.0) {
        return;
    }
    let center = cam.world_to_screen(pos);
    let r = crate::consts::PLAYER_RADIUS;

    list.push(
        Layer::RemotePlayers,
        DrawCmd::Circle {
            center,
            radius: r,
            fill: remote.color,
        },
    );
    list.push(
        Layer::RemotePlayers,
        DrawCmd::Text {
            pos: center - Vec2::new(0.0, r + 16.0),
            text: if remote.name.is_empty() {
                remote.id.clone()
            } else {
                remote.name.clone()
            },
            size: 11.0,
            color: Color::WHITE,
        },
    );

    let bar = Vec2::new(r * 2.0, 4.0);
    let bar_min = center - Vec2::new(r, r + 10.0);
    let fraction = (remote.hp as f32 / crate::consts::PLAYER_MAX_HP as f32).clamp(0.0, 1.0);
    list.push(
        Layer::RemotePlayers,
        DrawCmd::Rect {
            min: bar_min,
            size: bar,
            fill: HP_BAR_BACK,
        },
    );
    list.push(
        Layer::RemotePlayers,
        DrawCmd::Rect {
            min: bar_min,
            size: Vec2::new(bar.x * fraction, bar.y),
            fill: HP_BAR_FILL,
        },
    );
}

/// Compose and submit one frame
///
/// Returns false when the surface is missing or has no area; the frame is
/// skipped without error.
pub fn render_frame(world: &World, view: &View, surface: Option<&mut dyn RenderSurface>) -> bool {
    let Some(surface) = surface else {
        log::trace!("No render surface, skipping frame");
        return false;
    };
    let mut view = *view;
    view.camera.viewport = surface.size();
    if view.camera.is_degenerate() {
        log::trace!("Render surface has no area, skipping frame");
        return false;
    }

    let list = compose(world, &view);
    surface.submit(&list);
    true
}
