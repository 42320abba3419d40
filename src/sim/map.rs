//! Arena layout generation
//!
//! Each named map has a fixed skeleton (boundary, rooms, hallways, central
//! feature) that is identical on every generation, plus a random scatter of
//! obstacles. A square around the origin is always left clear so the
//! safe-spawn fallback lands somewhere walkable.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{circles_overlap, closest_point_on_rect, rects_overlap};
use super::state::{Decoration, DecorationKind, Wall};
use crate::consts::*;

/// Named arena layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapName {
    ErindalePark,
    Wasteland,
}

impl MapName {
    pub const ALL: [MapName; 2] = [MapName::ErindalePark, MapName::Wasteland];

    pub fn display_name(&self) -> &'static str {
        match self {
            MapName::ErindalePark => "Erindale Park",
            MapName::Wasteland => "Wasteland",
        }
    }

    /// Half the side length of the square arena
    pub fn half_extent(&self) -> f32 {
        match self {
            MapName::ErindalePark => 1500.0,
            MapName::Wasteland => 2000.0,
        }
    }

    /// Pick a layout for a theme string (defaults to Erindale Park)
    pub fn from_theme(theme: &str) -> Self {
        let theme = theme.to_lowercase();
        if ["waste", "desert", "dust", "sand", "cactus"]
            .iter()
            .any(|k| theme.contains(k))
        {
            MapName::Wasteland
        } else {
            MapName::ErindalePark
        }
    }
}

/// Wasteland's barricaded central arena (half size)
pub const WASTELAND_ARENA: f32 = 400.0;

/// Scatter obstacles per map
const PARK_SCATTER: u32 = 30;
const WASTELAND_SCATTER: u32 = 35;
/// Rejection padding between scattered obstacles and existing geometry
const SCATTER_PADDING: f32 = 40.0;
const CACTUS_COUNT: u32 = 45;
const CACTUS_BASE_RADIUS: f32 = 14.0;

/// Horizontal wall centered on `y` spanning `x0..x1`
fn hwall(x0: f32, x1: f32, y: f32, thickness: f32, is_low: bool) -> Wall {
    Wall::new(x0.min(x1), y - thickness / 2.0, (x1 - x0).abs(), thickness, is_low)
}

/// Vertical wall centered on `x` spanning `y0..y1`
fn vwall(x: f32, y0: f32, y1: f32, thickness: f32, is_low: bool) -> Wall {
    Wall::new(x - thickness / 2.0, y0.min(y1), thickness, (y1 - y0).abs(), is_low)
}

/// Horizontal wall with a centered door gap
fn hwall_with_door(x0: f32, x1: f32, y: f32, thickness: f32, gap: f32, is_low: bool) -> [Wall; 2] {
    let (lo, hi) = (x0.min(x1), x0.max(x1));
    let mid = (lo + hi) / 2.0;
    [
        hwall(lo, mid - gap / 2.0, y, thickness, is_low),
        hwall(mid + gap / 2.0, hi, y, thickness, is_low),
    ]
}

/// Vertical wall with a centered door gap
fn vwall_with_door(x: f32, y0: f32, y1: f32, thickness: f32, gap: f32, is_low: bool) -> [Wall; 2] {
    let (lo, hi) = (y0.min(y1), y0.max(y1));
    let mid = (lo + hi) / 2.0;
    [
        vwall(x, lo, mid - gap / 2.0, thickness, is_low),
        vwall(x, mid + gap / 2.0, hi, thickness, is_low),
    ]
}

fn boundary(size: f32) -> [Wall; 4] {
    let t = BOUNDARY_THICKNESS;
    [
        Wall::new(-size, -size, size * 2.0, t, false),
        Wall::new(-size, size - t, size * 2.0, t, false),
        Wall::new(-size, -size, t, size * 2.0, false),
        Wall::new(size - t, -size, t, size * 2.0, false),
    ]
}

/// Box kept free of geometry around the origin
pub fn origin_clearing() -> Wall {
    Wall::new(
        -ORIGIN_CLEARING,
        -ORIGIN_CLEARING,
        ORIGIN_CLEARING * 2.0,
        ORIGIN_CLEARING * 2.0,
        false,
    )
}

const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)];

fn erindale_skeleton() -> Vec<Wall> {
    let size = MapName::ErindalePark.half_extent();
    let mut walls = boundary(size).to_vec();

    // Corner rooms: two inner walls each, both with a door
    let room = 350.0;
    let t = 20.0;
    let door = 90.0;
    for (sx, sy) in CORNERS {
        let inner_x = sx * (size - room);
        let inner_y = sy * (size - room);
        walls.extend(vwall_with_door(inner_x, inner_y, sy * size, t, door, false));
        walls.extend(hwall_with_door(inner_x, sx * size, inner_y, t, door, false));
    }

    // Hallway spines
    for sy in [-1.0, 1.0] {
        walls.extend(hwall_with_door(-800.0, 800.0, sy * 520.0, t, 160.0, false));
    }
    for sx in [-1.0, 1.0] {
        walls.extend(vwall_with_door(sx * 900.0, -400.0, 400.0, t, 120.0, false));
    }

    // Fountain plaza: four low planters around the origin
    let planter_dist = 200.0;
    let planter_len = 140.0;
    let planter_t = 30.0;
    for s in [-1.0, 1.0] {
        walls.push(hwall(
            -planter_len / 2.0,
            planter_len / 2.0,
            s * planter_dist,
            planter_t,
            true,
        ));
        walls.push(vwall(
            s * planter_dist,
            -planter_len / 2.0,
            planter_len / 2.0,
            planter_t,
            true,
        ));
    }

    walls
}

fn wasteland_skeleton() -> Vec<Wall> {
    let size = MapName::Wasteland.half_extent();
    let mut walls = boundary(size).to_vec();

    // Abandoned buildings, door on the side facing the center
    let (bw, bh) = (400.0, 300.0);
    let t = 25.0;
    let door = 100.0;
    for (sx, sy) in CORNERS {
        let cx = sx * 1100.0;
        let cy = sy * 1100.0;
        let (left, right) = (cx - bw / 2.0, cx + bw / 2.0);
        let (top, bottom) = (cy - bh / 2.0, cy + bh / 2.0);
        let (near_y, far_y) = if sy > 0.0 { (top, bottom) } else { (bottom, top) };

        walls.extend(hwall_with_door(left, right, near_y, t, door, false));
        walls.push(hwall(left, right, far_y, t, false));
        walls.push(vwall(left, top, bottom, t, false));
        walls.push(vwall(right, top, bottom, t, false));
    }

    // Central arena ringed by low barricades with four openings
    let a = WASTELAND_ARENA;
    let t = 20.0;
    let gap = 160.0;
    for s in [-1.0, 1.0] {
        walls.extend(hwall_with_door(-a, a, s * a, t, gap, true));
        walls.extend(vwall_with_door(s * a, -a, a, t, gap, true));
    }

    walls
}

/// Deterministic part of a map
pub fn skeleton(map: MapName) -> Vec<Wall> {
    match map {
        MapName::ErindalePark => erindale_skeleton(),
        MapName::Wasteland => wasteland_skeleton(),
    }
}

/// Skeleton plus randomized obstacle scatter
pub fn generate_walls(map: MapName, rng: &mut impl Rng) -> Vec<Wall> {
    let mut walls = skeleton(map);
    let (count, low_chance, min_size, max_size) = match map {
        MapName::ErindalePark => (PARK_SCATTER, 0.35, 40.0, 110.0),
        MapName::Wasteland => (WASTELAND_SCATTER, 0.4, 50.0, 140.0),
    };
    scatter_obstacles(&mut walls, map, count, low_chance, min_size, max_size, rng);
    walls
}

fn scatter_obstacles(
    walls: &mut Vec<Wall>,
    map: MapName,
    count: u32,
    low_chance: f64,
    min_size: f32,
    max_size: f32,
    rng: &mut impl Rng,
) {
    let reach = map.half_extent() - BOUNDARY_THICKNESS - SCATTER_PADDING;
    let clearing = origin_clearing();
    let mut placed = 0;

    for _ in 0..count * 10 {
        if placed >= count {
            break;
        }
        let w = rng.random_range(min_size..max_size);
        let h = rng.random_range(min_size..max_size);
        let x = rng.random_range(-reach..reach - w);
        let y = rng.random_range(-reach..reach - h);
        let candidate = Wall::new(x, y, w, h, rng.random_bool(low_chance));

        if rects_overlap(&candidate, &clearing, 0.0) {
            continue;
        }
        if walls
            .iter()
            .any(|wall| rects_overlap(&candidate, wall, SCATTER_PADDING))
        {
            continue;
        }
        walls.push(candidate);
        placed += 1;
    }

    log::debug!("{}: scattered {placed}/{count} obstacles", map.display_name());
}

/// Collidable cacti for Wasteland (other maps have none)
pub fn generate_decorations(map: MapName, walls: &[Wall], rng: &mut impl Rng) -> Vec<Decoration> {
    if map != MapName::Wasteland {
        return Vec::new();
    }

    let reach = map.half_extent() - BOUNDARY_THICKNESS - 60.0;
    let arena = WASTELAND_ARENA + 40.0;
    let mut cacti: Vec<Decoration> = Vec::new();

    for _ in 0..CACTUS_COUNT * 10 {
        if cacti.len() as u32 >= CACTUS_COUNT {
            break;
        }
        let pos = Vec2::new(rng.random_range(-reach..reach), rng.random_range(-reach..reach));
        let scale = rng.random_range(0.8..1.4);
        let rotation = rng.random_range(-0.3..0.3);
        let radius = CACTUS_BASE_RADIUS * scale;

        if pos.x.abs() < arena && pos.y.abs() < arena {
            continue;
        }
        let hits_wall = walls
            .iter()
            .any(|wall| closest_point_on_rect(pos, wall).distance(pos) < radius + 10.0);
        if hits_wall {
            continue;
        }
        if cacti
            .iter()
            .any(|c| circles_overlap(c.pos, c.radius + 20.0, pos, radius))
        {
            continue;
        }

        cacti.push(Decoration {
            pos,
            kind: DecorationKind::Cactus,
            scale,
            rotation,
            radius,
        });
    }

    cacti
}

/// Random walkable spawn point, or the origin if every sample collides
pub fn find_safe_spawn_position(walls: &[Wall], map: MapName, rng: &mut impl Rng) -> Vec2 {
    let reach = map.half_extent() - SPAWN_PADDING;
    let r = PLAYER_RADIUS;

    for _ in 0..SPAWN_ATTEMPTS {
        let pos = Vec2::new(rng.random_range(-reach..=reach), rng.random_range(-reach..=reach));
        let footprint = Wall::new(pos.x - r, pos.y - r, r * 2.0, r * 2.0, false);
        if !walls.iter().any(|wall| rects_overlap(&footprint, wall, 0.0)) {
            return pos;
        }
    }

    log::warn!(
        "No safe spawn found on {} after {} attempts, using origin",
        map.display_name(),
        SPAWN_ATTEMPTS
    );
    Vec2::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_skeleton_identical_across_seeds() {
        for map in MapName::ALL {
            let base = skeleton(map);
            let a = generate_walls(map, &mut Pcg32::seed_from_u64(1));
            let b = generate_walls(map, &mut Pcg32::seed_from_u64(2));
            assert_eq!(&a[..base.len()], &base[..]);
            assert_eq!(&b[..base.len()], &base[..]);
            // Scatter differs between seeds
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_same_seed_reproduces_layout() {
        let a = generate_walls(MapName::Wasteland, &mut Pcg32::seed_from_u64(7));
        let b = generate_walls(MapName::Wasteland, &mut Pcg32::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_origin_is_always_clear() {
        let clearing = origin_clearing();
        for seed in 0..20 {
            for map in MapName::ALL {
                let walls = generate_walls(map, &mut Pcg32::seed_from_u64(seed));
                assert!(
                    walls.iter().all(|w| !rects_overlap(w, &clearing, 0.0)),
                    "{} seed {seed} blocks the origin",
                    map.display_name()
                );
            }
        }
    }

    #[test]
    fn test_scatter_respects_padding() {
        let mut rng = Pcg32::seed_from_u64(3);
        let walls = generate_walls(MapName::ErindalePark, &mut rng);
        let skeleton_len = skeleton(MapName::ErindalePark).len();
        for (i, a) in walls.iter().enumerate().skip(skeleton_len) {
            for b in &walls[..i] {
                assert!(!rects_overlap(a, b, SCATTER_PADDING));
            }
        }
    }

    #[test]
    fn test_cacti_only_on_wasteland_and_outside_arena() {
        let mut rng = Pcg32::seed_from_u64(11);
        let walls = generate_walls(MapName::ErindalePark, &mut rng);
        assert!(generate_decorations(MapName::ErindalePark, &walls, &mut rng).is_empty());

        let walls = generate_walls(MapName::Wasteland, &mut rng);
        let cacti = generate_decorations(MapName::Wasteland, &walls, &mut rng);
        assert!(!cacti.is_empty());
        for cactus in &cacti {
            assert!(cactus.is_cactus());
            assert!(cactus.pos.x.abs() >= WASTELAND_ARENA || cactus.pos.y.abs() >= WASTELAND_ARENA);
        }
    }

    #[test]
    fn test_safe_spawn_on_open_map_is_in_bounds() {
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let pos = find_safe_spawn_position(&[], MapName::ErindalePark, &mut rng);
            let reach = MapName::ErindalePark.half_extent() - SPAWN_PADDING;
            assert!(pos.x.abs() <= reach && pos.y.abs() <= reach);
        }
    }

    #[test]
    fn test_safe_spawn_falls_back_to_origin() {
        // One wall covering the whole map
        let size = MapName::Wasteland.half_extent();
        let walls = [Wall::new(-size, -size, size * 2.0, size * 2.0, false)];
        let pos = find_safe_spawn_position(&walls, MapName::Wasteland, &mut Pcg32::seed_from_u64(5));
        assert_eq!(pos, Vec2::ZERO);
    }

    #[test]
    fn test_from_theme() {
        assert_eq!(MapName::from_theme("Wasteland"), MapName::Wasteland);
        assert_eq!(MapName::from_theme("Desert Storm"), MapName::Wasteland);
        assert_eq!(MapName::from_theme("Erindale Park"), MapName::ErindalePark);
        assert_eq!(MapName::from_theme("neon city"), MapName::ErindalePark);
    }
}
