// Connectivity resolver for smoothed walls and carved tracks.
//
// Smooth walls draw as joined runs: each one records which orthogonal
// neighbours are smooth walls too, and the link is kept symmetric. The tile
// catalog only has smooth walls with at least two connections, so a wall
// with fewer is padded with an opposite pair (north-south if it touches
// anything on that axis, east-west otherwise).
//
// Tracks keep the union of every direction ever carved into the tile.
//
// Every function leaves the tile untouched when no catalog entry matches the
// resulting tuple.

use crate::cache::TileCache;
use crate::classify::{is_smooth_wall, is_smoothable, is_trackable};
use crate::tiletype::{Connectivity, TileSpecial, TileType};
use crate::types::{Direction, MapPos};
use smallvec::SmallVec;

/// Pad a smooth-wall connection set up to a pair the catalog can resolve.
pub fn ensure_wall_pair(mut conn: Connectivity) -> Connectivity {
    if conn.count() >= 2 {
        return conn;
    }
    if conn.contains(Direction::North) || conn.contains(Direction::South) {
        conn.insert(Direction::North);
        conn.insert(Direction::South);
    } else {
        conn.insert(Direction::East);
        conn.insert(Direction::West);
    }
    conn
}

fn set_if_changed(cache: &mut TileCache<'_>, pos: MapPos, old: TileType, new: TileType) -> bool {
    new != old && cache.set_tile_type(pos, new)
}

/// Add (or drop) the connection from the smooth wall at `pos` toward `dir`.
fn relink(cache: &mut TileCache<'_>, pos: MapPos, dir: Direction, connected: bool) -> bool {
    let Some(tile_type) = cache.tile_type(pos) else {
        return false;
    };
    if !is_smooth_wall(tile_type) {
        return false;
    }
    let mut conn = tile_type.connectivity();
    if connected {
        conn.insert(dir);
    } else {
        conn.remove(dir);
    }
    match tile_type.with_finish(TileSpecial::Smooth, ensure_wall_pair(conn)) {
        Some(relinked) => set_if_changed(cache, pos, tile_type, relinked),
        None => false,
    }
}

/// Smooth the wall or floor at `pos`. Returns `false` when the tile cannot be
/// smoothed.
pub fn smooth_tile(cache: &mut TileCache<'_>, pos: MapPos) -> bool {
    let Some(tile_type) = cache.tile_type(pos) else {
        return false;
    };
    if !is_smoothable(tile_type) {
        return false;
    }

    let mut linked: SmallVec<[Direction; 4]> = SmallVec::new();
    let target = if tile_type.is_wall() {
        for dir in Direction::ALL {
            if cache.tile_type(pos.step(dir)).is_some_and(is_smooth_wall) {
                linked.push(dir);
            }
        }
        let conn = ensure_wall_pair(Connectivity::from_directions(linked.iter().copied()));
        tile_type.with_finish(TileSpecial::Smooth, conn)
    } else {
        tile_type.with_finish(TileSpecial::Smooth, Connectivity::NONE)
    };
    let Some(target) = target else {
        return false;
    };
    if !set_if_changed(cache, pos, tile_type, target) {
        return false;
    }
    for dir in linked {
        relink(cache, pos.step(dir), dir.opposite(), true);
    }
    true
}

/// Carve `dirs` into the floor or ramp at `pos`.
pub fn carve_tile(cache: &mut TileCache<'_>, pos: MapPos, dirs: Connectivity) -> bool {
    let Some(tile_type) = cache.tile_type(pos) else {
        return false;
    };
    if !is_trackable(tile_type) || dirs.is_empty() {
        return false;
    }
    let existing = if tile_type.special() == TileSpecial::Track {
        tile_type.connectivity()
    } else {
        Connectivity::NONE
    };
    match tile_type.with_finish(TileSpecial::Track, existing.union(dirs)) {
        Some(target) => set_if_changed(cache, pos, tile_type, target),
        None => false,
    }
}

/// Re-resolve the smooth walls around `pos` after it changed shape. Returns
/// how many neighbours changed.
pub fn refresh_adjacent_smooth_walls(cache: &mut TileCache<'_>, pos: MapPos) -> usize {
    let here_smooth = cache.tile_type(pos).is_some_and(is_smooth_wall);
    Direction::ALL
        .into_iter()
        .filter(|&dir| relink(cache, pos.step(dir), dir.opposite(), here_smooth))
        .count()
}
