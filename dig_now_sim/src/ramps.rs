// Ramp consistency.
//
// A ramp is only climbable against a wall. After any structural change the
// changed tile and its orthogonal neighbours are re-checked; a ramp with no
// orthogonal wall left loses its ramp top and is demoted to a floor.

use crate::cache::TileCache;
use crate::tiletype::{TileShape, TileType};
use crate::transition::set_dug_type;
use crate::types::{Direction, MapPos};

/// Turn a ramp top at `pos` back into open space. Anything else is left alone.
pub fn remove_ramp_top(cache: &mut TileCache<'_>, pos: MapPos) -> bool {
    match cache.tile_type(pos) {
        Some(t) if t.shape() == TileShape::RampTop => {
            set_dug_type(cache, pos, TileType::open_space())
        }
        _ => false,
    }
}

fn has_wall_neighbor(cache: &mut TileCache<'_>, pos: MapPos) -> bool {
    Direction::ALL
        .into_iter()
        .any(|dir| cache.tile_type(pos.step(dir)).is_some_and(|t| t.is_wall()))
}

/// Demote the ramp at `pos` if nothing holds it up. Returns `true` if it was
/// demoted.
pub fn clean_ramp(cache: &mut TileCache<'_>, pos: MapPos) -> bool {
    let Some(tile_type) = cache.tile_type(pos) else {
        return false;
    };
    if tile_type.shape() != TileShape::Ramp || has_wall_neighbor(cache, pos) {
        return false;
    }
    remove_ramp_top(cache, pos.above());
    match tile_type.similar(TileShape::Floor) {
        Some(floor) => {
            tracing::trace!(%pos, "ramp without wall demoted to floor");
            set_dug_type(cache, pos, floor)
        }
        None => false,
    }
}

/// Check `pos` and its four orthogonal neighbours. Returns how many ramps
/// were demoted.
pub fn clean_ramps(cache: &mut TileCache<'_>, pos: MapPos) -> usize {
    let mut demoted = 0;
    for target in std::iter::once(pos).chain(Direction::ALL.map(|d| pos.step(d))) {
        if clean_ramp(cache, target) {
            demoted += 1;
        }
    }
    demoted
}
