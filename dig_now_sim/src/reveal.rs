// Hidden-tile reveal.
//
// Digging into unexplored rock exposes whatever the new opening can see.
// `flood_unhide` walks outward from a freshly dug tile with an explicit
// worklist: every hidden neighbour on the level is revealed, and the fill
// continues from it unless it is a solid wall. Vertically the fill drops
// through low-passable tiles (open space, ramp tops, down stairs) and climbs
// into the level above where that tile is low-passable.
//
// Revealing only ever clears the hidden flag, so running the fill twice from
// the same tile reveals nothing new the second time.

use crate::cache::TileCache;
use crate::classify::blocks_reveal;
use crate::types::MapPos;
use std::collections::{BTreeSet, VecDeque};

/// Clear the hidden flag at `pos`. Returns `true` only if it was set.
pub fn unhide(cache: &mut TileCache<'_>, pos: MapPos) -> bool {
    match cache.designation(pos) {
        Some(d) if d.hidden => cache.update(pos, |t| t.designation.hidden = false),
        _ => false,
    }
}

/// Reveal everything connected to `origin`. Returns the number of tiles
/// revealed (not counting `origin` itself).
pub fn flood_unhide(cache: &mut TileCache<'_>, origin: MapPos) -> usize {
    let mut queue = VecDeque::from([origin]);
    let mut visited = BTreeSet::from([origin]);
    let mut revealed = 0;

    while let Some(current) = queue.pop_front() {
        let Some(tile_type) = cache.tile_type(current) else {
            continue;
        };
        if blocks_reveal(tile_type) {
            continue;
        }

        let mut opened = Vec::with_capacity(10);
        for neighbor in current.level_neighbors() {
            if unhide(cache, neighbor) {
                opened.push(neighbor);
            }
        }
        let below = current.below();
        if tile_type.shape().is_low_passable() && unhide(cache, below) {
            opened.push(below);
        }
        let above = current.above();
        let above_passable = cache
            .tile_type(above)
            .is_some_and(|t| t.shape().is_low_passable());
        if above_passable && unhide(cache, above) {
            opened.push(above);
        }

        for pos in opened {
            revealed += 1;
            if visited.insert(pos) {
                queue.push_back(pos);
            }
        }
    }
    revealed
}
