// Vertical propagation of environment flags.
//
// Light, outside and subterranean are per-tile flags that describe what is
// above a tile. Opening a shaft changes them for everything below it, so
// after a successful dig the flags are pushed straight down through open
// space and ramp tops until something solid stops them.

use crate::cache::TileCache;
use crate::designation::EnvironmentFlags;
use crate::tiletype::TileShape;
use crate::types::MapPos;

/// Push the environment flags at `pos` downward. A tile with no block above
/// it is under open sky. Returns how many tiles below were updated.
pub fn propagate_vertical_flags(cache: &mut TileCache<'_>, pos: MapPos) -> usize {
    let Some(designation) = cache.designation(pos) else {
        return 0;
    };
    let mut flags = designation.environment();
    if !cache.block_exists(pos.above()) {
        flags = EnvironmentFlags::OPEN_SKY;
        if designation.environment() != flags {
            cache.update(pos, |t| t.designation.set_environment(flags));
        }
    }

    let mut updated = 0;
    let mut current = pos;
    while let Some(tile_type) = cache.tile_type(current) {
        if !matches!(tile_type.shape(), TileShape::OpenSpace | TileShape::RampTop) {
            break;
        }
        let below = current.below();
        let Some(below_designation) = cache.designation(below) else {
            break;
        };
        // Already carries the same flags, so everything further down does too.
        if below_designation.environment() == flags {
            break;
        }
        cache.update(below, |t| t.designation.set_environment(flags));
        updated += 1;
        current = below;
    }
    updated
}
