// Designation scanner.
//
// Walks a region top-down (z descending, then y, then x) and resolves at
// most one pending request per tile: a dig if there is one (and it is not
// held back by the "dig marked" marker), otherwise a smoothing, otherwise a
// track carve. Top-down order matters for channels: the ramp a channel digs
// below itself is in place before the scan reaches that level.
//
// Designation bits are cleared only where the request succeeded: a channel
// that ramps the level below leaves that level's own request in place for
// the scan to reach. Each dug tile is rolled for an item as soon as it is
// dug.

use crate::config::BoulderPercents;
use crate::connectivity::{carve_tile, refresh_adjacent_smooth_walls, smooth_tile};
use crate::designation::{DigKind, SmoothLevel};
use crate::tiletype::Connectivity;
use crate::transition::{DugTiles, Excavator};
use crate::types::{Cuboid, MapPos};
use crate::yields::{rolls_item, DugTileRecord, PercentRoll, YieldBatch};
use serde::Serialize;

/// Everything one scan changed.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ScanOutcome {
    pub dug: Vec<DugTileRecord>,
    pub smoothed: Vec<MapPos>,
    /// Subset of `smoothed` that was designated for engraving.
    pub engraved: Vec<MapPos>,
    pub carved: Vec<MapPos>,
    pub yields: YieldBatch,
}

pub fn scan_region(
    excavator: &mut Excavator<'_>,
    region: Cuboid,
    percents: &BoulderPercents,
    rng: &mut dyn PercentRoll,
    outcome: &mut ScanOutcome,
) {
    for pos in region.iter_top_down() {
        let Some(tile) = excavator.cache().tile(pos) else {
            continue;
        };
        let designation = tile.designation;
        let occupancy = tile.occupancy;

        if designation.dig != DigKind::None && !occupancy.dig_marked {
            let mut dug = DugTiles::new();
            if !excavator.dig_tile(pos, designation.dig, &mut dug) {
                continue;
            }
            tracing::debug!(%pos, kind = ?designation.dig, tiles = dug.len(), "dig designation resolved");
            let cache = excavator.cache();
            cache.update(pos, |t| t.designation.dig = DigKind::None);
            for record in dug {
                refresh_adjacent_smooth_walls(cache, record.pos);
                if rolls_item(percents, rng, &record) {
                    outcome.yields.push(&record);
                }
                outcome.dug.push(record);
            }
        } else if designation.smooth != SmoothLevel::None {
            let cache = excavator.cache();
            if !smooth_tile(cache, pos) {
                continue;
            }
            cache.update(pos, |t| t.designation.smooth = SmoothLevel::None);
            outcome.smoothed.push(pos);
            if designation.smooth == SmoothLevel::Engrave {
                outcome.engraved.push(pos);
            }
            tracing::trace!(%pos, level = ?designation.smooth, "tile smoothed");
        } else if !occupancy.carve_track.is_empty() {
            let cache = excavator.cache();
            if !carve_tile(cache, pos, occupancy.carve_track) {
                continue;
            }
            cache.update(pos, |t| t.occupancy.carve_track = Connectivity::NONE);
            outcome.carved.push(pos);
            tracing::trace!(%pos, dirs = ?occupancy.carve_track, "track carved");
        }
    }
}
