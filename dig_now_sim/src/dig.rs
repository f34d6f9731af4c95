// The dig-now entry point.
//
// One call resolves every pending dig, smooth and track designation in a
// region instantly, as if a crew had finished the work this tick:
//
// 1. Validate the config and check that a map and a living agent exist.
//    Either missing is fatal, and nothing has been touched yet.
// 2. Scan the region through a `TileCache` overlay (`scanner.rs`).
// 3. Reveal dug tiles that are still hidden, then flush the overlay in one
//    write-back and flag pathing for recompute.
// 4. Destroy vermin colonies under new ramp tops, drop units and items that
//    lost their footing, and produce the rolled items (`fall.rs`).
//
// Everything the pass did comes back in a `DigReport`.

use crate::cache::TileCache;
use crate::config::DigConfig;
use crate::entities::EntityStore;
use crate::error::{DigError, Diagnostic};
use crate::fall::{place_yields, relocate_unsupported, reveal_dug_tiles};
use crate::grid::GridStore;
use crate::prng::DigRng;
use crate::scanner::{scan_region, ScanOutcome};
use crate::transition::Excavator;
use crate::types::{Cuboid, MapPos};
use crate::yields::{DugTileRecord, PercentRoll, YieldBatch};
use serde::Serialize;

/// Summary of one dig-now pass.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DigReport {
    /// The region actually scanned, after clamping to the map.
    pub region: Option<Cuboid>,
    pub dug: Vec<DugTileRecord>,
    pub smoothed: Vec<MapPos>,
    pub engraved: Vec<MapPos>,
    pub carved: Vec<MapPos>,
    pub yields: YieldBatch,
    pub items_produced: usize,
    pub items_placed: usize,
    pub units_moved: usize,
    pub items_moved: usize,
    pub colonies_destroyed: usize,
    pub tiles_written: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl DigReport {
    pub fn dug_positions(&self) -> impl Iterator<Item = MapPos> + '_ {
        self.dug.iter().map(|r| r.pos)
    }
}

/// Resolve every pending designation in the configured region.
pub fn dig_now<G, E, R>(
    grid: &mut G,
    entities: &mut E,
    config: &DigConfig,
    rng: &mut R,
) -> Result<DigReport, DigError>
where
    G: GridStore,
    E: EntityStore,
    R: PercentRoll,
{
    config.validate()?;
    if !grid.is_loaded() {
        return Err(DigError::MapUnavailable);
    }
    let agent = entities
        .first_living_agent()
        .ok_or(DigError::NoLivingAgent)?;

    let dims = grid.dimensions();
    let region = match config.region {
        Some(region) => region.clamp_to(dims),
        None => dims.full_region(),
    };

    let mut scan = ScanOutcome::default();
    let mut excavator = Excavator::new(TileCache::new(grid));
    if let Some(region) = region {
        scan_region(
            &mut excavator,
            region,
            &config.boulder_percents,
            rng,
            &mut scan,
        );
    }
    reveal_dug_tiles(excavator.cache(), &scan.dug);
    let (cache, mut diagnostics, colony_sites) = excavator.into_parts();
    let tiles_written = cache.flush();
    grid.request_pathing_recompute();

    let colonies_destroyed = colony_sites
        .iter()
        .map(|&pos| entities.destroy_vermin_colonies_at(pos))
        .sum();
    let moved = relocate_unsupported(grid, entities, &scan.dug, &mut diagnostics);
    let placement = place_yields(
        grid,
        entities,
        agent,
        &scan.yields,
        config.dump_pos,
        config.max_items_per_batch,
        &mut diagnostics,
    );

    let report = DigReport {
        region,
        dug: scan.dug,
        smoothed: scan.smoothed,
        engraved: scan.engraved,
        carved: scan.carved,
        yields: scan.yields,
        items_produced: placement.produced,
        items_placed: placement.placed,
        units_moved: moved.units,
        items_moved: moved.items,
        colonies_destroyed,
        tiles_written,
        diagnostics: diagnostics.into_vec(),
    };
    tracing::info!(
        dug = report.dug.len(),
        smoothed = report.smoothed.len(),
        carved = report.carved.len(),
        items = report.items_placed,
        diagnostics = report.diagnostics.len(),
        "dig-now pass complete"
    );
    Ok(report)
}

/// `dig_now` with rolls drawn from a `DigRng` seeded from `config.seed`.
pub fn dig_now_seeded<G, E>(
    grid: &mut G,
    entities: &mut E,
    config: &DigConfig,
) -> Result<DigReport, DigError>
where
    G: GridStore,
    E: EntityStore,
{
    let mut rng = DigRng::new(config.seed);
    dig_now(grid, entities, config, &mut rng)
}
