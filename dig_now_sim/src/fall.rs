// Post-pass settling: reveal, falling entities and item placement.
//
// Runs once the scan is done. Dug tiles that are still hidden get another
// reveal pass while the overlay is open. After the overlay is flushed,
// units and items left standing on tiles that no longer hold them drop to
// the first tile with footing below, and the items the yield roll asked for
// are produced and put on the ground: at the dump position if one is
// configured and valid, otherwise where their source tile's column comes to
// rest.
//
// Entity moves write the unit/item occupancy bits straight to the grid; the
// overlay is gone by then.

use crate::cache::TileCache;
use crate::classify::gives_footing;
use crate::entities::{EntityStore, UnitId};
use crate::error::{Diagnostic, Diagnostics};
use crate::grid::{GridStore, MapTile};
use crate::reveal::{flood_unhide, unhide};
use crate::types::MapPos;
use crate::yields::{DugTileRecord, YieldBatch};
use std::collections::BTreeSet;

/// First tile at or below `pos` that gives footing. `None` if the column runs
/// out of blocks first.
pub fn resting_position(grid: &dyn GridStore, pos: MapPos) -> Option<MapPos> {
    let mut current = pos;
    loop {
        let tile = grid.read_tile(current)?;
        if gives_footing(tile.tile_type) {
            return Some(current);
        }
        current = current.below();
    }
}

/// Re-run the reveal from dug tiles that are still hidden. Returns the number
/// of tiles revealed.
pub fn reveal_dug_tiles(cache: &mut TileCache<'_>, dug: &[DugTileRecord]) -> usize {
    let mut revealed = 0;
    for record in dug {
        if unhide(cache, record.pos) {
            revealed += 1 + flood_unhide(cache, record.pos);
        }
    }
    revealed
}

fn update_tile(grid: &mut dyn GridStore, pos: MapPos, f: impl FnOnce(&mut MapTile)) {
    if let Some(mut tile) = grid.read_tile(pos) {
        f(&mut tile);
        grid.write_tile(pos, &tile);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Relocation {
    pub units: usize,
    pub items: usize,
}

/// Drop units and ground items off dug tiles that no longer hold them.
pub fn relocate_unsupported(
    grid: &mut dyn GridStore,
    entities: &mut dyn EntityStore,
    dug: &[DugTileRecord],
    diagnostics: &mut Diagnostics,
) -> Relocation {
    let mut moved = Relocation::default();
    let columns: BTreeSet<MapPos> = dug.iter().map(|r| r.pos).collect();
    for pos in columns {
        let Some(tile) = grid.read_tile(pos) else {
            continue;
        };
        let occupancy = tile.occupancy;
        if !(occupancy.unit || occupancy.item) || gives_footing(tile.tile_type) {
            continue;
        }
        let Some(rest) = resting_position(grid, pos) else {
            diagnostics.report(Diagnostic::NoSupportBeneath { pos });
            continue;
        };

        // A bit at `pos` survives while anything it stands for failed to move.
        let (mut units, mut units_stuck) = (0, false);
        if occupancy.unit {
            for unit in entities.units_at(pos) {
                if entities.move_unit(unit, rest) {
                    units += 1;
                } else {
                    units_stuck = true;
                    diagnostics.report(Diagnostic::UnitMoveFailed { unit, from: pos, to: rest });
                }
            }
        }
        let (mut items, mut items_stuck) = (0, false);
        if occupancy.item {
            for item in entities.items_on_ground_at(pos) {
                if entities.move_item_to_ground(item, rest) {
                    items += 1;
                } else {
                    items_stuck = true;
                    diagnostics.report(Diagnostic::ItemMoveFailed { item, from: pos, to: rest });
                }
            }
        }
        update_tile(grid, pos, |t| {
            t.occupancy.unit &= units_stuck;
            t.occupancy.item &= items_stuck;
        });
        update_tile(grid, rest, |t| {
            t.occupancy.unit |= units > 0;
            t.occupancy.item |= items > 0;
        });
        tracing::debug!(from = %pos, to = %rest, units, items, "entities fell");
        moved.units += units;
        moved.items += items;
    }
    moved
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placement {
    pub produced: usize,
    pub placed: usize,
}

/// Where dumped items go, or `None` (with a diagnostic) if `dump` is unusable.
fn dump_resting_position(
    grid: &dyn GridStore,
    dump: MapPos,
    diagnostics: &mut Diagnostics,
) -> Option<MapPos> {
    let rest = if grid.dimensions().contains(dump) {
        resting_position(grid, dump)
    } else {
        None
    };
    if rest.is_none() {
        diagnostics.report(Diagnostic::InvalidDumpPosition { pos: dump });
    }
    rest
}

/// Produce every item in `batch` and put it on the ground.
pub fn place_yields(
    grid: &mut dyn GridStore,
    entities: &mut dyn EntityStore,
    agent: UnitId,
    batch: &YieldBatch,
    dump: Option<MapPos>,
    max_items_per_batch: u32,
    diagnostics: &mut Diagnostics,
) -> Placement {
    let mut placement = Placement::default();
    if batch.is_empty() {
        return placement;
    }
    let dump_rest = dump.and_then(|d| dump_resting_position(grid, d, diagnostics));
    let cap = max_items_per_batch.max(1) as usize;

    for (kind, material, positions) in batch.iter() {
        let mut items = Vec::with_capacity(positions.len());
        let mut remaining = positions.len();
        while remaining > 0 {
            let request = remaining.min(cap);
            remaining -= request;
            items.extend(entities.produce_items(agent, kind, material, request as u32));
        }
        if items.len() != positions.len() {
            diagnostics.report(Diagnostic::ItemCountMismatch {
                kind,
                material,
                expected: positions.len(),
                produced: items.len(),
            });
        }
        placement.produced += items.len();

        for (&item, &source) in items.iter().zip(positions) {
            let target = dump_rest.or_else(|| resting_position(grid, source));
            let placed = target.is_some_and(|t| entities.move_item_to_ground(item, t));
            match target {
                Some(t) if placed => {
                    update_tile(grid, t, |tile| tile.occupancy.item = true);
                    placement.placed += 1;
                }
                _ => diagnostics.report(Diagnostic::ItemPlacementFailed {
                    kind,
                    source_pos: source,
                }),
            }
        }
    }
    placement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityLedger, ItemId, ItemKind};
    use crate::grid::MaterialIndex;
    use crate::tiletype::{TileMaterial, TileShape};
    use crate::types::Cuboid;
    use crate::grid::VeinCategory;
    use crate::world::TileWorld;

    fn floor() -> MapTile {
        MapTile::natural(TileShape::Floor, TileMaterial::Stone, Some(0)).unwrap()
    }

    /// Floor at z=0, open above.
    fn pit_world() -> TileWorld {
        let mut world = TileWorld::new(4, 4, 4);
        world.fill(Cuboid::new(MapPos::new(0, 0, 0), MapPos::new(3, 3, 0)), floor());
        world
    }

    fn record(pos: MapPos, material: u32) -> DugTileRecord {
        DugTileRecord {
            pos,
            material: TileMaterial::Stone,
            vein: VeinCategory::Layer,
            item_kind: ItemKind::Boulder,
            item_material: Some(material),
        }
    }

    #[test]
    fn resting_position_scans_down_to_footing() {
        let world = pit_world();
        assert_eq!(
            resting_position(&world, MapPos::new(1, 1, 3)),
            Some(MapPos::new(1, 1, 0))
        );
        assert_eq!(
            resting_position(&world, MapPos::new(1, 1, 0)),
            Some(MapPos::new(1, 1, 0))
        );
        let empty = TileWorld::new(2, 2, 2);
        assert_eq!(resting_position(&empty, MapPos::new(0, 0, 1)), None);
    }

    #[test]
    fn units_and_items_fall_to_the_floor() {
        let mut world = pit_world();
        let mut ledger = EntityLedger::new();
        let pos = MapPos::new(2, 2, 2);
        let unit = ledger.add_unit(pos, true);
        let item = ledger.add_item_on_ground(ItemKind::Boulder, 1, pos);
        let tile = world.tile_mut(pos).unwrap();
        tile.occupancy.unit = true;
        tile.occupancy.item = true;

        let mut diags = Diagnostics::default();
        let moved = relocate_unsupported(&mut world, &mut ledger, &[record(pos, 0)], &mut diags);
        assert_eq!(moved, Relocation { units: 1, items: 1 });
        let rest = MapPos::new(2, 2, 0);
        assert_eq!(ledger.unit(unit).unwrap().pos, rest);
        assert_eq!(ledger.item(item).unwrap().pos, Some(rest));
        assert!(world.tile(rest).unwrap().occupancy.unit);
        assert!(!world.tile(pos).unwrap().occupancy.unit);
        assert!(diags.entries().is_empty());
    }

    /// Ledger whose units refuse to move.
    struct PinnedUnits(EntityLedger);

    impl EntityStore for PinnedUnits {
        fn first_living_agent(&self) -> Option<UnitId> {
            self.0.first_living_agent()
        }
        fn units_at(&self, pos: MapPos) -> Vec<UnitId> {
            self.0.units_at(pos)
        }
        fn move_unit(&mut self, _unit: UnitId, _to: MapPos) -> bool {
            false
        }
        fn items_on_ground_at(&self, pos: MapPos) -> Vec<ItemId> {
            self.0.items_on_ground_at(pos)
        }
        fn move_item_to_ground(&mut self, item: ItemId, to: MapPos) -> bool {
            self.0.move_item_to_ground(item, to)
        }
        fn produce_items(
            &mut self,
            agent: UnitId,
            kind: ItemKind,
            material: MaterialIndex,
            count: u32,
        ) -> Vec<ItemId> {
            self.0.produce_items(agent, kind, material, count)
        }
        fn destroy_vermin_colonies_at(&mut self, pos: MapPos) -> usize {
            self.0.destroy_vermin_colonies_at(pos)
        }
    }

    #[test]
    fn failed_move_keeps_the_entity_and_its_bit() {
        let mut world = pit_world();
        let mut ledger = EntityLedger::new();
        let pos = MapPos::new(2, 2, 2);
        let unit = ledger.add_unit(pos, true);
        let item = ledger.add_item_on_ground(ItemKind::Boulder, 1, pos);
        let tile = world.tile_mut(pos).unwrap();
        tile.occupancy.unit = true;
        tile.occupancy.item = true;

        let mut store = PinnedUnits(ledger);
        let mut diags = Diagnostics::default();
        let moved = relocate_unsupported(&mut world, &mut store, &[record(pos, 0)], &mut diags);
        assert_eq!(moved, Relocation { units: 0, items: 1 });
        let rest = MapPos::new(2, 2, 0);
        assert_eq!(store.0.unit(unit).unwrap().pos, pos);
        assert_eq!(store.0.item(item).unwrap().pos, Some(rest));

        let here = world.tile(pos).unwrap().occupancy;
        assert!(here.unit);
        assert!(!here.item);
        let below = world.tile(rest).unwrap().occupancy;
        assert!(!below.unit);
        assert!(below.item);
        assert_eq!(
            diags.entries(),
            &[Diagnostic::UnitMoveFailed { unit, from: pos, to: rest }]
        );
    }

    #[test]
    fn supported_tiles_are_left_alone() {
        let mut world = pit_world();
        let mut ledger = EntityLedger::new();
        let pos = MapPos::new(1, 1, 0);
        let unit = ledger.add_unit(pos, true);
        world.tile_mut(pos).unwrap().occupancy.unit = true;
        let mut diags = Diagnostics::default();
        let moved = relocate_unsupported(&mut world, &mut ledger, &[record(pos, 0)], &mut diags);
        assert_eq!(moved, Relocation::default());
        assert_eq!(ledger.unit(unit).unwrap().pos, pos);
    }

    #[test]
    fn bottomless_column_is_reported() {
        let mut world = TileWorld::new(2, 2, 2);
        let mut ledger = EntityLedger::new();
        let pos = MapPos::new(0, 0, 1);
        let unit = ledger.add_unit(pos, true);
        world.tile_mut(pos).unwrap().occupancy.unit = true;
        let mut diags = Diagnostics::default();
        relocate_unsupported(&mut world, &mut ledger, &[record(pos, 0)], &mut diags);
        assert_eq!(diags.entries(), &[Diagnostic::NoSupportBeneath { pos }]);
        assert_eq!(ledger.unit(unit).unwrap().pos, pos);
    }

    #[test]
    fn items_land_below_their_source() {
        let mut world = pit_world();
        let mut ledger = EntityLedger::new();
        let agent = ledger.add_unit(MapPos::new(0, 0, 0), true);
        let mut batch = YieldBatch::default();
        batch.push(&record(MapPos::new(1, 2, 2), 5));
        batch.push(&record(MapPos::new(3, 2, 1), 5));
        let mut diags = Diagnostics::default();
        let placement = place_yields(&mut world, &mut ledger, agent, &batch, None, 100, &mut diags);
        assert_eq!(placement, Placement { produced: 2, placed: 2 });
        let spots: BTreeSet<Option<MapPos>> = ledger.items().map(|i| i.pos).collect();
        assert!(spots.contains(&Some(MapPos::new(1, 2, 0))));
        assert!(spots.contains(&Some(MapPos::new(3, 2, 0))));
        assert!(world.tile(MapPos::new(1, 2, 0)).unwrap().occupancy.item);
    }

    #[test]
    fn valid_dump_collects_everything() {
        let mut world = pit_world();
        let mut ledger = EntityLedger::new();
        let agent = ledger.add_unit(MapPos::new(0, 0, 0), true);
        let mut batch = YieldBatch::default();
        batch.push(&record(MapPos::new(1, 1, 2), 5));
        batch.push(&record(MapPos::new(2, 1, 2), 6));
        let mut diags = Diagnostics::default();
        place_yields(
            &mut world,
            &mut ledger,
            agent,
            &batch,
            Some(MapPos::new(3, 3, 3)),
            100,
            &mut diags,
        );
        assert!(ledger.items().all(|i| i.pos == Some(MapPos::new(3, 3, 0))));
        assert!(diags.entries().is_empty());
    }

    #[test]
    fn invalid_dump_falls_back_to_sources() {
        let mut world = pit_world();
        let mut ledger = EntityLedger::new();
        let agent = ledger.add_unit(MapPos::new(0, 0, 0), true);
        let mut batch = YieldBatch::default();
        batch.push(&record(MapPos::new(1, 1, 2), 5));
        let mut diags = Diagnostics::default();
        let dump = MapPos::new(40, 0, 0);
        let placement = place_yields(&mut world, &mut ledger, agent, &batch, Some(dump), 100, &mut diags);
        assert_eq!(placement.placed, 1);
        assert_eq!(diags.entries(), &[Diagnostic::InvalidDumpPosition { pos: dump }]);
        assert!(ledger.items().all(|i| i.pos == Some(MapPos::new(1, 1, 0))));
    }

    #[test]
    fn production_is_split_into_capped_requests() {
        let mut world = pit_world();
        let mut ledger = EntityLedger::new();
        let agent = ledger.add_unit(MapPos::new(0, 0, 0), true);
        let mut batch = YieldBatch::default();
        for x in 0..4 {
            for y in 0..4 {
                batch.push(&record(MapPos::new(x, y, 1), 2));
            }
        }
        // Each request is capped at 2; the cap on the ledger is looser, so
        // every request is filled.
        ledger.set_production_cap(Some(3));
        let mut diags = Diagnostics::default();
        let placement = place_yields(&mut world, &mut ledger, agent, &batch, None, 2, &mut diags);
        assert_eq!(placement, Placement { produced: 16, placed: 16 });
        assert!(diags.entries().is_empty());
    }

    #[test]
    fn shortfall_warns_and_truncates() {
        let mut world = pit_world();
        let mut ledger = EntityLedger::new();
        let agent = ledger.add_unit(MapPos::new(0, 0, 0), true);
        ledger.set_production_cap(Some(1));
        let mut batch = YieldBatch::default();
        let first = MapPos::new(1, 1, 1);
        batch.push(&record(first, 2));
        batch.push(&record(MapPos::new(2, 1, 1), 2));
        let mut diags = Diagnostics::default();
        let placement = place_yields(&mut world, &mut ledger, agent, &batch, None, 100, &mut diags);
        assert_eq!(placement, Placement { produced: 1, placed: 1 });
        assert!(matches!(
            diags.entries(),
            [Diagnostic::ItemCountMismatch {
                expected: 2,
                produced: 1,
                ..
            }]
        ));
        assert!(ledger.items().any(|i| i.pos == Some(MapPos::new(1, 1, 0))));
    }

    #[test]
    fn unsupported_source_reports_placement_failure() {
        let mut world = TileWorld::new(2, 2, 2);
        let mut ledger = EntityLedger::new();
        let agent = ledger.add_unit(MapPos::new(0, 0, 0), true);
        let mut batch = YieldBatch::default();
        batch.push(&record(MapPos::new(1, 1, 1), 2));
        let mut diags = Diagnostics::default();
        let placement = place_yields(&mut world, &mut ledger, agent, &batch, None, 100, &mut diags);
        assert_eq!(placement, Placement { produced: 1, placed: 0 });
        assert!(matches!(
            diags.entries(),
            [Diagnostic::ItemPlacementFailed { .. }]
        ));
    }

    #[test]
    fn still_hidden_dug_tiles_are_revealed() {
        let mut world = pit_world();
        let pos = MapPos::new(1, 1, 0);
        world.tile_mut(pos).unwrap().designation.hidden = true;
        world.tile_mut(MapPos::new(2, 1, 0)).unwrap().designation.hidden = true;
        let mut cache = TileCache::new(&mut world);
        assert_eq!(reveal_dug_tiles(&mut cache, &[record(pos, 0)]), 2);
        assert_eq!(reveal_dug_tiles(&mut cache, &[record(pos, 0)]), 0);
    }
}
