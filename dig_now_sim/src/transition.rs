// Tile transition engine.
//
// `Excavator::dig_tile` applies one dig designation to one tile: it checks
// the material and shape preconditions, resolves the target tile type, and
// on success records what was there, rewrites the tile, and runs the
// follow-ups every structural change needs (reveal, vertical flags, ramp
// consistency). A failed precondition is a silent no-op; the caller keeps
// the designation for a later pass.
//
// Channels are the one recursive case. Channelling a cell first tries to
// turn the cell below into a ramp; the ramp's top then occupies the channel
// cell, so the channel itself records nothing further. Only if the ramp
// fails does the channel cell become plain open space.
//
// The excavator also collects the per-pass side results that cannot be
// applied to the grid directly: diagnostics and vermin colony sites.

use crate::cache::TileCache;
use crate::classify::is_diggable;
use crate::designation::DigKind;
use crate::error::{Diagnostic, Diagnostics};
use crate::flags::propagate_vertical_flags;
use crate::grid::VeinCategory;
use crate::ramps::{clean_ramps, remove_ramp_top};
use crate::reveal::{flood_unhide, unhide};
use crate::tiletype::{Connectivity, TileMaterial, TileShape, TileSpecial, TileType};
use crate::types::MapPos;
use crate::yields::DugTileRecord;
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Records produced by one designation. Usually one, two for a ramp.
pub type DugTiles = SmallVec<[DugTileRecord; 4]>;

/// Write `target` at `pos` as freshly dug rock: normal finish, and the
/// level's layer stone or soil in place of whatever vein was there.
pub fn set_dug_type(cache: &mut TileCache<'_>, pos: MapPos, target: TileType) -> bool {
    let layer = cache.layer_material(pos);
    cache.update(pos, |tile| {
        tile.tile_type = target;
        let rough = target
            .with_finish(TileSpecial::Normal, Connectivity::NONE)
            .unwrap_or(target);
        let layered = layer.and_then(|l| {
            rough
                .with_material(l.kind.tile_material())
                .map(|t| (t, l.index))
        });
        if let Some((layered, index)) = layered {
            tile.tile_type = layered;
            tile.material = Some(index);
            tile.vein = VeinCategory::Layer;
        } else if target.material() == TileMaterial::Air {
            tile.material = None;
            tile.vein = VeinCategory::Layer;
        }
    })
}

pub struct Excavator<'g> {
    cache: TileCache<'g>,
    diagnostics: Diagnostics,
    colony_sites: BTreeSet<MapPos>,
}

impl<'g> Excavator<'g> {
    pub fn new(cache: TileCache<'g>) -> Self {
        Self {
            cache,
            diagnostics: Diagnostics::default(),
            colony_sites: BTreeSet::new(),
        }
    }

    pub fn cache(&mut self) -> &mut TileCache<'g> {
        &mut self.cache
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Tiles whose vermin colonies must go once the pass is applied.
    pub fn colony_sites(&self) -> &BTreeSet<MapPos> {
        &self.colony_sites
    }

    pub fn into_parts(self) -> (TileCache<'g>, Diagnostics, BTreeSet<MapPos>) {
        (self.cache, self.diagnostics, self.colony_sites)
    }

    fn diggable_at(&mut self, pos: MapPos) -> bool {
        self.cache
            .tile_type(pos)
            .is_some_and(|t| is_diggable(t, self.cache.local_feature(pos)))
    }

    /// The tile `tile_type` becomes with `shape`, or the same shape in the
    /// level's layer material if its own material has no such tile.
    fn resolve_target(&self, pos: MapPos, tile_type: TileType, shape: TileShape) -> Option<TileType> {
        tile_type.similar(shape).or_else(|| {
            let layer = self.cache.layer_material(pos)?;
            TileType::plain(shape, layer.kind.tile_material())
        })
    }

    /// Apply `kind` at `pos`. Returns `true` if the tile changed; records of
    /// every changed tile are appended to `dug`.
    pub fn dig_tile(&mut self, pos: MapPos, kind: DigKind, dug: &mut DugTiles) -> bool {
        let Some(tile_type) = self.cache.tile_type(pos) else {
            return false;
        };
        if !is_diggable(tile_type, self.cache.local_feature(pos)) {
            return false;
        }
        let shape = tile_type.shape();

        let target = match kind {
            DigKind::None => {
                self.diagnostics
                    .report(Diagnostic::UnhandledDesignation { pos, kind });
                return false;
            }
            _ if !kind.accepts(shape) => return false,
            DigKind::Default => {
                if shape == TileShape::Ramp {
                    remove_ramp_top(&mut self.cache, pos.above());
                }
                let to = if shape == TileShape::StairUpDown {
                    TileShape::StairDown
                } else {
                    TileShape::Floor
                };
                self.resolve_target(pos, tile_type, to)
            }
            DigKind::Channel => {
                let below = pos.below();
                if !self.diggable_at(below) {
                    return false;
                }
                if self.dig_channel(pos, dug) {
                    return true;
                }
                Some(TileType::open_space())
            }
            DigKind::UpStair => self.resolve_target(pos, tile_type, TileShape::StairUp),
            DigKind::DownStair => self.resolve_target(pos, tile_type, TileShape::StairDown),
            DigKind::UpDownStair => self.resolve_target(pos, tile_type, TileShape::StairUpDown),
            DigKind::Ramp => {
                let target = self.resolve_target(pos, tile_type, TileShape::Ramp);
                if target.is_some_and(|ramp| ramp != tile_type) {
                    self.raise_ramp_top(pos, tile_type, dug);
                }
                target
            }
        };

        let Some(target) = target else {
            return false;
        };
        if target == tile_type {
            return false;
        }
        if let Some(record) = DugTileRecord::capture(&mut self.cache, pos) {
            dug.push(record);
        }
        set_dug_type(&mut self.cache, pos, target);
        tracing::trace!(%pos, ?kind, from = ?shape, to = ?target.shape(), "tile dug");
        self.settle(pos);
        true
    }

    /// Ramp the cell below a channel. Returns `true` if that took care of
    /// the channel cell too.
    fn dig_channel(&mut self, pos: MapPos, dug: &mut DugTiles) -> bool {
        let below = pos.below();
        remove_ramp_top(&mut self.cache, pos.above());
        let pending_below = self.cache.designation(below).map(|d| d.dig);
        if !self.dig_tile(below, DigKind::Ramp, dug) {
            return false;
        }
        clean_ramps(&mut self.cache, below);
        if pending_below == Some(DigKind::Default) && self.dig_tile(below, DigKind::Default, dug) {
            self.cache.update(below, |t| t.designation.dig = DigKind::None);
        }
        unhide(&mut self.cache, pos);
        flood_unhide(&mut self.cache, pos);
        propagate_vertical_flags(&mut self.cache, pos);
        true
    }

    /// Put a ramp top above a ramp being dug at `pos`, made of the ramp's
    /// own material.
    fn raise_ramp_top(&mut self, pos: MapPos, ramp_source: TileType, dug: &mut DugTiles) {
        let above = pos.above();
        if !self.diggable_at(above) {
            return;
        }
        let Some(top) = ramp_source.similar(TileShape::RampTop) else {
            return;
        };
        let Some(source) = self.cache.tile(pos) else {
            return;
        };
        if let Some(record) = DugTileRecord::capture(&mut self.cache, above) {
            dug.push(record);
        }
        self.cache.update(above, |t| {
            t.tile_type = top;
            t.material = source.material;
            t.vein = source.vein;
        });
        self.colony_sites.insert(above);
        remove_ramp_top(&mut self.cache, above.above());
    }

    fn settle(&mut self, pos: MapPos) {
        unhide(&mut self.cache, pos);
        flood_unhide(&mut self.cache, pos);
        propagate_vertical_flags(&mut self.cache, pos);
        clean_ramps(&mut self.cache, pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ItemKind;
    use crate::grid::{LayerKind, LayerMaterial, MapTile};
    use crate::types::Cuboid;
    use crate::world::TileWorld;

    const STONE: u32 = 7;

    fn stone(shape: TileShape) -> MapTile {
        MapTile::natural(shape, TileMaterial::Stone, Some(STONE)).unwrap()
    }

    /// 7x7x6 map: solid stone up to z=4, open above.
    fn rock() -> TileWorld {
        let mut world = TileWorld::new(7, 7, 6);
        for z in 0..6 {
            world.set_layer(
                z,
                LayerMaterial {
                    kind: LayerKind::Stone,
                    index: STONE,
                },
            );
        }
        world.fill(
            Cuboid::new(MapPos::new(0, 0, 0), MapPos::new(6, 6, 4)),
            stone(TileShape::Wall),
        );
        world
    }

    fn dig(world: &mut TileWorld, pos: MapPos, kind: DigKind) -> (bool, DugTiles) {
        let mut excavator = Excavator::new(TileCache::new(world));
        let mut dug = DugTiles::new();
        let ok = excavator.dig_tile(pos, kind, &mut dug);
        let (cache, _, _) = excavator.into_parts();
        cache.flush();
        (ok, dug)
    }

    fn shape_at(world: &TileWorld, pos: MapPos) -> TileShape {
        world.tile(pos).unwrap().tile_type.shape()
    }

    #[test]
    fn default_dig_turns_wall_into_floor() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 4);
        let (ok, dug) = dig(&mut world, pos, DigKind::Default);
        assert!(ok);
        assert_eq!(dug.len(), 1);
        assert_eq!(dug[0].pos, pos);
        assert_eq!(dug[0].item_material, Some(STONE));
        let tile = world.tile(pos).unwrap();
        assert_eq!(tile.tile_type, TileType::plain(TileShape::Floor, TileMaterial::Stone).unwrap());
        assert_eq!(tile.material, Some(STONE));
    }

    #[test]
    fn default_dig_on_floor_is_a_no_op() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 4);
        world.set(pos, stone(TileShape::Floor));
        let (ok, dug) = dig(&mut world, pos, DigKind::Default);
        assert!(!ok);
        assert!(dug.is_empty());
    }

    #[test]
    fn constructions_are_never_dug() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 4);
        world.set(pos, MapTile::natural(TileShape::Wall, TileMaterial::Construction, None).unwrap());
        for kind in [DigKind::Default, DigKind::Channel, DigKind::Ramp, DigKind::UpStair] {
            assert!(!dig(&mut world, pos, kind).0, "{kind:?}");
        }
        assert_eq!(shape_at(&world, pos), TileShape::Wall);
    }

    #[test]
    fn unhandled_kind_is_reported() {
        let mut world = rock();
        let mut excavator = Excavator::new(TileCache::new(&mut world));
        let mut dug = DugTiles::new();
        assert!(!excavator.dig_tile(MapPos::new(1, 1, 1), DigKind::None, &mut dug));
        assert_eq!(excavator.diagnostics().entries().len(), 1);
    }

    #[test]
    fn up_down_stair_dug_out_leaves_down_stair() {
        let mut world = rock();
        let pos = MapPos::new(2, 2, 3);
        world.set(pos, stone(TileShape::StairUpDown));
        assert!(dig(&mut world, pos, DigKind::Default).0);
        assert_eq!(shape_at(&world, pos), TileShape::StairDown);
    }

    #[test]
    fn stairs_from_wall() {
        let mut world = rock();
        let a = MapPos::new(1, 1, 2);
        let b = MapPos::new(2, 1, 2);
        let c = MapPos::new(3, 1, 2);
        assert!(dig(&mut world, a, DigKind::UpStair).0);
        assert!(dig(&mut world, b, DigKind::DownStair).0);
        assert!(dig(&mut world, c, DigKind::UpDownStair).0);
        assert_eq!(shape_at(&world, a), TileShape::StairUp);
        assert_eq!(shape_at(&world, b), TileShape::StairDown);
        assert_eq!(shape_at(&world, c), TileShape::StairUpDown);
    }

    #[test]
    fn grass_floor_down_stair_falls_back_to_layer_soil() {
        let mut world = rock();
        world.set_layer(
            4,
            LayerMaterial {
                kind: LayerKind::Soil,
                index: 3,
            },
        );
        let pos = MapPos::new(3, 3, 4);
        world.set(pos, MapTile::natural(TileShape::Floor, TileMaterial::GrassLight, None).unwrap());
        assert!(dig(&mut world, pos, DigKind::DownStair).0);
        let tile = world.tile(pos).unwrap();
        assert_eq!(tile.tile_type.shape(), TileShape::StairDown);
        assert_eq!(tile.tile_type.material(), TileMaterial::Soil);
        assert_eq!(tile.material, Some(3));
    }

    #[test]
    fn dug_vein_reverts_to_layer_stone() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 2);
        let mut ore = MapTile::natural(TileShape::Wall, TileMaterial::Mineral, Some(40)).unwrap();
        ore.vein = VeinCategory::Vein;
        world.set(pos, ore);
        let (_, dug) = dig(&mut world, pos, DigKind::Default);
        assert_eq!(dug[0].item_material, Some(40));
        assert_eq!(dug[0].vein, VeinCategory::Vein);
        let tile = world.tile(pos).unwrap();
        assert_eq!(tile.tile_type.material(), TileMaterial::Stone);
        assert_eq!(tile.material, Some(STONE));
        assert_eq!(tile.vein, VeinCategory::Layer);
    }

    #[test]
    fn smooth_wall_dug_to_rough_floor() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 2);
        let smooth = TileType::plain(TileShape::Wall, TileMaterial::Stone)
            .unwrap()
            .with_finish(
                TileSpecial::Smooth,
                Connectivity::from_directions([crate::types::Direction::East, crate::types::Direction::West]),
            )
            .unwrap();
        world.tile_mut(pos).unwrap().tile_type = smooth;
        assert!(dig(&mut world, pos, DigKind::Default).0);
        let t = world.tile(pos).unwrap().tile_type;
        assert_eq!(t.shape(), TileShape::Floor);
        assert_eq!(t.special(), TileSpecial::Normal);
    }

    #[test]
    fn channel_ramps_the_cell_below() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 4);
        let (ok, dug) = dig(&mut world, pos, DigKind::Channel);
        assert!(ok);
        let below = pos.below();
        assert_eq!(shape_at(&world, below), TileShape::Ramp);
        let top = world.tile(pos).unwrap();
        assert_eq!(top.tile_type.shape(), TileShape::RampTop);
        assert_eq!(top.tile_type.material(), TileMaterial::Stone);
        assert_eq!(top.material, Some(STONE));
        // One record for the channel cell, one for the ramp; no extra.
        let positions: Vec<MapPos> = dug.iter().map(|r| r.pos).collect();
        assert_eq!(positions, vec![pos, below]);
    }

    #[test]
    fn channel_over_open_space_just_opens_the_floor() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 4);
        world.set(pos, stone(TileShape::Floor));
        world.set(pos.below(), MapTile::open_space());
        let (ok, dug) = dig(&mut world, pos, DigKind::Channel);
        assert!(ok);
        assert_eq!(dug.len(), 1);
        assert_eq!(world.tile(pos).unwrap().tile_type, TileType::open_space());
    }

    #[test]
    fn channel_needs_a_diggable_cell_below() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 4);
        world.set(pos.below(), MapTile::natural(TileShape::Wall, TileMaterial::Construction, None).unwrap());
        assert!(!dig(&mut world, pos, DigKind::Channel).0);
        assert!(!dig(&mut world, MapPos::new(3, 3, 0), DigKind::Channel).0);
        assert_eq!(shape_at(&world, pos), TileShape::Wall);
    }

    #[test]
    fn channel_clears_ramp_top_above() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 3);
        world.set(pos.above(), stone(TileShape::RampTop));
        assert!(dig(&mut world, pos, DigKind::Channel).0);
        assert_eq!(world.tile(pos.above()).unwrap().tile_type, TileType::open_space());
    }

    #[test]
    fn channel_applies_pending_default_dig_below() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 4);
        world.tile_mut(pos.below()).unwrap().designation.dig = DigKind::Default;
        assert!(dig(&mut world, pos, DigKind::Channel).0);
        assert_eq!(shape_at(&world, pos.below()), TileShape::Floor);
        assert_eq!(world.tile(pos.below()).unwrap().designation.dig, DigKind::None);
        assert_eq!(world.tile(pos).unwrap().tile_type, TileType::open_space());
    }

    #[test]
    fn ramp_without_wall_neighbour_is_demoted() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 3);
        for n in pos.level_neighbors() {
            world.set(n, stone(TileShape::Floor));
        }
        assert!(dig(&mut world, pos, DigKind::Ramp).0);
        assert_eq!(shape_at(&world, pos), TileShape::Floor);
        assert_eq!(world.tile(pos.above()).unwrap().tile_type, TileType::open_space());
    }

    #[test]
    fn ramp_top_marks_colony_site() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 3);
        let mut excavator = Excavator::new(TileCache::new(&mut world));
        let mut dug = DugTiles::new();
        assert!(excavator.dig_tile(pos, DigKind::Ramp, &mut dug));
        assert!(excavator.colony_sites().contains(&pos.above()));
        assert_eq!(dug.len(), 2);
        assert_eq!(dug[0].item_kind, ItemKind::Boulder);
    }

    #[test]
    fn digging_reveals_the_cell() {
        let mut world = rock();
        let pos = MapPos::new(3, 3, 2);
        world.tile_mut(pos).unwrap().designation.hidden = true;
        world.tile_mut(pos.offset(1, 0, 0)).unwrap().designation.hidden = true;
        assert!(dig(&mut world, pos, DigKind::Default).0);
        assert!(!world.tile(pos).unwrap().designation.hidden);
        assert!(!world.tile(pos.offset(1, 0, 0)).unwrap().designation.hidden);
    }

    #[test]
    fn set_dug_type_clears_material_of_open_space() {
        let mut world = rock();
        let pos = MapPos::new(1, 1, 1);
        let mut cache = TileCache::new(&mut world);
        assert!(set_dug_type(&mut cache, pos, TileType::open_space()));
        let tile = cache.tile(pos).unwrap();
        assert_eq!(tile.tile_type, TileType::open_space());
        assert_eq!(tile.material, None);
    }
}
